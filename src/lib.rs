//! Compiler for the Agent Definition Language: lex, parse, validate, emit,
//! lint, format. `compile` runs the whole pipeline end to end; each stage
//! is also exposed standalone for callers (a CLI, a language server, a
//! build-time codegen step) that only need one of them.

pub mod ast;
pub mod emit;
pub mod error;
pub mod format;
pub mod import;
pub mod lexer;
pub mod lint;
pub mod location;
pub mod parser;
pub mod validate;

use std::path::Path;

pub use error::{render_diagnostics, Category, Code, Diagnostic};
pub use format::{format_source, FormatOptions};
pub use import::ImportResolver;
pub use lint::{fix_source, lint_source, LintIssue, LintOptions, Severity};
pub use validate::{validate_json, validate_program, ValidationErrorSummary};

/// Which back-end(s) `compile` should emit, beyond validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitTarget {
    JsonSchema,
    TypeScript,
    Python,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Resolve `import` statements against this project root before
    /// validating/emitting. `None` parses the entry source standalone,
    /// leaving any `import` unresolved (a later `INVALID_TYPE_REFERENCE`).
    pub project_root: Option<std::path::PathBuf>,
    pub targets: Vec<EmitTarget>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            project_root: None,
            targets: Vec::new(),
        }
    }
}

/// Everything `compile` produced: the validated AST's diagnostics plus one
/// rendered module per requested `EmitTarget`, in request order. Emission is
/// skipped (with its failure folded into `diagnostics`) once validation has
/// already reported a critical error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileResult {
    pub diagnostics: Vec<Diagnostic>,
    pub emitted: Vec<(EmitTarget, String)>,
}

/// Runs the full pipeline: parse (with import resolution if a
/// `project_root` is configured), validate, then emit each requested
/// target. Returns as much as could be produced; a parse failure short
/// circuits everything else and is the sole diagnostic in the result.
pub fn compile(entry: &Path, source: &str, options: &CompileOptions) -> CompileResult {
    let mut program = match parser::parse(source) {
        Ok(program) => program,
        Err(diagnostic) => {
            return CompileResult {
                diagnostics: vec![diagnostic],
                emitted: Vec::new(),
            }
        }
    };

    let mut diagnostics = Vec::new();
    if let Some(root) = &options.project_root {
        let mut resolver = ImportResolver::new(root.clone());
        let (unit, mut import_diagnostics) = import::merge_imports(&program, &mut resolver, entry);
        diagnostics.append(&mut import_diagnostics);
        program
            .declarations
            .extend(unit.enums.into_iter().map(ast::Declaration::Enum));
        program
            .declarations
            .extend(unit.types.into_iter().map(ast::Declaration::Type));
    }

    let summary = validate_program(&program);
    diagnostics.extend(summary.diagnostics);
    let has_critical = diagnostics.iter().any(|d| {
        matches!(d.category(), Category::Semantic | Category::Type)
    });

    let mut emitted = Vec::new();
    if !has_critical {
        for target in &options.targets {
            let result = match target {
                EmitTarget::JsonSchema => emit::json_schema::emit(&program),
                EmitTarget::TypeScript => emit::typescript::emit(&program),
                EmitTarget::Python => emit::python::emit(&program),
            };
            match result {
                Ok(rendered) => emitted.push((*target, rendered)),
                Err(mut errors) => diagnostics.append(&mut errors),
            }
        }
    }

    CompileResult { diagnostics, emitted }
}
