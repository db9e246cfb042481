//! AST-based pretty-printer (C10). Re-serializes the parsed
//! `Program` rather than re-indenting the original text, so formatting is
//! deterministic regardless of the input's own layout; comments are
//! reattached by source line from a pass over the token stream.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::ast::{AgentDef, Declaration, EnumDef, FieldDef, Primitive, Program, TypeDef, TypeExpr};
use crate::error::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::parse;

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub indent_size: usize,
    pub max_line_length: usize,
    pub trailing_commas: bool,
    pub sort_imports: bool,
    pub preserve_comments: bool,
    pub newline_after_declaration: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            max_line_length: 100,
            trailing_commas: false,
            sort_imports: true,
            preserve_comments: true,
            newline_after_declaration: true,
        }
    }
}

/// Maps a 1-based source line to the `#`-comments a leading token on that
/// line carried, for `preserve_comments` to reattach.
fn leading_comments_by_line(source: &str) -> HashMap<usize, Vec<String>> {
    let mut map = HashMap::new();
    if let Ok(tokens) = Lexer::new(source).tokenize() {
        for token in &tokens {
            if !token.leading_comments.is_empty() {
                map.insert(token.location.line, token.leading_comments.clone());
            }
        }
    }
    map
}

pub fn format_source(source: &str, options: &FormatOptions) -> Result<String, Diagnostic> {
    let program = parse(source)?;
    let comments = if options.preserve_comments {
        leading_comments_by_line(source)
    } else {
        HashMap::new()
    };
    Ok(format_program(&program, options, &comments))
}

fn format_program(
    program: &Program,
    options: &FormatOptions,
    comments: &HashMap<usize, Vec<String>>,
) -> String {
    let mut out = String::new();

    let mut imports: Vec<_> = program.imports.iter().collect();
    if options.sort_imports {
        imports.sort_by(|a, b| {
            let a_relative = a.path.starts_with('.');
            let b_relative = b.path.starts_with('.');
            a_relative.cmp(&b_relative).then_with(|| a.path.cmp(&b.path))
        });
    }
    for import in &imports {
        let _ = write!(out, "import {}", import.path);
        if let Some(alias) = &import.alias {
            let _ = write!(out, " as {}", alias);
        }
        out.push('\n');
    }
    if !imports.is_empty() {
        out.push('\n');
    }

    let mut first = true;
    for decl in &program.declarations {
        if !first && options.newline_after_declaration {
            out.push('\n');
        }
        first = false;
        emit_leading_comments(&mut out, decl.location().line, comments);
        match decl {
            Declaration::Enum(e) => format_enum(e, options, &mut out),
            Declaration::Type(t) => format_type(t, options, &mut out),
            Declaration::Workflow(_) | Declaration::Policy(_) => {
                // authored as standalone JSON, not reformatted as ADL source
            }
        }
    }

    if let Some(agent) = &program.agent {
        if !first && options.newline_after_declaration {
            out.push('\n');
        }
        emit_leading_comments(&mut out, agent.location.line, comments);
        format_agent(agent, options, &mut out);
    }

    out
}

fn emit_leading_comments(out: &mut String, line: usize, comments: &HashMap<usize, Vec<String>>) {
    if let Some(lines) = comments.get(&line) {
        for comment in lines {
            let _ = writeln!(out, "# {}", comment);
        }
    }
}

fn format_enum(enum_def: &EnumDef, options: &FormatOptions, out: &mut String) {
    let indent = " ".repeat(options.indent_size);
    let _ = writeln!(out, "enum {} {{", enum_def.name);
    let count = enum_def.values.len();
    for (i, (value, _)) in enum_def.values.iter().enumerate() {
        let comma = if i + 1 < count || options.trailing_commas {
            ","
        } else {
            ""
        };
        let _ = writeln!(out, "{}{}{}", indent, value, comma);
    }
    let _ = writeln!(out, "}}");
}

fn format_type(type_def: &TypeDef, options: &FormatOptions, out: &mut String) {
    match &type_def.body {
        None => {
            let _ = writeln!(out, "type {}", type_def.name);
        }
        Some(body) => {
            let _ = writeln!(out, "type {} {{", type_def.name);
            let indent = " ".repeat(options.indent_size);
            for field in &body.fields {
                format_field(field, &indent, out);
            }
            let _ = writeln!(out, "}}");
        }
    }
}

fn format_agent(agent: &AgentDef, options: &FormatOptions, out: &mut String) {
    let _ = writeln!(out, "agent {} {{", agent.name);
    let indent = " ".repeat(options.indent_size);
    for field in &agent.fields {
        format_field(field, &indent, out);
    }
    let _ = writeln!(out, "}}");
}

fn format_field(field: &FieldDef, indent: &str, out: &mut String) {
    let optional = if field.optional { "?" } else { "" };
    let _ = writeln!(out, "{}{}{}: {}", indent, field.name, optional, format_type_expr(&field.type_expr));
}

fn format_type_expr(type_expr: &TypeExpr) -> String {
    match type_expr {
        TypeExpr::Primitive { kind, .. } => primitive_name(*kind).to_string(),
        TypeExpr::Reference { name, .. } => name.clone(),
        TypeExpr::Array { element, .. } => format!("{}[]", parenthesize_if_union(element)),
        TypeExpr::Union { variants, .. } => {
            if variants.len() == 1 {
                format_type_expr(&variants[0])
            } else {
                variants.iter().map(format_type_expr).collect::<Vec<_>>().join(" | ")
            }
        }
        TypeExpr::Optional { inner, .. } => format!("{}?", parenthesize_if_union(inner)),
        TypeExpr::Constrained { base, min, max, .. } => {
            let range = match (min, max) {
                (Some(min), Some(max)) => format!("{}..{}", min, max),
                (Some(min), None) => format!("{}..", min),
                (None, Some(max)) => format!("..{}", max),
                (None, None) => "..".to_string(),
            };
            format!("{}({})", format_type_expr(base), range)
        }
    }
}

fn parenthesize_if_union(type_expr: &TypeExpr) -> String {
    match type_expr {
        TypeExpr::Union { variants, .. } if variants.len() > 1 => {
            format!("({})", format_type_expr(type_expr))
        }
        _ => format_type_expr(type_expr),
    }
}

fn primitive_name(kind: Primitive) -> &'static str {
    kind.name()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reformats_with_default_indent() {
        let out = format_source("agent A { name: string }", &FormatOptions::default()).unwrap();
        assert_eq!(out, "agent A {\n  name: string\n}\n");
    }

    #[test]
    fn enum_values_get_trailing_comma_when_enabled() {
        let mut options = FormatOptions::default();
        options.trailing_commas = true;
        let out = format_source("enum Status { active, inactive }", &options).unwrap();
        assert_eq!(out, "enum Status {\n  active,\n  inactive,\n}\n");
    }

    #[test]
    fn enum_values_no_trailing_comma_by_default() {
        let out = format_source("enum Status { active, inactive }", &FormatOptions::default()).unwrap();
        assert_eq!(out, "enum Status {\n  active,\n  inactive\n}\n");
    }

    #[test]
    fn imports_are_sorted_absolute_before_relative() {
        let source = "import ./shared\nimport zeta\nimport alpha\nagent A { name: string }";
        let out = format_source(source, &FormatOptions::default()).unwrap();
        let import_lines: Vec<&str> = out.lines().take_while(|l| l.starts_with("import")).collect();
        assert_eq!(import_lines, vec!["import alpha", "import zeta", "import ./shared"]);
    }

    #[test]
    fn formatting_is_idempotent() {
        let source = "enum Status { active, inactive }\n\nagent A { status: Status  age: integer (0..120) }";
        let first = format_source(source, &FormatOptions::default()).unwrap();
        let second = format_source(&first, &FormatOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn leading_comment_is_preserved() {
        let source = "# describes the agent\nagent A { name: string }";
        let out = format_source(source, &FormatOptions::default()).unwrap();
        assert!(out.starts_with("# describes the agent\n"));
    }

    #[test]
    fn leading_comment_is_dropped_when_disabled() {
        let mut options = FormatOptions::default();
        options.preserve_comments = false;
        let source = "# describes the agent\nagent A { name: string }";
        let out = format_source(source, &options).unwrap();
        assert!(!out.contains("describes"));
    }
}
