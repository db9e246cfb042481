//! The default `Rule` registry, including the `prefer-canonical-id`
//! addition alongside the core rule set.

use std::collections::HashSet;

use crate::ast::{Declaration, FieldDef, Program, TypeExpr, Visitor};
use crate::location::SourceLocation;

use super::{LintContext, LintIssue, Severity};

pub struct Rule {
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub check: fn(&LintContext) -> Vec<LintIssue>,
    pub fix: Option<fn(&str) -> String>,
}

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "type-name-pascal-case",
            description: "type/enum/agent names should be PascalCase",
            severity: Severity::Warning,
            check: check_declaration_names_pascal_case,
            fix: None,
        },
        Rule {
            name: "field-name-snake-case",
            description: "field names should be snake_case",
            severity: Severity::Warning,
            check: check_field_names_snake_case,
            fix: None,
        },
        Rule {
            name: "enum-value-lowercase",
            description: "enum values should be lowercase",
            severity: Severity::Warning,
            check: check_enum_values_lowercase,
            fix: None,
        },
        Rule {
            name: "missing-description",
            description: "types and agents should declare a `description` field",
            severity: Severity::Info,
            check: check_missing_description,
            fix: None,
        },
        Rule {
            name: "import-order-alphabetical",
            description: "imports should be sorted absolute-before-relative, then lexicographically",
            severity: Severity::Warning,
            check: check_import_order,
            fix: None,
        },
        Rule {
            name: "unused-import",
            description: "an imported name that is never referenced",
            severity: Severity::Warning,
            check: check_unused_imports,
            fix: None,
        },
        Rule {
            name: "trailing-whitespace",
            description: "trailing whitespace at end of line",
            severity: Severity::Warning,
            check: check_trailing_whitespace,
            fix: Some(fix_trailing_whitespace),
        },
        Rule {
            name: "no-tabs",
            description: "tab characters instead of spaces",
            severity: Severity::Warning,
            check: check_tab_character,
            fix: Some(fix_tab_character),
        },
        Rule {
            name: "max-line-length",
            description: "line exceeds the configured maximum length",
            severity: Severity::Warning,
            check: check_max_line_length,
            fix: None,
        },
        Rule {
            name: "empty-line-with-whitespace",
            description: "a blank line that contains whitespace characters",
            severity: Severity::Warning,
            check: check_empty_line_with_whitespace,
            fix: Some(fix_empty_line_with_whitespace),
        },
        Rule {
            name: "duplicate-field",
            description: "a field name declared more than once in the same body",
            severity: Severity::Error,
            check: check_duplicate_field,
            fix: None,
        },
        Rule {
            name: "missing-required-fields",
            description: "an AgentDef missing its canonical `name`/`description` fields",
            severity: Severity::Warning,
            check: check_missing_required_fields,
            fix: None,
        },
        Rule {
            name: "prefer-canonical-id",
            description: "a WorkflowDef/PolicyDef using the legacy `id` field",
            severity: Severity::Info,
            check: check_prefer_canonical_id,
            fix: None,
        },
    ]
}

fn is_pascal_case(name: &str) -> bool {
    name.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_snake_case(name: &str) -> bool {
    name.chars().next().map(|c| c.is_ascii_lowercase() || c == '_').unwrap_or(false)
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn check_declaration_names_pascal_case(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    let mut issues = Vec::new();
    for decl in &program.declarations {
        if !matches!(decl, Declaration::Workflow(_) | Declaration::Policy(_))
            && !is_pascal_case(decl.name())
        {
            issues.push(LintIssue::new(
                "type-name-pascal-case",
                Severity::Warning,
                format!("`{}` should be PascalCase", decl.name()),
                decl.location().clone(),
            ));
        }
    }
    if let Some(agent) = &program.agent {
        if !is_pascal_case(&agent.name) {
            issues.push(LintIssue::new(
                "type-name-pascal-case",
                Severity::Warning,
                format!("`{}` should be PascalCase", agent.name),
                agent.location.clone(),
            ));
        }
    }
    issues
}

struct FieldNameCollector {
    issues: Vec<LintIssue>,
}

impl Visitor for FieldNameCollector {
    fn visit_field_def(&mut self, field_def: &FieldDef) {
        if !is_snake_case(&field_def.name) {
            self.issues.push(LintIssue::new(
                "field-name-snake-case",
                Severity::Warning,
                format!("`{}` should be snake_case", field_def.name),
                field_def.location.clone(),
            ));
        }
        self.visit_type_expr(&field_def.type_expr);
    }
}

fn check_field_names_snake_case(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    let mut collector = FieldNameCollector { issues: Vec::new() };
    collector.visit_program(program);
    collector.issues
}

fn check_enum_values_lowercase(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    let mut issues = Vec::new();
    for enum_def in program.enums() {
        for (value, location) in &enum_def.values {
            if value.chars().any(|c| c.is_ascii_uppercase()) {
                issues.push(LintIssue::new(
                    "enum-value-lowercase",
                    Severity::Warning,
                    format!("`{}` should be lowercase", value),
                    location.clone(),
                ));
            }
        }
    }
    issues
}

fn check_missing_description(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    let mut issues = Vec::new();
    for type_def in program.types() {
        let has_description = type_def
            .body
            .as_ref()
            .map(|b| b.fields.iter().any(|f| f.name == "description"))
            .unwrap_or(false);
        if !has_description {
            issues.push(LintIssue::new(
                "missing-description",
                Severity::Info,
                format!("`{}` has no `description` field", type_def.name),
                type_def.location.clone(),
            ));
        }
    }
    if let Some(agent) = &program.agent {
        if !agent.fields.iter().any(|f| f.name == "description") {
            issues.push(LintIssue::new(
                "missing-description",
                Severity::Info,
                format!("`{}` has no `description` field", agent.name),
                agent.location.clone(),
            ));
        }
    }
    issues
}

fn check_import_order(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    if program.imports.len() < 2 {
        return Vec::new();
    }
    let keys: Vec<_> = program
        .imports
        .iter()
        .map(|i| (i.path.starts_with('.'), i.path.clone()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    if keys != sorted {
        return vec![LintIssue::new(
            "import-order-alphabetical",
            Severity::Warning,
            "imports are not sorted absolute-before-relative, then lexicographically",
            program.imports[0].location.clone(),
        )];
    }
    Vec::new()
}

struct ReferenceCollector {
    names: HashSet<String>,
}

impl Visitor for ReferenceCollector {
    fn visit_type_expr(&mut self, type_expr: &TypeExpr) {
        if let TypeExpr::Reference { name, .. } = type_expr {
            self.names.insert(name.clone());
        }
        crate::ast::visitor::walk_type_expr(self, type_expr);
    }
}

fn check_unused_imports(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    let mut collector = ReferenceCollector { names: HashSet::new() };
    collector.visit_program(program);
    let mut issues = Vec::new();
    for import in &program.imports {
        let bound_name = import.alias.as_deref().unwrap_or_else(|| {
            import.path.rsplit(['/', '.']).next().unwrap_or(&import.path)
        });
        if !collector.names.contains(bound_name)
            && !program.declarations.iter().any(|d| d.name() == bound_name)
        {
            issues.push(LintIssue::new(
                "unused-import",
                Severity::Warning,
                format!("import `{}` is never referenced", import.path),
                import.location.clone(),
            ));
        }
    }
    issues
}

fn check_trailing_whitespace(ctx: &LintContext) -> Vec<LintIssue> {
    ctx.lines
        .iter()
        .enumerate()
        .filter(|(_, line)| *line != line.trim_end())
        .map(|(i, _)| {
            LintIssue::new(
                "trailing-whitespace",
                Severity::Warning,
                "trailing whitespace",
                SourceLocation::point(i + 1, 0),
            )
        })
        .collect()
}

fn fix_trailing_whitespace(source: &str) -> String {
    rewrite_lines(source, |line| line.trim_end().to_string())
}

fn check_tab_character(ctx: &LintContext) -> Vec<LintIssue> {
    ctx.lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains('\t'))
        .map(|(i, _)| {
            LintIssue::new(
                "no-tabs",
                Severity::Warning,
                "tab character; this grammar treats whitespace as insignificant but tabs render inconsistently",
                SourceLocation::point(i + 1, 0),
            )
        })
        .collect()
}

fn fix_tab_character(source: &str) -> String {
    rewrite_lines(source, |line| line.replace('\t', "  "))
}

fn check_max_line_length(ctx: &LintContext) -> Vec<LintIssue> {
    ctx.lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.chars().count() > ctx.max_line_length)
        .map(|(i, line)| {
            LintIssue::new(
                "max-line-length",
                Severity::Warning,
                format!("line is {} characters, exceeds {}", line.chars().count(), ctx.max_line_length),
                SourceLocation::point(i + 1, 0),
            )
        })
        .collect()
}

fn check_empty_line_with_whitespace(ctx: &LintContext) -> Vec<LintIssue> {
    ctx.lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.is_empty() && line.trim().is_empty())
        .map(|(i, _)| {
            LintIssue::new(
                "empty-line-with-whitespace",
                Severity::Warning,
                "blank line contains whitespace",
                SourceLocation::point(i + 1, 0),
            )
        })
        .collect()
}

fn fix_empty_line_with_whitespace(source: &str) -> String {
    rewrite_lines(source, |line| if line.trim().is_empty() { String::new() } else { line.to_string() })
}

fn rewrite_lines(source: &str, f: impl Fn(&str) -> String) -> String {
    let had_trailing_newline = source.ends_with('\n');
    let mut out: Vec<String> = source.lines().map(f).collect();
    if had_trailing_newline {
        out.push(String::new());
    }
    out.join("\n")
}

fn check_duplicate_field(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    let mut issues = Vec::new();
    for type_def in program.types() {
        if let Some(body) = &type_def.body {
            for diagnostic in crate::validate::rules::duplicate_fields(&body.fields) {
                issues.push(LintIssue::new(
                    "duplicate-field",
                    Severity::Error,
                    diagnostic.message,
                    diagnostic.location,
                ));
            }
        }
    }
    if let Some(agent) = &program.agent {
        for diagnostic in crate::validate::rules::duplicate_fields(&agent.fields) {
            issues.push(LintIssue::new(
                "duplicate-field",
                Severity::Error,
                diagnostic.message,
                diagnostic.location,
            ));
        }
    }
    issues
}

fn check_missing_required_fields(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    let Some(agent) = &program.agent else { return Vec::new() };
    let mut issues = Vec::new();
    for required in ["name", "description"] {
        if !agent.fields.iter().any(|f| f.name == required) {
            issues.push(LintIssue::new(
                "missing-required-fields",
                Severity::Warning,
                format!("agent `{}` is missing the canonical `{}` field", agent.name, required),
                agent.location.clone(),
            ));
        }
    }
    issues
}

fn check_prefer_canonical_id(ctx: &LintContext) -> Vec<LintIssue> {
    let Some(program) = ctx.program else { return Vec::new() };
    let mut issues = Vec::new();
    for workflow in program.workflows() {
        if workflow.id.is_some() {
            issues.push(LintIssue::new(
                "prefer-canonical-id",
                Severity::Info,
                format!("workflow `{}` uses the legacy `id` field; prefer `workflow_id`", workflow.name),
                workflow.location.clone(),
            ));
        }
    }
    for policy in program.policies() {
        if policy.id.is_some() {
            issues.push(LintIssue::new(
                "prefer-canonical-id",
                Severity::Info,
                format!("policy `{}` uses the legacy `id` field; prefer `policy_id`", policy.name),
                policy.location.clone(),
            ));
        }
    }
    issues
}
