//! TypeScript back-end (C8, "Target A" record syntax).

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::ast::{AgentDef, Declaration, EnumDef, FieldDef, Primitive, Program, TypeDef, TypeExpr};
use crate::error::{Code, Diagnostic};
use crate::location::SourceLocation;

/// Emits one TypeScript module: every transitively-referenced `EnumDef`/
/// `TypeDef`, then the top-level `AgentDef`/`WorkflowDef`/`PolicyDef`
/// records, in that order.
pub fn emit(program: &Program) -> Result<String, Vec<Diagnostic>> {
    let mut out = String::new();
    let mut seen = BTreeSet::new();

    if let Some(agent) = &program.agent {
        for field in &agent.fields {
            collect_references(&field.type_expr, program, &mut seen, &mut out);
        }
        emit_agent(agent, &mut out);
    }

    for workflow in program.workflows() {
        emit_workflow(workflow, &mut out);
    }
    for policy in program.policies() {
        emit_policy(policy, &mut out);
    }

    Ok(out)
}

fn collect_references(
    type_expr: &TypeExpr,
    program: &Program,
    seen: &mut BTreeSet<String>,
    out: &mut String,
) {
    match type_expr {
        TypeExpr::Reference { name, .. } => {
            if seen.contains(name) {
                return;
            }
            seen.insert(name.clone());
            if let Some(decl) = program.find_type_or_enum(name) {
                match decl {
                    Declaration::Enum(e) => emit_enum(e, out),
                    Declaration::Type(t) => {
                        if let Some(body) = &t.body {
                            for field in &body.fields {
                                collect_references(&field.type_expr, program, seen, out);
                            }
                        }
                        emit_type_def(t, out);
                    }
                    _ => {}
                }
            }
        }
        TypeExpr::Array { element, .. } | TypeExpr::Optional { inner: element, .. } => {
            collect_references(element, program, seen, out)
        }
        TypeExpr::Union { variants, .. } => {
            for v in variants {
                collect_references(v, program, seen, out);
            }
        }
        TypeExpr::Constrained { base, .. } => collect_references(base, program, seen, out),
        TypeExpr::Primitive { .. } => {}
    }
}

fn emit_enum(enum_def: &EnumDef, out: &mut String) {
    let _ = writeln!(out, "export enum {} {{", enum_def.name);
    for (value, _) in &enum_def.values {
        let _ = writeln!(out, "  {} = \"{}\",", pascal_case(value), value);
    }
    let _ = writeln!(out, "}}\n");
}

fn emit_type_def(type_def: &TypeDef, out: &mut String) {
    let _ = writeln!(out, "export interface {} {{", type_def.name);
    if let Some(body) = &type_def.body {
        for field in &body.fields {
            emit_field(field, out);
        }
    }
    let _ = writeln!(out, "}}\n");
}

fn emit_agent(agent: &AgentDef, out: &mut String) {
    let _ = writeln!(out, "export interface {} {{", agent.name);
    let _ = writeln!(out, "  agent_id: string;");
    let _ = writeln!(out, "  /** @deprecated use agent_id */");
    let _ = writeln!(out, "  id?: string;");
    for field in &agent.fields {
        emit_field(field, out);
    }
    let _ = writeln!(out, "}}\n");
}

fn emit_workflow(workflow: &crate::ast::WorkflowDef, out: &mut String) {
    let _ = writeln!(out, "export interface {} {{", pascal_case(&workflow.name));
    let _ = writeln!(out, "  workflow_id: string;");
    let _ = writeln!(out, "  name: string;");
    let _ = writeln!(out, "  version: string;");
    let _ = writeln!(out, "  /** @deprecated use workflow_id */");
    let _ = writeln!(out, "  id?: string;");
    let _ = writeln!(out, "}}\n");
    let _ = (&workflow.nodes, &workflow.edges); // shape only; graph body is opaque config at this layer
}

fn emit_policy(policy: &crate::ast::PolicyDef, out: &mut String) {
    let _ = writeln!(out, "export interface {} {{", pascal_case(&policy.name));
    let _ = writeln!(out, "  policy_id: string;");
    let _ = writeln!(out, "  name: string;");
    let _ = writeln!(out, "  version: string;");
    let _ = writeln!(out, "  /** @deprecated use policy_id */");
    let _ = writeln!(out, "  id?: string;");
    let _ = writeln!(out, "}}\n");
}

fn emit_field(field: &FieldDef, out: &mut String) {
    let optional_marker = if field.optional { "?" } else { "" };
    let _ = writeln!(out, "  {}{}: {};", field.name, optional_marker, type_expr_to_ts(&field.type_expr));
}

fn type_expr_to_ts(type_expr: &TypeExpr) -> String {
    match type_expr {
        TypeExpr::Primitive { kind, .. } => primitive_to_ts(*kind).to_string(),
        TypeExpr::Reference { name, .. } => name.clone(),
        TypeExpr::Array { element, .. } => format!("{}[]", parenthesize_if_union(element)),
        TypeExpr::Union { variants, .. } => {
            if variants.len() == 1 {
                type_expr_to_ts(&variants[0])
            } else {
                variants.iter().map(type_expr_to_ts).collect::<Vec<_>>().join(" | ")
            }
        }
        TypeExpr::Optional { inner, .. } => format!("{} | null", type_expr_to_ts(inner)),
        TypeExpr::Constrained { base, .. } => type_expr_to_ts(base),
    }
}

fn parenthesize_if_union(type_expr: &TypeExpr) -> String {
    match type_expr {
        TypeExpr::Union { variants, .. } if variants.len() > 1 => {
            format!("({})", type_expr_to_ts(type_expr))
        }
        _ => type_expr_to_ts(type_expr),
    }
}

fn primitive_to_ts(kind: Primitive) -> &'static str {
    match kind {
        Primitive::String => "string",
        Primitive::Integer | Primitive::Number => "number",
        Primitive::Boolean => "boolean",
        Primitive::Object => "Record<string, any>",
        Primitive::Array => "any[]",
        Primitive::Any => "any",
        Primitive::Null => "null",
    }
}

fn pascal_case(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-')
        .filter(|s| !s.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Runs `tsc --noEmit` over `source` if available, surfacing errors as
/// diagnostics.
pub fn check_with(source: &str, checker: &dyn crate::emit::SyntaxChecker) -> Result<(), Vec<Diagnostic>> {
    match checker.check(source) {
        Some(Err(message)) => Err(vec![Diagnostic::new(
            Code::ParseError,
            format!("generated TypeScript failed syntax check: {}", message),
            SourceLocation::dummy(),
        )]),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn minimal_agent_emits_interface() {
        let program = parse("agent A { name: string  description: string }").unwrap();
        let out = emit(&program).unwrap();
        assert!(out.contains("export interface A {"));
        assert!(out.contains("name: string;"));
        assert!(out.contains("agent_id: string;"));
    }

    #[test]
    fn referenced_enum_emits_before_agent() {
        let program = parse("enum Status { active, inactive }\nagent A { status: Status }").unwrap();
        let out = emit(&program).unwrap();
        let enum_pos = out.find("export enum Status").unwrap();
        let agent_pos = out.find("export interface A").unwrap();
        assert!(enum_pos < agent_pos);
        assert!(out.contains("Active = \"active\","));
    }

    #[test]
    fn optional_field_uses_question_mark() {
        let program = parse("agent A { nickname?: string }").unwrap();
        let out = emit(&program).unwrap();
        assert!(out.contains("nickname?: string | null;"));
    }

    #[test]
    fn array_of_union_is_parenthesized() {
        let program = parse("agent A { tags: (string | integer)[] }").unwrap();
        let out = emit(&program).unwrap();
        assert!(out.contains("tags: (string | number)[];"));
    }
}
