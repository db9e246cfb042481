//! Python back-end (C9, "Target B" typed-mapping syntax):
//! `TypedDict` classes plus `str`-subclass enums, generated with `typing`'s
//! vocabulary rather than runtime validation (Pydantic et al. are a
//! consumer's choice, not the compiler's).

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::ast::{AgentDef, Declaration, EnumDef, FieldDef, Primitive, Program, TypeDef, TypeExpr};
use crate::error::{Code, Diagnostic};
use crate::location::SourceLocation;

const PRELUDE: &str = "from __future__ import annotations\n\
from enum import Enum\n\
from typing import Any, Dict, List, Optional, Union\n\
from typing_extensions import NotRequired, TypedDict\n\n";

pub fn emit(program: &Program) -> Result<String, Vec<Diagnostic>> {
    let mut out = String::from(PRELUDE);
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
    let _ = writeln!(out, "class {}(str, Enum):", enum_def.name);
    for (value, _) in &enum_def.values {
        let _ = writeln!(out, "    {} = \"{}\"", value.to_uppercase(), value);
    }
    let _ = writeln!(out);
}

fn emit_type_def(type_def: &TypeDef, out: &mut String) {
    let _ = writeln!(out, "class {}(TypedDict):", type_def.name);
    match &type_def.body {
        Some(body) if !body.fields.is_empty() => {
            for field in &body.fields {
                emit_field(field, out);
            }
        }
        _ => {
            let _ = writeln!(out, "    pass");
        }
    }
    let _ = writeln!(out);
}

fn emit_agent(agent: &AgentDef, out: &mut String) {
    let _ = writeln!(out, "class {}(TypedDict):", agent.name);
    let _ = writeln!(out, "    agent_id: str");
    let _ = writeln!(out, "    id: NotRequired[str]  # deprecated, use agent_id");
    for field in &agent.fields {
        emit_field(field, out);
    }
    let _ = writeln!(out);
}

fn emit_workflow(workflow: &crate::ast::WorkflowDef, out: &mut String) {
    let _ = writeln!(out, "class {}(TypedDict):", snake_to_pascal(&workflow.name));
    let _ = writeln!(out, "    workflow_id: str");
    let _ = writeln!(out, "    name: str");
    let _ = writeln!(out, "    version: str");
    let _ = writeln!(out, "    id: NotRequired[str]  # deprecated, use workflow_id");
    let _ = writeln!(out);
    let _ = (&workflow.nodes, &workflow.edges);
}

fn emit_policy(policy: &crate::ast::PolicyDef, out: &mut String) {
    let _ = writeln!(out, "class {}(TypedDict):", snake_to_pascal(&policy.name));
    let _ = writeln!(out, "    policy_id: str");
    let _ = writeln!(out, "    name: str");
    let _ = writeln!(out, "    version: str");
    let _ = writeln!(out, "    id: NotRequired[str]  # deprecated, use policy_id");
    let _ = writeln!(out);
}

fn emit_field(field: &FieldDef, out: &mut String) {
    let annotation = if field.optional {
        format!("NotRequired[{}]", type_expr_to_py(&field.type_expr))
    } else {
        type_expr_to_py(&field.type_expr)
    };
    let _ = writeln!(out, "    {}: {}", field.name, annotation);
}

fn type_expr_to_py(type_expr: &TypeExpr) -> String {
    match type_expr {
        TypeExpr::Primitive { kind, .. } => primitive_to_py(*kind).to_string(),
        TypeExpr::Reference { name, .. } => name.clone(),
        TypeExpr::Array { element, .. } => format!("List[{}]", type_expr_to_py(element)),
        TypeExpr::Union { variants, .. } => {
            if variants.len() == 1 {
                type_expr_to_py(&variants[0])
            } else {
                format!(
                    "Union[{}]",
                    variants.iter().map(type_expr_to_py).collect::<Vec<_>>().join(", ")
                )
            }
        }
        TypeExpr::Optional { inner, .. } => format!("Optional[{}]", type_expr_to_py(inner)),
        TypeExpr::Constrained { base, .. } => type_expr_to_py(base),
    }
}

fn primitive_to_py(kind: Primitive) -> &'static str {
    match kind {
        Primitive::String => "str",
        Primitive::Integer => "int",
        Primitive::Number => "float",
        Primitive::Boolean => "bool",
        Primitive::Object => "Dict[str, Any]",
        Primitive::Array => "List[Any]",
        Primitive::Any => "Any",
        Primitive::Null => "None",
    }
}

fn snake_to_pascal(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-' || c == ' ')
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

/// Parses `source` with Python's own compiler if available, surfacing
/// errors as diagnostics.
pub fn check_with(source: &str, checker: &dyn crate::emit::SyntaxChecker) -> Result<(), Vec<Diagnostic>> {
    match checker.check(source) {
        Some(Err(message)) => Err(vec![Diagnostic::new(
            Code::ParseError,
            format!("generated Python failed syntax check: {}", message),
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
    fn minimal_agent_emits_typed_dict() {
        let program = parse("agent A { name: string  description: string }").unwrap();
        let out = emit(&program).unwrap();
        assert!(out.contains("class A(TypedDict):"));
        assert!(out.contains("    name: str"));
        assert!(out.contains("    agent_id: str"));
    }

    #[test]
    fn referenced_enum_is_str_subclass() {
        let program = parse("enum Status { active, inactive }\nagent A { status: Status }").unwrap();
        let out = emit(&program).unwrap();
        assert!(out.contains("class Status(str, Enum):"));
        assert!(out.contains("ACTIVE = \"active\""));
    }

    #[test]
    fn optional_field_uses_not_required() {
        let program = parse("agent A { nickname?: string }").unwrap();
        let out = emit(&program).unwrap();
        assert!(out.contains("nickname: NotRequired[str]"));
    }

    #[test]
    fn union_emits_typing_union() {
        let program = parse("agent A { value: string | integer }").unwrap();
        let out = emit(&program).unwrap();
        assert!(out.contains("value: Union[str, int]"));
    }
}
