//! JSON Schema Draft 2020-12 emitter (C7).
//!
//! `serde_json`'s `preserve_order` feature is relied on so the handwritten
//! key insertion order below (`$schema, $id, title, type, properties,
//! required, additionalProperties, $defs`) survives into the emitted
//! document rather than being sorted alphabetically.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::ast::{AgentDef, Declaration, EnumDef, FieldDef, Primitive, Program, TypeDef, TypeExpr};
use crate::error::Diagnostic;

const SCHEMA_URI: &str = "https://json-schema.org/draft/2020-12/schema";

/// Emits the Draft 2020-12 document for `program`'s `AgentDef`. Collects
/// every `TypeDef`/`EnumDef` transitively reachable from the agent's fields
/// into `$defs`, in first-reference order.
pub fn emit(program: &Program) -> Result<String, Vec<Diagnostic>> {
    let agent = program.agent.as_ref();
    let mut defs: BTreeMap<String, Value> = BTreeMap::new();
    let mut seen = BTreeMap::new();

    let (properties, required) = match agent {
        Some(agent) => fields_to_schema(&agent.fields, program, &mut defs, &mut seen),
        None => (Map::new(), Vec::new()),
    };

    let mut doc = Map::new();
    doc.insert("$schema".to_string(), json!(SCHEMA_URI));
    if let Some(agent) = agent {
        doc.insert("$id".to_string(), json!(format!("urn:adl:agent:{}", agent.name)));
        doc.insert("title".to_string(), json!(agent.name));
    }
    doc.insert("type".to_string(), json!("object"));
    doc.insert("properties".to_string(), Value::Object(properties));
    doc.insert("required".to_string(), json!(required));
    doc.insert("additionalProperties".to_string(), json!(false));
    if !defs.is_empty() {
        let mut defs_map = Map::new();
        for (name, schema) in defs {
            defs_map.insert(name, schema);
        }
        doc.insert("$defs".to_string(), Value::Object(defs_map));
    }

    serde_json::to_string_pretty(&Value::Object(doc))
        .map_err(|e| vec![Diagnostic::new(
            crate::error::Code::ParseError,
            format!("failed to serialize JSON Schema document: {}", e),
            crate::location::SourceLocation::dummy(),
        )])
}

fn fields_to_schema(
    fields: &[FieldDef],
    program: &Program,
    defs: &mut BTreeMap<String, Value>,
    seen: &mut BTreeMap<String, ()>,
) -> (Map<String, Value>, Vec<String>) {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), type_expr_to_schema(&field.type_expr, program, defs, seen));
        if !field.optional {
            required.push(field.name.clone());
        }
    }
    (properties, required)
}

fn type_expr_to_schema(
    type_expr: &TypeExpr,
    program: &Program,
    defs: &mut BTreeMap<String, Value>,
    seen: &mut BTreeMap<String, ()>,
) -> Value {
    match type_expr {
        TypeExpr::Primitive { kind, .. } => primitive_schema(*kind),
        TypeExpr::Reference { name, .. } => {
            collect_reference(name, program, defs, seen);
            json!({ "$ref": format!("#/$defs/{}", name) })
        }
        TypeExpr::Array { element, .. } => {
            json!({
                "type": "array",
                "items": type_expr_to_schema(element, program, defs, seen),
            })
        }
        TypeExpr::Union { variants, .. } => {
            if variants.len() == 1 {
                type_expr_to_schema(&variants[0], program, defs, seen)
            } else {
                let any_of: Vec<Value> = variants
                    .iter()
                    .map(|v| type_expr_to_schema(v, program, defs, seen))
                    .collect();
                json!({ "anyOf": any_of })
            }
        }
        TypeExpr::Optional { inner, .. } => {
            let mut schema = type_expr_to_schema(inner, program, defs, seen);
            if let Value::Object(map) = &mut schema {
                map.insert("nullable".to_string(), json!(true));
            }
            schema
        }
        TypeExpr::Constrained {
            base, min, max, ..
        } => {
            let mut schema = type_expr_to_schema(base, program, defs, seen);
            if let Value::Object(map) = &mut schema {
                if let Some(min) = min {
                    map.insert("minimum".to_string(), json!(min));
                }
                if let Some(max) = max {
                    map.insert("maximum".to_string(), json!(max));
                }
            }
            schema
        }
    }
}

fn primitive_schema(kind: Primitive) -> Value {
    match kind {
        Primitive::String => json!({ "type": "string" }),
        Primitive::Integer => json!({ "type": "integer" }),
        Primitive::Number => json!({ "type": "number" }),
        Primitive::Boolean => json!({ "type": "boolean" }),
        Primitive::Object => json!({ "type": "object" }),
        Primitive::Array => json!({ "type": "array" }),
        Primitive::Any => json!({}),
        Primitive::Null => json!({ "type": "null" }),
    }
}

fn collect_reference(
    name: &str,
    program: &Program,
    defs: &mut BTreeMap<String, Value>,
    seen: &mut BTreeMap<String, ()>,
) {
    if seen.contains_key(name) {
        return;
    }
    seen.insert(name.to_string(), ());
    let Some(decl) = program.find_type_or_enum(name) else {
        return;
    };
    match decl {
        Declaration::Type(type_def) => {
            let schema = type_def_schema(type_def, program, defs, seen);
            defs.insert(name.to_string(), schema);
        }
        Declaration::Enum(enum_def) => {
            defs.insert(name.to_string(), enum_def_schema(enum_def));
        }
        _ => {}
    }
}

fn type_def_schema(
    type_def: &TypeDef,
    program: &Program,
    defs: &mut BTreeMap<String, Value>,
    seen: &mut BTreeMap<String, ()>,
) -> Value {
    let Some(body) = &type_def.body else {
        return json!({ "type": "object" });
    };
    let (properties, required) = fields_to_schema(&body.fields, program, defs, seen);
    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), json!(required));
    schema.insert("additionalProperties".to_string(), json!(false));
    Value::Object(schema)
}

fn enum_def_schema(enum_def: &EnumDef) -> Value {
    let values: Vec<&str> = enum_def.values.iter().map(|(v, _)| v.as_str()).collect();
    json!({ "type": "string", "enum": values })
}

/// A trivial convenience so callers that only have an `AgentDef` in hand
/// (e.g. a test fixture) don't need a whole `Program`.
pub fn emit_agent(agent: &AgentDef) -> Result<String, Vec<Diagnostic>> {
    let program = Program {
        imports: Vec::new(),
        declarations: Vec::new(),
        agent: Some(agent.clone()),
        location: crate::location::SourceLocation::dummy(),
    };
    emit(&program)
}
