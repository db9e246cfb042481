//! End-to-end scenarios driven through the public API rather than internal
//! module tests, plus a handful of quantified formatting/linting
//! properties.

use std::path::PathBuf;

use adlc::ast::{EdgeRelation, EnforcementDef, NodeType, Position, WorkflowDef, WorkflowEdge, WorkflowNode};
use adlc::error::Code;
use adlc::format::{format_source, FormatOptions};
use adlc::lint::{fix_source, lint_source, LintOptions};
use adlc::location::SourceLocation;
use adlc::validate::validate_program;
use adlc::{compile, CompileOptions, EmitTarget};

fn entry() -> PathBuf {
    PathBuf::from("scenario.adl")
}

/// Routes the crate's `log` output through `env_logger` when a scenario is
/// run with `--nocapture`; harmless no-op otherwise since later calls in the
/// same test binary just see `try_init` fail quietly.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn scenario_1_minimal_agent() {
    init_logging();
    let result = compile(
        &entry(),
        "agent MinimalAgent { name: string  description: string }",
        &CompileOptions {
            project_root: None,
            targets: vec![EmitTarget::JsonSchema],
        },
    );
    assert!(result.diagnostics.is_empty());
    let (_, schema_text) = &result.emitted[0];
    let schema: serde_json::Value = serde_json::from_str(schema_text).unwrap();
    assert_eq!(schema["properties"]["name"]["type"], "string");
    assert_eq!(schema["properties"]["description"]["type"], "string");
    assert_eq!(schema["required"], serde_json::json!(["name", "description"]));
    assert_eq!(schema["additionalProperties"], false);
    assert!(schema.get("$defs").is_none());
}

#[test]
fn scenario_2_enum_reference_is_lifted_into_defs() {
    let result = compile(
        &entry(),
        "enum Status { active inactive }\nagent A { status: Status }",
        &CompileOptions {
            project_root: None,
            targets: vec![EmitTarget::JsonSchema],
        },
    );
    assert!(result.diagnostics.is_empty());
    let schema: serde_json::Value = serde_json::from_str(&result.emitted[0].1).unwrap();
    assert_eq!(schema["$defs"]["Status"]["type"], "string");
    assert_eq!(schema["$defs"]["Status"]["enum"], serde_json::json!(["active", "inactive"]));
    assert_eq!(schema["properties"]["status"]["$ref"], "#/$defs/Status");
    assert_eq!(schema["required"], serde_json::json!(["status"]));
}

#[test]
fn scenario_3_constrained_range_and_its_inversion() {
    let result = compile(
        &entry(),
        "agent A { age: integer (0..120) }",
        &CompileOptions {
            project_root: None,
            targets: vec![EmitTarget::JsonSchema],
        },
    );
    assert!(result.diagnostics.is_empty());
    let schema: serde_json::Value = serde_json::from_str(&result.emitted[0].1).unwrap();
    assert_eq!(schema["properties"]["age"]["minimum"], 0);
    assert_eq!(schema["properties"]["age"]["maximum"], 120);

    let inverted = compile(&entry(), "agent A { age: integer (120..0) }", &CompileOptions::default());
    assert!(inverted
        .diagnostics
        .iter()
        .any(|d| d.code == Code::InvalidConstraintRange));
}

#[test]
fn scenario_4_workflow_cycle_names_the_path() {
    let wf = WorkflowDef {
        workflow_id: "wf.cycle".to_string(),
        name: "cyclical".to_string(),
        version: "1.0.0".to_string(),
        nodes: vec![
            workflow_node("a", NodeType::Input),
            workflow_node("b", NodeType::Transform),
            workflow_node("c", NodeType::Output),
        ],
        edges: vec![
            workflow_edge("e1", "a", "b"),
            workflow_edge("e2", "b", "a"),
            workflow_edge("e3", "b", "c"),
        ],
        metadata: None,
        id: None,
        location: SourceLocation::dummy(),
    };
    let program = adlc::ast::Program {
        imports: Vec::new(),
        declarations: vec![adlc::ast::Declaration::Workflow(wf)],
        agent: None,
        location: SourceLocation::dummy(),
    };
    let summary = validate_program(&program);
    let cycle = summary
        .diagnostics
        .iter()
        .find(|d| d.code == Code::CycleDetected)
        .expect("cycle should be reported");
    assert!(cycle.message.contains("a"));
    assert!(cycle.message.contains("b"));
}

#[test]
fn scenario_5_policy_missing_default_allow() {
    let policy = adlc::ast::PolicyDef {
        policy_id: "pol.no-default".to_string(),
        name: "NoDefault".to_string(),
        version: "1.0.0".to_string(),
        description: "missing a default allow rule".to_string(),
        rego: "package p\nallow if { true }".to_string(),
        enforcement: EnforcementDef {
            mode: "strict".to_string(),
            action: "deny".to_string(),
            audit_log: None,
            location: SourceLocation::dummy(),
        },
        data: None,
        id: None,
        location: SourceLocation::dummy(),
    };
    let program = adlc::ast::Program {
        imports: Vec::new(),
        declarations: vec![adlc::ast::Declaration::Policy(policy)],
        agent: None,
        location: SourceLocation::dummy(),
    };
    let summary = validate_program(&program);
    assert!(summary
        .diagnostics
        .iter()
        .any(|d| d.code == Code::InvalidRegoDefaultAllow));
}

#[test]
fn scenario_6_linter_autofix_of_tabs() {
    let source = "agent A {\n\tname: string\n}\n";
    let fixed = fix_source(source, &LintOptions::default());
    assert!(!fixed.contains('\t'));
    assert!(fixed.contains("  name: string"));

    let issues = lint_source(&fixed, &LintOptions::default());
    assert!(issues.iter().all(|i| i.rule != "no-tabs"));

    let refixed = fix_source(&fixed, &LintOptions::default());
    assert_eq!(fixed, refixed);
}

#[test]
fn property_p3_formatting_is_idempotent() {
    let source = "enum Status { active, inactive }\n\nagent A { status: Status  age: integer (0..120) }";
    let once = format_source(source, &FormatOptions::default()).unwrap();
    let twice = format_source(&once, &FormatOptions::default()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn property_p2_format_then_parse_preserves_structure() {
    let source = "agent A { name: string  age: integer (0..120) }";
    let formatted = format_source(source, &FormatOptions::default()).unwrap();
    let original = adlc::parser::parse(source).unwrap();
    let reparsed = adlc::parser::parse(&formatted).unwrap();
    assert_eq!(original.agent.as_ref().unwrap().fields.len(), reparsed.agent.as_ref().unwrap().fields.len());
    for (a, b) in original.agent.unwrap().fields.iter().zip(reparsed.agent.unwrap().fields.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.optional, b.optional);
    }
}

#[test]
fn property_p7_fix_is_a_strict_subset_of_fixable_issues() {
    let source = "agent A {   \n\tname: string   \n}\n";
    let before = lint_source(source, &LintOptions::default());
    let fixed = fix_source(source, &LintOptions::default());
    let after = lint_source(&fixed, &LintOptions::default());

    let fixable_before: Vec<_> = before
        .iter()
        .filter(|i| i.rule == "trailing-whitespace" || i.rule == "no-tabs" || i.rule == "empty-line-with-whitespace")
        .collect();
    assert!(!fixable_before.is_empty());
    assert!(after
        .iter()
        .all(|i| i.rule != "trailing-whitespace" && i.rule != "no-tabs" && i.rule != "empty-line-with-whitespace"));
}

#[test]
fn property_p8_suppression_disable_line_is_scoped() {
    let source = "agent assistant {\n  Name: string # adl-disable-line field-name-snake-case\n  Other: string\n}\n";
    let issues = lint_source(source, &LintOptions::default());
    assert!(!issues.iter().any(|i| i.rule == "field-name-snake-case" && i.location.line == 2));
    assert!(issues.iter().any(|i| i.rule == "field-name-snake-case" && i.location.line == 3));
}

fn workflow_node(id: &str, node_type: NodeType) -> WorkflowNode {
    WorkflowNode {
        id: id.to_string(),
        node_type,
        label: id.to_string(),
        config: serde_json::Value::Null,
        position: Position { x: 0.0, y: 0.0 },
        location: SourceLocation::dummy(),
    }
}

fn workflow_edge(id: &str, source: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge {
        edge_id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        relation: EdgeRelation::ControlFlow,
        condition: None,
        metadata: None,
        location: SourceLocation::dummy(),
    }
}
