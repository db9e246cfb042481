//! Free-standing rule checks that don't fit the per-node `Visitor` walk:
//! duplicate fields within one body, and the workflow/policy graph rules.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::ast::policy::{ENFORCEMENT_ACTIONS, ENFORCEMENT_MODES};
use crate::ast::{FieldDef, NodeType, PolicyDef, WorkflowDef, WorkflowNode};
use crate::error::{Code, Diagnostic};
use crate::location::SourceLocation;

/// Accepted `format` keyword values for a date/time-flavored constrained
/// string: a deliberately small set of accepted date/time layouts.
const ACCEPTED_DATE_TIME_FORMATS: &[&str] = &["date", "date-time", "time"];

/// The "recognized format specifier" check: `pattern` must parse as a
/// strftime layout with no error items. Using `chrono`'s own strftime item
/// parser catches malformed specifiers (`%Q`, a dangling `%`) that a
/// substring allowlist would miss.
fn chrono_pattern_is_valid(pattern: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};
    StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error))
}

/// Reports `INVALID_DATE_TIME_FORMAT`/`INVALID_DATE_TIME_PATTERN`. See
/// `TypeExpr::Constrained`'s doc comment for why these live on `format`/
/// `pattern` rather than on `min`/`max`.
pub fn validate_date_time_constraint(
    format: Option<&str>,
    pattern: Option<&str>,
    location: &SourceLocation,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if let Some(format) = format {
        if !ACCEPTED_DATE_TIME_FORMATS.contains(&format) {
            diagnostics.push(Diagnostic::new(
                Code::InvalidDateTimeFormat,
                format!("`{}` is not a recognized date/time layout", format),
                location.clone(),
            ));
        }
    }
    if let Some(pattern) = pattern {
        if !chrono_pattern_is_valid(pattern) {
            diagnostics.push(Diagnostic::new(
                Code::InvalidDateTimePattern,
                format!("pattern `{}` is not a valid strftime layout", pattern),
                location.clone(),
            ));
        }
    }
    diagnostics
}

const PRIMITIVES: &[&str] = &[
    "string", "integer", "number", "boolean", "object", "array", "any", "null",
];

pub fn is_primitive_name(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn duplicate_fields(fields: &[FieldDef]) -> Vec<Diagnostic> {
    let mut seen: HashMap<&str, &FieldDef> = HashMap::new();
    let mut diagnostics = Vec::new();
    for field in fields {
        if let Some(prior) = seen.insert(field.name.as_str(), field) {
            diagnostics.push(Diagnostic::new(
                Code::DuplicateField,
                format!(
                    "field `{}` is already declared at {}",
                    field.name, prior.location
                ),
                field.location.clone(),
            ));
        }
    }
    diagnostics
}

/// Workflow graph rules: `DUPLICATE_NODE_ID`, `INVALID_EDGE_REFERENCE`,
/// `CYCLE_DETECTED` (forward and reverse graphs), and the trigger/output/
/// condition structural invariants.
pub fn validate_workflow(workflow: &WorkflowDef) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let mut seen_ids: HashMap<&str, &WorkflowNode> = HashMap::new();
    for node in &workflow.nodes {
        if let Some(prior) = seen_ids.insert(node.id.as_str(), node) {
            diagnostics.push(Diagnostic::new(
                Code::DuplicateNodeId,
                format!(
                    "node id `{}` is already declared at {}",
                    node.id, prior.location
                ),
                node.location.clone(),
            ));
        }
    }

    let node_ids: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &workflow.edges {
        if !node_ids.contains(edge.source.as_str()) {
            diagnostics.push(Diagnostic::new(
                Code::InvalidEdgeReference,
                format!(
                    "edge `{}` references unknown source node `{}`",
                    edge.edge_id, edge.source
                ),
                edge.location.clone(),
            ));
        }
        if !node_ids.contains(edge.target.as_str()) {
            diagnostics.push(Diagnostic::new(
                Code::InvalidEdgeReference,
                format!(
                    "edge `{}` references unknown target node `{}`",
                    edge.edge_id, edge.target
                ),
                edge.location.clone(),
            ));
        }
    }

    let mut incoming: HashMap<&str, usize> = HashMap::new();
    let mut outgoing: HashMap<&str, usize> = HashMap::new();
    let mut forward: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &workflow.edges {
        if node_ids.contains(edge.source.as_str()) && node_ids.contains(edge.target.as_str()) {
            *outgoing.entry(edge.source.as_str()).or_insert(0) += 1;
            *incoming.entry(edge.target.as_str()).or_insert(0) += 1;
            forward
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
            reverse
                .entry(edge.target.as_str())
                .or_default()
                .push(edge.source.as_str());
        }
    }

    for node in &workflow.nodes {
        match node.node_type {
            NodeType::Trigger if incoming.get(node.id.as_str()).copied().unwrap_or(0) > 0 => {
                diagnostics.push(Diagnostic::new(
                    Code::TriggerHasIncomingEdge,
                    format!("trigger node `{}` must not have incoming edges", node.id),
                    node.location.clone(),
                ));
            }
            NodeType::Output if outgoing.get(node.id.as_str()).copied().unwrap_or(0) > 0 => {
                diagnostics.push(Diagnostic::new(
                    Code::OutputHasOutgoingEdge,
                    format!("output node `{}` must not have outgoing edges", node.id),
                    node.location.clone(),
                ));
            }
            NodeType::Condition if outgoing.get(node.id.as_str()).copied().unwrap_or(0) < 2 => {
                diagnostics.push(Diagnostic::new(
                    Code::ConditionNeedsTwoOutgoing,
                    format!(
                        "condition node `{}` must have at least two outgoing edges",
                        node.id
                    ),
                    node.location.clone(),
                ));
            }
            _ => {}
        }
    }

    if let Some(path) = find_cycle(&node_ids, &forward) {
        diagnostics.push(Diagnostic::new(
            Code::CycleDetected,
            format!("cycle detected: {}", path.join(" -> ")),
            workflow.location.clone(),
        ));
    }
    if let Some(path) = find_cycle(&node_ids, &reverse) {
        diagnostics.push(Diagnostic::new(
            Code::CycleDetected,
            format!("cycle detected in reversed graph: {}", path.join(" -> ")),
            workflow.location.clone(),
        ));
    }

    diagnostics
}

/// DFS with an explicit recursion stack; on hitting a node already on the
/// stack, returns the path from its first occurrence through the repeating
/// edge.
fn find_cycle<'a>(
    node_ids: &HashSet<&'a str>,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
) -> Option<Vec<&'a str>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    let mut sorted_ids: Vec<&str> = node_ids.iter().copied().collect();
    sorted_ids.sort_unstable();

    for &start in &sorted_ids {
        if visited.contains(start) {
            continue;
        }
        if let Some(path) = dfs(start, adjacency, &mut visited, &mut stack, &mut on_stack) {
            return Some(path);
        }
    }
    None
}

fn dfs<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
    on_stack: &mut HashSet<&'a str>,
) -> Option<Vec<&'a str>> {
    visited.insert(node);
    stack.push(node);
    on_stack.insert(node);

    if let Some(neighbors) = adjacency.get(node) {
        for &next in neighbors {
            if on_stack.contains(next) {
                let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut path: Vec<&str> = stack[start..].to_vec();
                path.push(next);
                return Some(path);
            }
            if !visited.contains(next) {
                if let Some(path) = dfs(next, adjacency, visited, stack, on_stack) {
                    return Some(path);
                }
            }
        }
    }

    stack.pop();
    on_stack.remove(node);
    None
}

/// Policy rules: `INVALID_ENFORCEMENT_MODE`/`ACTION`, the Rego required-
/// substring checks, and semver validation.
pub fn validate_policy(policy: &PolicyDef) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if !ENFORCEMENT_MODES.contains(&policy.enforcement.mode.as_str()) {
        diagnostics.push(Diagnostic::new(
            Code::InvalidEnforcementMode,
            format!("`{}` is not a recognized enforcement mode", policy.enforcement.mode),
            policy.enforcement.location.clone(),
        ));
    }
    if !ENFORCEMENT_ACTIONS.contains(&policy.enforcement.action.as_str()) {
        diagnostics.push(Diagnostic::new(
            Code::InvalidEnforcementAction,
            format!(
                "`{}` is not a recognized enforcement action",
                policy.enforcement.action
            ),
            policy.enforcement.location.clone(),
        ));
    }

    if !policy.rego.contains("package") {
        diagnostics.push(Diagnostic::new(
            Code::InvalidRegoPackage,
            "rego source must declare a `package`",
            policy.location.clone(),
        ));
    }
    if !policy.rego.contains("allow if") {
        diagnostics.push(Diagnostic::new(
            Code::InvalidRegoPackage,
            "rego source must define at least one `allow if` rule",
            policy.location.clone(),
        ));
    }
    if !policy.rego.contains("default allow :=") {
        diagnostics.push(Diagnostic::new(
            Code::InvalidRegoDefaultAllow,
            "rego source must define a `default allow :=` rule",
            policy.location.clone(),
        ));
    }

    if !is_semver(&policy.version) {
        diagnostics.push(Diagnostic::new(
            Code::InvalidSemver,
            format!("`{}` does not satisfy N.N.N(-suffix)?", policy.version),
            policy.location.clone(),
        ));
    }

    diagnostics
}

fn is_semver(version: &str) -> bool {
    // Evaluated once per call instead of being statically cached: policy
    // validation is not a hot path and this keeps the helper dependency-free
    // of a lazy-static crate this crate doesn't otherwise need.
    let pattern = Regex::new(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?$").expect("static pattern");
    pattern.is_match(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EnforcementDef, EdgeRelation, Position};
    use crate::location::SourceLocation;
    use serde_json::Value;

    #[test]
    fn accepted_date_format_is_not_flagged() {
        let diagnostics = validate_date_time_constraint(Some("date-time"), None, &SourceLocation::dummy());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unrecognized_format_keyword_is_flagged() {
        let diagnostics = validate_date_time_constraint(Some("timestamp"), None, &SourceLocation::dummy());
        assert!(diagnostics.iter().any(|d| d.code == Code::InvalidDateTimeFormat));
    }

    #[test]
    fn valid_strftime_pattern_is_not_flagged() {
        let diagnostics = validate_date_time_constraint(None, Some("%Y-%m-%dT%H:%M:%S"), &SourceLocation::dummy());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn malformed_strftime_pattern_is_flagged() {
        let diagnostics = validate_date_time_constraint(None, Some("%Q"), &SourceLocation::dummy());
        assert!(diagnostics.iter().any(|d| d.code == Code::InvalidDateTimePattern));
    }

    fn node(id: &str, node_type: NodeType) -> WorkflowNode {
        WorkflowNode {
            id: id.to_string(),
            node_type,
            label: id.to_string(),
            config: Value::Null,
            position: Position { x: 0.0, y: 0.0 },
            location: SourceLocation::dummy(),
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> crate::ast::WorkflowEdge {
        crate::ast::WorkflowEdge {
            edge_id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            relation: EdgeRelation::ControlFlow,
            condition: None,
            metadata: None,
            location: SourceLocation::dummy(),
        }
    }

    fn workflow(nodes: Vec<WorkflowNode>, edges: Vec<crate::ast::WorkflowEdge>) -> WorkflowDef {
        WorkflowDef {
            workflow_id: "wf.test".to_string(),
            name: "test".to_string(),
            version: "1.0.0".to_string(),
            nodes,
            edges,
            metadata: None,
            id: None,
            location: SourceLocation::dummy(),
        }
    }

    #[test]
    fn cycle_is_detected() {
        let wf = workflow(
            vec![
                node("a", NodeType::Input),
                node("b", NodeType::Transform),
                node("c", NodeType::Output),
            ],
            vec![edge("e1", "a", "b"), edge("e2", "b", "a"), edge("e3", "b", "c")],
        );
        let diagnostics = validate_workflow(&wf);
        assert!(diagnostics.iter().any(|d| d.code == Code::CycleDetected));
    }

    #[test]
    fn acyclic_graph_has_no_cycle_diagnostic() {
        let wf = workflow(
            vec![
                node("a", NodeType::Trigger),
                node("b", NodeType::Transform),
                node("c", NodeType::Output),
            ],
            vec![edge("e1", "a", "b"), edge("e2", "b", "c")],
        );
        let diagnostics = validate_workflow(&wf);
        assert!(!diagnostics.iter().any(|d| d.code == Code::CycleDetected));
    }

    #[test]
    fn duplicate_node_id_is_flagged() {
        let wf = workflow(
            vec![node("a", NodeType::Input), node("a", NodeType::Transform)],
            vec![],
        );
        let diagnostics = validate_workflow(&wf);
        assert!(diagnostics.iter().any(|d| d.code == Code::DuplicateNodeId));
    }

    #[test]
    fn invalid_edge_reference_is_flagged() {
        let wf = workflow(vec![node("a", NodeType::Input)], vec![edge("e1", "a", "ghost")]);
        let diagnostics = validate_workflow(&wf);
        assert!(diagnostics
            .iter()
            .any(|d| d.code == Code::InvalidEdgeReference));
    }

    #[test]
    fn trigger_with_incoming_edge_is_flagged() {
        let wf = workflow(
            vec![node("a", NodeType::Input), node("t", NodeType::Trigger)],
            vec![edge("e1", "a", "t")],
        );
        let diagnostics = validate_workflow(&wf);
        assert!(diagnostics
            .iter()
            .any(|d| d.code == Code::TriggerHasIncomingEdge));
    }

    #[test]
    fn output_with_outgoing_edge_is_flagged() {
        let wf = workflow(
            vec![node("o", NodeType::Output), node("a", NodeType::Input)],
            vec![edge("e1", "o", "a")],
        );
        let diagnostics = validate_workflow(&wf);
        assert!(diagnostics
            .iter()
            .any(|d| d.code == Code::OutputHasOutgoingEdge));
    }

    #[test]
    fn condition_needs_two_outgoing_edges() {
        let wf = workflow(
            vec![
                node("c", NodeType::Condition),
                node("a", NodeType::Output),
            ],
            vec![edge("e1", "c", "a")],
        );
        let diagnostics = validate_workflow(&wf);
        assert!(diagnostics
            .iter()
            .any(|d| d.code == Code::ConditionNeedsTwoOutgoing));
    }

    fn policy(rego: &str, version: &str, mode: &str, action: &str) -> PolicyDef {
        PolicyDef {
            policy_id: "pol.test".to_string(),
            name: "test".to_string(),
            version: version.to_string(),
            description: "d".to_string(),
            rego: rego.to_string(),
            enforcement: EnforcementDef {
                mode: mode.to_string(),
                action: action.to_string(),
                audit_log: None,
                location: SourceLocation::dummy(),
            },
            data: None,
            id: None,
            location: SourceLocation::dummy(),
        }
    }

    #[test]
    fn policy_missing_default_allow_is_flagged() {
        let p = policy("package p\nallow if { true }", "1.0.0", "strict", "deny");
        let diagnostics = validate_policy(&p);
        assert!(diagnostics
            .iter()
            .any(|d| d.code == Code::InvalidRegoDefaultAllow));
    }

    #[test]
    fn well_formed_policy_has_no_diagnostics() {
        let p = policy(
            "package p\nallow if { true }\ndefault allow := false",
            "1.2.3",
            "strict",
            "deny",
        );
        let diagnostics = validate_policy(&p);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn invalid_semver_is_flagged() {
        let p = policy(
            "package p\nallow if { true }\ndefault allow := false",
            "not-a-version",
            "strict",
            "deny",
        );
        let diagnostics = validate_policy(&p);
        assert!(diagnostics.iter().any(|d| d.code == Code::InvalidSemver));
    }

    #[test]
    fn invalid_enforcement_mode_is_flagged() {
        let p = policy(
            "package p\nallow if { true }\ndefault allow := false",
            "1.0.0",
            "chaotic",
            "deny",
        );
        let diagnostics = validate_policy(&p);
        assert!(diagnostics
            .iter()
            .any(|d| d.code == Code::InvalidEnforcementMode));
    }

    #[test]
    fn valid_identifier_rejects_leading_digit() {
        assert!(!is_valid_identifier("1abc"));
        assert!(is_valid_identifier("_abc"));
        assert!(is_valid_identifier("abc_123"));
    }
}
