//! `WorkflowDef` and its graph nodes/edges.
//!
//! Workflow and policy declarations are not part of the textual grammar
//! (its productions cover only `import`/`enum`/`type`/`agent`); they are
//! authored as standalone JSON documents with this shape and attached to a
//! `Program` through the compiler API, the way an imported JSON component is
//! folded into the compilation environment. See DESIGN.md "Open question:
//! workflow/policy concrete syntax" for the rationale.
//!
//! `nodes` is modeled as an ordered `Vec<WorkflowNode>` with an explicit
//! `id` on each node rather than a native map keyed by node id. A map can't
//! hold two entries under the same key, which would make `DUPLICATE_NODE_ID`
//! unobservable by construction; an ordered list lets the validator detect
//! and report the duplicate instead of silently collapsing it, matching how
//! `edges`/`fields` are already ordered sequences elsewhere in this module.
//! See DESIGN.md for this decision.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::location::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Trigger,
    Input,
    Transform,
    Action,
    Condition,
    Loop,
    Output,
    SubWorkflow,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    #[serde(default)]
    pub config: Value,
    pub position: Position,
    #[serde(skip, default = "SourceLocation::dummy")]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRelation {
    DataFlow,
    ControlFlow,
    ErrorFlow,
    #[serde(rename = "ai_languageModel")]
    AiLanguageModel,
    #[serde(rename = "ai_tool")]
    AiTool,
    Dependency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub edge_id: String,
    pub source: String,
    pub target: String,
    pub relation: EdgeRelation,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(skip, default = "SourceLocation::dummy")]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
    pub workflow_id: String,
    pub name: String,
    pub version: String,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Accepted alongside `workflow_id` for backward compatibility; the
    /// validator never treats it as authoritative.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(skip, default = "SourceLocation::dummy")]
    pub location: SourceLocation,
}

impl WorkflowDef {
    /// O(1) node lookup by id for edge/cycle validation. Does not itself
    /// detect duplicate ids; callers that must (the validator) scan `nodes`
    /// directly so the duplicate's own location is available to report.
    pub fn node_map(&self) -> HashMap<&str, &WorkflowNode> {
        let mut map = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            map.insert(node.id.as_str(), node);
        }
        map
    }
}
