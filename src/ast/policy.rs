//! `PolicyDef` and its enforcement settings. Same JSON-document authoring
//! story as `WorkflowDef`; see ast/workflow.rs's module doc.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::location::SourceLocation;

/// The enumerated set `mode` is checked against via
/// `INVALID_ENFORCEMENT_MODE`.
pub const ENFORCEMENT_MODES: &[&str] = &["strict", "moderate", "lenient"];

/// The enumerated set checked via `INVALID_ENFORCEMENT_ACTION`.
pub const ENFORCEMENT_ACTIONS: &[&str] = &["deny", "warn", "log", "allow"];

/// `mode`/`action` are kept as raw strings rather than closed Rust enums so
/// that an out-of-set value survives JSON deserialization and reaches the
/// validator as `INVALID_ENFORCEMENT_MODE`/`INVALID_ENFORCEMENT_ACTION`
/// instead of failing to parse at all — the same reasoning as
/// `WorkflowDef.nodes` being a `Vec` rather than a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementDef {
    pub mode: String,
    pub action: String,
    #[serde(default)]
    pub audit_log: Option<bool>,
    #[serde(skip, default = "SourceLocation::dummy")]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDef {
    pub policy_id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub rego: String,
    pub enforcement: EnforcementDef,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(skip, default = "SourceLocation::dummy")]
    pub location: SourceLocation,
}
