//! `AgentDef`: a top-level record, field semantics identical to `TypeBody`.

use super::types::FieldDef;
use crate::location::SourceLocation;

#[derive(Debug, Clone, PartialEq)]
pub struct AgentDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub location: SourceLocation,
}
