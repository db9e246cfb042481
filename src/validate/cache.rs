//! Compilation-local memoization of validation results, keyed by a content
//! hash over declaration and field names.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use log::trace;

use crate::ast::{Declaration, Program};

use super::{validate_program, ValidationErrorSummary};

#[derive(Debug, Default)]
pub struct ValidationCache {
    entries: HashMap<u64, ValidationErrorSummary>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached summary for structurally identical input, or
    /// validates and caches the result. Deliberately ignores `SourceLocation`
    /// so a cosmetic edit (reformatting, comment changes) doesn't miss.
    pub fn validate(&mut self, program: &Program) -> ValidationErrorSummary {
        let key = content_hash(program);
        if let Some(cached) = self.entries.get(&key) {
            trace!("validation cache hit for key {:x}", key);
            return cached.clone();
        }
        let summary = validate_program(program);
        self.entries.insert(key, summary.clone());
        summary
    }
}

fn content_hash(program: &Program) -> u64 {
    let mut hasher = DefaultHasher::new();
    for decl in &program.declarations {
        decl.name().hash(&mut hasher);
        match decl {
            Declaration::Type(t) => {
                if let Some(body) = &t.body {
                    for field in &body.fields {
                        field.name.hash(&mut hasher);
                    }
                }
            }
            Declaration::Enum(e) => {
                for (value, _) in &e.values {
                    value.hash(&mut hasher);
                }
            }
            Declaration::Workflow(w) => {
                for node in &w.nodes {
                    node.id.hash(&mut hasher);
                }
                for edge in &w.edges {
                    edge.edge_id.hash(&mut hasher);
                }
            }
            Declaration::Policy(p) => {
                p.policy_id.hash(&mut hasher);
            }
        }
    }
    if let Some(agent) = &program.agent {
        agent.name.hash(&mut hasher);
        for field in &agent.fields {
            field.name.hash(&mut hasher);
        }
    }
    hasher.finish()
}
