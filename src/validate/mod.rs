//! Semantic Validator (C6): AST-wide rule checks plus workflow/policy graph
//! checks, with early termination and content-hash memoization. Built on
//! the shared `Visitor` trait: one accumulator struct walks the typed tree.

mod cache;
mod instance;
pub(crate) mod rules;

pub use cache::ValidationCache;
pub use instance::validate_json;

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::ast::{Declaration, Program, TypeExpr, Visitor};
use crate::error::{Category, Code, Diagnostic};
use crate::location::SourceLocation;

/// Errors in these categories count toward the early-termination ceiling.
const CRITICAL_CATEGORIES: [Category; 2] = [Category::Semantic, Category::Type];
const CRITICAL_ERROR_LIMIT: usize = 10;

/// Output of a validation run: every diagnostic plus convenience views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrorSummary {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationErrorSummary {
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.category() == category)
    }

    pub fn terminated(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.code == Code::ValidationTerminated)
    }

    /// The `top_n` most-repeated diagnostic messages, most frequent first.
    pub fn top_repeated(&self, top_n: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for d in &self.diagnostics {
            *counts.entry(d.message.as_str()).or_insert(0) += 1;
        }
        let mut pairs: Vec<(String, usize)> =
            counts.into_iter().map(|(m, c)| (m.to_string(), c)).collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs.truncate(top_n);
        pairs
    }
}

/// Validates a `Program` against every semantic rule, stopping early once
/// `CRITICAL_ERROR_LIMIT` semantic/type errors have accumulated.
pub fn validate_program(program: &Program) -> ValidationErrorSummary {
    debug!("validating program with {} declarations", program.declarations.len());
    let mut validator = Validator::new(program);
    validator.visit_program(program);
    validator.finish()
}

struct Validator<'p> {
    program: &'p Program,
    diagnostics: Vec<Diagnostic>,
    critical_count: usize,
    terminated: bool,
    seen_type_names: HashMap<&'p str, &'p SourceLocation>,
    seen_enum_names: HashMap<&'p str, &'p SourceLocation>,
    seen_policy_ids: HashMap<&'p str, &'p SourceLocation>,
}

impl<'p> Validator<'p> {
    fn new(program: &'p Program) -> Self {
        Self {
            program,
            diagnostics: Vec::new(),
            critical_count: 0,
            terminated: false,
            seen_type_names: HashMap::new(),
            seen_enum_names: HashMap::new(),
            seen_policy_ids: HashMap::new(),
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if self.terminated {
            return;
        }
        if CRITICAL_CATEGORIES.contains(&diagnostic.category()) {
            self.critical_count += 1;
        }
        self.diagnostics.push(diagnostic);
        if self.critical_count >= CRITICAL_ERROR_LIMIT {
            self.terminated = true;
            self.diagnostics.push(Diagnostic::new(
                Code::ValidationTerminated,
                format!(
                    "validation stopped after {} critical errors",
                    CRITICAL_ERROR_LIMIT
                ),
                SourceLocation::dummy(),
            ));
        }
    }

    fn finish(self) -> ValidationErrorSummary {
        ValidationErrorSummary {
            diagnostics: self.diagnostics,
        }
    }

    /// True if `name` resolves to a primitive or a declared `EnumDef`/
    /// `TypeDef`; otherwise the caller reports `INVALID_TYPE_REFERENCE`.
    fn type_name_resolves(&self, name: &str) -> bool {
        if rules::is_primitive_name(name) {
            return true;
        }
        self.program.find_type_or_enum(name).is_some()
    }
}

impl<'p> Visitor for Validator<'p> {
    fn visit_declaration(&mut self, decl: &Declaration) {
        if self.terminated {
            return;
        }
        match decl {
            Declaration::Type(t) => {
                if let Some(prior) = self.seen_type_names.insert(t.name.as_str(), &t.location) {
                    self.report(Diagnostic::new(
                        Code::DuplicateType,
                        format!("`{}` is already declared at {}", t.name, prior),
                        t.location.clone(),
                    ));
                }
            }
            Declaration::Enum(e) => {
                if let Some(prior) = self.seen_enum_names.insert(e.name.as_str(), &e.location) {
                    self.report(Diagnostic::new(
                        Code::DuplicateEnum,
                        format!("`{}` is already declared at {}", e.name, prior),
                        e.location.clone(),
                    ));
                }
            }
            Declaration::Policy(p) => {
                if let Some(prior) = self
                    .seen_policy_ids
                    .insert(p.policy_id.as_str(), &p.location)
                {
                    self.report(Diagnostic::new(
                        Code::DuplicatePolicyId,
                        format!("policy id `{}` is already declared at {}", p.policy_id, prior),
                        p.location.clone(),
                    ));
                }
            }
            Declaration::Workflow(_) => {}
        }
        crate::ast::visitor::walk_declaration(self, decl);
    }

    fn visit_enum_def(&mut self, enum_def: &crate::ast::EnumDef) {
        let mut seen = HashSet::new();
        for (value, location) in &enum_def.values {
            if !seen.insert(value.as_str()) {
                self.report(Diagnostic::new(
                    Code::DuplicateEnumValue,
                    format!("duplicate enum value `{}` in `{}`", value, enum_def.name),
                    location.clone(),
                ));
            }
            if !rules::is_valid_identifier(value) {
                self.report(Diagnostic::new(
                    Code::InvalidEnumValueName,
                    format!("enum value `{}` is not a valid identifier", value),
                    location.clone(),
                ));
            }
        }
    }

    fn visit_type_def(&mut self, type_def: &crate::ast::TypeDef) {
        if self.terminated {
            return;
        }
        if let Some(body) = &type_def.body {
            for diagnostic in rules::duplicate_fields(&body.fields) {
                self.report(diagnostic);
            }
        }
        crate::ast::visitor::walk_type_def(self, type_def);
    }

    fn visit_agent_def(&mut self, agent_def: &crate::ast::AgentDef) {
        if self.terminated {
            return;
        }
        for diagnostic in rules::duplicate_fields(&agent_def.fields) {
            self.report(diagnostic);
        }
        crate::ast::visitor::walk_agent_def(self, agent_def);
    }

    fn visit_type_expr(&mut self, type_expr: &TypeExpr) {
        match type_expr {
            TypeExpr::Reference { name, location } => {
                if !self.type_name_resolves(name) {
                    self.report(Diagnostic::new(
                        Code::InvalidTypeReference,
                        format!("`{}` does not resolve to a known type or enum", name),
                        location.clone(),
                    ));
                }
            }
            TypeExpr::Constrained {
                min,
                max,
                format,
                pattern,
                location,
                ..
            } => {
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        self.report(Diagnostic::new(
                            Code::InvalidConstraintRange,
                            format!("range minimum {} is greater than maximum {}", min, max),
                            location.clone(),
                        ));
                    }
                }
                for diagnostic in rules::validate_date_time_constraint(
                    format.as_deref(),
                    pattern.as_deref(),
                    location,
                ) {
                    self.report(diagnostic);
                }
            }
            _ => {}
        }
        crate::ast::visitor::walk_type_expr(self, type_expr);
    }

    fn visit_workflow_def(&mut self, workflow_def: &crate::ast::WorkflowDef) {
        for diagnostic in rules::validate_workflow(workflow_def) {
            self.report(diagnostic);
        }
    }

    fn visit_policy_def(&mut self, policy_def: &crate::ast::PolicyDef) {
        for diagnostic in rules::validate_policy(policy_def) {
            self.report(diagnostic);
        }
    }
}

// TypeExpr matched in a field's position (as opposed to nested inside
// Array/Union/etc, which `walk_type_expr` already recurses into) needs no
// special handling distinct from `visit_type_expr`; `FieldDef` duplicate
// names are scope-local so they're checked where the scope is visible
// (`walk_type_def`/`walk_agent_def` bodies), see `rules::duplicate_fields`.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn minimal_agent_has_no_diagnostics() {
        let program = parse("agent A { name: string  description: string }").unwrap();
        let summary = validate_program(&program);
        assert!(summary.is_empty(), "{:?}", summary.diagnostics);
    }

    #[test]
    fn duplicate_type_is_flagged_against_second_occurrence() {
        let program = parse("type Foo { a: string }\ntype Foo { b: integer }").unwrap();
        let summary = validate_program(&program);
        assert!(summary
            .diagnostics
            .iter()
            .any(|d| d.code == Code::DuplicateType));
    }

    #[test]
    fn duplicate_field_in_agent_body() {
        let program = parse("agent A { name: string  name: integer }").unwrap();
        let summary = validate_program(&program);
        assert!(summary
            .diagnostics
            .iter()
            .any(|d| d.code == Code::DuplicateField));
    }

    #[test]
    fn unresolved_reference_is_flagged() {
        let program = parse("agent A { status: Status }").unwrap();
        let summary = validate_program(&program);
        assert!(summary
            .diagnostics
            .iter()
            .any(|d| d.code == Code::InvalidTypeReference));
    }

    #[test]
    fn resolved_reference_is_not_flagged() {
        let program = parse("enum Status { active, inactive }\nagent A { status: Status }").unwrap();
        let summary = validate_program(&program);
        assert!(summary.is_empty(), "{:?}", summary.diagnostics);
    }

    #[test]
    fn inverted_constraint_range_is_flagged() {
        let program = parse("agent A { age: integer (120..0) }").unwrap();
        let summary = validate_program(&program);
        assert!(summary
            .diagnostics
            .iter()
            .any(|d| d.code == Code::InvalidConstraintRange));
    }

    #[test]
    fn duplicate_enum_value_is_flagged() {
        let program = parse("enum Status { active, active }").unwrap();
        let summary = validate_program(&program);
        assert!(summary
            .diagnostics
            .iter()
            .any(|d| d.code == Code::DuplicateEnumValue));
    }

    #[test]
    fn top_repeated_orders_by_frequency() {
        let program = parse("type Foo { a: string }\ntype Foo { b: integer }\nenum Status { x, x }")
            .unwrap();
        let summary = validate_program(&program);
        let top = summary.top_repeated(5);
        assert!(!top.is_empty());
    }

    #[test]
    fn cache_returns_identical_summary_for_structurally_equal_programs() {
        let a = parse("agent A { name: string }").unwrap();
        let b = parse("agent A { name: string }").unwrap();
        let mut cache = ValidationCache::new();
        let first = cache.validate(&a);
        let second = cache.validate(&b);
        assert_eq!(first, second);
    }
}
