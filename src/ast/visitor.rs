//! Visitor trait for tree accumulators (validator, formatter, emitters).
//!
//! The reference implementation dispatches through a double-dispatch visitor
//! pair (`accept`/`visit_*`). Node kinds here are a closed set of `enum`s, so
//! an exhaustive `match` is sufficient and the compiler enforces that every
//! consumer handles every variant; `Visitor` exists purely to let the four
//! tree-walking consumers (C6–C9) share traversal code without copying it.
//! Its default methods recurse; override only the nodes you care about.

use super::{
    AgentDef, Declaration, EnumDef, FieldDef, PolicyDef, Program, TypeDef, TypeExpr, WorkflowDef,
};

pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_declaration(&mut self, decl: &Declaration) {
        walk_declaration(self, decl);
    }

    fn visit_enum_def(&mut self, _enum_def: &EnumDef) {}

    fn visit_type_def(&mut self, type_def: &TypeDef) {
        walk_type_def(self, type_def);
    }

    fn visit_agent_def(&mut self, agent_def: &AgentDef) {
        walk_agent_def(self, agent_def);
    }

    fn visit_workflow_def(&mut self, _workflow_def: &WorkflowDef) {}

    fn visit_policy_def(&mut self, _policy_def: &PolicyDef) {}

    fn visit_field_def(&mut self, field_def: &FieldDef) {
        self.visit_type_expr(&field_def.type_expr);
    }

    fn visit_type_expr(&mut self, type_expr: &TypeExpr) {
        walk_type_expr(self, type_expr);
    }
}

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    for decl in &program.declarations {
        visitor.visit_declaration(decl);
    }
    if let Some(agent) = &program.agent {
        visitor.visit_agent_def(agent);
    }
}

pub fn walk_declaration<V: Visitor + ?Sized>(visitor: &mut V, decl: &Declaration) {
    match decl {
        Declaration::Enum(e) => visitor.visit_enum_def(e),
        Declaration::Type(t) => visitor.visit_type_def(t),
        Declaration::Workflow(w) => visitor.visit_workflow_def(w),
        Declaration::Policy(p) => visitor.visit_policy_def(p),
    }
}

pub fn walk_type_def<V: Visitor + ?Sized>(visitor: &mut V, type_def: &TypeDef) {
    if let Some(body) = &type_def.body {
        for field in &body.fields {
            visitor.visit_field_def(field);
        }
    }
}

pub fn walk_agent_def<V: Visitor + ?Sized>(visitor: &mut V, agent_def: &AgentDef) {
    for field in &agent_def.fields {
        visitor.visit_field_def(field);
    }
}

pub fn walk_type_expr<V: Visitor + ?Sized>(visitor: &mut V, type_expr: &TypeExpr) {
    match type_expr {
        TypeExpr::Primitive { .. } | TypeExpr::Reference { .. } => {}
        TypeExpr::Array { element, .. } => visitor.visit_type_expr(element),
        TypeExpr::Union { variants, .. } => {
            for v in variants {
                visitor.visit_type_expr(v);
            }
        }
        TypeExpr::Optional { inner, .. } => visitor.visit_type_expr(inner),
        TypeExpr::Constrained { base, .. } => visitor.visit_type_expr(base),
    }
}
