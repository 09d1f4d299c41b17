//! Post-order AST traversal.
//!
//! Two traits, one per mutability: [`Visitor`] for analysis passes and
//! [`MutVisitor`] for rewriting passes. Both follow the same shape: a
//! `visit_*` method per node kind (default: no-op) and free `walk_*`
//! functions that visit children first, then invoke the node's method.
//! A pass implements only the methods for the node kinds it cares about.
//!
//! Traversal itself never changes the tree shape; rewriting passes swap in
//! replacement statement lists from inside `visit_always_body_mut`.

use super::decl::{AlwaysBody, AssignRhs, Program, Stmt, StmtKind, Trait, TraitInitializer, UnitDecl, VarDecl};
use super::expr::{Arithmetic, ArithKind, Field, LogicKind, Logical};

/// Read-only post-order visitor.
pub trait Visitor {
    fn visit_program(&mut self, _n: &Program) {}
    fn visit_trait(&mut self, _n: &Trait) {}
    fn visit_var_decl(&mut self, _n: &VarDecl) {}
    fn visit_always_body(&mut self, _n: &AlwaysBody) {}
    fn visit_stmt(&mut self, _n: &Stmt) {}
    fn visit_arithmetic(&mut self, _n: &Arithmetic) {}
    fn visit_logical(&mut self, _n: &Logical) {}
    fn visit_field(&mut self, _n: &Field) {}
    fn visit_trait_initializer(&mut self, _n: &TraitInitializer) {}
    fn visit_unit_decl(&mut self, _n: &UnitDecl) {}
}

pub fn walk_program<V: Visitor + ?Sized>(v: &mut V, n: &Program) {
    for tr in &n.traits {
        walk_trait(v, tr);
    }
    for unit in &n.units {
        walk_unit_decl(v, unit);
    }
    v.visit_program(n);
}

pub fn walk_trait<V: Visitor + ?Sized>(v: &mut V, n: &Trait) {
    for decl in &n.properties {
        v.visit_var_decl(decl);
    }
    walk_always_body(v, &n.body);
    v.visit_trait(n);
}

pub fn walk_always_body<V: Visitor + ?Sized>(v: &mut V, n: &AlwaysBody) {
    for stmt in &n.exprs {
        walk_stmt(v, stmt);
    }
    v.visit_always_body(n);
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, n: &Stmt) {
    match &n.kind {
        StmtKind::Assignment { lhs, rhs, .. } => {
            v.visit_field(lhs);
            match rhs {
                AssignRhs::Arithmetic(a) => walk_arithmetic(v, a),
                AssignRhs::Logical(l) => walk_logical(v, l),
            }
        }
        StmtKind::ContinuousIf { condition, body }
        | StmtKind::TransitionIf { condition, body } => {
            walk_logical(v, condition);
            walk_always_body(v, body);
        }
        StmtKind::ForIn { body, .. } => {
            walk_always_body(v, body);
        }
    }
    v.visit_stmt(n);
}

pub fn walk_arithmetic<V: Visitor + ?Sized>(v: &mut V, n: &Arithmetic) {
    match &n.kind {
        ArithKind::Add(a, b)
        | ArithKind::Sub(a, b)
        | ArithKind::Mul(a, b)
        | ArithKind::Div(a, b)
        | ArithKind::Mod(a, b)
        | ArithKind::Exp(a, b) => {
            walk_arithmetic(v, a);
            walk_arithmetic(v, b);
        }
        ArithKind::Field(f) => v.visit_field(f),
        ArithKind::Int(_) | ArithKind::Float(_) => {}
    }
    v.visit_arithmetic(n);
}

pub fn walk_logical<V: Visitor + ?Sized>(v: &mut V, n: &Logical) {
    match &n.kind {
        LogicKind::And(a, b) | LogicKind::Or(a, b) => {
            walk_logical(v, a);
            walk_logical(v, b);
        }
        LogicKind::Not(inner) => walk_logical(v, inner),
        LogicKind::Comparison { lhs, rhs, .. } => {
            walk_arithmetic(v, lhs);
            walk_arithmetic(v, rhs);
        }
        LogicKind::Field(f) => v.visit_field(f),
        LogicKind::Bool(_) => {}
    }
    v.visit_logical(n);
}

pub fn walk_unit_decl<V: Visitor + ?Sized>(v: &mut V, n: &UnitDecl) {
    for init in &n.initializers {
        v.visit_trait_initializer(init);
    }
    v.visit_unit_decl(n);
}

/// Mutating post-order visitor.
pub trait MutVisitor {
    fn visit_program_mut(&mut self, _n: &mut Program) {}
    fn visit_trait_mut(&mut self, _n: &mut Trait) {}
    fn visit_var_decl_mut(&mut self, _n: &mut VarDecl) {}
    fn visit_always_body_mut(&mut self, _n: &mut AlwaysBody) {}
    fn visit_stmt_mut(&mut self, _n: &mut Stmt) {}
    fn visit_arithmetic_mut(&mut self, _n: &mut Arithmetic) {}
    fn visit_logical_mut(&mut self, _n: &mut Logical) {}
    fn visit_field_mut(&mut self, _n: &mut Field) {}
    fn visit_trait_initializer_mut(&mut self, _n: &mut TraitInitializer) {}
    fn visit_unit_decl_mut(&mut self, _n: &mut UnitDecl) {}
}

pub fn walk_program_mut<V: MutVisitor + ?Sized>(v: &mut V, n: &mut Program) {
    for tr in &mut n.traits {
        walk_trait_mut(v, tr);
    }
    for unit in &mut n.units {
        walk_unit_decl_mut(v, unit);
    }
    v.visit_program_mut(n);
}

pub fn walk_trait_mut<V: MutVisitor + ?Sized>(v: &mut V, n: &mut Trait) {
    for decl in &mut n.properties {
        v.visit_var_decl_mut(decl);
    }
    walk_always_body_mut(v, &mut n.body);
    v.visit_trait_mut(n);
}

pub fn walk_always_body_mut<V: MutVisitor + ?Sized>(v: &mut V, n: &mut AlwaysBody) {
    for stmt in &mut n.exprs {
        walk_stmt_mut(v, stmt);
    }
    v.visit_always_body_mut(n);
}

pub fn walk_stmt_mut<V: MutVisitor + ?Sized>(v: &mut V, n: &mut Stmt) {
    match &mut n.kind {
        StmtKind::Assignment { lhs, rhs, .. } => {
            v.visit_field_mut(lhs);
            match rhs {
                AssignRhs::Arithmetic(a) => walk_arithmetic_mut(v, a),
                AssignRhs::Logical(l) => walk_logical_mut(v, l),
            }
        }
        StmtKind::ContinuousIf { condition, body }
        | StmtKind::TransitionIf { condition, body } => {
            walk_logical_mut(v, condition);
            walk_always_body_mut(v, body);
        }
        StmtKind::ForIn { body, .. } => {
            walk_always_body_mut(v, body);
        }
    }
    v.visit_stmt_mut(n);
}

pub fn walk_arithmetic_mut<V: MutVisitor + ?Sized>(v: &mut V, n: &mut Arithmetic) {
    match &mut n.kind {
        ArithKind::Add(a, b)
        | ArithKind::Sub(a, b)
        | ArithKind::Mul(a, b)
        | ArithKind::Div(a, b)
        | ArithKind::Mod(a, b)
        | ArithKind::Exp(a, b) => {
            walk_arithmetic_mut(v, a);
            walk_arithmetic_mut(v, b);
        }
        ArithKind::Field(f) => v.visit_field_mut(f),
        ArithKind::Int(_) | ArithKind::Float(_) => {}
    }
    v.visit_arithmetic_mut(n);
}

pub fn walk_logical_mut<V: MutVisitor + ?Sized>(v: &mut V, n: &mut Logical) {
    match &mut n.kind {
        LogicKind::And(a, b) | LogicKind::Or(a, b) => {
            walk_logical_mut(v, a);
            walk_logical_mut(v, b);
        }
        LogicKind::Not(inner) => walk_logical_mut(v, inner),
        LogicKind::Comparison { lhs, rhs, .. } => {
            walk_arithmetic_mut(v, lhs);
            walk_arithmetic_mut(v, rhs);
        }
        LogicKind::Field(f) => v.visit_field_mut(f),
        LogicKind::Bool(_) => {}
    }
    v.visit_logical_mut(n);
}

pub fn walk_unit_decl_mut<V: MutVisitor + ?Sized>(v: &mut V, n: &mut UnitDecl) {
    for init in &mut n.initializers {
        v.visit_trait_initializer_mut(init);
    }
    v.visit_unit_decl_mut(n);
}
