//! Semantic checking.
//!
//! Runs after parsing and after every structural pass. All checks from
//! the language rules are applied in one post-order traversal:
//!
//! - integer type bounds and orientation
//! - property/trait/unit uniqueness
//! - field resolution (custom, builtin, and intrinsic)
//! - arithmetic/logical context kinds
//! - assignment kind agreement and writability
//! - loop ranges and trait filters
//! - initializer property existence, kinds, and ranges
//!
//! # Poisoning
//!
//! A diagnostic on node N marks N and every ancestor of N as poisoned;
//! checks on poisoned nodes are skipped. Post-order traversal visits
//! children first, so an error deep in an expression silences the
//! cascading errors its enclosing statement would otherwise produce.

use std::collections::HashSet;

use crate::ast::{
    self, AssignRhs, ArithKind, Field, LogicKind, MemberOp, Program, ScopeIndex, Stmt, StmtKind,
    Trait, TraitInitializer, UnitObject, VarDecl,
};
use crate::ast::visit::{walk_program, Visitor};
use crate::ast::{Literal, TypeKind, NUM_BITS};
use crate::builtins;
use crate::error::{CompileError, ErrorKind};
use crate::foundation::{NodeArena, NodeId, NodeKind, Span};
use crate::resolve::Resolver;

/// Inclusive window for integer type bounds. Asymmetric: both ends are
/// themselves legal bound values.
const BOUND_MIN: i64 = -(1i64 << (NUM_BITS - 1));
const BOUND_MAX: i64 = 1i64 << (NUM_BITS - 1);

/// Check a linked program, returning all diagnostics found.
pub fn check(program: &Program, arena: &NodeArena, scopes: &ScopeIndex) -> Vec<CompileError> {
    let mut checker = Checker {
        program,
        arena,
        scopes,
        errors: Vec::new(),
        poisoned: HashSet::new(),
    };
    walk_program(&mut checker, program);
    checker.errors
}

struct Checker<'a> {
    program: &'a Program,
    arena: &'a NodeArena,
    scopes: &'a ScopeIndex,
    errors: Vec<CompileError>,
    poisoned: HashSet<NodeId>,
}

impl<'a> Checker<'a> {
    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.program, self.arena, self.scopes)
    }

    fn skip(&self, id: NodeId) -> bool {
        self.poisoned.contains(&id)
    }

    /// Record a diagnostic and poison the node and all its ancestors.
    fn error(&mut self, id: NodeId, span: Span, kind: ErrorKind, message: String) {
        self.poisoned.insert(id);
        for ancestor in self.arena.ancestors(id) {
            self.poisoned.insert(ancestor);
        }
        self.errors.push(CompileError::new(kind, span, message));
    }
}

impl Visitor for Checker<'_> {
    fn visit_var_decl(&mut self, n: &VarDecl) {
        if self.skip(n.id) || n.ty.kind != TypeKind::Int {
            return;
        }

        if n.ty.min < BOUND_MIN || n.ty.min > BOUND_MAX {
            self.error(
                n.id,
                n.span,
                ErrorKind::Bounds,
                format!("lower bound {} of int type is out of bounds", n.ty.min),
            );
        }
        if n.ty.max < BOUND_MIN || n.ty.max > BOUND_MAX {
            self.error(
                n.id,
                n.span,
                ErrorKind::Bounds,
                format!("upper bound {} of int type is out of bounds", n.ty.max),
            );
        }
        if n.ty.max <= n.ty.min {
            self.error(
                n.id,
                n.span,
                ErrorKind::Bounds,
                "upper bound of int type must be greater than lower bound".to_string(),
            );
        }
    }

    fn visit_trait(&mut self, n: &Trait) {
        if self.skip(n.id) {
            return;
        }

        let mut seen = HashSet::new();
        for decl in &n.properties {
            if !seen.insert(decl.name.as_str()) {
                self.error(
                    decl.id,
                    decl.span,
                    ErrorKind::Naming,
                    format!(
                        "multiple properties named '{}' in trait '{}'",
                        decl.name, n.name
                    ),
                );
            }
        }
    }

    fn visit_field(&mut self, n: &Field) {
        if self.skip(n.id) {
            return;
        }

        match n.member_op {
            MemberOp::Custom => self.check_custom_field(n),
            MemberOp::Builtin => {
                if builtins::builtin_kind(&n.name).is_none() {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Resolution,
                        format!("unknown builtin field '{}'", n.name),
                    );
                }
            }
            MemberOp::Language => {
                if !builtins::is_language_intrinsic(&n.name) {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Resolution,
                        format!("unknown language intrinsic '{}'", n.name),
                    );
                }
            }
        }
    }

    fn visit_arithmetic(&mut self, n: &ast::Arithmetic) {
        if self.skip(n.id) {
            return;
        }

        let ArithKind::Field(field) = &n.kind else {
            return;
        };
        let Some(ty) = self.resolver().field_type(field) else {
            // Resolution already failed on the field itself.
            return;
        };

        if !ty.is_arithmetic() {
            // A lone field directly under an assignment is judged by the
            // assignment rule against the left-hand side instead.
            if self.arena.parent(n.id).map(|p| self.arena.kind(p)) == Some(NodeKind::Stmt) {
                return;
            }
            self.error(
                n.id,
                n.span,
                ErrorKind::Type,
                format!(
                    "field '{}' used in arithmetic expression is neither an int nor a float",
                    field.name
                ),
            );
        }
    }

    fn visit_logical(&mut self, n: &ast::Logical) {
        if self.skip(n.id) {
            return;
        }

        let LogicKind::Field(field) = &n.kind else {
            return;
        };
        let Some(ty) = self.resolver().field_type(field) else {
            return;
        };

        if !ty.is_logical() {
            self.error(
                n.id,
                n.span,
                ErrorKind::Type,
                format!(
                    "field '{}' used in logical expression is not of type bool",
                    field.name
                ),
            );
        }
    }

    fn visit_stmt(&mut self, n: &Stmt) {
        if self.skip(n.id) {
            return;
        }

        match &n.kind {
            StmtKind::Assignment { lhs, rhs, .. } => self.check_assignment(n, lhs, rhs),
            StmtKind::ForIn {
                range,
                range_unit,
                traits,
                ..
            } => self.check_for_in(n, *range, range_unit, traits),
            StmtKind::ContinuousIf { .. } | StmtKind::TransitionIf { .. } => {}
        }
    }

    fn visit_trait_initializer(&mut self, n: &TraitInitializer) {
        if self.skip(n.id) {
            return;
        }

        let Some(tr) = self.program.trait_by_name(&n.name) else {
            self.error(
                n.id,
                n.span,
                ErrorKind::Resolution,
                format!("undeclared trait '{}' in trait initializer", n.name),
            );
            return;
        };

        for (property_name, value) in &n.values {
            let Some(property) = tr.property(property_name) else {
                self.error(
                    n.id,
                    n.span,
                    ErrorKind::Resolution,
                    format!("undeclared property '{}' in trait initializer", property_name),
                );
                continue;
            };

            let ty = property.ty;
            match value {
                Literal::Bool(_) if ty.kind != TypeKind::Bool => {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Type,
                        format!(
                            "initial value for property '{}' is a bool, but the property is not",
                            property_name
                        ),
                    );
                }
                Literal::Float(_) if ty.kind != TypeKind::Float => {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Type,
                        format!(
                            "initial value for property '{}' is a float, but the property is not",
                            property_name
                        ),
                    );
                }
                Literal::Int(v) => {
                    if ty.kind != TypeKind::Int {
                        self.error(
                            n.id,
                            n.span,
                            ErrorKind::Type,
                            format!(
                                "initial value for property '{}' is an int, but the property is not",
                                property_name
                            ),
                        );
                    } else if *v < ty.min || *v > ty.max {
                        self.error(
                            n.id,
                            n.span,
                            ErrorKind::Bounds,
                            format!(
                                "initial value {} is out of the specified bounds for property '{}'",
                                v, property_name
                            ),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_program(&mut self, n: &Program) {
        if self.skip(n.id) {
            return;
        }

        let mut traits = HashSet::new();
        for tr in &n.traits {
            if !traits.insert(tr.name.as_str()) {
                self.error(
                    tr.id,
                    tr.span,
                    ErrorKind::Naming,
                    format!("trait '{}' declared more than once", tr.name),
                );
            }
        }

        let mut units = HashSet::new();
        for unit in &n.units {
            if !units.insert(unit.name.as_str()) {
                self.error(
                    unit.id,
                    unit.span,
                    ErrorKind::Naming,
                    format!("unit '{}' has multiple trait assignments", unit.name),
                );
            }
        }
    }
}

impl Checker<'_> {
    fn check_custom_field(&mut self, n: &Field) {
        match &n.unit {
            UnitObject::This => {
                let Some(tr) = self.resolver().enclosing_trait(n.id) else {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Internal,
                        "field reference outside any trait".to_string(),
                    );
                    return;
                };
                if tr.property(&n.name).is_none() {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Resolution,
                        format!("trait '{}' does not contain property '{}'", tr.name, n.name),
                    );
                }
            }
            UnitObject::Type => {
                self.error(
                    n.id,
                    n.span,
                    ErrorKind::IllegalOperation,
                    "cannot access custom properties of special unit object 'type'".to_string(),
                );
            }
            UnitObject::Identifier(ident) => {
                if self
                    .scopes
                    .enclosing_loop(self.arena, n.id, ident)
                    .is_none()
                {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Resolution,
                        format!("undeclared identifier '{}'", ident),
                    );
                    return;
                }
                if self.resolver().origin_trait(n).is_none() {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Resolution,
                        format!(
                            "none of the traits specified for unit object '{}' contain property '{}'",
                            ident, n.name
                        ),
                    );
                }
            }
        }
    }

    fn check_assignment(&mut self, n: &Stmt, lhs: &Field, rhs: &AssignRhs) {
        let writable = match lhs.member_op {
            MemberOp::Custom => true,
            MemberOp::Builtin => builtins::is_output_field(&lhs.name),
            MemberOp::Language => false,
        };
        if !writable {
            self.error(
                n.id,
                n.span,
                ErrorKind::IllegalOperation,
                format!("field '{}' is not writable", lhs.name),
            );
            return;
        }

        let Some(lhs_ty) = self.resolver().field_type(lhs) else {
            return;
        };

        match rhs {
            AssignRhs::Logical(_) => {
                if !lhs_ty.is_logical() {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Type,
                        format!(
                            "cannot assign logical value to non-bool field '{}'",
                            lhs.name
                        ),
                    );
                }
            }
            AssignRhs::Arithmetic(a) => {
                // A lone field is syntactically arithmetic but carries its
                // own kind; judge it against the left-hand side directly.
                if let ArithKind::Field(rhs_field) = &a.kind {
                    let Some(rhs_ty) = self.resolver().field_type(rhs_field) else {
                        return;
                    };
                    if lhs_ty.is_logical() != rhs_ty.is_logical() {
                        self.error(
                            n.id,
                            n.span,
                            ErrorKind::Type,
                            format!(
                                "cannot assign field '{}' to field '{}' of different kind",
                                rhs_field.name, lhs.name
                            ),
                        );
                    }
                } else if !lhs_ty.is_arithmetic() {
                    self.error(
                        n.id,
                        n.span,
                        ErrorKind::Type,
                        format!(
                            "cannot assign arithmetic value to non-arithmetic field '{}'",
                            lhs.name
                        ),
                    );
                }
            }
        }
    }

    fn check_for_in(&mut self, n: &Stmt, range: f64, range_unit: &UnitObject, traits: &[String]) {
        if let UnitObject::Identifier(ident) = range_unit {
            if self
                .scopes
                .enclosing_loop(self.arena, n.id, ident)
                .is_none()
            {
                self.error(
                    n.id,
                    n.span,
                    ErrorKind::Resolution,
                    format!("undeclared identifier '{}'", ident),
                );
            }
        }

        for trait_name in traits {
            if self.program.trait_by_name(trait_name).is_none() {
                self.error(
                    n.id,
                    n.span,
                    ErrorKind::Resolution,
                    format!("undeclared trait '{}'", trait_name),
                );
            }
        }

        if range < 0.0 {
            self.error(
                n.id,
                n.span,
                ErrorKind::Bounds,
                format!("invalid range {}; ranges must be positive", range),
            );
        }
    }
}
