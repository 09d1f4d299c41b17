//! Field resolution.
//!
//! Answers "what does this field reference mean": which trait a custom
//! property comes from, and what semantic type a reference has. Used by
//! the semantic checker and by the trait-collapse pass, which must agree
//! on resolution or collapse would rename references the checker accepted
//! to a different owner.
//!
//! Resolution for identifier units is deliberately first-match: among the
//! traits listed on the binding loop, the first (in listed order) whose
//! declaration carries the property wins. Listing order is therefore a
//! tie-break, not an error.

use crate::ast::{Field, MemberOp, Program, ScopeIndex, Trait, UnitObject, VarType};
use crate::builtins;
use crate::foundation::{NodeArena, NodeId};

/// Field resolver over a linked program.
pub struct Resolver<'a> {
    program: &'a Program,
    arena: &'a NodeArena,
    scopes: &'a ScopeIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(program: &'a Program, arena: &'a NodeArena, scopes: &'a ScopeIndex) -> Self {
        Self {
            program,
            arena,
            scopes,
        }
    }

    /// The trait declaration lexically enclosing a node.
    pub fn enclosing_trait(&self, id: NodeId) -> Option<&'a Trait> {
        let name = self.scopes.enclosing_trait(self.arena, id)?;
        self.program.trait_by_name(name)
    }

    /// The trait a custom field reference resolves against.
    ///
    /// - `this.p` — the enclosing trait.
    /// - `x.p` — the first trait listed on the loop binding `x` whose
    ///   declaration carries `p`.
    /// - `type.p` — never resolves (type has no custom members).
    pub fn origin_trait(&self, field: &Field) -> Option<&'a Trait> {
        debug_assert_eq!(field.member_op, MemberOp::Custom);
        match &field.unit {
            UnitObject::This => self.enclosing_trait(field.id),
            UnitObject::Type => None,
            UnitObject::Identifier(name) => {
                let loop_scope = self.scopes.enclosing_loop(self.arena, field.id, name)?;
                loop_scope
                    .traits
                    .iter()
                    .filter_map(|trait_name| self.program.trait_by_name(trait_name))
                    .find(|tr| tr.property(&field.name).is_some())
            }
        }
    }

    /// Semantic type of a field reference, or `None` if it does not
    /// resolve.
    pub fn field_type(&self, field: &Field) -> Option<VarType> {
        match field.member_op {
            MemberOp::Custom => {
                let origin = self.origin_trait(field)?;
                origin.property(&field.name).map(|decl| decl.ty)
            }
            MemberOp::Builtin => builtins::builtin_kind(&field.name).map(|kind| VarType {
                kind,
                min: 0,
                max: 0,
            }),
            // Intrinsics are rates of change over engine state: numeric.
            MemberOp::Language => builtins::is_language_intrinsic(&field.name)
                .then(VarType::float),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{self, TypeKind};
    use crate::foundation::NodeArena;
    use crate::parser;

    fn parsed(source: &str) -> (ast::Program, NodeArena, ScopeIndex) {
        let mut arena = NodeArena::new();
        let program = parser::parse(source, 0, &mut arena).expect("parse failed");
        let scopes = ast::relink(&program, &mut arena);
        (program, arena, scopes)
    }

    fn first_loop_field(program: &ast::Program) -> &Field {
        match &program.traits[0].body.exprs[0].kind {
            ast::StmtKind::ForIn { body, .. } => match &body.exprs[0].kind {
                ast::StmtKind::Assignment { lhs, .. } => lhs,
                other => panic!("expected assignment, got {:?}", other),
            },
            other => panic!("expected for-in, got {:?}", other),
        }
    }

    #[test]
    fn test_identifier_resolution_picks_first_listed_trait() {
        // Both B and C declare `x`; the loop lists B first, so B wins.
        let (program, arena, scopes) = parsed(
            "trait A {
                properties { }
                always { for u in range 5.0 of this with trait B, C { u.x := 1; } }
            }
            trait B { properties { x: int<0, 7> } always { } }
            trait C { properties { x: int<0, 63> } always { } }",
        );

        let resolver = Resolver::new(&program, &arena, &scopes);
        let field = first_loop_field(&program);

        let origin = resolver.origin_trait(field).expect("no origin trait");
        assert_eq!(origin.name, "B");
        assert_eq!(resolver.field_type(field).unwrap().max, 7);
    }

    #[test]
    fn test_identifier_resolution_skips_traits_without_property() {
        let (program, arena, scopes) = parsed(
            "trait A {
                properties { }
                always { for u in range 5.0 of this with trait B, C { u.x := 1; } }
            }
            trait B { properties { y: bool } always { } }
            trait C { properties { x: int<0, 63> } always { } }",
        );

        let resolver = Resolver::new(&program, &arena, &scopes);
        let field = first_loop_field(&program);

        assert_eq!(resolver.origin_trait(field).unwrap().name, "C");
    }

    #[test]
    fn test_this_resolves_against_enclosing_trait() {
        let (program, arena, scopes) = parsed(
            "trait A {
                properties { x: int<0, 15> }
                always { this.x := 1; }
            }",
        );

        let resolver = Resolver::new(&program, &arena, &scopes);
        let field = match &program.traits[0].body.exprs[0].kind {
            ast::StmtKind::Assignment { lhs, .. } => lhs,
            other => panic!("expected assignment, got {:?}", other),
        };

        assert_eq!(resolver.origin_trait(field).unwrap().name, "A");
        assert_eq!(resolver.field_type(field).unwrap().kind, TypeKind::Int);
    }

    #[test]
    fn test_builtin_and_intrinsic_types() {
        let (program, arena, scopes) = parsed(
            "trait A {
                properties { }
                always { if this::controllable { this::vision := this->rate; } }
            }",
        );

        let resolver = Resolver::new(&program, &arena, &scopes);
        let (guard_field, assign) = match &program.traits[0].body.exprs[0].kind {
            ast::StmtKind::ContinuousIf { condition, body } => {
                let field = match &condition.kind {
                    ast::LogicKind::Field(f) => f,
                    other => panic!("expected field guard, got {:?}", other),
                };
                (field, &body.exprs[0])
            }
            other => panic!("expected if, got {:?}", other),
        };

        assert_eq!(
            resolver.field_type(guard_field).unwrap().kind,
            TypeKind::Bool
        );

        match &assign.kind {
            ast::StmtKind::Assignment { lhs, rhs, .. } => {
                assert_eq!(resolver.field_type(lhs).unwrap().kind, TypeKind::Float);
                match rhs {
                    ast::AssignRhs::Arithmetic(a) => match &a.kind {
                        ast::ArithKind::Field(f) => {
                            assert!(f.is_rate);
                            assert_eq!(resolver.field_type(f).unwrap().kind, TypeKind::Float);
                        }
                        other => panic!("expected field, got {:?}", other),
                    },
                    other => panic!("expected arithmetic rhs, got {:?}", other),
                }
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }
}
