//! Edge-trigger lowering: transition conditionals become continuous ones.
//!
//! For each `if becomes C { body }` the pass allocates a fresh boolean
//! property `prev~N`, emits `this.prev~N := C;` at the statement's
//! position, and follows it with `if C and not this.prev~N { body }`.
//!
//! The runtime applies assignments after reads within a tick, so the
//! shadow assignment captures the value the condition had last tick;
//! the rewritten conditional therefore fires exactly on the false→true
//! transition.

use crate::ast::visit::{walk_always_body_mut, MutVisitor};
use crate::ast::{
    Adopt, AssignRhs, Field, Logical, MemberOp, Program, Stmt, StmtKind, UnitObject, VarDecl,
    VarType,
};
use crate::foundation::NodeArena;

/// Rewrite every transition conditional in the program.
pub fn run(program: &mut Program, arena: &mut NodeArena) {
    let mut counter = 0;
    for tr in &mut program.traits {
        let mut pending = Vec::new();
        let mut visitor = Simplify {
            arena,
            counter: &mut counter,
            pending: &mut pending,
        };
        walk_always_body_mut(&mut visitor, &mut tr.body);
        tr.properties.append(&mut pending);
    }
}

struct Simplify<'a> {
    arena: &'a mut NodeArena,
    /// Monotonic over the whole program, so shadow names never collide.
    counter: &'a mut u32,
    /// Shadow declarations for the enclosing trait, appended after the walk.
    pending: &'a mut Vec<VarDecl>,
}

impl MutVisitor for Simplify<'_> {
    fn visit_always_body_mut(&mut self, n: &mut crate::ast::AlwaysBody) {
        if !n
            .exprs
            .iter()
            .any(|s| matches!(s.kind, StmtKind::TransitionIf { .. }))
        {
            return;
        }

        let old = std::mem::take(&mut n.exprs);
        for stmt in old {
            let span = stmt.span;
            match stmt.kind {
                StmtKind::TransitionIf { condition, body } => {
                    let shadow = format!("prev~{}", self.counter);
                    *self.counter += 1;
                    self.pending
                        .push(VarDecl::new(self.arena, span, &shadow, VarType::bool()));

                    // this.prev~N := C;  (the follower runs one tick behind)
                    let mut follower_cond = condition.clone();
                    follower_cond.adopt(self.arena);
                    let lhs =
                        Field::new(self.arena, span, UnitObject::This, MemberOp::Custom, &shadow);
                    n.exprs.push(Stmt::assign(
                        self.arena,
                        span,
                        lhs,
                        AssignRhs::Logical(follower_cond),
                    ));

                    // if C and not this.prev~N { body }
                    let shadow_field =
                        Field::new(self.arena, span, UnitObject::This, MemberOp::Custom, &shadow);
                    let shadow_leaf = Logical::field(self.arena, span, shadow_field);
                    let negated = Logical::not(self.arena, span, shadow_leaf);
                    let guard = Logical::and(self.arena, span, condition, negated);
                    n.exprs
                        .push(Stmt::continuous_if(self.arena, span, guard, body));
                }
                _ => n.exprs.push(stmt),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{self, LogicKind, TypeKind};
    use crate::parser;
    use crate::print::Printer;

    fn simplify(source: &str) -> (Program, NodeArena) {
        let mut arena = NodeArena::new();
        let mut program = parser::parse(source, 0, &mut arena).expect("parse failed");
        ast::relink(&program, &mut arena);
        run(&mut program, &mut arena);
        ast::relink(&program, &mut arena);
        ast::verify(&program, &arena);
        (program, arena)
    }

    fn count_transition_ifs(program: &Program) -> usize {
        struct Counter(usize);
        impl ast::visit::Visitor for Counter {
            fn visit_stmt(&mut self, n: &Stmt) {
                if matches!(n.kind, StmtKind::TransitionIf { .. }) {
                    self.0 += 1;
                }
            }
        }
        let mut counter = Counter(0);
        ast::visit::walk_program(&mut counter, program);
        counter.0
    }

    #[test]
    fn test_edge_trigger_lowering() {
        let (program, _) = simplify(
            "trait A {
                properties { x: int<0, 15>, armed: bool }
                always { if becomes this.armed { this.x += 1; } }
            }",
        );

        assert_eq!(count_transition_ifs(&program), 0);

        let tr = &program.traits[0];
        let shadow = tr.property("prev~0").expect("missing shadow property");
        assert_eq!(shadow.ty.kind, TypeKind::Bool);

        let printed = Printer::surface().print_trait(tr);
        assert!(printed.contains("this.prev~0 := this.armed;"));
        assert!(printed.contains("if (this.armed and not this.prev~0) {"));
        assert!(printed.contains("this.x += 1;"));

        // The follower precedes the rewritten conditional.
        let follower = printed.find("this.prev~0 :=").unwrap();
        let rewritten = printed.find("if (this.armed").unwrap();
        assert!(follower < rewritten);
    }

    #[test]
    fn test_shadow_names_are_unique_across_traits() {
        let (program, _) = simplify(
            "trait A {
                properties { a: bool }
                always { if becomes this.a { } }
            }
            trait B {
                properties { b: bool }
                always { if becomes this.b { } if becomes not this.b { } }
            }",
        );

        assert!(program.traits[0].property("prev~0").is_some());
        assert!(program.traits[1].property("prev~1").is_some());
        assert!(program.traits[1].property("prev~2").is_some());
    }

    #[test]
    fn test_nested_transition_if() {
        let (program, _) = simplify(
            "trait A {
                properties { a: bool, b: bool }
                always { if this.a { if becomes this.b { this.a := false; } } }
            }",
        );

        assert_eq!(count_transition_ifs(&program), 0);

        // The shadow machinery lands inside the enclosing conditional.
        match &program.traits[0].body.exprs[0].kind {
            StmtKind::ContinuousIf { body, .. } => {
                assert_eq!(body.exprs.len(), 2);
                assert!(matches!(body.exprs[0].kind, StmtKind::Assignment { .. }));
                match &body.exprs[1].kind {
                    StmtKind::ContinuousIf { condition, .. } => {
                        assert!(matches!(condition.kind, LogicKind::And(_, _)));
                    }
                    other => panic!("expected rewritten if, got {:?}", other),
                }
            }
            other => panic!("expected outer if, got {:?}", other),
        }
    }

    #[test]
    fn test_untouched_statements_keep_order() {
        let (program, _) = simplify(
            "trait A {
                properties { x: int<0, 7>, a: bool }
                always {
                    this.x := 1;
                    if becomes this.a { this.x := 2; }
                    this.x := 3;
                }
            }",
        );

        let body = &program.traits[0].body;
        assert_eq!(body.exprs.len(), 4);
        assert!(matches!(body.exprs[0].kind, StmtKind::Assignment { .. }));
        // follower, rewritten if, then the trailing assignment
        assert!(matches!(body.exprs[1].kind, StmtKind::Assignment { .. }));
        assert!(matches!(body.exprs[2].kind, StmtKind::ContinuousIf { .. }));
        assert!(matches!(body.exprs[3].kind, StmtKind::Assignment { .. }));
    }
}
