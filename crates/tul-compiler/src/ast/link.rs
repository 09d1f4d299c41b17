//! Parent-link maintenance and structural verification.
//!
//! Passes mutate the tree freely; afterwards [`relink`] rewrites the
//! arena's parent index from the actual tree shape and [`verify`] asserts
//! that every recorded link matches a real syntactic edge and that every
//! node can reach the program root. The pipeline runs both after every
//! pass, so a pass that loses or duplicates a subtree fails immediately
//! rather than corrupting a later pass.
//!
//! [`Adopt`] handles subtree reuse: a `clone()`d subtree still carries the
//! original's node ids, so it must be adopted (fresh ids allocated for the
//! whole clone) before being inserted anywhere.

use std::collections::HashMap;

use crate::foundation::{NodeArena, NodeId};

use super::decl::{AlwaysBody, AssignRhs, Program, Stmt, StmtKind, Trait, TraitInitializer, VarDecl};
use super::expr::{Arithmetic, ArithKind, Field, LogicKind, Logical};
use super::visit::{self, Visitor};

/// Scope information recorded for scope-introducing nodes.
#[derive(Debug, Clone)]
pub enum ScopeInfo {
    Trait(TraitScope),
    Loop(LoopScope),
}

/// A trait's scope: custom `this` fields resolve against its properties.
#[derive(Debug, Clone)]
pub struct TraitScope {
    pub name: String,
}

/// A `for` loop's scope: the bound variable and the trait filters.
#[derive(Debug, Clone)]
pub struct LoopScope {
    pub variable: String,
    pub traits: Vec<String>,
}

/// Index from scope-introducing node ids to their scope information,
/// rebuilt by [`relink`]. Lets upward queries through the arena answer
/// "which trait encloses this node" and "which loop binds this name"
/// without re-walking the tree.
#[derive(Debug, Default)]
pub struct ScopeIndex {
    scopes: HashMap<NodeId, ScopeInfo>,
}

impl ScopeIndex {
    /// Scope info for a node, if it introduces a scope.
    pub fn get(&self, id: NodeId) -> Option<&ScopeInfo> {
        self.scopes.get(&id)
    }

    /// Name of the innermost trait enclosing `id`, if any.
    pub fn enclosing_trait(&self, arena: &NodeArena, id: NodeId) -> Option<&str> {
        for ancestor in arena.ancestors(id) {
            if let Some(ScopeInfo::Trait(tr)) = self.scopes.get(&ancestor) {
                return Some(&tr.name);
            }
        }
        None
    }

    /// Innermost enclosing loop that binds `ident`, if any.
    pub fn enclosing_loop(&self, arena: &NodeArena, id: NodeId, ident: &str) -> Option<&LoopScope> {
        for ancestor in arena.ancestors(id) {
            if let Some(ScopeInfo::Loop(loop_scope)) = self.scopes.get(&ancestor) {
                if loop_scope.variable == ident {
                    return Some(loop_scope);
                }
            }
        }
        None
    }
}

struct ScopeCollector {
    scopes: HashMap<NodeId, ScopeInfo>,
}

impl Visitor for ScopeCollector {
    fn visit_trait(&mut self, n: &Trait) {
        self.scopes.insert(
            n.id,
            ScopeInfo::Trait(TraitScope {
                name: n.name.clone(),
            }),
        );
    }

    fn visit_stmt(&mut self, n: &Stmt) {
        if let StmtKind::ForIn {
            variable, traits, ..
        } = &n.kind
        {
            self.scopes.insert(
                n.id,
                ScopeInfo::Loop(LoopScope {
                    variable: variable.clone(),
                    traits: traits.clone(),
                }),
            );
        }
    }
}

/// Rewrite the arena's parent index to match the tree and rebuild the
/// scope index. Call after every structural change.
pub fn relink(program: &Program, arena: &mut NodeArena) -> ScopeIndex {
    arena.clear_parent(program.id);
    for_each_edge(program, &mut |child, parent| {
        arena.set_parent(child, parent);
    });

    let mut collector = ScopeCollector {
        scopes: HashMap::new(),
    };
    visit::walk_program(&mut collector, program);
    ScopeIndex {
        scopes: collector.scopes,
    }
}

/// Assert that the arena's recorded links match the tree exactly: every
/// child's recorded parent is its actual syntactic parent, and a program
/// ancestor is reachable from every node.
///
/// # Panics
/// Panics with a description of the first violation found.
pub fn verify(program: &Program, arena: &NodeArena) {
    for_each_edge(program, &mut |child, parent| {
        assert_eq!(
            arena.parent(child),
            Some(parent),
            "node {:?} ({:?}) has a stale parent link",
            child,
            arena.kind(child),
        );
        assert!(
            arena.has_program_ancestor(child),
            "node {:?} ({:?}) cannot reach the program root",
            child,
            arena.kind(child),
        );
    });
}

/// Invoke `f(child, parent)` for every parent-child edge in the tree.
fn for_each_edge(program: &Program, f: &mut impl FnMut(NodeId, NodeId)) {
    for tr in &program.traits {
        f(tr.id, program.id);
        edges_trait(tr, f);
    }
    for unit in &program.units {
        f(unit.id, program.id);
        for init in &unit.initializers {
            f(init.id, unit.id);
        }
    }
}

fn edges_trait(tr: &Trait, f: &mut impl FnMut(NodeId, NodeId)) {
    for decl in &tr.properties {
        f(decl.id, tr.id);
    }
    f(tr.body.id, tr.id);
    edges_body(&tr.body, f);
}

fn edges_body(body: &AlwaysBody, f: &mut impl FnMut(NodeId, NodeId)) {
    for stmt in &body.exprs {
        f(stmt.id, body.id);
        edges_stmt(stmt, f);
    }
}

fn edges_stmt(stmt: &Stmt, f: &mut impl FnMut(NodeId, NodeId)) {
    match &stmt.kind {
        StmtKind::Assignment { lhs, rhs, .. } => {
            f(lhs.id, stmt.id);
            match rhs {
                AssignRhs::Arithmetic(a) => {
                    f(a.id, stmt.id);
                    edges_arithmetic(a, f);
                }
                AssignRhs::Logical(l) => {
                    f(l.id, stmt.id);
                    edges_logical(l, f);
                }
            }
        }
        StmtKind::ContinuousIf { condition, body }
        | StmtKind::TransitionIf { condition, body } => {
            f(condition.id, stmt.id);
            edges_logical(condition, f);
            f(body.id, stmt.id);
            edges_body(body, f);
        }
        StmtKind::ForIn { body, .. } => {
            f(body.id, stmt.id);
            edges_body(body, f);
        }
    }
}

fn edges_arithmetic(a: &Arithmetic, f: &mut impl FnMut(NodeId, NodeId)) {
    match &a.kind {
        ArithKind::Add(x, y)
        | ArithKind::Sub(x, y)
        | ArithKind::Mul(x, y)
        | ArithKind::Div(x, y)
        | ArithKind::Mod(x, y)
        | ArithKind::Exp(x, y) => {
            f(x.id, a.id);
            edges_arithmetic(x, f);
            f(y.id, a.id);
            edges_arithmetic(y, f);
        }
        ArithKind::Field(field) => f(field.id, a.id),
        ArithKind::Int(_) | ArithKind::Float(_) => {}
    }
}

fn edges_logical(l: &Logical, f: &mut impl FnMut(NodeId, NodeId)) {
    match &l.kind {
        LogicKind::And(x, y) | LogicKind::Or(x, y) => {
            f(x.id, l.id);
            edges_logical(x, f);
            f(y.id, l.id);
            edges_logical(y, f);
        }
        LogicKind::Not(inner) => {
            f(inner.id, l.id);
            edges_logical(inner, f);
        }
        LogicKind::Comparison { lhs, rhs, .. } => {
            f(lhs.id, l.id);
            edges_arithmetic(lhs, f);
            f(rhs.id, l.id);
            edges_arithmetic(rhs, f);
        }
        LogicKind::Field(field) => f(field.id, l.id),
        LogicKind::Bool(_) => {}
    }
}

/// Allocate fresh ids for a cloned subtree.
///
/// A plain `clone()` copies node ids, so inserting the clone would leave
/// two nodes claiming the same arena slot. Adoption walks the clone and
/// replaces every id with a freshly allocated one; the new root's parent
/// stays unset until the next [`relink`].
pub trait Adopt {
    fn adopt(&mut self, arena: &mut NodeArena);
}

impl Adopt for Field {
    fn adopt(&mut self, arena: &mut NodeArena) {
        self.id = arena.alloc(crate::foundation::NodeKind::Field);
    }
}

impl Adopt for Arithmetic {
    fn adopt(&mut self, arena: &mut NodeArena) {
        self.id = arena.alloc(crate::foundation::NodeKind::Arithmetic);
        match &mut self.kind {
            ArithKind::Add(a, b)
            | ArithKind::Sub(a, b)
            | ArithKind::Mul(a, b)
            | ArithKind::Div(a, b)
            | ArithKind::Mod(a, b)
            | ArithKind::Exp(a, b) => {
                a.adopt(arena);
                b.adopt(arena);
            }
            ArithKind::Field(f) => f.adopt(arena),
            ArithKind::Int(_) | ArithKind::Float(_) => {}
        }
    }
}

impl Adopt for Logical {
    fn adopt(&mut self, arena: &mut NodeArena) {
        self.id = arena.alloc(crate::foundation::NodeKind::Logical);
        match &mut self.kind {
            LogicKind::And(a, b) | LogicKind::Or(a, b) => {
                a.adopt(arena);
                b.adopt(arena);
            }
            LogicKind::Not(inner) => inner.adopt(arena),
            LogicKind::Comparison { lhs, rhs, .. } => {
                lhs.adopt(arena);
                rhs.adopt(arena);
            }
            LogicKind::Field(f) => f.adopt(arena),
            LogicKind::Bool(_) => {}
        }
    }
}

impl Adopt for Stmt {
    fn adopt(&mut self, arena: &mut NodeArena) {
        self.id = arena.alloc(crate::foundation::NodeKind::Stmt);
        match &mut self.kind {
            StmtKind::Assignment { lhs, rhs, .. } => {
                lhs.adopt(arena);
                match rhs {
                    AssignRhs::Arithmetic(a) => a.adopt(arena),
                    AssignRhs::Logical(l) => l.adopt(arena),
                }
            }
            StmtKind::ContinuousIf { condition, body }
            | StmtKind::TransitionIf { condition, body } => {
                condition.adopt(arena);
                body.adopt(arena);
            }
            StmtKind::ForIn { body, .. } => body.adopt(arena),
        }
    }
}

impl Adopt for AlwaysBody {
    fn adopt(&mut self, arena: &mut NodeArena) {
        self.id = arena.alloc(crate::foundation::NodeKind::AlwaysBody);
        for stmt in &mut self.exprs {
            stmt.adopt(arena);
        }
    }
}

impl Adopt for VarDecl {
    fn adopt(&mut self, arena: &mut NodeArena) {
        self.id = arena.alloc(crate::foundation::NodeKind::VarDecl);
    }
}

impl Adopt for TraitInitializer {
    fn adopt(&mut self, arena: &mut NodeArena) {
        self.id = arena.alloc(crate::foundation::NodeKind::TraitInit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::{CompareOp, MemberOp, UnitObject};
    use crate::foundation::Span;

    fn sample_program(arena: &mut NodeArena) -> Program {
        let span = Span::zero(0);

        let field = Field::new(arena, span, UnitObject::This, MemberOp::Custom, "x");
        let lhs = Arithmetic::field(arena, span, field);
        let rhs = Arithmetic::int(arena, span, 0);
        let cond = Logical::comparison(arena, span, lhs, CompareOp::Gt, rhs);
        let body = AlwaysBody::empty(arena, span);
        let if_stmt = Stmt::continuous_if(arena, span, cond, body);
        let trait_body = AlwaysBody::new(arena, span, vec![if_stmt]);
        let decl = VarDecl::new(arena, span, "x", crate::ast::decl::VarType::int(0, 15));
        let tr = Trait::new(arena, span, "A", vec![decl], trait_body);

        let mut program = Program::new(arena, span);
        program.traits.push(tr);
        program
    }

    #[test]
    fn test_relink_then_verify() {
        let mut arena = NodeArena::new();
        let program = sample_program(&mut arena);

        let scopes = relink(&program, &mut arena);
        verify(&program, &arena);

        // The field's enclosing trait is reachable through the arena.
        let field_id = {
            let stmt = &program.traits[0].body.exprs[0];
            match &stmt.kind {
                StmtKind::ContinuousIf { condition, .. } => match &condition.kind {
                    LogicKind::Comparison { lhs, .. } => match &lhs.kind {
                        ArithKind::Field(f) => f.id,
                        _ => unreachable!(),
                    },
                    _ => unreachable!(),
                },
                _ => unreachable!(),
            }
        };
        assert_eq!(scopes.enclosing_trait(&arena, field_id), Some("A"));
    }

    #[test]
    #[should_panic(expected = "stale parent link")]
    fn test_verify_detects_stale_links() {
        let mut arena = NodeArena::new();
        let program = sample_program(&mut arena);
        relink(&program, &mut arena);

        // Corrupt one link.
        let trait_id = program.traits[0].id;
        let body_id = program.traits[0].body.id;
        arena.set_parent(body_id, arena.parent(trait_id).unwrap());

        verify(&program, &arena);
    }

    #[test]
    fn test_adopt_allocates_fresh_ids() {
        let mut arena = NodeArena::new();
        let program = sample_program(&mut arena);
        relink(&program, &mut arena);

        let original = &program.traits[0].body.exprs[0];
        let mut clone = original.clone();
        clone.adopt(&mut arena);

        assert_ne!(clone.id, original.id);
        assert!(arena.parent(clone.id).is_none());
    }

    #[test]
    fn test_enclosing_loop_lookup() {
        let mut arena = NodeArena::new();
        let span = Span::zero(0);

        let field = Field::new(&mut arena, span, UnitObject::Identifier("u".into()), MemberOp::Custom, "x");
        let field_id = field.id;
        let lhs = Arithmetic::field(&mut arena, span, field);
        let rhs = Arithmetic::int(&mut arena, span, 1);
        let cond = Logical::comparison(&mut arena, span, lhs, CompareOp::Lt, rhs);
        let inner_body = AlwaysBody::empty(&mut arena, span);
        let if_stmt = Stmt::continuous_if(&mut arena, span, cond, inner_body);
        let loop_body = AlwaysBody::new(&mut arena, span, vec![if_stmt]);
        let for_stmt = Stmt::new(
            &mut arena,
            span,
            StmtKind::ForIn {
                variable: "u".into(),
                range: 5.0,
                range_unit: UnitObject::This,
                traits: vec!["A".into()],
                body: loop_body,
            },
        );
        let trait_body = AlwaysBody::new(&mut arena, span, vec![for_stmt]);
        let tr = Trait::new(&mut arena, span, "A", vec![], trait_body);
        let mut program = Program::new(&mut arena, span);
        program.traits.push(tr);

        let scopes = relink(&program, &mut arena);

        let found = scopes.enclosing_loop(&arena, field_id, "u");
        assert!(found.is_some());
        assert_eq!(found.unwrap().traits, vec!["A".to_string()]);

        assert!(scopes.enclosing_loop(&arena, field_id, "v").is_none());
    }
}
