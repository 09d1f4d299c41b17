//! Conditional flattening and equivalence merging.
//!
//! Three sub-passes, each one post-order traversal:
//!
//! 1. **Flatten** — a continuous conditional nested directly inside
//!    another is hoisted to a sibling guarded by the conjunction of both
//!    conditions. After one traversal no continuous-if contains another
//!    as a direct child.
//! 2. **Remove empty** — `if C { }` disappears from its body.
//! 3. **Merge equivalent** — top-level conditionals within one body whose
//!    guards the external oracle proves equal are fused, bodies
//!    concatenated in original order. Repeated until no merge happens.
//!
//! Guard equivalence is a query `G1 == G2` in the oracle's syntax; only a
//! normal form of `true` merges. Oracle failures downgrade to warnings
//! and leave the guards unmerged.

use std::collections::HashMap;

use crate::ast::visit::{walk_program_mut, MutVisitor};
use crate::ast::{Adopt, AlwaysBody, Logical, Program, Stmt, StmtKind};
use crate::error::{CompileError, ErrorKind};
use crate::foundation::NodeArena;
use crate::oracle::EquivalenceOracle;
use crate::print::Printer;

use super::{PassId, PassManager};

/// Run the merge pass over the whole program.
///
/// `oracle` is the guard-equivalence oracle for sub-pass 3; without one,
/// a single warning is reported and no merging happens (flattening and
/// empty-removal still run).
pub fn run(
    program: &mut Program,
    arena: &mut NodeArena,
    oracle: Option<&mut dyn EquivalenceOracle>,
    pm: &mut PassManager,
) {
    let mut flattener = Flatten { arena };
    walk_program_mut(&mut flattener, program);

    let mut remover = RemoveEmpty;
    walk_program_mut(&mut remover, program);

    let Some(oracle) = oracle else {
        pm.report(
            PassId::MergeIfs,
            CompileError::warning(
                ErrorKind::Oracle,
                program.span,
                "rewriting oracle unavailable; equivalent guards will not be merged".to_string(),
            ),
        );
        return;
    };

    loop {
        let mut merger = MergeEquivalent {
            oracle: &mut *oracle,
            warnings: Vec::new(),
            changed: false,
        };
        walk_program_mut(&mut merger, program);
        let changed = merger.changed;
        pm.report_all(PassId::MergeIfs, merger.warnings);
        if !changed {
            break;
        }
    }
}

/// Sub-pass 1: hoist nested conditionals to guarded siblings.
struct Flatten<'a> {
    arena: &'a mut NodeArena,
}

impl MutVisitor for Flatten<'_> {
    fn visit_always_body_mut(&mut self, n: &mut AlwaysBody) {
        let needs_work = n.exprs.iter().any(|stmt| match &stmt.kind {
            StmtKind::ContinuousIf { body, .. } => body
                .exprs
                .iter()
                .any(|child| matches!(child.kind, StmtKind::ContinuousIf { .. })),
            _ => false,
        });
        if !needs_work {
            return;
        }

        let old = std::mem::take(&mut n.exprs);
        for stmt in old {
            match stmt.kind {
                StmtKind::ContinuousIf { condition, body } => {
                    n.exprs
                        .extend(self.flatten_if(stmt.span, condition, body));
                }
                _ => n.exprs.push(stmt),
            }
        }
    }
}

impl Flatten<'_> {
    /// Split one conditional into a same-condition conditional holding
    /// the non-if statements plus one conjunction-guarded sibling per
    /// directly nested conditional.
    fn flatten_if(
        &mut self,
        span: crate::foundation::Span,
        condition: Logical,
        body: AlwaysBody,
    ) -> Vec<Stmt> {
        let mut hoisted = Vec::new();
        let mut kept = Vec::new();

        for child in body.exprs {
            match child.kind {
                StmtKind::ContinuousIf {
                    condition: child_condition,
                    body: child_body,
                } => {
                    let mut outer = condition.clone();
                    outer.adopt(self.arena);
                    let combined = Logical::and(self.arena, child.span, outer, child_condition);
                    hoisted.push(Stmt::continuous_if(
                        self.arena,
                        child.span,
                        combined,
                        child_body,
                    ));
                }
                _ => kept.push(child),
            }
        }

        let kept_body = AlwaysBody::new(self.arena, span, kept);
        let main_if = Stmt::continuous_if(self.arena, span, condition, kept_body);

        let mut out = vec![main_if];
        out.extend(hoisted);
        out
    }
}

/// Sub-pass 2: delete conditionals with empty bodies.
struct RemoveEmpty;

impl MutVisitor for RemoveEmpty {
    fn visit_always_body_mut(&mut self, n: &mut AlwaysBody) {
        n.exprs.retain(|stmt| {
            !matches!(
                &stmt.kind,
                StmtKind::ContinuousIf { body, .. } if body.exprs.is_empty()
            )
        });
    }
}

/// Sub-pass 3: fuse top-level conditionals with oracle-equal guards.
struct MergeEquivalent<'a> {
    oracle: &'a mut dyn EquivalenceOracle,
    warnings: Vec<CompileError>,
    changed: bool,
}

impl MutVisitor for MergeEquivalent<'_> {
    fn visit_always_body_mut(&mut self, n: &mut AlwaysBody) {
        let printer = Printer::oracle();
        let guards: Vec<(String, crate::foundation::Span)> = n
            .exprs
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::ContinuousIf { condition, .. } => {
                    Some((printer.print_logical(condition), stmt.span))
                }
                _ => None,
            })
            .collect();
        if guards.len() < 2 {
            return;
        }

        // Pairwise queries drive a union-find over the conditionals;
        // pairs already known equivalent are not re-queried.
        let mut uf = UnionFind::new(guards.len());
        for i in 0..guards.len() {
            for j in 0..i {
                if uf.find(i) == uf.find(j) {
                    continue;
                }
                let query = format!("{} == {}", guards[j].0, guards[i].0);
                match self.oracle.reduce(&query) {
                    Ok(reduction) => {
                        if reduction.normal_form == "true" {
                            uf.union(j, i);
                        }
                    }
                    Err(err) => {
                        self.warnings.push(CompileError::warning(
                            ErrorKind::Oracle,
                            guards[i].1,
                            format!("oracle failed to decide guard equivalence: {}", err),
                        ));
                    }
                }
            }
        }

        // Fuse each class into its first member, in original order.
        let mut kept: Vec<Stmt> = Vec::new();
        let mut class_target: HashMap<usize, usize> = HashMap::new();
        let mut ordinal = 0;

        for stmt in std::mem::take(&mut n.exprs) {
            if !matches!(stmt.kind, StmtKind::ContinuousIf { .. }) {
                kept.push(stmt);
                continue;
            }

            let class = uf.find(ordinal);
            ordinal += 1;

            match class_target.get(&class) {
                Some(&target) => {
                    let StmtKind::ContinuousIf { body, .. } = stmt.kind else {
                        unreachable!();
                    };
                    let StmtKind::ContinuousIf {
                        body: target_body, ..
                    } = &mut kept[target].kind
                    else {
                        unreachable!();
                    };
                    target_body.exprs.extend(body.exprs);
                    self.changed = true;
                }
                None => {
                    class_target.insert(class, kept.len());
                    kept.push(stmt);
                }
            }
        }

        n.exprs = kept;
    }
}

/// Union-find over conditional ordinals within one body.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Earlier ordinal stays the representative.
            let (keep, fold) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[fold] = keep;
        }
    }
}
