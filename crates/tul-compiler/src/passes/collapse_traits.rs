//! Trait collapse: N user traits become one `main` trait.
//!
//! The collapsed trait carries the union of all properties (renamed
//! `Trait~property`, with `~` unavailable to source identifiers), one or
//! more `trait_bitfieldN` integer properties recording trait membership,
//! and every original body wrapped in a membership-test conditional.
//!
//! Membership tests read a bit out of the bitfield with modulo-and-compare
//! (`(unit.trait_bitfieldJ % 2^(bit+1)) >= 2^bit`); the surface language
//! has no bitwise operators.
//!
//! `for` loops trade their trait filter lists for nested membership
//! conditionals on the loop variable, then filter only on the collapsed
//! `main` trait. Unit declarations are rewritten to a single `main`
//! initializer carrying renamed values plus the membership bits.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::ast::visit::{walk_trait_mut, MutVisitor};
use crate::ast::{
    AlwaysBody, Arithmetic, CompareOp, Field, Literal, Logical, MemberOp, Program, ScopeIndex,
    Stmt, StmtKind, Trait, TraitInitializer, UnitObject, VarDecl, VarType, NUM_BITS,
};
use crate::error::{CompileError, ErrorKind};
use crate::foundation::NodeArena;

use super::{PassId, PassManager};

/// Separator between trait name and property name in collapsed names.
/// Not lexable in source identifiers, so collisions are impossible.
const SEP: char = '~';

/// Bitfield slot for one original trait.
#[derive(Debug, Clone)]
struct BitSlot {
    bitfield: String,
    bit: u32,
}

/// Collapse all traits of `program` into a single `main` trait.
pub fn run(
    program: &mut Program,
    arena: &mut NodeArena,
    scopes: &ScopeIndex,
    pm: &mut PassManager,
) {
    // Property-name sets per trait, captured before any renaming so that
    // identifier-unit references resolve against what the checker saw.
    let trait_props: HashMap<String, HashSet<String>> = program
        .traits
        .iter()
        .map(|tr| {
            (
                tr.name.clone(),
                tr.properties.iter().map(|d| d.name.clone()).collect(),
            )
        })
        .collect();

    // 1. Rename uses, trait by trait.
    for tr in &mut program.traits {
        let mut renamer = RenameUses {
            trait_name: tr.name.clone(),
            trait_props: &trait_props,
            arena,
            scopes,
            errors: Vec::new(),
        };
        walk_trait_mut(&mut renamer, tr);
        pm.report_all(PassId::CollapseTraits, renamer.errors);
    }

    // 2. Rename declarations.
    for tr in &mut program.traits {
        for decl in &mut tr.properties {
            decl.name = format!("{}{}{}", tr.name, SEP, decl.name);
        }
    }

    // 3. Allocate membership bitfields, one bit per original trait.
    let trait_count = program.traits.len();
    let bitfield_count = trait_count.div_ceil(NUM_BITS as usize);

    let slots: HashMap<String, BitSlot> = program
        .traits
        .iter()
        .enumerate()
        .map(|(i, tr)| {
            (
                tr.name.clone(),
                BitSlot {
                    bitfield: format!("trait_bitfield{}", i / NUM_BITS as usize),
                    bit: (i % NUM_BITS as usize) as u32,
                },
            )
        })
        .collect();

    // 4. Build the collapsed trait: union of properties, bitfield
    // declarations, and every body wrapped in its membership test.
    let span = program.span;
    let mut properties = Vec::new();
    let mut body_exprs = Vec::new();

    for mut tr in std::mem::take(&mut program.traits) {
        properties.append(&mut tr.properties);

        let check = membership_check(arena, &slots[&tr.name], UnitObject::This, tr.body.span);
        body_exprs.push(Stmt::continuous_if(arena, tr.body.span, check, tr.body));
    }

    for i in 0..bitfield_count {
        let bits = if i == bitfield_count - 1 {
            (trait_count - i * NUM_BITS as usize) as u32
        } else {
            NUM_BITS
        };
        let max = ((1u64 << bits) - 1) as i64;
        properties.push(VarDecl::new(
            arena,
            span,
            format!("trait_bitfield{}", i),
            VarType::int(0, max),
        ));
    }

    let body = AlwaysBody::new(arena, span, body_exprs);
    let mut main = Trait::new(arena, span, "main", properties, body);

    // 5. Trade loop trait filters for membership conditionals.
    let mut rewriter = RewriteLoops {
        slots: &slots,
        arena,
        errors: Vec::new(),
    };
    walk_trait_mut(&mut rewriter, &mut main);
    pm.report_all(PassId::CollapseTraits, rewriter.errors);

    program.traits = vec![main];

    // 6. Rewrite unit initializers onto `main`.
    for unit in &mut program.units {
        let mut values: IndexMap<String, Literal> = IndexMap::new();

        for init in unit.initializers.drain(..) {
            for (property, value) in &init.values {
                values.insert(format!("{}{}{}", init.name, SEP, property), *value);
            }

            let Some(slot) = slots.get(&init.name) else {
                pm.report(
                    PassId::CollapseTraits,
                    CompileError::new(
                        ErrorKind::Resolution,
                        init.span,
                        format!("undeclared trait '{}' in trait initializer", init.name),
                    ),
                );
                continue;
            };
            let entry = values
                .entry(slot.bitfield.clone())
                .or_insert(Literal::Int(0));
            if let Literal::Int(bits) = entry {
                *entry = Literal::Int(*bits | (1i64 << slot.bit));
            }
        }

        let span = unit.span;
        unit.initializers = vec![TraitInitializer::new(arena, span, "main", values)];
    }
}

/// Build `(unit.bitfield % 2^(bit+1)) >= 2^bit`.
fn membership_check(
    arena: &mut NodeArena,
    slot: &BitSlot,
    unit: UnitObject,
    span: crate::foundation::Span,
) -> Logical {
    let field = Field::new(arena, span, unit, MemberOp::Custom, slot.bitfield.clone());
    let value = Arithmetic::field(arena, span, field);
    let modulus = Arithmetic::int(arena, span, 1i64 << (slot.bit + 1));
    let remainder = Arithmetic::modulo(arena, span, value, modulus);
    let threshold = Arithmetic::int(arena, span, 1i64 << slot.bit);
    Logical::comparison(arena, span, remainder, CompareOp::Gte, threshold)
}

/// Renames custom field references to their collapsed `Trait~property`
/// names. Builtin and language references are untouched.
struct RenameUses<'a> {
    trait_name: String,
    trait_props: &'a HashMap<String, HashSet<String>>,
    arena: &'a NodeArena,
    scopes: &'a ScopeIndex,
    errors: Vec<CompileError>,
}

impl MutVisitor for RenameUses<'_> {
    fn visit_field_mut(&mut self, n: &mut Field) {
        if n.member_op != MemberOp::Custom {
            return;
        }

        match &n.unit {
            UnitObject::This => {
                n.name = format!("{}{}{}", self.trait_name, SEP, n.name);
            }
            UnitObject::Type => {
                self.errors.push(CompileError::new(
                    ErrorKind::IllegalOperation,
                    n.span,
                    "cannot access custom properties of special unit object 'type'".to_string(),
                ));
            }
            UnitObject::Identifier(ident) => {
                let Some(loop_scope) = self.scopes.enclosing_loop(self.arena, n.id, ident) else {
                    self.errors.push(CompileError::new(
                        ErrorKind::Resolution,
                        n.span,
                        format!("undeclared identifier '{}'", ident),
                    ));
                    return;
                };

                let origin = loop_scope.traits.iter().find(|tr| {
                    self.trait_props
                        .get(tr.as_str())
                        .is_some_and(|props| props.contains(&n.name))
                });
                match origin {
                    Some(origin) => n.name = format!("{}{}{}", origin, SEP, n.name),
                    None => self.errors.push(CompileError::new(
                        ErrorKind::Resolution,
                        n.span,
                        format!(
                            "none of the traits specified for unit object '{}' contain property '{}'",
                            ident, n.name
                        ),
                    )),
                }
            }
        }
    }
}

/// Replaces each loop's trait filter list with nested membership
/// conditionals on the loop variable, then filters on `main` alone.
struct RewriteLoops<'a> {
    slots: &'a HashMap<String, BitSlot>,
    arena: &'a mut NodeArena,
    errors: Vec<CompileError>,
}

impl MutVisitor for RewriteLoops<'_> {
    fn visit_stmt_mut(&mut self, n: &mut Stmt) {
        let span = n.span;
        let StmtKind::ForIn {
            variable, traits, body, ..
        } = &mut n.kind
        else {
            return;
        };
        if traits.is_empty() {
            return;
        }

        for trait_name in traits.iter() {
            let Some(slot) = self.slots.get(trait_name) else {
                self.errors.push(CompileError::new(
                    ErrorKind::Resolution,
                    span,
                    format!("undeclared trait '{}'", trait_name),
                ));
                continue;
            };

            let check = membership_check(
                self.arena,
                slot,
                UnitObject::Identifier(variable.clone()),
                span,
            );
            let inner = std::mem::replace(body, AlwaysBody::empty(self.arena, span));
            let wrapped = Stmt::continuous_if(self.arena, span, check, inner);
            body.exprs.push(wrapped);
        }

        traits.clear();
        traits.push("main".to_string());
    }
}
