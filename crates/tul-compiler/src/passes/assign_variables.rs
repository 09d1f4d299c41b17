//! Bit-packing of collapsed properties onto the output field catalogue.
//!
//! Runs on the collapsed program (exactly one trait, `main`) and does not
//! touch the AST; the product is a [`VariableLayout`] mapping every
//! property to a bit range of one catalogue field, consumed downstream as
//! `map.json`.
//!
//! Placement scans catalogue fields in alphabetical order and takes bits
//! from the bottom of a field's remaining window. A completely unused
//! field is preferred as soon as one is seen; otherwise the last field
//! with enough room wins. Untouched-first keeps mixed-width properties
//! from fragmenting partially filled fields, and last-fit makes placement
//! deterministic when no untouched field remains.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::{Program, TypeKind, VarType, NUM_BITS};
use crate::builtins::OUTPUT_FIELDS;
use crate::error::{CompileError, ErrorKind};

use super::{PassId, PassManager};

/// Where one property lives: a bit range of one catalogue field, plus the
/// offset subtracted from the value before encoding (the int range's
/// minimum).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAssignment {
    pub field: String,
    pub lsb: u32,
    pub msb: u32,
    pub offset: i64,
}

/// The packing produced by [`run`]: property name → assignment, in
/// property declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableLayout {
    assignments: IndexMap<String, FieldAssignment>,
}

impl VariableLayout {
    /// Assignment for a property.
    ///
    /// # Panics
    /// Panics if the property was never assigned; every property in scope
    /// after a successful pass has an assignment.
    pub fn get_assignment(&self, variable: &str) -> &FieldAssignment {
        self.assignments
            .get(variable)
            .unwrap_or_else(|| panic!("no assignment for variable '{}'", variable))
    }

    /// Number of assigned properties.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Iterate assignments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldAssignment)> {
        self.assignments.iter()
    }
}

/// Pack the collapsed trait's properties into the catalogue.
pub fn run(program: &Program, pm: &mut PassManager) -> VariableLayout {
    assert_eq!(
        program.traits.len(),
        1,
        "assign_variables requires the collapsed program"
    );
    let main = &program.traits[0];
    assert_eq!(main.name, "main");

    // Remaining window per catalogue field: next free bit from the
    // bottom. BTreeMap iteration gives the alphabetical scan order.
    let mut windows: BTreeMap<&str, u32> = OUTPUT_FIELDS.iter().map(|f| (*f, 0u32)).collect();

    let mut layout = VariableLayout::default();
    let total = main.properties.len();

    for (assigned, decl) in main.properties.iter().enumerate() {
        let (required_bits, offset) = requirements(&decl.ty);

        // Prefer the first completely unused field; failing that, the
        // last field whose window still fits.
        let mut chosen: Option<&str> = None;
        for (field, used) in &windows {
            if NUM_BITS - *used >= required_bits {
                chosen = Some(*field);
            }
            if *used == 0 {
                break;
            }
        }

        let Some(field) = chosen else {
            pm.report(
                PassId::AssignVariables,
                CompileError::new(
                    ErrorKind::Capacity,
                    main.span,
                    format!(
                        "too many variables: failed to assign {} of {} total (some are compiler-generated)",
                        total - assigned,
                        total
                    ),
                ),
            );
            break;
        };

        let used = windows.get_mut(field).expect("field came from the map");
        let assignment = FieldAssignment {
            field: field.to_string(),
            lsb: *used,
            msb: *used + required_bits - 1,
            offset,
        };
        *used += required_bits;

        debug!(
            variable = decl.name.as_str(),
            field = assignment.field.as_str(),
            lsb = assignment.lsb,
            msb = assignment.msb,
            offset = assignment.offset,
            "assigned variable"
        );
        layout.assignments.insert(decl.name.clone(), assignment);
    }

    layout
}

/// Bits required and value offset for one property type.
fn requirements(ty: &VarType) -> (u32, i64) {
    match ty.kind {
        TypeKind::Bool => (1, 0),
        TypeKind::Int => (bits_needed(ty.max - ty.min + 1), ty.min),
        TypeKind::Float => (NUM_BITS, 0),
    }
}

/// Ceiling log2: the bits needed to distinguish `values` values.
fn bits_needed(values: i64) -> u32 {
    debug_assert!(values >= 2, "int ranges always span at least two values");
    64 - ((values - 1) as u64).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AlwaysBody, Trait, VarDecl};
    use crate::foundation::{NodeArena, Span};

    fn program_with(properties: Vec<(&str, VarType)>) -> Program {
        let mut arena = NodeArena::new();
        let span = Span::zero(0);
        let decls = properties
            .into_iter()
            .map(|(name, ty)| VarDecl::new(&mut arena, span, name, ty))
            .collect();
        let body = AlwaysBody::empty(&mut arena, span);
        let main = Trait::new(&mut arena, span, "main", decls, body);
        let mut program = Program::new(&mut arena, span);
        program.traits.push(main);
        program
    }

    #[test]
    fn test_bits_needed() {
        assert_eq!(bits_needed(2), 1);
        assert_eq!(bits_needed(4), 2);
        assert_eq!(bits_needed(10), 4);
        assert_eq!(bits_needed(16), 4);
        assert_eq!(bits_needed(17), 5);
    }

    #[test]
    fn test_basic_packing() {
        let program = program_with(vec![
            ("A~x", VarType::int(0, 15)),
            ("A~flag", VarType::bool()),
            ("A~speed", VarType::float()),
        ]);
        let mut pm = PassManager::new();
        let layout = run(&program, &mut pm);
        assert!(!pm.has_errors(PassId::AssignVariables));

        // Each lands at the bottom of its own untouched field, scanned
        // alphabetically.
        let x = layout.get_assignment("A~x");
        assert_eq!((x.field.as_str(), x.lsb, x.msb, x.offset), ("animSpeed", 0, 3, 0));

        let flag = layout.get_assignment("A~flag");
        assert_eq!(
            (flag.field.as_str(), flag.lsb, flag.msb),
            ("bodyPower", 0, 0)
        );

        let speed = layout.get_assignment("A~speed");
        assert_eq!(
            (speed.field.as_str(), speed.lsb, speed.msb),
            ("bounceDistMax", 0, 51)
        );
    }

    #[test]
    fn test_int_offset_is_range_minimum() {
        let program = program_with(vec![("A~n", VarType::int(5, 10))]);
        let mut pm = PassManager::new();
        let layout = run(&program, &mut pm);

        let n = layout.get_assignment("A~n");
        // 6 values → 3 bits, offset 5.
        assert_eq!((n.lsb, n.msb, n.offset), (0, 2, 5));
    }

    #[test]
    fn test_saturation_reuses_partial_fields() {
        // 26 bools fill bit 0 of every catalogue field; the 27th falls
        // back to the last field with room.
        let mut properties: Vec<(String, VarType)> = (0..27)
            .map(|i| (format!("A~b{}", i), VarType::bool()))
            .collect();
        let mut arena = NodeArena::new();
        let span = Span::zero(0);
        let decls = properties
            .drain(..)
            .map(|(name, ty)| VarDecl::new(&mut arena, span, name, ty))
            .collect();
        let body = AlwaysBody::empty(&mut arena, span);
        let main = Trait::new(&mut arena, span, "main", decls, body);
        let mut program = Program::new(&mut arena, span);
        program.traits.push(main);

        let mut pm = PassManager::new();
        let layout = run(&program, &mut pm);
        assert!(!pm.has_errors(PassId::AssignVariables));
        assert_eq!(layout.len(), 27);

        // First 26 each take bit 0 of a fresh field.
        assert_eq!(layout.get_assignment("A~b0").field, "animSpeed");
        assert_eq!(layout.get_assignment("A~b25").field, "visionHeightBonus");
        for i in 0..26 {
            assert_eq!(layout.get_assignment(&format!("A~b{}", i)).lsb, 0);
        }

        // No untouched field remains; last-fit wins for the 27th.
        let overflow = layout.get_assignment("A~b26");
        assert_eq!(overflow.field, "visionHeightBonus");
        assert_eq!((overflow.lsb, overflow.msb), (1, 1));
    }

    #[test]
    fn test_capacity_diagnostic() {
        // 26 floats consume the whole catalogue; one more bool cannot be
        // placed anywhere.
        let mut names: Vec<(String, VarType)> = (0..26)
            .map(|i| (format!("A~f{}", i), VarType::float()))
            .collect();
        names.push(("A~straw".to_string(), VarType::bool()));

        let mut arena = NodeArena::new();
        let span = Span::zero(0);
        let decls = names
            .drain(..)
            .map(|(name, ty)| VarDecl::new(&mut arena, span, name, ty))
            .collect();
        let body = AlwaysBody::empty(&mut arena, span);
        let main = Trait::new(&mut arena, span, "main", decls, body);
        let mut program = Program::new(&mut arena, span);
        program.traits.push(main);

        let mut pm = PassManager::new();
        let layout = run(&program, &mut pm);

        assert!(pm.has_errors(PassId::AssignVariables));
        let message = &pm.errors(PassId::AssignVariables)[0].message;
        assert!(message.contains("failed to assign 1 of 27 total"));
        assert_eq!(layout.len(), 26);
    }

    #[test]
    fn test_whole_field_property_needs_an_untouched_field() {
        // 26 bools leave every field one bit short of whole; a float
        // needs all 52 and cannot be placed.
        let mut names: Vec<(String, VarType)> = (0..26)
            .map(|i| (format!("A~b{}", i), VarType::bool()))
            .collect();
        names.push(("A~speed".to_string(), VarType::float()));

        let mut arena = NodeArena::new();
        let span = Span::zero(0);
        let decls = names
            .drain(..)
            .map(|(name, ty)| VarDecl::new(&mut arena, span, name, ty))
            .collect();
        let body = AlwaysBody::empty(&mut arena, span);
        let main = Trait::new(&mut arena, span, "main", decls, body);
        let mut program = Program::new(&mut arena, span);
        program.traits.push(main);

        let mut pm = PassManager::new();
        let layout = run(&program, &mut pm);

        assert!(pm.has_errors(PassId::AssignVariables));
        assert_eq!(layout.len(), 26);
    }

    #[test]
    fn test_packing_is_deterministic() {
        let make = || {
            program_with(vec![
                ("A~x", VarType::int(0, 100)),
                ("A~y", VarType::bool()),
                ("A~z", VarType::float()),
                ("B~w", VarType::int(-8, 7)),
            ])
        };

        let mut pm = PassManager::new();
        let first = run(&make(), &mut pm);
        let second = run(&make(), &mut pm);
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic(expected = "no assignment for variable")]
    fn test_get_assignment_asserts_presence() {
        let layout = VariableLayout::default();
        layout.get_assignment("missing");
    }

    #[test]
    fn test_json_shape() {
        let program = program_with(vec![("A~x", VarType::int(0, 15))]);
        let mut pm = PassManager::new();
        let layout = run(&program, &mut pm);

        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["A~x"]["field"], "animSpeed");
        assert_eq!(json["A~x"]["lsb"], 0);
        assert_eq!(json["A~x"]["msb"], 3);
        assert_eq!(json["A~x"]["offset"], 0);
    }
}
