//! Catalogues of engine-defined fields.
//!
//! Two catalogues exist:
//!
//! - **Output fields** — the numeric channels the packed variable layout
//!   writes into. Each carries [`NUM_BITS`](crate::ast::NUM_BITS) bits of
//!   value capacity and is assignable from unit logic.
//! - **Readable fields** — engine state readable through the `::` member
//!   operator. Each has a declared kind used to type field references.
//!
//! Both lists are part of the engine contract; changing an entry changes
//! the wire format consumed by the runtime.

use crate::ast::TypeKind;

/// Output field catalogue, in engine declaration order.
///
/// The packing pass scans these alphabetically; keep the list itself in
/// the engine's order so diffs against the runtime tables stay readable.
pub const OUTPUT_FIELDS: &[&str] = &[
    "animSpeed",
    "bodyPower",
    "bounceDistMax",
    "bounceDistMin",
    "bouncePower",
    "cargoUse",
    "cost",
    "healthbarOffset",
    "healthbarWidth",
    "height",
    "lifesteal",
    "limit",
    "oscillationAmplitude",
    "percDmg",
    "power",
    "projectileLen",
    "projectileStartHeight",
    "selectionOffsetY",
    "size",
    "startHp",
    "startMana",
    "supply",
    "supplyProvided",
    "tabPriority",
    "vision",
    "visionHeightBonus",
];

/// Readable engine fields and their kinds.
const READABLE_FIELDS: &[(&str, TypeKind)] = &[
    ("hp", TypeKind::Float),
    ("mana", TypeKind::Float),
    ("hpRegenerationRate", TypeKind::Float),
    ("manaRegenerationRate", TypeKind::Float),
    ("armor", TypeKind::Float),
    ("weaponCooldown", TypeKind::Float),
    ("weaponDelay", TypeKind::Float),
    ("dmg", TypeKind::Float),
    ("armorPenetration", TypeKind::Float),
    ("dmgCap", TypeKind::Float),
    ("range", TypeKind::Float),
    ("minRange", TypeKind::Float),
    ("aoeRadius", TypeKind::Float),
    ("attackPrio", TypeKind::Float),
    ("imageScale", TypeKind::Float),
    ("repairRate", TypeKind::Float),
    ("repairCost", TypeKind::Float),
    ("projectileSpeed", TypeKind::Float),
    ("circleSize", TypeKind::Float),
    ("circleOffset", TypeKind::Float),
    ("drawOffsetY", TypeKind::Float),
    ("acceleration", TypeKind::Float),
    ("angularVelocity", TypeKind::Float),
    ("goldReward", TypeKind::Float),
    ("controllable", TypeKind::Bool),
    ("hasDetection", TypeKind::Bool),
    ("noShow", TypeKind::Bool),
    ("isInvisible", TypeKind::Bool),
];

/// Engine intrinsics reachable through the `->` member operator.
const LANGUAGE_INTRINSICS: &[&str] = &["rate"];

/// True if `name` is one of the writable output fields.
pub fn is_output_field(name: &str) -> bool {
    OUTPUT_FIELDS.contains(&name)
}

/// Kind of a readable builtin field, if `name` is one.
pub fn readable_kind(name: &str) -> Option<TypeKind> {
    READABLE_FIELDS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, kind)| *kind)
}

/// Kind of any builtin field reachable through `::`, output fields
/// included (output channels are numeric).
pub fn builtin_kind(name: &str) -> Option<TypeKind> {
    readable_kind(name).or_else(|| is_output_field(name).then_some(TypeKind::Float))
}

/// True if `name` is a known `->` intrinsic.
pub fn is_language_intrinsic(name: &str) -> bool {
    LANGUAGE_INTRINSICS.contains(&name)
}
