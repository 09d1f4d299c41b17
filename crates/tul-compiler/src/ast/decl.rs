//! Declaration nodes: traits, properties, statements, units, program.

use indexmap::IndexMap;

use crate::foundation::{NodeArena, NodeId, NodeKind, Span};

use super::expr::{Arithmetic, Field, Literal, Logical, UnitObject};

/// Width of integer properties, in bits. Values ultimately live in the
/// mantissa of a double-precision float in the target runtime, so 52 bits
/// is the widest integer the engine can carry losslessly.
pub const NUM_BITS: u32 = 52;

/// Primitive kind of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Bool,
    Int,
    Float,
}

/// Declared type of a trait property. `min`/`max` are meaningful only when
/// `kind` is [`TypeKind::Int`] and give an inclusive value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarType {
    pub kind: TypeKind,
    pub min: i64,
    pub max: i64,
}

impl VarType {
    pub fn bool() -> Self {
        Self {
            kind: TypeKind::Bool,
            min: 0,
            max: 0,
        }
    }

    pub fn float() -> Self {
        Self {
            kind: TypeKind::Float,
            min: 0,
            max: 0,
        }
    }

    pub fn int(min: i64, max: i64) -> Self {
        Self {
            kind: TypeKind::Int,
            min,
            max,
        }
    }

    /// True for kinds usable in arithmetic expressions.
    pub fn is_arithmetic(&self) -> bool {
        matches!(self.kind, TypeKind::Int | TypeKind::Float)
    }

    /// True for kinds usable in logical expressions.
    pub fn is_logical(&self) -> bool {
        self.kind == TypeKind::Bool
    }
}

/// A typed property declaration within a trait.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub ty: VarType,
}

impl VarDecl {
    pub fn new(arena: &mut NodeArena, span: Span, name: impl Into<String>, ty: VarType) -> Self {
        Self {
            id: arena.alloc(NodeKind::VarDecl),
            span,
            name: name.into(),
            ty,
        }
    }
}

/// Whether an assignment sets or adds to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignKind {
    /// `:=`
    Absolute,
    /// `+=`
    Relative,
}

/// Right-hand side of an assignment.
#[derive(Debug, Clone)]
pub enum AssignRhs {
    Arithmetic(Arithmetic),
    Logical(Logical),
}

/// A statement in an always-body.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

/// Statement structure.
#[derive(Debug, Clone)]
pub enum StmtKind {
    Assignment {
        lhs: Field,
        kind: AssignKind,
        rhs: AssignRhs,
    },
    /// Body applies on every tick the condition holds.
    ContinuousIf {
        condition: Logical,
        body: AlwaysBody,
    },
    /// Body applies on the tick the condition becomes true.
    TransitionIf {
        condition: Logical,
        body: AlwaysBody,
    },
    /// Iterate over units within `range` of `range_unit` possessing all
    /// listed traits.
    ForIn {
        variable: String,
        range: f64,
        range_unit: UnitObject,
        traits: Vec<String>,
        body: AlwaysBody,
    },
}

impl Stmt {
    pub fn new(arena: &mut NodeArena, span: Span, kind: StmtKind) -> Self {
        Self {
            id: arena.alloc(NodeKind::Stmt),
            span,
            kind,
        }
    }

    /// Build an absolute assignment statement.
    pub fn assign(arena: &mut NodeArena, span: Span, lhs: Field, rhs: AssignRhs) -> Self {
        Self::new(
            arena,
            span,
            StmtKind::Assignment {
                lhs,
                kind: AssignKind::Absolute,
                rhs,
            },
        )
    }

    /// Build a continuous conditional.
    pub fn continuous_if(
        arena: &mut NodeArena,
        span: Span,
        condition: Logical,
        body: AlwaysBody,
    ) -> Self {
        Self::new(arena, span, StmtKind::ContinuousIf { condition, body })
    }
}

/// Ordered list of statements re-evaluated every tick.
#[derive(Debug, Clone)]
pub struct AlwaysBody {
    pub id: NodeId,
    pub span: Span,
    pub exprs: Vec<Stmt>,
}

impl AlwaysBody {
    pub fn new(arena: &mut NodeArena, span: Span, exprs: Vec<Stmt>) -> Self {
        Self {
            id: arena.alloc(NodeKind::AlwaysBody),
            span,
            exprs,
        }
    }

    /// Build an empty body.
    pub fn empty(arena: &mut NodeArena, span: Span) -> Self {
        Self::new(arena, span, Vec::new())
    }
}

/// A named bundle of typed properties plus a continuously-evaluated body.
#[derive(Debug, Clone)]
pub struct Trait {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub properties: Vec<VarDecl>,
    pub body: AlwaysBody,
}

impl Trait {
    pub fn new(
        arena: &mut NodeArena,
        span: Span,
        name: impl Into<String>,
        properties: Vec<VarDecl>,
        body: AlwaysBody,
    ) -> Self {
        Self {
            id: arena.alloc(NodeKind::Trait),
            span,
            name: name.into(),
            properties,
            body,
        }
    }

    /// Look up a property declaration by name.
    pub fn property(&self, name: &str) -> Option<&VarDecl> {
        self.properties.iter().find(|d| d.name == name)
    }
}

/// One trait named in a unit declaration, with initial property values.
#[derive(Debug, Clone)]
pub struct TraitInitializer {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    /// Property name → initial value, in source order.
    pub values: IndexMap<String, Literal>,
}

impl TraitInitializer {
    pub fn new(
        arena: &mut NodeArena,
        span: Span,
        name: impl Into<String>,
        values: IndexMap<String, Literal>,
    ) -> Self {
        Self {
            id: arena.alloc(NodeKind::TraitInit),
            span,
            name: name.into(),
            values,
        }
    }
}

/// A unit kind: a name plus the traits it instantiates.
#[derive(Debug, Clone)]
pub struct UnitDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub initializers: Vec<TraitInitializer>,
}

impl UnitDecl {
    pub fn new(
        arena: &mut NodeArena,
        span: Span,
        name: impl Into<String>,
        initializers: Vec<TraitInitializer>,
    ) -> Self {
        Self {
            id: arena.alloc(NodeKind::UnitDecl),
            span,
            name: name.into(),
            initializers,
        }
    }
}

/// Root of the AST: all traits and unit declarations of one compilation.
#[derive(Debug, Clone)]
pub struct Program {
    pub id: NodeId,
    pub span: Span,
    pub traits: Vec<Trait>,
    pub units: Vec<UnitDecl>,
}

impl Program {
    pub fn new(arena: &mut NodeArena, span: Span) -> Self {
        Self {
            id: arena.alloc(NodeKind::Program),
            span,
            traits: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Look up a trait by name.
    pub fn trait_by_name(&self, name: &str) -> Option<&Trait> {
        self.traits.iter().find(|t| t.name == name)
    }
}
