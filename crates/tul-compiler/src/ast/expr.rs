//! Expression nodes: field references, arithmetic and logical trees.
//!
//! Expressions follow the `{ id, span, kind }` shape: the kind enum carries
//! the structure, the id ties the node into the [`NodeArena`] parent index,
//! and the span points back into the source.
//!
//! Arithmetic and logical trees are kept separate: an arithmetic leaf is an
//! integer literal, a float literal, or a field reference of arithmetic
//! kind; a logical leaf is a boolean literal, a boolean field reference, or
//! a comparison of two arithmetic expressions. Which kind a field actually
//! has is a semantic question answered by the checker, not by the parser.

use crate::foundation::{NodeArena, NodeId, NodeKind, Span};

/// Literal value as written in source or in a trait initializer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// The unit object a field reference reads from or writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitObject {
    /// The unit evaluating the enclosing always-body (`this`)
    This,
    /// The unit's type (`type`)
    Type,
    /// A loop variable bound by an enclosing `for` (`x`)
    Identifier(String),
}

/// How a field name is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOp {
    /// `::` — a field in the fixed engine catalogue
    Builtin,
    /// `.` — a user-declared trait property
    Custom,
    /// `->` — an engine intrinsic such as rate-of-change
    Language,
}

/// Comparison operator between two arithmetic expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
}

/// A field reference: unit object, member operator, and field name.
#[derive(Debug, Clone)]
pub struct Field {
    pub id: NodeId,
    pub span: Span,
    pub unit: UnitObject,
    pub member_op: MemberOp,
    pub name: String,
    /// True for the rate-of-change intrinsic (`->rate`).
    pub is_rate: bool,
}

impl Field {
    /// Create a field reference. `is_rate` is derived from the member
    /// operator and name.
    pub fn new(
        arena: &mut NodeArena,
        span: Span,
        unit: UnitObject,
        member_op: MemberOp,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let is_rate = member_op == MemberOp::Language && name == "rate";
        Self {
            id: arena.alloc(NodeKind::Field),
            span,
            unit,
            member_op,
            name,
            is_rate,
        }
    }
}

/// Arithmetic expression node.
#[derive(Debug, Clone)]
pub struct Arithmetic {
    pub id: NodeId,
    pub span: Span,
    pub kind: ArithKind,
}

/// Arithmetic expression structure.
#[derive(Debug, Clone)]
pub enum ArithKind {
    Add(Box<Arithmetic>, Box<Arithmetic>),
    Sub(Box<Arithmetic>, Box<Arithmetic>),
    Mul(Box<Arithmetic>, Box<Arithmetic>),
    Div(Box<Arithmetic>, Box<Arithmetic>),
    Mod(Box<Arithmetic>, Box<Arithmetic>),
    Exp(Box<Arithmetic>, Box<Arithmetic>),
    Int(i64),
    Float(f64),
    Field(Field),
}

impl Arithmetic {
    pub fn new(arena: &mut NodeArena, span: Span, kind: ArithKind) -> Self {
        Self {
            id: arena.alloc(NodeKind::Arithmetic),
            span,
            kind,
        }
    }

    /// Integer literal leaf.
    pub fn int(arena: &mut NodeArena, span: Span, value: i64) -> Self {
        Self::new(arena, span, ArithKind::Int(value))
    }

    /// Float literal leaf.
    pub fn float(arena: &mut NodeArena, span: Span, value: f64) -> Self {
        Self::new(arena, span, ArithKind::Float(value))
    }

    /// Field reference leaf.
    pub fn field(arena: &mut NodeArena, span: Span, field: Field) -> Self {
        Self::new(arena, span, ArithKind::Field(field))
    }

    /// Binary `%` node.
    pub fn modulo(arena: &mut NodeArena, span: Span, lhs: Arithmetic, rhs: Arithmetic) -> Self {
        Self::new(arena, span, ArithKind::Mod(Box::new(lhs), Box::new(rhs)))
    }
}

/// Logical expression node.
#[derive(Debug, Clone)]
pub struct Logical {
    pub id: NodeId,
    pub span: Span,
    pub kind: LogicKind,
}

/// Logical expression structure.
#[derive(Debug, Clone)]
pub enum LogicKind {
    And(Box<Logical>, Box<Logical>),
    Or(Box<Logical>, Box<Logical>),
    Not(Box<Logical>),
    Comparison {
        lhs: Box<Arithmetic>,
        op: CompareOp,
        rhs: Box<Arithmetic>,
    },
    Bool(bool),
    Field(Field),
}

impl Logical {
    pub fn new(arena: &mut NodeArena, span: Span, kind: LogicKind) -> Self {
        Self {
            id: arena.alloc(NodeKind::Logical),
            span,
            kind,
        }
    }

    /// Boolean literal leaf.
    pub fn bool(arena: &mut NodeArena, span: Span, value: bool) -> Self {
        Self::new(arena, span, LogicKind::Bool(value))
    }

    /// Boolean field reference leaf.
    pub fn field(arena: &mut NodeArena, span: Span, field: Field) -> Self {
        Self::new(arena, span, LogicKind::Field(field))
    }

    /// Conjunction of two logical expressions.
    pub fn and(arena: &mut NodeArena, span: Span, lhs: Logical, rhs: Logical) -> Self {
        Self::new(arena, span, LogicKind::And(Box::new(lhs), Box::new(rhs)))
    }

    /// Negation of a logical expression.
    pub fn not(arena: &mut NodeArena, span: Span, inner: Logical) -> Self {
        Self::new(arena, span, LogicKind::Not(Box::new(inner)))
    }

    /// Comparison of two arithmetic expressions.
    pub fn comparison(
        arena: &mut NodeArena,
        span: Span,
        lhs: Arithmetic,
        op: CompareOp,
        rhs: Arithmetic,
    ) -> Self {
        Self::new(
            arena,
            span,
            LogicKind::Comparison {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            },
        )
    }
}
