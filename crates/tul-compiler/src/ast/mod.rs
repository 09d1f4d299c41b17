//! Abstract syntax tree for TUL programs.

pub mod decl;
pub mod expr;
pub mod link;
pub mod visit;

pub use decl::{
    AlwaysBody, AssignKind, AssignRhs, Program, Stmt, StmtKind, Trait, TraitInitializer, TypeKind,
    UnitDecl, VarDecl, VarType, NUM_BITS,
};
pub use expr::{ArithKind, Arithmetic, CompareOp, Field, Literal, LogicKind, Logical, MemberOp, UnitObject};
pub use link::{relink, verify, Adopt, LoopScope, ScopeIndex, ScopeInfo, TraitScope};
