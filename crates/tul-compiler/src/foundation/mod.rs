//! Foundation types shared across the compiler: source spans and the
//! node-identity arena.

pub mod arena;
pub mod span;

pub use arena::{Ancestors, NodeArena, NodeId, NodeKind};
pub use span::{SourceFile, SourceMap, Span};
