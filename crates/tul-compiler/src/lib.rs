//! # TUL Compiler
//!
//! Source-to-source compiler for TUL, a small language describing unit
//! behaviors for a game runtime. A source program declares *traits*
//! (typed properties plus a continuously re-evaluated `always` body) and
//! *units* instantiating them; the compiler normalizes it to a single
//! `main` trait over a fixed set of built-in output fields, with only
//! continuous conditionals and a bit-packed layout for every property.
//!
//! ## Architecture
//!
//! ```text
//! lexer → parser → ast (+ arena parent index)
//!    ↓
//! check           name resolution, kinds, bounds
//!    ↓
//! passes          collapse_traits → simplify_transition_ifs
//!                 → merge_ifs (external oracle) → assign_variables
//!    ↓
//! VariableLayout  property → catalogue bit range (map.json)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tul_compiler::compile::{compile_file, CompileOptions};
//!
//! let result = compile_file("units.tul".as_ref(), &CompileOptions::default());
//! if result.has_errors() {
//!     eprintln!("{}", result.format_diagnostics());
//! }
//! ```

pub mod ast;
pub mod builtins;
pub mod check;
pub mod compile;
pub mod error;
pub mod foundation;
pub mod lexer;
pub mod oracle;
pub mod parser;
pub mod passes;
pub mod print;
pub mod resolve;

pub use compile::{compile_file, compile_source, CompileOptions, CompileResult, CompiledProgram};
pub use error::{CompileError, DiagnosticFormatter, ErrorKind, Severity};
pub use passes::{FieldAssignment, VariableLayout};

/// Compiler version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
