//! Compilation passes and the pass manager.
//!
//! Pass identities are a closed enum; the driver names the passes it runs
//! in order. Each pass writes diagnostics into its own bucket via the
//! [`PassManager`]; diagnostics never interrupt a pass mid-traversal, and
//! the driver aborts the pipeline between passes when a bucket holds
//! errors.

pub mod assign_variables;
pub mod collapse_traits;
pub mod merge_ifs;
pub mod simplify_transitions;

pub use assign_variables::{FieldAssignment, VariableLayout};

use indexmap::IndexMap;

use crate::error::{CompileError, Severity};

/// Identity of a compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    Parse,
    SemanticCheck,
    CollapseTraits,
    SimplifyTransitionIfs,
    MergeIfs,
    AssignVariables,
}

impl PassId {
    /// Name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            PassId::Parse => "parse",
            PassId::SemanticCheck => "semantic_check",
            PassId::CollapseTraits => "collapse_traits",
            PassId::SimplifyTransitionIfs => "simplify_transition_ifs",
            PassId::MergeIfs => "merge_ifs",
            PassId::AssignVariables => "assign_variables",
        }
    }
}

/// Per-pass diagnostic buckets.
#[derive(Debug, Default)]
pub struct PassManager {
    buckets: IndexMap<PassId, Vec<CompileError>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic against a pass.
    pub fn report(&mut self, pass: PassId, error: CompileError) {
        self.buckets.entry(pass).or_default().push(error);
    }

    /// Record several diagnostics against a pass.
    pub fn report_all(&mut self, pass: PassId, errors: impl IntoIterator<Item = CompileError>) {
        self.buckets.entry(pass).or_default().extend(errors);
    }

    /// All diagnostics recorded by a pass so far.
    pub fn errors(&self, pass: PassId) -> &[CompileError] {
        self.buckets.get(&pass).map_or(&[], Vec::as_slice)
    }

    /// True if the pass recorded any error-severity diagnostic. Warnings
    /// and notes never abort the pipeline.
    pub fn has_errors(&self, pass: PassId) -> bool {
        self.errors(pass)
            .iter()
            .any(|e| e.severity == Severity::Error)
    }

    /// All diagnostics from all passes, in pass registration order.
    pub fn into_diagnostics(self) -> Vec<CompileError> {
        self.buckets.into_values().flatten().collect()
    }
}
