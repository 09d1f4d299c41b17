//! High-level compile API: the pass pipeline over one source file.
//!
//! Pipeline order:
//!
//! ```text
//! parse → check → collapse_traits → check → simplify_transition_ifs
//!       → merge_ifs → check → assign_variables
//! ```
//!
//! Parent links are re-established and verified after every structural
//! pass. Any pass bucket holding an error aborts the pipeline; warnings
//! (oracle downgrades) ride along on success. Between passes the printed
//! program is emitted at debug level for pipeline archaeology.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::ast::{self, Program};
use crate::check;
use crate::error::{CompileError, DiagnosticFormatter, ErrorKind, Severity};
use crate::foundation::{NodeArena, SourceMap, Span};
use crate::oracle::{EquivalenceOracle, Oracle};
use crate::parser;
use crate::passes::{
    assign_variables, collapse_traits, merge_ifs, simplify_transitions, PassId, PassManager,
    VariableLayout,
};
use crate::print::Printer;

/// Options for [`compile_file`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Command used to spawn the rewriting oracle.
    pub oracle_command: String,
    /// Module file handed to the oracle at spawn, if any.
    pub oracle_module: Option<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            oracle_command: "maude".to_string(),
            oracle_module: None,
        }
    }
}

/// A successfully compiled program: the normalized AST, its arena, and
/// the packed variable layout.
pub struct CompiledProgram {
    pub program: Program,
    pub arena: NodeArena,
    pub layout: VariableLayout,
}

/// Outcome of a compilation: diagnostics plus the program when no
/// diagnostic was an error.
pub struct CompileResult {
    pub source_map: SourceMap,
    pub program: Option<CompiledProgram>,
    pub diagnostics: Vec<CompileError>,
}

impl CompileResult {
    /// True if any diagnostic is an error (the program is then absent).
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Render all diagnostics with source context.
    pub fn format_diagnostics(&self) -> String {
        DiagnosticFormatter::new(&self.source_map).format_all(&self.diagnostics)
    }
}

/// Compile a source file from disk, spawning the configured oracle for
/// the merge pass. Oracle spawn failure is non-fatal.
pub fn compile_file(path: &Path, options: &CompileOptions) -> CompileResult {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            return CompileResult {
                source_map: SourceMap::new(),
                program: None,
                diagnostics: vec![CompileError::new(
                    ErrorKind::Internal,
                    Span::zero(0),
                    format!("failed to read {}: {}", path.display(), err),
                )],
            };
        }
    };

    match Oracle::spawn(&options.oracle_command, options.oracle_module.as_deref()) {
        Ok(mut oracle) => compile_source(path.to_path_buf(), source, Some(&mut oracle)),
        Err(err) => {
            warn!("{}", err);
            compile_source(path.to_path_buf(), source, None)
        }
    }
}

/// Compile one source text with an explicit oracle (or none).
pub fn compile_source(
    path: PathBuf,
    source: String,
    oracle: Option<&mut dyn EquivalenceOracle>,
) -> CompileResult {
    let mut source_map = SourceMap::new();
    let file_id = source_map.add_file(path, source.clone());

    let mut arena = NodeArena::new();
    let mut pm = PassManager::new();

    let abort = |source_map: SourceMap, pm: PassManager| CompileResult {
        source_map,
        program: None,
        diagnostics: pm.into_diagnostics(),
    };

    // Parse.
    let mut program = match parser::parse(&source, file_id, &mut arena) {
        Ok(program) => program,
        Err(parse_errors) => {
            for err in parse_errors {
                pm.report(
                    PassId::Parse,
                    CompileError::new(ErrorKind::Syntax, err.span, err.message),
                );
            }
            return abort(source_map, pm);
        }
    };
    let mut scopes = ast::relink(&program, &mut arena);
    ast::verify(&program, &arena);
    trace_program("parse", &program);

    // Check the source program.
    pm.report_all(
        PassId::SemanticCheck,
        check::check(&program, &arena, &scopes),
    );
    if pm.has_errors(PassId::SemanticCheck) {
        return abort(source_map, pm);
    }

    // Collapse all traits into main.
    collapse_traits::run(&mut program, &mut arena, &scopes, &mut pm);
    scopes = ast::relink(&program, &mut arena);
    ast::verify(&program, &arena);
    trace_program("collapse_traits", &program);
    if pm.has_errors(PassId::CollapseTraits) {
        return abort(source_map, pm);
    }

    pm.report_all(
        PassId::SemanticCheck,
        check::check(&program, &arena, &scopes),
    );
    if pm.has_errors(PassId::SemanticCheck) {
        return abort(source_map, pm);
    }

    // Lower edge-triggered conditionals.
    simplify_transitions::run(&mut program, &mut arena);
    ast::relink(&program, &mut arena);
    ast::verify(&program, &arena);
    trace_program("simplify_transition_ifs", &program);

    // Flatten and merge conditionals.
    merge_ifs::run(&mut program, &mut arena, oracle, &mut pm);
    scopes = ast::relink(&program, &mut arena);
    ast::verify(&program, &arena);
    trace_program("merge_ifs", &program);
    if pm.has_errors(PassId::MergeIfs) {
        return abort(source_map, pm);
    }

    pm.report_all(
        PassId::SemanticCheck,
        check::check(&program, &arena, &scopes),
    );
    if pm.has_errors(PassId::SemanticCheck) {
        return abort(source_map, pm);
    }

    // Pack properties onto the output catalogue.
    let layout = assign_variables::run(&program, &mut pm);
    if pm.has_errors(PassId::AssignVariables) {
        return abort(source_map, pm);
    }

    CompileResult {
        source_map,
        program: Some(CompiledProgram {
            program,
            arena,
            layout,
        }),
        diagnostics: pm.into_diagnostics(),
    }
}

fn trace_program(stage: &str, program: &Program) {
    debug!(
        "program after {}:\n{}",
        stage,
        Printer::surface().print_program(program)
    );
}
