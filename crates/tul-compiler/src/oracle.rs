//! Client for the external term-rewriting oracle.
//!
//! The oracle is a Maude-style rewriter driven over a line protocol:
//! one `red <expr> .` command in, output lines back until one starting
//! with `result` arrives, of the form `result <SORT>: <normal form>`.
//!
//! The subprocess lives for the duration of one merge pass and is killed
//! on drop. All failures are surfaced as [`OracleError`]; callers treat
//! them as non-fatal (a warning and a skipped merge, never an abort).

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use thiserror::Error;

/// Oracle failure modes.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to spawn oracle process '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("oracle pipe error: {0}")]
    Pipe(#[from] std::io::Error),
    #[error("oracle produced no result line")]
    NoResult,
    #[error("malformed oracle result line: {0:?}")]
    Malformed(String),
}

/// A successful reduction: the sort of the normal form, and the normal
/// form itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub sort: String,
    pub normal_form: String,
}

/// Anything that can reduce an expression to a normal form.
///
/// The merge pass is written against this trait; the production
/// implementation is [`Oracle`], tests use scripted stubs.
pub trait EquivalenceOracle {
    fn reduce(&mut self, expr: &str) -> Result<Reduction, OracleError>;
}

/// Handle to a running oracle subprocess.
pub struct Oracle {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Oracle {
    /// Spawn the oracle. `module` is passed as an argument so the
    /// rewriter loads its prelude before reading commands.
    pub fn spawn(command: &str, module: Option<&Path>) -> Result<Self, OracleError> {
        let mut cmd = Command::new(command);
        if let Some(module) = module {
            cmd.arg(module);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OracleError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = BufReader::new(child.stdout.take().expect("stdout was piped"));

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }
}

impl EquivalenceOracle for Oracle {
    fn reduce(&mut self, expr: &str) -> Result<Reduction, OracleError> {
        writeln!(self.stdin, "red {} .", expr)?;
        self.stdin.flush()?;

        let mut line = String::new();
        loop {
            line.clear();
            let bytes = self.stdout.read_line(&mut line)?;
            if bytes == 0 {
                return Err(OracleError::NoResult);
            }
            if line.starts_with("result") {
                return parse_result_line(line.trim_end());
            }
        }
    }
}

impl Drop for Oracle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Parse `result <SORT>: <normal form>`.
fn parse_result_line(line: &str) -> Result<Reduction, OracleError> {
    let rest = line
        .strip_prefix("result")
        .ok_or_else(|| OracleError::Malformed(line.to_string()))?;
    let colon = rest
        .find(':')
        .ok_or_else(|| OracleError::Malformed(line.to_string()))?;

    let sort = rest[..colon].trim().to_string();
    let normal_form = rest[colon + 1..].trim().to_string();
    if sort.is_empty() || normal_form.is_empty() {
        return Err(OracleError::Malformed(line.to_string()));
    }

    Ok(Reduction { sort, normal_form })
}
