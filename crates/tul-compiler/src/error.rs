//! Compile-time diagnostics.
//!
//! # Design
//!
//! - `CompileError` — single diagnostic with a primary span, message, and
//!   optional secondary labels and notes
//! - `ErrorKind` — categorizes diagnostics by the kind of rule violated
//! - `Severity` — error, warning, or note; only errors abort the pipeline
//! - `DiagnosticFormatter` — renders diagnostics with source snippets

use crate::foundation::{SourceMap, Span};
use std::fmt;

/// Compilation diagnostic with source location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Category of this diagnostic
    pub kind: ErrorKind,
    /// Severity level
    pub severity: Severity,
    /// Primary source location
    pub span: Span,
    /// Primary message
    pub message: String,
    /// Additional labeled spans
    pub labels: Vec<Label>,
    /// Additional notes or hints
    pub notes: Vec<String>,
}

/// Category of diagnostic, by the kind of rule violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid token or malformed construct
    Syntax,
    /// Integer type bounds, initializer ranges, negative loop ranges
    Bounds,
    /// Duplicate properties, traits, or unit declarations
    Naming,
    /// Undeclared identifiers, traits, or properties
    Resolution,
    /// Expression or assignment kind mismatch
    Type,
    /// Operations the language forbids outright
    IllegalOperation,
    /// Variable packing ran out of catalogue bits
    Capacity,
    /// Rewriting oracle unavailable or gave no usable answer
    Oracle,
    /// Internal compiler error
    Internal,
}

impl ErrorKind {
    /// Human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Bounds => "bounds error",
            ErrorKind::Naming => "naming error",
            ErrorKind::Resolution => "resolution error",
            ErrorKind::Type => "type error",
            ErrorKind::IllegalOperation => "illegal operation",
            ErrorKind::Capacity => "capacity error",
            ErrorKind::Oracle => "oracle failure",
            ErrorKind::Internal => "internal compiler error",
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

/// Secondary labeled span pointing at related code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl CompileError {
    /// Create a new error diagnostic.
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Error, span, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Warning, span, message)
    }

    /// Create a new note diagnostic.
    pub fn note(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Note, span, message)
    }

    fn with_severity(kind: ErrorKind, severity: Severity, span: Span, message: String) -> Self {
        Self {
            kind,
            severity,
            span,
            message,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Add a secondary labeled span.
    pub fn with_label(mut self, span: Span, message: String) -> Self {
        self.labels.push(Label { span, message });
        self
    }

    /// Add a note or hint.
    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind.name(), self.message)
    }
}

impl std::error::Error for CompileError {}

/// Formats diagnostics with source context.
///
/// Each diagnostic renders as a `severity: kind: message` header, a
/// `file:line:col` location line, the offending source line with a
/// `^^^` underline, then secondary labels and notes.
pub struct DiagnosticFormatter<'a> {
    sources: &'a SourceMap,
}

impl<'a> DiagnosticFormatter<'a> {
    /// Create a formatter over the given sources.
    pub fn new(sources: &'a SourceMap) -> Self {
        Self { sources }
    }

    /// Format a single diagnostic.
    pub fn format(&self, error: &CompileError) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}: {}: {}\n",
            error.severity,
            error.kind.name(),
            error.message
        ));

        let file_path = self.sources.file_path(&error.span);
        let (line, col) = self.sources.line_col(&error.span);
        output.push_str(&format!("  --> {}:{}:{}\n", file_path.display(), line, col));

        let file = self.sources.file(&error.span);
        if let Some(source_line) = file.line_text(line) {
            output.push_str("   |\n");
            output.push_str(&format!("{:3} | {}\n", line, source_line));

            let start_col = col as usize;
            let span_len = (error.span.end - error.span.start) as usize;
            let end_col = (start_col + span_len).min(source_line.len() + 1);
            let underline = " ".repeat(start_col.saturating_sub(1))
                + &"^".repeat(end_col.saturating_sub(start_col).max(1));
            output.push_str(&format!("   | {}\n", underline));
        }

        for label in &error.labels {
            let (label_line, label_col) = self.sources.line_col(&label.span);
            let label_path = self.sources.file_path(&label.span);
            output.push_str(&format!(
                "   = note: {} (at {}:{}:{})\n",
                label.message,
                label_path.display(),
                label_line,
                label_col
            ));
        }

        for note in &error.notes {
            output.push_str(&format!("   = help: {}\n", note));
        }

        output
    }

    /// Format multiple diagnostics separated by blank lines.
    pub fn format_all(&self, errors: &[CompileError]) -> String {
        errors
            .iter()
            .map(|e| self.format(e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_sources() -> SourceMap {
        let mut sources = SourceMap::new();
        sources.add_file(
            PathBuf::from("test.tul"),
            "trait A {\nunit U : B;\n".to_string(),
        );
        sources
    }

    #[test]
    fn test_error_creation() {
        let err = CompileError::new(
            ErrorKind::Naming,
            Span::zero(0),
            "duplicate trait 'A'".to_string(),
        );

        assert_eq!(err.kind, ErrorKind::Naming);
        assert_eq!(err.severity, Severity::Error);
        assert!(err.labels.is_empty());
    }

    #[test]
    fn test_warning_severity() {
        let warn = CompileError::warning(
            ErrorKind::Oracle,
            Span::zero(0),
            "oracle unavailable".to_string(),
        );
        assert_eq!(warn.severity, Severity::Warning);
    }

    #[test]
    fn test_display() {
        let err = CompileError::new(
            ErrorKind::Type,
            Span::zero(0),
            "cannot assign logical value".to_string(),
        );
        let text = format!("{}", err);
        assert!(text.contains("error"));
        assert!(text.contains("type error"));
        assert!(text.contains("cannot assign logical value"));
    }

    #[test]
    fn test_formatter_location_and_snippet() {
        let sources = test_sources();
        let span = Span::new(0, 10, 14); // "unit" on line 2

        let error = CompileError::new(
            ErrorKind::Resolution,
            span,
            "undeclared trait 'B'".to_string(),
        );

        let formatter = DiagnosticFormatter::new(&sources);
        let formatted = formatter.format(&error);

        assert!(formatted.contains("undeclared trait 'B'"));
        assert!(formatted.contains("test.tul:2:1"));
        assert!(formatted.contains("unit U : B;"));
        assert!(formatted.contains("^^^^"));
    }

    #[test]
    fn test_formatter_notes() {
        let sources = test_sources();
        let error = CompileError::new(ErrorKind::Bounds, Span::new(0, 0, 5), "bad".to_string())
            .with_note("bounds must fit in 52 bits".to_string());

        let formatted = DiagnosticFormatter::new(&sources).format(&error);
        assert!(formatted.contains("help: bounds must fit in 52 bits"));
    }
}
