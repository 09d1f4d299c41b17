//! Source location tracking for error reporting.
//!
//! # Design
//!
//! - `Span` — compact byte range into a source file
//! - `SourceMap` — manages all source files and provides lookup operations
//! - `SourceFile` — single source file with line indexing
//!
//! Line/column positions are always derived from byte offsets via the
//! [`SourceMap`], never cached on the span itself.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compact source location reference.
///
/// Points to a byte range in a source file registered with a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index into `SourceMap::files`
    pub file_id: u16,
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
}

/// Collection of all source files in a compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// A single source file with line indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path as given on the command line
    pub path: PathBuf,
    /// Original source text
    pub source: String,
    /// Byte offsets of each line start; always ends with an EOF sentinel
    pub line_starts: Vec<u32>,
}

impl Span {
    /// Create a new span.
    pub fn new(file_id: u16, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    /// Create a zero-length span at the start of a file.
    pub fn zero(file_id: u16) -> Self {
        Self::new(file_id, 0, 0)
    }

    /// Check if this span is zero-length.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one covering both.
    ///
    /// # Panics
    /// Panics if the spans are from different files.
    pub fn merge(&self, other: &Span) -> Span {
        assert_eq!(
            self.file_id, other.file_id,
            "cannot merge spans from different files"
        );
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a source file and return its ID.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u16 {
        let file_id = self.files.len();
        assert!(file_id < u16::MAX as usize, "too many source files");

        self.files.push(SourceFile::new(path, source));
        file_id as u16
    }

    /// Get the source file for a span.
    pub fn file(&self, span: &Span) -> &SourceFile {
        &self.files[span.file_id as usize]
    }

    /// Get the file path for a span.
    pub fn file_path(&self, span: &Span) -> &Path {
        &self.files[span.file_id as usize].path
    }

    /// Get the source snippet covered by a span.
    pub fn snippet(&self, span: &Span) -> &str {
        let file = &self.files[span.file_id as usize];
        &file.source[span.start as usize..span.end as usize]
    }

    /// Get the 1-based (line, column) position of a span's start.
    pub fn line_col(&self, span: &Span) -> (u32, u32) {
        self.files[span.file_id as usize].line_col(span.start)
    }

    /// Get the number of files in this map.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

impl SourceFile {
    /// Create a new source file with precomputed line starts.
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// Get 1-based (line, column) for a byte offset.
    ///
    /// # Panics
    /// Panics if the offset is beyond EOF.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        assert!(
            offset <= self.source.len() as u32,
            "offset {} is beyond EOF (len = {})",
            offset,
            self.source.len()
        );

        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };

        let line = (line_idx + 1) as u32;
        let col = (offset - self.line_starts[line_idx]) + 1;

        (line, col)
    }

    /// Get the text of a specific line (1-based), without its newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }

        let start = self.line_starts[(line - 1) as usize] as usize;
        let end = self.line_starts[line as usize] as usize;
        Some(self.source[start..end].trim_end_matches('\n'))
    }

    /// Get the number of lines in this file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }
}

/// Compute byte offsets of line starts, with an EOF sentinel as the last
/// element so that the final line's range is always available.
fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];

    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }

    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }

    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(0, 10, 20);
        let b = Span::new(0, 15, 30);
        let merged = a.merge(&b);

        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
    }

    #[test]
    #[should_panic(expected = "cannot merge spans from different files")]
    fn test_span_merge_panics_on_different_files() {
        let a = Span::new(0, 0, 1);
        let b = Span::new(1, 0, 1);
        let _ = a.merge(&b);
    }

    #[test]
    fn test_compute_line_starts() {
        let source = "trait A {\n}\n";
        let line_starts = compute_line_starts(source);
        assert_eq!(line_starts, vec![0, 10, 12]);

        let no_trailing = "trait A {\n}";
        let line_starts = compute_line_starts(no_trailing);
        assert_eq!(line_starts, vec![0, 10, 11]);
    }

    #[test]
    fn test_line_col() {
        let file = SourceFile::new(PathBuf::from("test.tul"), "trait A {\n}\n".to_string());

        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(6), (1, 7));
        assert_eq!(file.line_col(10), (2, 1));
    }

    #[test]
    fn test_line_text() {
        let file = SourceFile::new(PathBuf::from("test.tul"), "trait A {\n}\n".to_string());

        assert_eq!(file.line_text(1), Some("trait A {"));
        assert_eq!(file.line_text(2), Some("}"));
        assert_eq!(file.line_text(3), None);
    }

    #[test]
    fn test_source_map() {
        let mut map = SourceMap::new();
        let file_id = map.add_file(PathBuf::from("test.tul"), "unit U : A;".to_string());

        assert_eq!(map.file_count(), 1);

        let span = Span::new(file_id, 0, 4);
        assert_eq!(map.snippet(&span), "unit");
        assert_eq!(map.file_path(&span).to_str(), Some("test.tul"));
        assert_eq!(map.line_col(&span), (1, 1));
    }
}
