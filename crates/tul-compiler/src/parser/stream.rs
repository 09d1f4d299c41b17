//! Token stream with lookahead, backtracking, and farthest-error tracking.

use std::ops::Range;

use crate::foundation::Span;
use crate::lexer::Token;

use super::error::ParseError;

/// Token stream for the recursive descent parser.
///
/// Alternatives are tried by saving and restoring the stream position.
/// So that a failed parse still reports something useful, every error the
/// parser produces is routed through [`TokenStream::note_error`], which
/// keeps the error at the farthest input position reached; the caller of
/// a failed alternative set reports that error rather than whichever
/// branch happened to fail last.
pub struct TokenStream<'src> {
    tokens: &'src [Token],
    spans: &'src [Range<usize>],
    pos: usize,
    file_id: u16,
    source_len: u32,
    farthest_error: Option<ParseError>,
}

impl<'src> TokenStream<'src> {
    /// Create a new token stream over lexed tokens and their byte ranges.
    pub fn new(
        tokens: &'src [Token],
        spans: &'src [Range<usize>],
        file_id: u16,
        source_len: u32,
    ) -> Self {
        debug_assert_eq!(tokens.len(), spans.len());
        Self {
            tokens,
            spans,
            pos: 0,
            file_id,
            source_len,
            farthest_error: None,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    /// Advance to the next token and return the consumed one.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token variant.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Expect a specific token and advance past it.
    pub fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(self.note_error(ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_span(),
            )))
        }
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Current position, for later [`TokenStream::restore`] or
    /// [`TokenStream::span_from`].
    pub fn save(&self) -> usize {
        self.pos
    }

    /// Rewind to a previously saved position.
    pub fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Span of the current token, or a zero-length span at EOF.
    pub fn current_span(&self) -> Span {
        match self.spans.get(self.pos) {
            Some(range) => Span::new(self.file_id, range.start as u32, range.end as u32),
            None => Span::new(self.file_id, self.source_len, self.source_len),
        }
    }

    /// Span covering the tokens from a saved position up to (not
    /// including) the current one.
    pub fn span_from(&self, start: usize) -> Span {
        let start_byte = self
            .spans
            .get(start)
            .map_or(self.source_len, |r| r.start as u32);
        let end_byte = if self.pos > start {
            self.spans
                .get(self.pos - 1)
                .map_or(self.source_len, |r| r.end as u32)
        } else {
            start_byte
        };
        Span::new(self.file_id, start_byte, end_byte)
    }

    /// Record an error, keeping whichever error has reached farthest into
    /// the input. Returns the error for direct propagation.
    pub fn note_error(&mut self, err: ParseError) -> ParseError {
        let is_farther = match &self.farthest_error {
            Some(best) => err.span.start >= best.span.start,
            None => true,
        };
        if is_farther {
            self.farthest_error = Some(err.clone());
        }
        err
    }

    /// The farthest-position error recorded since the last reset, falling
    /// back to `local` if none was recorded.
    pub fn farthest_error(&mut self, local: ParseError) -> ParseError {
        match self.farthest_error.take() {
            Some(best) if best.span.start >= local.span.start => best,
            _ => local,
        }
    }

    /// Forget recorded errors; called at recovery boundaries so stale
    /// errors from an earlier region cannot outrank new ones.
    pub fn reset_error_watermark(&mut self) {
        self.farthest_error = None;
    }

    /// Skip tokens until the next top-level declaration keyword or EOF.
    pub fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek() {
                Some(Token::Trait) | Some(Token::Unit) => break,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
