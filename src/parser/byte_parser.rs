//! Cursor over an in-memory ASCII buffer.
//!
//! [ByteParser] is shared by the Newick tree reader and the FASTA reader.
//! Tree and alignment files are small, so the whole input is held in memory.

use crate::parser::parsing_error::ParsingError;

/// Bytes treated as whitespace between tokens.
const WHITESPACE: &[u8] = b" \t\n\r";

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// Byte cursor with peeking, bracket comments and quoted labels.
///
/// Single-byte matching is ASCII case-insensitive.
///
/// # Example
/// ```
/// use stochmap::parser::byte_parser::ByteParser;
///
/// let mut parser = ByteParser::for_str(">kea\nACGT");
/// assert!(parser.consume_if(b'>'));
/// assert_eq!(parser.parse_unquoted_label(b"\n").unwrap(), "kea");
/// parser.skip_whitespace();
/// assert_eq!(parser.peek(), Some(b'A'));
/// ```
pub struct ByteParser {
    input: Vec<u8>,
    pos: usize,
}

impl ByteParser {
    /// Takes ownership of `input`.
    pub fn new(input: Vec<u8>) -> Self {
        Self { input, pos: 0 }
    }

    pub fn for_str(input: &str) -> Self {
        Self::new(input.as_bytes().to_vec())
    }

    /// Current byte, `None` at the end of input.
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consumes and returns the current byte.
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Offset of the current byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Up to `k` bytes from the current position, lossily decoded.
    pub fn context(&self, k: usize) -> String {
        let start = self.pos.min(self.input.len());
        let end = self.pos.saturating_add(k).min(self.input.len());
        String::from_utf8_lossy(&self.input[start..end]).into_owned()
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| WHITESPACE.contains(&b)) {
            self.pos += 1;
        }
    }

    /// Skips whitespace and any number of `[...]` comments.
    ///
    /// # Errors
    /// [ParsingError] for a comment that is never closed.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        loop {
            self.skip_whitespace();
            if !self.consume_if(b'[') {
                return Ok(());
            }
            if !self.consume_until(b']', ConsumeMode::Inclusive) {
                return Err(ParsingError::unclosed_comment(self));
            }
        }
    }

    /// Whether the current byte is `ch`, ignoring ASCII case.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek().is_some_and(|b| b.eq_ignore_ascii_case(&ch))
    }

    /// Consumes the current byte if it is `ch`, ignoring ASCII case.
    pub fn consume_if(&mut self, ch: u8) -> bool {
        let matched = self.peek_is(ch);
        if matched {
            self.pos += 1;
        }
        matched
    }

    /// Advances to `target`; returns `false` if the input ends first.
    pub fn consume_until(&mut self, target: u8, mode: ConsumeMode) -> bool {
        match self.input[self.pos.min(self.input.len())..].iter().position(|&b| b == target) {
            Some(offset) => {
                self.pos += offset;
                if mode == ConsumeMode::Inclusive {
                    self.pos += 1;
                }
                true
            }
            None => {
                self.pos = self.input.len();
                false
            }
        }
    }

    /// Reads a label after leading whitespace and comments.
    ///
    /// A label starting with `'` runs to the matching quote, where `''`
    /// stands for a literal quote. Otherwise it runs up to the first byte
    /// in `delimiters`.
    ///
    /// # Errors
    /// [ParsingError] for an unterminated quoted label or comment.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;
        if self.peek() == Some(b'\'') {
            self.parse_quoted_label()
        } else {
            self.parse_unquoted_label(delimiters)
        }
    }

    fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.pos += 1;
        let mut label = String::new();
        loop {
            match self.next_byte() {
                Some(b'\'') if self.peek() == Some(b'\'') => {
                    label.push('\'');
                    self.pos += 1;
                }
                Some(b'\'') => return Ok(label),
                Some(b) => label.push(b as char),
                None => return Err(ParsingError::unexpected_eof(self)),
            }
        }
    }

    /// Reads bytes up to (not including) the first of `delimiters`.
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        let start = self.pos;
        while self.peek().is_some_and(|b| !delimiters.contains(&b)) {
            self.pos += 1;
        }
        Ok(self.input[start..self.pos].iter().map(|&b| b as char).collect())
    }
}

/// Whether [ByteParser::consume_until] also consumes its target.
///
/// # Example
/// ```
/// use stochmap::parser::byte_parser::{ByteParser, ConsumeMode};
///
/// let mut parser = ByteParser::for_str(">tui nectar feeder\nACGT");
/// parser.consume_until(b' ', ConsumeMode::Exclusive);
/// assert_eq!(parser.peek(), Some(b' '));
/// parser.consume_until(b'\n', ConsumeMode::Inclusive);
/// assert_eq!(parser.peek(), Some(b'A'));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConsumeMode {
    Inclusive,
    Exclusive,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParsingErrorType;

    #[test]
    fn test_skips_comments_between_whitespace() {
        let mut parser = ByteParser::for_str("[one] \n[two]\t ['x']\n  (A,B);");
        parser.skip_comment_and_whitespace().unwrap();
        assert_eq!(parser.next_byte(), Some(b'('));
    }

    #[test]
    fn test_unclosed_comment() {
        let mut parser = ByteParser::for_str("  [never closed (A,B);");
        let err = parser.skip_comment_and_whitespace().unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::UnclosedComment);
    }

    #[test]
    fn test_quoted_label_with_doubled_quote() {
        let mut parser = ByteParser::for_str("'Wilson''s Storm-petrel':1.0");
        assert_eq!(parser.parse_label(b",:;()").unwrap(), "Wilson's Storm-petrel");
        assert_eq!(parser.peek(), Some(b':'));
    }

    #[test]
    fn test_unterminated_quoted_label() {
        let mut parser = ByteParser::for_str("'Okarito kiwi");
        let err = parser.parse_label(b",:;()").unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::UnexpectedEOF);
    }

    #[test]
    fn test_consume_until_missing_target_reaches_eof() {
        let mut parser = ByteParser::for_str("no newline here");
        assert!(!parser.consume_until(b'\n', ConsumeMode::Inclusive));
        assert!(parser.is_eof());
        assert_eq!(parser.context(10), "");
    }

    #[test]
    fn test_case_insensitive_match() {
        let mut parser = ByteParser::for_str("begin");
        assert!(parser.consume_if(b'B'));
        assert!(parser.peek_is(b'E'));
        assert_eq!(parser.position(), 1);
    }
}
