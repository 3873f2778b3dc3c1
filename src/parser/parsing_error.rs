//! Errors of the Newick and FASTA readers, located by byte offset.

use crate::parser::byte_parser::ByteParser;
use thiserror::Error;

/// Bytes of input quoted after an error.
const CONTEXT_LENGTH: usize = 50;

/// What went wrong while parsing.
#[derive(PartialEq, Debug, Clone, Error)]
pub enum ParsingErrorType {
    #[error("IO error - {0}")]
    Io(String),
    #[error("Unexpected end of file")]
    UnexpectedEOF,
    #[error("Unclosed comment")]
    UnclosedComment,
    #[error("Invalid newick string: {0}")]
    InvalidNewickString(String),
    #[error("Invalid FASTA format: {0}")]
    InvalidFasta(String),
    #[error("Invalid tree structure")]
    InvalidTreeStructure,
}

/// A [ParsingErrorType] with the offset it occurred at and the input following it.
#[derive(Debug, Error)]
#[error("{kind} at position {position}{}", quote_context(.context))]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    context: String,
}

fn quote_context(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("\n  Context (next {} bytes): {}", context.len(), context)
    }
}

impl ParsingError {
    pub fn at(kind: ParsingErrorType, parser: &ByteParser) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.context(CONTEXT_LENGTH),
        }
    }

    pub fn unexpected_eof(parser: &ByteParser) -> Self {
        Self::at(ParsingErrorType::UnexpectedEOF, parser)
    }

    pub fn unclosed_comment(parser: &ByteParser) -> Self {
        Self::at(ParsingErrorType::UnclosedComment, parser)
    }

    pub fn invalid_newick_string(parser: &ByteParser, msg: impl Into<String>) -> Self {
        Self::at(ParsingErrorType::InvalidNewickString(msg.into()), parser)
    }

    pub fn invalid_fasta(parser: &ByteParser, msg: impl Into<String>) -> Self {
        Self::at(ParsingErrorType::InvalidFasta(msg.into()), parser)
    }

    /// An error about the input as a whole, such as a malformed tree.
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self { kind, position: 0, context: String::new() }
    }

    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        Self::without_context(ParsingErrorType::Io(err.to_string()))
    }
}
