//! Low-level parsing infrastructure.
//!
//! This module provides a byte parser with peeking, comment skipping and
//! label handling, shared by the [Newick](crate::newick) tree parser and the
//! [FASTA](crate::alignment::fasta) alignment reader, plus the error type
//! both report.

pub mod byte_parser;
pub mod parsing_error;

pub use parsing_error::{ParsingError, ParsingErrorType};
