//! Alignments of discrete characters and their compression into site patterns.
//!
//! * [DataType] - how symbols map to state codes, and sampled states back to text
//! * [Alignment] - one encoded sequence per taxon, all of the same length
//! * [SitePatterns] - unique alignment columns with weights and exclusions
//! * [fasta] - reading alignments from FASTA files

pub mod alignment;
pub mod datatype;
pub mod fasta;
pub mod patterns;

pub use alignment::Alignment;
pub use datatype::{DataType, FixedAlphabet, SiteState, StateDecoder, UserDataType};
pub use patterns::SitePatterns;

use crate::parser::ParsingError;
use thiserror::Error;

/// Errors raised while building alignments and site patterns.
#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("Symbol '{symbol}' is not part of the {data_type} data type")]
    UnknownSymbol { symbol: String, data_type: String },
    #[error("Invalid data type: {0}")]
    InvalidDataType(String),
    #[error("Taxon {0} occurs more than once in the alignment")]
    DuplicateTaxon(String),
    #[error("Sequence of {taxon} has {found} sites, expected {expected}")]
    RaggedSequence { taxon: String, expected: usize, found: usize },
    #[error("Alignment contains no sequences")]
    Empty,
    #[error("Invalid exclusion range [{from}, {to}) for {site_count} sites")]
    InvalidExclusion { from: usize, to: usize, site_count: usize },
    #[error(transparent)]
    Parsing(#[from] ParsingError),
}
