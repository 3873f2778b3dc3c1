//! FASTA reader for alignments.
//!
//! Records start with a header line `>label [description]`, followed by any
//! number of sequence lines. Only the first word of the header is used as
//! taxon label. Blank lines are ignored.

use crate::alignment::{Alignment, AlignmentError, DataType};
use crate::parser::ParsingError;
use crate::parser::byte_parser::{ByteParser, ConsumeMode};
use std::path::Path;
use tracing::info;

/// Reads an alignment of `data_type` from a FASTA string.
///
/// # Example
/// ```
/// use stochmap::alignment::{DataType, fasta};
///
/// let alignment = fasta::parse_str(">kiwi\nACGT\n>kea\nAC\nGA\n", DataType::Nucleotide).unwrap();
/// assert_eq!(alignment.taxon_count(), 2);
/// assert_eq!(alignment.sequence(1), &[0, 1, 2, 0]);
/// ```
pub fn parse_str(input: &str, data_type: DataType) -> Result<Alignment, AlignmentError> {
    let mut parser = ByteParser::for_str(input);
    let records = parse_records(&mut parser)?;
    Alignment::from_sequences(data_type, records)
}

/// Reads an alignment of `data_type` from a FASTA file.
pub fn parse_file<P: AsRef<Path>>(path: P, data_type: DataType) -> Result<Alignment, AlignmentError> {
    let contents = std::fs::read(path.as_ref()).map_err(ParsingError::from)?;
    let mut parser = ByteParser::new(contents);
    let records = parse_records(&mut parser)?;
    let alignment = Alignment::from_sequences(data_type, records)?;
    info!(
        path = %path.as_ref().display(),
        taxa = alignment.taxon_count(),
        sites = alignment.site_count(),
        "read alignment"
    );
    Ok(alignment)
}

/// Parses all `(label, sequence)` records.
pub fn parse_records(parser: &mut ByteParser) -> Result<Vec<(String, String)>, ParsingError> {
    let mut records = Vec::new();
    parser.skip_whitespace();

    while !parser.is_eof() {
        if !parser.consume_if(b'>') {
            return Err(ParsingError::invalid_fasta(
                parser,
                format!("Expected '>' at start of record but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }
        let label = parser.parse_unquoted_label(b" \t\r\n")?;
        if label.is_empty() {
            return Err(ParsingError::invalid_fasta(parser, "Record without label".to_string()));
        }
        // rest of header line is description
        parser.consume_until(b'\n', ConsumeMode::Inclusive);

        let mut sequence = String::new();
        while let Some(b) = parser.peek() {
            if b == b'>' {
                break;
            }
            let line = parser.parse_unquoted_label(b"\n")?;
            sequence.push_str(line.trim());
            parser.consume_if(b'\n');
        }
        records.push((label, sequence));
        parser.skip_whitespace();
    }

    Ok(records)
}
