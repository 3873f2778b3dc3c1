//! Newick format parser for rooted binary phylogenetic trees.
//!
//! This module provides [`NewickParser`] to parse Newick format strings
//! into [`Tree`]s whose leaves reference a [`LeafLabelMap`].
//!
//! # Quick API
//! * [`parse_str`] - parses a single string, returns tree and label map
//! * [`parse_file`] - parses the first tree of a file
//! * [`parse_str_with_taxa`] - parses a tree against an existing taxon list
//!
//! # Format
//! The supported Newick grammar:
//! * `tree ::= vertex ';'`
//! * `vertex ::= leaf | internal_vertex`
//! * `internal_vertex ::= '(' vertex ',' vertex ')' [label] [branch_length]`
//! * `leaf ::= label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! Furthermore:
//! * Whitespace can occur between elements,
//!   just not within an unquoted label or a branch_length
//! * Labels may be quoted with single quotes (`'Wilson''s Storm-petrel'`)
//! * Comments are square brackets and can occur anywhere where whitespace
//!   is allowed; extended Newick annotations (`[&rate=0.5]`) are skipped as comments

mod defs;
mod parser;

pub use self::parser::NewickParser;

use crate::model::{LeafLabelMap, Tree};
use crate::parser::ParsingError;
use crate::parser::byte_parser::ByteParser;
use std::path::Path;

/// Parses a single Newick string, returning the tree and its leaf labels.
///
/// # Example
/// ```
/// use stochmap::newick::parse_str;
///
/// let (tree, labels) = parse_str("((A:1,B:1)C:2,((D:1,E:1)F:1,G:2)H:1):1;").unwrap();
/// assert_eq!(tree.num_leaves(), 5);
/// assert!(labels.contains_label("G"));
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<(Tree, LeafLabelMap), ParsingError> {
    let mut newick_parser = NewickParser::new();
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    let tree = newick_parser.parse_str(&mut byte_parser)?;
    Ok((tree, newick_parser.into_label_map()))
}

/// Parses a single Newick string, resolving leaf labels against `taxa`.
///
/// Labels not yet in `taxa` are appended to the returned map.
pub fn parse_str_with_taxa<S: AsRef<str>>(newick: S, taxa: LeafLabelMap) -> Result<(Tree, LeafLabelMap), ParsingError> {
    let mut newick_parser = NewickParser::new().with_label_map(taxa);
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    let tree = newick_parser.parse_str(&mut byte_parser)?;
    Ok((tree, newick_parser.into_label_map()))
}

/// Parses the first Newick tree of a file.
///
/// # Errors
/// [`ParsingError`] if file reading fails or the Newick format is invalid.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<(Tree, LeafLabelMap), ParsingError> {
    let contents = std::fs::read(path)?;
    let mut newick_parser = NewickParser::new();
    let mut byte_parser = ByteParser::new(contents);
    let tree = newick_parser.parse_str(&mut byte_parser)?;
    Ok((tree, newick_parser.into_label_map()))
}
