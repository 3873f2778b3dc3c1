use crate::model::{BranchLength, LabelIndex, LeafLabelMap, Tree, VertexIndex};
use crate::newick::defs::{DEFAULT_NUM_LEAVES_GUESS, NEWICK_LABEL_DELIMITERS};
use crate::parser::byte_parser::ByteParser;
use crate::parser::{ParsingError, ParsingErrorType};
use std::collections::HashSet;

/// Parser (configuration) for Newick format (binary) phylogenetic [Tree]s.
///
/// Leaf labels are resolved verbatim into a [LeafLabelMap], which is either
/// created during parsing or supplied upfront (e.g. the taxon list of an
/// alignment, so that tree leaves and alignment rows share label indices).
/// Labels of internal vertices and the root are stored on the vertices.
///
/// # Configuration
/// * `with_num_leaves(num_leaves)` - Can be configured with number of leaves,
///   otherwise it is counted while parsing.
/// * `with_label_map(map)` - Resolve leaf labels against an existing map.
///
/// # Example
/// ```
/// use stochmap::newick::NewickParser;
/// use stochmap::parser::byte_parser::ByteParser;
///
/// let mut byte_parser = ByteParser::for_str("((A:1,B:1)C:2,D:3);");
/// let mut newick_parser = NewickParser::new();
/// let tree = newick_parser.parse_str(&mut byte_parser).unwrap();
/// let labels = newick_parser.into_label_map();
///
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(labels.num_labels(), 3);
/// ```
pub struct NewickParser {
    know_num_leaves: bool,
    num_leaves: usize,
    label_map: Option<LeafLabelMap>,
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NewickParser {
    /// Creates a new `NewickParser` with default settings.
    ///
    /// By default the number of leaves is unknown and counted during parsing,
    /// and a new [LeafLabelMap] is created for the labels.
    pub fn new() -> Self {
        Self {
            know_num_leaves: false,
            num_leaves: DEFAULT_NUM_LEAVES_GUESS,
            label_map: None,
        }
    }

    /// Sets the expected number of leaves in the tree.
    pub fn with_num_leaves(mut self, num_leaves: usize) -> Self {
        self.num_leaves = num_leaves;
        self.know_num_leaves = true;
        self
    }

    /// Resolves leaf labels against (and extends) the given map.
    pub fn with_label_map(mut self, label_map: LeafLabelMap) -> Self {
        if !self.know_num_leaves {
            self.num_leaves = label_map.num_labels().max(DEFAULT_NUM_LEAVES_GUESS);
        }
        self.label_map = Some(label_map);
        self
    }

    /// Consumes the parser and returns the underlying [LeafLabelMap].
    pub fn into_label_map(self) -> LeafLabelMap {
        self.label_map.unwrap_or_default()
    }

    /// Parses a single Newick tree from the given [ByteParser].
    ///
    /// # Errors
    /// Returns [ParsingError] if the Newick string is malformed, not binary,
    /// contains a leaf label twice, or does not describe a valid tree.
    pub fn parse_str(&mut self, parser: &mut ByteParser) -> Result<Tree, ParsingError> {
        let mut state = ParseState {
            tree: Tree::new(self.num_leaves.max(1)),
            labels: self.label_map.take().unwrap_or_else(|| LeafLabelMap::new(self.num_leaves)),
            seen: HashSet::with_capacity(self.num_leaves),
        };

        let result = Self::parse_root(parser, &mut state);
        let ParseState { mut tree, labels, seen } = state;
        self.label_map = Some(labels);
        result?;

        if !self.know_num_leaves {
            self.num_leaves = seen.len();
            self.know_num_leaves = true;
            tree.set_num_leaves_init(seen.len());
        }

        if !tree.is_valid() {
            return Err(ParsingError::without_context(ParsingErrorType::InvalidTreeStructure));
        }

        Ok(tree)
    }

    /// Parses root of tree and adds it to tree:
    /// - `(left, right)[label][:branch_length];`
    fn parse_root(parser: &mut ByteParser, state: &mut ParseState) -> Result<(), ParsingError> {
        parser.skip_comment_and_whitespace()?;

        let children = Self::parse_children(parser, state)?;
        let label = Self::parse_vertex_label(parser)?;
        let branch_length = Self::parse_branch_length(parser)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ';' at end of tree but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }

        let index = state.tree.add_root(children, branch_length);
        if let Some(label) = label {
            state.tree[index].set_label(label);
        }

        Ok(())
    }

    /// Parses a vertex (either internal vertex or leaf) and returns its index.
    fn parse_vertex(parser: &mut ByteParser, state: &mut ParseState) -> Result<VertexIndex, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if parser.peek_is(b'(') {
            Self::parse_internal_vertex(parser, state)
        } else {
            Self::parse_leaf(parser, state)
        }
    }

    /// Parses internal vertex `(left, right)[label][:branch_length]`,
    /// adds it to tree, and returns its index.
    fn parse_internal_vertex(parser: &mut ByteParser, state: &mut ParseState) -> Result<VertexIndex, ParsingError> {
        let children = Self::parse_children(parser, state)?;
        let label = Self::parse_vertex_label(parser)?;
        let branch_length = Self::parse_branch_length(parser)?;

        let index = state.tree.add_internal_vertex(children, branch_length);
        if let Some(label) = label {
            state.tree[index].set_label(label);
        }

        Ok(index)
    }

    /// Parses children pair `(left, right)` and returns their indices.
    ///
    /// Expects parser at opening `(`; a third child is reported as error,
    /// since only binary trees are supported.
    fn parse_children(
        parser: &mut ByteParser,
        state: &mut ParseState,
    ) -> Result<(VertexIndex, VertexIndex), ParsingError> {
        if !parser.consume_if(b'(') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected '(' before children but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }
        let left_index = Self::parse_vertex(parser, state)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b',') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ',' between children but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }
        let right_index = Self::parse_vertex(parser, state)?;

        parser.skip_comment_and_whitespace()?;
        if parser.peek_is(b',') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                "Only binary trees are supported, found vertex with more than two children".to_string(),
            ));
        }
        if !parser.consume_if(b')') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ')' after children but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }

        Ok((left_index, right_index))
    }

    /// Parses leaf `label[:branch_length]` and adds it to tree.
    fn parse_leaf(parser: &mut ByteParser, state: &mut ParseState) -> Result<VertexIndex, ParsingError> {
        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        if label.is_empty() {
            return Err(ParsingError::invalid_newick_string(parser, "Leaf without label".to_string()));
        }

        let label_index: LabelIndex = state.labels.get_or_insert(&label);
        if !state.seen.insert(label_index) {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Leaf label {label} occurs more than once"),
            ));
        }

        let branch_length = Self::parse_branch_length(parser)?;
        Ok(state.tree.add_leaf(branch_length, label_index))
    }

    /// Parses optional label directly following the closing `)` of a vertex.
    fn parse_vertex_label(parser: &mut ByteParser) -> Result<Option<String>, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        match parser.peek() {
            Some(b) if !NEWICK_LABEL_DELIMITERS.contains(&b) => {
                let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
                Ok((!label.is_empty()).then_some(label))
            }
            _ => Ok(None),
        }
    }

    /// Parses optional branch length `[:number]`:
    /// - Skips comments/whitespace before and after `:`
    /// - Supports scientific notation (e.g., `1.5e-10`)
    fn parse_branch_length(parser: &mut ByteParser) -> Result<Option<BranchLength>, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b':') {
            return Ok(None);
        }
        parser.skip_comment_and_whitespace()?;

        let mut branch_length_str = String::new();
        while let Some(b) = parser.peek() {
            // Valid characters for a float: digits, '.', '-', '+', 'e', 'E'
            if b.is_ascii_digit() || b == b'.' || b == b'-' || b == b'+' || b == b'e' || b == b'E' {
                branch_length_str.push(b as char);
                parser.next_byte();
            } else {
                break;
            }
        }

        let value: f64 = branch_length_str.parse().map_err(|_| {
            ParsingError::invalid_newick_string(parser, format!("Invalid branch length: {}", branch_length_str))
        })?;
        BranchLength::try_new(value).map(Some).ok_or_else(|| {
            ParsingError::invalid_newick_string(parser, format!("Branch length must be non-negative and finite: {}", value))
        })
    }
}

/// Tree under construction, together with label bookkeeping.
struct ParseState {
    tree: Tree,
    labels: LeafLabelMap,
    seen: HashSet<LabelIndex>,
}
