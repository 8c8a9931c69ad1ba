//! Recursive-descent Newick parser producing [PhyloTree]s.

use crate::model::{NodeId, PhyloTree, TreeBuilder};
use crate::newick::defs::{DEFAULT_NUM_NODES_GUESS, NEWICK_LABEL_DELIMITERS};
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;

/// Parser (configuration) for Newick strings of rooted n-ary trees.
///
/// Supports parsing single or multiple Newick trees from a [ByteParser].
///
/// # Configuration
/// * `with_num_nodes(num_nodes)` - Expected number of nodes per tree, used
///   to pre-allocate the arena. Otherwise inferred from the first parsed
///   tree and then kept.
///
/// # Format
/// * `tree ::= node ';'`
/// * `node ::= [ '(' node { ',' node } ')' ] [label] [':' number]`
///
/// Furthermore:
/// * Internal nodes and leaves may both be labelled; a missing label is
///   the empty string
/// * A missing branch length is `0.0`
/// * Labels may be quoted (`'Wilson''s Phalarope'`)
/// * Whitespace and `[...]` comments can occur between elements
///
/// # Example
/// ```
/// use xpas::newick::NewickParser;
/// use xpas::parser::ByteParser;
///
/// let mut byte_parser = ByteParser::for_str("((A:1,B:1)AB:0.5,C:1.5,D:2);");
/// let tree = NewickParser::new().parse_str(&mut byte_parser).unwrap();
/// assert_eq!(tree.node_count(), 6);
/// assert!(!tree.is_rooted());
/// ```
#[derive(Debug, Clone)]
pub struct NewickParser {
    know_num_nodes: bool,
    num_nodes: usize,
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NewickParser {
    /// Creates a new `NewickParser` that counts nodes of the first tree.
    pub fn new() -> Self {
        Self {
            know_num_nodes: false,
            num_nodes: DEFAULT_NUM_NODES_GUESS,
        }
    }

    /// Sets the expected number of nodes of the trees to parse.
    pub fn with_num_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = num_nodes;
        self.know_num_nodes = true;
        self
    }

    /// Parses a single Newick tree from the given [ByteParser].
    ///
    /// # Arguments
    /// * `parser` - The byte parser positioned at the start of a Newick string
    ///
    /// # Returns
    /// * `Ok(PhyloTree)` - The parsed, indexed tree
    /// * `Err(ParsingError)` - If the Newick format is invalid
    pub fn parse_str<S: ByteSource>(
        &mut self,
        parser: &mut ByteParser<S>,
    ) -> Result<PhyloTree, ParsingError> {
        let mut builder = TreeBuilder::with_capacity(self.num_nodes);

        parser.skip_comment_and_whitespace()?;
        let root = self.parse_node(parser, &mut builder)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            return Err(expected(parser, "';' at end of tree"));
        }

        if !self.know_num_nodes {
            self.num_nodes = builder.num_nodes();
            self.know_num_nodes = true;
        }

        builder
            .build(root)
            .map_err(|err| ParsingError::invalid_tree_structure(parser, err))
    }

    /// Parses all Newick trees until EOF.
    ///
    /// # Errors
    /// Returns the first [ParsingError] encountered.
    pub fn parse_all<S: ByteSource>(
        &mut self,
        mut parser: ByteParser<S>,
    ) -> Result<Vec<PhyloTree>, ParsingError> {
        let mut trees = Vec::new();
        loop {
            parser.skip_comment_and_whitespace()?;
            if parser.is_eof() {
                break;
            }
            trees.push(self.parse_str(&mut parser)?);
        }
        Ok(trees)
    }

    /// Parses a node with its subtree and returns its index:
    /// - `[(children)][label][:branch_length]`
    /// - Children are added detached first and attached once the
    ///   label and branch length of their parent are known
    fn parse_node<S: ByteSource>(
        &mut self,
        parser: &mut ByteParser<S>,
        builder: &mut TreeBuilder,
    ) -> Result<NodeId, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        let children = if parser.consume_if(b'(') {
            self.parse_children(parser, builder)?
        } else {
            Vec::new()
        };

        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        let branch_length = self.parse_branch_length(parser)?.unwrap_or(0.0);

        let id = builder.add_node(label, branch_length);
        for child in children {
            builder
                .attach(id, child)
                .map_err(|err| ParsingError::invalid_tree_structure(parser, err))?;
        }

        Ok(id)
    }

    /// Parses a comma-separated list of nodes up to and including the
    /// closing `)`; expects the opening `(` to be consumed.
    fn parse_children<S: ByteSource>(
        &mut self,
        parser: &mut ByteParser<S>,
        builder: &mut TreeBuilder,
    ) -> Result<Vec<NodeId>, ParsingError> {
        let mut children = Vec::new();
        loop {
            children.push(self.parse_node(parser, builder)?);

            parser.skip_comment_and_whitespace()?;
            if parser.consume_if(b',') {
                continue;
            }
            if parser.consume_if(b')') {
                return Ok(children);
            }
            return Err(expected(parser, "',' or ')' after child"));
        }
    }

    /// Parses optional branch length `[:number]`:
    /// - Skips comments/whitespace before and after `:`
    /// - Supports scientific notation (e.g., `1.5e-10`)
    ///
    /// # Returns
    /// - `Some(length)` if found a branch length and was able to parse it
    /// - `None` if found no branch length
    /// - [ParsingError] if it couldn't parse the branch length value
    fn parse_branch_length<S: ByteSource>(
        &mut self,
        parser: &mut ByteParser<S>,
    ) -> Result<Option<f64>, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b':') {
            return Ok(None);
        }
        parser.skip_comment_and_whitespace()?;

        parser.parse_number().map(Some).map_err(|text| {
            ParsingError::invalid_newick_string(parser, format!("Invalid branch length: {text:?}"))
        })
    }
}

/// Error for an unexpected byte (or EOF) where `what` was expected.
fn expected<S: ByteSource>(parser: &ByteParser<S>, what: &str) -> ParsingError {
    match parser.peek() {
        None => ParsingError::unexpected_eof(parser),
        Some(b) => ParsingError::invalid_newick_string(
            parser,
            format!("Expected {what} but found {:?}", char::from(b)),
        ),
    }
}
