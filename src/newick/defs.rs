//! Byte constants of the Newick format.

/// Newick label delimiters: parentheses, comma, colon, semicolon, comments,
/// whitespace
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b"([,:; \n\t\r)]";

/// Default guess for number of nodes, when unknown
pub(crate) const DEFAULT_NUM_NODES_GUESS: usize = 32;

/// Guess of characters per node of a written Newick string
/// (label, branch length and punctuation)
pub(crate) const CHARS_PER_NODE_GUESS: usize = 24;
