//! Label escaping for the Newick format.
//!
//! Labels containing whitespace or Newick punctuation are wrapped in single
//! quotes when written, with internal single quotes doubled. Reading reverses
//! this in [ByteParser::parse_quoted_label](crate::parser::ByteParser::parse_quoted_label).
//! Underscores are kept verbatim in both directions, since reconstruction
//! tools and ghost nodes use them inside labels.

/// Characters that require a label to be quoted.
const SPECIAL_CHARACTERS: &[char] = &[
    ' ', ',', ';', '\t', '\n', '\r', '(', ')', ':', '[', ']', '\'',
];

/// Checks whether a label must be quoted to be written in Newick format.
///
/// # Examples
/// ```
/// # use xpas::parser::utils::needs_quotes;
/// assert!(!needs_quotes("Pukeko"));
/// assert!(!needs_quotes("12_X0"));
/// assert!(needs_quotes("Pu[ke]ko"));
/// assert!(needs_quotes("Australasian Swamphen"));
/// ```
pub fn needs_quotes(label: &str) -> bool {
    label.contains(SPECIAL_CHARACTERS)
}

/// Escapes a label for use in a Newick string.
///
/// # Examples
/// ```
/// # use xpas::parser::utils::escape_label;
/// assert_eq!(escape_label("Pukeko"), "Pukeko");
/// assert_eq!(escape_label("Pu[ke]ko"), "'Pu[ke]ko'");
/// assert_eq!(escape_label("Australasian Swamphen"), "'Australasian Swamphen'");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    if needs_quotes(label) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
