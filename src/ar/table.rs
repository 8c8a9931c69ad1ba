//! Assembly of a [ProbaMatrix] from the per-site tables written by
//! reconstruction tools.

use crate::error::MatrixError;
use crate::node_entry::NodeEntry;
use crate::proba_matrix::ProbaMatrix;
use crate::row::Row;
use crate::seq::SeqType;
use std::collections::HashMap;

/// Maps the probability columns of a table header to residue codes.
///
/// # Errors
/// [MatrixError::Malformed] if a column is not a residue of `seq_type` or
/// the columns do not cover the alphabet exactly once.
pub(crate) fn residue_columns<'a>(
    headers: impl Iterator<Item = &'a str>,
    seq_type: SeqType,
    line: usize,
) -> Result<Vec<u8>, MatrixError> {
    let mut codes = Vec::with_capacity(seq_type.alphabet_size());
    for header in headers {
        let residue = header.strip_prefix("p_").unwrap_or(header);
        let code = match residue.as_bytes() {
            [b] => seq_type.residue_code(*b),
            _ => None,
        }
        .ok_or_else(|| MatrixError::Malformed {
            line,
            msg: format!("column {header:?} is not a {seq_type} residue"),
        })?;
        if codes.contains(&code) {
            return Err(MatrixError::Malformed {
                line,
                msg: format!("residue column {header:?} appears twice"),
            });
        }
        codes.push(code);
    }

    if codes.len() != seq_type.alphabet_size() {
        return Err(MatrixError::Malformed {
            line,
            msg: format!(
                "{} residue columns, expected {}",
                codes.len(),
                seq_type.alphabet_size()
            ),
        });
    }
    Ok(codes)
}

/// Collects rows per node, checking that sites come in order.
pub(crate) struct MatrixAccumulator {
    seq_type: SeqType,
    columns: Vec<u8>,
    nodes: Vec<(String, Vec<Row>)>,
    index: HashMap<String, usize>,
}

impl MatrixAccumulator {
    /// Creates an accumulator for tables whose probability columns have the
    /// given residue codes.
    pub(crate) fn new(seq_type: SeqType, columns: Vec<u8>) -> Self {
        Self {
            seq_type,
            columns,
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds the probabilities of `label` at the 1-based `site`.
    ///
    /// # Errors
    /// * [MatrixError::UnorderedSite] if `site` is not the next site of the node
    /// * [MatrixError::Malformed] if the number of probabilities is wrong or
    ///   one of them is not a number
    pub(crate) fn push(
        &mut self,
        label: &str,
        site: usize,
        probabilities: &[&str],
        line: usize,
    ) -> Result<(), MatrixError> {
        if probabilities.len() != self.columns.len() {
            return Err(MatrixError::Malformed {
                line,
                msg: format!(
                    "{} probabilities, expected {}",
                    probabilities.len(),
                    self.columns.len()
                ),
            });
        }

        let mut ordered = vec![0.0; self.columns.len()];
        for (&code, text) in self.columns.iter().zip(probabilities) {
            ordered[usize::from(code)] = text.parse::<f64>().map_err(|_| MatrixError::Malformed {
                line,
                msg: format!("invalid probability {text:?}"),
            })?;
        }

        let i = match self.index.get(label) {
            Some(&i) => i,
            None => {
                self.index.insert(label.to_string(), self.nodes.len());
                self.nodes.push((label.to_string(), Vec::new()));
                self.nodes.len() - 1
            }
        };
        let (_, rows) = &mut self.nodes[i];
        if site != rows.len() + 1 {
            return Err(MatrixError::UnorderedSite {
                label: label.to_string(),
                expected: rows.len() + 1,
                found: site,
            });
        }
        rows.push(Row::from_probabilities(&ordered));
        Ok(())
    }

    /// Finishes assembly; the alignment size is the number of sites of the
    /// first node.
    ///
    /// # Errors
    /// [MatrixError::AlignmentSizeMismatch] if nodes cover different numbers
    /// of sites.
    pub(crate) fn finish(self) -> Result<ProbaMatrix, MatrixError> {
        let alignment_size = self.nodes.first().map_or(0, |(_, rows)| rows.len());
        let mut matrix = ProbaMatrix::new(self.seq_type, alignment_size);
        for (label, rows) in self.nodes {
            matrix.insert(NodeEntry::with_rows(label, self.seq_type, rows))?;
        }
        Ok(matrix)
    }
}

/// Parses a 1-based site number.
pub(crate) fn parse_site(text: &str, line: usize) -> Result<usize, MatrixError> {
    match text.parse::<usize>() {
        Ok(site) if site > 0 => Ok(site),
        _ => Err(MatrixError::Malformed {
            line,
            msg: format!("invalid site {text:?}"),
        }),
    }
}
