//! PhyML backend.
//!
//! PhyML writes its outputs next to the alignment it reads, so the
//! alignment is run from a copy in the output directory:
//! * `<aln>_phyml_ancestral_states.txt` - a free-text preamble, then a
//!   `Site NodeLabel A C G T` header and one line per site and node
//! * `<aln>_phyml_ancestral_tree.txt` - the tree with internal node labels

use crate::ar::ArParameters;
use crate::ar::table::{MatrixAccumulator, parse_site, residue_columns};
use crate::error::MatrixError;
use crate::proba_matrix::ProbaMatrix;
use crate::seq::SeqType;
use std::ffi::OsString;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::Command;

const STATES_SUFFIX: &str = "_phyml_ancestral_states.txt";
const TREE_SUFFIX: &str = "_phyml_ancestral_tree.txt";

/// Path of the alignment copy PhyML runs on.
pub(crate) fn alignment_copy(params: &ArParameters) -> PathBuf {
    let name = params
        .alignment_file
        .file_name()
        .map_or_else(|| OsString::from("alignment"), OsString::from);
    params.output_dir.join(name)
}

fn with_suffix(params: &ArParameters, suffix: &str) -> PathBuf {
    let mut path = alignment_copy(params).into_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

/// Returns the paths of the probability table and the tree.
pub(crate) fn output_files(params: &ArParameters) -> (PathBuf, PathBuf) {
    (with_suffix(params, STATES_SUFFIX), with_suffix(params, TREE_SUFFIX))
}

pub(crate) fn command(params: &ArParameters) -> Command {
    let mut cmd = Command::new(&params.binary);
    cmd.arg("--ancestral")
        .arg("--no_memory_check")
        .arg("--leave_duplicates")
        .arg("-i")
        .arg(alignment_copy(params))
        .arg("-u")
        .arg(&params.tree_file)
        .arg("-d")
        .arg(match params.model.seq_type() {
            SeqType::Dna => "nt",
            SeqType::Protein => "aa",
        });

    if params.extra_args.is_empty() {
        cmd.arg("-m")
            .arg(params.model.phyml_name())
            .arg("-c")
            .arg(params.categories.to_string())
            .arg("-a")
            .arg(params.alpha.to_string())
            // keep the given topology and branch lengths
            .args(["-b", "0", "-v", "0.0", "-o", "r"]);
    } else {
        cmd.args(&params.extra_args);
    }
    cmd
}

/// Reads a `_phyml_ancestral_states.txt` table.
///
/// # Errors
/// [MatrixError] if the header is missing or a line is malformed.
pub fn read_matrix<R: BufRead>(reader: R, seq_type: SeqType) -> Result<ProbaMatrix, MatrixError> {
    let mut accumulator: Option<MatrixAccumulator> = None;

    for (i, line) in reader.lines().enumerate() {
        let line_number = i + 1;
        let line = line.map_err(|err| MatrixError::Malformed {
            line: line_number,
            msg: err.to_string(),
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.is_empty() {
            continue;
        }

        let Some(acc) = accumulator.as_mut() else {
            // preamble until the header
            if let ["Site", _node, residues @ ..] = fields.as_slice() {
                let columns = residue_columns(residues.iter().copied(), seq_type, line_number)?;
                accumulator = Some(MatrixAccumulator::new(seq_type, columns));
            }
            continue;
        };

        let [site, node, probabilities @ ..] = fields.as_slice() else {
            return Err(MatrixError::Malformed {
                line: line_number,
                msg: format!("expected site, node and probabilities, found {line:?}"),
            });
        };
        let site = parse_site(site, line_number)?;
        acc.push(node, site, probabilities, line_number)?;
    }

    accumulator
        .ok_or(MatrixError::Malformed {
            line: 0,
            msg: "missing 'Site NodeLabel' header".to_string(),
        })?
        .finish()
}
