//! RAxML-NG backend.
//!
//! Outputs are named after the `--prefix` given to RAxML-NG, here the
//! alignment file stem inside the output directory:
//! * `<prefix>.raxml.ancestralProbs` - a `Node Site State p_A p_C ...`
//!   header and one line per node and site
//! * `<prefix>.raxml.ancestralTree` - the tree with internal node labels

use crate::ar::ArParameters;
use crate::ar::table::{MatrixAccumulator, parse_site, residue_columns};
use crate::error::{ArError, MatrixError};
use crate::proba_matrix::ProbaMatrix;
use crate::seq::SeqType;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::Command;

const PROBS_SUFFIX: &str = ".raxml.ancestralProbs";
const TREE_SUFFIX: &str = ".raxml.ancestralTree";

/// Prefix of the output files.
pub(crate) fn prefix(params: &ArParameters) -> PathBuf {
    let stem = params
        .alignment_file
        .file_stem()
        .map_or_else(|| "alignment".into(), |stem| stem.to_os_string());
    params.output_dir.join(stem)
}

fn with_suffix(params: &ArParameters, suffix: &str) -> PathBuf {
    let mut path = prefix(params).into_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

/// Returns the paths of the probability table and the tree.
pub(crate) fn output_files(params: &ArParameters) -> (PathBuf, PathBuf) {
    (with_suffix(params, PROBS_SUFFIX), with_suffix(params, TREE_SUFFIX))
}

/// # Errors
/// [ArError::UnknownModel] if RAxML-NG does not implement the model.
pub(crate) fn command(params: &ArParameters) -> Result<Command, ArError> {
    let mut cmd = Command::new(&params.binary);
    cmd.arg("--ancestral")
        .arg("--msa")
        .arg(&params.alignment_file)
        .arg("--tree")
        .arg(&params.tree_file)
        .arg("--prefix")
        .arg(prefix(params))
        .args(["--threads", "1", "--redo"]);

    if params.extra_args.is_empty() {
        let model = params
            .model
            .raxml_name()
            .ok_or_else(|| ArError::UnknownModel(params.model.to_string()))?;
        cmd.arg("--model").arg(format!(
            "{model}+G{}{{{}}}",
            params.categories, params.alpha
        ));
    } else {
        cmd.args(&params.extra_args);
    }
    Ok(cmd)
}

/// Reads a `.raxml.ancestralProbs` table.
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
            let ["Node", "Site", "State", residues @ ..] = fields.as_slice() else {
                return Err(MatrixError::Malformed {
                    line: line_number,
                    msg: "expected 'Node Site State' header".to_string(),
                });
            };
            let columns = residue_columns(residues.iter().copied(), seq_type, line_number)?;
            accumulator = Some(MatrixAccumulator::new(seq_type, columns));
            continue;
        };

        let [node, site, _state, probabilities @ ..] = fields.as_slice() else {
            return Err(MatrixError::Malformed {
                line: line_number,
                msg: format!("expected node, site, state and probabilities, found {line:?}"),
            });
        };
        let site = parse_site(site, line_number)?;
        acc.push(node, site, probabilities, line_number)?;
    }

    accumulator
        .ok_or(MatrixError::Malformed {
            line: 0,
            msg: "empty probability table".to_string(),
        })?
        .finish()
}
