//! Ancestral reconstruction (AR) by external tools.
//!
//! The extended tree and the reference alignment are handed to PhyML or
//! RAxML-NG, which compute the posterior distribution of the residues at
//! every internal node and alignment column. This module builds their
//! command lines, runs them, and reads what they write back into a
//! [ProbaMatrix] and a [PhyloTree]; [map_nodes] then links the nodes of the
//! returned tree to the extended tree.
//!
//! # Example
//! ```no_run
//! use xpas::ar::{ArModel, ArParameters, Reconstruction};
//!
//! let params = ArParameters::new("phyml", "tree_ext.nwk", "align.phy", "ar")
//!     .with_model(ArModel::Gtr)
//!     .with_alpha(0.5);
//! let reconstruction = Reconstruction::detect(params)?;
//! let (matrix, ar_tree) = reconstruction.run()?;
//! # Ok::<(), xpas::error::ArError>(())
//! ```

mod mapping;
mod model;
pub mod phyml;
pub mod raxml;
mod table;

pub use mapping::{LabelMapping, map_nodes};
pub use model::ArModel;

use crate::error::ArError;
use crate::model::PhyloTree;
use crate::newick;
use crate::proba_matrix::ProbaMatrix;
use crate::seq::SeqType;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Default gamma shape parameter.
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Default number of rate categories.
pub const DEFAULT_CATEGORIES: u32 = 4;

// =#========================================================================#=
// PARAMETERS
// =#========================================================================#=
/// Parameters of a reconstruction run.
///
/// Non-empty `extra_args` replace the model, alpha and categories
/// arguments of the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ArParameters {
    pub binary: PathBuf,
    pub tree_file: PathBuf,
    pub alignment_file: PathBuf,
    pub output_dir: PathBuf,
    pub model: ArModel,
    pub alpha: f64,
    pub categories: u32,
    pub extra_args: Vec<String>,
}

impl ArParameters {
    /// Creates parameters with the GTR model and default rates.
    pub fn new(
        binary: impl Into<PathBuf>,
        tree_file: impl Into<PathBuf>,
        alignment_file: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            binary: binary.into(),
            tree_file: tree_file.into(),
            alignment_file: alignment_file.into(),
            output_dir: output_dir.into(),
            model: ArModel::Gtr,
            alpha: DEFAULT_ALPHA,
            categories: DEFAULT_CATEGORIES,
            extra_args: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: ArModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_categories(mut self, categories: u32) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Returns the kind of sequences of the model.
    pub fn seq_type(&self) -> SeqType {
        self.model.seq_type()
    }
}

// =#========================================================================#=
// RECONSTRUCTION
// =#========================================================================#=
/// A reconstruction by one of the supported tools.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconstruction {
    Phyml(ArParameters),
    RaxmlNg(ArParameters),
}

impl Reconstruction {
    /// Picks the tool from the file name of the binary.
    ///
    /// # Errors
    /// [ArError::UnknownSoftware] if the name contains neither `phyml` nor
    /// `raxml`.
    pub fn detect(params: ArParameters) -> Result<Self, ArError> {
        let name = params
            .binary
            .file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.contains("phyml") {
            Ok(Reconstruction::Phyml(params))
        } else if name.contains("raxml") {
            Ok(Reconstruction::RaxmlNg(params))
        } else {
            Err(ArError::UnknownSoftware(params.binary.display().to_string()))
        }
    }

    pub fn parameters(&self) -> &ArParameters {
        match self {
            Reconstruction::Phyml(params) | Reconstruction::RaxmlNg(params) => params,
        }
    }

    pub fn software(&self) -> &'static str {
        match self {
            Reconstruction::Phyml(_) => "PhyML",
            Reconstruction::RaxmlNg(_) => "RAxML-NG",
        }
    }

    /// Returns the paths of the probability table and the tree the tool
    /// writes.
    pub fn output_files(&self) -> (PathBuf, PathBuf) {
        match self {
            Reconstruction::Phyml(params) => phyml::output_files(params),
            Reconstruction::RaxmlNg(params) => raxml::output_files(params),
        }
    }

    /// Builds the command line of the tool.
    ///
    /// # Errors
    /// [ArError::UnknownModel] if the tool does not implement the model.
    pub fn command(&self) -> Result<Command, ArError> {
        match self {
            Reconstruction::Phyml(params) => Ok(phyml::command(params)),
            Reconstruction::RaxmlNg(params) => raxml::command(params),
        }
    }

    /// Runs the tool and reads its outputs.
    ///
    /// # Errors
    /// * [ArError::Io] if the tool can not be started or files are missing
    /// * [ArError::Failed] if the tool exits unsuccessfully
    /// * Parsing errors of [read_outputs](Self::read_outputs)
    pub fn run(&self) -> Result<(ProbaMatrix, PhyloTree), ArError> {
        let params = self.parameters();
        fs::create_dir_all(&params.output_dir)?;
        if let Reconstruction::Phyml(params) = self {
            let copy = phyml::alignment_copy(params);
            if copy != params.alignment_file {
                fs::copy(&params.alignment_file, &copy)?;
            }
        }

        let mut cmd = self.command()?;
        info!(software = self.software(), command = ?cmd, "running ancestral reconstruction");
        let status = cmd.status()?;
        if !status.success() {
            return Err(ArError::Failed {
                binary: params.binary.display().to_string(),
                status: status.to_string(),
            });
        }
        debug!(software = self.software(), %status, "ancestral reconstruction finished");

        self.read_outputs()
    }

    /// Reads the outputs of a previous run of the tool.
    ///
    /// # Errors
    /// I/O, matrix or Newick errors.
    pub fn read_outputs(&self) -> Result<(ProbaMatrix, PhyloTree), ArError> {
        let (matrix_file, tree_file) = self.output_files();
        let seq_type = self.parameters().seq_type();

        let reader = BufReader::new(File::open(&matrix_file)?);
        let matrix = match self {
            Reconstruction::Phyml(_) => phyml::read_matrix(reader, seq_type)?,
            Reconstruction::RaxmlNg(_) => raxml::read_matrix(reader, seq_type)?,
        };
        let tree = newick::parse_file(&tree_file)?;

        info!(
            software = self.software(),
            nodes = matrix.len(),
            alignment_size = matrix.alignment_size(),
            tree_nodes = tree.node_count(),
            "read ancestral reconstruction"
        );
        Ok((matrix, tree))
    }
}
