//! Substitution models understood by the reconstruction tools.

use crate::error::ArError;
use crate::seq::SeqType;
use std::fmt;
use std::str::FromStr;

/// Evolutionary model of an ancestral reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArModel {
    Jc69,
    K80,
    F81,
    F84,
    Hky85,
    Tn93,
    Gtr,
    Lg,
    Wag,
    Jtt,
    Dayhoff,
    DcMut,
    CpRev,
    MtMam,
    MtRev,
    MtArt,
}

impl ArModel {
    pub const ALL: [ArModel; 16] = [
        ArModel::Jc69,
        ArModel::K80,
        ArModel::F81,
        ArModel::F84,
        ArModel::Hky85,
        ArModel::Tn93,
        ArModel::Gtr,
        ArModel::Lg,
        ArModel::Wag,
        ArModel::Jtt,
        ArModel::Dayhoff,
        ArModel::DcMut,
        ArModel::CpRev,
        ArModel::MtMam,
        ArModel::MtRev,
        ArModel::MtArt,
    ];

    /// Returns the kind of sequences the model applies to.
    pub const fn seq_type(self) -> SeqType {
        match self {
            ArModel::Jc69
            | ArModel::K80
            | ArModel::F81
            | ArModel::F84
            | ArModel::Hky85
            | ArModel::Tn93
            | ArModel::Gtr => SeqType::Dna,
            _ => SeqType::Protein,
        }
    }

    /// Returns the name PhyML expects after `-m`.
    pub const fn phyml_name(self) -> &'static str {
        match self {
            ArModel::Jc69 => "JC69",
            ArModel::K80 => "K80",
            ArModel::F81 => "F81",
            ArModel::F84 => "F84",
            ArModel::Hky85 => "HKY85",
            ArModel::Tn93 => "TN93",
            ArModel::Gtr => "GTR",
            ArModel::Lg => "LG",
            ArModel::Wag => "WAG",
            ArModel::Jtt => "JTT",
            ArModel::Dayhoff => "Dayhoff",
            ArModel::DcMut => "DCMut",
            ArModel::CpRev => "CpREV",
            ArModel::MtMam => "MtMam",
            ArModel::MtRev => "MtREV",
            ArModel::MtArt => "MtArt",
        }
    }

    /// Returns the name RAxML-NG expects in `--model`, `None` for models it
    /// does not implement.
    pub const fn raxml_name(self) -> Option<&'static str> {
        match self {
            ArModel::Jc69 => Some("JC"),
            ArModel::K80 => Some("K80"),
            ArModel::F81 => Some("F81"),
            ArModel::F84 => None,
            ArModel::Hky85 => Some("HKY"),
            ArModel::Tn93 => Some("TN93"),
            ArModel::Gtr => Some("GTR"),
            ArModel::Lg => Some("LG"),
            ArModel::Wag => Some("WAG"),
            ArModel::Jtt => Some("JTT"),
            ArModel::Dayhoff => Some("Dayhoff"),
            ArModel::DcMut => Some("DCMut"),
            ArModel::CpRev => Some("cpREV"),
            ArModel::MtMam => Some("mtMAM"),
            ArModel::MtRev => Some("mtREV"),
            ArModel::MtArt => Some("mtART"),
        }
    }
}

impl fmt::Display for ArModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phyml_name())
    }
}

impl FromStr for ArModel {
    type Err = ArError;

    /// Parses PhyML or RAxML-NG names, ignoring case (`mMtREV` is accepted
    /// for [ArModel::MtRev]).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_lowercase();
        if name == "mmtrev" {
            return Ok(ArModel::MtRev);
        }
        ArModel::ALL
            .into_iter()
            .find(|model| {
                model.phyml_name().eq_ignore_ascii_case(&name)
                    || model.raxml_name().is_some_and(|r| r.eq_ignore_ascii_case(&name))
            })
            .ok_or_else(|| ArError::UnknownModel(s.to_string()))
    }
}
