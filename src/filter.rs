//! Filtering of phylo-k-mers by how well they discriminate branches.
//!
//! After generation, each key of the database gets a filter value computed
//! from its scores on all branches (a branch the key was not generated on
//! counts with the omega threshold score). Keys are ranked by value, higher
//! meaning more informative, and only the best fraction `mu` is kept.
//!
//! # Example
//! ```
//! use xpas::filter::{FilterConfig, FilterKind};
//!
//! let config = FilterConfig::new(FilterKind::Entropy).with_mu(0.5);
//! assert!(config.validate().is_ok());
//! assert_eq!("log-sd".parse::<FilterKind>().unwrap(), FilterKind::LogStdDeviation);
//! ```

use crate::db::PhyloKmerDb;
use crate::error::BuildError;
use crate::phylo_kmer::{Key, Score};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Default fraction of keys kept by a score filter.
pub const DEFAULT_MU: f64 = 0.8;

// =#========================================================================#=
// FILTER KIND
// =#========================================================================#=
/// The recognized filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterKind {
    /// Keep everything
    #[default]
    None,
    /// Negated Shannon entropy of the normalized probabilities
    Entropy,
    /// Max minus mean of the probabilities
    MaxDeviation,
    /// Max minus mean of the log scores
    LogMaxDeviation,
    /// Max minus second max of the probabilities
    MaxDifference,
    /// Max minus second max of the log scores
    LogMaxDifference,
    /// Population standard deviation of the probabilities
    StdDeviation,
    /// Population standard deviation of the log scores
    LogStdDeviation,
    /// Uniform random values from a seeded generator
    Random,
    /// No score filtering; node entries of the same branch are merged
    /// without a warning
    MergeBranches,
}

impl FilterKind {
    /// All kinds, in declaration order.
    pub const ALL: [FilterKind; 10] = [
        FilterKind::None,
        FilterKind::Entropy,
        FilterKind::MaxDeviation,
        FilterKind::LogMaxDeviation,
        FilterKind::MaxDifference,
        FilterKind::LogMaxDifference,
        FilterKind::StdDeviation,
        FilterKind::LogStdDeviation,
        FilterKind::Random,
        FilterKind::MergeBranches,
    ];

    /// Returns the command-line name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            FilterKind::None => "no-filter",
            FilterKind::Entropy => "entropy",
            FilterKind::MaxDeviation => "max-deviation",
            FilterKind::LogMaxDeviation => "log-max-deviation",
            FilterKind::MaxDifference => "max-difference",
            FilterKind::LogMaxDifference => "log-max-difference",
            FilterKind::StdDeviation => "sd",
            FilterKind::LogStdDeviation => "log-sd",
            FilterKind::Random => "random",
            FilterKind::MergeBranches => "merge-branches",
        }
    }

    /// Returns whether this kind removes keys from the database.
    pub const fn is_score_filter(self) -> bool {
        !matches!(self, FilterKind::None | FilterKind::MergeBranches)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(FilterKind::None),
            "std-deviation" => Ok(FilterKind::StdDeviation),
            "log-std-deviation" => Ok(FilterKind::LogStdDeviation),
            name => FilterKind::ALL
                .into_iter()
                .find(|kind| kind.name() == name)
                .ok_or_else(|| BuildError::UnknownFilter(s.to_string())),
        }
    }
}

// =#========================================================================#=
// FILTER CONFIG
// =#========================================================================#=
/// Which filter to apply and how much it keeps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    pub kind: FilterKind,
    /// Fraction of keys kept, in `(0, 1]`
    pub mu: f64,
    /// Seed of [FilterKind::Random]
    pub seed: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new(FilterKind::None)
    }
}

impl FilterConfig {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            mu: DEFAULT_MU,
            seed: 0,
        }
    }

    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that `mu` lies in `(0, 1]`.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.mu > 0.0 && self.mu <= 1.0 {
            Ok(())
        } else {
            Err(BuildError::InvalidMu(self.mu))
        }
    }

    /// Returns the number of keys kept out of `num_keys`.
    pub fn num_kept(&self, num_keys: usize) -> usize {
        ((self.mu * num_keys as f64).ceil() as usize).min(num_keys)
    }
}

// =#========================================================================#=
// FILTER VALUES & APPLICATION
// =#========================================================================#=
/// Computes the filter value of a key from its scores on all branches.
///
/// Not defined for [FilterKind::Random], [FilterKind::None] and
/// [FilterKind::MergeBranches], which yield `0.0`.
pub fn filter_value(kind: FilterKind, scores: &[Score]) -> f64 {
    let logs = || scores.iter().map(|&s| f64::from(s));
    let probabilities = || scores.iter().map(|&s| 10f64.powf(f64::from(s)));

    match kind {
        FilterKind::Entropy => {
            let total: f64 = probabilities().sum();
            if total <= 0.0 {
                return 0.0;
            }
            let entropy: f64 = probabilities()
                .map(|p| p / total)
                .filter(|&p| p > 0.0)
                .map(|p| -p * p.ln())
                .sum();
            -entropy
        }
        FilterKind::MaxDeviation => max_deviation(probabilities()),
        FilterKind::LogMaxDeviation => max_deviation(logs()),
        FilterKind::MaxDifference => max_difference(probabilities()),
        FilterKind::LogMaxDifference => max_difference(logs()),
        FilterKind::StdDeviation => std_deviation(probabilities()),
        FilterKind::LogStdDeviation => std_deviation(logs()),
        FilterKind::None | FilterKind::Random | FilterKind::MergeBranches => 0.0,
    }
}

fn max_deviation(values: impl Iterator<Item = f64>) -> f64 {
    let (max, sum, n) = values.fold((f64::NEG_INFINITY, 0.0, 0usize), |(max, sum, n), v| {
        (max.max(v), sum + v, n + 1)
    });
    if n == 0 { 0.0 } else { max - sum / n as f64 }
}

fn max_difference(values: impl Iterator<Item = f64>) -> f64 {
    let (first, second) = values.fold((f64::NEG_INFINITY, f64::NEG_INFINITY), |(first, second), v| {
        if v > first { (v, first) } else { (first, second.max(v)) }
    });
    if second == f64::NEG_INFINITY { 0.0 } else { first - second }
}

fn std_deviation(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (sum, n) = values.clone().fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        return 0.0;
    }
    let mean = sum / n as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    variance.sqrt()
}

/// Applies a score filter to the database, keeping the `ceil(mu * size)`
/// keys of highest filter value (ties broken by ascending key).
///
/// # Arguments
/// * `db` - The database to filter in place
/// * `config` - Filter kind, `mu` and seed
/// * `num_branches` - Number of branches of the reference tree
///
/// # Returns
/// The number of removed keys; `0` for kinds that do not filter scores.
///
/// # Errors
/// [BuildError::InvalidMu] if `mu` is out of range.
pub fn apply(db: &mut PhyloKmerDb, config: &FilterConfig, num_branches: usize) -> Result<usize, BuildError> {
    config.validate()?;
    if !config.kind.is_score_filter() || db.is_empty() {
        return Ok(0);
    }

    let threshold = db.threshold();
    let mut keys: Vec<Key> = db.iter().map(|(key, _)| key).collect();
    keys.sort_unstable();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut scores = Vec::with_capacity(num_branches);
    let mut ranked: Vec<(Key, f64)> = Vec::with_capacity(keys.len());
    for key in keys {
        let value = if config.kind == FilterKind::Random {
            rng.gen_range(0.0..1.0)
        } else {
            scores.clear();
            scores.resize(num_branches, threshold);
            for (&branch, &score) in db.search(key).into_iter().flatten() {
                let branch = branch as usize;
                if branch >= scores.len() {
                    scores.resize(branch + 1, threshold);
                }
                scores[branch] = score;
            }
            filter_value(config.kind, &scores)
        };
        ranked.push((key, value));
    }

    ranked.sort_by(|(key_a, a), (key_b, b)| b.total_cmp(a).then(key_a.cmp(key_b)));
    let num_keys = ranked.len();
    let kept: FxHashSet<Key> = ranked
        .into_iter()
        .take(config.num_kept(num_keys))
        .map(|(key, _)| key)
        .collect();

    db.retain_keys(|key| kept.contains(&key));
    let removed = num_keys - db.size();

    info!(
        filter = %config.kind,
        mu = config.mu,
        kept = db.size(),
        removed,
        "filtered database"
    );
    Ok(removed)
}
