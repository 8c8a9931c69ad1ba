//! `xpas-build`: builds and queries phylo-k-mer databases.
//!
//! # Commands
//! - `build`: extend the reference tree with ghost nodes, run the ancestral
//!   reconstruction (or read its outputs), generate, filter and save the
//!   database
//! - `search`: look up k-mers in a saved database

use clap::{Args, Parser, Subcommand};
use std::fs::{self, File};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use xpas::ar::{self, ArModel, ArParameters, Reconstruction};
use xpas::builder::{self, BranchMapping, BuildConfig, DbBuilder};
use xpas::error::Error;
use xpas::filter::{self, FilterConfig, FilterKind};
use xpas::model::ghost;
use xpas::newick;
use xpas::phylo_kmer::Score;
use xpas::PhyloKmerDb;

/// Name of the extended tree handed to the reconstruction tool.
const EXTENDED_TREE_FILE: &str = "extended_tree.nwk";

/// Phylo-k-mer database construction
#[derive(Parser)]
#[command(name = "xpas-build")]
#[command(version)]
#[command(about = "Builds phylo-k-mer databases for phylogenetic placement")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a database from a reference tree and alignment
    Build(BuildArgs),
    /// Print the branch scores of k-mers in a database
    Search(SearchArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Original phylogenetic tree file (Newick)
    #[arg(short = 't', long)]
    reftree: PathBuf,

    /// Reference alignment the tree was built from
    #[arg(long)]
    refalign: PathBuf,

    /// Binary of the reconstruction software (PhyML or RAxML-NG)
    #[arg(long, default_value = "phyml")]
    arbinary: PathBuf,

    /// Directory with the outputs of a previous reconstruction; skips running it
    #[arg(long)]
    ar_dir: Option<PathBuf>,

    /// Reconstruction model (nucl: JC69, HKY85, K80, F81, F84, TN93, GTR;
    /// amino: LG, WAG, JTT, Dayhoff, DCMut, CpREV, MtREV, MtMam, MtArt)
    #[arg(long, default_value = "GTR")]
    model: String,

    /// Gamma shape parameter of the reconstruction
    #[arg(long, default_value_t = ar::DEFAULT_ALPHA)]
    alpha: f64,

    /// Number of rate categories of the reconstruction
    #[arg(long, default_value_t = ar::DEFAULT_CATEGORIES)]
    categories: u32,

    /// Arguments passed to the reconstruction software instead of model,
    /// alpha and categories
    #[arg(long, allow_hyphen_values = true, num_args = 1..)]
    ar_parameters: Vec<String>,

    /// k-mer length
    #[arg(short, default_value_t = builder::DEFAULT_KMER_SIZE)]
    k: usize,

    /// Score threshold parameter
    #[arg(short, long, default_value_t = builder::DEFAULT_OMEGA)]
    omega: Score,

    /// Number of threads
    #[arg(short = 'j', long, default_value_t = builder::DEFAULT_NUM_THREADS)]
    num_threads: usize,

    /// Filter (no-filter, entropy, max-deviation, log-max-deviation,
    /// max-difference, log-max-difference, sd, log-sd, random, merge-branches)
    #[arg(long, default_value = "no-filter")]
    filter: String,

    /// Fraction of k-mers kept by the filter
    #[arg(short = 'u', long, default_value_t = filter::DEFAULT_MU)]
    mu: f64,

    /// Seed of the random filter
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Working directory
    #[arg(short, long, default_value = ".")]
    workdir: PathBuf,

    /// Output database file (default: DB_k<k>_o<omega>.xpas in the working directory)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SearchArgs {
    /// Database file
    #[arg(long)]
    db: PathBuf,

    /// k-mers to look up
    #[arg(required = true)]
    kmers: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("off")
    } else {
        match cli.verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            1 => EnvFilter::new("info"),
            _ => EnvFilter::new("debug"),
        }
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => build(args),
        Commands::Search(args) => search(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn build(args: BuildArgs) -> Result<(), Error> {
    let model: ArModel = args.model.parse()?;
    let filter_kind: FilterKind = args.filter.parse()?;
    let config = BuildConfig::new(model.seq_type())
        .with_kmer_size(args.k)
        .with_omega(args.omega)
        .with_num_threads(args.num_threads)
        .with_filter(
            FilterConfig::new(filter_kind)
                .with_mu(args.mu)
                .with_seed(args.seed),
        );
    let db_builder = DbBuilder::new(config)?;

    let tree = newick::parse_file(&args.reftree)?;
    let (extended, ghosts) = ghost::extend(&tree)?;

    let ar_dir = args.ar_dir.clone().unwrap_or_else(|| args.workdir.join("ar"));
    fs::create_dir_all(&ar_dir)?;
    let extended_file = ar_dir.join(EXTENDED_TREE_FILE);
    newick::write_newick_file(File::create(&extended_file)?, std::slice::from_ref(&extended))?;

    let params = ArParameters::new(&args.arbinary, &extended_file, &args.refalign, &ar_dir)
        .with_model(model)
        .with_alpha(args.alpha)
        .with_categories(args.categories)
        .with_extra_args(args.ar_parameters);
    let reconstruction = Reconstruction::detect(params)?;
    let (matrix, ar_tree) = if args.ar_dir.is_some() {
        info!(dir = %ar_dir.display(), "reading existing reconstruction");
        reconstruction.read_outputs()?
    } else {
        reconstruction.run()?
    };

    let labels = ar::map_nodes(&extended, &ar_tree)?;
    let mapping = BranchMapping::from_ghosts(&ghosts, &labels, tree.node_count().saturating_sub(1));
    let db = db_builder.build(&tree.to_newick(), &matrix, &mapping)?;

    let output = args.output.unwrap_or_else(|| {
        args.workdir
            .join(format!("DB_k{}_o{}.xpas", args.k, args.omega))
    });
    db.save(&output)?;
    info!(path = %output.display(), keys = db.size(), "done");
    Ok(())
}

fn search(args: SearchArgs) -> Result<(), Error> {
    let db = PhyloKmerDb::load(&args.db)?;

    for kmer in &args.kmers {
        if kmer.len() != db.kmer_size() {
            warn!(kmer = %kmer, kmer_size = db.kmer_size(), "k-mer length differs from the database");
            continue;
        }
        let key = db.seq_type().encode_str(kmer)?;

        match db.search(key) {
            Some(branches) => {
                let mut branches: Vec<_> = branches.iter().collect();
                branches.sort_unstable_by_key(|&(&branch, _)| branch);
                let scores: Vec<String> = branches
                    .iter()
                    .map(|(branch, score)| format!("{branch}:{score}"))
                    .collect();
                println!("{kmer}\t{}", scores.join("\t"));
            }
            None => println!("{kmer}\tnot found"),
        }
    }
    Ok(())
}
