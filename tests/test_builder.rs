use xpas::ar::LabelMapping;
use xpas::builder::{BranchMapping, BuildConfig, DbBuilder};
use xpas::db::PhyloKmerDb;
use xpas::error::{BuildError, DbError, MatrixError};
use xpas::filter::{FilterConfig, FilterKind};
use xpas::model::ghost::{self, GHOST_LEAF_SUFFIX};
use xpas::node_entry::NodeEntry;
use xpas::phylo_kmer::Score;
use xpas::proba_matrix::ProbaMatrix;
use xpas::row::Row;
use xpas::seq::SeqType;

fn entry(label: &str, probabilities: &[[f64; 4]]) -> NodeEntry {
    let rows = probabilities.iter().map(|p| Row::from_probabilities(p)).collect();
    NodeEntry::with_rows(label, SeqType::Dna, rows)
}

/// Two-letter columns over A and C.
fn ac(a: f64) -> [f64; 4] {
    [a, 1.0 - a, 0.0, 0.0]
}

fn score_of(db: &PhyloKmerDb, kmer: &str, branch: u32) -> Option<Score> {
    let key = SeqType::Dna.encode_str(kmer).unwrap();
    db.search(key)?.get(&branch).copied()
}

fn assert_score(db: &PhyloKmerDb, kmer: &str, branch: u32, probability: f64) {
    let score = score_of(db, kmer, branch).unwrap_or_else(|| panic!("{kmer} missing on {branch}"));
    assert!(
        (f64::from(score) - probability.log10()).abs() < 1e-5,
        "{kmer} on {branch}: {score}"
    );
}

// --- TESTS CONFIG ---
#[test]
fn test_default_config() {
    let config = BuildConfig::default();
    assert_eq!(config.seq_type, SeqType::Dna);
    assert_eq!(config.kmer_size, 8);
    assert_eq!(config.omega, 1.5);
    assert_eq!(config.num_threads, 1);
    assert_eq!(config.filter.kind, FilterKind::None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_configs() {
    let config = BuildConfig::new(SeqType::Dna);
    assert!(matches!(
        DbBuilder::new(config.with_num_threads(0)),
        Err(BuildError::NoThreads)
    ));
    assert!(matches!(
        DbBuilder::new(config.with_kmer_size(0)),
        Err(BuildError::Db(DbError::Kmer(_)))
    ));
    assert!(matches!(
        DbBuilder::new(BuildConfig::new(SeqType::Protein).with_kmer_size(13)),
        Err(BuildError::Db(DbError::Kmer(_)))
    ));
    assert!(matches!(
        DbBuilder::new(config.with_omega(0.0)),
        Err(BuildError::Db(DbError::InvalidOmega(_)))
    ));
    assert!(matches!(
        DbBuilder::new(config.with_filter(FilterConfig::new(FilterKind::Entropy).with_mu(0.0))),
        Err(BuildError::InvalidMu(_))
    ));
}

// --- TESTS BRANCH MAPPING ---
#[test]
fn test_mapping_from_tree() {
    let tree = xpas::parse_newick_str("((A:1,B:1)AB:1,C:1)root;").unwrap();
    let mapping = BranchMapping::from_tree(&tree).unwrap();

    assert_eq!(mapping.num_branches(), 4);
    assert_eq!(mapping.len(), 4);
    assert_eq!(mapping.get("A"), Some(0));
    assert_eq!(mapping.get("B"), Some(1));
    assert_eq!(mapping.get("AB"), Some(2));
    assert_eq!(mapping.get("C"), Some(3));
    assert_eq!(mapping.get("root"), None);
}

#[test]
fn test_mapping_insert_grows_branch_count() {
    let mut mapping = BranchMapping::new(2);
    assert!(mapping.is_empty());
    mapping.insert("a", 1);
    assert_eq!(mapping.num_branches(), 2);
    mapping.insert("b", 5);
    assert_eq!(mapping.num_branches(), 6);
    assert_eq!(mapping.get("b"), Some(5));
}

#[test]
fn test_mapping_from_ghosts() {
    let tree = xpas::parse_newick_str("((A:1,B:1):1,C:1);").unwrap();
    let (_, ghosts) = ghost::extend(&tree).unwrap();

    // the reconstruction renames every ghost node
    let mut labels = LabelMapping::default();
    for (ghost_label, _) in ghosts.iter() {
        labels.insert(ghost_label, format!("node_{ghost_label}"));
    }

    let mapping = BranchMapping::from_ghosts(&ghosts, &labels, tree.node_count() - 1);
    assert_eq!(mapping.num_branches(), 4);
    assert_eq!(mapping.len(), 4);
    for branch in 0..4u32 {
        let (internal, leaf) = ghost::ghost_labels(branch);
        assert_eq!(mapping.get(&format!("node_{internal}")), Some(branch));
        assert_eq!(mapping.get(&format!("node_{leaf}")), None);
        assert!(leaf.ends_with(GHOST_LEAF_SUFFIX));
    }
}

#[test]
fn test_mapping_from_ghosts_skips_missing_labels() {
    let tree = xpas::parse_newick_str("(A:1,B:1);").unwrap();
    let (_, ghosts) = ghost::extend(&tree).unwrap();

    let mut labels = LabelMapping::default();
    labels.insert("0_X0", "7");
    let mapping = BranchMapping::from_ghosts(&ghosts, &labels, 2);
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.get("7"), Some(0));
    assert_eq!(mapping.num_branches(), 2);
}

// --- TESTS BUILD ---
#[test]
fn test_build_single_kmer() {
    let mut matrix = ProbaMatrix::new(SeqType::Dna, 4);
    matrix.insert(entry("0_X0", &[[0.97, 0.01, 0.01, 0.01]; 4])).unwrap();
    let mut mapping = BranchMapping::new(1);
    mapping.insert("0_X0", 0);

    let config = BuildConfig::new(SeqType::Dna).with_kmer_size(3);
    let db = DbBuilder::new(config).unwrap().build("(A,B);", &matrix, &mapping).unwrap();

    assert_eq!(db.size(), 1);
    assert_eq!(db.kmer_size(), 3);
    assert_eq!(db.tree(), "(A,B);");
    assert_score(&db, "AAA", 0, 0.97f64.powi(3));
}

#[test]
fn test_build_keeps_best_score_over_windows() {
    let mut matrix = ProbaMatrix::new(SeqType::Dna, 3);
    matrix.insert(entry("n", &[ac(0.9), ac(0.5), ac(0.8)])).unwrap();
    let mut mapping = BranchMapping::new(1);
    mapping.insert("n", 0);

    let config = BuildConfig::new(SeqType::Dna).with_kmer_size(2);
    let db = DbBuilder::new(config).unwrap().build("", &matrix, &mapping).unwrap();

    // threshold 2 * log10(1.5 / 4): keeps probabilities from 0.140625 up
    assert_eq!(db.size(), 3);
    assert_score(&db, "AA", 0, 0.45);
    assert_score(&db, "AC", 0, 0.45);
    assert_score(&db, "CA", 0, 0.4);
    assert_eq!(score_of(&db, "CC", 0), None);
    assert!(db.iter().all(|(_, branches)| branches.values().all(|&s| s >= db.threshold())));
}

#[test]
fn test_build_multiple_branches() {
    let mut matrix = ProbaMatrix::new(SeqType::Dna, 2);
    matrix.insert(entry("x", &[ac(0.9), ac(0.9)])).unwrap();
    matrix.insert(entry("y", &[ac(0.1), ac(0.1)])).unwrap();
    matrix.insert(entry("z", &[ac(0.6), ac(0.3)])).unwrap();
    let mut mapping = BranchMapping::new(3);
    mapping.insert("x", 0);
    mapping.insert("y", 1);
    mapping.insert("z", 2);

    let config = BuildConfig::new(SeqType::Dna).with_kmer_size(2);
    let db = DbBuilder::new(config).unwrap().build("", &matrix, &mapping).unwrap();

    assert_score(&db, "AA", 0, 0.81);
    assert_score(&db, "CC", 1, 0.81);
    assert_score(&db, "AC", 2, 0.42);
    assert_score(&db, "AA", 2, 0.18);
    assert_score(&db, "CC", 2, 0.28);
    assert_eq!(score_of(&db, "AA", 1), None);
    assert_eq!(db.search(SeqType::Dna.encode_str("AA").unwrap()).unwrap().len(), 2);
}

#[test]
fn test_build_skips_unmapped_entries() {
    let mut matrix = ProbaMatrix::new(SeqType::Dna, 2);
    matrix.insert(entry("mapped", &[ac(0.9), ac(0.9)])).unwrap();
    matrix.insert(entry("leaf", &[ac(0.1), ac(0.1)])).unwrap();
    let mut mapping = BranchMapping::new(1);
    mapping.insert("mapped", 0);

    let config = BuildConfig::new(SeqType::Dna).with_kmer_size(2);
    let db = DbBuilder::new(config).unwrap().build("", &matrix, &mapping).unwrap();
    assert_eq!(db.size(), 1);
    assert_eq!(score_of(&db, "CC", 0), None);
}

#[test]
fn test_merge_branches_keeps_best_of_entries() {
    let mut matrix = ProbaMatrix::new(SeqType::Dna, 2);
    matrix.insert(entry("first", &[ac(0.9), ac(0.6)])).unwrap();
    matrix.insert(entry("second", &[ac(0.7), ac(0.8)])).unwrap();
    let mut mapping = BranchMapping::new(1);
    mapping.insert("first", 0);
    mapping.insert("second", 0);

    let config = BuildConfig::new(SeqType::Dna)
        .with_kmer_size(2)
        .with_num_threads(2)
        .with_filter(FilterConfig::new(FilterKind::MergeBranches));
    let db = DbBuilder::new(config).unwrap().build("", &matrix, &mapping).unwrap();

    // AA and CA are best in the second entry, AC only reaches the
    // threshold in the first
    assert_score(&db, "AA", 0, 0.7 * 0.8);
    assert_score(&db, "AC", 0, 0.9 * 0.4);
    assert_score(&db, "CA", 0, 0.3 * 0.8);
    assert_eq!(db.size(), 3);
}

#[test]
fn test_shared_branch_keeps_best_without_merging() {
    let mut matrix = ProbaMatrix::new(SeqType::Dna, 2);
    matrix.insert(entry("first", &[ac(0.9), ac(0.6)])).unwrap();
    matrix.insert(entry("second", &[ac(0.7), ac(0.8)])).unwrap();
    let mut mapping = BranchMapping::new(1);
    mapping.insert("first", 0);
    mapping.insert("second", 0);

    for threads in [1, 2, 4] {
        let config = BuildConfig::new(SeqType::Dna)
            .with_kmer_size(2)
            .with_num_threads(threads);
        let db = DbBuilder::new(config).unwrap().build("", &matrix, &mapping).unwrap();
        assert_score(&db, "AA", 0, 0.7 * 0.8);
        assert_score(&db, "AC", 0, 0.9 * 0.4);
        assert_score(&db, "CA", 0, 0.3 * 0.8);
        assert_eq!(db.size(), 3);
    }
}

#[test]
fn test_matrix_rejects_entries_of_other_seq_type() {
    let mut matrix = ProbaMatrix::new(SeqType::Dna, 2);
    let protein = NodeEntry::with_rows("p", SeqType::Protein, vec![Row::from_scores(&[-0.6; 4]); 2]);
    assert!(matches!(
        matrix.insert(protein),
        Err(MatrixError::SeqTypeMismatch {
            expected: SeqType::Dna,
            actual: SeqType::Protein,
            ..
        })
    ));
    assert!(matrix.is_empty());
    assert!(matrix.get("p").is_none());
}

#[test]
fn test_seq_type_mismatch() {
    let matrix = ProbaMatrix::new(SeqType::Protein, 10);
    let builder = DbBuilder::new(BuildConfig::new(SeqType::Dna)).unwrap();
    assert!(matches!(
        builder.build("", &matrix, &BranchMapping::new(1)),
        Err(BuildError::SeqTypeMismatch {
            config: SeqType::Dna,
            matrix: SeqType::Protein
        })
    ));
}

#[test]
fn test_empty_matrix_gives_empty_db() {
    let matrix = ProbaMatrix::new(SeqType::Dna, 0);
    let builder = DbBuilder::new(BuildConfig::new(SeqType::Dna)).unwrap();
    let db = builder.build("", &matrix, &BranchMapping::new(0)).unwrap();
    assert!(db.is_empty());
}

#[test]
fn test_thread_count_does_not_change_result() {
    let columns = [ac(0.9), ac(0.2), ac(0.6), ac(0.7), ac(0.4), ac(0.95)];
    let mut matrix = ProbaMatrix::new(SeqType::Dna, columns.len());
    let mut mapping = BranchMapping::new(8);
    for branch in 0..8u32 {
        let mut rows = columns;
        rows.rotate_left(branch as usize % columns.len());
        let label = format!("{branch}_X0");
        matrix.insert(entry(&label, &rows)).unwrap();
        mapping.insert(label, branch);
    }

    let build = |threads| {
        let config = BuildConfig::new(SeqType::Dna)
            .with_kmer_size(3)
            .with_num_threads(threads);
        DbBuilder::new(config)
            .unwrap()
            .build("", &matrix, &mapping)
            .unwrap()
            .iter_sorted()
            .collect::<Vec<_>>()
    };
    let single = build(1);
    assert!(!single.is_empty());
    assert_eq!(single, build(4));
}

#[test]
fn test_build_applies_filter() {
    let mut matrix = ProbaMatrix::new(SeqType::Dna, 2);
    matrix.insert(entry("x", &[ac(0.9), ac(0.9)])).unwrap();
    matrix.insert(entry("y", &[ac(0.9), ac(0.5)])).unwrap();
    let mut mapping = BranchMapping::new(2);
    mapping.insert("x", 0);
    mapping.insert("y", 1);

    let unfiltered = DbBuilder::new(BuildConfig::new(SeqType::Dna).with_kmer_size(2))
        .unwrap()
        .build("", &matrix, &mapping)
        .unwrap();

    let config = BuildConfig::new(SeqType::Dna)
        .with_kmer_size(2)
        .with_filter(FilterConfig::new(FilterKind::LogMaxDifference).with_mu(0.5));
    let filtered = DbBuilder::new(config).unwrap().build("", &matrix, &mapping).unwrap();

    assert_eq!(filtered.size(), unfiltered.size().div_ceil(2));
    assert!(filtered.size() < unfiltered.size());
}
