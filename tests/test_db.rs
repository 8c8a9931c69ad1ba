use std::fs::File;
use std::io::Write;
use tempfile::NamedTempFile;
use xpas::db::{FORMAT_VERSION, PhyloKmerDb};
use xpas::error::{DbError, KmerError};
use xpas::phylo_kmer::{BranchId, Key, Score, omega_threshold};
use xpas::seq::SeqType;

const TREE: &str = "((A:0.1,B:0.2):0.05,C:0.3);";

/// Keys 0..=4 spread over three branches, each key on up to three branches.
fn scenario_db() -> PhyloKmerDb {
    let mut db = PhyloKmerDb::new(SeqType::Dna, 3, 1.5, TREE).unwrap();
    let data: [(BranchId, [(Key, Score); 3]); 3] = [
        (0, [(0, 0.00), (1, 0.10), (2, 0.20)]),
        (1, [(1, 0.11), (2, 0.21), (3, 0.31)]),
        (2, [(2, 0.22), (3, 0.32), (4, 0.42)]),
    ];
    for (branch, kmers) in data {
        for (key, score) in kmers {
            assert!(db.insert(key, branch, score));
        }
    }
    db
}

// --- TESTS CONSTRUCTION ---
#[test]
fn test_new_empty_db() {
    let db = PhyloKmerDb::new(SeqType::Protein, 5, 1.5, TREE).unwrap();
    assert!(db.is_empty());
    assert_eq!(db.size(), 0);
    assert_eq!(db.num_entries(), 0);
    assert_eq!(db.seq_type(), SeqType::Protein);
    assert_eq!(db.kmer_size(), 5);
    assert_eq!(db.omega(), 1.5);
    assert_eq!(db.tree(), TREE);
    assert_eq!(db.threshold(), omega_threshold(SeqType::Protein, 1.5, 5));
}

#[test]
fn test_invalid_parameters() {
    assert!(matches!(
        PhyloKmerDb::new(SeqType::Dna, 0, 1.5, TREE),
        Err(DbError::Kmer(KmerError::ZeroKmerSize))
    ));
    assert!(matches!(
        PhyloKmerDb::new(SeqType::Dna, 33, 1.5, TREE),
        Err(DbError::Kmer(KmerError::KmerSizeTooLarge { .. }))
    ));
    assert!(matches!(
        PhyloKmerDb::new(SeqType::Protein, 13, 1.5, TREE),
        Err(DbError::Kmer(KmerError::KmerSizeTooLarge { .. }))
    ));
    for omega in [0.0, -1.0, Score::NAN, Score::INFINITY] {
        assert!(matches!(
            PhyloKmerDb::new(SeqType::Dna, 8, omega, TREE),
            Err(DbError::InvalidOmega(_))
        ));
    }
}

// --- TESTS INSERT & SEARCH ---
#[test]
fn test_scenario_search() {
    let db = scenario_db();
    assert_eq!(db.size(), 5);
    assert_eq!(db.num_entries(), 9);

    let branches = db.search(2).unwrap();
    assert_eq!(branches.len(), 3);
    assert_eq!(branches.get(&0), Some(&0.20));
    assert_eq!(branches.get(&1), Some(&0.21));
    assert_eq!(branches.get(&2), Some(&0.22));

    let branches = db.search(0).unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches.get(&0), Some(&0.00));

    let branches = db.search(4).unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches.get(&2), Some(&0.42));

    assert!(db.search(42).is_none());
}

#[test]
fn test_last_write_wins() {
    let mut db = scenario_db();
    assert!(db.insert(2, 1, -0.5));
    assert_eq!(db.search(2).unwrap().get(&1), Some(&-0.5));
    assert_eq!(db.num_entries(), 9);

    assert!(db.insert(2, 1, 0.7));
    assert_eq!(db.search(2).unwrap().get(&1), Some(&0.7));
}

#[test]
fn test_refused_scores() {
    let mut db = PhyloKmerDb::new(SeqType::Dna, 3, 1.5, TREE).unwrap();
    let threshold = db.threshold();

    assert!(!db.insert(7, 0, Score::NAN));
    assert!(!db.insert(7, 0, threshold - 0.01));
    assert!(!db.insert(7, 0, Score::NEG_INFINITY));
    assert!(db.is_empty());

    assert!(db.insert(7, 0, threshold));
    assert_eq!(db.size(), 1);
}

// --- TESTS ITERATION ---
#[test]
fn test_iter_sorted() {
    let db = scenario_db();
    let sorted: Vec<(Key, Vec<(BranchId, Score)>)> = db.iter_sorted().collect();

    let keys: Vec<Key> = sorted.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec![0, 1, 2, 3, 4]);
    assert_eq!(sorted[2].1, vec![(0, 0.20), (1, 0.21), (2, 0.22)]);
    assert_eq!(sorted[3].1, vec![(1, 0.31), (2, 0.32)]);

    assert_eq!(db.iter().count(), 5);
}

#[test]
fn test_retain_keys() {
    let mut db = scenario_db();
    db.retain_keys(|key| key % 2 == 0);
    assert_eq!(db.size(), 3);
    assert!(db.search(1).is_none());
    assert!(db.search(3).is_none());
    assert_eq!(db.search(2).unwrap().len(), 3);
}

// --- TESTS PERSISTENCE ---
#[test]
fn test_save_load_round_trip() {
    let db = scenario_db();
    let file = NamedTempFile::new().unwrap();
    db.save(file.path()).unwrap();

    let loaded = PhyloKmerDb::load(file.path()).unwrap();
    assert_eq!(loaded.seq_type(), db.seq_type());
    assert_eq!(loaded.kmer_size(), db.kmer_size());
    assert_eq!(loaded.omega(), db.omega());
    assert_eq!(loaded.threshold(), db.threshold());
    assert_eq!(loaded.tree(), TREE);
    assert_eq!(
        loaded.iter_sorted().collect::<Vec<_>>(),
        db.iter_sorted().collect::<Vec<_>>()
    );
}

#[test]
fn test_save_load_empty() {
    let db = PhyloKmerDb::new(SeqType::Protein, 4, 2.0, "").unwrap();
    let file = NamedTempFile::new().unwrap();
    db.save(file.path()).unwrap();

    let loaded = xpas::load_db(file.path()).unwrap();
    assert!(loaded.is_empty());
    assert_eq!(loaded.seq_type(), SeqType::Protein);
    assert_eq!(loaded.tree(), "");
}

#[test]
fn test_load_unsupported_version() {
    let mut file = NamedTempFile::new().unwrap();
    bincode::serialize_into(&mut file, &(FORMAT_VERSION + 1)).unwrap();
    file.flush().unwrap();

    match PhyloKmerDb::load(file.path()) {
        Err(DbError::UnsupportedVersion(version)) => assert_eq!(version, FORMAT_VERSION + 1),
        other => panic!("expected unsupported version, got {other:?}"),
    }
}

#[test]
fn test_load_truncated_file() {
    let file = NamedTempFile::new().unwrap();
    scenario_db().save(file.path()).unwrap();
    let len = std::fs::metadata(file.path()).unwrap().len();
    File::options()
        .write(true)
        .open(file.path())
        .unwrap()
        .set_len(len / 2)
        .unwrap();

    assert!(matches!(
        PhyloKmerDb::load(file.path()),
        Err(DbError::Serialization(_))
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PhyloKmerDb::load(dir.path().join("missing.db")),
        Err(DbError::Io(_))
    ));
}
