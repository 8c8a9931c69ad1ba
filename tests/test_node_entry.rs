use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use xpas::node_entry::NodeEntry;
use xpas::phylo_kmer::{Key, Score};
use xpas::row::{ProbaPair, Row};
use xpas::seq::SeqType;

fn entry_of(scores: &[[Score; 4]]) -> NodeEntry {
    let mut entry = NodeEntry::new("7_X0", SeqType::Dna);
    for row in scores {
        entry.push_back(Row::from_scores(row));
    }
    entry
}

/// Rows with two non-negligible residues (A and G) and two residues far
/// below any threshold, emulating a two-letter alphabet.
fn two_letter_entry() -> NodeEntry {
    let p = |a: f64| [a.log10() as Score, -40.0, (1.0 - a).log10() as Score, -40.0];
    entry_of(&[p(0.9), p(0.6), p(0.3), p(0.75)])
}

fn random_entry(rng: &mut StdRng, alignment_size: usize) -> NodeEntry {
    let mut entry = NodeEntry::new("random", SeqType::Dna);
    for _ in 0..alignment_size {
        let weights: Vec<f64> = (0..4).map(|_| rng.gen_range(0.001..1.0)).collect();
        let total: f64 = weights.iter().sum();
        let probabilities: Vec<f64> = weights.iter().map(|w| w / total).collect();
        entry.push_back(Row::from_probabilities(&probabilities));
    }
    entry
}

/// All k-mers of a window by exhaustive cross product over the rows.
fn brute_force(entry: &NodeEntry, start: usize, k: usize, threshold: Score) -> HashMap<Key, Score> {
    let mut kmers = HashMap::new();
    let alphabet = entry.rows()[0].len();
    let combinations = alphabet.pow(k as u32);

    for n in 0..combinations {
        let mut key: Key = 0;
        let mut score: Score = 0.0;
        for position in 0..k {
            let variant = (n / alphabet.pow((k - 1 - position) as u32)) % alphabet;
            let pair = entry.at(start + position, variant).unwrap();
            key = SeqType::Dna.push_code(key, pair.index);
            score += pair.score;
        }
        if score >= threshold {
            kmers.insert(key, score);
        }
    }
    kmers
}

// --- TESTS NODE ENTRY ---
#[test]
fn test_alignment_size_and_access() {
    let entry = entry_of(&[[-0.1, -1.0, -2.0, -3.0], [-3.0, -2.0, -1.0, -0.1]]);
    assert_eq!(entry.alignment_size(), 2);
    assert_eq!(entry.label(), "7_X0");

    // rows are sorted, the best variant comes first
    assert_eq!(entry.at(0, 0), Some(&ProbaPair::new(-0.1, 0)));
    assert_eq!(entry.at(1, 0), Some(&ProbaPair::new(-0.1, 3)));
    assert_eq!(entry.at(1, 3), Some(&ProbaPair::new(-3.0, 0)));
    assert!(entry.at(2, 0).is_none());
    assert!(entry.at(0, 4).is_none());
}

// --- TESTS WINDOWS ---
#[test]
fn test_window_count() {
    let entry = entry_of(&[[-0.6; 4]; 6]);
    for k in 1..=6 {
        let mut windows = entry.begin(k, -100.0);
        assert_eq!(windows.len(), 6 - k + 1);

        let mut advanced = 0;
        while !windows.is_end() {
            let view = windows.next().unwrap();
            assert_eq!(view.start(), advanced);
            assert_eq!(view.kmer_size(), k);
            advanced += 1;
        }
        assert_eq!(advanced, 6 - k + 1);
        assert!(windows.next().is_none());
        assert!(windows.is_end());
    }
}

#[test]
fn test_no_window_for_zero_or_oversized_k() {
    let entry = entry_of(&[[-0.6; 4]; 3]);
    assert_eq!(entry.begin(0, -1.0).count(), 0);
    assert_eq!(entry.begin(4, -1.0).count(), 0);
    assert!(entry.begin(4, -1.0).is_end());
    assert!(NodeEntry::new("empty", SeqType::Dna).begin(1, -1.0).is_end());
}

#[test]
fn test_windows_restart_from_begin() {
    let entry = two_letter_entry();
    let first: Vec<usize> = entry.begin(2, -2.0).map(|view| view.iter().count()).collect();
    let second: Vec<usize> = entry.begin(2, -2.0).map(|view| view.iter().count()).collect();
    assert_eq!(first, second);
}

// --- TESTS ENUMERATION ---
#[test]
fn test_enumeration_matches_brute_force() {
    let entry = two_letter_entry();
    let k = 2;

    for threshold in [-0.1, -0.4, -0.8, -1.2, -2.0, -45.0, -100.0] {
        let views: Vec<_> = entry.begin(k, threshold).collect();
        assert_eq!(views.len(), 3);

        for view in views {
            let expected = brute_force(&entry, view.start(), k, threshold);
            let found: HashMap<Key, Score> =
                view.iter().map(|kmer| (kmer.key, kmer.score)).collect();

            assert_eq!(view.iter().count(), found.len(), "k-mers enumerated twice");
            assert_eq!(found.len(), expected.len());
            for (key, score) in &found {
                assert!(*score >= threshold);
                let brute = expected.get(key).unwrap();
                assert!((brute - score).abs() < 1e-5);
            }
        }
    }
}

#[test]
fn test_enumeration_keys_and_scores() {
    let entry = two_letter_entry();
    let view = entry.begin(2, -0.4).next().unwrap();
    let kmers: Vec<(String, Score)> = view
        .iter()
        .map(|kmer| (SeqType::Dna.decode_to_string(kmer.key, 2).unwrap(), kmer.score))
        .collect();

    // only AA = 0.9 * 0.6 reaches log10(0.398); AG = 0.9 * 0.4 falls short
    assert_eq!(kmers.len(), 1);
    assert_eq!(kmers[0].0, "AA");
    assert!((kmers[0].1 - (0.54f32).log10()).abs() < 1e-5);
}

#[test]
fn test_full_enumeration_without_pruning() {
    let entry = entry_of(&[[-0.6; 4]; 3]);
    let view = entry.begin(3, Score::NEG_INFINITY).next().unwrap();
    assert_eq!(view.iter().count(), 64);
}

#[test]
fn test_nan_scores_are_never_emitted() {
    let entry = entry_of(&[[Score::NAN, -0.1, -0.2, -0.3], [-0.1, -0.1, -0.1, -0.1]]);
    let view = entry.begin(2, -10.0).next().unwrap();
    let kmers: Vec<_> = view.iter().collect();
    assert_eq!(kmers.len(), 12);
    assert!(kmers.iter().all(|kmer| !kmer.is_na() && kmer.score >= -10.0));
}

#[test]
fn test_threshold_above_best_yields_nothing() {
    let entry = entry_of(&[[-0.1, -0.2, -0.3, -0.4]; 3]);
    let view = entry.begin(3, -0.2).next().unwrap();
    assert_eq!(view.iter().count(), 0);
    let view = entry.begin(3, -0.35).next().unwrap();
    assert_eq!(view.iter().count(), 1);
}

#[test]
fn test_kmer_scoring_exactly_threshold_is_emitted() {
    let mut rng = StdRng::seed_from_u64(2024);

    for k in 3..=5 {
        for _ in 0..2000 {
            let entry = random_entry(&mut rng, k);

            // score of one combination, summed in k-mer order
            let mut key: Key = 0;
            let mut score: Score = 0.0;
            for position in 0..k {
                let pair = entry.at(position, rng.gen_range(0..4)).unwrap();
                key = SeqType::Dna.push_code(key, pair.index);
                score += pair.score;
            }

            let view = entry.begin(k, score).next().unwrap();
            let found = view.iter().find(|kmer| kmer.key == key);
            assert_eq!(found.map(|kmer| kmer.score), Some(score), "k={k} key={key}");
        }
    }
}

#[test]
fn test_random_windows_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(7);

    for k in 3..=4 {
        for _ in 0..200 {
            let entry = random_entry(&mut rng, k + 2);
            let threshold: Score = rng.gen_range(-4.0..-0.5);

            for view in entry.begin(k, threshold) {
                let expected = brute_force(&entry, view.start(), k, threshold);
                let found: HashMap<Key, Score> =
                    view.iter().map(|kmer| (kmer.key, kmer.score)).collect();
                assert_eq!(found, expected);
            }
        }
    }
}
