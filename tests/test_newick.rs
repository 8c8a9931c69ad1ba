use std::io::Write;
use tempfile::NamedTempFile;
use xpas::model::PhyloTree;
use xpas::newick::{NewickParser, parse_file, parse_str, to_newick, write_newick_file};
use xpas::parser::{ByteParser, ParsingErrorKind};

fn structure(tree: &PhyloTree) -> Vec<(String, f64, usize)> {
    tree.pre_order_iter()
        .map(|node| (node.label().to_string(), node.branch_length(), node.children().len()))
        .collect()
}

// --- TESTS NEWICK STRING PARSING ---
#[test]
fn test_basic_tree() {
    let tree = parse_str("((A:1.0,B:2.0):3.0,C:4.0):0.5;").unwrap();

    assert_eq!(tree.node_count(), 5);
    assert_eq!(tree.leaves().count(), 3);
    assert!(tree.is_rooted());

    let a = tree.get_by_label("A").unwrap();
    let b = tree.get_by_label("B").unwrap();
    let c = tree.get_by_label("C").unwrap();
    assert_eq!(a.branch_length(), 1.0);
    assert_eq!(b.branch_length(), 2.0);
    assert_eq!(c.branch_length(), 4.0);
    assert_eq!(a.parent(), b.parent());
    assert_eq!(tree.parent(a.preorder_id()).unwrap().branch_length(), 3.0);
    assert_eq!(c.parent(), Some(tree.root_id()));
}

#[test]
fn test_multifurcations_and_internal_labels() {
    let tree = parse_str("((A,B,C)ABC:0.1,D,E)root;").unwrap();
    assert!(!tree.is_rooted());
    assert_eq!(tree.root().label(), "root");
    assert_eq!(tree.root().children().len(), 3);

    let abc = tree.get_by_label("ABC").unwrap();
    assert_eq!(abc.children().len(), 3);
    assert_eq!(abc.branch_length(), 0.1);
    // missing branch lengths are zero
    assert_eq!(tree.get_by_label("D").unwrap().branch_length(), 0.0);
}

#[test]
fn test_comments_whitespace_and_quotes() {
    let newick = "[tree 1]\n ( 'Little Spotted Kiwi' [&age=3] : 1.5e-1 ,\n\t'Baillon''s Crake':2 ) ;";
    let tree = parse_str(newick).unwrap();

    assert_eq!(tree.get_by_label("Little Spotted Kiwi").unwrap().branch_length(), 0.15);
    assert_eq!(tree.get_by_label("Baillon's Crake").unwrap().branch_length(), 2.0);
}

#[test]
fn test_unlabelled_nodes_are_not_indexed_by_label() {
    let tree = parse_str("((A,B),(C,D));").unwrap();
    assert_eq!(tree.node_count(), 7);
    assert!(tree.get_by_label("").is_none());
}

#[test]
fn test_parse_all() {
    let byte_parser = ByteParser::for_str("(A,B);\n((A,B),C);\n[end]\n");
    let trees = NewickParser::new().parse_all(byte_parser).unwrap();
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].node_count(), 3);
    assert_eq!(trees[1].node_count(), 5);
}

// --- TESTS ERRORS ---
#[test]
fn test_missing_semicolon() {
    let err = parse_str("(A,B)").unwrap_err();
    assert_eq!(err.kind(), &ParsingErrorKind::UnexpectedEof);
}

#[test]
fn test_unbalanced_parentheses() {
    let err = parse_str("((A,B);").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::InvalidNewickString(_)));
}

#[test]
fn test_invalid_branch_length() {
    let err = parse_str("(A:x,B);").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::InvalidNewickString(_)));
    assert_eq!(err.position(), 3);
}

// --- TESTS WRITING ---
#[test]
fn test_to_newick() {
    let tree = parse_str("((A:1,B:2)AB:0.5,'C D':1.5)root;").unwrap();
    assert_eq!(to_newick(&tree), "((A:1,B:2)AB:0.5,'C D':1.5)root;");
    assert_eq!(tree.to_newick(), to_newick(&tree));
}

#[test]
fn test_round_trip() {
    let newick = "(((Pukeko:0.01,'Baillon''s Crake':0.25)Rallidae:1e-3,Takahe:0.5)x:0.125,Weka:2,(Tui,Kaka):0);";
    let tree = parse_str(newick).unwrap();
    let again = parse_str(to_newick(&tree)).unwrap();
    assert_eq!(structure(&tree), structure(&again));
}

#[test]
fn test_file_round_trip() {
    let tree = parse_str("((A:1,B:2):0.5,C:1.5);").unwrap();
    let file = NamedTempFile::new().unwrap();
    write_newick_file(file.reopen().unwrap(), std::slice::from_ref(&tree)).unwrap();

    let again = parse_file(file.path()).unwrap();
    assert_eq!(structure(&tree), structure(&again));
}

#[test]
fn test_parse_file_missing() {
    let err = parse_file("does/not/exist.nwk").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::IoError(_)));
}

#[test]
fn test_parse_file_with_comments() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[reference tree]").unwrap();
    writeln!(file, "((A:1,B:1):1,C:2);").unwrap();
    let tree = parse_file(file.path()).unwrap();
    assert_eq!(tree.leaves().count(), 3);
}
