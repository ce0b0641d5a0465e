#![allow(clippy::unwrap_used)]

use std::thread;

use pluto_syntax::{Language, Parser, Tree, parse_batch};

use crate::helpers::fixtures::CALC_PROGRAM;
use crate::helpers::languages::calc;
use crate::helpers::{fingerprint, parse};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_shared_types_are_thread_safe() {
    assert_send_sync::<Language>();
    assert_send_sync::<Tree>();
    fn assert_send<T: Send>() {}
    assert_send::<Parser>();
}

#[test]
fn test_one_language_many_parsers() {
    let language = calc();
    let expected = fingerprint(&parse(&language, CALC_PROGRAM.as_bytes()));

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let language = &language;
                scope.spawn(move || {
                    let mut parser = Parser::new();
                    parser.set_language(language).unwrap();
                    let tree = parser.parse(CALC_PROGRAM.as_bytes(), None).unwrap();
                    fingerprint(&tree)
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_trees_are_read_concurrently() {
    let language = calc();
    let tree = parse(&language, CALC_PROGRAM.as_bytes());
    let copy = tree.clone();

    thread::scope(|scope| {
        let a = scope.spawn(|| tree.root_node().to_sexp());
        let b = scope.spawn(|| copy.root_node().to_sexp());
        assert_eq!(a.join().unwrap(), b.join().unwrap());
    });
}

#[test]
fn test_tree_moves_to_another_thread_for_reparse() {
    let language = calc();
    let old_text = b"a = 1;\nb = 2;\n".to_vec();
    let tree = parse(&language, &old_text);

    let reparsed = thread::spawn(move || {
        let edit = pluto_syntax::InputEdit::new(&old_text, 4, 5, b"3");
        let new_text = edit.apply(&old_text, b"3");
        let mut tree = tree;
        tree.edit(&edit);
        let mut parser = Parser::new();
        parser.set_language(tree.language()).unwrap();
        parser.parse(&new_text, Some(&tree)).unwrap()
    })
    .join()
    .unwrap();
    assert!(!reparsed.has_error());
}

#[test]
fn test_batch_matches_sequential() {
    let language = calc();
    let inputs: Vec<String> = (0..32)
        .map(|i| format!("x{i} = {i} * (y + {i});\nf(x{i});\n"))
        .chain(["broken = ;".to_string(), String::new()])
        .collect();

    let trees = parse_batch(&language, &inputs);
    assert_eq!(trees.len(), inputs.len());
    for (input, tree) in inputs.iter().zip(trees) {
        let tree = tree.unwrap();
        assert_eq!(fingerprint(&tree), fingerprint(&parse(&language, input.as_bytes())));
    }
}
