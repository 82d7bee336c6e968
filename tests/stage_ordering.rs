//! Scheduler integration: ordering annotator stages by layer dependencies.
//!
//! Mirrors how an orchestrator wires real stage configurations (a
//! standardizer, lexical taggers, a forced aligner) into the generic
//! resolver and runs them in the resulting order.

use pretty_assertions::assert_eq;

use tiergraph::schedule::{execution_order, DependencyGraph, StageRegistration};

fn names(order: Vec<&StageRegistration>) -> Vec<&str> {
    order.iter().map(|stage| stage.name.as_str()).collect()
}

#[test]
fn three_stage_chain_resolves_bottom_up() {
    // A requires layer "x" (produced by B); B requires "y" (produced by C)
    let stages = vec![
        StageRegistration::new("A").requires("x"),
        StageRegistration::new("B").requires("y").outputs("x"),
        StageRegistration::new("C").outputs("y"),
    ];
    assert_eq!(names(execution_order(&stages).unwrap()), vec!["C", "B", "A"]);
}

#[test]
fn acyclic_order_is_a_valid_permutation() {
    let stages = vec![
        StageRegistration::new("aligner")
            .requires("word")
            .requires("orthography")
            .requires("utterance")
            .requires("phonology")
            .outputs("segment"),
        StageRegistration::new("standardizer").requires("word").outputs("orthography"),
        StageRegistration::new("celex").requires("orthography").outputs("phonology"),
        StageRegistration::new("mapper").requires("segment").outputs("arpabet"),
    ];

    let order = names(execution_order(&stages).unwrap());
    assert_eq!(order.len(), stages.len());
    let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
    // for every edge (n depends on d), d appears before n
    assert!(position("standardizer") < position("aligner"));
    assert!(position("standardizer") < position("celex"));
    assert!(position("celex") < position("aligner"));
    assert!(position("aligner") < position("mapper"));
}

#[test]
fn cycle_is_reported_with_its_membership() {
    let stages = vec![
        StageRegistration::new("A").requires("x").outputs("y"),
        StageRegistration::new("B").requires("y").outputs("x"),
    ];
    let err = execution_order(&stages).unwrap_err();
    assert!(err.path.len() >= 3);
    assert_eq!(err.path.first(), err.path.last());
    assert!(err.to_string().contains("circular dependency"));
}

#[test]
fn resolver_is_reusable_across_threads() {
    // one graph, resolved concurrently: the resolver takes &self only
    let mut graph = DependencyGraph::new();
    let a = graph.add("a".to_string());
    let b = graph.add("b".to_string());
    let c = graph.add("c".to_string());
    graph.depends_on(a, b);
    graph.depends_on(b, c);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let order: Vec<String> =
                        graph.resolve().unwrap().into_iter().cloned().collect();
                    order
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec!["c", "b", "a"]);
        }
    });
}
