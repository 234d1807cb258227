use lrgen::{
    generator::{LalrGenerator, TableGenerator},
    grammar::Grammar,
};
use petgraph::dot::{Config, Dot};

#[test]
fn fsa_graph_follows_shifts_and_gotos() {
    let grammar = Grammar::from_bnf("S ::= ( S ) | x").unwrap();
    let mut generator = LalrGenerator::new(&grammar);
    generator.build_fsa().unwrap();
    generator.guarantee_conflictless().unwrap();

    let fsa = generator.fsa();
    println!("{}", fsa.display(&grammar));

    let graph = fsa.to_graph(&grammar);
    // one node per state plus the accept node
    assert_eq!(graph.node_count(), fsa.state_count() + 1);
    // start: S ( x, after (: S ( x, after ( S: ), accept
    assert_eq!(graph.edge_count(), 8);

    let dot = format!("{:?}", Dot::with_config(&graph, &[]));
    println!("{}", dot);
    assert!(dot.contains("accept"));
    assert!(dot.contains("S -> ( • S )"));

    let plain = format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]));
    assert_ne!(plain, dot);
}
