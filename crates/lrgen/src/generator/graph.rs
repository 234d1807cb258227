use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::grammar::Grammar;

use super::{fsa::Fsa, transition::Transition};

/// Automaton as a petgraph graph for rendering with `petgraph::dot`.
///
/// Nodes are labelled with the state number and its items, edges with the
/// symbol of the shift or goto. Accepting states get an edge to an extra
/// `accept` node.
pub fn fsa_to_graph(fsa: &Fsa, grammar: &Grammar) -> DiGraph<String, String> {
    let mut graph: DiGraph<String, String> = DiGraph::new();
    let mut node_to_index: HashMap<usize, NodeIndex> = HashMap::new();

    for state in fsa.states() {
        let label = format!("{}\n{}", state.idx().index(), state.item_set().display(grammar));
        let index = graph.add_node(label);
        node_to_index.insert(state.idx().index(), index);
    }

    let mut accept_node = None;
    for state in fsa.states() {
        let from = node_to_index[&state.idx().index()];
        for transition in state.transitions() {
            match transition {
                Transition::Shift { symbol, target, .. }
                | Transition::Goto { symbol, target, .. } => {
                    let to = node_to_index[&target.index()];
                    let label = grammar.symbol_name(*symbol).to_string();
                    if graph.edges_connecting(from, to).all(|edge| *edge.weight() != label) {
                        graph.add_edge(from, to, label);
                    }
                }
                Transition::Accept { symbol, .. } => {
                    let to = *accept_node
                        .get_or_insert_with(|| graph.add_node("accept".to_string()));
                    graph.add_edge(from, to, grammar.symbol_name(*symbol).to_string());
                }
                Transition::Reduce { .. } => {}
            }
        }
    }

    graph
}

impl Fsa {
    pub fn to_graph(&self, grammar: &Grammar) -> DiGraph<String, String> {
        fsa_to_graph(self, grammar)
    }
}
