use indexmap::IndexMap;
use log::{debug, trace};

use crate::grammar::{Grammar, SymbolId};

use super::{
    error::GeneratorError,
    fsa::Fsa,
    item::{Item, ItemRef},
    item_set::ItemSet,
    state::StateIdx,
    transition::{Lookahead, Transition},
    TableGenerator,
};

enum Pending {
    Accept(usize),
    Reduce(usize),
    Advance { position: usize, group: usize },
}

/// Builds the LR(0) automaton and rejects any grammar that leaves a conflict in it.
pub struct LrGenerator<'g> {
    grammar: &'g Grammar,
    fsa: Fsa,
}

impl<'g> LrGenerator<'g> {
    pub fn new(grammar: &'g Grammar) -> LrGenerator<'g> {
        LrGenerator {
            grammar,
            fsa: Fsa::new(),
        }
    }

    pub fn fsa_mut(&mut self) -> &mut Fsa {
        &mut self.fsa
    }

    pub fn into_fsa(self) -> Fsa {
        self.fsa
    }

    /// Resets the automaton to a single state: the closure of the start rules.
    pub fn init_fsa(&mut self) -> Result<(), GeneratorError> {
        let grammar = self.grammar;
        let mut item_set = ItemSet::new();
        for rule in grammar.rules_by_left_symbol(grammar.start_symbol()) {
            item_set.add_item(Item::new(grammar, *rule, 0)?);
        }
        item_set.close(grammar);

        self.fsa = Fsa::new();
        self.fsa.add_state(item_set);
        Ok(())
    }

    /// Visits states in creation order, adding successor states and the
    /// transitions to them until no new state appears.
    pub fn populate_fsa(&mut self) -> Result<(), GeneratorError> {
        let grammar = self.grammar;
        let reduce_symbols: Vec<SymbolId> = grammar
            .terminals()
            .chain(std::iter::once(grammar.end_marker()))
            .collect();

        let mut i = 0;
        while i < self.fsa.state_count() {
            let state_idx = StateIdx::new(i);
            let items: Vec<Item> = self.fsa.state(state_idx)?.item_set().items().to_vec();

            // successor kernels, grouped by the symbol after the dot in first-seen order
            let mut groups: IndexMap<SymbolId, ItemSet> = IndexMap::new();
            let mut pending: Vec<Pending> = Vec::with_capacity(items.len());

            for (position, item) in items.iter().enumerate() {
                let left = grammar.rule(item.rule()).left();
                if item.is_at_end(grammar) && left == grammar.start_symbol() {
                    pending.push(Pending::Accept(position));
                } else if let (Some(symbol), Some(next)) =
                    (item.symbol(grammar), item.advance(grammar))
                {
                    let entry = groups.entry(symbol);
                    let group = entry.index();
                    entry.or_default().add_item(next);
                    pending.push(Pending::Advance { position, group });
                } else if item.is_reduceable(grammar) {
                    pending.push(Pending::Reduce(position));
                }
            }

            let mut targets: Vec<(SymbolId, StateIdx)> = Vec::with_capacity(groups.len());
            for (symbol, mut item_set) in groups {
                item_set.close(grammar);
                targets.push((symbol, self.fsa.add_state(item_set)));
            }

            let state = self.fsa.state_mut(state_idx)?;
            for p in pending {
                match p {
                    Pending::Accept(position) => {
                        state.add_transition(Transition::Accept {
                            origin: ItemRef::new(state_idx, position),
                            symbol: grammar.end_marker(),
                        });
                    }
                    Pending::Reduce(position) => {
                        for symbol in &reduce_symbols {
                            state.add_transition(Transition::Reduce {
                                origin: ItemRef::new(state_idx, position),
                                symbol: *symbol,
                                lookahead: Lookahead::none(),
                            });
                        }
                    }
                    Pending::Advance { position, group } => {
                        let (symbol, target) = targets[group];
                        let origin = ItemRef::new(state_idx, position);
                        let transition = if grammar.symbol(symbol).is_terminal() {
                            Transition::Shift {
                                origin,
                                symbol,
                                target,
                                lookahead: Lookahead::none(),
                            }
                        } else {
                            Transition::Goto {
                                origin,
                                symbol,
                                target,
                            }
                        };
                        state.add_transition(transition);
                    }
                }
            }

            trace!(
                "state {}: {} items, {} transitions",
                i,
                items.len(),
                state.transitions().len()
            );
            i += 1;
        }

        debug!("LR(0) automaton has {} states", self.fsa.state_count());
        Ok(())
    }
}

impl<'g> TableGenerator<'g> for LrGenerator<'g> {
    fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    fn fsa(&self) -> &Fsa {
        &self.fsa
    }

    fn build_fsa(&mut self) -> Result<(), GeneratorError> {
        self.init_fsa()?;
        self.populate_fsa()
    }

    fn guarantee_conflictless(&mut self) -> Result<(), GeneratorError> {
        self.fsa.guarantee_conflictless(self.grammar)
    }
}
