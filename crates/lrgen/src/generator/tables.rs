use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::grammar::{Grammar, RuleIdx, SymbolSet};

use super::{error::GeneratorError, fsa::Fsa, transition::Transition};

/// Entry of the action table.
///
/// A `Lookahead` entry defers the decision to the next input symbol;
/// `wildcard` applies when that symbol has no entry of its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Accept,
    Shift {
        next_state: usize,
    },
    Reduce {
        rule: usize,
        left: String,
        symbols: Vec<Option<String>>,
    },
    Lookahead {
        table: BTreeMap<String, Action>,
        wildcard: Option<Box<Action>>,
    },
}

pub type ActionRow = BTreeMap<String, Action>;

// states = rows, terminal names = columns
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTable {
    rows: Vec<ActionRow>,
}

// states = rows, nonterminal names = columns
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GotoTable {
    rows: Vec<BTreeMap<String, usize>>,
}

/// What the runtime needs to perform a reduction by one rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionDescriptor {
    pub rule: usize,
    pub left: String,
    pub right: Vec<String>,
    pub symbols: Vec<Option<String>>,
    pub action: Option<String>,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseTables {
    pub action: ActionTable,
    pub goto: GotoTable,
    pub reductions: Vec<ReductionDescriptor>,
}

impl GotoTable {
    pub fn from_fsa(fsa: &Fsa, grammar: &Grammar) -> GotoTable {
        let rows = fsa
            .states()
            .iter()
            .map(|state| {
                state
                    .transitions()
                    .iter()
                    .filter_map(|transition| match transition {
                        Transition::Goto { symbol, target, .. } => {
                            Some((grammar.symbol_name(*symbol).to_string(), target.index()))
                        }
                        _ => None,
                    })
                    .collect()
            })
            .collect();

        GotoTable { rows }
    }

    pub fn get(&self, state: usize, nonterminal: &str) -> Option<usize> {
        self.rows.get(state)?.get(nonterminal).copied()
    }

    pub fn row(&self, state: usize) -> Option<&BTreeMap<String, usize>> {
        self.rows.get(state)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ActionTable {
    /// Accepts go in first, then shifts, then reduces. Within each state the
    /// automaton is conflict free, so an entry is never replaced by a
    /// different action.
    pub fn from_fsa(fsa: &Fsa, grammar: &Grammar) -> Result<ActionTable, GeneratorError> {
        let mut rows = Vec::with_capacity(fsa.state_count());

        for state in fsa.states() {
            let mut row = ActionRow::new();

            for transition in state.transitions() {
                if let Transition::Accept { symbol, .. } = transition {
                    add_action(
                        &mut row,
                        grammar.symbol_name(*symbol),
                        &[],
                        &Action::Accept,
                        grammar,
                    );
                }
            }

            for transition in state.transitions() {
                if let Transition::Shift {
                    symbol,
                    target,
                    lookahead,
                    ..
                } = transition
                {
                    let action = Action::Shift {
                        next_state: target.index(),
                    };
                    add_action(
                        &mut row,
                        grammar.symbol_name(*symbol),
                        lookahead.positions(),
                        &action,
                        grammar,
                    );
                }
            }

            for transition in state.transitions() {
                if let Transition::Reduce {
                    origin,
                    symbol,
                    lookahead,
                } = transition
                {
                    let rule_idx = fsa.item(*origin)?.rule();
                    let rule = grammar.rule(rule_idx);
                    let action = Action::Reduce {
                        rule: rule_idx.index(),
                        left: grammar.symbol_name(rule.left()).to_string(),
                        symbols: rule.bindings().to_vec(),
                    };
                    add_action(
                        &mut row,
                        grammar.symbol_name(*symbol),
                        lookahead.positions(),
                        &action,
                        grammar,
                    );
                }
            }

            rows.push(row);
        }

        Ok(ActionTable { rows })
    }

    pub fn get(&self, state: usize, terminal: &str) -> Option<&Action> {
        self.rows.get(state)?.get(terminal)
    }

    pub fn row(&self, state: usize) -> Option<&ActionRow> {
        self.rows.get(state)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn empty_lookahead_cell() -> Action {
    Action::Lookahead {
        table: BTreeMap::new(),
        wildcard: None,
    }
}

fn add_action(
    row: &mut ActionRow,
    symbol: &str,
    lookahead: &[SymbolSet],
    action: &Action,
    grammar: &Grammar,
) {
    let Some((next, rest)) = lookahead.split_first() else {
        match row.get_mut(symbol) {
            Some(Action::Lookahead { wildcard, .. }) => {
                if wildcard.is_none() {
                    *wildcard = Some(Box::new(action.clone()));
                }
            }
            Some(_) => {}
            None => {
                row.insert(symbol.to_string(), action.clone());
            }
        }
        return;
    };

    let cell = row
        .entry(symbol.to_string())
        .or_insert_with(empty_lookahead_cell);
    if !matches!(cell, Action::Lookahead { .. }) {
        // a plain action already here becomes the fallback of the new cell
        let plain = std::mem::replace(cell, empty_lookahead_cell());
        if let Action::Lookahead { wildcard, .. } = cell {
            *wildcard = Some(Box::new(plain));
        }
    }

    if let Action::Lookahead { table, .. } = cell {
        for lookahead_symbol in next.iter() {
            add_action(table, grammar.symbol_name(lookahead_symbol), rest, action, grammar);
        }
    }
}

impl ReductionDescriptor {
    fn new(grammar: &Grammar, idx: RuleIdx) -> ReductionDescriptor {
        let rule = grammar.rule(idx);
        ReductionDescriptor {
            rule: idx.index(),
            left: grammar.symbol_name(rule.left()).to_string(),
            right: rule
                .right()
                .iter()
                .map(|s| grammar.symbol_name(*s).to_string())
                .collect(),
            symbols: rule.bindings().to_vec(),
            action: rule.action().map(str::to_string),
            text: rule.display(grammar).to_string(),
        }
    }

    /// One descriptor per rule some state reduces by, in order of first appearance.
    pub fn from_fsa(
        fsa: &Fsa,
        grammar: &Grammar,
    ) -> Result<Vec<ReductionDescriptor>, GeneratorError> {
        let mut seen: HashSet<RuleIdx> = HashSet::new();
        let mut reductions = Vec::new();
        for state in fsa.states() {
            for transition in state.transitions() {
                if let Transition::Reduce { origin, .. } = transition {
                    let idx = fsa.item(*origin)?.rule();
                    if seen.insert(idx) {
                        reductions.push(ReductionDescriptor::new(grammar, idx));
                    }
                }
            }
        }
        Ok(reductions)
    }
}

impl ParseTables {
    pub fn from_fsa(fsa: &Fsa, grammar: &Grammar) -> Result<ParseTables, GeneratorError> {
        Ok(ParseTables {
            action: ActionTable::from_fsa(fsa, grammar)?,
            goto: GotoTable::from_fsa(fsa, grammar),
            reductions: ReductionDescriptor::from_fsa(fsa, grammar)?,
        })
    }
}

impl Fsa {
    pub fn goto_table(&self, grammar: &Grammar) -> GotoTable {
        GotoTable::from_fsa(self, grammar)
    }

    pub fn action_table(&self, grammar: &Grammar) -> Result<ActionTable, GeneratorError> {
        ActionTable::from_fsa(self, grammar)
    }

    pub fn reductions(
        &self,
        grammar: &Grammar,
    ) -> Result<Vec<ReductionDescriptor>, GeneratorError> {
        ReductionDescriptor::from_fsa(self, grammar)
    }
}
