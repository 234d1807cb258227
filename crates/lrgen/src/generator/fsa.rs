use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use bit_set::BitSet;
use log::trace;

use crate::grammar::{Grammar, SymbolId, SymbolSet};

use super::{
    error::{ConflictReport, GeneratorError},
    item::{Item, ItemRef},
    item_set::ItemSet,
    state::{State, StateIdx},
    transition::{Lookahead, Transition},
};

/// The LR automaton: a list of states, each an item set plus its transitions.
///
/// Item-level first sets and nonterminal follow sets are derived from the
/// items present in the automaton and cached until a new state is added.
#[derive(Debug, Default)]
pub struct Fsa {
    states: Vec<State>,
    index: HashMap<Vec<Item>, StateIdx>,
    first_sets: HashMap<ItemRef, SymbolSet>,
    follow: Option<Vec<SymbolSet>>,
}

impl Fsa {
    pub fn new() -> Fsa {
        Fsa::default()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, idx: StateIdx) -> Result<&State, GeneratorError> {
        self.states
            .get(idx.index())
            .ok_or(GeneratorError::InvalidState(idx.index()))
    }

    pub fn state_mut(&mut self, idx: StateIdx) -> Result<&mut State, GeneratorError> {
        self.states
            .get_mut(idx.index())
            .ok_or(GeneratorError::InvalidState(idx.index()))
    }

    /// Adds a state for `item_set` unless one with the same items exists.
    /// Either way, returns the index of the state holding those items.
    pub fn add_state(&mut self, item_set: ItemSet) -> StateIdx {
        let key = item_set.key();
        if let Some(idx) = self.index.get(&key) {
            return *idx;
        }

        let idx = StateIdx::new(self.states.len());
        self.states.push(State::new(idx, item_set));
        self.index.insert(key, idx);
        self.first_sets.clear();
        self.follow = None;
        idx
    }

    pub fn state_index(&self, item_set: &ItemSet) -> Result<StateIdx, GeneratorError> {
        self.index
            .get(&item_set.key())
            .copied()
            .ok_or(GeneratorError::StateNotFound)
    }

    pub fn state_exists(&self, item_set: &ItemSet) -> bool {
        self.index.contains_key(&item_set.key())
    }

    pub fn item(&self, item_ref: ItemRef) -> Result<Item, GeneratorError> {
        self.state(item_ref.state)?
            .item_set()
            .item(item_ref.position)
            .ok_or(GeneratorError::InvalidItemRef {
                state: item_ref.state.index(),
                position: item_ref.position,
            })
    }

    /// First occurrence of `item` in the automaton.
    pub fn item_equal_to(&self, grammar: &Grammar, item: &Item) -> Result<ItemRef, GeneratorError> {
        for state in &self.states {
            if let Some(position) = state.item_set().item_index(item) {
                return Ok(ItemRef::new(state.idx(), position));
            }
        }
        Err(GeneratorError::ItemNotFound(item.display(grammar).to_string()))
    }

    /// Every item in the automaton whose dot directly follows `symbol`.
    pub fn items_by_previous_symbol(&self, grammar: &Grammar, symbol: SymbolId) -> Vec<ItemRef> {
        self.states
            .iter()
            .flat_map(|state| {
                state
                    .item_set()
                    .items_by_previous_symbol(grammar, symbol)
                    .map(move |(position, _)| ItemRef::new(state.idx(), position))
            })
            .collect()
    }

    fn distinct_items(&self) -> BTreeSet<Item> {
        self.states
            .iter()
            .flat_map(|state| state.item_set().items().iter().copied())
            .collect()
    }

    // first set of what follows the dot, continuing into the follow set of
    // the rule's left side when that remainder is nullable
    fn item_first_set(grammar: &Grammar, item: Item, follow: &[SymbolSet]) -> SymbolSet {
        let rule = grammar.rule(item.rule());
        let (mut set, nullable) = grammar.sequence_first_set(&rule.right()[item.dot()..]);
        if nullable {
            if rule.left() == grammar.start_symbol() {
                set.add_symbol(grammar.end_marker());
            } else if let Some(left_follow) = follow.get(rule.left().index()) {
                set.union(left_follow);
            }
        }
        set
    }

    fn compute_nonterminal_follow(&self, grammar: &Grammar) -> Vec<SymbolSet> {
        let items: Vec<(SymbolId, Item)> = self
            .distinct_items()
            .into_iter()
            .filter_map(|item| {
                item.previous_symbol(grammar)
                    .filter(|symbol| grammar.symbol(*symbol).is_nonterminal())
                    .map(|symbol| (symbol, item))
            })
            .collect();

        let mut follow = vec![SymbolSet::new(); grammar.symbol_count()];
        loop {
            let mut changed = false;
            for (symbol, item) in &items {
                let set = Self::item_first_set(grammar, *item, &follow);
                changed |= follow[symbol.index()].union(&set);
            }

            if !changed {
                break;
            }
        }

        trace!("computed follow sets over {} items", items.len());
        follow
    }

    fn ensure_follow(&mut self, grammar: &Grammar) {
        if self.follow.is_none() {
            self.follow = Some(self.compute_nonterminal_follow(grammar));
        }
    }

    /// Terminals that can come right after `symbol` in a sentential form.
    pub fn nonterminal_follow(&mut self, grammar: &Grammar, symbol: SymbolId) -> SymbolSet {
        self.ensure_follow(grammar);
        self.follow
            .as_ref()
            .and_then(|follow| follow.get(symbol.index()))
            .cloned()
            .unwrap_or_default()
    }

    /// Terminals that can be the next input symbol at the dot of the item.
    pub fn first_set(
        &mut self,
        grammar: &Grammar,
        item_ref: ItemRef,
    ) -> Result<SymbolSet, GeneratorError> {
        if let Some(set) = self.first_sets.get(&item_ref) {
            return Ok(set.clone());
        }

        let item = self.item(item_ref)?;
        self.ensure_follow(grammar);
        let set = Self::item_first_set(grammar, item, self.follow.as_deref().unwrap_or(&[]));
        self.first_sets.insert(item_ref, set.clone());
        Ok(set)
    }

    /// Terminals that can come after the symbol at the dot of the item.
    pub fn follow_set(
        &mut self,
        grammar: &Grammar,
        item_ref: ItemRef,
    ) -> Result<SymbolSet, GeneratorError> {
        let item = self.item(item_ref)?;
        let left = grammar.rule(item.rule()).left();

        let item_set = self.state(item_ref.state)?.item_set();
        if item.dot() == 0 && !item_set.is_kernel(item_ref.position) {
            // a closure item follows whatever follows the item that introduced it
            let introducer = item_set.items()[..item_ref.position]
                .iter()
                .position(|x| x.symbol(grammar) == Some(left));
            return match introducer {
                Some(position) => self.follow_set(grammar, ItemRef::new(item_ref.state, position)),
                None => Err(GeneratorError::Inconsistent(item.display(grammar).to_string())),
            };
        }

        match item.advance(grammar) {
            None => Ok(self.nonterminal_follow(grammar, left)),
            Some(next) => {
                let next_ref = self.item_equal_to(grammar, &next)?;
                self.first_set(grammar, next_ref)
            }
        }
    }

    /// Lookahead of a shift: what may follow the shifted symbol.
    pub fn shift_lookahead(
        &mut self,
        grammar: &Grammar,
        origin: ItemRef,
    ) -> Result<Lookahead, GeneratorError> {
        let item = self.item(origin)?;
        let next = item.advance(grammar).ok_or(GeneratorError::InvalidItem {
            rule: item.rule().index(),
            dot: item.dot() + 1,
            len: grammar.rule(item.rule()).right_len(),
        })?;
        let next_ref = self.item_equal_to(grammar, &next)?;
        Ok(Lookahead::from_set(self.first_set(grammar, next_ref)?))
    }

    /// Lookahead of a reduction to `left` triggered by `trigger`: the
    /// symbols that can follow `trigger` once `left` has been pushed.
    ///
    /// Walks the items where `left` was just recognized, and through nullable
    /// tails into the items of their own left sides. If `trigger` can be
    /// produced inside a nonterminal the position is left unconstrained.
    pub fn reduce_lookahead(
        &mut self,
        grammar: &Grammar,
        left: SymbolId,
        trigger: SymbolId,
    ) -> Lookahead {
        if trigger == grammar.end_marker() {
            return Lookahead::none();
        }

        self.ensure_follow(grammar);
        let follow = self.follow.as_deref().unwrap_or(&[]);
        let items = self.distinct_items();

        let mut result = SymbolSet::new();
        let mut unconstrained = false;
        let mut visited = BitSet::new();
        visited.insert(left.index());
        let mut pending = vec![left];

        while let Some(nonterminal) = pending.pop() {
            for item in items
                .iter()
                .filter(|item| item.previous_symbol(grammar) == Some(nonterminal))
            {
                let rule = grammar.rule(item.rule());
                let mut reached_end = true;
                for (position, symbol) in rule.right().iter().enumerate().skip(item.dot()) {
                    if grammar.symbol(*symbol).is_terminal() {
                        if *symbol == trigger {
                            let after = Item::at(item.rule(), position + 1);
                            result.union(&Self::item_first_set(grammar, after, follow));
                        }
                        reached_end = false;
                        break;
                    }

                    if grammar.symbol_first_set(*symbol).contains(trigger) {
                        unconstrained = true;
                    }
                    if !grammar.is_symbol_nullable(*symbol) {
                        reached_end = false;
                        break;
                    }
                }

                if reached_end
                    && rule.left() != grammar.start_symbol()
                    && visited.insert(rule.left().index())
                {
                    pending.push(rule.left());
                }
            }
        }

        if unconstrained {
            Lookahead::none()
        } else {
            Lookahead::from_set(result)
        }
    }

    /// Computes and stores the lookahead of a shift or reduce transition.
    /// Other transitions are left untouched.
    pub fn compute_lookahead(
        &mut self,
        grammar: &Grammar,
        state: StateIdx,
        index: usize,
    ) -> Result<(), GeneratorError> {
        let transition = self.state(state)?.transition(index)?.clone();
        let lookahead = match transition {
            Transition::Shift { origin, .. } => self.shift_lookahead(grammar, origin)?,
            Transition::Reduce { origin, symbol, .. } => {
                let left = grammar.rule(self.item(origin)?.rule()).left();
                self.reduce_lookahead(grammar, left, symbol)
            }
            Transition::Goto { .. } | Transition::Accept { .. } => return Ok(()),
        };

        self.state_mut(state)?
            .transition_mut(index)?
            .set_lookahead(lookahead);
        Ok(())
    }

    fn conflict_error(
        &self,
        grammar: &Grammar,
        state: &State,
        i: usize,
        j: usize,
    ) -> GeneratorError {
        let first = &state.transitions()[i];
        let second = &state.transitions()[j];
        GeneratorError::Conflict(Box::new(ConflictReport {
            kind: first.conflict_kind(second),
            state: state.idx().index(),
            first: first.display(self, grammar).to_string(),
            second: second.display(self, grammar).to_string(),
            item_set: state.item_set().display(grammar).to_string(),
            grammar: grammar.to_string(),
        }))
    }

    /// Fails with the first conflicting pair of transitions found.
    pub fn guarantee_conflictless(&self, grammar: &Grammar) -> Result<(), GeneratorError> {
        for state in &self.states {
            if let Some((i, j)) = state.find_conflict() {
                return Err(self.conflict_error(grammar, state, i, j));
            }
        }
        Ok(())
    }

    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> FsaDisplay<'a> {
        FsaDisplay { fsa: self, grammar }
    }
}

pub struct FsaDisplay<'a> {
    fsa: &'a Fsa,
    grammar: &'a Grammar,
}

impl fmt::Display for FsaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in &self.fsa.states {
            writeln!(f, "state {}:", state.idx().index())?;
            write!(f, "{}", state.item_set().display(self.grammar))?;
            for transition in state.transitions() {
                writeln!(f, "    {}", transition.display(self.fsa, self.grammar))?;
            }
        }
        Ok(())
    }
}
