use lrgen_util::make_type_idx;

use super::{error::GeneratorError, item_set::ItemSet, transition::Transition};

make_type_idx!(pub StateIdx, State);

#[derive(Clone, Debug)]
pub struct State {
    idx: StateIdx,
    item_set: ItemSet,
    transitions: Vec<Transition>,
}

impl State {
    pub fn new(idx: StateIdx, item_set: ItemSet) -> State {
        State {
            idx,
            item_set,
            transitions: Vec::new(),
        }
    }

    pub fn idx(&self) -> StateIdx {
        self.idx
    }

    pub fn item_set(&self) -> &ItemSet {
        &self.item_set
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transition(&self, index: usize) -> Result<&Transition, GeneratorError> {
        self.transitions
            .get(index)
            .ok_or(GeneratorError::InvalidTransition {
                state: self.idx.index(),
                index,
            })
    }

    pub fn transition_mut(&mut self, index: usize) -> Result<&mut Transition, GeneratorError> {
        let state = self.idx.index();
        self.transitions
            .get_mut(index)
            .ok_or(GeneratorError::InvalidTransition { state, index })
    }

    /// Returns false if an equal transition is already present.
    pub fn add_transition(&mut self, transition: Transition) -> bool {
        if self.transitions.contains(&transition) {
            return false;
        }
        self.transitions.push(transition);
        true
    }

    pub fn remove_transition(&mut self, index: usize) -> Result<Transition, GeneratorError> {
        if index >= self.transitions.len() {
            return Err(GeneratorError::InvalidTransition {
                state: self.idx.index(),
                index,
            });
        }
        Ok(self.transitions.remove(index))
    }

    pub fn remove_transition_equal_to(&mut self, transition: &Transition) -> bool {
        match self.transitions.iter().position(|t| t == transition) {
            Some(index) => {
                self.transitions.remove(index);
                true
            }
            None => false,
        }
    }

    /// First pair of conflicting transitions, in index order.
    pub fn find_conflict(&self) -> Option<(usize, usize)> {
        for (i, a) in self.transitions.iter().enumerate() {
            for (j, b) in self.transitions.iter().enumerate().skip(i + 1) {
                if a.conflicts_with(b) {
                    return Some((i, j));
                }
            }
        }
        None
    }
}
