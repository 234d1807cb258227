use std::fmt;

use thiserror::Error;

use crate::grammar::GrammarError;

use super::transition::ConflictKind;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error("cannot put the dot at position {dot} of rule {rule}, which has {len} symbols")]
    InvalidItem { rule: usize, dot: usize, len: usize },
    #[error("state {0} does not exist")]
    InvalidState(usize),
    #[error("transition {index} does not exist in state {state}")]
    InvalidTransition { state: usize, index: usize },
    #[error("item {position} does not exist in state {state}")]
    InvalidItemRef { state: usize, position: usize },
    #[error("no state has the requested item set")]
    StateNotFound,
    #[error("no state contains the item `{0}`")]
    ItemNotFound(String),
    #[error("closure item `{0}` has no item introducing it in its state")]
    Inconsistent(String),
    #[error("{0}")]
    Conflict(Box<ConflictReport>),
}

/// Everything needed to explain why a grammar is not accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictReport {
    pub kind: ConflictKind,
    pub state: usize,
    pub first: String,
    pub second: String,
    pub item_set: String,
    pub grammar: String,
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} conflict in state {}", self.kind, self.state)?;
        writeln!(f, "  {}", self.first)?;
        writeln!(f, "  {}", self.second)?;
        writeln!(f, "items:")?;
        write!(f, "{}", self.item_set)?;
        writeln!(f, "grammar:")?;
        write!(f, "{}", self.grammar)
    }
}
