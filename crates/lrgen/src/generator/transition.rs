use std::fmt;

use crate::grammar::{Grammar, SymbolId, SymbolSet};

use super::{fsa::Fsa, item::ItemRef, state::StateIdx};

/// Sequence of symbol sets describing the input that must follow the
/// triggering symbol for a transition to apply. Position `i` constrains the
/// `i`-th symbol after the trigger; an empty sequence accepts any input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lookahead(Vec<SymbolSet>);

static NO_LOOKAHEAD: Lookahead = Lookahead(Vec::new());

impl Lookahead {
    pub fn none() -> Lookahead {
        Lookahead(Vec::new())
    }

    pub fn new(positions: Vec<SymbolSet>) -> Lookahead {
        Lookahead(positions)
    }

    /// Lookahead of a single position, or no lookahead if `set` is empty.
    pub fn from_set(set: SymbolSet) -> Lookahead {
        if set.is_empty() {
            Lookahead::none()
        } else {
            Lookahead(vec![set])
        }
    }

    pub fn positions(&self) -> &[SymbolSet] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if some position present in both lookaheads shares no symbol,
    /// meaning no input can satisfy both.
    pub fn is_disjoint_with(&self, other: &Lookahead) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .any(|(a, b)| a.is_disjoint(b))
    }

    /// Drops the input `other` claims from this lookahead. A missing first
    /// position is treated as "any input symbol" before subtracting.
    pub fn remove_common_with(&mut self, other: &Lookahead, grammar: &Grammar) {
        let Some(claimed) = other.0.first() else {
            return;
        };
        if self.0.is_empty() {
            self.0.push(grammar.terminal_set());
        }
        self.0[0].complement(claimed);
    }

    /// A lookahead with an empty position can never match.
    pub fn is_dead(&self) -> bool {
        self.0.iter().any(SymbolSet::is_empty)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> LookaheadDisplay<'a> {
        LookaheadDisplay {
            lookahead: self,
            grammar,
        }
    }
}

pub struct LookaheadDisplay<'a> {
    lookahead: &'a Lookahead,
    grammar: &'a Grammar,
}

impl fmt::Display for LookaheadDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, set) in self.lookahead.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", set.display(self.grammar))?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Shift,
    Goto,
    Reduce,
    Accept,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    Strange,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::ShiftReduce => write!(f, "shift/reduce"),
            ConflictKind::ReduceReduce => write!(f, "reduce/reduce"),
            ConflictKind::Strange => write!(f, "strange"),
        }
    }
}

/// Outgoing edge of a state. `origin` is the item responsible for it and
/// `symbol` the symbol that triggers it.
#[derive(Clone, Debug)]
pub enum Transition {
    Shift {
        origin: ItemRef,
        symbol: SymbolId,
        target: StateIdx,
        lookahead: Lookahead,
    },
    Goto {
        origin: ItemRef,
        symbol: SymbolId,
        target: StateIdx,
    },
    Reduce {
        origin: ItemRef,
        symbol: SymbolId,
        lookahead: Lookahead,
    },
    Accept {
        origin: ItemRef,
        symbol: SymbolId,
    },
}

impl Transition {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Shift { .. } => TransitionKind::Shift,
            Transition::Goto { .. } => TransitionKind::Goto,
            Transition::Reduce { .. } => TransitionKind::Reduce,
            Transition::Accept { .. } => TransitionKind::Accept,
        }
    }

    pub fn origin(&self) -> ItemRef {
        match self {
            Transition::Shift { origin, .. }
            | Transition::Goto { origin, .. }
            | Transition::Reduce { origin, .. }
            | Transition::Accept { origin, .. } => *origin,
        }
    }

    pub fn origin_state(&self) -> StateIdx {
        self.origin().state
    }

    pub fn advance_symbol(&self) -> SymbolId {
        match self {
            Transition::Shift { symbol, .. }
            | Transition::Goto { symbol, .. }
            | Transition::Reduce { symbol, .. }
            | Transition::Accept { symbol, .. } => *symbol,
        }
    }

    pub fn target(&self) -> Option<StateIdx> {
        match self {
            Transition::Shift { target, .. } | Transition::Goto { target, .. } => Some(*target),
            Transition::Reduce { .. } | Transition::Accept { .. } => None,
        }
    }

    pub fn lookahead(&self) -> &Lookahead {
        match self {
            Transition::Shift { lookahead, .. } | Transition::Reduce { lookahead, .. } => lookahead,
            Transition::Goto { .. } | Transition::Accept { .. } => &NO_LOOKAHEAD,
        }
    }

    /// Only shifts and reduces carry a lookahead.
    pub fn lookahead_mut(&mut self) -> Option<&mut Lookahead> {
        match self {
            Transition::Shift { lookahead, .. } | Transition::Reduce { lookahead, .. } => {
                Some(lookahead)
            }
            Transition::Goto { .. } | Transition::Accept { .. } => None,
        }
    }

    pub fn set_lookahead(&mut self, lookahead: Lookahead) {
        if let Some(slot) = self.lookahead_mut() {
            *slot = lookahead;
        }
    }

    /// Two transitions conflict when the parser could not choose between
    /// them: same state, same symbol, overlapping lookahead, different outcome.
    pub fn conflicts_with(&self, other: &Transition) -> bool {
        if self.origin_state() != other.origin_state()
            || self.advance_symbol() != other.advance_symbol()
        {
            return false;
        }

        if self.lookahead().is_disjoint_with(other.lookahead()) {
            return false;
        }

        !self.has_same_outcome(other)
    }

    /// True if taking either transition leaves the parser in the same place,
    /// whatever their origins and lookaheads.
    pub fn has_same_outcome(&self, other: &Transition) -> bool {
        match (self, other) {
            (Transition::Shift { target: a, .. }, Transition::Shift { target: b, .. })
            | (Transition::Goto { target: a, .. }, Transition::Goto { target: b, .. }) => a == b,
            (Transition::Reduce { origin: a, .. }, Transition::Reduce { origin: b, .. }) => a == b,
            (Transition::Accept { .. }, Transition::Accept { .. }) => true,
            _ => false,
        }
    }

    pub fn conflict_kind(&self, other: &Transition) -> ConflictKind {
        match (self.kind(), other.kind()) {
            (TransitionKind::Shift, TransitionKind::Reduce)
            | (TransitionKind::Reduce, TransitionKind::Shift) => ConflictKind::ShiftReduce,
            (TransitionKind::Reduce, TransitionKind::Reduce) => ConflictKind::ReduceReduce,
            _ => ConflictKind::Strange,
        }
    }

    pub fn display<'a>(&'a self, fsa: &'a Fsa, grammar: &'a Grammar) -> TransitionDisplay<'a> {
        TransitionDisplay {
            transition: self,
            fsa,
            grammar,
        }
    }
}

// lookaheads do not take part in identity
impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
            && self.origin() == other.origin()
            && self.advance_symbol() == other.advance_symbol()
            && self.target() == other.target()
    }
}

impl Eq for Transition {}

pub struct TransitionDisplay<'a> {
    transition: &'a Transition,
    fsa: &'a Fsa,
    grammar: &'a Grammar,
}

impl fmt::Display for TransitionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.grammar.symbol_name(self.transition.advance_symbol());
        let origin = self.transition.origin();
        let item = match self.fsa.item(origin) {
            Ok(item) => item.display(self.grammar).to_string(),
            Err(_) => format!("<missing item {}:{}>", origin.state.index(), origin.position),
        };

        match self.transition {
            Transition::Shift { target, .. } => {
                write!(f, "shift on {} to {} because of {}", symbol, target.index(), item)?
            }
            Transition::Goto { target, .. } => {
                write!(f, "goto on {} to {} because of {}", symbol, target.index(), item)?
            }
            Transition::Reduce { .. } => write!(f, "reduce on {} using {}", symbol, item)?,
            Transition::Accept { .. } => write!(f, "accept on {} using {}", symbol, item)?,
        }

        let lookahead = self.transition.lookahead();
        if !lookahead.is_empty() {
            write!(f, " lookahead {}", lookahead.display(self.grammar))?;
        }
        Ok(())
    }
}
