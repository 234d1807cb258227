use crate::grammar::Grammar;

pub mod error;
pub mod fsa;
pub mod graph;
pub mod item;
pub mod item_set;
pub mod lalr;
pub mod lr;
pub mod state;
pub mod tables;
pub mod transition;

#[cfg(test)]
mod transition_tests;

pub use error::{ConflictReport, GeneratorError};
pub use fsa::Fsa;
pub use item::{Item, ItemRef};
pub use item_set::ItemSet;
pub use lalr::LalrGenerator;
pub use lr::LrGenerator;
pub use state::{State, StateIdx};
pub use tables::{Action, ActionTable, GotoTable, ParseTables, ReductionDescriptor};
pub use transition::{ConflictKind, Lookahead, Transition, TransitionKind};

/// Common driver for the table generators: build the automaton, make sure it
/// has no conflicts left, then read the tables off it.
pub trait TableGenerator<'g> {
    fn grammar(&self) -> &'g Grammar;
    fn fsa(&self) -> &Fsa;
    fn build_fsa(&mut self) -> Result<(), GeneratorError>;
    fn guarantee_conflictless(&mut self) -> Result<(), GeneratorError>;

    fn generate(&mut self) -> Result<ParseTables, GeneratorError> {
        self.build_fsa()?;
        self.guarantee_conflictless()?;
        ParseTables::from_fsa(self.fsa(), self.grammar())
    }
}
