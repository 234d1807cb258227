//! LR(0) and LALR parse-table generation.
//!
//! A [`grammar::Grammar`] is turned into an LR automaton
//! ([`generator::Fsa`]), which is refined until no state offers two
//! different moves for the same input, and finally flattened into
//! [`generator::ParseTables`].

pub mod generator;
pub mod grammar;

use generator::{GeneratorError, LalrGenerator, LrGenerator, ParseTables, TableGenerator};
use grammar::Grammar;

/// Tables from the plain LR(0) automaton.
pub fn lr0_tables(grammar: &Grammar) -> Result<ParseTables, GeneratorError> {
    LrGenerator::new(grammar).generate()
}

/// Tables from the LR(0) automaton refined with lookaheads and rule priorities.
pub fn lalr_tables(grammar: &Grammar) -> Result<ParseTables, GeneratorError> {
    LalrGenerator::new(grammar).generate()
}

/// Reads a BNF grammar and generates its LALR tables.
pub fn lalr_tables_from_bnf(source: &str) -> Result<ParseTables, GeneratorError> {
    let grammar = Grammar::from_bnf(source)?;
    lalr_tables(&grammar)
}
