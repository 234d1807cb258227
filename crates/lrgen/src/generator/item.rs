use std::fmt;

use crate::grammar::{Grammar, RuleIdx, SymbolId};

use super::{error::GeneratorError, state::StateIdx};

/// An LR(0) item: a rule with a dot somewhere in its right side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    rule: RuleIdx,
    dot: usize,
}

impl Item {
    pub fn new(grammar: &Grammar, rule: RuleIdx, dot: usize) -> Result<Item, GeneratorError> {
        let len = grammar.rule(rule).right_len();
        if dot > len {
            return Err(GeneratorError::InvalidItem {
                rule: rule.index(),
                dot,
                len,
            });
        }
        Ok(Item { rule, dot })
    }

    // callers guarantee dot <= rule length
    pub(crate) fn at(rule: RuleIdx, dot: usize) -> Item {
        Item { rule, dot }
    }

    pub fn rule(&self) -> RuleIdx {
        self.rule
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    /// Symbol right after the dot.
    pub fn symbol(&self, grammar: &Grammar) -> Option<SymbolId> {
        grammar.rule(self.rule).right_symbol(self.dot)
    }

    /// Symbol right before the dot.
    pub fn previous_symbol(&self, grammar: &Grammar) -> Option<SymbolId> {
        self.dot
            .checked_sub(1)
            .and_then(|i| grammar.rule(self.rule).right_symbol(i))
    }

    pub fn is_at_end(&self, grammar: &Grammar) -> bool {
        self.dot == grammar.rule(self.rule).right_len()
    }

    pub fn advance(&self, grammar: &Grammar) -> Option<Item> {
        if self.is_at_end(grammar) {
            None
        } else {
            Some(Item {
                rule: self.rule,
                dot: self.dot + 1,
            })
        }
    }

    /// Complete items reduce, except for rule 0 which accepts instead.
    pub fn is_reduceable(&self, grammar: &Grammar) -> bool {
        self.rule.index() != 0 && self.is_at_end(grammar)
    }

    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> ItemDisplay<'a> {
        ItemDisplay {
            item: self,
            grammar,
        }
    }
}

pub struct ItemDisplay<'a> {
    item: &'a Item,
    grammar: &'a Grammar,
}

impl fmt::Display for ItemDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.grammar.rule(self.item.rule);
        write!(f, "{} ->", self.grammar.symbol_name(rule.left()))?;
        for (i, symbol) in rule.right().iter().enumerate() {
            if i == self.item.dot {
                write!(f, " •")?;
            }
            write!(f, " {}", self.grammar.symbol_name(*symbol))?;
        }
        if self.item.dot == rule.right_len() {
            write!(f, " •")?;
        }
        if rule.priority() != 0 {
            write!(f, " (prio: {})", rule.priority())?;
        }
        Ok(())
    }
}

/// Position of an item inside a state of the automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemRef {
    pub state: StateIdx,
    pub position: usize,
}

impl ItemRef {
    pub fn new(state: StateIdx, position: usize) -> ItemRef {
        ItemRef { state, position }
    }
}
