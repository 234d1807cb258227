use std::fmt;

use bit_set::BitSet;

use super::{Grammar, SymbolId};

/// Set of grammar symbols, stored as a bitset over symbol indices.
#[derive(Clone, Debug, Default)]
pub struct SymbolSet {
    data: BitSet,
}

impl SymbolSet {
    pub fn new() -> SymbolSet {
        SymbolSet {
            data: BitSet::new(),
        }
    }

    /// Returns true if the symbol was not present before.
    pub fn add_symbol(&mut self, symbol: SymbolId) -> bool {
        self.data.insert(symbol.index())
    }

    pub fn contains(&self, symbol: SymbolId) -> bool {
        self.data.contains(symbol.index())
    }

    /// In-place union. Returns true if the set grew.
    pub fn union(&mut self, other: &SymbolSet) -> bool {
        let before = self.data.len();
        self.data.union_with(&other.data);
        self.data.len() != before
    }

    /// In-place difference: removes every symbol of `other` from this set.
    pub fn complement(&mut self, other: &SymbolSet) {
        self.data.difference_with(&other.data);
    }

    pub fn is_disjoint(&self, other: &SymbolSet) -> bool {
        self.data.is_disjoint(&other.data)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.data.iter().map(SymbolId::new)
    }

    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> SymbolSetDisplay<'a> {
        SymbolSetDisplay { set: self, grammar }
    }
}

// compare by members, the backing storage may differ in length
impl PartialEq for SymbolSet {
    fn eq(&self, other: &Self) -> bool {
        self.data.iter().eq(other.data.iter())
    }
}

impl Eq for SymbolSet {}

impl FromIterator<SymbolId> for SymbolSet {
    fn from_iter<T: IntoIterator<Item = SymbolId>>(iter: T) -> Self {
        let mut set = SymbolSet::new();
        for symbol in iter {
            set.add_symbol(symbol);
        }
        set
    }
}

pub struct SymbolSetDisplay<'a> {
    set: &'a SymbolSet,
    grammar: &'a Grammar,
}

impl fmt::Display for SymbolSetDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, symbol) in self.set.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.grammar.symbol_name(symbol))?;
        }
        write!(f, "}}")
    }
}
