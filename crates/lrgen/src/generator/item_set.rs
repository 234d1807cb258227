use std::fmt;

use crate::grammar::{Grammar, SymbolId};

use super::item::Item;

/// Ordered, duplicate-free set of items.
///
/// The first `kernel_len` items form the kernel; everything after was added
/// by [`ItemSet::close`]. Two item sets are equal if they hold the same items,
/// regardless of order.
#[derive(Clone, Debug, Default)]
pub struct ItemSet {
    items: Vec<Item>,
    kernel_len: usize,
}

impl ItemSet {
    pub fn new() -> ItemSet {
        ItemSet {
            items: Vec::new(),
            kernel_len: 0,
        }
    }

    /// Returns false if the item was already present.
    pub fn add_item(&mut self, item: Item) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, position: usize) -> Option<Item> {
        self.items.get(position).copied()
    }

    pub fn item_index(&self, item: &Item) -> Option<usize> {
        self.items.iter().position(|x| x == item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn kernel_len(&self) -> usize {
        self.kernel_len
    }

    pub fn is_kernel(&self, position: usize) -> bool {
        position < self.kernel_len
    }

    pub fn kernel(&self) -> &[Item] {
        &self.items[..self.kernel_len]
    }

    /// Marks the current items as the kernel and adds `A -> • γ` for every
    /// nonterminal `A` that appears right after a dot, until nothing changes.
    pub fn close(&mut self, grammar: &Grammar) {
        self.kernel_len = self.items.len();

        // the item list grows while we walk it
        let mut i = 0;
        while i < self.items.len() {
            if let Some(symbol) = self.items[i].symbol(grammar) {
                if grammar.symbol(symbol).is_nonterminal() {
                    for rule in grammar.rules_by_left_symbol(symbol) {
                        self.add_item(Item::at(*rule, 0));
                    }
                }
            }
            i += 1;
        }
    }

    /// Positions and items whose dot directly follows `symbol`.
    pub fn items_by_previous_symbol<'a>(
        &'a self,
        grammar: &'a Grammar,
        symbol: SymbolId,
    ) -> impl Iterator<Item = (usize, Item)> + 'a {
        self.items
            .iter()
            .copied()
            .enumerate()
            .filter(move |(_, item)| item.previous_symbol(grammar) == Some(symbol))
    }

    /// Order-independent identity of the set, used to deduplicate states.
    pub fn key(&self) -> Vec<Item> {
        let mut key = self.items.clone();
        key.sort();
        key
    }

    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> ItemSetDisplay<'a> {
        ItemSetDisplay { set: self, grammar }
    }
}

impl PartialEq for ItemSet {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len() && self.items.iter().all(|x| other.items.contains(x))
    }
}

impl Eq for ItemSet {}

impl FromIterator<Item> for ItemSet {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        let mut set = ItemSet::new();
        for item in iter {
            set.add_item(item);
        }
        set
    }
}

pub struct ItemSetDisplay<'a> {
    set: &'a ItemSet,
    grammar: &'a Grammar,
}

impl fmt::Display for ItemSetDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.set.items.iter().enumerate() {
            let marker = if self.set.is_kernel(i) { ' ' } else { '+' };
            writeln!(f, "{} {}", marker, item.display(self.grammar))?;
        }
        Ok(())
    }
}
