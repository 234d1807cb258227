use std::{collections::HashMap, fmt};

use bit_set::BitSet;
use lrgen_util::make_type_idx;
use thiserror::Error;

mod bnf;
mod symbol_set;

#[cfg(test)]
mod grammar_tests;

pub use bnf::{parse_bnf, BnfAlternative, BnfDefinition, BnfSymbol};
pub use symbol_set::{SymbolSet, SymbolSetDisplay};

/// Name of the end-of-input marker present in every grammar.
pub const END_MARKER: &str = "$end";
/// Name of the synthetic start symbol introduced by rule 0.
pub const ACCEPT_SYMBOL: &str = "$accept";

make_type_idx!(pub SymbolId, Symbol);
make_type_idx!(pub RuleIdx, Rule);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
    EndMarker,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// The end marker counts as a terminal: it is an input symbol with a
    /// column in the action table.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SymbolKind::Terminal | SymbolKind::EndMarker)
    }

    pub fn is_nonterminal(&self) -> bool {
        self.kind == SymbolKind::NonTerminal
    }

    pub fn is_end_marker(&self) -> bool {
        self.kind == SymbolKind::EndMarker
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    left: SymbolId,
    right: Vec<SymbolId>,
    priority: i32,
    // one entry per right-hand symbol, None for symbols the action does not use
    bindings: Vec<Option<String>>,
    action: Option<String>,
}

impl Rule {
    pub fn left(&self) -> SymbolId {
        self.left
    }

    pub fn right(&self) -> &[SymbolId] {
        &self.right
    }

    pub fn right_symbol(&self, i: usize) -> Option<SymbolId> {
        self.right.get(i).copied()
    }

    pub fn right_len(&self) -> usize {
        self.right.len()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn bindings(&self) -> &[Option<String>] {
        &self.bindings
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> RuleDisplay<'a> {
        RuleDisplay {
            rule: self,
            grammar,
        }
    }
}

pub struct RuleDisplay<'a> {
    rule: &'a Rule,
    grammar: &'a Grammar,
}

impl fmt::Display for RuleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.grammar.symbol_name(self.rule.left))?;
        if self.rule.right.is_empty() {
            write!(f, " ε")?;
        }
        for (symbol, binding) in self.rule.right.iter().zip(&self.rule.bindings) {
            write!(f, " {}", self.grammar.symbol_name(*symbol))?;
            if let Some(name) = binding {
                write!(f, ":{}", name)?;
            }
        }
        if self.rule.priority != 0 {
            write!(f, " @{}", self.rule.priority)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("symbol `{0}` is already declared with a different kind")]
    KindMismatch(String),
    #[error("symbol name `{0}` is reserved")]
    ReservedName(String),
    #[error("symbol {0} does not belong to this grammar")]
    UnknownSymbol(usize),
    #[error("left side of a rule must be a nonterminal, found `{0}`")]
    NotNonTerminal(String),
    #[error("`{0}` may not appear on the right side of a rule")]
    ReservedSymbol(String),
    #[error("nonterminal `{0}` has no rules")]
    NoRules(String),
    #[error("binding `{name}` refers to position {position} of a rule with {len} symbols")]
    BindingOutOfRange {
        name: String,
        position: usize,
        len: usize,
    },
    #[error("malformed grammar: {0}")]
    Malformed(&'static str),
    #[error("unexpected end of grammar text")]
    UnexpectedEOF,
}

/// Description of a rule handed to [`GrammarBuilder::rule`].
#[derive(Clone, Debug)]
pub struct RuleSpec {
    left: SymbolId,
    right: Vec<SymbolId>,
    priority: i32,
    bindings: Vec<(usize, String)>,
    action: Option<String>,
}

impl RuleSpec {
    pub fn new(left: SymbolId, right: &[SymbolId]) -> RuleSpec {
        RuleSpec {
            left,
            right: right.to_vec(),
            priority: 0,
            bindings: Vec::new(),
            action: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> RuleSpec {
        self.priority = priority;
        self
    }

    /// Bind the value of the right-hand symbol at `position` to `name`.
    pub fn bind(mut self, position: usize, name: impl Into<String>) -> RuleSpec {
        self.bindings.push((position, name.into()));
        self
    }

    pub fn action(mut self, source: impl Into<String>) -> RuleSpec {
        self.action = Some(source.into());
        self
    }
}

/// Collects symbols and rules, then validates them into a [`Grammar`].
///
/// Symbol 0 is always the end marker and symbol 1 the synthetic start symbol.
#[derive(Debug)]
pub struct GrammarBuilder {
    symbols: Vec<Symbol>,
    names: HashMap<String, SymbolId>,
    rules: Vec<RuleSpec>,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarBuilder {
    pub fn new() -> GrammarBuilder {
        let mut builder = GrammarBuilder {
            symbols: Vec::new(),
            names: HashMap::new(),
            rules: Vec::new(),
        };
        builder.push_symbol(END_MARKER, SymbolKind::EndMarker);
        builder.push_symbol(ACCEPT_SYMBOL, SymbolKind::NonTerminal);
        builder
    }

    fn push_symbol(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
        let symbol = Symbol {
            name: name.to_string(),
            kind,
        };
        let id = SymbolId::from_push(&mut self.symbols, symbol);
        self.names.insert(name.to_string(), id);
        id
    }

    fn declare(&mut self, name: &str, kind: SymbolKind) -> Result<SymbolId, GrammarError> {
        if name == END_MARKER || name == ACCEPT_SYMBOL {
            return Err(GrammarError::ReservedName(name.to_string()));
        }

        match self.names.get(name) {
            Some(id) if self.symbols[*id].kind == kind => Ok(*id),
            Some(_) => Err(GrammarError::KindMismatch(name.to_string())),
            None => Ok(self.push_symbol(name, kind)),
        }
    }

    /// Declare (or look up) a terminal symbol.
    pub fn terminal(&mut self, name: &str) -> Result<SymbolId, GrammarError> {
        self.declare(name, SymbolKind::Terminal)
    }

    /// Declare (or look up) a nonterminal symbol.
    pub fn nonterminal(&mut self, name: &str) -> Result<SymbolId, GrammarError> {
        self.declare(name, SymbolKind::NonTerminal)
    }

    pub fn rule(&mut self, spec: RuleSpec) -> &mut GrammarBuilder {
        self.rules.push(spec);
        self
    }

    fn check_symbol(&self, id: SymbolId) -> Result<&Symbol, GrammarError> {
        self.symbols
            .get(id.index())
            .ok_or(GrammarError::UnknownSymbol(id.index()))
    }

    /// Validate the collected rules and derive nullable and first sets.
    ///
    /// Rule 0 (`$accept -> start`) is added here; user rules follow in the
    /// order they were given.
    pub fn build(self, start: SymbolId) -> Result<Grammar, GrammarError> {
        let start_symbol = self.check_symbol(start)?;
        if !start_symbol.is_nonterminal() || start == ACCEPT {
            return Err(GrammarError::NotNonTerminal(start_symbol.name.clone()));
        }

        let mut rules: Vec<Rule> = Vec::with_capacity(self.rules.len() + 1);
        rules.push(Rule {
            left: ACCEPT,
            right: vec![start],
            priority: 0,
            bindings: vec![None],
            action: None,
        });

        for spec in &self.rules {
            let left = self.check_symbol(spec.left)?;
            if !left.is_nonterminal() || spec.left == ACCEPT {
                return Err(GrammarError::NotNonTerminal(left.name.clone()));
            }
            for symbol in &spec.right {
                let symbol = self.check_symbol(*symbol)?;
                if symbol.is_end_marker() || symbol.name == ACCEPT_SYMBOL {
                    return Err(GrammarError::ReservedSymbol(symbol.name.clone()));
                }
            }

            let mut bindings: Vec<Option<String>> = vec![None; spec.right.len()];
            for (position, name) in &spec.bindings {
                if *position >= spec.right.len() {
                    return Err(GrammarError::BindingOutOfRange {
                        name: name.clone(),
                        position: *position,
                        len: spec.right.len(),
                    });
                }
                bindings[*position] = Some(name.clone());
            }

            rules.push(Rule {
                left: spec.left,
                right: spec.right.clone(),
                priority: spec.priority,
                bindings,
                action: spec.action.clone(),
            });
        }

        let mut rules_by_left: Vec<Vec<RuleIdx>> = vec![Vec::new(); self.symbols.len()];
        for (i, rule) in rules.iter().enumerate() {
            rules_by_left[rule.left.index()].push(RuleIdx::new(i));
        }

        for (i, symbol) in self.symbols.iter().enumerate() {
            if symbol.is_nonterminal() && rules_by_left[i].is_empty() {
                return Err(GrammarError::NoRules(symbol.name.clone()));
            }
        }

        let nullable = Grammar::compute_nullable_nonterminals(&self.symbols, &rules);
        let first = Grammar::compute_first_sets(&self.symbols, &rules, &nullable);

        Ok(Grammar {
            symbols: self.symbols,
            names: self.names,
            rules,
            rules_by_left,
            start: ACCEPT,
            end_marker: END,
            nullable,
            first,
        })
    }
}

const END: SymbolId = SymbolId(0);
const ACCEPT: SymbolId = SymbolId(1);

/// A validated context-free grammar, augmented with rule 0.
#[derive(Debug, Clone)]
pub struct Grammar {
    symbols: Vec<Symbol>,
    names: HashMap<String, SymbolId>,
    rules: Vec<Rule>,
    rules_by_left: Vec<Vec<RuleIdx>>,
    start: SymbolId,
    end_marker: SymbolId,
    nullable: BitSet,
    first: Vec<SymbolSet>,
}

impl Grammar {
    // same shape as the classic iterate-until-nothing-changes nullable pass,
    // n^2 in the size of the grammar
    fn compute_nullable_nonterminals(symbols: &[Symbol], rules: &[Rule]) -> BitSet {
        let mut nullables = BitSet::with_capacity(symbols.len());
        loop {
            let mut changed = false;
            for rule in rules {
                let all_nullable = rule.right.iter().all(|x| {
                    symbols[x.index()].is_nonterminal() && nullables.contains(x.index())
                });

                if all_nullable {
                    changed |= nullables.insert(rule.left.index());
                }
            }

            if !changed {
                break;
            }
        }

        nullables
    }

    fn compute_first_sets(symbols: &[Symbol], rules: &[Rule], nullable: &BitSet) -> Vec<SymbolSet> {
        let mut first: Vec<SymbolSet> = symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                let mut set = SymbolSet::new();
                if symbol.is_terminal() {
                    set.add_symbol(SymbolId::new(i));
                }
                set
            })
            .collect();

        loop {
            let mut changed = false;
            for rule in rules {
                let mut rule_first = SymbolSet::new();
                for symbol in &rule.right {
                    rule_first.union(&first[symbol.index()]);
                    if !nullable.contains(symbol.index()) {
                        break;
                    }
                }
                changed |= first[rule.left.index()].union(&rule_first);
            }

            if !changed {
                break;
            }
        }

        first
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        &self.symbols[id].name
    }

    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, idx: RuleIdx) -> &Rule {
        &self.rules[idx]
    }

    pub fn rules_by_left_symbol(&self, symbol: SymbolId) -> &[RuleIdx] {
        self.rules_by_left
            .get(symbol.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The synthetic `$accept` symbol, left side of rule 0.
    pub fn start_symbol(&self) -> SymbolId {
        self.start
    }

    /// The symbol the user asked the grammar to be built for.
    pub fn user_start_symbol(&self) -> SymbolId {
        self.rules[0].right[0]
    }

    pub fn end_marker(&self) -> SymbolId {
        self.end_marker
    }

    /// Declared terminals, in declaration order. Does not include the end marker.
    pub fn terminals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, symbol)| symbol.kind == SymbolKind::Terminal)
            .map(|(i, _)| SymbolId::new(i))
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, symbol)| symbol.is_nonterminal())
            .map(|(i, _)| SymbolId::new(i))
    }

    /// Every input symbol: declared terminals plus the end marker.
    pub fn terminal_set(&self) -> SymbolSet {
        let mut set: SymbolSet = self.terminals().collect();
        set.add_symbol(self.end_marker);
        set
    }

    pub fn symbol_first_set(&self, symbol: SymbolId) -> &SymbolSet {
        &self.first[symbol.index()]
    }

    pub fn is_symbol_nullable(&self, symbol: SymbolId) -> bool {
        self.nullable.contains(symbol.index())
    }

    /// First set of a symbol sequence, and whether the whole sequence is nullable.
    pub fn sequence_first_set(&self, symbols: &[SymbolId]) -> (SymbolSet, bool) {
        let mut set = SymbolSet::new();
        for symbol in symbols {
            set.union(self.symbol_first_set(*symbol));
            if !self.is_symbol_nullable(*symbol) {
                return (set, false);
            }
        }
        (set, true)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "{}: {}", i, rule.display(self))?;
        }
        Ok(())
    }
}
