use crate::grammar::{Grammar, SymbolSet};

use super::{
    item::ItemRef,
    state::{State, StateIdx},
    item_set::ItemSet,
    transition::{ConflictKind, Lookahead, Transition},
};

fn grammar() -> Grammar {
    Grammar::from_bnf("S ::= a S | b").unwrap()
}

fn set(grammar: &Grammar, names: &[&str]) -> SymbolSet {
    names.iter().map(|n| grammar.symbol_id(n).unwrap()).collect()
}

fn origin(position: usize) -> ItemRef {
    ItemRef::new(StateIdx::new(0), position)
}

#[test]
fn equality_ignores_lookahead() {
    let g = grammar();
    let a = g.symbol_id("a").unwrap();
    let shift = |lookahead| Transition::Shift {
        origin: origin(0),
        symbol: a,
        target: StateIdx::new(1),
        lookahead,
    };

    assert_eq!(shift(Lookahead::none()), shift(Lookahead::from_set(set(&g, &["b"]))));
    assert_ne!(
        shift(Lookahead::none()),
        Transition::Reduce {
            origin: origin(0),
            symbol: a,
            lookahead: Lookahead::none()
        }
    );
}

#[test]
fn conflict_rules() {
    let g = grammar();
    let a = g.symbol_id("a").unwrap();
    let b = g.symbol_id("b").unwrap();

    let shift = Transition::Shift {
        origin: origin(0),
        symbol: a,
        target: StateIdx::new(1),
        lookahead: Lookahead::none(),
    };
    let reduce = |position, symbol, lookahead| Transition::Reduce {
        origin: origin(position),
        symbol,
        lookahead,
    };

    assert!(shift.conflicts_with(&reduce(1, a, Lookahead::none())));
    assert_eq!(shift.conflict_kind(&reduce(1, a, Lookahead::none())), ConflictKind::ShiftReduce);
    assert!(!shift.conflicts_with(&reduce(1, b, Lookahead::none())));

    // same reduction twice is not a conflict, two different ones are
    assert!(!reduce(1, a, Lookahead::none()).conflicts_with(&reduce(1, a, Lookahead::none())));
    assert!(reduce(1, a, Lookahead::none()).conflicts_with(&reduce(2, a, Lookahead::none())));

    // disjoint lookaheads separate the moves
    let with_a = Lookahead::from_set(set(&g, &["a"]));
    let with_b = Lookahead::from_set(set(&g, &["b"]));
    assert!(!reduce(1, a, with_a.clone()).conflicts_with(&reduce(2, a, with_b)));
    assert!(reduce(1, a, with_a.clone()).conflicts_with(&reduce(2, a, with_a)));

    let other_state = Transition::Reduce {
        origin: ItemRef::new(StateIdx::new(3), 0),
        symbol: a,
        lookahead: Lookahead::none(),
    };
    assert!(!shift.conflicts_with(&other_state));

    // shifts on one symbol must agree on the target
    let shift_to = |position, target| Transition::Shift {
        origin: origin(position),
        symbol: a,
        target: StateIdx::new(target),
        lookahead: Lookahead::none(),
    };
    assert!(!shift_to(0, 1).conflicts_with(&shift_to(2, 1)));
    assert!(shift_to(0, 1).conflicts_with(&shift_to(2, 4)));
    assert_eq!(shift_to(0, 1).conflict_kind(&shift_to(2, 4)), ConflictKind::Strange);
}

#[test]
fn accept_conflicts_with_anything_else_on_end() {
    let g = grammar();
    let end = g.end_marker();
    let accept = |position| Transition::Accept {
        origin: origin(position),
        symbol: end,
    };

    assert!(!accept(0).conflicts_with(&accept(1)));

    let reduce_on_end = Transition::Reduce {
        origin: origin(2),
        symbol: end,
        lookahead: Lookahead::none(),
    };
    assert!(accept(0).conflicts_with(&reduce_on_end));
    assert_eq!(accept(0).conflict_kind(&reduce_on_end), ConflictKind::Strange);
    assert_eq!(reduce_on_end.conflict_kind(&accept(0)), ConflictKind::Strange);

    let reduce_on_a = Transition::Reduce {
        origin: origin(2),
        symbol: g.symbol_id("a").unwrap(),
        lookahead: Lookahead::none(),
    };
    assert!(!accept(0).conflicts_with(&reduce_on_a));
}

#[test]
fn remove_common_expands_missing_lookahead() {
    let g = grammar();
    let mut low = Lookahead::none();
    low.remove_common_with(&Lookahead::from_set(set(&g, &["a"])), &g);

    assert_eq!(low.positions(), &[set(&g, &["b", "$end"])]);
    assert!(!low.is_dead());

    low.remove_common_with(&Lookahead::from_set(set(&g, &["b", "$end"])), &g);
    assert!(low.is_dead());

    let mut untouched = Lookahead::from_set(set(&g, &["a"]));
    untouched.remove_common_with(&Lookahead::none(), &g);
    assert_eq!(untouched.len(), 1);
}

#[test]
fn state_deduplicates_transitions() {
    let g = grammar();
    let a = g.symbol_id("a").unwrap();
    let mut state = State::new(StateIdx::new(0), ItemSet::new());
    let reduce = Transition::Reduce {
        origin: origin(0),
        symbol: a,
        lookahead: Lookahead::none(),
    };

    assert!(state.add_transition(reduce.clone()));
    assert!(!state.add_transition(reduce.clone()));
    assert_eq!(state.transitions().len(), 1);
    assert!(state.transition(1).is_err());
    assert!(state.remove_transition_equal_to(&reduce));
    assert!(state.remove_transition(0).is_err());
}
