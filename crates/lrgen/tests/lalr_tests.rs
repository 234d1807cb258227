use std::collections::BTreeMap;

use lrgen::{
    generator::{Action, ConflictKind, GeneratorError, LalrGenerator, ParseTables, TableGenerator},
    grammar::{Grammar, GrammarBuilder, GrammarError, RuleSpec},
    lalr_tables, lalr_tables_from_bnf, lr0_tables,
};

fn grammar(source: &str) -> Grammar {
    Grammar::from_bnf(source).expect("grammar should build")
}

fn conflict_kind(result: Result<ParseTables, GeneratorError>) -> ConflictKind {
    match result {
        Err(GeneratorError::Conflict(report)) => {
            println!("{}", report);
            report.kind
        }
        Err(other) => panic!("expected a conflict, got {}", other),
        Ok(_) => panic!("expected a conflict, got tables"),
    }
}

fn reduce(rule: usize, left: &str, len: usize) -> Action {
    Action::Reduce {
        rule,
        left: left.to_string(),
        symbols: vec![None; len],
    }
}

const LOOKAHEAD_GRAMMAR: &str = "S ::= A x y | a x z

A ::= a";

#[test]
fn lr0_tables_for_single_terminal() {
    let grammar = grammar("S ::= a");
    let tables = lr0_tables(&grammar).unwrap();

    assert_eq!(tables.goto.len(), 3);
    assert_eq!(tables.goto.get(0, "S"), Some(1));
    assert!(tables.goto.row(1).unwrap().is_empty());

    assert_eq!(tables.action.get(0, "a"), Some(&Action::Shift { next_state: 2 }));
    assert_eq!(tables.action.get(1, "$end"), Some(&Action::Accept));
    assert_eq!(tables.action.get(2, "a"), Some(&reduce(1, "S", 1)));
    assert_eq!(tables.action.get(2, "$end"), Some(&reduce(1, "S", 1)));
    assert_eq!(tables.action.row(2).unwrap().len(), 2);

    assert_eq!(tables.reductions.len(), 1);
    assert_eq!(tables.reductions[0].rule, 1);
    assert_eq!(tables.reductions[0].text, "S -> a");
    assert_eq!(tables.reductions[0].right, vec!["a".to_string()]);
}

#[test]
fn lr0_rejects_grammar_needing_lookahead() {
    let grammar = grammar(LOOKAHEAD_GRAMMAR);
    assert_eq!(conflict_kind(lr0_tables(&grammar)), ConflictKind::ShiftReduce);
}

#[test]
fn lalr_splits_cell_on_second_symbol() {
    let grammar = grammar(LOOKAHEAD_GRAMMAR);
    let tables = lalr_tables(&grammar).unwrap();

    // state 3 is reached on `a` and holds both `S -> a • x z` and `A -> a •`
    let mut expected = BTreeMap::new();
    expected.insert("y".to_string(), reduce(3, "A", 1));
    expected.insert("z".to_string(), Action::Shift { next_state: 5 });
    assert_eq!(
        tables.action.get(3, "x"),
        Some(&Action::Lookahead {
            table: expected,
            wildcard: None
        })
    );

    // reductions outside the follow set were dropped
    assert_eq!(tables.action.row(3).unwrap().len(), 1);
}

#[test]
fn dangling_else_resolved_by_priority() {
    let tables = lalr_tables_from_bnf(
        "stmt ::= if c then stmt
                | if c then stmt else stmt @1
                | other",
    )
    .unwrap();

    // the state holding `if c then stmt •` shifts `else` instead of reducing
    let row = (0..tables.action.len())
        .filter_map(|state| tables.action.row(state))
        .find(|row| row.get("$end") == Some(&reduce(1, "stmt", 4)))
        .expect("a state reduces the short form");
    assert!(matches!(row["else"], Action::Shift { .. }));
    assert_eq!(row.len(), 2);
}

#[test]
fn dangling_else_without_priority_conflicts() {
    let grammar = grammar(
        "stmt ::= if c then stmt
                | if c then stmt else stmt
                | other",
    );
    assert_eq!(conflict_kind(lalr_tables(&grammar)), ConflictKind::ShiftReduce);
}

#[test]
fn ambiguous_expressions_conflict() {
    let grammar = grammar("E ::= E + E | E * E | id");
    assert_eq!(conflict_kind(lalr_tables(&grammar)), ConflictKind::ShiftReduce);
}

#[test]
fn reduce_reduce_resolved_by_priority() {
    let resolved = grammar(
        "S ::= A x | B x

         A ::= a @1

         B ::= a",
    );
    let tables = lalr_tables(&resolved).unwrap();
    assert_eq!(tables.action.get(4, "x"), Some(&reduce(3, "A", 1)));
    assert_eq!(tables.action.row(4).unwrap().len(), 1);

    let unresolved = grammar(
        "S ::= A x | B x

         A ::= a

         B ::= a",
    );
    assert_eq!(conflict_kind(lalr_tables(&unresolved)), ConflictKind::ReduceReduce);
}

#[test]
fn empty_rule_reduces_on_follow() {
    let grammar = grammar(
        "S ::= A b

         A ::= a |",
    );
    let tables = lalr_tables(&grammar).unwrap();

    assert_eq!(tables.action.get(0, "b"), Some(&reduce(3, "A", 0)));
    assert!(matches!(tables.action.get(0, "a"), Some(Action::Shift { .. })));
    assert_eq!(tables.action.get(0, "$end"), None);
    assert_eq!(tables.goto.get(0, "A"), Some(2));
}

#[test]
fn reductions_carry_bindings_and_actions() {
    let mut builder = GrammarBuilder::new();
    let e = builder.nonterminal("E").unwrap();
    let plus = builder.terminal("+").unwrap();
    let num = builder.terminal("num").unwrap();
    builder
        .rule(
            RuleSpec::new(e, &[e, plus, num])
                .bind(0, "left")
                .bind(2, "right")
                .action("left + right"),
        )
        .rule(RuleSpec::new(e, &[num]).bind(0, "value"));
    let grammar = builder.build(e).unwrap();

    let mut generator = LalrGenerator::new(&grammar);
    let tables = generator.generate().unwrap();
    let fsa = generator.fsa();
    assert!(fsa.guarantee_conflictless(&grammar).is_ok());
    assert_eq!(fsa.goto_table(&grammar), tables.goto);
    assert_eq!(fsa.action_table(&grammar).unwrap(), tables.action);
    assert_eq!(fsa.reductions(&grammar).unwrap(), tables.reductions);

    // `E -> num` is reduced in state 2, before the sum in state 4
    let order: Vec<usize> = tables.reductions.iter().map(|r| r.rule).collect();
    assert_eq!(order, vec![2, 1]);

    let sum = &tables.reductions[1];
    assert_eq!(sum.left, "E");
    assert_eq!(sum.action.as_deref(), Some("left + right"));
    assert_eq!(
        sum.symbols,
        vec![Some("left".to_string()), None, Some("right".to_string())]
    );
    assert_eq!(tables.reductions[0].symbols, vec![Some("value".to_string())]);

    let shift_num = tables.action.get(0, "num");
    assert!(matches!(shift_num, Some(Action::Shift { .. })));
}

#[test]
fn grammar_errors_pass_through() {
    assert!(matches!(
        lalr_tables_from_bnf("S ::= a @x"),
        Err(GeneratorError::Grammar(GrammarError::Malformed(_)))
    ));
}

#[test]
fn assignment_grammar_needs_per_state_lookahead() {
    // LALR(1), but reduce lookaheads are gathered over the whole automaton:
    // `R -> L •` sees `=` through `S -> L • = R` and keeps `{*, id}` after it
    let grammar = grammar(
        "S ::= L = R | R

         L ::= * R | id

         R ::= L",
    );
    assert_eq!(conflict_kind(lalr_tables(&grammar)), ConflictKind::ShiftReduce);
}

#[test]
fn shifts_to_one_state_drop_their_lookahead() {
    let grammar = grammar(
        "S ::= A x y | a x z | a x y @1

         A ::= a",
    );
    let tables = lalr_tables(&grammar).unwrap();

    // `S -> a • x z` and `S -> a • x y` both move to state 5
    assert_eq!(tables.action.get(3, "x"), Some(&Action::Shift { next_state: 5 }));
    assert_eq!(tables.action.row(3).unwrap().len(), 1);
    assert_eq!(tables.action.get(5, "y"), Some(&Action::Shift { next_state: 8 }));
    assert_eq!(tables.action.get(5, "z"), Some(&Action::Shift { next_state: 7 }));
}

#[test]
fn priority_leaves_orphaned_states_in_tables() {
    let grammar = grammar(
        "S ::= A x y | a x y

         A ::= a @1",
    );
    let tables = lalr_tables(&grammar).unwrap();

    assert_eq!(tables.action.get(3, "x"), Some(&reduce(3, "A", 1)));
    assert_eq!(tables.action.row(3).unwrap().len(), 1);

    // `S -> a x • y` lost its only way in but keeps its row
    assert_eq!(tables.action.len(), 8);
    assert_eq!(tables.action.get(5, "y"), Some(&Action::Shift { next_state: 7 }));
    let reaches_five = (0..tables.action.len()).any(|state| {
        tables
            .action
            .row(state)
            .unwrap()
            .values()
            .any(|action| *action == Action::Shift { next_state: 5 })
    });
    assert!(!reaches_five);
}
