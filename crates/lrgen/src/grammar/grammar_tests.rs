use super::*;

fn expression_grammar() -> Grammar {
    Grammar::from_bnf(
        "E ::= E + T | T

         T ::= T * F | F

         F ::= ( E ) | id",
    )
    .expect("grammar should build")
}

#[test]
fn rule_zero_is_synthesized() {
    let grammar = expression_grammar();
    let rule = grammar.rule(RuleIdx::new(0));

    assert_eq!(rule.left(), grammar.start_symbol());
    assert_eq!(grammar.symbol_name(rule.left()), ACCEPT_SYMBOL);
    assert_eq!(rule.right(), &[grammar.symbol_id("E").unwrap()]);
    assert_eq!(grammar.user_start_symbol(), grammar.symbol_id("E").unwrap());
    assert_eq!(grammar.rules().len(), 7);
}

#[test]
fn symbol_kinds() {
    let grammar = expression_grammar();

    let end = grammar.end_marker();
    assert!(grammar.symbol(end).is_end_marker());
    assert!(grammar.symbol(end).is_terminal());
    assert!(grammar.symbol(grammar.symbol_id("id").unwrap()).is_terminal());
    assert!(grammar.symbol(grammar.symbol_id("T").unwrap()).is_nonterminal());

    let terminals: Vec<&str> = grammar.terminals().map(|t| grammar.symbol_name(t)).collect();
    assert_eq!(terminals, vec!["+", "*", "(", ")", "id"]);
    assert_eq!(grammar.terminal_set().len(), 6);
}

#[test]
fn first_sets() {
    let grammar = expression_grammar();
    let names = |set: &SymbolSet| {
        let mut names: Vec<&str> = set.iter().map(|s| grammar.symbol_name(s)).collect();
        names.sort();
        names
    };

    for nt in ["E", "T", "F"] {
        let first = grammar.symbol_first_set(grammar.symbol_id(nt).unwrap());
        assert_eq!(names(first), vec!["(", "id"]);
    }
    let plus = grammar.symbol_id("+").unwrap();
    assert_eq!(names(grammar.symbol_first_set(plus)), vec!["+"]);
}

#[test]
fn nullable_symbols() {
    let grammar = Grammar::from_bnf(
        "S ::= A B c

         A ::= a |

         B ::= A A",
    )
    .unwrap();

    let id = |name| grammar.symbol_id(name).unwrap();
    assert!(grammar.is_symbol_nullable(id("A")));
    assert!(grammar.is_symbol_nullable(id("B")));
    assert!(!grammar.is_symbol_nullable(id("S")));
    assert!(!grammar.is_symbol_nullable(id("c")));

    let first = grammar.symbol_first_set(id("S"));
    assert!(first.contains(id("a")));
    assert!(first.contains(id("c")));
    assert_eq!(first.len(), 2);

    let (set, nullable) = grammar.sequence_first_set(&[id("A"), id("B")]);
    assert!(nullable);
    assert_eq!(set.len(), 1);
}

#[test]
fn builder_rejects_bad_rules() {
    let mut builder = GrammarBuilder::new();
    let s = builder.nonterminal("S").unwrap();
    let a = builder.terminal("a").unwrap();
    assert_eq!(
        builder.nonterminal("a"),
        Err(GrammarError::KindMismatch("a".to_string()))
    );
    assert_eq!(
        builder.terminal(END_MARKER),
        Err(GrammarError::ReservedName(END_MARKER.to_string()))
    );

    builder.rule(RuleSpec::new(a, &[s]));
    assert_eq!(
        builder.build(s).unwrap_err(),
        GrammarError::NotNonTerminal("a".to_string())
    );

    let mut builder = GrammarBuilder::new();
    let s = builder.nonterminal("S").unwrap();
    let x = builder.nonterminal("X").unwrap();
    builder.rule(RuleSpec::new(s, &[x]));
    assert_eq!(
        builder.build(s).unwrap_err(),
        GrammarError::NoRules("X".to_string())
    );

    let mut builder = GrammarBuilder::new();
    let s = builder.nonterminal("S").unwrap();
    let a = builder.terminal("a").unwrap();
    builder.rule(RuleSpec::new(s, &[a]).bind(1, "oops"));
    assert!(matches!(
        builder.build(s),
        Err(GrammarError::BindingOutOfRange { position: 1, len: 1, .. })
    ));
}

#[test]
fn bnf_bindings_priorities_and_comments() {
    let grammar = Grammar::from_bnf(
        "# statements
         stmt ::= if cond:c then stmt:body          # short form
                | if cond:c then stmt:t else stmt:e @1
                | other

         cond ::= x",
    )
    .unwrap();

    let long_form = grammar.rule(RuleIdx::new(2));
    assert_eq!(long_form.priority(), 1);
    assert_eq!(long_form.right_len(), 6);
    assert_eq!(long_form.bindings()[1].as_deref(), Some("c"));
    assert_eq!(long_form.bindings()[3].as_deref(), Some("t"));
    assert_eq!(long_form.bindings()[0], None);
    assert_eq!(grammar.rule(RuleIdx::new(1)).priority(), 0);

    assert_eq!(
        long_form.display(&grammar).to_string(),
        "stmt -> if cond:c then stmt:t else stmt:e @1"
    );
}

#[test]
fn bnf_errors() {
    assert_eq!(
        Grammar::from_bnf("S a b").unwrap_err(),
        GrammarError::Malformed("didn't see ::= delimiter")
    );
    assert_eq!(Grammar::from_bnf("S").unwrap_err(), GrammarError::UnexpectedEOF);
    assert_eq!(
        Grammar::from_bnf("S ::= a @1 b").unwrap_err(),
        GrammarError::Malformed("priority must end an alternative")
    );
    assert_eq!(
        Grammar::from_bnf("").unwrap_err(),
        GrammarError::Malformed("grammar has no definitions")
    );
}

#[test]
fn grammar_display_lists_rules() {
    let grammar = Grammar::from_bnf("S ::= a S |").unwrap();
    assert_eq!(
        grammar.to_string(),
        "0: $accept -> S\n1: S -> a S\n2: S -> ε\n"
    );
}

#[test]
fn bnf_definitions_without_blank_lines() {
    let definitions = parse_bnf(
        "expr ::= expr + term:rhs @1
               | term
         term ::= id
               |",
    )
    .unwrap();

    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[0].alternatives.len(), 2);
    assert_eq!(definitions[0].alternatives[0].priority, 1);
    assert_eq!(
        definitions[0].alternatives[0].symbols[2],
        BnfSymbol {
            name: "term".to_string(),
            binding: Some("rhs".to_string())
        }
    );
    assert_eq!(definitions[1].name, "term");
    assert!(definitions[1].alternatives[1].symbols.is_empty());
}
