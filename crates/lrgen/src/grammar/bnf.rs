use std::collections::{HashSet, VecDeque};

use super::{Grammar, GrammarBuilder, GrammarError, RuleSpec, SymbolId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BnfSymbol {
    pub name: String,
    pub binding: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BnfAlternative {
    pub symbols: Vec<BnfSymbol>,
    pub priority: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BnfDefinition {
    pub name: String,
    pub alternatives: Vec<BnfAlternative>,
}

/// Parses grammar text into definitions.
///
/// ```text
/// # comment
/// <definition>  ::= NAME "::=" <alternative> ("|" <alternative>)*
/// <alternative> ::= <symbol>* ("@" INT)?
/// <symbol>      ::= NAME (":" BINDING)?
/// ```
///
/// Every token is whitespace delimited. A definition ends where the next
/// `NAME ::=` begins, and an empty alternative derives the empty string.
pub fn parse_bnf(input: &str) -> Result<Vec<BnfDefinition>, GrammarError> {
    let mut toks: VecDeque<&str> = input
        .lines()
        .flat_map(|line| strip_comment(line).split_whitespace())
        .collect();

    let mut definitions = Vec::new();
    while !toks.is_empty() {
        definitions.push(parse_definition(&mut toks)?);
    }

    Ok(definitions)
}

fn strip_comment(line: &str) -> &str {
    // only a token starting with '#' opens a comment, so '#' can still be a terminal inside a word
    let mut offset = 0;
    for word in line.split_inclusive(char::is_whitespace) {
        if word.starts_with('#') {
            return &line[..offset];
        }
        offset += word.len();
    }
    line
}

fn starts_definition(toks: &VecDeque<&str>) -> bool {
    toks.get(1) == Some(&"::=")
}

fn parse_definition(toks: &mut VecDeque<&str>) -> Result<BnfDefinition, GrammarError> {
    let name = toks.pop_front().ok_or(GrammarError::UnexpectedEOF)?;
    if name == "::=" || name == "|" {
        return Err(GrammarError::Malformed("definition must start with a name"));
    }

    let missing_delimiter = GrammarError::Malformed("didn't see ::= delimiter");
    if toks.pop_front().ok_or(GrammarError::UnexpectedEOF)? != "::=" {
        return Err(missing_delimiter);
    }

    let mut alternatives = vec![parse_alternative(toks)?];
    while toks.front() == Some(&"|") {
        toks.pop_front();
        alternatives.push(parse_alternative(toks)?);
    }

    Ok(BnfDefinition {
        name: name.to_string(),
        alternatives,
    })
}

fn parse_alternative(toks: &mut VecDeque<&str>) -> Result<BnfAlternative, GrammarError> {
    let mut symbols = Vec::new();
    let mut priority = 0;

    while let Some(&lookahead) = toks.front() {
        if lookahead == "|" || starts_definition(toks) {
            break;
        }
        toks.pop_front();

        if lookahead == "::=" {
            return Err(GrammarError::Malformed("unexpected ::= inside an alternative"));
        }

        if let Some(level) = lookahead.strip_prefix('@').filter(|s| !s.is_empty()) {
            priority = level
                .parse()
                .map_err(|_| GrammarError::Malformed("priority must be an integer"))?;
            if toks.front().is_some_and(|tok| *tok != "|") && !starts_definition(toks) {
                return Err(GrammarError::Malformed("priority must end an alternative"));
            }
            break;
        }

        symbols.push(parse_symbol(lookahead));
    }

    Ok(BnfAlternative { symbols, priority })
}

fn parse_symbol(tok: &str) -> BnfSymbol {
    match tok.rsplit_once(':') {
        Some((name, binding)) if !name.is_empty() && !binding.is_empty() => BnfSymbol {
            name: name.to_string(),
            binding: Some(binding.to_string()),
        },
        _ => BnfSymbol {
            name: tok.to_string(),
            binding: None,
        },
    }
}

impl Grammar {
    /// Read a grammar written in the BNF dialect accepted by [`parse_bnf`].
    ///
    /// Every defined name is a nonterminal, every other name a terminal, and
    /// the first definition names the start symbol.
    pub fn from_bnf(input: &str) -> Result<Grammar, GrammarError> {
        let definitions = parse_bnf(input)?;
        Self::from_bnf_definitions(&definitions)
    }

    pub fn from_bnf_definitions(definitions: &[BnfDefinition]) -> Result<Grammar, GrammarError> {
        let first = definitions
            .first()
            .ok_or(GrammarError::Malformed("grammar has no definitions"))?;

        let mut builder = GrammarBuilder::new();
        let defined: HashSet<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        for definition in definitions {
            builder.nonterminal(&definition.name)?;
        }

        for definition in definitions {
            let left = builder.nonterminal(&definition.name)?;
            for alternative in &definition.alternatives {
                let mut right: Vec<SymbolId> = Vec::with_capacity(alternative.symbols.len());
                for symbol in &alternative.symbols {
                    let id = if defined.contains(symbol.name.as_str()) {
                        builder.nonterminal(&symbol.name)?
                    } else {
                        builder.terminal(&symbol.name)?
                    };
                    right.push(id);
                }

                let mut spec = RuleSpec::new(left, &right).priority(alternative.priority);
                for (position, symbol) in alternative.symbols.iter().enumerate() {
                    if let Some(binding) = &symbol.binding {
                        spec = spec.bind(position, binding.clone());
                    }
                }
                builder.rule(spec);
            }
        }

        let start = builder.nonterminal(&first.name)?;
        builder.build(start)
    }
}
