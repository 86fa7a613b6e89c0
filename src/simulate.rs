//! Runs the predictive parser described by an `Artifact` over a sequence of words, without
//! generating code. This is the loop the generated parser runs, minus the actions.

use crate::compile::Artifact;
use crate::grammar::ProductionIdx;
use crate::symbols::{SymbolCategory, SymbolId, END};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown token `{word}` at {position}")]
    UnknownToken { position: usize, word: String },

    #[error("no production for {non_terminal} with lookahead {lookahead} at {position}")]
    NoProduction {
        position: usize,
        non_terminal: String,
        lookahead: String,
    },

    #[error("expected {expected}, found {found} at {position}")]
    Mismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("unexpected input at {position}")]
    TrailingInput { position: usize },

    #[error("{non_terminal} expands to itself without consuming input at {position}")]
    LeftRecursion {
        position: usize,
        non_terminal: String,
    },
}

/// Productions expanded while parsing, in leftmost derivation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation(pub Vec<ProductionIdx>);

impl Derivation {
    /// Order in which the generated parser runs the actions
    pub fn reductions(&self) -> impl Iterator<Item = ProductionIdx> + '_ {
        self.0.iter().rev().copied()
    }
}

/// Parses `words`. A word is a symbol name (`integer`) or the text of a literal, with or without
/// quotes (`*` or `'*'`). `$` ends the input.
pub fn recognize(artifact: &Artifact, words: &[&str]) -> Result<Derivation, ParseError> {
    let symbols = &artifact.symbols;

    let mut input: Vec<SymbolId> = Vec::with_capacity(words.len());
    for (position, word) in words.iter().enumerate() {
        match symbols.lookahead_id(word) {
            Some(END) => {
                if position + 1 != words.len() {
                    return Err(ParseError::TrailingInput {
                        position: position + 1,
                    });
                }
            }
            Some(id) => input.push(id),
            None => {
                return Err(ParseError::UnknownToken {
                    position,
                    word: (*word).to_owned(),
                })
            }
        }
    }

    let mut derivation = vec![];
    let mut stack: Vec<SymbolId> = vec![END, artifact.start()];
    let mut position = 0;

    // Nonterminals expanded since the last match whose bodies are still on the stack, with the
    // stack slot they were popped from. Expanding one of them again means the same expansions
    // will repeat forever.
    let mut expanding: Vec<(SymbolId, usize)> = vec![];

    while let Some(top) = stack.pop() {
        let lookahead = input.get(position).copied().unwrap_or(END);
        log::trace!(
            "{}: top={} lookahead={}",
            position,
            symbols.name(top),
            symbols.name(lookahead)
        );

        match symbols.category(top) {
            SymbolCategory::NonTerminal => match artifact.table.get(top, lookahead) {
                Some(production_idx) => {
                    let slot = stack.len();
                    expanding.retain(|(_, expanded_slot)| *expanded_slot <= slot);
                    if expanding.iter().any(|(non_terminal, _)| *non_terminal == top) {
                        return Err(ParseError::LeftRecursion {
                            position,
                            non_terminal: symbols.name(top).to_owned(),
                        });
                    }
                    expanding.push((top, slot));

                    derivation.push(production_idx);
                    let production = artifact.production(production_idx);
                    stack.extend(production.body.iter().rev().copied());
                }
                None => {
                    return Err(ParseError::NoProduction {
                        position,
                        non_terminal: symbols.name(top).to_owned(),
                        lookahead: symbols.name(lookahead).to_owned(),
                    })
                }
            },
            SymbolCategory::EndMarker => {
                if lookahead != END {
                    return Err(ParseError::TrailingInput { position });
                }
            }
            SymbolCategory::Literal | SymbolCategory::Terminal | SymbolCategory::Epsilon => {
                if top != lookahead {
                    return Err(ParseError::Mismatch {
                        position,
                        expected: symbols.name(top).to_owned(),
                        found: symbols.name(lookahead).to_owned(),
                    });
                }
                position += 1;
                expanding.clear();
            }
        }
    }

    Ok(Derivation(derivation))
}

#[cfg(test)]
use crate::compile::compile;

#[cfg(test)]
use crate::test_grammars::{calc_source, EXPR_GRAMMAR};

#[cfg(test)]
fn expr_artifact() -> Artifact {
    compile(format!("%%\n{}", EXPR_GRAMMAR).as_bytes()).unwrap()
}

#[cfg(test)]
fn indices(derivation: &Derivation) -> Vec<u32> {
    derivation.0.iter().map(|p| p.0).collect()
}

#[test]
fn recognize_calc() {
    let artifact = compile(calc_source().as_bytes()).unwrap();

    let derivation = recognize(&artifact, &["integer", "*", "floating", "+", "integer"]).unwrap();
    assert_eq!(
        indices(&derivation),
        vec![0, 5, 1, 10, 2, 1, 9, 4, 6, 5, 1, 10, 4, 8]
    );
    assert_eq!(
        derivation.reductions().map(|p| p.0).collect::<Vec<_>>(),
        vec![8, 4, 10, 1, 5, 6, 4, 9, 1, 2, 10, 1, 5, 0]
    );

    // Quoted literals and an explicit end marker
    let quoted = recognize(&artifact, &["integer", "'*'", "floating", "+", "integer", "$"]).unwrap();
    assert_eq!(quoted, derivation);
}

#[test]
fn recognize_expr() {
    let artifact = expr_artifact();
    let derivation = recognize(&artifact, &["(", "id", "+", "id", ")", "*", "id"]).unwrap();
    assert_eq!(
        indices(&derivation),
        vec![0, 3, 6, 0, 3, 7, 5, 1, 3, 7, 5, 2, 4, 7, 5, 2]
    );
}

#[test]
fn recognize_errors() {
    let calc = compile(calc_source().as_bytes()).unwrap();
    let expr = expr_artifact();

    assert_eq!(
        recognize(&calc, &["integer", "%"]),
        Err(ParseError::UnknownToken {
            position: 1,
            word: "%".to_owned()
        })
    );
    // Nonterminals are not tokens
    assert!(matches!(
        recognize(&calc, &["Num"]),
        Err(ParseError::UnknownToken { position: 0, .. })
    ));
    assert_eq!(
        recognize(&calc, &["integer", "integer"]),
        Err(ParseError::NoProduction {
            position: 1,
            non_terminal: "MultA".to_owned(),
            lookahead: "integer".to_owned(),
        })
    );
    assert_eq!(
        recognize(&calc, &["integer", "*"]),
        Err(ParseError::NoProduction {
            position: 2,
            non_terminal: "Mult".to_owned(),
            lookahead: "$".to_owned(),
        })
    );
    assert_eq!(
        recognize(&calc, &["integer", "$", "integer"]),
        Err(ParseError::TrailingInput { position: 2 })
    );
    assert_eq!(
        recognize(&expr, &["(", "id"]),
        Err(ParseError::Mismatch {
            position: 2,
            expected: "')'".to_owned(),
            found: "$".to_owned(),
        })
    );
    assert_eq!(
        recognize(&expr, &["id", ")"]),
        Err(ParseError::TrailingInput { position: 1 })
    );
    assert!(matches!(
        recognize(&expr, &[]),
        Err(ParseError::NoProduction { position: 0, .. })
    ));
}

#[test]
fn recognize_left_recursion() {
    // `E -> E '+' T` is the later alternative, so it takes the `id` cell
    let artifact = compile(b"%%\nE : T\n  | E '+' T\n  ;\nT : id ;\n").unwrap();
    assert_eq!(artifact.row("E"), Some(vec![-1, -1, -1, 1]));
    assert_eq!(
        recognize(&artifact, &["id"]),
        Err(ParseError::LeftRecursion {
            position: 0,
            non_terminal: "E".to_owned(),
        })
    );
}

#[test]
fn recognize_repeated_nullable_expansions() {
    // `A` is expanded repeatedly without consuming input, but never inside its own expansion
    let artifact = compile(b"%%\nS : A A B c ;\nA : | a ;\nB : A ;\n").unwrap();
    let derivation = recognize(&artifact, &["c"]).unwrap();
    assert_eq!(indices(&derivation), vec![0, 1, 1, 3, 1]);
}
