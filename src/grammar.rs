//! Productions and symbol registries, and the parser for the grammar section
//!
//! A rule is a nonterminal followed by one or more alternatives:
//!
//! ```text
//! MultA : '*' Mult   { $$ = mult($2) }
//!       | '/' Mult   { $$ = div($2) }
//!       |            { $$ = noop }
//!       ;
//! ```
//!
//! Each alternative becomes one `Production`. Symbols get ids in their category's registry in
//! order of first appearance, nothing is declared up front.

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Word, WordKind};

use std::fmt;

use fxhash::FxBuildHasher;
use indexmap::IndexSet;

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct ProductionIdx(pub u32);

impl ProductionIdx {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub fn from_usize(i: usize) -> Self {
        Self(u32::try_from(i).unwrap())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: String,
    // Empty for epsilon productions
    pub body: Vec<String>,
    // Code block as written, braces included
    pub action: Option<String>,
}

impl Production {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Assigns dense ids to names in first-seen order
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry(IndexSet<String, FxBuildHasher>);

impl SymbolRegistry {
    /// Returns the name's id, registering it first if it's new
    pub fn intern(&mut self, name: &str) -> u32 {
        let idx = match self.0.get_index_of(name) {
            Some(idx) => idx,
            None => self.0.insert_full(name.to_owned()).0,
        };
        u32::try_from(idx).unwrap()
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.0.get_index_of(name).map(|idx| u32::try_from(idx).unwrap())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names in id order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub literals: SymbolRegistry,
    pub terminals: SymbolRegistry,
    pub non_terminals: SymbolRegistry,

    // Indexed by `ProductionIdx`. The first production's head is the start symbol.
    pub productions: Vec<Production>,
}

impl Grammar {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_production(&mut self, production: Production) -> ProductionIdx {
        let idx = ProductionIdx::from_usize(self.productions.len());
        self.productions.push(production);
        idx
    }

    pub fn production_indices(&self) -> impl Iterator<Item = (ProductionIdx, &Production)> {
        self.productions
            .iter()
            .enumerate()
            .map(|(i, p)| (ProductionIdx::from_usize(i), p))
    }

    /// Name of the start symbol: the head of the first production
    pub fn start(&self) -> Option<&str> {
        self.productions.first().map(|p| p.lhs.as_str())
    }

    fn register(&mut self, word: &Word) {
        match word.kind {
            WordKind::Literal => {
                self.literals.intern(word.text);
            }
            WordKind::Terminal => {
                self.terminals.intern(word.text);
            }
            WordKind::NonTerminal => {
                self.non_terminals.intern(word.text);
            }
            _ => {}
        }
    }

    /// Nonterminals that are used in a production body but don't have any productions
    pub fn undefined_non_terminals(&self) -> Vec<&str> {
        self.non_terminals
            .names()
            .filter(|nt| !self.productions.iter().any(|p| p.lhs == *nt))
            .collect()
    }
}

/// Parses rules until the `%%` separator or end of input
pub fn parse_grammar(lexer: &mut Lexer) -> Result<Grammar> {
    let mut grammar = Grammar::new();

    while let Some(word) = lexer.next_non_newline()? {
        match word.kind {
            WordKind::Separator => break,
            WordKind::NonTerminal => parse_rule(&mut grammar, word, lexer)?,
            _ => {
                return Err(Error::structural(
                    "grammar section",
                    "a nonterminal starting a rule",
                    word.to_string(),
                ))
            }
        }
    }

    log::debug!("grammar:\n{}", GrammarDisplay(&grammar));
    Ok(grammar)
}

fn parse_rule(grammar: &mut Grammar, lhs: Word, lexer: &mut Lexer) -> Result<()> {
    let context = format!("rule `{}`", lhs.text);
    log::trace!("parsing {}", context);

    grammar.register(&lhs);

    match lexer.next_non_newline()? {
        Some(Word {
            kind: WordKind::BeginRule,
            ..
        }) => {}
        Some(word) => return Err(Error::structural(context, "`:`", word.to_string())),
        None => return Err(Error::eof(context)),
    }

    loop {
        let (body, action, mut terminator) = parse_body(grammar, lexer, &context)?;
        log::trace!("{} alternative: {:?}", context, body);
        grammar.add_production(Production {
            lhs: lhs.text.to_owned(),
            body,
            action: action.map(str::to_owned),
        });

        if terminator.kind == WordKind::Newline {
            terminator = match lexer.next_non_newline()? {
                Some(word) => word,
                None => return Err(Error::eof(context)),
            };
        }

        match terminator.kind {
            WordKind::Alternate => continue,
            WordKind::EndRule => return Ok(()),
            _ => {
                return Err(Error::structural(
                    context,
                    "`|` or `;`",
                    terminator.to_string(),
                ))
            }
        }
    }
}

/// Reads symbols and an optional trailing code block. Returns the word that ended the body.
fn parse_body<'src>(
    grammar: &mut Grammar,
    lexer: &mut Lexer<'src>,
    context: &str,
) -> Result<(Vec<String>, Option<&'src str>, Word<'src>)> {
    let mut body: Vec<String> = vec![];
    let mut action: Option<&'src str> = None;

    loop {
        let word = match lexer.next_word()? {
            Some(word) => word,
            None => return Err(Error::eof(context)),
        };

        if word.is_symbol() {
            if action.is_some() {
                return Err(Error::structural(
                    context,
                    "`|` or `;` after the action",
                    word.to_string(),
                ));
            }
            grammar.register(&word);
            body.push(word.text.to_owned());
        } else if word.kind == WordKind::Code {
            if action.is_some() {
                return Err(Error::structural(
                    context,
                    "`|` or `;` after the action",
                    "a second code block",
                ));
            }
            action = Some(word.text);
        } else {
            return Ok((body, action, word));
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.lhs)?;
        if self.body.is_empty() {
            write!(f, " {{empty}}")?;
        }
        for symbol in &self.body {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

pub struct GrammarDisplay<'a>(pub &'a Grammar);

impl<'a> fmt::Display for GrammarDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, production) in self.0.production_indices() {
            writeln!(f, "{}: {}", idx.as_usize(), production)?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn parse(src: &str) -> Result<Grammar> {
    parse_grammar(&mut Lexer::new(src.as_bytes()))
}

#[cfg(test)]
fn production_strings(grammar: &Grammar) -> Vec<String> {
    grammar
        .productions
        .iter()
        .map(|p| match &p.action {
            Some(action) => format!("{} {}", p, action),
            None => p.to_string(),
        })
        .collect()
}

#[test]
fn parse_calc_grammar() {
    let grammar = parse(crate::test_grammars::CALC_GRAMMAR).unwrap();

    assert_eq!(grammar.literals.names().collect::<Vec<_>>(), vec!["'*'", "'/'", "'+'", "'-'"]);
    assert_eq!(grammar.terminals.names().collect::<Vec<_>>(), vec!["floating", "integer"]);
    assert_eq!(
        grammar.non_terminals.names().collect::<Vec<_>>(),
        vec!["Calc", "Add", "Mult", "Num", "MultA", "AddA"]
    );
    assert_eq!(grammar.start(), Some("Calc"));

    assert_eq!(
        production_strings(&grammar),
        vec![
            "Calc -> Add",
            r#"Mult -> Num MultA { fmt.Println("1. Found Mult->'*' Num."); $$ = $2($1) }"#,
            r#"MultA -> '*' Mult { fmt.Println("2. Found MultA->'*' Mult."); $$ = mult($2) }"#,
            r#"MultA -> '/' Mult { fmt.Println("3. Found MultA->'/' Mult."); $$ = div($2) }"#,
            r#"MultA -> {empty} { fmt.Println("4. Found MultA->{}."); $$ = noop }"#,
            r#"Add -> Mult AddA { fmt.Println("5. Found Add->Mult AddA."); $$ = $2($1) }"#,
            r#"AddA -> '+' Add { fmt.Println("6. Found AddA->'+' Add"); $$ = plus($2) }"#,
            r#"AddA -> '-' Add { fmt.Println("7. Found AddA->'-' Add"); $$ = minus($2) }"#,
            r#"AddA -> {empty} { fmt.Println("8. Found AddA->{}"); $$ = noop}"#,
            r#"Num -> floating { fmt.Println("9. Found Num->floating. Forwarding value", $1); $$ = float($1) }"#,
            r#"Num -> integer { fmt.Println("10. Found Num->integer. Forwarding value", $1); $$ = float($1) }"#,
        ]
    );
}

#[test]
fn parse_single_line_rules() {
    let grammar = parse("S : A b | 'c' ; A : | x { act } ;").unwrap();
    assert_eq!(
        production_strings(&grammar),
        vec!["S -> A b", "S -> 'c'", "A -> {empty}", "A -> x { act }"]
    );
    assert!(grammar.productions[2].is_empty());
    assert!(grammar.undefined_non_terminals().is_empty());
}

#[test]
fn parse_stops_at_separator() {
    let src = "S : a\n  ;\n%%\nfunc helper() {}\n";
    let mut lexer = Lexer::new(src.as_bytes());
    let grammar = parse_grammar(&mut lexer).unwrap();
    assert_eq!(grammar.productions.len(), 1);
    assert_eq!(lexer.remainder(), b"\nfunc helper() {}\n");
}

#[test]
fn undefined_non_terminals() {
    let grammar = parse("S : A B ;\nA : a ;").unwrap();
    assert_eq!(grammar.undefined_non_terminals(), vec!["B"]);
}

#[test]
fn parse_grammar_errors() {
    use crate::error::ErrorKind;

    // Missing `:`
    let err = parse("S a ;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(err.to_string().starts_with("rule `S`"));

    // Alternatives on separate lines without `|`
    let err = parse("S : a\n  b\n  ;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);

    // Symbol after the action
    assert_eq!(parse("S : a { x } b ;").unwrap_err().kind(), ErrorKind::Structural);

    // Two actions
    assert_eq!(parse("S : a { x } { y } ;").unwrap_err().kind(), ErrorKind::Structural);

    // Rule starting with a terminal
    assert_eq!(parse("s : a ;").unwrap_err().kind(), ErrorKind::Structural);

    // Missing `;`
    assert_eq!(parse("S : a\n").unwrap_err().kind(), ErrorKind::EndOfInput);
    assert_eq!(parse("S : a | b").unwrap_err().kind(), ErrorKind::EndOfInput);
    assert_eq!(parse("S").unwrap_err().kind(), ErrorKind::EndOfInput);
}

#[test]
fn registry_ids() {
    let mut registry = SymbolRegistry::default();
    assert_eq!(registry.intern("a"), 0);
    assert_eq!(registry.intern("b"), 1);
    assert_eq!(registry.intern("a"), 0);
    assert_eq!(registry.get("b"), Some(1));
    assert_eq!(registry.get("c"), None);
    assert_eq!(registry.len(), 2);
}
