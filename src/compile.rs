//! Runs the whole pipeline over a grammar file

use crate::action::{translate_action, TranslatedAction};
use crate::error::{Error, Result};
use crate::first::{generate_first_table, FirstTable};
use crate::follow::{generate_follow_table, FollowTable};
use crate::grammar::{parse_grammar, Grammar, ProductionIdx};
use crate::header::{parse_headers, Header};
use crate::lexer::Lexer;
use crate::ll1::{generate_parse_table, ParseTable};
use crate::lower::lower;
use crate::symbols::{merge, SymbolId, SymbolTable};

pub use crate::action::Options;

/// State of one compilation. Compiling another file means making a new context.
#[derive(Debug)]
pub struct Context<'src> {
    lexer: Lexer<'src>,
    header: Header,
    grammar: Grammar,
}

impl<'src> Context<'src> {
    pub fn new(src: &'src [u8]) -> Self {
        Context {
            lexer: Lexer::new(src),
            header: Header::default(),
            grammar: Grammar::new(),
        }
    }

    /// Parses the header section, up to and including the first `%%`
    pub fn parse_headers(&mut self) -> Result<()> {
        self.header = parse_headers(&mut self.lexer)?;
        Ok(())
    }

    /// Parses the grammar section, up to and including the second `%%`
    pub fn parse_grammar(&mut self) -> Result<()> {
        self.grammar = parse_grammar(&mut self.lexer)?;
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Analyzes the parsed grammar. The rest of the input is copied to `Artifact::trailing`.
    pub fn finish(self, options: &Options) -> Result<Artifact> {
        let Context {
            lexer,
            header,
            grammar,
        } = self;

        if grammar.productions.is_empty() {
            return Err(Error::EmptyGrammar);
        }

        for non_terminal in grammar.undefined_non_terminals() {
            log::warn!("nonterminal `{}` is used but has no productions", non_terminal);
        }

        let symbols = merge(&grammar.literals, &grammar.terminals, &grammar.non_terminals);
        let lowered = lower(&grammar, &symbols);
        let first = generate_first_table(&symbols, &lowered);
        let follow = generate_follow_table(&symbols, &lowered, &first);
        let table = generate_parse_table(&symbols, &lowered, &first, &follow);

        let productions: Vec<CompiledProduction> = grammar
            .productions
            .iter()
            .zip(lowered)
            .map(|(production, lowered)| {
                let action = translate_action(production, &lowered, &symbols, &header, options);
                CompiledProduction {
                    head: lowered.head,
                    body: lowered.body,
                    action,
                }
            })
            .collect();

        Ok(Artifact {
            header,
            symbols,
            first,
            follow,
            table,
            productions,
            trailing: lexer.remainder().to_vec(),
        })
    }
}

/// Compiles a grammar file with the default options
pub fn compile(src: &[u8]) -> Result<Artifact> {
    compile_with(src, &Options::default())
}

pub fn compile_with(src: &[u8], options: &Options) -> Result<Artifact> {
    let mut context = Context::new(src);
    context.parse_headers()?;
    context.parse_grammar()?;
    context.finish(options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledProduction {
    pub head: SymbolId,
    pub body: Vec<SymbolId>,
    pub action: TranslatedAction,
}

/// Everything needed to generate a parser
#[derive(Debug, Clone)]
pub struct Artifact {
    pub header: Header,
    pub symbols: SymbolTable,
    pub first: FirstTable,
    pub follow: FollowTable,
    pub table: ParseTable,
    /// Indexed by `ProductionIdx`
    pub productions: Vec<CompiledProduction>,
    /// Input after the grammar section's `%%`, as it is
    pub trailing: Vec<u8>,
}

impl Artifact {
    /// Head of the first production
    pub fn start(&self) -> SymbolId {
        self.productions[0].head
    }

    pub fn min_token(&self) -> SymbolId {
        self.symbols.min_token()
    }

    pub fn max_token(&self) -> SymbolId {
        self.symbols.max_token()
    }

    pub fn production(&self, idx: ProductionIdx) -> &CompiledProduction {
        &self.productions[idx.as_usize()]
    }

    /// First set of a symbol, sorted
    pub fn first_of(&self, name: &str) -> Option<Vec<SymbolId>> {
        let id = self.symbols.get(name)?;
        Some(self.first.get_first(id).elems().collect())
    }

    /// Follow set of a symbol, sorted. Empty for tokens.
    pub fn follow_of(&self, name: &str) -> Option<Vec<SymbolId>> {
        let id = self.symbols.get(name)?;
        Some(self.follow.get_follow(id).elems().collect())
    }

    /// Parse table row of a nonterminal, see `ParseTable::raw_row`
    pub fn row(&self, name: &str) -> Option<Vec<i32>> {
        self.table.raw_row(self.symbols.get(name)?)
    }
}

#[cfg(test)]
use crate::error::ErrorKind;

#[cfg(test)]
use crate::test_grammars::calc_source;

#[cfg(test)]
fn id_list(ids: &[u32]) -> Vec<SymbolId> {
    ids.iter().copied().map(SymbolId).collect()
}

#[test]
fn compile_calc() {
    let artifact = compile(calc_source().as_bytes()).unwrap();

    assert_eq!(artifact.header.package, "main");
    assert_eq!(artifact.header.imports, vec!["scanner", "fmt", "os", "strconv"]);
    assert_eq!(artifact.min_token(), SymbolId(6));
    assert_eq!(artifact.max_token(), SymbolId(7));
    assert_eq!(artifact.start(), SymbolId(8));
    assert_eq!(artifact.productions.len(), 11);

    assert_eq!(artifact.first_of("MultA"), Some(id_list(&[0, 2, 3])));
    assert_eq!(artifact.follow_of("Mult"), Some(id_list(&[1, 4, 5])));
    assert_eq!(artifact.follow_of("floating"), Some(vec![]));
    assert_eq!(artifact.row("MultA"), Some(vec![-1, 4, 2, 3, 4, 4, -1, -1]));
    assert_eq!(artifact.row("'*'"), None);
    assert_eq!(artifact.first_of("Missing"), None);

    let mult = artifact.production(ProductionIdx(1));
    assert_eq!(mult.head, SymbolId(10));
    assert_eq!(mult.body, id_list(&[11, 12]));
    assert!(mult.action.code.ends_with("lhs.fval = rhs_2.op(rhs_1.fval) }"));

    // The grammar section ends with `%%` and nothing after it
    assert!(artifact.trailing.is_empty());
}

#[test]
fn compile_keeps_trailing_source() {
    let src = "%%\nS : a ;\n%%\nfunc main() {\n\t# not a comment\n}\n";
    let artifact = compile(src.as_bytes()).unwrap();
    assert_eq!(artifact.trailing, b"\nfunc main() {\n\t# not a comment\n}\n");
}

#[test]
fn compile_without_grammar_separator() {
    let artifact = compile(b"%%\nS : a S\n  |\n  ;\n").unwrap();
    assert!(artifact.trailing.is_empty());
    assert_eq!(artifact.row("S"), Some(vec![-1, 1, 0]));
}

#[test]
fn compile_empty_grammar() {
    let err = compile(b"%package main\n%%\n\n%%\ntrailing").unwrap_err();
    assert_eq!(err, Error::EmptyGrammar);
    assert_eq!(err.kind(), ErrorKind::Structural);

    assert_eq!(compile(b"").unwrap_err(), Error::EmptyGrammar);
}

#[test]
fn compile_errors() {
    // Rules without a header separator are read as the header
    assert_eq!(
        compile(b"S : a ;\n").unwrap_err().kind(),
        ErrorKind::Structural
    );
    assert_eq!(
        compile(b"%%\nS : a\n").unwrap_err().kind(),
        ErrorKind::EndOfInput
    );
    assert_eq!(
        compile(b"%%\nS : a { b\n").unwrap_err().kind(),
        ErrorKind::EndOfInput
    );
    assert_eq!(
        compile(b"%%\nS : \xff ;\n").unwrap_err().kind(),
        ErrorKind::Encoding
    );
}

#[test]
fn contexts_are_independent() {
    let first = compile(calc_source().as_bytes()).unwrap();
    let _ = compile(b"%%\nX : y z ;\n").unwrap();
    let second = compile(calc_source().as_bytes()).unwrap();

    assert_eq!(first.symbols.n_symbols(), second.symbols.n_symbols());
    assert_eq!(first.productions, second.productions);
    for (nt, _) in first.table.rows() {
        assert_eq!(first.table.raw_row(nt), second.table.raw_row(nt));
    }
}

#[test]
fn context_stages() {
    let src = calc_source();
    let mut context = Context::new(src.as_bytes());
    context.parse_headers().unwrap();
    assert_eq!(context.header().token_field("integer"), Some("ival"));
    assert!(context.grammar().productions.is_empty());

    context.parse_grammar().unwrap();
    assert_eq!(context.grammar().start(), Some("Calc"));

    let artifact = context
        .finish(&Options {
            result_var: "out".to_owned(),
            binding_prefix: "in".to_owned(),
        })
        .unwrap();
    assert!(artifact.productions[9].action.code.ends_with("out.fval = float(in1.fval) }"));
}
