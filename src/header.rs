//! Header section of a grammar file
//!
//! The header is everything before the first `%%`. It carries the metadata the generated parser
//! needs but the grammar analysis doesn't: the package and import list of the generated file,
//! the default action, and the value union with the field each symbol's value is stored in.
//!
//! ```text
//! %package main
//! %import fmt strconv
//! %defaultcode { $$ = $1 }
//! %union {
//!     fval float
//!     op func(float)float
//! }
//! %token<fval> floating
//! %type<op> MultA AddA
//! %%
//! ```

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Word, WordKind};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

/// Insertion-ordered name to name map
pub type FieldMap = IndexMap<String, String, FxBuildHasher>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// `%package`, empty if not given
    pub package: String,

    /// `%import`, in order of appearance. Multiple directives accumulate.
    pub imports: Vec<String>,

    /// `%defaultcode`, used by productions without their own action
    pub default_code: Option<String>,

    /// `%union` entries: field name -> type text
    pub union_fields: FieldMap,

    /// `%token<field>` entries: terminal name -> field name
    pub token_fields: FieldMap,

    /// `%type<field>` entries: nonterminal name -> field name
    pub type_fields: FieldMap,
}

impl Header {
    /// Field holding a terminal's value
    pub fn token_field(&self, terminal: &str) -> Option<&str> {
        self.token_fields.get(terminal).map(String::as_str)
    }

    /// Field holding a nonterminal's value
    pub fn type_field(&self, non_terminal: &str) -> Option<&str> {
        self.type_fields.get(non_terminal).map(String::as_str)
    }
}

/// Parses directives until the `%%` separator or end of input
pub fn parse_headers(lexer: &mut Lexer) -> Result<Header> {
    let mut header = Header::default();

    while let Some(word) = lexer.next_word()? {
        match word.kind {
            WordKind::Separator => break,
            WordKind::Newline => continue,
            WordKind::HeaderField => parse_directive(&mut header, word.text, lexer)?,
            _ => {
                return Err(Error::structural(
                    "header section",
                    "a `%` directive",
                    word.to_string(),
                ))
            }
        }
    }

    log::debug!("header: {:#?}", header);
    Ok(header)
}

fn parse_directive(header: &mut Header, directive: &str, lexer: &mut Lexer) -> Result<()> {
    let context = format!("directive `{}`", directive);

    match directive {
        "%package" => {
            let name = expect_name(lexer, &context)?;
            header.package = name.to_owned();
        }
        "%import" => {
            for name in names_until_newline(lexer, &context)? {
                header.imports.push(name.to_owned());
            }
        }
        "%defaultcode" => {
            let code = expect_code(lexer, &context)?;
            header.default_code = Some(code.to_owned());
        }
        "%union" => {
            let code = expect_code(lexer, &context)?;
            parse_union(header, code, &context)?;
        }
        _ => {
            if let Some(field) = directive_field(directive, "%token") {
                for name in names_until_newline(lexer, &context)? {
                    log::trace!("terminal {} has field {}", name, field);
                    header.token_fields.insert(name.to_owned(), field.to_owned());
                }
            } else if let Some(field) = directive_field(directive, "%type") {
                for name in names_until_newline(lexer, &context)? {
                    log::trace!("nonterminal {} has field {}", name, field);
                    header.type_fields.insert(name.to_owned(), field.to_owned());
                }
            } else if directive.starts_with("%token") || directive.starts_with("%type") {
                return Err(Error::structural(
                    context,
                    "a `<field>` suffix",
                    format!("`{}`", directive),
                ));
            } else {
                return Err(Error::structural(
                    "header section",
                    "one of `%package`, `%import`, `%defaultcode`, `%union`, `%token<..>`, `%type<..>`",
                    format!("directive `{}`", directive),
                ));
            }
        }
    }

    Ok(())
}

/// `%token<fval>` -> `fval`
fn directive_field<'a>(directive: &'a str, prefix: &str) -> Option<&'a str> {
    let field = directive
        .strip_prefix(prefix)?
        .strip_prefix('<')?
        .strip_suffix('>')?;
    if field.is_empty() {
        None
    } else {
        Some(field)
    }
}

fn expect_name<'src>(lexer: &mut Lexer<'src>, context: &str) -> Result<&'src str> {
    match lexer.next_word()? {
        Some(word) if matches!(word.kind, WordKind::Terminal | WordKind::NonTerminal) => {
            Ok(word.text)
        }
        Some(word) => Err(Error::structural(context, "a name", word.to_string())),
        None => Err(Error::eof(context)),
    }
}

fn expect_code<'src>(lexer: &mut Lexer<'src>, context: &str) -> Result<&'src str> {
    match lexer.next_non_newline()? {
        Some(Word {
            kind: WordKind::Code,
            text,
        }) => Ok(text),
        Some(word) => Err(Error::structural(context, "a code block", word.to_string())),
        None => Err(Error::eof(context)),
    }
}

/// Reads symbol names until a newline or end of input
fn names_until_newline<'src>(lexer: &mut Lexer<'src>, context: &str) -> Result<Vec<&'src str>> {
    let mut names = vec![];
    while let Some(word) = lexer.next_word()? {
        if word.kind == WordKind::Newline {
            break;
        }
        if !word.is_symbol() {
            return Err(Error::structural(context, "a name", word.to_string()));
        }
        names.push(word.text);
    }
    Ok(names)
}

/// Each line of the block is `field type words...`
fn parse_union(header: &mut Header, code: &str, context: &str) -> Result<()> {
    let interior = &code[1..code.len() - 1];
    let mut lexer = Lexer::new(interior.as_bytes());

    while let Some(word) = lexer.next_non_newline()? {
        if !matches!(word.kind, WordKind::Terminal | WordKind::NonTerminal) {
            return Err(Error::structural(context, "a field name", word.to_string()));
        }

        let mut type_words: Vec<&str> = vec![];
        while let Some(type_word) = lexer.next_word()? {
            if type_word.kind == WordKind::Newline {
                break;
            }
            type_words.push(type_word.text);
        }

        if type_words.is_empty() {
            return Err(Error::structural(
                context,
                "a type",
                format!("nothing after field `{}`", word.text),
            ));
        }

        header
            .union_fields
            .insert(word.text.to_owned(), type_words.join(" "));
    }

    Ok(())
}

#[cfg(test)]
fn parse(src: &str) -> Result<Header> {
    parse_headers(&mut Lexer::new(src.as_bytes()))
}

#[test]
fn parse_full_header() {
    let header = parse(crate::test_grammars::CALC_HEADER).unwrap();

    assert_eq!(header.package, "main");
    assert_eq!(header.imports, vec!["scanner", "fmt", "os", "strconv"]);
    assert_eq!(
        header.default_code.as_deref(),
        Some("{\n    fmt.Println(\"Default code. Assigning\", $1, \" to \", $$, \".\"); $$ = $1\n}")
    );

    let union: Vec<(&str, &str)> = header
        .union_fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(
        union,
        vec![("fval", "float"), ("ival", "int"), ("op", "func(float)float")]
    );

    assert_eq!(header.token_field("floating"), Some("fval"));
    assert_eq!(header.token_field("integer"), Some("ival"));
    assert_eq!(header.token_field("Calc"), None);
    for nt in ["Calc", "Num", "Mult", "Add"] {
        assert_eq!(header.type_field(nt), Some("fval"));
    }
    assert_eq!(header.type_field("MultA"), Some("op"));
    assert_eq!(header.type_field("AddA"), Some("op"));
}

#[test]
fn parse_header_stops_at_separator() {
    let src = "%package p\n%%\nA : b ;\n";
    let mut lexer = Lexer::new(src.as_bytes());
    let header = parse_headers(&mut lexer).unwrap();
    assert_eq!(header.package, "p");
    assert_eq!(lexer.remainder(), b"\nA : b ;\n");
}

#[test]
fn parse_union_multi_word_types() {
    let header = parse("%union\n{\n  ch chan int # channel\n  m map[string] int\n}\n").unwrap();
    assert_eq!(header.union_fields["ch"], "chan int");
    assert_eq!(header.union_fields["m"], "map[string] int");
}

#[test]
fn parse_imports_accumulate() {
    let header = parse("%import a b\n%import c").unwrap();
    assert_eq!(header.imports, vec!["a", "b", "c"]);
}

#[test]
fn parse_header_errors() {
    use crate::error::ErrorKind;

    let err = parse("%package\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(err.to_string().contains("`%package`"));

    assert_eq!(parse("%package").unwrap_err().kind(), ErrorKind::EndOfInput);
    assert_eq!(parse("%defaultcode x").unwrap_err().kind(), ErrorKind::Structural);
    assert_eq!(parse("%defaultcode").unwrap_err().kind(), ErrorKind::EndOfInput);
    assert_eq!(parse("%union { x }").unwrap_err().kind(), ErrorKind::Structural);
    assert_eq!(parse("%token floating").unwrap_err().kind(), ErrorKind::Structural);
    assert_eq!(parse("%type<> A").unwrap_err().kind(), ErrorKind::Structural);
    assert_eq!(parse("%left '+'").unwrap_err().kind(), ErrorKind::Structural);
    assert_eq!(parse("package main").unwrap_err().kind(), ErrorKind::Structural);
    assert_eq!(parse("%token<v> a : b").unwrap_err().kind(), ErrorKind::Structural);
}
