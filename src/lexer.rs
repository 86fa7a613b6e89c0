//! Splits grammar files into words
//!
//! The grammar language is line oriented: newlines are tokens of their own, as they end
//! comments, header directives and production alternatives. Everything else is separated by
//! whitespace, except inside code blocks (brace-delimited, nesting tracked) and quoted literals.

use crate::error::{Error, Result};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordKind {
    /// Uppercase-leading bare word
    NonTerminal,

    /// Any other bare word
    Terminal,

    /// Single-quoted text, quotes included
    Literal,

    Newline,

    /// `:`
    BeginRule,

    /// `;`
    EndRule,

    /// `|`
    Alternate,

    /// `{ ... }`, braces included
    Code,

    /// `%package`, `%token<field>` etc.
    HeaderField,

    /// `%%`
    Separator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'src> {
    pub kind: WordKind,
    pub text: &'src str,
}

impl<'src> Word<'src> {
    /// Whether the word can appear in a production body
    pub fn is_symbol(&self) -> bool {
        matches!(
            self.kind,
            WordKind::NonTerminal | WordKind::Terminal | WordKind::Literal
        )
    }
}

impl fmt::Display for WordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WordKind::NonTerminal => "nonterminal",
            WordKind::Terminal => "terminal",
            WordKind::Literal => "literal",
            WordKind::Newline => "newline",
            WordKind::BeginRule => "`:`",
            WordKind::EndRule => "`;`",
            WordKind::Alternate => "`|`",
            WordKind::Code => "code block",
            WordKind::HeaderField => "directive",
            WordKind::Separator => "`%%`",
        };
        f.write_str(s)
    }
}

impl<'src> fmt::Display for Word<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WordKind::NonTerminal
            | WordKind::Terminal
            | WordKind::Literal
            | WordKind::HeaderField => write!(f, "{} `{}`", self.kind, self.text),
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// A cursor over a grammar file. The header and grammar parsers share one `Lexer` so that the
/// grammar section starts where the header section stopped.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    src: &'src [u8],
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src [u8]) -> Self {
        Lexer { src, pos: 0 }
    }

    /// Byte offset of the cursor
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes not consumed yet. Not decoded, so this never fails.
    pub fn remainder(&self) -> &'src [u8] {
        &self.src[self.pos..]
    }

    /// Decodes the character at the cursor without consuming it
    fn peek_char(&self) -> Result<Option<(char, usize)>> {
        let rest = &self.src[self.pos..];
        if rest.is_empty() {
            return Ok(None);
        }
        let chunk = &rest[..rest.len().min(4)];
        let valid = match std::str::from_utf8(chunk) {
            Ok(s) => s,
            Err(err) => {
                // A longer chunk may cut the next character in half, only the first one matters
                let (valid, _) = chunk.split_at(err.valid_up_to());
                std::str::from_utf8(valid).map_err(|_| Error::Encoding { offset: self.pos })?
            }
        };
        match valid.chars().next() {
            Some(c) => Ok(Some((c, c.len_utf8()))),
            None => Err(Error::Encoding { offset: self.pos }),
        }
    }

    fn skip_blanks(&mut self) -> Result<()> {
        loop {
            match self.peek_char()? {
                Some((c, len)) if c != '\n' && c.is_whitespace() => self.pos += len,
                Some(('#', _)) => {
                    // Comment, the newline is left as a token
                    while let Some((c, len)) = self.peek_char()? {
                        if c == '\n' {
                            break;
                        }
                        self.pos += len;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn text(&self, start: usize) -> Result<&'src str> {
        std::str::from_utf8(&self.src[start..self.pos]).map_err(|_| Error::Encoding { offset: start })
    }

    /// Returns the next word, or `None` when the input is exhausted
    pub fn next_word(&mut self) -> Result<Option<Word<'src>>> {
        self.skip_blanks()?;

        let start = self.pos;
        let (first, first_len) = match self.peek_char()? {
            None => return Ok(None),
            Some(c) => c,
        };

        let single = match first {
            '\n' => Some(WordKind::Newline),
            ':' => Some(WordKind::BeginRule),
            ';' => Some(WordKind::EndRule),
            '|' => Some(WordKind::Alternate),
            _ => None,
        };
        if let Some(kind) = single {
            self.pos += first_len;
            return self.word(kind, start);
        }

        if first == '{' {
            return self.code_block(start);
        }

        let kind = match first {
            '%' => WordKind::HeaderField,
            '\'' => WordKind::Literal,
            c if c.is_uppercase() => WordKind::NonTerminal,
            _ => WordKind::Terminal,
        };

        let mut in_quote = false;
        while let Some((c, len)) = self.peek_char()? {
            if c == '\'' {
                in_quote = !in_quote;
            } else if c == '\n' || (!in_quote && c.is_whitespace()) {
                break;
            }
            self.pos += len;
        }

        let text = self.text(start)?;
        let kind = if text == "%%" {
            WordKind::Separator
        } else {
            kind
        };
        self.word(kind, start)
    }

    /// Same as `next_word`, but skips newlines
    pub fn next_non_newline(&mut self) -> Result<Option<Word<'src>>> {
        loop {
            match self.next_word()? {
                Some(Word {
                    kind: WordKind::Newline,
                    ..
                }) => continue,
                other => return Ok(other),
            }
        }
    }

    fn code_block(&mut self, start: usize) -> Result<Option<Word<'src>>> {
        let mut depth = 0usize;
        while let Some((c, len)) = self.peek_char()? {
            self.pos += len;
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return self.word(WordKind::Code, start);
                    }
                }
                _ => {}
            }
        }
        Err(Error::UnterminatedCode { offset: start })
    }

    fn word(&self, kind: WordKind, start: usize) -> Result<Option<Word<'src>>> {
        let word = Word {
            kind,
            text: self.text(start)?,
        };
        log::trace!("word at {}: {:?}", start, word);
        Ok(Some(word))
    }
}

#[cfg(test)]
fn words(src: &str) -> Vec<(WordKind, String)> {
    let mut lexer = Lexer::new(src.as_bytes());
    let mut words = vec![];
    while let Some(word) = lexer.next_word().unwrap() {
        words.push((word.kind, word.text.to_owned()));
    }
    words
}

#[cfg(test)]
fn w(kind: WordKind, text: &str) -> (WordKind, String) {
    (kind, text.to_owned())
}

#[test]
fn lex_header_and_rules() {
    let src = "%package main # Test\n\n%import scanner fmt\n\n%defaultcode {\n    fmt.println(\"Test\")\n}\n\n%% \n\nCalc : Add\n     ;\n\nMult : '*' Mult\n     | '/' Mult\n     ;\n";

    use WordKind::*;
    assert_eq!(
        words(src),
        vec![
            w(HeaderField, "%package"),
            w(Terminal, "main"),
            w(Newline, "\n"),
            w(Newline, "\n"),
            w(HeaderField, "%import"),
            w(Terminal, "scanner"),
            w(Terminal, "fmt"),
            w(Newline, "\n"),
            w(Newline, "\n"),
            w(HeaderField, "%defaultcode"),
            w(Code, "{\n    fmt.println(\"Test\")\n}"),
            w(Newline, "\n"),
            w(Newline, "\n"),
            w(Separator, "%%"),
            w(Newline, "\n"),
            w(Newline, "\n"),
            w(NonTerminal, "Calc"),
            w(BeginRule, ":"),
            w(NonTerminal, "Add"),
            w(Newline, "\n"),
            w(EndRule, ";"),
            w(Newline, "\n"),
            w(Newline, "\n"),
            w(NonTerminal, "Mult"),
            w(BeginRule, ":"),
            w(Literal, "'*'"),
            w(NonTerminal, "Mult"),
            w(Newline, "\n"),
            w(Alternate, "|"),
            w(Literal, "'/'"),
            w(NonTerminal, "Mult"),
            w(Newline, "\n"),
            w(EndRule, ";"),
            w(Newline, "\n"),
        ]
    );
}

#[test]
fn lex_nested_code_block() {
    let src = "{ if x { y() } else { z() } } rest";
    let mut lexer = Lexer::new(src.as_bytes());
    let word = lexer.next_word().unwrap().unwrap();
    assert_eq!(word.kind, WordKind::Code);
    assert_eq!(word.text, "{ if x { y() } else { z() } }");
    let word = lexer.next_word().unwrap().unwrap();
    assert_eq!(word, Word { kind: WordKind::Terminal, text: "rest" });
    assert_eq!(lexer.next_word().unwrap(), None);
}

#[test]
fn lex_code_block_round_trip() {
    let block = "{ a := map[string]int{\"x\": 1}; if a[\"x\"] > 0 { $$ = $1 } }";
    let mut lexer = Lexer::new(block.as_bytes());
    let word = lexer.next_word().unwrap().unwrap();
    assert_eq!(word.text, block);

    // Lexing the captured text again gives the same block
    let mut lexer = Lexer::new(word.text.as_bytes());
    let again = lexer.next_word().unwrap().unwrap();
    assert_eq!(again, word);
    assert_eq!(lexer.next_word().unwrap(), None);
}

#[test]
fn lex_literal_with_space() {
    use WordKind::*;
    assert_eq!(
        words("A : ' ' 'a b' x"),
        vec![
            w(NonTerminal, "A"),
            w(BeginRule, ":"),
            w(Literal, "' '"),
            w(Literal, "'a b'"),
            w(Terminal, "x"),
        ]
    );
}

#[test]
fn lex_comment_keeps_newline() {
    use WordKind::*;
    assert_eq!(
        words("# leading comment\nA # trailing\n#last"),
        vec![w(Newline, "\n"), w(NonTerminal, "A"), w(Newline, "\n")]
    );
}

#[test]
fn lex_separator() {
    use WordKind::*;
    assert_eq!(
        words("%% %%x %token<ival>"),
        vec![
            w(Separator, "%%"),
            w(HeaderField, "%%x"),
            w(HeaderField, "%token<ival>"),
        ]
    );
}

#[test]
fn lex_unicode_words() {
    use WordKind::*;
    assert_eq!(
        words("Ünter ételek 'λ'"),
        vec![w(NonTerminal, "Ünter"), w(Terminal, "ételek"), w(Literal, "'λ'")]
    );
}

#[test]
fn lex_invalid_utf8() {
    let src: &[u8] = b"A : b \xff c";
    let mut lexer = Lexer::new(src);
    assert!(lexer.next_word().unwrap().is_some());
    assert!(lexer.next_word().unwrap().is_some());
    assert!(lexer.next_word().unwrap().is_some());
    assert_eq!(lexer.next_word(), Err(Error::Encoding { offset: 6 }));
}

#[test]
fn lex_unterminated_code() {
    let mut lexer = Lexer::new(b"x { a { b }");
    lexer.next_word().unwrap();
    assert_eq!(lexer.next_word(), Err(Error::UnterminatedCode { offset: 2 }));
}

#[test]
fn lex_remainder_is_raw() {
    let src: &[u8] = b"%%\nfunc main() {}\n\xfe";
    let mut lexer = Lexer::new(src);
    let word = lexer.next_word().unwrap().unwrap();
    assert_eq!(word.kind, WordKind::Separator);
    assert_eq!(lexer.offset(), 2);
    assert_eq!(lexer.remainder(), b"\nfunc main() {}\n\xfe");
}
