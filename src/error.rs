//! Errors reported while compiling a grammar

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of compilation failures. Every `Error` maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source is not valid UTF-8
    Encoding,

    /// Input ended where a token was required
    EndOfInput,

    /// Header or grammar syntax violation
    Structural,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid UTF-8 sequence at byte offset {offset}")]
    Encoding { offset: usize },

    #[error("unterminated code block starting at byte offset {offset}")]
    UnterminatedCode { offset: usize },

    #[error("unexpected end of input in {context}")]
    UnexpectedEof { context: String },

    #[error("{context}: expected {expected}, found {found}")]
    Structural {
        context: String,
        expected: &'static str,
        found: String,
    },

    #[error("grammar section does not define any productions")]
    EmptyGrammar,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Encoding { .. } => ErrorKind::Encoding,
            Error::UnterminatedCode { .. } | Error::UnexpectedEof { .. } => ErrorKind::EndOfInput,
            Error::Structural { .. } | Error::EmptyGrammar => ErrorKind::Structural,
        }
    }

    pub(crate) fn eof(context: impl Into<String>) -> Self {
        Error::UnexpectedEof {
            context: context.into(),
        }
    }

    pub(crate) fn structural(
        context: impl Into<String>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Error::Structural {
            context: context.into(),
            expected,
            found: found.into(),
        }
    }
}

#[test]
fn error_kinds() {
    assert_eq!(Error::Encoding { offset: 3 }.kind(), ErrorKind::Encoding);
    assert_eq!(Error::UnterminatedCode { offset: 0 }.kind(), ErrorKind::EndOfInput);
    assert_eq!(Error::eof("rule `A`").kind(), ErrorKind::EndOfInput);
    assert_eq!(
        Error::structural("rule `A`", "`:`", "`|`").kind(),
        ErrorKind::Structural
    );
    assert_eq!(Error::EmptyGrammar.kind(), ErrorKind::Structural);
}

#[test]
fn error_messages() {
    let err = Error::structural("rule `Mult`", "`:` or `|`", "terminal `x`");
    assert_eq!(
        err.to_string(),
        "rule `Mult`: expected `:` or `|`, found terminal `x`"
    );
    assert_eq!(
        Error::eof("directive `%package`").to_string(),
        "unexpected end of input in directive `%package`"
    );
}
