//! An LL(1) parser generator front end.
//!
//! Reads a yacc-like grammar file (a header section of `%` directives, then rules, separated by
//! `%%`), computes first and follow sets, builds the LL(1) parse table and rewrites the
//! semantic actions. The result is an [`Artifact`] with everything a code generator needs to
//! print a table-driven parser.
//!
//! ```
//! let src = b"%union {\n  n int\n}\n%token<n> num\n%type<n> Sum\n%%\n\
//!             Sum : num Rest { $$ = $1 }\n  ;\n\
//!             Rest : '+' Sum\n  |\n  ;\n";
//! let artifact = llgen::compile(src).unwrap();
//! assert_eq!(artifact.row("Rest"), Some(vec![-1, 2, 1, -1]));
//! assert_eq!(artifact.productions[0].action.code, "{ lhs.n = rhs_1.n }");
//! ```

#[macro_use]
mod maplit;

pub mod action;
pub mod bitset;
pub mod compile;
pub mod error;
pub mod first;
pub mod follow;
pub mod grammar;
pub mod header;
pub mod lexer;
pub mod ll1;
pub mod lower;
pub mod simulate;
pub mod symbols;

#[cfg(test)]
mod test_grammars;

pub use compile::{compile, compile_with, Artifact, CompiledProduction, Context, Options};
pub use error::{Error, ErrorKind, Result};
pub use simulate::{recognize, Derivation, ParseError};
