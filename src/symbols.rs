//! The merged symbol table
//!
//! Literals, terminals and nonterminals are numbered separately while parsing. Before the
//! analysis they're merged into one id space laid out as:
//!
//! ```text
//! 0                 epsilon ("")
//! 1                 end of input ("$")
//! 2 ..= MINTOKEN-1  literals
//! MINTOKEN ..= MAXTOKEN   terminals
//! MAXTOKEN+1 ..     nonterminals
//! ```
//!
//! so that everything a parser can see as lookahead has an id in `0..=MAXTOKEN`, which is what
//! the LL table columns are indexed by.

use crate::bitset::{FromBitIdx, ToBitIdx};
use crate::grammar::SymbolRegistry;

use std::fmt;

use fxhash::FxHashMap;

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

pub const EPSILON: SymbolId = SymbolId(0);
pub const END: SymbolId = SymbolId(1);

impl SymbolId {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub fn from_usize(i: usize) -> Self {
        Self(u32::try_from(i).unwrap())
    }
}

impl ToBitIdx for SymbolId {
    fn to_bit_idx(&self) -> usize {
        self.as_usize()
    }
}

impl FromBitIdx for SymbolId {
    fn from_bit_idx(idx: usize) -> Self {
        SymbolId::from_usize(idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolCategory {
    Epsilon,
    EndMarker,
    Literal,
    Terminal,
    NonTerminal,
}

impl SymbolCategory {
    /// Whether the symbol can be a lookahead
    pub fn is_token(self) -> bool {
        matches!(
            self,
            SymbolCategory::EndMarker | SymbolCategory::Literal | SymbolCategory::Terminal
        )
    }

    /// Whether the symbol has a semantic value on the value stack. Literals are matched but
    /// never pushed.
    pub fn has_value(self) -> bool {
        matches!(self, SymbolCategory::Terminal | SymbolCategory::NonTerminal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub category: SymbolCategory,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    // Indexed by `SymbolId`
    symbols: Vec<SymbolInfo>,
    ids: FxHashMap<String, SymbolId>,
    min_token: u32,
    max_token: u32,
}

/// Builds the global id space from the three registries
pub fn merge(
    literals: &SymbolRegistry,
    terminals: &SymbolRegistry,
    non_terminals: &SymbolRegistry,
) -> SymbolTable {
    let mut table = SymbolTable {
        symbols: Vec::with_capacity(2 + literals.len() + terminals.len() + non_terminals.len()),
        ids: Default::default(),
        min_token: 0,
        max_token: 0,
    };

    table.push("", SymbolCategory::Epsilon);
    table.push("$", SymbolCategory::EndMarker);
    for literal in literals.names() {
        table.push(literal, SymbolCategory::Literal);
    }
    table.min_token = u32::try_from(table.symbols.len()).unwrap();
    for terminal in terminals.names() {
        table.push(terminal, SymbolCategory::Terminal);
    }
    // With no terminals this is `min_token - 1`, the last literal (or the end marker)
    table.max_token = u32::try_from(table.symbols.len()).unwrap() - 1;
    for non_terminal in non_terminals.names() {
        table.push(non_terminal, SymbolCategory::NonTerminal);
    }

    log::debug!(
        "symbols (MINTOKEN={}, MAXTOKEN={}):\n{}",
        table.min_token,
        table.max_token,
        table
    );

    table
}

impl SymbolTable {
    fn push(&mut self, name: &str, category: SymbolCategory) {
        let id = SymbolId::from_usize(self.symbols.len());
        self.symbols.push(SymbolInfo {
            name: name.to_owned(),
            category,
        });
        // Keep the first id if a name is reused, e.g. a terminal named `$`
        self.ids.entry(name.to_owned()).or_insert(id);
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.ids.get(name).copied()
    }

    pub fn get_info(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id.as_usize()]
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.get_info(id).name
    }

    pub fn category(&self, id: SymbolId) -> SymbolCategory {
        self.get_info(id).category
    }

    /// First terminal id, one past the last literal
    pub fn min_token(&self) -> SymbolId {
        SymbolId(self.min_token)
    }

    /// Last terminal id
    pub fn max_token(&self) -> SymbolId {
        SymbolId(self.max_token)
    }

    /// Number of ids a lookahead can take, `MAXTOKEN + 1`
    pub fn n_tokens(&self) -> usize {
        self.max_token as usize + 1
    }

    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> {
        (0..self.symbols.len()).map(SymbolId::from_usize)
    }

    pub fn non_terminal_ids(&self) -> impl Iterator<Item = SymbolId> {
        (self.n_tokens()..self.symbols.len()).map(SymbolId::from_usize)
    }

    /// Maps a word of the parsed language to a lookahead id. Words are looked up as written
    /// first, then as a quoted literal, so `+` finds `'+'`.
    pub fn lookahead_id(&self, word: &str) -> Option<SymbolId> {
        let id = match self.get(word) {
            Some(id) => Some(id),
            None => self.get(&format!("'{}'", word)),
        }?;
        if self.category(id).is_token() {
            Some(id)
        } else {
            None
        }
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, SymbolInfo { name, category }) in self.symbols.iter().enumerate() {
            writeln!(f, "{}: {:?} ({:?})", idx, name, category)?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn calc_table() -> SymbolTable {
    let grammar = crate::grammar::parse_grammar(&mut crate::lexer::Lexer::new(
        crate::test_grammars::CALC_GRAMMAR.as_bytes(),
    ))
    .unwrap();
    merge(&grammar.literals, &grammar.terminals, &grammar.non_terminals)
}

#[test]
fn merge_calc_symbols() {
    let table = calc_table();

    let expected = hashmap! {
        "" => 0,
        "$" => 1,
        "'*'" => 2,
        "'/'" => 3,
        "'+'" => 4,
        "'-'" => 5,
        "floating" => 6,
        "integer" => 7,
        "Calc" => 8,
        "Add" => 9,
        "Mult" => 10,
        "Num" => 11,
        "MultA" => 12,
        "AddA" => 13,
    };
    assert_eq!(table.n_symbols(), expected.len());
    for (name, id) in expected {
        assert_eq!(table.get(name), Some(SymbolId(id)), "{}", name);
        assert_eq!(table.name(SymbolId(id)), name);
    }

    assert_eq!(table.min_token(), SymbolId(6));
    assert_eq!(table.max_token(), SymbolId(7));
    assert_eq!(table.n_tokens(), 8);
    assert_eq!(
        table.non_terminal_ids().collect::<Vec<_>>(),
        (8..14).map(SymbolId).collect::<Vec<_>>()
    );
}

#[test]
fn merged_ranges_are_contiguous() {
    let table = calc_table();
    let min = table.min_token();
    let max = table.max_token();

    for id in table.symbol_ids() {
        let expected = if id == EPSILON {
            SymbolCategory::Epsilon
        } else if id == END {
            SymbolCategory::EndMarker
        } else if id < min {
            SymbolCategory::Literal
        } else if id <= max {
            SymbolCategory::Terminal
        } else {
            SymbolCategory::NonTerminal
        };
        assert_eq!(table.category(id), expected);
    }
}

#[test]
fn merge_without_literals_or_terminals() {
    let mut literals = SymbolRegistry::default();
    let mut terminals = SymbolRegistry::default();
    let mut non_terminals = SymbolRegistry::default();
    non_terminals.intern("S");

    let table = merge(&literals, &terminals, &non_terminals);
    assert_eq!(table.min_token(), SymbolId(2));
    assert_eq!(table.max_token(), SymbolId(1));
    assert_eq!(table.get("S"), Some(SymbolId(2)));

    terminals.intern("a");
    let table = merge(&literals, &terminals, &non_terminals);
    assert_eq!(table.min_token(), SymbolId(2));
    assert_eq!(table.max_token(), SymbolId(2));
    assert_eq!(table.get("a"), Some(SymbolId(2)));
    assert_eq!(table.get("S"), Some(SymbolId(3)));

    literals.intern("'x'");
    let table = merge(&literals, &terminals, &non_terminals);
    assert_eq!(table.get("'x'"), Some(SymbolId(2)));
    assert_eq!(table.min_token(), SymbolId(3));
    assert_eq!(table.max_token(), SymbolId(3));
}

#[test]
fn lookahead_ids() {
    let table = calc_table();
    assert_eq!(table.lookahead_id("floating"), Some(SymbolId(6)));
    assert_eq!(table.lookahead_id("*"), Some(SymbolId(2)));
    assert_eq!(table.lookahead_id("'*'"), Some(SymbolId(2)));
    assert_eq!(table.lookahead_id("$"), Some(END));
    // Nonterminals and epsilon are never lookaheads
    assert_eq!(table.lookahead_id("Mult"), None);
    assert_eq!(table.lookahead_id(""), None);
    assert_eq!(table.lookahead_id("%"), None);
}

#[test]
fn reused_name_keeps_first_id() {
    // A terminal named `$` gets its own id but the name resolves to the end marker
    let (_, table, productions) = crate::test_grammars::analyze("S : $ a ;\n");
    assert_eq!(table.get("$"), Some(END));
    assert_eq!(table.category(SymbolId(2)), SymbolCategory::Terminal);
    assert_eq!(table.name(SymbolId(2)), "$");
    assert_eq!(table.get("a"), Some(SymbolId(3)));
    assert_eq!(productions[0].body, vec![END, SymbolId(3)]);
}
