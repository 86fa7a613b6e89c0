//! LL(1) parse table construction

use crate::first::FirstTable;
use crate::follow::FollowTable;
use crate::grammar::ProductionIdx;
use crate::lower::{production_indices, LoweredProduction};
use crate::symbols::{SymbolId, SymbolTable, EPSILON};

use std::fmt;

/// Value of an empty cell in `ParseTable::raw_row`
pub const NO_PRODUCTION: i32 = -1;

/// Predictive parse table
#[derive(Debug, Clone)]
pub struct ParseTable {
    // Informally: if I'm parsing the non-terminal `NT` and next token is `t`, then `(NT, t)` in
    // the table tells me which production to expand. If there isn't an entry for `(NT, t)` then
    // we have an error in the input.
    //
    // One row per nonterminal, in id order. Each row has one cell per lookahead id
    // (`0..=MAXTOKEN`).
    rows: Vec<Vec<Option<ProductionIdx>>>,

    // Id of the first nonterminal, `MAXTOKEN + 1`
    first_non_terminal: usize,
}

impl ParseTable {
    fn new(symbols: &SymbolTable) -> Self {
        let n_non_terminals = symbols.n_symbols() - symbols.n_tokens();
        ParseTable {
            rows: vec![vec![None; symbols.n_tokens()]; n_non_terminals],
            first_non_terminal: symbols.n_tokens(),
        }
    }

    /// Later productions win. Ambiguous grammars silently lose the earlier alternative.
    fn add(&mut self, non_terminal: SymbolId, token: SymbolId, production_idx: ProductionIdx) {
        let row = non_terminal.as_usize() - self.first_non_terminal;
        let old = self.rows[row][token.as_usize()].replace(production_idx);
        if let Some(old) = old {
            if old != production_idx {
                log::trace!(
                    "({}, {}): overriding production {} with {}",
                    non_terminal.0,
                    token.0,
                    old.0,
                    production_idx.0
                );
            }
        }
    }

    /// The row of a nonterminal. `None` if `non_terminal` is not a nonterminal id.
    pub fn row(&self, non_terminal: SymbolId) -> Option<&[Option<ProductionIdx>]> {
        let row = non_terminal.as_usize().checked_sub(self.first_non_terminal)?;
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn get(&self, non_terminal: SymbolId, token: SymbolId) -> Option<ProductionIdx> {
        self.row(non_terminal)?
            .get(token.as_usize())
            .copied()
            .flatten()
    }

    /// A row with empty cells as `NO_PRODUCTION`
    pub fn raw_row(&self, non_terminal: SymbolId) -> Option<Vec<i32>> {
        let row = self.row(non_terminal)?;
        Some(
            row.iter()
                .map(|cell| match cell {
                    Some(production_idx) => production_idx.0 as i32,
                    None => NO_PRODUCTION,
                })
                .collect(),
        )
    }

    /// Rows with their nonterminal ids
    pub fn rows(&self) -> impl Iterator<Item = (SymbolId, &[Option<ProductionIdx>])> {
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, row)| (SymbolId::from_usize(self.first_non_terminal + i), row.as_slice()))
    }
}

pub fn generate_parse_table(
    symbols: &SymbolTable,
    productions: &[LoweredProduction],
    first_table: &FirstTable,
    follow_table: &FollowTable,
) -> ParseTable {
    let mut table = ParseTable::new(symbols);

    for (production_idx, production) in production_indices(productions) {
        let mut all_empty = true;
        for symbol in &production.body {
            let firsts = first_table.get_first(*symbol);
            for terminal in firsts.elems() {
                if terminal != EPSILON {
                    table.add(production.head, terminal, production_idx);
                }
            }
            if !first_table.is_nullable(*symbol) {
                all_empty = false;
                break;
            }
        }
        if all_empty {
            for terminal in follow_table.get_follow(production.head).elems() {
                table.add(production.head, terminal, production_idx);
            }
        }
    }

    log::debug!("parse table:\n{}", ParseTableDisplay { table: &table, symbols });

    table
}

pub struct ParseTableDisplay<'a> {
    pub table: &'a ParseTable,
    pub symbols: &'a SymbolTable,
}

impl<'a> fmt::Display for ParseTableDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (non_terminal, row) in self.table.rows() {
            write!(f, "{}:", self.symbols.name(non_terminal))?;
            for (token, cell) in row.iter().enumerate() {
                if let Some(production_idx) = cell {
                    write!(
                        f,
                        " {} => {}",
                        self.symbols.name(SymbolId::from_usize(token)),
                        production_idx.0
                    )?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
use crate::first::generate_first_table;

#[cfg(test)]
use crate::follow::generate_follow_table;

#[cfg(test)]
use crate::test_grammars::{analyze, CALC_GRAMMAR, EXPR_GRAMMAR};

#[cfg(test)]
fn build(src: &str) -> (SymbolTable, ParseTable) {
    let (_, symbols, productions) = analyze(src);
    let first_table = generate_first_table(&symbols, &productions);
    let follow_table = generate_follow_table(&symbols, &productions, &first_table);
    let table = generate_parse_table(&symbols, &productions, &first_table, &follow_table);
    (symbols, table)
}

#[test]
fn parse_table_calc() {
    let (symbols, table) = build(CALC_GRAMMAR);

    let expected = btreemap! {
        8 => vec![-1, -1, -1, -1, -1, -1, 0, 0],
        9 => vec![-1, -1, -1, -1, -1, -1, 5, 5],
        10 => vec![-1, -1, -1, -1, -1, -1, 1, 1],
        11 => vec![-1, -1, -1, -1, -1, -1, 9, 10],
        12 => vec![-1, 4, 2, 3, 4, 4, -1, -1],
        13 => vec![-1, 8, -1, -1, 6, 7, -1, -1],
    };

    assert_eq!(table.rows().count(), expected.len());
    for (id, row) in expected {
        assert_eq!(table.raw_row(SymbolId(id)).unwrap(), row, "row of {}", symbols.name(SymbolId(id)));
    }
}

#[test]
fn parse_table_expr() {
    let (_, table) = build(EXPR_GRAMMAR);

    let expected = btreemap! {
        7 => vec![-1, -1, -1, -1, 0, -1, 0],
        8 => vec![-1, -1, -1, -1, 3, -1, 3],
        9 => vec![-1, 2, 1, -1, -1, 2, -1],
        10 => vec![-1, -1, -1, -1, 6, -1, 7],
        11 => vec![-1, 5, 5, 4, -1, 5, -1],
    };

    for (id, row) in expected {
        assert_eq!(table.raw_row(SymbolId(id)).unwrap(), row);
    }
}

#[test]
fn parse_table_lookups() {
    let (symbols, table) = build(CALC_GRAMMAR);
    let mult_a = symbols.get("MultA").unwrap();
    let star = symbols.get("'*'").unwrap();

    assert_eq!(table.get(mult_a, star), Some(ProductionIdx(2)));
    assert_eq!(table.get(mult_a, symbols.get("floating").unwrap()), None);
    // Not a nonterminal
    assert_eq!(table.row(star), None);
    assert_eq!(table.get(star, star), None);
    // Out of range lookahead
    assert_eq!(table.get(mult_a, mult_a), None);
}

#[test]
fn parse_table_conflicts_overwrite() {
    // Both alternatives start with `a`, the later one wins
    let (symbols, table) = build("S : a b\n  | a c\n  ;\n");
    let s = symbols.get("S").unwrap();
    let a = symbols.get("a").unwrap();
    assert_eq!(table.get(s, a), Some(ProductionIdx(1)));
}

#[test]
fn parse_table_cells_match_first_and_follow() {
    let (_, symbols, productions) = analyze(EXPR_GRAMMAR);
    let first_table = generate_first_table(&symbols, &productions);
    let follow_table = generate_follow_table(&symbols, &productions, &first_table);
    let table = generate_parse_table(&symbols, &productions, &first_table, &follow_table);

    // The grammar is LL(1), so every cell is populated iff the lookahead predicts one of the
    // nonterminal's productions
    for (non_terminal, row) in table.rows() {
        for (token, cell) in row.iter().enumerate() {
            let token = SymbolId::from_usize(token);
            let predicted = productions.iter().any(|p| {
                if p.head != non_terminal {
                    return false;
                }
                let mut nullable = true;
                for symbol in &p.body {
                    if token != EPSILON && first_table.get_first(*symbol).get(&token) {
                        return true;
                    }
                    if !first_table.is_nullable(*symbol) {
                        nullable = false;
                        break;
                    }
                }
                nullable && follow_table.get_follow(non_terminal).get(&token)
            });
            assert_eq!(cell.is_some(), predicted);
        }
    }
}
