//! Implementation of "follow" sets

use crate::bitset::BitSet;
use crate::first::{FirstTable, SymbolSetDisplay};
use crate::lower::LoweredProduction;
use crate::symbols::{SymbolCategory, SymbolId, SymbolTable, END, EPSILON};

use std::fmt;

/// Maps nonterminals to their follow sets. Sets of tokens are always empty. Follow sets never
/// contain `EPSILON`, the end of input is `END`.
#[derive(Debug, Clone)]
pub struct FollowTable(Vec<BitSet<SymbolId>>);

impl FollowTable {
    fn new(symbols: &SymbolTable) -> FollowTable {
        let mut sets = Vec::with_capacity(symbols.n_symbols());
        for _ in symbols.symbol_ids() {
            sets.push(BitSet::new(symbols.n_tokens()));
        }
        FollowTable(sets)
    }

    /// Merges `set` into the follow set of `non_terminal`. Returns whether the set changed.
    fn add_follows(&mut self, non_terminal: SymbolId, set: &BitSet<SymbolId>) -> bool {
        self.0[non_terminal.as_usize()].union_with(set)
    }

    pub fn get_follow(&self, non_terminal: SymbolId) -> &BitSet<SymbolId> {
        &self.0[non_terminal.as_usize()]
    }
}

/// `productions[0]`'s head is the start symbol, which is followed by the end of input.
pub fn generate_follow_table(
    symbols: &SymbolTable,
    productions: &[LoweredProduction],
    first_table: &FirstTable,
) -> FollowTable {
    let mut table = FollowTable::new(symbols);

    let start = match productions.first() {
        Some(production) => production.head,
        None => return table,
    };
    table.0[start.as_usize()].set(&END);

    let mut updated = true;
    let mut round = 0;
    while updated {
        updated = false;
        round += 1;
        for production in productions {
            // What can follow the part of the body we've walked so far, right to left. Starts
            // as the head's follow set as everything after the last symbol is the head's
            // context.
            let mut trailer = table.get_follow(production.head).clone();

            for symbol in production.body.iter().rev() {
                let mut first = first_table.get_first(*symbol).clone();
                let nullable = first.remove(&EPSILON);

                if symbols.category(*symbol) == SymbolCategory::NonTerminal {
                    updated |= table.add_follows(*symbol, &trailer);
                }

                if nullable {
                    trailer.union_with(&first);
                } else {
                    trailer = first;
                }
            }
        }
        log::trace!("follow sets after round {}:\n{}", round, FollowTableDisplay { table: &table, symbols });
    }

    log::debug!("follow sets:\n{}", FollowTableDisplay { table: &table, symbols });

    table
}

struct FollowTableDisplay<'a> {
    table: &'a FollowTable,
    symbols: &'a SymbolTable,
}

impl<'a> fmt::Display for FollowTableDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.symbols.non_terminal_ids() {
            writeln!(
                f,
                "{}: {}",
                self.symbols.name(id),
                SymbolSetDisplay {
                    set: self.table.get_follow(id),
                    symbols: self.symbols
                }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
use crate::first::generate_first_table;

#[cfg(test)]
use crate::test_grammars::{analyze, ids, CALC_GRAMMAR, EXPR_GRAMMAR};

#[cfg(test)]
fn expect_follows(src: &str, expected: Vec<(&str, Vec<u32>)>) {
    let (_, symbols, productions) = analyze(src);
    let first_table = generate_first_table(&symbols, &productions);
    let table = generate_follow_table(&symbols, &productions, &first_table);

    let non_terminals: Vec<SymbolId> = symbols.non_terminal_ids().collect();
    assert_eq!(non_terminals.len(), expected.len());
    for (id, (name, set)) in non_terminals.into_iter().zip(expected.into_iter()) {
        assert_eq!(symbols.name(id), name);
        assert_eq!(ids(table.get_follow(id)), set, "follow({})", name);
    }
}

#[test]
fn follow_set_calc() {
    expect_follows(
        CALC_GRAMMAR,
        vec![
            ("Calc", vec![1]),
            ("Add", vec![1]),
            ("Mult", vec![1, 4, 5]),
            ("Num", vec![1, 2, 3, 4, 5]),
            ("MultA", vec![1, 4, 5]),
            ("AddA", vec![1]),
        ],
    );
}

#[test]
fn follow_set_expr() {
    expect_follows(
        EXPR_GRAMMAR,
        vec![
            ("E", vec![1, 5]),
            ("T", vec![1, 2, 5]),
            ("E2", vec![1, 5]),
            ("F", vec![1, 2, 3, 5]),
            ("T2", vec![1, 2, 5]),
        ],
    );
}

#[test]
fn follow_set_through_nullable_symbol() {
    // `X` is followed by `c` through the nullable `B`
    // Ids: c 2, b 3, x 4, S 5, X 6, B 7
    expect_follows(
        "S : X B c ;\nB : b | ;\nX : x ;\n",
        vec![("S", vec![1]), ("X", vec![2, 3]), ("B", vec![2])],
    );
}

#[test]
fn follow_set_properties() {
    let (_, symbols, productions) = analyze(EXPR_GRAMMAR);
    let first_table = generate_first_table(&symbols, &productions);
    let table = generate_follow_table(&symbols, &productions, &first_table);

    let start = symbols.get("E").unwrap();
    assert!(table.get_follow(start).get(&END));
    for id in symbols.symbol_ids() {
        assert!(!table.get_follow(id).get(&EPSILON));
    }
}
