//! Implementation of "first" sets

use crate::bitset::BitSet;
use crate::lower::LoweredProduction;
use crate::symbols::{SymbolCategory, SymbolId, SymbolTable, EPSILON};

use std::fmt;

/// Maps every symbol to its first set. Sets hold lookahead ids, with `EPSILON` standing for the
/// empty string.
#[derive(Debug, Clone)]
pub struct FirstTable(Vec<BitSet<SymbolId>>);

impl FirstTable {
    /// Epsilon starts with `{EPSILON}`, tokens with themselves, nonterminals empty
    fn new(symbols: &SymbolTable) -> FirstTable {
        let mut sets = Vec::with_capacity(symbols.n_symbols());
        for id in symbols.symbol_ids() {
            let mut set = BitSet::new(symbols.n_tokens());
            if symbols.category(id) != SymbolCategory::NonTerminal {
                set.set(&id);
            }
            sets.push(set);
        }
        FirstTable(sets)
    }

    pub fn get_first(&self, symbol: SymbolId) -> &BitSet<SymbolId> {
        &self.0[symbol.as_usize()]
    }

    pub fn is_nullable(&self, symbol: SymbolId) -> bool {
        self.get_first(symbol).get(&EPSILON)
    }

    /// Merges `first` into the set of `head`, without epsilon. Returns whether the set changed.
    fn add_firsts(&mut self, head: SymbolId, first: &BitSet<SymbolId>) -> bool {
        let mut first = first.clone();
        first.remove(&EPSILON);
        self.0[head.as_usize()].union_with(&first)
    }

    /// Returns whether the value is changed
    fn set_empty(&mut self, head: SymbolId) -> bool {
        self.0[head.as_usize()].set(&EPSILON)
    }
}

pub fn generate_first_table(
    symbols: &SymbolTable,
    productions: &[LoweredProduction],
) -> FirstTable {
    let mut table = FirstTable::new(symbols);

    let mut updated = true;
    let mut round = 0;
    while updated {
        updated = false;
        round += 1;
        'production_loop: for production in productions {
            for symbol in &production.body {
                // TODO: clone below to avoid borrowck issues
                let first = table.get_first(*symbol).clone();
                updated |= table.add_firsts(production.head, &first);
                if !first.get(&EPSILON) {
                    continue 'production_loop;
                }
            }
            // If we reached here then all symbols in the production are nullable (or there
            // aren't any), so the head is nullable too
            updated |= table.set_empty(production.head);
        }
        log::trace!("first sets after round {}:\n{}", round, FirstTableDisplay { table: &table, symbols });
    }

    log::debug!("first sets:\n{}", FirstTableDisplay { table: &table, symbols });

    table
}

/// Prints a set of ids with symbol names
pub struct SymbolSetDisplay<'a> {
    pub set: &'a BitSet<SymbolId>,
    pub symbols: &'a SymbolTable,
}

impl<'a> fmt::Display for SymbolSetDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, id) in self.set.elems().enumerate() {
            if idx != 0 {
                write!(f, ", ")?;
            }
            if id == EPSILON {
                write!(f, "(empty)")?;
            } else {
                write!(f, "{}", self.symbols.name(id))?;
            }
        }
        write!(f, "}}")
    }
}

struct FirstTableDisplay<'a> {
    table: &'a FirstTable,
    symbols: &'a SymbolTable,
}

impl<'a> fmt::Display for FirstTableDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.symbols.non_terminal_ids() {
            writeln!(
                f,
                "{}: {}",
                self.symbols.name(id),
                SymbolSetDisplay {
                    set: self.table.get_first(id),
                    symbols: self.symbols
                }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
use crate::test_grammars::{analyze, ids, CALC_GRAMMAR, EXPR_GRAMMAR};

#[cfg(test)]
fn first_ids(src: &str) -> Vec<(String, Vec<u32>)> {
    let (_, symbols, productions) = analyze(src);
    let table = generate_first_table(&symbols, &productions);
    symbols
        .symbol_ids()
        .map(|id| (symbols.name(id).to_owned(), ids(table.get_first(id))))
        .collect()
}

#[cfg(test)]
fn expect_firsts(src: &str, expected: Vec<(&str, Vec<u32>)>) {
    let got = first_ids(src);
    assert_eq!(got.len(), expected.len());
    for ((name, set), (expected_name, expected_set)) in got.iter().zip(expected.iter()) {
        assert_eq!(name, expected_name);
        assert_eq!(set, expected_set, "first({})", name);
    }
}

#[test]
fn first_set_calc() {
    expect_firsts(
        CALC_GRAMMAR,
        vec![
            ("", vec![0]),
            ("$", vec![1]),
            ("'*'", vec![2]),
            ("'/'", vec![3]),
            ("'+'", vec![4]),
            ("'-'", vec![5]),
            ("floating", vec![6]),
            ("integer", vec![7]),
            ("Calc", vec![6, 7]),
            ("Add", vec![6, 7]),
            ("Mult", vec![6, 7]),
            ("Num", vec![6, 7]),
            ("MultA", vec![0, 2, 3]),
            ("AddA", vec![0, 4, 5]),
        ],
    );
}

#[test]
fn first_set_expr() {
    expect_firsts(
        EXPR_GRAMMAR,
        vec![
            ("", vec![0]),
            ("$", vec![1]),
            ("'+'", vec![2]),
            ("'*'", vec![3]),
            ("'('", vec![4]),
            ("')'", vec![5]),
            ("id", vec![6]),
            ("E", vec![4, 6]),
            ("T", vec![4, 6]),
            ("E2", vec![0, 2]),
            ("F", vec![4, 6]),
            ("T2", vec![0, 3]),
        ],
    );
}

#[test]
fn first_set_nullable_prefix() {
    // `B` is nullable but `c` isn't, so `A` isn't nullable
    expect_firsts(
        "A : B c ;\nB : b\n  |\n  ;\nC : B B ;\n",
        vec![
            ("", vec![0]),
            ("$", vec![1]),
            ("c", vec![2]),
            ("b", vec![3]),
            ("A", vec![2, 3]),
            ("B", vec![0, 3]),
            ("C", vec![0, 3]),
        ],
    );
}

#[test]
fn first_set_left_to_right_fixpoint() {
    // `S` is defined before the nonterminals it depends on, so this takes multiple rounds
    expect_firsts(
        "S : A ;\nA : B ;\nB : C x ;\nC : y | ;\n",
        vec![
            ("", vec![0]),
            ("$", vec![1]),
            ("x", vec![2]),
            ("y", vec![3]),
            ("S", vec![2, 3]),
            ("A", vec![2, 3]),
            ("B", vec![2, 3]),
            ("C", vec![0, 3]),
        ],
    );
}

#[test]
fn first_set_properties() {
    let (_, symbols, productions) = analyze(CALC_GRAMMAR);
    let table = generate_first_table(&symbols, &productions);

    for id in symbols.symbol_ids() {
        let set = ids(table.get_first(id));
        if symbols.category(id).is_token() {
            assert_eq!(set, vec![id.0]);
        }
        // Only epsilon's first set is exactly `{EPSILON}`
        assert_eq!(set == vec![0], id == EPSILON);
    }
}
