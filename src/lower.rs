//! Resolves symbol names in productions to merged ids

use crate::grammar::{Grammar, Production, ProductionIdx};
use crate::symbols::{SymbolId, SymbolTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredProduction {
    pub head: SymbolId,
    pub body: Vec<SymbolId>,
}

/// Lowers all productions, in order. Indices in the returned vector are `ProductionIdx`s.
///
/// `symbols` must be merged from `grammar`'s registries, otherwise this panics.
pub(crate) fn lower(grammar: &Grammar, symbols: &SymbolTable) -> Vec<LoweredProduction> {
    grammar
        .productions
        .iter()
        .map(|production| lower_production(production, symbols))
        .collect()
}

fn lower_production(production: &Production, symbols: &SymbolTable) -> LoweredProduction {
    let id = |name: &str| match symbols.get(name) {
        Some(id) => id,
        None => panic!("symbol {:?} is not in the symbol table", name),
    };
    LoweredProduction {
        head: id(production.lhs.as_str()),
        body: production.body.iter().map(|symbol| id(symbol.as_str())).collect(),
    }
}

pub fn production_indices(
    productions: &[LoweredProduction],
) -> impl Iterator<Item = (ProductionIdx, &LoweredProduction)> {
    productions
        .iter()
        .enumerate()
        .map(|(i, p)| (ProductionIdx::from_usize(i), p))
}

#[test]
fn lower_calc() {
    let (_, _, productions) = crate::test_grammars::analyze(crate::test_grammars::CALC_GRAMMAR);
    assert_eq!(productions.len(), 11);
    // Mult -> Num MultA
    assert_eq!(
        productions[1],
        LoweredProduction {
            head: SymbolId(10),
            body: vec![SymbolId(11), SymbolId(12)],
        }
    );
    // MultA -> {empty}
    assert_eq!(
        productions[4],
        LoweredProduction {
            head: SymbolId(12),
            body: vec![],
        }
    );
    // AddA -> '-' Add
    assert_eq!(productions[7].body, vec![SymbolId(5), SymbolId(9)]);
}
