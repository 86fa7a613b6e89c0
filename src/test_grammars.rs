// Grammar files shared by the unit tests

use crate::bitset::BitSet;
use crate::grammar::{parse_grammar, Grammar};
use crate::lexer::Lexer;
use crate::lower::{lower, LoweredProduction};
use crate::symbols::{merge, SymbolId, SymbolTable};

/// Parses a grammar section and runs it through the symbol merger
pub fn analyze(src: &str) -> (Grammar, SymbolTable, Vec<LoweredProduction>) {
    let grammar = parse_grammar(&mut Lexer::new(src.as_bytes())).unwrap();
    let symbols = merge(&grammar.literals, &grammar.terminals, &grammar.non_terminals);
    let productions = lower(&grammar, &symbols);
    (grammar, symbols, productions)
}

/// Sorted ids in a set
pub fn ids(set: &BitSet<SymbolId>) -> Vec<u32> {
    set.elems().map(|id| id.0).collect()
}

pub const CALC_HEADER: &str = r#"%package main     # Set the package of the generated file to "main"

%import scanner fmt os strconv  # import (
                                #   scanner
                                #   fmt
                                #   os
                                #   strconv
                                # )

# Replace the default { $$ = $1 } rule code with this custom code.
%defaultcode {
    fmt.Println("Default code. Assigning", $1, " to ", $$, "."); $$ = $1
}

# Define the custom value type for tokens
%union {
    fval float
    ival int
    op func(float)float
}

# Associate the "floating" terminal with the type of fval float
%token<fval> floating

# Associate the "integer" terminal with the type of ival int
%token<ival> integer

# Associate the "Calc", "Num", "Mult", and "Add" nonterminals with the type of fval float
%type<fval> Calc Num Mult Add

# Associate the "MultA" and "AddA" nonterminals with the type of op func(float)float
%type<op> MultA AddA
"#;

// Productions, in order:
//
// 0: Calc -> Add
// 1: Mult -> Num MultA
// 2: MultA -> '*' Mult
// 3: MultA -> '/' Mult
// 4: MultA -> {empty}
// 5: Add -> Mult AddA
// 6: AddA -> '+' Add
// 7: AddA -> '-' Add
// 8: AddA -> {empty}
// 9: Num -> floating
// 10: Num -> integer
//
// Ids: '' 0, $ 1, '*' 2, '/' 3, '+' 4, '-' 5, floating 6, integer 7, Calc 8, Add 9, Mult 10,
// Num 11, MultA 12, AddA 13
pub const CALC_GRAMMAR: &str = r#"Calc : Add        # This will use the code in %defaultcode
     ;

Mult : Num MultA        { fmt.Println("1. Found Mult->'*' Num."); $$ = $2($1) }
     ;

MultA : '*' Mult        { fmt.Println("2. Found MultA->'*' Mult."); $$ = mult($2) }
      | '/' Mult        { fmt.Println("3. Found MultA->'/' Mult."); $$ = div($2) }
      |                 { fmt.Println("4. Found MultA->{}."); $$ = noop }
      ;

Add : Mult AddA         { fmt.Println("5. Found Add->Mult AddA."); $$ = $2($1) }
    ;

AddA : '+' Add          { fmt.Println("6. Found AddA->'+' Add"); $$ = plus($2) }
     | '-' Add          { fmt.Println("7. Found AddA->'-' Add"); $$ = minus($2) }
     |                  { fmt.Println("8. Found AddA->{}"); $$ = noop}
     ;

Num : floating          { fmt.Println("9. Found Num->floating. Forwarding value", $1); $$ = float($1) }
    | integer           { fmt.Println("10. Found Num->integer. Forwarding value", $1); $$ = float($1) }
    ;

%%"#;

// 0: E -> T E2
// 1: E2 -> '+' T E2
// 2: E2 -> {empty}
// 3: T -> F T2
// 4: T2 -> '*' F T2
// 5: T2 -> {empty}
// 6: F -> '(' E ')'
// 7: F -> id
//
// Ids: '' 0, $ 1, '+' 2, '*' 3, '(' 4, ')' 5, id 6, E 7, T 8, E2 9, F 10, T2 11
pub const EXPR_GRAMMAR: &str = r#"
E  : T E2
   ;

E2 : '+' T E2
   |
   ;

T  : F T2
   ;

T2 : '*' F T2
   |
   ;

F  : '(' E ')'
   | id
   ;
"#;

pub fn calc_source() -> String {
    format!("{}%%\n{}", CALC_HEADER, CALC_GRAMMAR)
}
