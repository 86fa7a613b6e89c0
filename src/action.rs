//! Rewrites semantic actions for the generated parser
//!
//! Actions are opaque code in the target language. The only parts we understand are the
//! placeholders: `$$` is the value of the production's head, `$N` is the value of the `N`th
//! symbol in the body (1-based). Each placeholder is replaced with a field access on a value
//! stack slot, the field being the one declared for the symbol with `%token<field>` or
//! `%type<field>`.
//!
//! Literals are matched by the parser but never pushed to the value stack, so they don't get a
//! binding. They still occupy a position: in `MultA : '*' Mult` the value of `Mult` is `$2`.

use crate::grammar::Production;
use crate::header::Header;
use crate::lower::LoweredProduction;
use crate::symbols::{SymbolCategory, SymbolId, SymbolTable};

/// Names rendered into translated actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Variable holding the value of the production's head. `$$` becomes `<result_var>.<field>`.
    pub result_var: String,

    /// Prefix of the variables holding the values of body symbols. `$N` becomes
    /// `<binding_prefix>N.<field>`.
    pub binding_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            result_var: "lhs".to_owned(),
            binding_prefix: "rhs_".to_owned(),
        }
    }
}

/// A body symbol with a value on the value stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueBinding {
    /// 1-based position in the production body
    pub position: usize,
    pub symbol: SymbolId,
    /// Variable name, e.g. `rhs_2`
    pub var: String,
    /// Declared field of the symbol's value, if any
    pub field: Option<String>,
}

impl ValueBinding {
    /// What `$N` is replaced with
    pub fn access(&self) -> String {
        access(&self.var, self.field.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedAction {
    /// Values to pop before running the action, in body order. The generated parser pops them
    /// in this order.
    pub bindings: Vec<ValueBinding>,

    /// Action code with placeholders replaced
    pub code: String,
}

impl TranslatedAction {
    pub fn binding(&self, position: usize) -> Option<&ValueBinding> {
        self.bindings.iter().find(|b| b.position == position)
    }
}

fn access(var: &str, field: Option<&str>) -> String {
    match field {
        Some(field) => format!("{}.{}", var, field),
        None => var.to_owned(),
    }
}

fn declared_field<'a>(header: &'a Header, symbols: &SymbolTable, id: SymbolId) -> Option<&'a str> {
    let info = symbols.get_info(id);
    match info.category {
        SymbolCategory::Terminal => header.token_field(&info.name),
        SymbolCategory::NonTerminal => header.type_field(&info.name),
        SymbolCategory::Epsilon | SymbolCategory::EndMarker | SymbolCategory::Literal => None,
    }
}

/// Translates the action of a production, or `%defaultcode` if the production doesn't have one.
/// Productions without either get empty code, but still get their bindings.
pub fn translate_action(
    production: &Production,
    lowered: &LoweredProduction,
    symbols: &SymbolTable,
    header: &Header,
    options: &Options,
) -> TranslatedAction {
    let mut bindings = vec![];
    for (idx, symbol) in lowered.body.iter().enumerate() {
        if !symbols.category(*symbol).has_value() {
            continue;
        }
        let position = idx + 1;
        bindings.push(ValueBinding {
            position,
            symbol: *symbol,
            var: format!("{}{}", options.binding_prefix, position),
            field: declared_field(header, symbols, *symbol).map(str::to_owned),
        });
    }

    let template = match (&production.action, &header.default_code) {
        (Some(code), _) => code.as_str(),
        (None, Some(code)) => code.as_str(),
        (None, None) => "",
    };

    let result_field = declared_field(header, symbols, lowered.head);
    let code = substitute(template, |placeholder| match placeholder {
        Placeholder::Result => {
            if result_field.is_none() {
                log::warn!(
                    "{}: `$$` used but `{}` has no declared field",
                    production,
                    production.lhs
                );
            }
            Some(access(&options.result_var, result_field))
        }
        Placeholder::Position(position) => {
            let binding = bindings.iter().find(|b| b.position == position)?;
            if binding.field.is_none() {
                log::warn!(
                    "{}: `${}` used but `{}` has no declared field",
                    production,
                    position,
                    symbols.name(binding.symbol)
                );
            }
            Some(binding.access())
        }
    });

    log::trace!("{}: {:?} -> {:?}", production, template, code);

    TranslatedAction { bindings, code }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    /// `$$`
    Result,
    /// `$N`
    Position(usize),
}

/// Replaces `$$` and `$<digits>` in a single pass. Placeholders for which `replacement` returns
/// `None` are copied as they are.
fn substitute<F>(template: &str, mut replacement: F) -> String
where
    F: FnMut(Placeholder) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];

        if let Some(after_result) = after.strip_prefix('$') {
            match replacement(Placeholder::Result) {
                Some(text) => out.push_str(&text),
                None => out.push_str("$$"),
            }
            rest = after_result;
            continue;
        }

        let n_digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if n_digits == 0 {
            out.push('$');
            rest = after;
            continue;
        }

        let (digits, after_digits) = after.split_at(n_digits);
        let text = digits
            .parse::<usize>()
            .ok()
            .and_then(|position| replacement(Placeholder::Position(position)));
        match text {
            Some(text) => out.push_str(&text),
            None => {
                out.push('$');
                out.push_str(digits);
            }
        }
        rest = after_digits;
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
use crate::grammar::parse_grammar;

#[cfg(test)]
use crate::header::parse_headers;

#[cfg(test)]
use crate::lexer::Lexer;

#[cfg(test)]
use crate::lower::lower;

#[cfg(test)]
use crate::symbols::merge;

#[cfg(test)]
fn translate_all(src: &str, options: &Options) -> Vec<TranslatedAction> {
    let mut lexer = Lexer::new(src.as_bytes());
    let header = parse_headers(&mut lexer).unwrap();
    let grammar = parse_grammar(&mut lexer).unwrap();
    let symbols = merge(&grammar.literals, &grammar.terminals, &grammar.non_terminals);
    let lowered = lower(&grammar, &symbols);
    grammar
        .productions
        .iter()
        .zip(lowered.iter())
        .map(|(production, lowered)| translate_action(production, lowered, &symbols, &header, options))
        .collect()
}

#[cfg(test)]
fn binding_fields(action: &TranslatedAction) -> Vec<(usize, String, Option<String>)> {
    action
        .bindings
        .iter()
        .map(|b| (b.position, b.var.clone(), b.field.clone()))
        .collect()
}

#[test]
fn translate_mult() {
    let actions = translate_all(&crate::test_grammars::calc_source(), &Options::default());

    // Mult : Num MultA { ...; $$ = $2($1) }
    let mult = &actions[1];
    assert_eq!(
        mult.code,
        r#"{ fmt.Println("1. Found Mult->'*' Num."); lhs.fval = rhs_2.op(rhs_1.fval) }"#
    );
    assert_eq!(
        binding_fields(mult),
        vec![
            (1, "rhs_1".to_owned(), Some("fval".to_owned())),
            (2, "rhs_2".to_owned(), Some("op".to_owned())),
        ]
    );
    assert_eq!(mult.bindings[0].symbol, SymbolId(11));
    assert_eq!(mult.bindings[1].symbol, SymbolId(12));
}

#[test]
fn translate_skips_literals() {
    let actions = translate_all(&crate::test_grammars::calc_source(), &Options::default());

    // MultA : '*' Mult { ...; $$ = mult($2) }
    let mult_a = &actions[2];
    assert_eq!(
        binding_fields(mult_a),
        vec![(2, "rhs_2".to_owned(), Some("fval".to_owned()))]
    );
    assert_eq!(mult_a.binding(1), None);
    assert!(mult_a.code.ends_with("lhs.op = mult(rhs_2.fval) }"));

    // Epsilon alternative has no bindings
    let empty = &actions[4];
    assert!(empty.bindings.is_empty());
    assert!(empty.code.ends_with("lhs.op = noop }"));
}

#[test]
fn translate_default_code() {
    let actions = translate_all(&crate::test_grammars::calc_source(), &Options::default());

    // Calc : Add
    assert_eq!(
        actions[0].code,
        "{\n    fmt.Println(\"Default code. Assigning\", rhs_1.fval, \" to \", lhs.fval, \".\"); lhs.fval = rhs_1.fval\n}"
    );

    // Without `%defaultcode` the action is empty
    let actions = translate_all("%%\nS : a ;\n", &Options::default());
    assert_eq!(actions[0].code, "");
    assert_eq!(binding_fields(&actions[0]), vec![(1, "rhs_1".to_owned(), None)]);
}

#[test]
fn translate_terminal_values() {
    let actions = translate_all(&crate::test_grammars::calc_source(), &Options::default());

    // Num : integer { ...; $$ = float($1) }
    assert!(actions[10]
        .code
        .ends_with("Forwarding value\", rhs_1.ival); lhs.fval = float(rhs_1.ival) }"));
}

#[test]
fn translate_with_options() {
    let options = Options {
        result_var: "yyval".to_owned(),
        binding_prefix: "yyv".to_owned(),
    };
    let actions = translate_all(&crate::test_grammars::calc_source(), &options);
    assert!(actions[5].code.ends_with("yyval.fval = yyv2.op(yyv1.fval) }"));
}

#[test]
fn translate_placeholder_edge_cases() {
    let src = "%union {\n  v int\n}\n%token<v> a b\n%type<v> S\n%%\n\
               S : a b a b a b a b a b { $$ = $10 + $1; $11; $ x $$$; cost$ }\n  ;\n";
    let actions = translate_all(src, &Options::default());
    assert_eq!(
        actions[0].code,
        "{ lhs.v = rhs_10.v + rhs_1.v; $11; $ x lhs.v$; cost$ }"
    );
}

#[test]
fn translate_undeclared_fields() {
    let src = "%%\nS : 'x' A { $$ = $1 + $2 }\n  ;\nA : a ;\n";
    let actions = translate_all(src, &Options::default());
    // `$1` is a literal, `A` has no field
    assert_eq!(actions[0].code, "{ lhs = $1 + rhs_2 }");
}

#[test]
fn substitute_scan() {
    let code = substitute("$$ $1 $12 $0 $ $a", |p| match p {
        Placeholder::Result => Some("R".to_owned()),
        Placeholder::Position(1) => Some("P1".to_owned()),
        Placeholder::Position(_) => None,
    });
    assert_eq!(code, "R P1 $12 $0 $ $a");
}
