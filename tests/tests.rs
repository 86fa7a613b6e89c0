use llgen::symbols::SymbolId;
use llgen::{compile, compile_with, recognize, ErrorKind, Options, ParseError};

const CALC: &str = include_str!("calc.grammar");

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn names(artifact: &llgen::Artifact, ids: Option<Vec<SymbolId>>) -> Vec<String> {
    ids.unwrap()
        .into_iter()
        .map(|id| artifact.symbols.name(id).to_owned())
        .collect()
}

#[test]
fn calc_end_to_end() {
    init_logger();

    let artifact = compile(CALC.as_bytes()).unwrap();

    assert_eq!(artifact.header.package, "main");
    assert_eq!(
        artifact.header.union_fields.iter().collect::<Vec<_>>(),
        vec![
            (&"fval".to_owned(), &"float".to_owned()),
            (&"ival".to_owned(), &"int".to_owned()),
            (&"op".to_owned(), &"func(float)float".to_owned()),
        ]
    );

    assert_eq!(artifact.min_token(), SymbolId(6));
    assert_eq!(artifact.max_token(), SymbolId(7));

    assert_eq!(names(&artifact, artifact.first_of("MultA")), vec!["", "'*'", "'/'"]);
    assert_eq!(names(&artifact, artifact.first_of("Calc")), vec!["floating", "integer"]);
    assert_eq!(names(&artifact, artifact.follow_of("Mult")), vec!["$", "'+'", "'-'"]);
    assert_eq!(
        names(&artifact, artifact.follow_of("Num")),
        vec!["$", "'*'", "'/'", "'+'", "'-'"]
    );

    assert_eq!(artifact.row("Calc"), Some(vec![-1, -1, -1, -1, -1, -1, 0, 0]));
    assert_eq!(artifact.row("Num"), Some(vec![-1, -1, -1, -1, -1, -1, 9, 10]));
    assert_eq!(artifact.row("MultA"), Some(vec![-1, 4, 2, 3, 4, 4, -1, -1]));
    assert_eq!(artifact.row("AddA"), Some(vec![-1, 8, -1, -1, 6, 7, -1, -1]));

    assert_eq!(artifact.productions.len(), 11);
    for production in &artifact.productions {
        assert!(!production.action.code.contains("$$"));
    }
    assert!(artifact.trailing.starts_with(b"\n\nfunc mult(x float)"));
    assert!(artifact.trailing.ends_with(b"{ return x }\n"));
}

#[test]
fn calc_recognize() {
    init_logger();

    let artifact = compile(CALC.as_bytes()).unwrap();

    let derivation = recognize(&artifact, &["floating", "/", "integer", "-", "floating"]).unwrap();
    let first = derivation.0.first().unwrap();
    let last = derivation.reductions().last().unwrap();
    assert_eq!(first, &last);
    assert_eq!(artifact.production(last).head, artifact.start());

    // Each reduction pops the values its action binds
    let mut values = 0usize;
    for production in derivation.reductions() {
        let production = artifact.production(production);
        for symbol in &production.body {
            if artifact.symbols.category(*symbol) == llgen::symbols::SymbolCategory::Terminal {
                values += 1;
            }
        }
    }
    assert_eq!(values, 3);

    assert!(matches!(
        recognize(&artifact, &["floating", "/"]),
        Err(ParseError::NoProduction { position: 2, .. })
    ));
}

#[test]
fn list_grammar() {
    init_logger();

    let src = r#"
%package lists
%union {
    items []Item
    item Item
}
%token<item> atom
%type<items> List Items Rest

%%

List  : '[' Items ']'      { $$ = $2 }
      ;

Items : Elem Rest          { $$ = append([]Item{$1}, $2...) }
      |                    { $$ = nil }
      ;

Rest  : ',' Elem Rest      { $$ = append([]Item{$2}, $3...) }
      |                    { $$ = nil }
      ;

Elem  : atom
      | List               { $$ = Item{children: $1} }
      ;
"#;
    let artifact = compile(src.as_bytes()).unwrap();

    // '' $ '[' ']' ',' atom List Items Elem Rest
    assert_eq!(artifact.min_token(), SymbolId(5));
    assert_eq!(artifact.max_token(), SymbolId(5));
    assert_eq!(artifact.row("List"), Some(vec![-1, -1, 0, -1, -1, -1]));
    assert_eq!(artifact.row("Items"), Some(vec![-1, -1, 1, 2, -1, 1]));
    assert_eq!(artifact.row("Rest"), Some(vec![-1, -1, -1, 4, 3, -1]));
    assert_eq!(artifact.row("Elem"), Some(vec![-1, -1, 6, -1, -1, 5]));

    // `'['` is skipped, `Items` is still `$2`
    assert_eq!(artifact.productions[0].action.code, "{ lhs.items = rhs_2.items }");
    assert_eq!(
        artifact.productions[3].action.code,
        "{ lhs.items = append([]Item{rhs_2}, rhs_3.items...) }"
    );
    // No action and no default code
    assert_eq!(artifact.productions[5].action.code, "");

    let derivation = recognize(&artifact, &["[", "atom", ",", "[", "]", "]"]).unwrap();
    assert_eq!(
        derivation.0.iter().map(|p| p.0).collect::<Vec<_>>(),
        vec![0, 1, 5, 3, 6, 0, 2, 4]
    );
}

#[test]
fn custom_options() {
    init_logger();

    let options = Options {
        result_var: "yyVAL".to_owned(),
        binding_prefix: "yyS".to_owned(),
    };
    let artifact = compile_with(CALC.as_bytes(), &options).unwrap();
    let code = &artifact.productions[5].action.code;
    assert!(code.ends_with("yyVAL.fval = yyS2.op(yyS1.fval) }"), "{}", code);
    assert_eq!(artifact.productions[5].action.bindings[1].var, "yyS2");
}

#[test]
fn conflicting_alternatives_overwrite() {
    init_logger();

    let artifact = compile(b"%%\nS : a b\n  | a c\n  | d\n  ;\n").unwrap();
    // ids: a 2, b 3, c 4, d 5
    assert_eq!(artifact.row("S"), Some(vec![-1, -1, 1, -1, -1, 2]));
}

fn expect_error_kind(src: &[u8], kind: ErrorKind) {
    let err = compile(src).unwrap_err();
    assert_eq!(err.kind(), kind, "{:?}: {}", String::from_utf8_lossy(src), err);
}

#[test]
fn error_kinds() {
    init_logger();

    expect_error_kind(b"%unknown x\n%%\nS : a ;\n", ErrorKind::Structural);
    expect_error_kind(b"%token floating\n%%\nS : a ;\n", ErrorKind::Structural);
    expect_error_kind(b"%union {\n  fval\n}\n%%\nS : a ;\n", ErrorKind::Structural);
    expect_error_kind(b"%package\n", ErrorKind::Structural);
    expect_error_kind(b"%package", ErrorKind::EndOfInput);
    expect_error_kind(b"%%\nS a ;\n", ErrorKind::Structural);
    expect_error_kind(b"%%\nS : a b c", ErrorKind::EndOfInput);
    expect_error_kind(b"%%\nS : a { $$ = 1 } b ;\n", ErrorKind::Structural);
    expect_error_kind(b"%defaultcode { {\n", ErrorKind::EndOfInput);
    expect_error_kind(b"%%\nS : '\xc3\x28' ;\n", ErrorKind::Encoding);
    expect_error_kind(b"%%\n%%\n", ErrorKind::Structural);
}

#[test]
fn structural_errors_name_the_rule() {
    init_logger();

    let err = compile(b"%%\nS : a ;\nMult : Num\n  Other ;\n").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("rule `Mult`"), "{}", message);

    let err = compile(b"%union {\n  fval\n}\n%%\n").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("directive `%union`"), "{}", message);
}
