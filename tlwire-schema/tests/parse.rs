use tlwire_schema::errors::ParamParseError;
use tlwire_schema::tl::{Category, ParameterType};
use tlwire_schema::{ParseError, parse_layer, parse_tl_file};

#[test]
fn parses_simple_type() {
    let defs: Vec<_> = parse_tl_file("boolFalse#bc799737 = Bool;").collect::<Result<_, _>>().unwrap();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].name, "boolFalse");
    assert_eq!(defs[0].id, 0xbc799737);
    assert_eq!(defs[0].ty.name, "Bool");
}

#[test]
fn parses_function_category() {
    let src = "
---functions---
help.getConfig#c4f9186b = Config;
";
    let defs: Vec<_> = parse_tl_file(src).collect::<Result<_, _>>().unwrap();
    assert_eq!(defs[0].category, Category::Functions);
    assert_eq!(defs[0].name, "getConfig");
    assert_eq!(defs[0].namespace, vec!["help"]);
    assert_eq!(defs[0].full_name(), "help.getConfig");
}

#[test]
fn parses_flagged_parameter() {
    let src = "user#3ff6ecb0 flags:# id:long username:flags.0?string = User;";
    let defs: Vec<_> = parse_tl_file(src).collect::<Result<_, _>>().unwrap();
    let params = &defs[0].params;
    assert_eq!(params.len(), 3);
    assert!(params[0].is_flag_word());
    match &params[2].ty {
        ParameterType::Normal { ty, flag: Some(flag) } => {
            assert_eq!(ty.name, "string");
            assert_eq!((flag.name.as_str(), flag.index), ("flags", 0));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn skips_blank_lines_and_comments() {
    let src = "
// this is a comment
boolTrue#997275b5 = Bool; // trailing comment

boolFalse#bc799737 = Bool;
";
    assert_eq!(parse_tl_file(src).filter(Result::is_ok).count(), 2);
}

#[test]
fn definition_spanning_lines() {
    let src = "
pong#347773c5
    msg_id:long
    ping_id:long
    = Pong;
";
    let defs: Vec<_> = parse_tl_file(src).collect::<Result<_, _>>().unwrap();
    assert_eq!(defs[0].params.len(), 2);
}

#[test]
fn crc32_derived_id() {
    let defs: Vec<_> = parse_tl_file("boolFalse = Bool;").collect::<Result<_, _>>().unwrap();
    assert_eq!(defs[0].id, 0xbc799737);
}

#[test]
fn generic_parameters() {
    let src = "invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X;";
    let defs: Vec<_> = parse_tl_file(src).collect::<Result<_, _>>().unwrap();
    assert_eq!(defs[0].params.len(), 2);
    assert!(defs[0].ty.generic_ref);
    assert_eq!(defs[0].params[1].to_string(), "query:!X");
    assert!(defs[0].to_string().starts_with("invokeWithLayer#da9b0d0d {X:Type} layer:int"));
}

#[test]
fn builtin_lines_are_not_implemented() {
    for src in ["int ? = Int;", "vector#1cb5c415 {t:Type} # [ t ] = Vector t;"] {
        let results: Vec<_> = parse_tl_file(src).collect();
        assert_eq!(results, vec![Err(ParseError::NotImplemented)], "{src}");
    }
}

#[test]
fn undeclared_flag_word() {
    let results: Vec<_> = parse_tl_file("bad#00000001 a:flags.0?int = Bad;").collect();
    assert_eq!(results, vec![Err(ParseError::InvalidParam(ParamParseError::MissingDef))]);
}

#[test]
fn bad_id() {
    let mut results = parse_tl_file("bad#xyz = Bad;");
    assert!(matches!(results.next(), Some(Err(ParseError::InvalidId(_)))));
}

#[test]
fn layer_marker() {
    assert_eq!(parse_layer("// LAYER 158\nfoo#00000001 = Foo;\n// LAYER 190"), Some(190));
    assert_eq!(parse_layer("foo#00000001 = Foo;"), None);
}
