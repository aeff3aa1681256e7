//! Schema DSL tests: syntax (parse success/failure) and semantics
//! (references, reification, codec behaviour of parsed schemas).

use binschema::value::map;
use binschema::{parse, parse_one, Value};

#[test]
fn parse_empty_source() {
    let set = parse("").expect("empty source parses");
    assert!(set.is_empty());
}

#[test]
fn parse_minimal_record() {
    let set = parse(
        r#"
m = record {
  x: u1;
}
"#,
    )
    .expect("parse");
    let desc = set.get("m").expect("m");
    assert_eq!(desc.kind, "record");
    assert_eq!(desc.children.len(), 1);
    assert_eq!(desc.children[0].name.as_deref(), Some("x"));
    assert_eq!(desc.children[0].kind, "u1");
}

#[test]
fn parse_all_primitive_names() {
    let set = parse(
        r#"
all = record {
  a: u1;
  b: u1c;
  c: u2l;
  d: u4b;
  e: u8l;
  f: i1;
  g: i2b;
  h: i4l;
  i: i8b;
  j: f4l;
  k: f8b;
  l: uv;
  m: iv;
  n: bool;
  o: cstr;
  p: str(4);
  q: bytes(2);
  r: i2b[];
}
"#,
    )
    .expect("parse");
    let desc = set.get("all").expect("all");
    assert_eq!(desc.children.len(), 18);
    assert_eq!(desc.children[15].args, vec![4]);
    assert_eq!(desc.children[17].kind, "i2b[]");
}

#[test]
fn parse_with_comments() {
    let set = parse(
        r#"
// line comment
m = record {
  id: u1; // trailing
  /* block */ len: u2b;
}
"#,
    )
    .expect("parse");
    assert_eq!(set.get("m").expect("m").children.len(), 2);
}

#[test]
fn parse_composites() {
    let set = parse(
        r#"
point = tuple {
  i2l;
  i2l;
}

shape = record {
  kind: u1 = 1;
  points: head_array(uv, point);
  label: head_prim(u1, str);
  samples: array(f4l, 4);
}
"#,
    )
    .expect("parse");
    let shape = set.get("shape").expect("shape");
    assert_eq!(shape.children.len(), 4);
    assert_eq!(shape.children[0].default, Some(Value::I64(1)));
    assert_eq!(shape.children[1].kind, "head_array");
    assert_eq!(shape.children[1].head.as_deref(), Some("uv"));
    assert_eq!(shape.children[1].children[0].kind, "tuple");
    assert_eq!(shape.children[3].kind, "array");
    assert_eq!(shape.children[3].args, vec![4]);
}

#[test]
fn parse_enum_with_default() {
    let set = parse(
        r#"
tag = enum {
  "SOI" = 0xFFD8;
  "EOI" = 0xFFD9;
  7 = "lucky";
  else u2b;
}
"#,
    )
    .expect("parse");
    let desc = set.get("tag").expect("tag");
    assert_eq!(desc.kind, "enum");
    assert_eq!(desc.children.len(), 4);
    assert_eq!(desc.children[0].kind, "enum_entry");
    assert_eq!(desc.children[0].value, Some(Value::Str("SOI".to_string())));
    assert_eq!(desc.children[0].literal, vec![0xFF, 0xD8]);
    assert_eq!(desc.children[2].value, Some(Value::I64(7)));
    assert_eq!(desc.children[2].literal, b"lucky".to_vec());
    assert_eq!(desc.children[3].kind, "u2b");

    let schema = set.make("tag").expect("make");
    let (v, n) = schema.decode(&[0xFF, 0xD8], 0).expect("decode");
    assert_eq!((v, n), (Value::Str("SOI".to_string()), 2));
}

#[test]
fn references_resolve_in_order() {
    let set = parse(
        r#"
item = record {
  id: u2l;
  count: u1;
}

inventory = record {
  items: head_array(u1, item);
}
"#,
    )
    .expect("parse");
    // The reference is expanded inline.
    let inv = set.get("inventory").expect("inventory");
    assert_eq!(inv.children[0].children[0].kind, "record");

    let schema = set.make("inventory").expect("make");
    let v = map(vec![(
        "items",
        Value::List(vec![map(vec![
            ("id", Value::U16(0x1001)),
            ("count", Value::U8(3)),
        ])]),
    )]);
    let bytes = schema.encode(&v).expect("encode");
    assert_eq!(bytes, [1, 0x01, 0x10, 3]);
    let (back, n) = schema.decode(&bytes, 0).expect("decode");
    assert_eq!((back, n), (v, 4));
}

#[test]
fn undefined_reference_fails() {
    let err = parse(
        r#"
m = record {
  x: missing;
}
"#,
    )
    .unwrap_err();
    assert!(err.contains("undefined"), "got: {}", err);
}

#[test]
fn duplicate_definition_fails() {
    let err = parse(
        r#"
m = record { x: u1; }
m = record { y: u1; }
"#,
    )
    .unwrap_err();
    assert!(err.contains("Duplicate"), "got: {}", err);
}

#[test]
fn syntax_errors_fail() {
    assert!(parse("m = record {").is_err());
    assert!(parse("m = record { x u1; }").is_err());
    assert!(parse("= record { x: u1; }").is_err());
    assert!(parse("m = array()").is_err());
}

#[test]
fn parse_one_roundtrip() {
    let schema = parse_one(
        r#"
player = record {
  name: head_prim(u1, str);
  level: uv;
  items: head_array(u1, record {
    id: u2l;
    count: u1;
  });
}
"#,
        "player",
    )
    .expect("parse_one");

    let v = map(vec![
        ("name", Value::Str("creeper".to_string())),
        ("level", Value::U64(300)),
        (
            "items",
            Value::List(vec![map(vec![
                ("id", Value::U16(7)),
                ("count", Value::U8(2)),
            ])]),
        ),
    ]);
    let bytes = schema.encode(&v).expect("encode");
    let (back, n) = schema.decode(&bytes, 0).expect("decode");
    assert_eq!(n, bytes.len());
    assert_eq!(back, v);
}

#[test]
fn field_named_like_a_keyword_prefix() {
    // Identifiers that merely start with a primitive name still parse.
    let set = parse(
        r#"
m = record {
  strength: u1;
  bytes_total: u2l;
}
"#,
    )
    .expect("parse");
    let m = set.get("m").expect("m");
    assert_eq!(m.children[0].name.as_deref(), Some("strength"));
    assert_eq!(m.children[1].name.as_deref(), Some("bytes_total"));
}
