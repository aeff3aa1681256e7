//! Primitive codec tests: fixed-width wire formats, VLQ boundaries, string
//! and byte forms, and the sequence helper.

use binschema::error::CodecError;
use binschema::prim::{decode_prim, encode_prim, PrimType};
use binschema::seq;
use binschema::Value;

fn ty(name: &str) -> PrimType {
    PrimType::parse(name).expect(name)
}

fn roundtrip(name: &str, v: Value) {
    let t = ty(name);
    let bytes = encode_prim(&t, &v, &[]).expect("encode");
    let (back, n) = decode_prim(&t, &bytes, 0, &[]).expect("decode");
    assert_eq!(n, bytes.len(), "{}: bytesize", name);
    assert_eq!(back, v, "{}: value", name);
}

#[test]
fn fixed_width_expected_bytes() {
    assert_eq!(
        encode_prim(&ty("u2l"), &Value::U16(0x1234), &[]).expect("encode"),
        [0x34, 0x12]
    );
    assert_eq!(
        encode_prim(&ty("u2b"), &Value::U16(0x1234), &[]).expect("encode"),
        [0x12, 0x34]
    );
    assert_eq!(
        encode_prim(&ty("i2b"), &Value::I16(-2822), &[]).expect("encode"),
        [0xF4, 0xFA]
    );
    assert_eq!(
        encode_prim(&ty("u4b"), &Value::U32(0xDEADBEEF), &[]).expect("encode"),
        [0xDE, 0xAD, 0xBE, 0xEF]
    );
    assert_eq!(
        encode_prim(&ty("u8l"), &Value::U64(1), &[]).expect("encode"),
        [1, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn fixed_width_roundtrips() {
    roundtrip("u1", Value::U8(0));
    roundtrip("u1", Value::U8(255));
    roundtrip("u2l", Value::U16(0xBEEF));
    roundtrip("u4b", Value::U32(u32::MAX));
    roundtrip("u8b", Value::U64(u64::MAX));
    roundtrip("i1", Value::I8(-128));
    roundtrip("i2l", Value::I16(i16::MIN));
    roundtrip("i4b", Value::I32(i32::MIN));
    roundtrip("i8l", Value::I64(i64::MIN));
    roundtrip("f4l", Value::Float(1.5));
    roundtrip("f4b", Value::Float(-0.25));
    roundtrip("f8l", Value::Double(std::f64::consts::PI));
    roundtrip("f8b", Value::Double(f64::INFINITY));
    roundtrip("bool", Value::Bool(true));
    roundtrip("bool", Value::Bool(false));
    roundtrip("uv", Value::U64(u64::MAX));
    roundtrip("iv", Value::I64(i64::MIN));
}

#[test]
fn unsigned_range_checks() {
    assert!(encode_prim(&ty("u1"), &Value::U16(256), &[]).is_err());
    assert!(encode_prim(&ty("u2l"), &Value::I32(-1), &[]).is_err());
    assert!(encode_prim(&ty("u4b"), &Value::U64(1 << 32), &[]).is_err());
    assert!(encode_prim(&ty("i1"), &Value::I16(128), &[]).is_err());
}

#[test]
fn clamped_byte() {
    let t = ty("u1c");
    assert_eq!(encode_prim(&t, &Value::I32(-5), &[]).expect("encode"), [0]);
    assert_eq!(encode_prim(&t, &Value::I32(300), &[]).expect("encode"), [255]);
    assert_eq!(encode_prim(&t, &Value::U8(7), &[]).expect("encode"), [7]);
    let (v, n) = decode_prim(&t, &[42], 0, &[]).expect("decode");
    assert_eq!((v, n), (Value::U8(42), 1));
}

#[test]
fn bool_decode_nonzero_is_true() {
    let (v, _) = decode_prim(&ty("bool"), &[0x7F], 0, &[]).expect("decode");
    assert_eq!(v, Value::Bool(true));
    let (v, _) = decode_prim(&ty("bool"), &[0x00], 0, &[]).expect("decode");
    assert_eq!(v, Value::Bool(false));
}

#[test]
fn cstr_terminator() {
    let t = ty("cstr");
    let bytes = encode_prim(&t, &Value::Str("hi".to_string()), &[]).expect("encode");
    assert_eq!(bytes, [b'h', b'i', 0]);
    let (v, n) = decode_prim(&t, &bytes, 0, &[]).expect("decode");
    assert_eq!((v, n), (Value::Str("hi".to_string()), 3));

    // Empty string is just the terminator.
    let bytes = encode_prim(&t, &Value::Str(String::new()), &[]).expect("encode");
    assert_eq!(bytes, [0]);
    let (v, n) = decode_prim(&t, &bytes, 0, &[]).expect("decode");
    assert_eq!((v, n), (Value::Str(String::new()), 1));
}

#[test]
fn cstr_interior_nul_rejected() {
    let err = encode_prim(&ty("cstr"), &Value::Str("a\0b".to_string()), &[]).unwrap_err();
    assert!(matches!(err, CodecError::InteriorNul));
}

#[test]
fn cstr_unterminated_underflows() {
    let err = decode_prim(&ty("cstr"), b"abc", 0, &[]).unwrap_err();
    assert!(matches!(err, CodecError::Underflow { .. }));
}

#[test]
fn str_and_bytes_need_length() {
    let buf = b"abcdef";
    let (v, n) = decode_prim(&ty("str"), buf, 0, &[4]).expect("decode");
    assert_eq!((v, n), (Value::Str("abcd".to_string()), 4));
    let (v, n) = decode_prim(&ty("bytes"), buf, 2, &[3]).expect("decode");
    assert_eq!((v, n), (Value::Bytes(b"cde".to_vec()), 3));

    assert!(matches!(
        decode_prim(&ty("str"), buf, 0, &[]),
        Err(CodecError::LengthMismatch(_))
    ));
    assert!(matches!(
        decode_prim(&ty("bytes"), buf, 0, &[99]),
        Err(CodecError::Underflow { .. })
    ));
}

#[test]
fn str_malformed_utf8() {
    let err = decode_prim(&ty("str"), &[0xFF, 0xFE], 0, &[2]).unwrap_err();
    assert!(matches!(err, CodecError::Utf8(_)));
}

#[test]
fn str_encode_length_contradiction() {
    let err = encode_prim(&ty("str"), &Value::Str("abc".to_string()), &[5]).unwrap_err();
    assert!(matches!(err, CodecError::LengthMismatch(_)));
}

#[test]
fn numeric_array_forms() {
    let t = ty("i2b[]");
    let v = Value::List(vec![Value::I16(-2822), Value::I16(992), Value::I16(3)]);
    let bytes = encode_prim(&t, &v, &[]).expect("encode");
    assert_eq!(bytes, [0xF4, 0xFA, 0x03, 0xE0, 0x00, 0x03]);
    let (back, n) = decode_prim(&t, &bytes, 0, &[3]).expect("decode");
    assert_eq!((back, n), (v, 6));

    // Fixed-width arrays need a count on decode.
    assert!(matches!(
        decode_prim(&t, &bytes, 0, &[]),
        Err(CodecError::LengthMismatch(_))
    ));
}

#[test]
fn vlq_array_to_end_of_buffer() {
    let t = ty("uv[]");
    let v = Value::List(vec![Value::U64(0), Value::U64(300), Value::U64(127)]);
    let bytes = encode_prim(&t, &v, &[]).expect("encode");
    let (back, n) = decode_prim(&t, &bytes, 0, &[]).expect("decode");
    assert_eq!(n, bytes.len());
    assert_eq!(back, v);
}

#[test]
fn signed_vlq_table() {
    let cases: &[(i64, &[u8])] = &[
        (0, &[0x00]),
        (1, &[0x01]),
        (-1, &[0x41]),
        (63, &[0x3F]),
        (-63, &[0x7F]),
        (64, &[0x80, 0x40]),
        (-64, &[0xC0, 0x40]),
        (8191, &[0xBF, 0x7F]),
        (-8191, &[0xFF, 0x7F]),
    ];
    let t = ty("iv");
    for (value, expected) in cases {
        let bytes = encode_prim(&t, &Value::I64(*value), &[]).expect("encode");
        assert_eq!(&bytes, expected, "iv encode {}", value);
        let (back, n) = decode_prim(&t, &bytes, 0, &[]).expect("decode");
        assert_eq!((back, n), (Value::I64(*value), bytes.len()), "iv decode {}", value);
    }
    // 2^31 - 1 fits and round-trips on both signs.
    for value in [i64::from(i32::MAX), -i64::from(i32::MAX)] {
        let bytes = encode_prim(&t, &Value::I64(value), &[]).expect("encode");
        let (back, _) = decode_prim(&t, &bytes, 0, &[]).expect("decode");
        assert_eq!(back, Value::I64(value));
    }
}

#[test]
fn unsigned_vlq_table() {
    let cases: &[(u64, &[u8])] = &[
        (0, &[0x00]),
        (127, &[0x7F]),
        (128, &[0x81, 0x00]),
        (16383, &[0xFF, 0x7F]),
        (16384, &[0x81, 0x80, 0x00]),
    ];
    let t = ty("uv");
    for (value, expected) in cases {
        let bytes = encode_prim(&t, &Value::U64(*value), &[]).expect("encode");
        assert_eq!(&bytes, expected, "uv encode {}", value);
        let (back, n) = decode_prim(&t, &bytes, 0, &[]).expect("decode");
        assert_eq!((back, n), (Value::U64(*value), bytes.len()));
    }
}

#[test]
fn vlq_truncated_underflows() {
    // Continuation bit set, then nothing.
    assert!(matches!(
        decode_prim(&ty("uv"), &[0x81], 0, &[]),
        Err(CodecError::Underflow { .. })
    ));
    assert!(matches!(
        decode_prim(&ty("iv"), &[0xC0], 0, &[]),
        Err(CodecError::Underflow { .. })
    ));
}

#[test]
fn sequence_pack_unpack() {
    let fields = vec![
        (ty("cstr"), Value::Str("creeper".to_string()), vec![]),
        (
            ty("i2b[]"),
            Value::List(vec![Value::I16(-2822), Value::I16(992), Value::I16(3)]),
            vec![],
        ),
    ];
    let bytes = seq::pack(&fields).expect("pack");
    assert_eq!(
        bytes,
        [0x63, 0x72, 0x65, 0x65, 0x70, 0x65, 0x72, 0x00, 0xF4, 0xFA, 0x03, 0xE0, 0x00, 0x03]
    );

    let (values, n) = seq::unpack(
        &[(ty("cstr"), vec![]), (ty("i2b[]"), vec![3])],
        &bytes,
        0,
    )
    .expect("unpack");
    assert_eq!(n, bytes.len());
    assert_eq!(values[0], Value::Str("creeper".to_string()));
    assert_eq!(
        values[1],
        Value::List(vec![Value::I16(-2822), Value::I16(992), Value::I16(3)])
    );
}

#[test]
fn sequence_error_reports_position() {
    let err = seq::unpack(&[(ty("u4b"), vec![])], &[0x01], 0).unwrap_err();
    assert!(err.to_string().starts_with("[0]:"), "got: {}", err);
}
