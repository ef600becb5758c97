mod common;

use common::{from_json, read_value, to_json, Value};
use docstream::{read_json, CodecErrorCode, Error, Tag};

#[test]
fn writes_minimal_json() {
    let doc = Value::Array(vec![
        Value::Unsigned(1),
        Value::Array(vec![Value::Unsigned(2), Value::Unsigned(3)]),
        Value::text("hi"),
    ]);
    assert_eq!(to_json(&doc, true), b"[1,[2,3],\"hi\"]");
    assert_eq!(to_json(&doc, false), b"[1,[2,3],\"hi\"]");
}

#[test]
fn scalar_rendering() {
    assert_eq!(to_json(&Value::Unsigned(0), true), b"0");
    assert_eq!(to_json(&Value::Signed(-7), true), b"-7");
    assert_eq!(to_json(&Value::Bool(true), true), b"true");
    assert_eq!(to_json(&Value::Null, true), b"null");
    // JSON cannot represent undefined or non-finite floats.
    assert_eq!(to_json(&Value::Undefined, true), b"null");
    assert_eq!(to_json(&Value::Float(f64::INFINITY), true), b"null");
    assert_eq!(to_json(&Value::Float(f64::NAN), true), b"null");
}

#[test]
fn floats_keep_a_fraction_marker() {
    assert_eq!(to_json(&Value::Float(1.5), true), b"1.5");
    assert_eq!(to_json(&Value::Float(1.0), true), b"1.0");
    assert_eq!(to_json(&Value::Float(-0.5), true), b"-0.5");
}

#[test]
fn text_is_escaped() {
    assert_eq!(
        to_json(&Value::text("a\"b\\c\nd"), true),
        b"\"a\\\"b\\\\c\\nd\""
    );
    assert_eq!(to_json(&Value::text("\u{1}"), true), b"\"\\u0001\"");
    // Multi-byte UTF-8 passes through raw.
    assert_eq!(
        to_json(&Value::text("caf\u{e9}"), true),
        "\"caf\u{e9}\"".as_bytes()
    );
}

#[test]
fn byte_strings_become_base64_text() {
    assert_eq!(to_json(&Value::Bytes(vec![]), true), b"\"\"");
    assert_eq!(
        to_json(&Value::Bytes(b"hello".to_vec()), true),
        b"\"aGVsbG8=\""
    );
    // The reader does not auto-decode: base64 comes back as text.
    assert_eq!(from_json(b"\"aGVsbG8=\""), Value::text("aGVsbG8="));
}

#[test]
fn base64_carry_spans_write_calls() {
    use std::io::Write as _;

    let mut writer = docstream::write_json(Vec::new());
    let mut s = writer.write_byte_string().unwrap();
    s.write_all(b"h").unwrap();
    s.write_all(b"el").unwrap();
    s.write_all(b"lo").unwrap();
    s.finish().unwrap();
    let out = writer.finish().unwrap().into_inner();
    assert_eq!(out, b"\"aGVsbG8=\"");
}

#[test]
fn scalar_map_keys_are_quoted() {
    let doc = Value::Map(vec![
        (Value::Unsigned(1), Value::text("a")),
        (Value::text("b"), Value::Unsigned(2)),
    ]);
    assert_eq!(to_json(&doc, true), b"{\"1\":\"a\",\"b\":2}");
}

#[test]
fn number_heuristic() {
    assert_eq!(from_json(b"42"), Value::Unsigned(42));
    assert_eq!(from_json(b"-42"), Value::Signed(-42));
    assert_eq!(from_json(b"-0"), Value::Unsigned(0));
    assert_eq!(from_json(b"42.0"), Value::Float(42.0));
    assert_eq!(from_json(b"1e2"), Value::Float(100.0));
    assert_eq!(
        from_json(b"18446744073709551615"),
        Value::Unsigned(u64::MAX)
    );
    // Past 64 bits an integer token falls back to the float kind.
    assert_eq!(
        from_json(b"18446744073709551616"),
        Value::Float(18_446_744_073_709_551_616.0)
    );
    assert_eq!(
        from_json(b"-9223372036854775809"),
        Value::Float(-9_223_372_036_854_775_809.0)
    );
}

#[test]
fn whitespace_is_insignificant() {
    assert_eq!(
        from_json(b" [ 1 , { \"a\" : null } , false ] "),
        Value::Array(vec![
            Value::Unsigned(1),
            Value::Map(vec![(Value::text("a"), Value::Null)]),
            Value::Bool(false),
        ])
    );
}

#[test]
fn string_escapes_decode() {
    assert_eq!(
        from_json(b"\"a\\\"b\\\\c\\/d\\b\\f\\n\\r\\t\""),
        Value::text("a\"b\\c/d\u{8}\u{c}\n\r\t")
    );
    assert_eq!(from_json(b"\"\\u0041\""), Value::text("A"));
    assert_eq!(from_json(b"\"\\u00e9\""), Value::text("\u{e9}"));
    // Surrogate pair for U+1D11E (musical G clef).
    assert_eq!(from_json(b"\"\\ud834\\udd1e\""), Value::text("\u{1d11e}"));
}

#[test]
fn nested_array_traversal_yields_expected_tags() {
    let mut reader = read_json(&b"[1,[2,3],\"hi\"]"[..]);
    let mut outer = reader.document().unwrap().into_array().unwrap();
    assert_eq!(outer.read().unwrap().unwrap().into_unsigned().unwrap(), 1);
    let mut inner = outer.read().unwrap().unwrap().into_array().unwrap();
    assert_eq!(inner.read().unwrap().unwrap().into_unsigned().unwrap(), 2);
    assert_eq!(inner.read().unwrap().unwrap().into_unsigned().unwrap(), 3);
    assert!(inner.read().unwrap().is_none());
    let text = outer.read().unwrap().unwrap();
    assert_eq!(text.tag(), Tag::TextString);
    assert_eq!(
        text.into_text_string().unwrap().read_all_text().unwrap(),
        "hi"
    );
    assert!(outer.read().unwrap().is_none());
}

#[test]
fn json_round_trips_representable_documents() {
    let doc = Value::Map(vec![
        (Value::text("name"), Value::text("streaming")),
        (
            Value::text("counts"),
            Value::Array(vec![
                Value::Unsigned(1),
                Value::Signed(-2),
                Value::Float(3.5),
            ]),
        ),
        (Value::text("flag"), Value::Bool(false)),
        (Value::text("nothing"), Value::Null),
    ]);
    assert_eq!(from_json(&to_json(&doc, true)), doc);
}

#[test]
fn string_nodes_compose_with_std_io() {
    use common::to_cbor;
    use docstream::read_cbor;

    // Transcode one text string CBOR -> JSON through io::copy.
    let bytes = to_cbor(&Value::text("copied across formats"), true);
    let mut reader = read_cbor(&bytes[..]);
    let mut src = reader.document().unwrap().into_text_string().unwrap();

    let mut writer = docstream::write_json(Vec::new());
    let mut dst = writer.write_text().unwrap();
    std::io::copy(&mut src, &mut dst).unwrap();
    dst.finish().unwrap();
    let out = writer.finish().unwrap().into_inner();
    assert_eq!(out, b"\"copied across formats\"");
}

#[test]
fn malformed_numbers_are_rejected() {
    fn decode_err(input: &[u8]) -> CodecErrorCode {
        let mut reader = read_json(input);
        match reader.document().and_then(read_value) {
            Err(Error::Codec(e)) => e.code,
            other => panic!("expected codec error, got {other:?}"),
        }
    }

    assert_eq!(decode_err(b"01"), CodecErrorCode::InvalidNumber);
    assert_eq!(decode_err(b"-"), CodecErrorCode::InvalidNumber);
    assert_eq!(decode_err(b"1."), CodecErrorCode::InvalidNumber);
    assert_eq!(decode_err(b"1e"), CodecErrorCode::InvalidNumber);
    assert_eq!(decode_err(b"+1"), CodecErrorCode::InvalidSyntax);
}

#[test]
fn malformed_documents_are_rejected() {
    fn decode_err(input: &[u8]) -> CodecErrorCode {
        let mut reader = read_json(input);
        match reader.document().and_then(read_value) {
            Err(Error::Codec(e)) => e.code,
            other => panic!("expected codec error, got {other:?}"),
        }
    }

    assert_eq!(decode_err(b"truE"), CodecErrorCode::InvalidLiteral);
    assert_eq!(decode_err(b"nule"), CodecErrorCode::InvalidLiteral);
    assert_eq!(decode_err(b"tru"), CodecErrorCode::UnexpectedEof);
    assert_eq!(decode_err(b"[1,]"), CodecErrorCode::InvalidSyntax);
    assert_eq!(decode_err(b"[1 2]"), CodecErrorCode::InvalidSyntax);
    assert_eq!(decode_err(b"{1:2}"), CodecErrorCode::InvalidSyntax);
    assert_eq!(decode_err(b"{\"a\" 1}"), CodecErrorCode::InvalidSyntax);
    assert_eq!(decode_err(b"\"ab"), CodecErrorCode::UnexpectedEof);
    assert_eq!(decode_err(b"\"\\q\""), CodecErrorCode::InvalidEscape);
    assert_eq!(decode_err(b"\"\\ud834x\""), CodecErrorCode::InvalidEscape);
    assert_eq!(decode_err(b"\"\\udd1e\""), CodecErrorCode::InvalidEscape);
    assert_eq!(decode_err(b"["), CodecErrorCode::UnexpectedEof);
}
