mod common;

use common::{from_cbor, read_value, Value};
use docstream::{read_cbor, Document, Tag};

#[test]
fn integer_vectors() {
    assert_eq!(from_cbor(&[0x00]), Value::Unsigned(0));
    assert_eq!(from_cbor(&[0x17]), Value::Unsigned(23));
    assert_eq!(from_cbor(&[0x18, 0x2a]), Value::Unsigned(42));
    assert_eq!(from_cbor(&[0x19, 0x03, 0xe8]), Value::Unsigned(1000));
    assert_eq!(
        from_cbor(&[0x1a, 0x00, 0x0f, 0x42, 0x40]),
        Value::Unsigned(1_000_000)
    );
    assert_eq!(
        from_cbor(&[0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
        Value::Unsigned(u64::MAX)
    );
    assert_eq!(from_cbor(&[0x20]), Value::Signed(-1));
    assert_eq!(from_cbor(&[0x39, 0x03, 0xe7]), Value::Signed(-1000));
}

#[test]
fn non_shortest_arguments_are_accepted() {
    // RFC 7049 readers accept any argument width.
    assert_eq!(from_cbor(&[0x18, 0x01]), Value::Unsigned(1));
    assert_eq!(from_cbor(&[0x19, 0x00, 0x01]), Value::Unsigned(1));
    assert_eq!(
        from_cbor(&[0x1a, 0x00, 0x00, 0x00, 0x01]),
        Value::Unsigned(1)
    );
}

#[test]
fn simple_and_float_vectors() {
    assert_eq!(from_cbor(&[0xf4]), Value::Bool(false));
    assert_eq!(from_cbor(&[0xf5]), Value::Bool(true));
    assert_eq!(from_cbor(&[0xf6]), Value::Null);
    assert_eq!(from_cbor(&[0xf7]), Value::Undefined);
    assert_eq!(
        from_cbor(&[0xfb, 0x3f, 0xf1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a]),
        Value::Float(1.1)
    );
}

#[test]
fn half_and_single_floats_widen() {
    assert_eq!(from_cbor(&[0xf9, 0x3c, 0x00]), Value::Float(1.0));
    assert_eq!(from_cbor(&[0xf9, 0x3e, 0x00]), Value::Float(1.5));
    assert_eq!(from_cbor(&[0xf9, 0x7b, 0xff]), Value::Float(65504.0));
    assert_eq!(from_cbor(&[0xf9, 0xc4, 0x00]), Value::Float(-4.0));
    // Half subnormal.
    assert_eq!(from_cbor(&[0xf9, 0x00, 0x01]), Value::Float(2f64.powi(-24)));
    assert_eq!(from_cbor(&[0xf9, 0x7c, 0x00]), Value::Float(f64::INFINITY));
    assert_eq!(from_cbor(&[0xf9, 0xfc, 0x00]), Value::Float(f64::NEG_INFINITY));
    match from_cbor(&[0xf9, 0x7e, 0x00]) {
        Value::Float(f) => assert!(f.is_nan()),
        other => panic!("expected float, got {other:?}"),
    }
    assert_eq!(
        from_cbor(&[0xfa, 0x47, 0xc3, 0x50, 0x00]),
        Value::Float(100_000.0)
    );
}

#[test]
fn string_vectors() {
    assert_eq!(from_cbor(&[0x60]), Value::text(""));
    assert_eq!(from_cbor(&[0x64, b'I', b'E', b'T', b'F']), Value::text("IETF"));
    assert_eq!(
        from_cbor(&[0x44, 0x01, 0x02, 0x03, 0x04]),
        Value::Bytes(vec![1, 2, 3, 4])
    );
}

#[test]
fn indefinite_string_chunks_concatenate() {
    // (_ "strea", "ming")
    let bytes = [
        0x7f, 0x65, b's', b't', b'r', b'e', b'a', 0x64, b'm', b'i', b'n', b'g', 0xff,
    ];
    assert_eq!(from_cbor(&bytes), Value::text("streaming"));

    // (_ h'0102', h'', h'03')
    let bytes = [0x5f, 0x42, 0x01, 0x02, 0x40, 0x41, 0x03, 0xff];
    assert_eq!(from_cbor(&bytes), Value::Bytes(vec![1, 2, 3]));
}

#[test]
fn container_vectors() {
    assert_eq!(from_cbor(&[0x80]), Value::Array(vec![]));
    assert_eq!(
        from_cbor(&[0x83, 0x01, 0x02, 0x03]),
        Value::Array(vec![
            Value::Unsigned(1),
            Value::Unsigned(2),
            Value::Unsigned(3)
        ])
    );
    // {_ "a": 1, "b": [_ 2, 3]}
    let bytes = [
        0xbf, 0x61, b'a', 0x01, 0x61, b'b', 0x9f, 0x02, 0x03, 0xff, 0xff,
    ];
    assert_eq!(
        from_cbor(&bytes),
        Value::Map(vec![
            (Value::text("a"), Value::Unsigned(1)),
            (
                Value::text("b"),
                Value::Array(vec![Value::Unsigned(2), Value::Unsigned(3)])
            ),
        ])
    );
}

#[test]
fn semantic_tags_are_transparent() {
    // 0(1) and 1(1.1): the tag is dropped, the item remains.
    assert_eq!(from_cbor(&[0xc0, 0x01]), Value::Unsigned(1));
    assert_eq!(from_cbor(&[0xc1, 0x18, 0x2a]), Value::Unsigned(42));
    // Nested tags collapse to the innermost item.
    assert_eq!(from_cbor(&[0xc0, 0xc1, 0x05]), Value::Unsigned(5));
}

#[test]
fn map_keys_may_be_any_kind() {
    // {1: "a", true: "b"}
    let bytes = [0xa2, 0x01, 0x61, b'a', 0xf5, 0x61, b'b'];
    assert_eq!(
        from_cbor(&bytes),
        Value::Map(vec![
            (Value::Unsigned(1), Value::text("a")),
            (Value::Bool(true), Value::text("b")),
        ])
    );
}

#[test]
fn depth_first_traversal_order() {
    // [1, [2, 3], "hi"] walked by hand, checking tags along the way.
    let bytes = [0x83, 0x01, 0x82, 0x02, 0x03, 0x62, b'h', b'i'];
    let mut reader = read_cbor(&bytes[..]);
    let doc = reader.document().unwrap();
    assert_eq!(doc.tag(), Tag::Array);
    let mut outer = doc.into_array().unwrap();

    let first = outer.read().unwrap().unwrap();
    assert!(first.is(Tag::UnsignedInt));
    assert_eq!(first.into_unsigned().unwrap(), 1);

    let mut inner = outer.read().unwrap().unwrap().into_array().unwrap();
    assert_eq!(inner.read().unwrap().unwrap().into_unsigned().unwrap(), 2);
    assert_eq!(inner.read().unwrap().unwrap().into_unsigned().unwrap(), 3);
    assert!(inner.read().unwrap().is_none());

    let text = outer.read().unwrap().unwrap();
    assert_eq!(text.tag(), Tag::TextString);
    match text {
        Document::TextString(s) => assert_eq!(s.read_all_text().unwrap(), "hi"),
        _ => unreachable!(),
    }
    assert!(outer.read().unwrap().is_none());
}

#[test]
fn reader_tracks_consumed_bytes() {
    let bytes = [0x18, 0x2a];
    let mut reader = read_cbor(&bytes[..]);
    read_value(reader.document().unwrap()).unwrap();
    assert_eq!(reader.position(), 2);
}
