use form_urlencoded::{byte_serialize, parse, Serializer};

#[test]
fn parse_splits_on_ampersand_and_equals() {
    let pairs: Vec<(String, String)> = parse(b"a=1&b=2&c")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("a".to_owned(), "1".to_owned()),
            ("b".to_owned(), "2".to_owned()),
            ("c".to_owned(), "".to_owned()),
        ]
    );
}

#[test]
fn parse_decodes_plus_as_space_and_percent_escapes() {
    let pairs: Vec<(String, String)> = parse(b"na+me=hello%20world")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(pairs, vec![("na me".to_owned(), "hello world".to_owned())]);
}

#[test]
fn parse_ignores_empty_pairs() {
    let pairs: Vec<_> = parse(b"&&a=1&&").collect();
    assert_eq!(pairs.len(), 1);
}

#[test]
fn parse_is_double_ended() {
    let mut iter = parse(b"a=1&b=2&c=3");
    assert_eq!(iter.next().unwrap().0, "a");
    assert_eq!(iter.next_back().unwrap().0, "c");
    assert_eq!(iter.next().unwrap().0, "b");
    assert!(iter.next().is_none());
}

#[test]
fn byte_serialize_escapes_space_as_plus() {
    let encoded: String = byte_serialize(b"hello world").collect();
    assert_eq!(encoded, "hello+world");
}

#[test]
fn byte_serialize_escapes_reserved_bytes() {
    let encoded: String = byte_serialize(b"a&b=c").collect();
    assert_eq!(encoded, "a%26b%3Dc");
}

#[test]
fn serializer_joins_pairs_with_ampersand() {
    let mut out = String::new();
    let mut serializer = Serializer::new(&mut out);
    serializer.append_pair("a", "1").append_pair("b", "hello world");
    serializer.finish();
    assert_eq!(out, "a=1&b=hello+world");
}

#[test]
fn serializer_appends_to_existing_content() {
    let mut out = String::from("existing");
    let mut serializer = Serializer::new(&mut out);
    serializer.append_pair("a", "1");
    serializer.finish();
    assert_eq!(out, "existinga=1");
}

#[test]
fn serializer_clear_resets_to_start_position() {
    let mut out = String::new();
    let mut serializer = Serializer::new(&mut out);
    serializer.append_pair("a", "1");
    serializer.append_pair("b", "2");
    serializer.clear();
    serializer.append_pair("c", "3");
    serializer.finish();
    assert_eq!(out, "c=3");
}

#[test]
fn round_trip_through_parse_and_serialize() {
    let original = "name=J%C3%A9r%C3%B4me&tag=rust+%26+url";
    let pairs: Vec<(String, String)> = parse(original.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut out = String::new();
    {
        let mut serializer = Serializer::new(&mut out);
        for (k, v) in &pairs {
            serializer.append_pair(k, v);
        }
    }
    let reparsed: Vec<(String, String)> = parse(out.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(pairs, reparsed);
}
