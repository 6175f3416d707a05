// Copyright the weburl contributors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use weburl::{ParseError, Url};

#[test]
fn parses_a_plain_http_url() {
    let url = Url::parse("http://example.com/foo/bar?a=1#frag").unwrap();
    assert_eq!(url.scheme(), "http");
    assert_eq!(url.host_str(), Some("example.com"));
    assert_eq!(url.port(), None);
    assert_eq!(url.path(), "/foo/bar");
    assert_eq!(url.query(), Some("a=1"));
    assert_eq!(url.fragment(), Some("frag"));
}

#[test]
fn resolves_dot_dot_against_a_base() {
    let base = Url::parse("https://example.com/a/b/c").unwrap();
    let resolved = base.join("../../d").unwrap();
    assert_eq!(resolved.as_str(), "https://example.com/d");
}

#[test]
fn resolves_absolute_path_reference_without_merging_base() {
    let base = Url::parse("https://example.com/a/b/c?x=1").unwrap();
    let resolved = base.join("/z").unwrap();
    assert_eq!(resolved.as_str(), "https://example.com/z");
}

#[test]
fn fresh_authority_reference_replaces_host_and_drops_old_path() {
    let base = Url::parse("https://example.com/a/b").unwrap();
    let resolved = base.join("//other.example/p").unwrap();
    assert_eq!(resolved.as_str(), "https://other.example/p");
}

#[test]
fn fragment_only_reference_is_allowed_even_against_an_opaque_base() {
    let base = Url::parse("mailto:user@example.com").unwrap();
    let resolved = base.join("#section").unwrap();
    assert_eq!(resolved.as_str(), "mailto:user@example.com#section");
}

#[test]
fn non_fragment_reference_against_an_opaque_base_is_an_error() {
    let base = Url::parse("mailto:user@example.com").unwrap();
    assert_eq!(
        base.join("other@example.com").unwrap_err(),
        ParseError::RelativeUrlWithCannotBeABaseBase
    );
}

#[test]
fn relative_input_without_a_base_is_an_error() {
    assert_eq!(Url::parse("/just/a/path").unwrap_err(), ParseError::RelativeUrlWithoutBase);
}

#[test]
fn windows_drive_letter_is_preserved_as_a_file_url_path_segment() {
    let url = Url::parse("file:///C:/Users/example").unwrap();
    assert_eq!(url.path(), "/C:/Users/example");
    assert_eq!(url.host_str(), Some(""));
}

#[test]
fn windows_drive_letter_in_host_position_is_rehomed_into_the_path() {
    let url = Url::parse("file://C:/Users/example").unwrap();
    assert_eq!(url.path(), "/C:/Users/example");
    assert_eq!(url.host_str(), None);
}

#[test]
fn ipv6_host_round_trips_in_canonical_form() {
    let url = Url::parse("http://[2001:0db8:0000:0000:0000:0000:0000:0001]/").unwrap();
    assert_eq!(url.host_str(), Some("[2001:db8::1]"));
}

#[test]
fn special_scheme_requires_a_non_empty_host() {
    assert_eq!(Url::parse("http:///path").unwrap_err(), ParseError::EmptyHost);
}

#[test]
fn default_port_is_not_stored() {
    let url = Url::parse("https://example.com:443/").unwrap();
    assert_eq!(url.as_str(), "https://example.com/");
    assert_eq!(url.port_or_known_default(), Some(443));
}

#[test]
fn opaque_path_scheme_round_trips_through_display() {
    let url: Url = "data:text/plain,hello%20world".parse().unwrap();
    assert_eq!(url.to_string(), "data:text/plain,hello%20world");
    assert!(url.has_opaque_path());
}

#[test]
fn setters_reuse_the_parser_writer_and_keep_invariants() {
    let mut url = Url::parse("http://example.com/a").unwrap();
    url.set_scheme("https").unwrap();
    url.set_path("/b/c").unwrap();
    url.set_query(Some("k=v")).unwrap();
    url.set_fragment(Some("top"));
    assert_eq!(url.as_str(), "https://example.com/b/c?k=v#top");
}

#[test]
fn set_query_from_pairs_replaces_the_entire_query() {
    let mut url = Url::parse("https://example.com/search?old=1").unwrap();
    url.set_query_from_pairs([("q", "rust url"), ("page", "2")]);
    assert_eq!(url.query(), Some("q=rust+url&page=2"));
}

#[test]
fn query_pairs_mut_replaces_the_existing_query_on_drop() {
    let mut url = Url::parse("https://example.com/search?old=1").unwrap();
    url.query_pairs_mut().append_pair("q", "rust url");
    assert_eq!(url.query(), Some("q=rust+url"));
}

#[test]
fn query_pairs_mut_supports_multiple_appends_before_it_commits() {
    let mut url = Url::parse("https://example.com/search?old=1").unwrap();
    url.query_pairs_mut().append_pair("q", "2").append_pair("page", "3");
    assert_eq!(url.query(), Some("q=2&page=3"));
}

#[test]
fn set_port_rejects_a_value_outside_u16_range() {
    let mut url = Url::parse("http://example/foo").unwrap();
    assert_eq!(url.set_port(Some(65536)).unwrap_err(), ParseError::Overflow);
    url.set_port(Some(8080)).unwrap();
    assert_eq!(url.as_str(), "http://example:8080/foo");
}

#[test]
fn raw_parse_rejects_a_port_number_outside_u16_range() {
    assert_eq!(Url::parse("http://example:65536/foo").unwrap_err(), ParseError::Overflow);
}

#[test]
fn host_that_overflows_u32_as_ipv4_is_a_fatal_error_not_a_domain() {
    assert_eq!(
        Url::parse("http://4294967296/").unwrap_err(),
        ParseError::InvalidIpv4Address
    );
}

#[test]
fn set_scheme_drops_the_new_schemes_default_port() {
    let mut url = Url::parse("http://example.com:443/").unwrap();
    url.set_scheme("https").unwrap();
    assert_eq!(url.as_str(), "https://example.com/");
}

#[test]
fn set_scheme_rejects_a_specialness_change() {
    let mut url = Url::parse("https://example.com/").unwrap();
    assert_eq!(url.set_scheme("example").unwrap_err(), ParseError::InvalidSchemeChange);
}

#[test]
fn equal_urls_hash_and_compare_equal() {
    use std::collections::HashSet;
    let a = Url::parse("https://example.com/x").unwrap();
    let b = Url::parse("https://example.com/x").unwrap();
    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert_eq!(a, b);
}
