// Copyright the weburl contributors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An implementation of the [WHATWG URL Standard](https://url.spec.whatwg.org/),
//! storing a parsed URL as a single string plus a compact structure index
//! rather than a tree of owned components.
//!
//! ```
//! use weburl::Url;
//!
//! let url = Url::parse("https://example.com/a/b?q=1#frag").unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//! assert_eq!(url.path(), "/a/b");
//! ```
//!
//! Hostnames are ASCII-only: this crate does not implement IDNA/Punycode,
//! so a non-ASCII hostname on a special scheme is a parse error rather
//! than being transparently encoded. See `DESIGN.md` for the reasoning.

#![forbid(unsafe_code)]

pub mod host;
mod origin;
mod parser;
mod path;
mod structure;

pub use form_urlencoded;
pub use host::{Host, HostParseError};
pub use origin::{OpaqueOrigin, Origin};
pub use parser::{SyntaxViolation, ViolationFn};
pub use structure::{HostKind, SchemeKind, Sigil};

use parser::{assemble, encode_fragment, encode_query, encode_userinfo, AssembledUrl, PathCollector};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use structure::UrlStructure;

/// Everything that can go wrong parsing or mutating a [`Url`], beyond the
/// non-fatal [`SyntaxViolation`]s a caller can opt into observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    EmptyHost,
    InvalidPort,
    InvalidIpv4Address,
    InvalidIpv6Address,
    InvalidDomainCharacter,
    NonAsciiDomain,
    ForbiddenHostCodePoint,
    RelativeUrlWithoutBase,
    RelativeUrlWithCannotBeABaseBase,
    SetHostOnCannotBeABaseUrl,
    InvalidSchemeChange,
    Overflow,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ParseError::EmptyHost => "empty host not permitted for this scheme",
            ParseError::InvalidPort => "invalid port number",
            ParseError::InvalidIpv4Address => "invalid IPv4 address",
            ParseError::InvalidIpv6Address => "invalid IPv6 address",
            ParseError::InvalidDomainCharacter => "domain contains a forbidden code point",
            ParseError::NonAsciiDomain => "non-ASCII hostnames are not supported (no IDNA)",
            ParseError::ForbiddenHostCodePoint => "opaque host contains a forbidden code point",
            ParseError::RelativeUrlWithoutBase => "input is relative, but no base URL was given",
            ParseError::RelativeUrlWithCannotBeABaseBase => {
                "base URL has an opaque path and cannot be a base for a relative reference"
            }
            ParseError::SetHostOnCannotBeABaseUrl => "cannot set a host on a URL with an opaque path",
            ParseError::InvalidSchemeChange => {
                "scheme change would alter specialness or violate file/credentials constraints"
            }
            ParseError::Overflow => "component too long to be represented",
        };
        f.write_str(message)
    }
}

impl std::error::Error for ParseError {}

impl From<HostParseError> for ParseError {
    fn from(e: HostParseError) -> ParseError {
        match e {
            HostParseError::EmptyHost => ParseError::EmptyHost,
            HostParseError::InvalidDomainCharacter => ParseError::InvalidDomainCharacter,
            HostParseError::NonAsciiDomain => ParseError::NonAsciiDomain,
            HostParseError::InvalidIpv4Address => ParseError::InvalidIpv4Address,
            HostParseError::InvalidIpv6Address => ParseError::InvalidIpv6Address,
            HostParseError::ForbiddenHostCodePoint => ParseError::ForbiddenHostCodePoint,
        }
    }
}

/// Options for [`Url::options`]: a base URL to resolve against, and a
/// callback for non-fatal [`SyntaxViolation`]s.
#[derive(Default)]
pub struct ParseOptions<'a> {
    base_url: Option<&'a Url>,
    syntax_violation_callback: Option<&'a ViolationFn<'a>>,
}

impl<'a> ParseOptions<'a> {
    pub fn base_url(mut self, base: Option<&'a Url>) -> Self {
        self.base_url = base;
        self
    }

    pub fn syntax_violation_callback(mut self, callback: Option<&'a ViolationFn<'a>>) -> Self {
        self.syntax_violation_callback = callback;
        self
    }

    pub fn parse(self, input: &str) -> Result<Url, ParseError> {
        parser::parse(input, self.base_url, self.syntax_violation_callback)
    }
}

/// A parsed, normalized URL.
///
/// The canonical serialization is stored as a single `String`; every
/// accessor below is a cheap slice into it, located through [`UrlStructure`].
#[derive(Clone)]
pub struct Url {
    serialization: String,
    structure: UrlStructure,
}

impl Url {
    /// Parse `input` as an absolute URL.
    pub fn parse(input: &str) -> Result<Url, ParseError> {
        parser::parse(input, None, None)
    }

    /// Parse `input`, resolving it against `self` if it has no scheme of
    /// its own.
    pub fn join(&self, input: &str) -> Result<Url, ParseError> {
        parser::parse(input, Some(self), None)
    }

    /// Start building a parse call with a base URL and/or a violation
    /// callback.
    pub fn options<'a>() -> ParseOptions<'a> {
        ParseOptions::default()
    }

    pub(crate) fn from_raw_parts(serialization: String, structure: UrlStructure) -> Url {
        Url { serialization, structure }
    }

    /// The full canonical serialization.
    pub fn as_str(&self) -> &str {
        &self.serialization
    }

    pub fn into_string(self) -> String {
        self.serialization
    }

    fn slice(&self, range: std::ops::Range<usize>) -> &str {
        &self.serialization[range]
    }

    /// The scheme, without the trailing `:`, e.g. `"https"`.
    pub fn scheme(&self) -> &str {
        self.slice(self.structure.scheme_text_range())
    }

    pub fn scheme_kind(&self) -> SchemeKind {
        self.structure.scheme_kind
    }

    pub fn username(&self) -> &str {
        self.slice(self.structure.username_range())
    }

    pub fn password(&self) -> Option<&str> {
        if self.structure.password_len == 0 {
            None
        } else {
            Some(self.slice(self.structure.password_text_range()))
        }
    }

    pub fn has_authority(&self) -> bool {
        self.structure.host_kind != HostKind::Nil
    }

    /// The hostname as raw text (domain, dotted-decimal IPv4, bracketed
    /// IPv6, opaque, or empty); `None` if there is no authority at all.
    pub fn host_str(&self) -> Option<&str> {
        if self.structure.host_kind == HostKind::Nil {
            None
        } else {
            Some(self.slice(self.structure.host_range()))
        }
    }

    /// The parsed host, reconstructed from its stored canonical text.
    pub fn host(&self) -> Option<Host<&str>> {
        let text = self.host_str()?;
        Some(match self.structure.host_kind {
            HostKind::Nil => return None,
            HostKind::Empty => Host::Empty,
            HostKind::Domain => Host::Domain(text),
            HostKind::Opaque => Host::Opaque(text),
            HostKind::Ipv4 => Host::Ipv4(host::reparse_ipv4_str(text)),
            HostKind::Ipv6 => {
                let interior = &text[1..text.len() - 1];
                Host::Ipv6(host::reparse_ipv6_str(interior))
            }
        })
    }

    pub fn port(&self) -> Option<u16> {
        if self.structure.port_len == 0 {
            None
        } else {
            self.slice(self.structure.port_text_range()).parse().ok()
        }
    }

    /// This URL's port, or its scheme's default port if none was given.
    pub fn port_or_known_default(&self) -> Option<u16> {
        self.port().or_else(|| self.structure.scheme_kind.default_port())
    }

    pub fn path(&self) -> &str {
        self.slice(self.structure.path_range())
    }

    pub fn has_opaque_path(&self) -> bool {
        self.structure.has_opaque_path
    }

    /// The query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        if self.structure.query_len == 0 {
            None
        } else {
            Some(self.slice(self.structure.query_text_range()))
        }
    }

    /// The fragment, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        if self.structure.fragment_len == 0 {
            None
        } else {
            Some(self.slice(self.structure.fragment_text_range()))
        }
    }

    /// Iterate over `application/x-www-form-urlencoded` `(name, value)`
    /// pairs in this URL's query string.
    pub fn query_pairs(&self) -> form_urlencoded::Parse<'_> {
        form_urlencoded::parse(self.query().unwrap_or("").as_bytes())
    }

    /// Build a fresh query string as a sequence of
    /// `application/x-www-form-urlencoded` pairs, replacing whatever
    /// query is currently set. The new query is spliced back into this
    /// URL when the returned `Serializer` is finished or dropped,
    /// whichever comes first.
    pub fn query_pairs_mut(&mut self) -> form_urlencoded::Serializer<UrlQuery<'_>> {
        form_urlencoded::Serializer::new(UrlQuery { url: Some(self), buffer: String::new() })
    }

    /// This URL's [origin](https://url.spec.whatwg.org/#origin).
    pub fn origin(&self) -> Origin {
        origin::url_origin(self)
    }

    fn to_assembled(&self) -> AssembledUrl {
        AssembledUrl {
            scheme: self.scheme().to_owned(),
            scheme_kind: self.structure.scheme_kind,
            username: self.username().to_owned(),
            password: self.password().map(|p| p.to_owned()),
            host: self.host().map(|h| h.to_owned()),
            port: self.port(),
            sigil: self.structure.sigil,
            path: self.path().to_owned(),
            has_opaque_path: self.structure.has_opaque_path,
            first_path_component_len: self.structure.first_path_component_len,
            query: self.query().map(|q| q.to_owned()),
            query_is_form_encoded: self.structure.query_is_known_form_encoded,
            fragment: self.fragment().map(|f| f.to_owned()),
        }
    }

    /// Replace the scheme, keeping every other component.
    ///
    /// Rejects anything that would change whether the URL is special
    /// (special and non-special schemes have incompatible host/path
    /// requirements), switching to `file` while credentials or a port are
    /// present, and switching away from `file` when the host is empty
    /// (non-`file` special schemes require a non-empty host).
    pub fn set_scheme(&mut self, scheme: &str) -> Result<(), ParseError> {
        let new_kind = SchemeKind::from_str(&scheme.to_ascii_lowercase());
        let old_kind = self.structure.scheme_kind;
        if new_kind.is_special() != old_kind.is_special() {
            return Err(ParseError::InvalidSchemeChange);
        }
        if new_kind == SchemeKind::File && self.structure.has_credentials() {
            return Err(ParseError::InvalidSchemeChange);
        }
        if old_kind == SchemeKind::File
            && new_kind != SchemeKind::File
            && self.host_str() == Some("")
        {
            return Err(ParseError::InvalidSchemeChange);
        }
        let mut parts = self.to_assembled();
        parts.scheme = scheme.to_ascii_lowercase();
        parts.scheme_kind = new_kind;
        // `self.port()` is never the old scheme's default (the parser
        // never stores it), so only the new default needs checking.
        if parts.port.is_some() && parts.port == new_kind.default_port() {
            parts.port = None;
        }
        *self = assemble(parts)?;
        Ok(())
    }

    pub fn set_username(&mut self, username: &str) -> Result<(), ParseError> {
        if self.structure.cannot_have_credentials_or_port() {
            return Err(ParseError::SetHostOnCannotBeABaseUrl);
        }
        let mut parts = self.to_assembled();
        parts.username = encode_userinfo(username);
        *self = assemble(parts)?;
        Ok(())
    }

    pub fn set_password(&mut self, password: Option<&str>) -> Result<(), ParseError> {
        if self.structure.cannot_have_credentials_or_port() {
            return Err(ParseError::SetHostOnCannotBeABaseUrl);
        }
        let mut parts = self.to_assembled();
        parts.password = password.map(encode_userinfo);
        *self = assemble(parts)?;
        Ok(())
    }

    pub fn set_hostname(&mut self, host: &str) -> Result<(), ParseError> {
        if self.structure.has_opaque_path {
            return Err(ParseError::SetHostOnCannotBeABaseUrl);
        }
        let mut parts = self.to_assembled();
        let parsed = host::parse_host(host, parts.scheme_kind)?;
        let had_host = parts.host.is_some();
        parts.host = Some(parsed);
        if !had_host {
            parts.sigil = Sigil::Authority;
        }
        *self = assemble(parts)?;
        Ok(())
    }

    /// Set the port. `port` is widened to `u32` because a value outside
    /// `u16`'s range is a representable (and spec-mandated) failure case,
    /// not a type error for the caller to run into at compile time.
    pub fn set_port(&mut self, port: Option<u32>) -> Result<(), ParseError> {
        if self.structure.cannot_have_credentials_or_port() {
            return Err(ParseError::SetHostOnCannotBeABaseUrl);
        }
        let port = match port {
            Some(p) => Some(u16::try_from(p).map_err(|_| ParseError::Overflow)?),
            None => None,
        };
        let mut parts = self.to_assembled();
        parts.port = match port {
            Some(p) if Some(p) != parts.scheme_kind.default_port() => Some(p),
            _ => None,
        };
        *self = assemble(parts)?;
        Ok(())
    }

    /// Replace the path. `path` is parsed fresh (no merge against the
    /// current path); leading separators are honored the same way a
    /// hierarchical URL's path is at parse time.
    pub fn set_path(&mut self, path: &str) -> Result<(), ParseError> {
        let mut parts = self.to_assembled();
        if parts.has_opaque_path {
            parts.path = percent_encoding::percent_encode(path.as_bytes(), &percent_encoding::CONTROLS).to_string();
            *self = assemble(parts)?;
            return Ok(());
        }
        let mut collector = PathCollector::default();
        let has_authority = parts.host.is_some();
        path::walk_path(path.as_bytes(), parts.scheme_kind, None, !has_authority, &mut collector);
        let (new_path, sigil_from_path) = collector.finish();
        parts.sigil = if has_authority { Sigil::Authority } else { sigil_from_path };
        parts.first_path_component_len = parser::first_component_len(&new_path);
        parts.path = new_path;
        *self = assemble(parts)?;
        Ok(())
    }

    pub fn set_query(&mut self, query: Option<&str>) -> Result<(), ParseError> {
        let mut parts = self.to_assembled();
        parts.query = query.map(|q| encode_query(q, parts.scheme_kind));
        parts.query_is_form_encoded = parts.query.as_deref().map_or(true, |q| q.is_empty());
        *self = assemble(parts)?;
        Ok(())
    }

    /// Replace the query string with the serialization of `pairs`, set as
    /// `application/x-www-form-urlencoded`.
    pub fn set_query_from_pairs<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for pair in pairs {
            let (k, v) = pair.borrow();
            serializer.append_pair(k.as_ref(), v.as_ref());
        }
        let encoded = serializer.finish();
        let mut parts = self.to_assembled();
        parts.query = Some(encoded);
        parts.query_is_form_encoded = true;
        *self = assemble(parts).expect("query replacement cannot violate structural invariants");
    }

    pub fn set_fragment(&mut self, fragment: Option<&str>) {
        let mut parts = self.to_assembled();
        parts.fragment = fragment.map(encode_fragment);
        *self = assemble(parts).expect("fragment replacement cannot violate structural invariants");
    }
}

/// The splice target [`Url::query_pairs_mut`] hands to a
/// `form_urlencoded::Serializer`. Pairs accumulate in `buffer`, starting
/// empty; the buffer is written back into `url` as the URL's new query
/// (through the same `assemble` path every other setter uses) either by
/// calling `finish()` or by letting the `Serializer` drop, matching the
/// no-`finish()`-required ergonomics of `url.query_pairs_mut().append_pair(...)`.
/// `url` is an `Option` so `finish` can hand the reference back out while
/// leaving the subsequent `Drop::drop` a no-op.
pub struct UrlQuery<'a> {
    url: Option<&'a mut Url>,
    buffer: String,
}

impl<'a> UrlQuery<'a> {
    fn commit(&mut self) {
        if let Some(url) = &mut self.url {
            let mut parts = url.to_assembled();
            parts.query = Some(std::mem::take(&mut self.buffer));
            parts.query_is_form_encoded = true;
            **url = assemble(parts).expect("query replacement cannot violate structural invariants");
        }
    }
}

impl<'a> Drop for UrlQuery<'a> {
    fn drop(&mut self) {
        self.commit();
    }
}

impl<'a> form_urlencoded::Target for UrlQuery<'a> {
    type Finished = &'a mut Url;

    fn as_mut_string(&mut self) -> &mut String {
        &mut self.buffer
    }

    fn finish(mut self) -> &'a mut Url {
        self.commit();
        self.url.take().expect("UrlQuery is only finished once")
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialization)
    }
}

impl fmt::Debug for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Url").field(&self.serialization).finish()
    }
}

impl FromStr for Url {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Url, ParseError> {
        Url::parse(input)
    }
}

impl<'a> TryFrom<&'a str> for Url {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Url, ParseError> {
        Url::parse(input)
    }
}

impl PartialEq for Url {
    fn eq(&self, other: &Url) -> bool {
        self.serialization == other.serialization
    }
}

impl Eq for Url {}

impl Hash for Url {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialization.hash(state);
    }
}

impl PartialOrd for Url {
    fn partial_cmp(&self, other: &Url) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Url {
    fn cmp(&self, other: &Url) -> Ordering {
        self.serialization.cmp(&other.serialization)
    }
}

impl AsRef<str> for Url {
    fn as_ref(&self) -> &str {
        &self.serialization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_http_url() {
        let url = Url::parse("https://example.com/a/b?q=1#frag").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/a/b");
        assert_eq!(url.query(), Some("q=1"));
        assert_eq!(url.fragment(), Some("frag"));
    }

    #[test]
    fn default_port_is_dropped() {
        let url = Url::parse("http://example.com:80/").unwrap();
        assert_eq!(url.port(), None);
        assert_eq!(url.port_or_known_default(), Some(80));
    }

    #[test]
    fn relative_reference_resolves_against_base() {
        let base = Url::parse("https://example.com/a/b").unwrap();
        let resolved = base.join("../c").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/c");
    }

    #[test]
    fn opaque_path_url_has_no_authority() {
        let url = Url::parse("mailto:user@example.com").unwrap();
        assert!(url.has_opaque_path());
        assert_eq!(url.host_str(), None);
        assert_eq!(url.path(), "user@example.com");
    }

    #[test]
    fn set_hostname_adds_authority_to_file_url() {
        let mut url = Url::parse("file:///a/b").unwrap();
        url.set_hostname("example.com").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.as_str(), "file://example.com/a/b");
    }

    #[test]
    fn set_path_reencodes_and_updates_sigil() {
        let mut url = Url::parse("https://example.com/old").unwrap();
        url.set_path("/new/path with space").unwrap();
        assert_eq!(url.path(), "/new/path%20with%20space");
    }

    #[test]
    fn opaque_origin_for_non_special_scheme() {
        let url = Url::parse("data:text/plain,hi").unwrap();
        assert!(!url.origin().is_tuple());
    }

    #[test]
    fn tuple_origin_for_http() {
        let url = Url::parse("https://example.com:8443/").unwrap();
        let origin = url.origin();
        assert_eq!(origin.ascii_serialization(), "https://example.com:8443");
    }

    #[test]
    fn query_pairs_parses_form_encoded_query() {
        let url = Url::parse("https://example.com/?a=1&b=2").unwrap();
        let pairs: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(pairs, vec![("a".to_owned(), "1".to_owned()), ("b".to_owned(), "2".to_owned())]);
    }

    #[test]
    fn query_pairs_mut_commits_on_drop() {
        let mut url = Url::parse("https://example.com/?old=1").unwrap();
        url.query_pairs_mut().append_pair("new", "2");
        assert_eq!(url.query(), Some("new=2"));
    }

    #[test]
    fn query_pairs_mut_finish_returns_the_same_url() {
        let mut url = Url::parse("https://example.com/").unwrap();
        let mut serializer = url.query_pairs_mut();
        serializer.append_pair("a", "1");
        let returned = serializer.finish();
        assert_eq!(returned.query(), Some("a=1"));
    }

    #[test]
    fn set_port_accepts_in_range_values_and_rejects_overflow() {
        let mut url = Url::parse("http://example.com/").unwrap();
        url.set_port(Some(9000)).unwrap();
        assert_eq!(url.port(), Some(9000));
        assert_eq!(url.set_port(Some(u32::from(u16::MAX) + 1)).unwrap_err(), ParseError::Overflow);
    }
}
