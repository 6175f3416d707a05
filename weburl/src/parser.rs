// Copyright the weburl contributors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The URL parser. `parse` is the only entry point; it builds the
//! canonical serialization directly as a `String` (letting the buffer
//! grow as pieces are appended, rather than a separate metrics pass —
//! the allocation count this trades away matters far less than keeping
//! the control flow readable, see `DESIGN.md`) and a matching
//! [`UrlStructure`] alongside it.

use crate::host::{self, Host};
use crate::path::{self, PathVisitor};
use crate::structure::{HostKind, Sigil, SchemeKind, UrlStructure};
use crate::{ParseError, Url};
use percent_encoding::{percent_encode, utf8_percent_encode};
use std::convert::TryInto;

/// Non-fatal diagnostics emitted during parsing. Parsing always
/// completes (or fails fatally) regardless of whether any of these fire;
/// they exist purely for callers that want WHATWG-style validation
/// warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyntaxViolation {
    C0OrSpaceTrimmed,
    TabOrNewlineIgnored,
    ExpectedDoubleSlash,
    ExpectedFileDoubleSlash,
    Backslash,
    UnescapedUserInfoAtSign,
    NonUrlCodePoint,
    SpecialSchemeMissingSlashes,
}

/// The shape of a [`crate::ParseOptions::syntax_violation_callback`].
pub type ViolationFn<'a> = dyn Fn(SyntaxViolation) + 'a;

struct Logger<'a> {
    callback: Option<&'a ViolationFn<'a>>,
}

impl<'a> Logger<'a> {
    fn log(&self, violation: SyntaxViolation) {
        if let Some(f) = self.callback {
            f(violation);
        }
    }
}

/// Parse `input`, resolving against `base` when `input` has no scheme of
/// its own.
pub fn parse(input: &str, base: Option<&Url>, callback: Option<&ViolationFn<'_>>) -> Result<Url, ParseError> {
    let logger = Logger { callback };
    let trimmed = trim_c0_and_space(input, &logger);
    let cleaned = strip_tab_and_newline(trimmed, &logger);

    match find_scheme(&cleaned) {
        Some((scheme, rest)) => parse_with_scheme(&scheme, rest, &logger),
        None => {
            let base = base.ok_or(ParseError::RelativeUrlWithoutBase)?;
            parse_relative(&cleaned, base, &logger)
        }
    }
}

fn trim_c0_and_space<'a>(input: &'a str, logger: &Logger<'_>) -> &'a str {
    let is_c0_or_space = |b: u8| b <= 0x20;
    let start = input.as_bytes().iter().position(|&b| !is_c0_or_space(b)).unwrap_or(input.len());
    let end = input.as_bytes().iter().rposition(|&b| !is_c0_or_space(b)).map_or(start, |i| i + 1);
    if start != 0 || end != input.len() {
        logger.log(SyntaxViolation::C0OrSpaceTrimmed);
    }
    &input[start..end]
}

fn strip_tab_and_newline(input: &str, logger: &Logger<'_>) -> String {
    if input.bytes().any(|b| matches!(b, b'\t' | b'\n' | b'\r')) {
        logger.log(SyntaxViolation::TabOrNewlineIgnored);
        input.chars().filter(|&c| !matches!(c, '\t' | '\n' | '\r')).collect()
    } else {
        input.to_owned()
    }
}

/// If `input` begins with a valid scheme grammar followed by `:`, return
/// the lower-cased scheme and the remainder after the colon.
fn find_scheme(input: &str) -> Option<(String, &str)> {
    let bytes = input.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_alphabetic() {
        return None;
    }
    let end = bytes
        .iter()
        .position(|&b| !(b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')))?;
    if bytes.get(end) != Some(&b':') {
        return None;
    }
    Some((input[..end].to_ascii_lowercase(), &input[end + 1..]))
}

fn parse_with_scheme(scheme: &str, rest: &str, logger: &Logger<'_>) -> Result<Url, ParseError> {
    let scheme_kind = SchemeKind::from_str(scheme);

    if scheme_kind.is_special() {
        let stripped = rest.trim_start_matches(|c| c == '/' || c == '\\');
        if stripped.len() == rest.len() {
            logger.log(SyntaxViolation::SpecialSchemeMissingSlashes);
        } else if !rest.starts_with("//") {
            logger.log(SyntaxViolation::Backslash);
        }
        build_with_authority(scheme, scheme_kind, stripped, logger)
    } else if let Some(after) = rest.strip_prefix("//") {
        build_with_authority(scheme, scheme_kind, after, logger)
    } else if let Some(after) = rest.strip_prefix('/') {
        let (path_in, query_in, fragment_in) = split_path_query_fragment(after);
        build_hierarchical_no_authority(scheme, scheme_kind, path_in, query_in, fragment_in, logger)
    } else {
        let (opaque_in, query_in, fragment_in) = split_path_query_fragment(rest);
        build_opaque(scheme, scheme_kind, opaque_in, query_in, fragment_in, logger)
    }
}

fn build_opaque(
    scheme: &str,
    scheme_kind: SchemeKind,
    opaque_in: &str,
    query_in: Option<&str>,
    fragment_in: Option<&str>,
    _logger: &Logger<'_>,
) -> Result<Url, ParseError> {
    let opaque_path = percent_encode(opaque_in.as_bytes(), &percent_encoding::CONTROLS).to_string();
    let query = query_in.map(|q| encode_query(q, scheme_kind));
    let query_is_form_encoded = query.as_deref().map_or(true, |q| q.is_empty());
    let fragment = fragment_in.map(encode_fragment);
    assemble(AssembledUrl {
        scheme: scheme.to_owned(),
        scheme_kind,
        username: String::new(),
        password: None,
        host: None,
        port: None,
        sigil: Sigil::None,
        path: opaque_path,
        has_opaque_path: true,
        first_path_component_len: 0,
        query,
        query_is_form_encoded,
        fragment,
    })
}

fn build_hierarchical_no_authority(
    scheme: &str,
    scheme_kind: SchemeKind,
    path_in: &str,
    query_in: Option<&str>,
    fragment_in: Option<&str>,
    _logger: &Logger<'_>,
) -> Result<Url, ParseError> {
    let mut collector = PathCollector::default();
    path::walk_path(path_in.as_bytes(), scheme_kind, None, true, &mut collector);
    let (path, sigil) = collector.finish();
    let query = query_in.map(|q| encode_query(q, scheme_kind));
    let query_is_form_encoded = query.as_deref().map_or(true, |q| q.is_empty());
    let fragment = fragment_in.map(encode_fragment);
    let first_path_component_len = first_component_len(&path);
    assemble(AssembledUrl {
        scheme: scheme.to_owned(),
        scheme_kind,
        username: String::new(),
        password: None,
        host: None,
        port: None,
        sigil,
        path,
        has_opaque_path: false,
        first_path_component_len,
        query,
        query_is_form_encoded,
        fragment,
    })
}

/// Parse everything after the authority sigil (`//`) was stripped:
/// `[userinfo@]host[:port][/path][?query][#fragment]`.
fn build_with_authority(
    scheme: &str,
    scheme_kind: SchemeKind,
    after_sigil: &str,
    logger: &Logger<'_>,
) -> Result<Url, ParseError> {
    let authority_end = after_sigil
        .find(|c| c == '/' || c == '\\' || c == '?' || c == '#')
        .unwrap_or(after_sigil.len());
    let authority = &after_sigil[..authority_end];
    let remainder = &after_sigil[authority_end..];

    let (userinfo, host_port) = match authority.rfind('@') {
        Some(i) => {
            if i > 0 {
                logger.log(SyntaxViolation::UnescapedUserInfoAtSign);
            }
            (Some(&authority[..i]), &authority[i + 1..])
        }
        None => (None, authority),
    };

    let (username, password) = match userinfo {
        Some(info) => match info.find(':') {
            Some(i) => (
                encode_userinfo(&info[..i]),
                Some(encode_userinfo(&info[i + 1..])),
            ),
            None => (encode_userinfo(info), None),
        },
        None => (String::new(), None),
    };

    let (host_text, port_text) = split_host_port(host_port)?;

    let host_is_drive_letter =
        scheme_kind == SchemeKind::File && path::is_windows_drive_letter(host_text.as_bytes());

    // When the "host" position actually holds a Windows drive letter, it
    // was never a host at all: rewind so the path walker sees the drive
    // letter as its own leading component instead.
    let rewritten_path;
    let (host, path_for_walk): (Option<Host<String>>, &str) = if host_is_drive_letter {
        rewritten_path = format!("{}{}", host_text, remainder);
        (None, rewritten_path.as_str())
    } else {
        (Some(host::parse_host(host_text, scheme_kind)?), remainder)
    };

    let port = match port_text {
        Some(text) if !text.is_empty() => {
            let value: u32 = text.parse().map_err(|_| ParseError::InvalidPort)?;
            let value: u16 = value.try_into().map_err(|_| ParseError::Overflow)?;
            if Some(value) == scheme_kind.default_port() {
                None
            } else {
                Some(value)
            }
        }
        _ => None,
    };

    let (path_in, query_in, fragment_in) = split_path_query_fragment(path_for_walk);
    let mut collector = PathCollector::default();
    let has_authority = host.is_some();
    path::walk_path(path_in.as_bytes(), scheme_kind, None, !has_authority, &mut collector);
    let (path, sigil_from_path) = collector.finish();
    let sigil = if has_authority { Sigil::Authority } else { sigil_from_path };

    let query = query_in.map(|q| encode_query(q, scheme_kind));
    let query_is_form_encoded = query.as_deref().map_or(true, |q| q.is_empty());
    let fragment = fragment_in.map(encode_fragment);
    let first_path_component_len = first_component_len(&path);

    assemble(AssembledUrl {
        scheme: scheme.to_owned(),
        scheme_kind,
        username,
        password,
        host,
        port,
        sigil,
        path,
        has_opaque_path: false,
        first_path_component_len,
        query,
        query_is_form_encoded,
        fragment,
    })
}

fn parse_relative(input: &str, base: &Url, logger: &Logger<'_>) -> Result<Url, ParseError> {
    let scheme_kind = base.scheme_kind();

    if input.is_empty() {
        return Ok(base.clone());
    }
    if let Some(frag) = input.strip_prefix('#') {
        let mut clone = base.clone();
        clone.set_fragment(Some(frag));
        return Ok(clone);
    }
    if base.has_opaque_path() {
        return Err(ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    if let Some(q) = input.strip_prefix('?') {
        let (query_in, fragment_in) = match q.find('#') {
            Some(i) => (&q[..i], Some(&q[i + 1..])),
            None => (q, None),
        };
        let mut clone = base.clone();
        clone.set_query(Some(query_in));
        if let Some(f) = fragment_in {
            clone.set_fragment(Some(f));
        } else {
            clone.set_fragment(None);
        }
        return Ok(clone);
    }

    let is_special = scheme_kind.is_special();
    let starts_with_two_separators = if is_special {
        let mut chars = input.chars();
        matches!(chars.next(), Some('/') | Some('\\')) && matches!(chars.next(), Some('/') | Some('\\'))
    } else {
        input.starts_with("//")
    };

    if starts_with_two_separators {
        let after = &input[2..];
        return build_with_authority(base.scheme(), scheme_kind, after, logger);
    }

    if let Some(after) = input.strip_prefix(|c| c == '/' || (is_special && c == '\\')) {
        let (path_in, query_in, fragment_in) = split_path_query_fragment(after);
        return build_relative_result(base, path_in, None, query_in, fragment_in);
    }

    let (path_in, query_in, fragment_in) = split_path_query_fragment(input);
    let base_path_bytes = base.path().as_bytes().to_vec();
    build_relative_result(base, path_in, Some(&base_path_bytes), query_in, fragment_in)
}

fn build_relative_result(
    base: &Url,
    path_in: &str,
    merge_base: Option<&[u8]>,
    query_in: Option<&str>,
    fragment_in: Option<&str>,
) -> Result<Url, ParseError> {
    let scheme_kind = base.scheme_kind();
    let has_authority = base.host().is_some();
    let mut collector = PathCollector::default();
    path::walk_path(path_in.as_bytes(), scheme_kind, merge_base, !has_authority, &mut collector);
    let (path, sigil_from_path) = collector.finish();
    let sigil = if has_authority { Sigil::Authority } else { sigil_from_path };

    let query = query_in.map(|q| encode_query(q, scheme_kind));
    let query_is_form_encoded = query.as_deref().map_or(true, |q| q.is_empty());
    let fragment = fragment_in.map(encode_fragment);
    let first_path_component_len = first_component_len(&path);

    assemble(AssembledUrl {
        scheme: base.scheme().to_owned(),
        scheme_kind,
        username: base.username().to_owned(),
        password: base.password().map(|p| p.to_owned()),
        host: base.host().map(|h| h.to_owned()),
        port: base.port(),
        sigil,
        path,
        has_opaque_path: false,
        first_path_component_len,
        query,
        query_is_form_encoded,
        fragment,
    })
}

/// The fully-decided component set for one [`Url`] value, handed to
/// [`assemble`] to write out the canonical buffer and structure. Shared
/// between the parser and the component setters in `lib.rs`, which is
/// why every field is `pub(crate)`: both build a fresh one and ask
/// `assemble` to do the actual splicing/layout work.
pub(crate) struct AssembledUrl {
    pub(crate) scheme: String,
    pub(crate) scheme_kind: SchemeKind,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
    pub(crate) host: Option<Host<String>>,
    pub(crate) port: Option<u16>,
    pub(crate) sigil: Sigil,
    pub(crate) path: String,
    pub(crate) has_opaque_path: bool,
    pub(crate) first_path_component_len: u32,
    pub(crate) query: Option<String>,
    pub(crate) query_is_form_encoded: bool,
    pub(crate) fragment: Option<String>,
}

pub(crate) fn assemble(parts: AssembledUrl) -> Result<Url, ParseError> {
    let mut serialization = String::new();
    serialization.push_str(&parts.scheme);
    serialization.push(':');
    let scheme_len = serialization.len() as u32;

    serialization.push_str(parts.sigil.as_str());

    let username_start = serialization.len();
    serialization.push_str(&parts.username);
    let username_len = (serialization.len() - username_start) as u32;

    let password_len = if let Some(password) = &parts.password {
        let start = serialization.len();
        serialization.push(':');
        serialization.push_str(password);
        (serialization.len() - start) as u32
    } else {
        0
    };

    let host_kind;
    let hostname_len;
    if let Some(host) = &parts.host {
        if !parts.username.is_empty() || password_len > 0 {
            serialization.push('@');
        }
        host_kind = match host {
            Host::Empty => HostKind::Empty,
            Host::Domain(_) => HostKind::Domain,
            Host::Ipv4(_) => HostKind::Ipv4,
            Host::Ipv6(_) => HostKind::Ipv6,
            Host::Opaque(_) => HostKind::Opaque,
        };
        let host_start = serialization.len();
        serialization.push_str(&host.to_string());
        hostname_len = (serialization.len() - host_start) as u32;
    } else {
        host_kind = HostKind::Nil;
        hostname_len = 0;
    }

    let port_len = if let Some(port) = parts.port {
        let start = serialization.len();
        serialization.push(':');
        serialization.push_str(&port.to_string());
        (serialization.len() - start) as u32
    } else {
        0
    };

    let path_start = serialization.len();
    serialization.push_str(&parts.path);
    let path_len = (serialization.len() - path_start) as u32;

    let query_len = if let Some(query) = &parts.query {
        let start = serialization.len();
        serialization.push('?');
        serialization.push_str(query);
        (serialization.len() - start) as u32
    } else {
        0
    };

    let fragment_len = if let Some(fragment) = &parts.fragment {
        let start = serialization.len();
        serialization.push('#');
        serialization.push_str(fragment);
        (serialization.len() - start) as u32
    } else {
        0
    };

    let structure = UrlStructure {
        scheme_len,
        username_len,
        password_len,
        hostname_len,
        port_len,
        path_len,
        query_len,
        fragment_len,
        first_path_component_len: parts.first_path_component_len,
        sigil: parts.sigil,
        scheme_kind: parts.scheme_kind,
        host_kind,
        has_opaque_path: parts.has_opaque_path,
        query_is_known_form_encoded: parts.query_is_form_encoded,
    };

    #[cfg(debug_assertions)]
    structure.debug_assert_invariants();

    Ok(Url::from_raw_parts(serialization, structure))
}

/// Collects a `walk_path` run into an owned, forward-order path string.
/// Reused by the component setters (`setPath`, `setHostname`) so there is
/// exactly one place that knows how to turn path-walker callbacks into a
/// buffer fragment.
#[derive(Default)]
pub(crate) struct PathCollector {
    parts: Vec<String>,
    needs_sigil: bool,
}

impl PathVisitor for PathCollector {
    fn visit_input_path_component(&mut self, bytes: &[u8], is_leading_windows_drive_letter: bool) {
        let mut encoded = percent_encode(bytes, &percent_encoding::PATH).to_string();
        if is_leading_windows_drive_letter && encoded.len() >= 2 {
            let mut b = encoded.into_bytes();
            b[1] = b':';
            encoded = String::from_utf8(b).unwrap();
        }
        self.parts.push(encoded);
    }

    fn visit_base_path_component(&mut self, bytes: &[u8]) {
        self.parts.push(String::from_utf8_lossy(bytes).into_owned());
    }

    fn visit_empty_path_components(&mut self, n: u32) {
        for _ in 0..n {
            self.parts.push(String::new());
        }
    }

    fn visit_path_sigil(&mut self) {
        self.needs_sigil = true;
    }
}

impl PathCollector {
    pub(crate) fn finish(self) -> (String, Sigil) {
        let mut parts = self.parts;
        parts.reverse();
        let path = if parts.is_empty() {
            String::new()
        } else {
            format!("/{}", parts.join("/"))
        };
        let sigil = if self.needs_sigil { Sigil::Path } else { Sigil::None };
        (path, sigil)
    }
}

pub(crate) fn first_component_len(path: &str) -> u32 {
    if !path.starts_with('/') {
        return 0;
    }
    let after = &path[1..];
    let end = after.find('/').unwrap_or(after.len());
    end as u32
}

fn split_path_query_fragment(s: &str) -> (&str, Option<&str>, Option<&str>) {
    let (before_fragment, fragment) = match s.find('#') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let (path, query) = match before_fragment.find('?') {
        Some(i) => (&before_fragment[..i], Some(&before_fragment[i + 1..])),
        None => (before_fragment, None),
    };
    (path, query, fragment)
}

fn split_host_port(s: &str) -> Result<(&str, Option<&str>), ParseError> {
    if let Some(rest) = s.strip_prefix('[') {
        let close = rest.find(']').ok_or(ParseError::InvalidIpv6Address)?;
        let host = &s[..close + 2];
        let after = &rest[close + 1..];
        if after.is_empty() {
            Ok((host, None))
        } else if let Some(port) = after.strip_prefix(':') {
            Ok((host, Some(port)))
        } else {
            Err(ParseError::InvalidIpv6Address)
        }
    } else {
        match s.find(':') {
            Some(i) => Ok((&s[..i], Some(&s[i + 1..]))),
            None => Ok((s, None)),
        }
    }
}

pub(crate) fn encode_userinfo(s: &str) -> String {
    utf8_percent_encode(s, &percent_encoding::USERINFO).to_string()
}

pub(crate) fn encode_query(s: &str, scheme_kind: SchemeKind) -> String {
    let set = if scheme_kind.is_special() {
        &percent_encoding::SPECIAL_QUERY
    } else {
        &percent_encoding::QUERY
    };
    utf8_percent_encode(s, set).to_string()
}

pub(crate) fn encode_fragment(s: &str) -> String {
    utf8_percent_encode(s, &percent_encoding::FRAGMENT).to_string()
}
