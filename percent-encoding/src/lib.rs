// Copyright the weburl contributors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Percent encoding and decoding.
//!
//! Percent-encoding replaces reserved ASCII bytes with `%` followed by two
//! upper-case hex digits, and always escapes any byte `>= 0x80`. Which
//! bytes count as "reserved" depends on context (a path, a query string, a
//! username...), so encoding is parameterized by an [`AsciiSet`].
//!
//! Decoding is lazy and never fails: a `%` not followed by two hex digits
//! is passed through unchanged. [`decode_elements`] exposes, per output
//! byte, whether it came from a `%XX` escape or from a substitution
//! (`+` <-> space in form encoding) so that callers working at the
//! component level (path segments, file paths) can reject a decoded slash
//! or NUL that would otherwise look like a structural delimiter.

#![forbid(unsafe_code)]

use std::borrow::Cow;
use std::fmt;
use std::str;

mod ascii_set;
pub use ascii_set::AsciiSet;

include!("encode_sets_data.rs");

/// Upper-case hex digits, as required by the WHATWG URL Standard.
const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

fn to_hex_upper(value: u8) -> u8 {
    HEX_UPPER[(value & 0xF) as usize]
}

fn from_hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// A one-way substitution applied before percent-encoding / after
/// percent-decoding, such as `application/x-www-form-urlencoded`'s
/// `+` standing in for a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    /// The literal byte that is substituted away during encoding.
    pub literal: u8,
    /// The byte written in its place.
    pub substitute: u8,
}

impl Substitution {
    /// `' '` encodes as `'+'` and `'+'` decodes back to `' '`.
    pub const FORM: Substitution = Substitution {
        literal: b' ',
        substitute: b'+',
    };
}

/// The result of encoding a single input byte: either it passed through
/// unchanged, or it was escaped to a 3-byte `%XX` triple.
///
/// This is the primitive the path writer (which must write path
/// components back-to-front) builds on: each variant is self-contained
/// and can be pushed onto either end of a buffer without reordering its
/// own bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedByte {
    /// Passed through as-is (possibly after substitution).
    Raw(u8),
    /// Escaped as `%` + two upper-case hex digits.
    Escaped([u8; 3]),
}

impl EncodedByte {
    /// The bytes this encodes to, in the order they must be written.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EncodedByte::Raw(b) => std::slice::from_ref(b),
            EncodedByte::Escaped(triple) => triple,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EncodedByte::Raw(_) => 1,
            EncodedByte::Escaped(_) => 3,
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Encode a single byte under `set`, applying `substitution` first.
///
/// This is the building block for both the streaming forward encoder
/// ([`percent_encode`]) and callers that must write components in
/// reverse, such as the path walker.
pub fn encode_byte(byte: u8, set: &AsciiSet, substitution: Option<Substitution>) -> EncodedByte {
    if let Some(sub) = substitution {
        if byte == sub.literal {
            return EncodedByte::Raw(sub.substitute);
        }
    }
    if set.should_percent_encode(byte) {
        EncodedByte::Escaped([b'%', to_hex_upper(byte >> 4), to_hex_upper(byte & 0xF)])
    } else {
        EncodedByte::Raw(byte)
    }
}

/// A streaming, lazy percent-encoder. Each `next()` call yields the next
/// maximal run of pass-through bytes (borrowed), or a single `%XX` escape
/// (owned), as a `str` fragment.
#[derive(Clone)]
pub struct PercentEncode<'a> {
    bytes: &'a [u8],
    set: &'static AsciiSet,
    substitution: Option<Substitution>,
}

impl<'a> Iterator for PercentEncode<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Cow<'a, str>> {
        if self.bytes.is_empty() {
            return None;
        }
        let first = self.bytes[0];
        match encode_byte(first, self.set, self.substitution) {
            EncodedByte::Escaped(triple) => {
                self.bytes = &self.bytes[1..];
                Some(Cow::Owned(
                    str::from_utf8(&triple).expect("hex escape is ASCII").to_owned(),
                ))
            }
            EncodedByte::Raw(substituted) if substituted == first => {
                let mut end = 1;
                while end < self.bytes.len()
                    && matches!(
                        encode_byte(self.bytes[end], self.set, self.substitution),
                        EncodedByte::Raw(b) if b == self.bytes[end]
                    )
                {
                    end += 1;
                }
                let run = &self.bytes[..end];
                self.bytes = &self.bytes[end..];
                // A run only contains bytes that passed through
                // unsubstituted, so it is valid UTF-8 iff the input was
                // (non-ASCII bytes are never "Raw": every AsciiSet treats
                // byte >= 0x80 as always-escape).
                Some(Cow::Borrowed(
                    str::from_utf8(run).expect("non-ASCII bytes are always escaped"),
                ))
            }
            EncodedByte::Raw(substituted) => {
                // A single substituted byte (e.g. space -> '+').
                self.bytes = &self.bytes[1..];
                Some(Cow::Owned((substituted as char).to_string()))
            }
        }
    }
}

impl<'a> PercentEncode<'a> {
    /// The input bytes not yet consumed by `next()`.
    pub fn remaining_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> fmt::Display for PercentEncode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.clone() {
            f.write_str(&chunk)?;
        }
        Ok(())
    }
}

impl<'a> From<PercentEncode<'a>> for Cow<'a, str> {
    fn from(encoder: PercentEncode<'a>) -> Self {
        let mut chunks = encoder.clone();
        match chunks.next() {
            None => Cow::Borrowed(""),
            Some(first) => {
                if chunks.next().is_none() {
                    first
                } else {
                    Cow::Owned(encoder.collect())
                }
            }
        }
    }
}

/// Percent-encode `input` under `set`.
pub fn percent_encode<'a>(input: &'a [u8], set: &'static AsciiSet) -> PercentEncode<'a> {
    PercentEncode {
        bytes: input,
        set,
        substitution: None,
    }
}

/// Percent-encode `input` under `set`, substituting `substitution.literal`
/// with `substitution.substitute` wherever it occurs (used for
/// `application/x-www-form-urlencoded`'s space/`+` quirk).
pub fn percent_encode_with_substitution<'a>(
    input: &'a [u8],
    set: &'static AsciiSet,
    substitution: Substitution,
) -> PercentEncode<'a> {
    PercentEncode {
        bytes: input,
        set,
        substitution: Some(substitution),
    }
}

/// Percent-encode the UTF-8 bytes of `input` under `set`.
pub fn utf8_percent_encode<'a>(input: &'a str, set: &'static AsciiSet) -> PercentEncode<'a> {
    percent_encode(input.as_bytes(), set)
}

/// One decoded output byte, annotated with how it was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedByte {
    pub value: u8,
    /// True if this byte came from a `%XX` escape rather than passing
    /// through literally.
    pub was_percent_decoded: bool,
}

impl DecodedByte {
    /// Whichever of `was_percent_decoded` matters to callers that treat a
    /// decoded path separator or NUL as meaningfully different from a
    /// literal one.
    pub fn is_decoded(&self) -> bool {
        self.was_percent_decoded
    }
}

/// A streaming, lazy element-wise percent-decoder that preserves, per
/// byte, whether it was produced by a `%XX` escape. An optional
/// [`Substitution`] is reversed (substitute -> literal) before a byte is
/// inspected for `%` escaping.
#[derive(Clone)]
pub struct DecodeElements<'a> {
    bytes: &'a [u8],
    substitution: Option<Substitution>,
}

impl<'a> Iterator for DecodeElements<'a> {
    type Item = DecodedByte;

    fn next(&mut self) -> Option<DecodedByte> {
        let (&first, rest) = self.bytes.split_first()?;
        if first == b'%' {
            if let [h, l, tail @ ..] = rest {
                if let (Some(hi), Some(lo)) = (from_hex(*h), from_hex(*l)) {
                    self.bytes = tail;
                    return Some(DecodedByte {
                        value: hi * 0x10 + lo,
                        was_percent_decoded: true,
                    });
                }
            }
        }
        self.bytes = rest;
        let value = match self.substitution {
            Some(sub) if first == sub.substitute => sub.literal,
            _ => first,
        };
        Some(DecodedByte {
            value,
            was_percent_decoded: false,
        })
    }
}

/// Element-wise decode of `input`, exposing per-byte decode provenance.
pub fn decode_elements(input: &[u8], substitution: Option<Substitution>) -> DecodeElements<'_> {
    DecodeElements {
        bytes: input,
        substitution,
    }
}

/// A streaming percent-decoder yielding plain bytes (no provenance). This
/// is the common case: form-encoded query values, fragments, and other
/// components that do not need to distinguish a literal byte from a
/// decoded one.
#[derive(Clone)]
pub struct PercentDecode<'a> {
    inner: DecodeElements<'a>,
}

impl<'a> Iterator for PercentDecode<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.inner.next().map(|d| d.value)
    }
}

impl<'a> PercentDecode<'a> {
    /// Collect the decoded bytes into a `Vec<u8>`.
    pub fn collect_to_vec(self) -> Vec<u8> {
        self.collect()
    }

    /// Decode then interpret as UTF-8, replacing invalid sequences with
    /// U+FFFD.
    pub fn decode_utf8_lossy(self) -> Cow<'a, str> {
        let bytes: Vec<u8> = self.collect();
        match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(_) => {
                // Safety net: from_utf8_lossy borrowed means `bytes` was
                // valid UTF-8, but it's a fresh Vec so we must still own
                // the result.
                Cow::Owned(String::from_utf8(bytes).unwrap())
            }
            Cow::Owned(s) => Cow::Owned(s),
        }
    }
}

/// Percent-decode `input`.
pub fn percent_decode(input: &[u8]) -> PercentDecode<'_> {
    PercentDecode {
        inner: decode_elements(input, None),
    }
}

/// Percent-decode `input`, after reversing `substitution` (substitute ->
/// literal) on non-escaped bytes. Used for form-encoded values, where a
/// `+` must decode back to a space.
pub fn percent_decode_with_substitution(
    input: &[u8],
    substitution: Substitution,
) -> PercentDecode<'_> {
    PercentDecode {
        inner: decode_elements(input, Some(substitution)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_identity() {
        for set in [
            &CONTROLS,
            &FRAGMENT,
            &QUERY,
            &SPECIAL_QUERY,
            &PATH,
            &USERINFO,
            &COMPONENT,
        ] {
            for input in [
                b"".as_slice(),
                b"hello world",
                b"/a/b/../c?d=e#f",
                &[0u8, 1, 2, 0x7f, 0x80, 0xff],
                b"%25%20%",
            ] {
                let encoded: Vec<u8> = percent_encode(input, set).to_string().into_bytes();
                let decoded: Vec<u8> = percent_decode(&encoded).collect();
                assert_eq!(decoded, input, "set={:?} input={:?}", set.debug_name(), input);
            }
        }
    }

    #[test]
    fn form_substitution_round_trips_space() {
        let encoded: String =
            percent_encode_with_substitution(b"a b+c", &COMPONENT, Substitution::FORM)
                .to_string();
        assert_eq!(encoded, "a+b%2Bc");
        let decoded: Vec<u8> =
            percent_decode_with_substitution(encoded.as_bytes(), Substitution::FORM).collect();
        assert_eq!(decoded, b"a b+c");
    }

    #[test]
    fn decode_elements_flags_escaped_bytes() {
        let elements: Vec<DecodedByte> = decode_elements(b"a%2fb", None).collect();
        assert_eq!(elements[0], DecodedByte { value: b'a', was_percent_decoded: false });
        assert_eq!(elements[1], DecodedByte { value: b'/', was_percent_decoded: true });
        assert_eq!(elements[2], DecodedByte { value: b'b', was_percent_decoded: false });
    }

    #[test]
    fn non_ascii_bytes_are_always_escaped() {
        let encoded = percent_encode(&[0xC3, 0xA9], &CONTROLS).to_string();
        assert_eq!(encoded, "%C3%A9");
    }

    #[test]
    fn invalid_escape_passes_through() {
        let decoded: Vec<u8> = percent_decode(b"100%sure").collect();
        assert_eq!(decoded, b"100%sure");
    }

    #[test]
    fn hex_digits_are_upper_case() {
        let encoded = percent_encode(b"\xff", &CONTROLS).to_string();
        assert_eq!(encoded, "%FF");
    }
}
