// Copyright the weburl contributors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parser and serializer for the `application/x-www-form-urlencoded`
//! syntax, as used by HTML forms and, commonly, by a URL's query string.
//!
//! This crate is a consumer of [`weburl`]'s `setQuery`/query-iteration
//! surface, not part of the URL core itself: it knows nothing about
//! scheme specialness, hosts, or paths. It only converts between a flat
//! list of name/value pairs and the percent- and `+`-encoded string that
//! represents them.

use percent_encoding::{percent_decode_with_substitution, percent_encode_with_substitution};
use percent_encoding::{AsciiSet, Substitution};
use std::borrow::{Borrow, Cow};
use std::str;

/// The `application/x-www-form-urlencoded` percent-encode set, shared
/// with [`percent_encoding`].
pub const FORM_URLENCODED_ENCODE_SET: &AsciiSet = &percent_encoding::FORM_URLENCODED;

/// Percent-encode `input` under the form-urlencoded encode set,
/// substituting a literal space for `+`.
pub fn byte_serialize(input: &[u8]) -> ByteSerialize<'_> {
    ByteSerialize {
        inner: percent_encode_with_substitution(
            input,
            FORM_URLENCODED_ENCODE_SET,
            Substitution::FORM,
        ),
    }
}

/// A streaming encoder over the bytes of a single form-urlencoded name or
/// value. Returned by [`byte_serialize`].
pub struct ByteSerialize<'a> {
    inner: percent_encoding::PercentEncode<'a>,
}

impl<'a> Iterator for ByteSerialize<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Cow<'a, str>> {
        self.inner.next()
    }
}

/// Parse a `application/x-www-form-urlencoded` byte string into a lazy,
/// double-ended iterator of (name, value) pairs.
pub fn parse(input: &[u8]) -> Parse<'_> {
    Parse { input }
}

/// The iterator returned by [`parse`].
#[derive(Clone)]
pub struct Parse<'a> {
    input: &'a [u8],
}

fn decode_pair(piece: &[u8]) -> (Cow<'_, str>, Cow<'_, str>) {
    let (name, value) = match piece.iter().position(|&b| b == b'=') {
        Some(position) => (&piece[..position], &piece[position + 1..]),
        None => (piece, &b""[..]),
    };
    (decode_component(name), decode_component(value))
}

fn decode_component(input: &[u8]) -> Cow<'_, str> {
    percent_decode_with_substitution(input, Substitution::FORM).decode_utf8_lossy()
}

impl<'a> Iterator for Parse<'a> {
    type Item = (Cow<'a, str>, Cow<'a, str>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.input.is_empty() {
                return None;
            }
            let (piece, rest) = match self.input.iter().position(|&b| b == b'&') {
                Some(position) => (&self.input[..position], &self.input[position + 1..]),
                None => (self.input, &b""[..]),
            };
            self.input = rest;
            if piece.is_empty() {
                continue;
            }
            return Some(decode_pair(piece));
        }
    }
}

impl<'a> DoubleEndedIterator for Parse<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            if self.input.is_empty() {
                return None;
            }
            let (rest, piece) = match self.input.iter().rposition(|&b| b == b'&') {
                Some(position) => (&self.input[..position], &self.input[position + 1..]),
                None => (&b""[..], self.input),
            };
            self.input = rest;
            if piece.is_empty() {
                continue;
            }
            return Some(decode_pair(piece));
        }
    }
}

/// Something a [`Serializer`] can append encoded pairs to: either a plain
/// `String` or, via the `weburl` crate, a live query string splice.
pub trait Target {
    fn finish(self) -> Self::Finished
    where
        Self: Sized;
    type Finished;

    fn as_mut_string(&mut self) -> &mut String;
}

impl Target for String {
    type Finished = String;
    fn finish(self) -> String {
        self
    }
    fn as_mut_string(&mut self) -> &mut String {
        self
    }
}

impl<'a> Target for &'a mut String {
    type Finished = &'a mut String;
    fn finish(self) -> &'a mut String {
        self
    }
    fn as_mut_string(&mut self) -> &mut String {
        self
    }
}

/// Accumulates `application/x-www-form-urlencoded` name/value pairs into
/// a `Target`, inserting `&` separators as needed.
pub struct Serializer<T: Target> {
    target: T,
    start_position: usize,
}

impl<T: Target> Serializer<T> {
    /// Create a new `Serializer` that appends to the end of `target`.
    pub fn new(mut target: T) -> Self {
        let start_position = target.as_mut_string().len();
        Serializer {
            target,
            start_position,
        }
    }

    fn append_separator_if_needed(&mut self) {
        let target = self.target.as_mut_string();
        if target.len() > self.start_position {
            target.push('&');
        }
    }

    /// Append a single `name=value` pair.
    pub fn append_pair(&mut self, name: &str, value: &str) -> &mut Self {
        self.append_separator_if_needed();
        let target = self.target.as_mut_string();
        for chunk in byte_serialize(name.as_bytes()) {
            target.push_str(&chunk);
        }
        target.push('=');
        for chunk in byte_serialize(value.as_bytes()) {
            target.push_str(&chunk);
        }
        self
    }

    /// Append a bare name with no `=value` part.
    pub fn append_key_only(&mut self, name: &str) -> &mut Self {
        self.append_separator_if_needed();
        let target = self.target.as_mut_string();
        for chunk in byte_serialize(name.as_bytes()) {
            target.push_str(&chunk);
        }
        self
    }

    /// Append every pair from an iterator.
    pub fn extend_pairs<I, K, V>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for pair in iter {
            let (k, v) = pair.borrow();
            self.append_pair(k.as_ref(), v.as_ref());
        }
        self
    }

    /// Remove everything appended since construction, leaving `target` as
    /// it was when this `Serializer` was created.
    pub fn clear(&mut self) -> &mut Self {
        let target = self.target.as_mut_string();
        target.truncate(self.start_position);
        self
    }

    /// Consume the serializer, returning the underlying target.
    pub fn finish(self) -> T::Finished {
        self.target.finish()
    }
}
