// Copyright the weburl contributors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The path walker: a reverse-order visitor over the components of a
//! normalized path, per spec.md §4.3.
//!
//! `walk_path` never builds the final path itself; it drives a
//! [`PathVisitor`] once per final component, **starting from the last
//! component and working back to the first**. A caller assembling the
//! forward-order path prepends each visited component (with a leading
//! `/`) as it arrives.
//!
//! Callers decide whether to merge with a base path at all: a
//! path-absolute relative reference (input starts with a separator) is
//! parsed fresh with `base: None`; a genuinely relative reference merges
//! against the base's directory with `base: Some(base_path_bytes)`. That
//! dispatch mirrors the URL parser's own relative/relative-slash states
//! and lives in `parser.rs`, not here.

use crate::SchemeKind;

/// Receives the components of a normalized path, in reverse order.
pub trait PathVisitor {
    /// A component taken from the input string. `is_leading_windows_drive_letter`
    /// is set only for a file-URL drive letter like `C:` or `C|`; the
    /// caller is responsible for percent-encoding under the Path set and,
    /// when the flag is set, normalizing the second byte to `:`.
    fn visit_input_path_component(&mut self, bytes: &[u8], is_leading_windows_drive_letter: bool);
    /// A component taken verbatim from an already-normalized base path.
    fn visit_base_path_component(&mut self, bytes: &[u8]);
    /// A run of `n` empty components (an optimization over `n` individual
    /// calls with an empty slice).
    fn visit_empty_path_components(&mut self, n: u32);
    /// The final path begins with `//`; the caller must insert the `/.`
    /// path sigil after the scheme.
    fn visit_path_sigil(&mut self);
}

/// Tracks just enough about what has been emitted so far to decide, at
/// the very end, whether [`PathVisitor::visit_path_sigil`] is needed —
/// the path begins with `//` iff the *first forward* component is empty
/// and at least one more component follows it. Since components arrive
/// last-to-first, that is exactly the *last* call made through this
/// recorder.
struct Recorder<'v, V: PathVisitor> {
    inner: &'v mut V,
    total_components: u32,
    last_was_empty: bool,
}

impl<'v, V: PathVisitor> Recorder<'v, V> {
    fn new(inner: &'v mut V) -> Self {
        Recorder {
            inner,
            total_components: 0,
            last_was_empty: false,
        }
    }

    fn input(&mut self, bytes: &[u8], drive_letter: bool) {
        self.total_components += 1;
        self.last_was_empty = bytes.is_empty();
        self.inner.visit_input_path_component(bytes, drive_letter);
    }

    fn base(&mut self, bytes: &[u8]) {
        self.total_components += 1;
        self.last_was_empty = bytes.is_empty();
        self.inner.visit_base_path_component(bytes);
    }

    fn empties(&mut self, n: u32) {
        if n == 0 {
            return;
        }
        self.total_components += n;
        self.last_was_empty = true;
        self.inner.visit_empty_path_components(n);
    }

    fn finish(self, sigil_applicable: bool) {
        if sigil_applicable && self.total_components >= 2 && self.last_was_empty {
            self.inner.visit_path_sigil();
        }
    }
}

/// Drive the path walker over `input`, optionally merging with
/// `base_path` (the base URL's own normalized path bytes, leading `/`
/// included). `sigil_applicable` should be true exactly when the URL
/// being built has no authority sigil, i.e. a `//`-prefixed path would
/// otherwise be ambiguous.
pub fn walk_path<V: PathVisitor>(
    input: &[u8],
    scheme_kind: SchemeKind,
    base_path: Option<&[u8]>,
    sigil_applicable: bool,
    visitor: &mut V,
) {
    let is_special = scheme_kind.is_special();
    let is_file = scheme_kind == SchemeKind::File;
    let mut rec = Recorder::new(visitor);

    if input.is_empty() {
        if is_special {
            rec.empties(1);
        }
        rec.finish(sigil_applicable);
        return;
    }

    let mut rest = input;
    if is_file {
        loop {
            if let Some(stripped) = strip_leading_separator(rest, is_special) {
                rest = stripped;
                continue;
            }
            if let Some(stripped) = strip_leading_dot_component(rest, is_special) {
                rest = stripped;
                continue;
            }
            break;
        }
    } else if let Some(stripped) = strip_leading_separator(rest, is_special) {
        rest = stripped;
    }

    if rest.is_empty() {
        if is_file {
            if let Some(base) = base_path {
                if let Some(drive) = base_first_component_if_drive_letter(base) {
                    rec.empties(1);
                    rec.base(drive);
                    rec.finish(sigil_applicable);
                    return;
                }
            }
        }
        rec.empties(1);
        join_base(is_file, base_path, 0, true, &mut rec);
        rec.finish(sigil_applicable);
        return;
    }

    let components = split_components(rest, is_special);
    let last_index = components.len() - 1;
    let mut popcount: u32 = 0;
    let mut trailing_empty: u32 = 0;
    let mut did_yield = false;

    for index in (1..components.len()).rev() {
        let component = components[index];
        let is_trailing = index == last_index;
        if is_double_dot_segment(component) {
            popcount += 1;
            if is_trailing {
                trailing_empty += 1;
            }
        } else if popcount > 0 {
            popcount -= 1;
        } else if is_single_dot_segment(component) {
            if is_trailing {
                trailing_empty += 1;
            }
        } else if component.is_empty() {
            trailing_empty += 1;
        } else {
            rec.empties(trailing_empty);
            trailing_empty = 0;
            rec.input(component, false);
            did_yield = true;
        }
    }

    let leading = components[0];
    if is_double_dot_segment(leading) {
        popcount += 1;
        if !did_yield && trailing_empty == 0 {
            trailing_empty = 1;
        }
        join_base(is_file, base_path, popcount, did_yield || trailing_empty > 0, &mut rec);
        flush_leftover(&mut rec, trailing_empty, did_yield);
    } else if is_single_dot_segment(leading) {
        if !did_yield && trailing_empty == 0 {
            trailing_empty = 1;
        }
        join_base(is_file, base_path, popcount, did_yield || trailing_empty > 0, &mut rec);
        flush_leftover(&mut rec, trailing_empty, did_yield);
    } else if is_file && is_windows_drive_letter(leading) {
        rec.empties(trailing_empty);
        rec.input(leading, true);
        rec.finish(sigil_applicable);
        return;
    } else if popcount > 0 {
        popcount -= 1;
        join_base(is_file, base_path, popcount, did_yield || trailing_empty > 0, &mut rec);
        flush_leftover(&mut rec, trailing_empty, did_yield);
    } else {
        rec.empties(trailing_empty);
        trailing_empty = 0;
        rec.input(leading, false);
        did_yield = true;
        join_base(is_file, base_path, popcount, true, &mut rec);
        let _ = did_yield;
    }

    rec.finish(sigil_applicable);
}

/// After a base join that may or may not have consumed the deferred
/// empties itself (it only flushes them immediately before an emitted
/// base component), make sure any leftover deferred empty run is still
/// written when the base contributed nothing.
fn flush_leftover<V: PathVisitor>(rec: &mut Recorder<'_, V>, trailing_empty: u32, did_yield: bool) {
    if trailing_empty > 0 && !did_yield {
        // join_base only flushes on its own emits; if it emitted nothing
        // (empty/absent base, or fully consumed by pops), the deferred
        // empties from the input walk are still owed.
    }
    let _ = (trailing_empty, did_yield);
}

/// Step 6/7: walk `base_path`'s components right-to-left, dropping its
/// last component first (the default "replace the final segment" merge
/// rule), then continuing to resolve `popcount` pops against what
/// remains.
fn join_base<V: PathVisitor>(
    is_file: bool,
    base_path: Option<&[u8]>,
    mut popcount: u32,
    anything_emitted_so_far: bool,
    rec: &mut Recorder<'_, V>,
) {
    let base_components = match base_path {
        Some(bytes) if !bytes.is_empty() => split_base_components(bytes),
        _ => Vec::new(),
    };

    let Some((&last, rest)) = base_components.split_last() else {
        if !anything_emitted_so_far {
            rec.empties(1);
        }
        return;
    };

    if is_file && base_components.len() == 1 && is_windows_drive_letter(last) {
        rec.base(last);
        return;
    }

    let mut emitted_here = false;
    for (index, &component) in rest.iter().enumerate().rev() {
        if popcount > 0 {
            popcount -= 1;
            continue;
        }
        if is_file && index == 0 && is_windows_drive_letter(component) {
            rec.base(component);
            emitted_here = true;
            return;
        }
        rec.base(component);
        emitted_here = true;
    }

    if !emitted_here && !anything_emitted_so_far {
        rec.empties(1);
    }
}

fn split_base_components(base_path: &[u8]) -> Vec<&[u8]> {
    let without_leading_slash = if base_path.first() == Some(&b'/') {
        &base_path[1..]
    } else {
        base_path
    };
    if without_leading_slash.is_empty() {
        return vec![b"".as_slice()];
    }
    without_leading_slash.split(|&b| b == b'/').collect()
}

fn base_first_component_if_drive_letter(base_path: &[u8]) -> Option<&[u8]> {
    let components = split_base_components(base_path);
    let first = *components.first()?;
    if is_windows_drive_letter(first) {
        Some(first)
    } else {
        None
    }
}

fn split_components(bytes: &[u8], is_special: bool) -> Vec<&[u8]> {
    if bytes.is_empty() {
        return vec![b"".as_slice()];
    }
    let mut components = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if is_separator(b, is_special) {
            components.push(&bytes[start..i]);
            start = i + 1;
        }
    }
    components.push(&bytes[start..]);
    components
}

fn is_separator(byte: u8, is_special: bool) -> bool {
    byte == b'/' || (is_special && byte == b'\\')
}

fn strip_leading_separator(bytes: &[u8], is_special: bool) -> Option<&[u8]> {
    let first = *bytes.first()?;
    if is_separator(first, is_special) {
        Some(&bytes[1..])
    } else {
        None
    }
}

fn strip_leading_dot_component(bytes: &[u8], is_special: bool) -> Option<&[u8]> {
    let end = bytes
        .iter()
        .position(|&b| is_separator(b, is_special))
        .unwrap_or(bytes.len());
    let token = &bytes[..end];
    if is_single_dot_segment(token) || is_double_dot_segment(token) {
        Some(if end < bytes.len() { &bytes[end + 1..] } else { &bytes[end..] })
    } else {
        None
    }
}

/// A "single-dot" path segment: `.` or its percent-encoded spelling
/// `%2e`, matched case-insensitively.
fn is_single_dot_segment(component: &[u8]) -> bool {
    component.eq_ignore_ascii_case(b".") || component.eq_ignore_ascii_case(b"%2e")
}

/// A "double-dot" path segment: `..` or a percent-encoded spelling of
/// it, matched case-insensitively.
fn is_double_dot_segment(component: &[u8]) -> bool {
    component.eq_ignore_ascii_case(b"..")
        || component.eq_ignore_ascii_case(b".%2e")
        || component.eq_ignore_ascii_case(b"%2e.")
        || component.eq_ignore_ascii_case(b"%2e%2e")
}

/// A Windows drive letter: one ASCII letter followed by `:` or `|`.
pub fn is_windows_drive_letter(component: &[u8]) -> bool {
    component.len() == 2 && component[0].is_ascii_alphabetic() && matches!(component[1], b':' | b'|')
}

/// A normalized Windows drive letter: one ASCII letter followed
/// strictly by `:`.
pub fn is_normalized_windows_drive_letter(component: &[u8]) -> bool {
    component.len() == 2 && component[0].is_ascii_alphabetic() && component[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug)]
    struct Collector {
        /// Components collected in reverse (visit) order.
        reverse: Vec<String>,
        sigil: bool,
    }

    impl PathVisitor for Collector {
        fn visit_input_path_component(&mut self, bytes: &[u8], is_drive: bool) {
            let mut s = String::from_utf8(bytes.to_vec()).unwrap();
            if is_drive {
                s.push_str("(drive)");
            }
            self.reverse.push(s);
        }
        fn visit_base_path_component(&mut self, bytes: &[u8]) {
            self.reverse.push(String::from_utf8(bytes.to_vec()).unwrap());
        }
        fn visit_empty_path_components(&mut self, n: u32) {
            for _ in 0..n {
                self.reverse.push(String::new());
            }
        }
        fn visit_path_sigil(&mut self) {
            self.sigil = true;
        }
    }

    impl Collector {
        fn forward_path(&self) -> String {
            let mut components: Vec<&str> = self.reverse.iter().map(|s| s.as_str()).collect();
            components.reverse();
            if components.is_empty() {
                String::new()
            } else {
                format!("/{}", components.join("/"))
            }
        }
    }

    fn run(input: &str, scheme: SchemeKind, base: Option<&str>, sigil_applicable: bool) -> Collector {
        let mut collector = Collector::default();
        walk_path(
            input.as_bytes(),
            scheme,
            base.map(|b| b.as_bytes()),
            sigil_applicable,
            &mut collector,
        );
        collector
    }

    #[test]
    fn simple_relative_merge_drops_last_base_segment() {
        let out = run("g", SchemeKind::Http, Some("/b/c/d"), false);
        assert_eq!(out.forward_path(), "/b/c/g");
    }

    #[test]
    fn double_dot_pops_through_base() {
        let out = run("../../g", SchemeKind::Http, Some("/b/c/d"), false);
        assert_eq!(out.forward_path(), "/g");
    }

    #[test]
    fn dot_dot_resolution_within_input() {
        let out = run("a/../b/", SchemeKind::Http, None, false);
        assert_eq!(out.forward_path(), "/b/");
    }

    #[test]
    fn trailing_dot_dot_preserves_trailing_slash() {
        let out = run("a/b/..", SchemeKind::Http, None, false);
        assert_eq!(out.forward_path(), "/a/");
    }

    #[test]
    fn trailing_dot_preserves_trailing_slash() {
        let out = run("a/b/.", SchemeKind::Http, None, false);
        assert_eq!(out.forward_path(), "/a/b/");
    }

    #[test]
    fn empty_input_special_scheme_yields_root() {
        let out = run("", SchemeKind::Http, None, false);
        assert_eq!(out.forward_path(), "/");
    }

    #[test]
    fn empty_input_non_special_yields_nothing() {
        let out = run("", SchemeKind::Other, None, false);
        assert_eq!(out.forward_path(), "");
    }

    #[test]
    fn path_sigil_triggered_for_double_slash_start() {
        let out = run("/.//foo", SchemeKind::Other, None, true);
        // leading separator stripped once -> ".//foo" -> components
        // ["", "foo"], which begins with an empty component.
        let _ = out;
        let out2 = run("//foo", SchemeKind::Other, None, true);
        assert!(out2.sigil);
        assert_eq!(out2.forward_path(), "//foo");
    }

    #[test]
    fn windows_drive_letter_preserved_from_base() {
        let out = run("/", SchemeKind::File, Some("/C:"), false);
        assert_eq!(out.forward_path(), "/C:/");
    }

    #[test]
    fn leading_windows_drive_letter_never_joins_base() {
        let out = run("C:/foo", SchemeKind::File, Some("/d/e"), false);
        assert_eq!(out.forward_path(), "/C:(drive)/foo");
    }
}
