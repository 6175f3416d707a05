// Copyright the weburl contributors.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A thin projection of a [`crate::Url`] onto the scheme/host/port triple
//! the Origin concept actually needs, plus the opaque-origin fallback for
//! URLs that don't have one.

use crate::host::Host;
use crate::{SchemeKind, Url};
use std::sync::atomic::{AtomicUsize, Ordering};

static OPAQUE_ORIGIN_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A unique placeholder for schemes/hosts that don't have a "real"
/// origin (e.g. `data:` URLs, or any opaque-path URL). Each call to
/// [`Origin::new_opaque`] is guaranteed distinct from every other, for
/// the lifetime of the process, matching the Standard's "new opaque
/// origin" creating a fresh unobservable identity each time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpaqueOrigin(usize);

impl OpaqueOrigin {
    fn new() -> OpaqueOrigin {
        OpaqueOrigin(OPAQUE_ORIGIN_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

/// A URL's origin, per the WHATWG URL Standard's origin concept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    Opaque(OpaqueOrigin),
    Tuple(String, Host<String>, Option<u16>),
}

impl Origin {
    pub fn new_opaque() -> Origin {
        Origin::Opaque(OpaqueOrigin::new())
    }

    /// `true` for same-origin comparison purposes: two opaque origins are
    /// never equal even if constructed identically, by design.
    pub fn is_tuple(&self) -> bool {
        matches!(self, Origin::Tuple(..))
    }

    /// The serialization defined by the Standard's "ASCII serialization of
    /// an origin" algorithm. Opaque origins serialize as the literal
    /// string `"null"`.
    pub fn ascii_serialization(&self) -> String {
        match self {
            Origin::Opaque(_) => "null".to_owned(),
            Origin::Tuple(scheme, host, port) => {
                let mut s = String::with_capacity(scheme.len() + 8);
                s.push_str(scheme);
                s.push_str("://");
                s.push_str(&host.to_string());
                if let Some(port) = port {
                    s.push(':');
                    s.push_str(&port.to_string());
                }
                s
            }
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.ascii_serialization())
    }
}

/// Compute `url`'s origin per the Standard: `file` and opaque-path URLs
/// get a fresh opaque origin; `blob:`-like "other" schemes with an
/// embedded URL are out of this crate's scope (no blob URL support), so
/// any non-special scheme is opaque too. `http(s)`/`ws(s)`/`ftp` URLs
/// produce a tuple origin of scheme/host/port.
pub fn url_origin(url: &Url) -> Origin {
    match url.scheme_kind() {
        SchemeKind::Http | SchemeKind::Https | SchemeKind::Ws | SchemeKind::Wss | SchemeKind::Ftp => {
            Origin::Tuple(
                url.scheme().to_owned(),
                url.host().unwrap_or(Host::Empty).to_owned(),
                url.port(),
            )
        }
        SchemeKind::File | SchemeKind::Other => Origin::new_opaque(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_origins_are_pairwise_distinct() {
        assert_ne!(Origin::new_opaque(), Origin::new_opaque());
    }

    #[test]
    fn opaque_origin_serializes_as_null() {
        assert_eq!(Origin::new_opaque().ascii_serialization(), "null");
    }

    #[test]
    fn tuple_origin_serializes_scheme_host_port() {
        let origin = Origin::Tuple("http".to_owned(), Host::Domain("example.com".to_owned()), Some(8080));
        assert_eq!(origin.ascii_serialization(), "http://example.com:8080");
    }

    #[test]
    fn tuple_origin_omits_absent_port() {
        let origin = Origin::Tuple("https".to_owned(), Host::Domain("example.com".to_owned()), None);
        assert_eq!(origin.ascii_serialization(), "https://example.com");
    }
}
