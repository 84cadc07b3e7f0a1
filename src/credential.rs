//! Bearer credential resolution
//!
//! A request may carry its upstream token in several places. The
//! sources are tried in a fixed order and the first non-empty one
//! wins; the result is a single optional [`Credential`].

use axum::http::{HeaderMap, header};
use std::fmt;

/// Cookie name checked by [`TokenSource::Cookie`] in the default chain.
pub const TOKEN_COOKIE: &str = "authToken";

/// Acceptance order used by the proxy.
pub const DEFAULT_SOURCES: [TokenSource; 3] = [
    TokenSource::AuthorizationHeader,
    TokenSource::Cookie(TOKEN_COOKIE),
    TokenSource::Session,
];

/// An upstream bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.0
    }

    /// The `Authorization` header value for upstream calls.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A token placed in the request extensions by an outer session layer.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// One place a token may be carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Second word of the `Authorization` header (`Bearer <token>`).
    AuthorizationHeader,
    /// A named cookie.
    Cookie(&'static str),
    /// A [`SessionToken`] request extension.
    Session,
}

impl TokenSource {
    fn extract(self, headers: &HeaderMap, session: Option<&SessionToken>) -> Option<String> {
        let token = match self {
            Self::AuthorizationHeader => headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split_whitespace().nth(1))
                .map(str::to_string),
            Self::Cookie(name) => cookie_value(headers, name),
            Self::Session => session.map(|s| s.0.clone()),
        };
        token.filter(|t| !t.is_empty())
    }
}

/// Resolve the first present token among `sources`.
#[must_use]
pub fn resolve(
    sources: &[TokenSource],
    headers: &HeaderMap,
    session: Option<&SessionToken>,
) -> Option<Credential> {
    sources
        .iter()
        .find_map(|source| source.extract(headers, session))
        .map(Credential)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}
