//! Relay endpoint resolution.
//!
//! Parses the configured `ws://` / `wss://` endpoint string into structured
//! connection parameters: scheme, host, port and the path-plus-query that is
//! sent verbatim in the upgrade request. The query commonly carries the
//! relay auth token and is never interpreted here.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | port  | 80 (`ws`) / 443 (`wss`) |
//! | path  | `/mcp/` when the URL carries none |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on the raw endpoint string.
const MAX_URL_LEN: usize = 512;

/// Upper bound on the host segment.
const MAX_HOST_LEN: usize = 255;

/// Path used when the endpoint URL carries none.
const DEFAULT_PATH: &str = "/mcp/";

// ============================================================================
// WsScheme
// ============================================================================

/// WebSocket URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsScheme {
    /// Plain TCP (`ws://`), default port 80.
    Ws,
    /// TLS (`wss://`), default port 443.
    Wss,
}

impl WsScheme {
    /// Returns the default port for this scheme.
    #[inline]
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Ws => 80,
            Self::Wss => 443,
        }
    }

    /// Returns the URL scheme string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }

    /// Returns `true` if the transport is TLS-wrapped.
    #[inline]
    #[must_use]
    pub const fn is_tls(self) -> bool {
        matches!(self, Self::Wss)
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// Parsed relay endpoint, immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL scheme.
    pub scheme: WsScheme,
    /// Host segment (DNS name or IP literal).
    pub host: String,
    /// Resolved port (explicit, or the scheme default).
    pub port: u16,
    /// Path plus verbatim query string, always starting with `/`.
    pub path_and_query: String,
}

impl Endpoint {
    /// Parses an endpoint configuration string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is malformed, uses a scheme
    /// other than `ws`/`wss`, lacks a host, or the input or host exceed
    /// their fixed bounds.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::config("endpoint is empty"));
        }
        if input.len() > MAX_URL_LEN {
            return Err(Error::config(format!(
                "endpoint exceeds {MAX_URL_LEN} bytes"
            )));
        }

        let url = Url::parse(input)
            .map_err(|e| Error::config(format!("malformed endpoint URL: {e}")))?;

        let scheme = match url.scheme() {
            "ws" => WsScheme::Ws,
            "wss" => WsScheme::Wss,
            other => {
                return Err(Error::config(format!(
                    "unsupported scheme \"{other}\" (expected ws or wss)"
                )));
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| Error::config("endpoint has no host"))?
            .to_string();
        if host.len() > MAX_HOST_LEN {
            return Err(Error::config(format!(
                "host exceeds {MAX_HOST_LEN} bytes"
            )));
        }

        let port = url.port().unwrap_or(scheme.default_port());

        // The url crate normalizes a bare authority to path "/"; both that
        // and an empty path count as "none given".
        let path = match url.path() {
            "" | "/" => DEFAULT_PATH,
            p => p,
        };
        let path_and_query = match url.query() {
            Some(q) => format!("{path}?{q}"),
            None => path.to_string(),
        };

        Ok(Self {
            scheme,
            host,
            port,
            path_and_query,
        })
    }

    /// Rebuilds the full URL for the connect attempt.
    #[must_use]
    pub fn request_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme.as_str(),
            self.host,
            self.port,
            self.path_and_query
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}:{}{}",
            self.scheme.as_str(),
            self.host,
            self.port,
            self.path_and_query
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_parse_plain_with_defaults() {
        let ep = Endpoint::parse("ws://relay.example.com").expect("parse");
        assert_eq!(ep.scheme, WsScheme::Ws);
        assert_eq!(ep.host, "relay.example.com");
        assert_eq!(ep.port, 80);
        assert_eq!(ep.path_and_query, "/mcp/");
    }

    #[test]
    fn test_parse_tls_with_defaults() {
        let ep = Endpoint::parse("wss://relay.example.com").expect("parse");
        assert_eq!(ep.scheme, WsScheme::Wss);
        assert_eq!(ep.port, 443);
        assert!(ep.scheme.is_tls());
    }

    #[test]
    fn test_parse_explicit_port_and_path() {
        let ep = Endpoint::parse("ws://10.0.0.5:8080/bridge").expect("parse");
        assert_eq!(ep.port, 8080);
        assert_eq!(ep.path_and_query, "/bridge");
    }

    #[test]
    fn test_query_passed_through_verbatim() {
        let ep = Endpoint::parse("wss://api.example.com/mcp/?token=abc.def-123").expect("parse");
        assert_eq!(ep.path_and_query, "/mcp/?token=abc.def-123");
        assert_eq!(
            ep.request_url(),
            "wss://api.example.com:443/mcp/?token=abc.def-123"
        );
    }

    #[test]
    fn test_rejects_bad_scheme() {
        assert!(Endpoint::parse("http://example.com").is_err());
        assert!(Endpoint::parse("mqtt://example.com").is_err());
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        assert!(Endpoint::parse("").is_err());
        assert!(Endpoint::parse("ws://").is_err());
        assert!(Endpoint::parse("not a url").is_err());
    }

    #[test]
    fn test_rejects_oversized_input() {
        let long = format!("ws://example.com/{}", "a".repeat(600));
        assert!(Endpoint::parse(&long).is_err());
    }

    #[test]
    fn test_rejects_oversized_host() {
        let host = format!("{}.com", "a".repeat(300));
        let err = Endpoint::parse(&format!("ws://{host}/")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let ep = Endpoint::parse("wss://api.example.com:9443/mcp/?token=t").expect("parse");
        let again = Endpoint::parse(&ep.to_string()).expect("reparse");
        assert_eq!(ep, again);
    }

    proptest! {
        #[test]
        fn prop_port_defaults_and_overrides(
            host in "[a-z][a-z0-9]{0,19}",
            port in 1u16..=65535,
        ) {
            let plain = Endpoint::parse(&format!("ws://{host}")).expect("parse");
            prop_assert_eq!(plain.port, 80);

            let tls = Endpoint::parse(&format!("wss://{host}")).expect("parse");
            prop_assert_eq!(tls.port, 443);

            let explicit = Endpoint::parse(&format!("ws://{host}:{port}/")).expect("parse");
            prop_assert_eq!(explicit.port, port);
        }

        #[test]
        fn prop_rejects_unknown_schemes(scheme in "[a-z]{2,8}") {
            prop_assume!(scheme != "ws" && scheme != "wss");
            let url = format!("{}://example.com/", scheme);
            prop_assert!(Endpoint::parse(&url).is_err());
        }
    }
}
