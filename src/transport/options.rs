//! Connection client configuration.
//!
//! Provides a type-safe interface for configuring the outbound WebSocket
//! client: endpoint, reconnect policy and keep-alive cadence.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use mcp_device_agent::ClientOptions;
//!
//! let options = ClientOptions::new("wss://relay.example.com/mcp/?token=abc")
//!     .with_ping_interval(Duration::from_secs(30))
//!     .with_auto_reconnect(false);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default delay before the first reconnect attempt.
pub(crate) const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default keep-alive ping interval while connected.
pub(crate) const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(20);

/// Delay before the first ping on a fresh connection.
///
/// Shorter than the steady-state interval so a dead connection is
/// detected quickly after the handshake.
pub(crate) const DEFAULT_INITIAL_PING_DELAY: Duration = Duration::from_secs(5);

/// Default bound on one connect attempt.
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// ClientOptions
// ============================================================================

/// Outbound client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Relay endpoint string (`ws://` or `wss://`, query carried verbatim).
    pub endpoint: String,

    /// Reconnect automatically after a connection loss.
    pub auto_reconnect: bool,

    /// Base reconnect delay; doubles after the third consecutive failure.
    pub reconnect_delay: Duration,

    /// Keep-alive ping interval while connected.
    pub ping_interval: Duration,

    /// Delay before the first ping on a fresh connection.
    pub initial_ping_delay: Duration,

    /// Bound on a single connect attempt.
    pub connect_timeout: Duration,
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options for the given endpoint with default policy.
    #[inline]
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auto_reconnect: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            ping_interval: DEFAULT_PING_INTERVAL,
            initial_ping_delay: DEFAULT_INITIAL_PING_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Enables or disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Sets the base reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the keep-alive ping interval.
    #[inline]
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Sets the delay before the first ping on a fresh connection.
    #[inline]
    #[must_use]
    pub fn with_initial_ping_delay(mut self, delay: Duration) -> Self {
        self.initial_ping_delay = delay;
        self
    }

    /// Sets the bound on a single connect attempt.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new("ws://relay.local/mcp/");
        assert!(options.auto_reconnect);
        assert_eq!(options.reconnect_delay, Duration::from_secs(5));
        assert_eq!(options.ping_interval, Duration::from_secs(20));
        assert_eq!(options.initial_ping_delay, Duration::from_secs(5));
        assert_eq!(options.connect_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_builder_overrides() {
        let options = ClientOptions::new("ws://relay.local/")
            .with_auto_reconnect(false)
            .with_reconnect_delay(Duration::from_secs(1))
            .with_ping_interval(Duration::from_secs(45))
            .with_initial_ping_delay(Duration::from_secs(2))
            .with_connect_timeout(Duration::from_secs(5));

        assert!(!options.auto_reconnect);
        assert_eq!(options.reconnect_delay, Duration::from_secs(1));
        assert_eq!(options.ping_interval, Duration::from_secs(45));
        assert_eq!(options.initial_ping_delay, Duration::from_secs(2));
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
    }
}
