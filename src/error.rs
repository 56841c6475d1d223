//! Error types for the MCP device agent.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use mcp_device_agent::{Result, WsClient};
//!
//! async fn example(client: &WsClient) -> Result<()> {
//!     client.send_text("{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidState`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::HandshakeRejected`] |
//! | Backpressure | [`Error::SendTimeout`] |
//! | Shared state | [`Error::LockTimeout`], [`Error::InvalidArgument`] |
//! | Protocol | [`Error::Protocol`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the endpoint string or client options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Operation attempted in the wrong lifecycle state.
    ///
    /// Returned when e.g. `send` is called on a stopped client.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the state violation.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the outbound connection cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connect attempt exceeded its deadline.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection closed while an operation was in flight.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The relay refused the WebSocket upgrade.
    ///
    /// Anything other than HTTP 101 from the handshake lands here;
    /// 400 and 401 are the common rejections (bad request / bad token).
    #[error("Handshake rejected with HTTP status {status}")]
    HandshakeRejected {
        /// HTTP status returned instead of 101.
        status: u16,
    },

    // ========================================================================
    // Backpressure Errors
    // ========================================================================
    /// Outbound queue stayed full past the enqueue timeout.
    ///
    /// The frame is dropped; the caller decides whether to retry.
    #[error("Send queue full after {timeout_ms}ms")]
    SendTimeout {
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    // ========================================================================
    // Shared State Errors
    // ========================================================================
    /// Device state lock could not be acquired within its bound.
    #[error("State lock timeout after {timeout_ms}ms")]
    LockTimeout {
        /// Milliseconds waited for the lock.
        timeout_ms: u64,
    },

    /// A control value failed range validation.
    ///
    /// Returned by device state mutators; prior state is untouched.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the offending value and accepted range.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected message shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub const fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a handshake rejection error.
    #[inline]
    pub const fn handshake_rejected(status: u16) -> Self {
        Self::HandshakeRejected { status }
    }

    /// Creates a send timeout (backpressure) error.
    #[inline]
    pub const fn send_timeout(timeout_ms: u64) -> Self {
        Self::SendTimeout { timeout_ms }
    }

    /// Creates a lock timeout error.
    #[inline]
    pub const fn lock_timeout(timeout_ms: u64) -> Self {
        Self::LockTimeout { timeout_ms }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::SendTimeout { .. } | Self::LockTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::HandshakeRejected { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry; connection-level failures
    /// are retried by the reconnect loop rather than the caller.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::HandshakeRejected { .. }
                | Self::SendTimeout { .. }
                | Self::LockTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("unsupported scheme");
        assert_eq!(err.to_string(), "Configuration error: unsupported scheme");
    }

    #[test]
    fn test_handshake_rejected_display() {
        let err = Error::handshake_rejected(401);
        assert_eq!(err.to_string(), "Handshake rejected with HTTP status 401");
    }

    #[test]
    fn test_is_timeout() {
        let send_err = Error::send_timeout(1000);
        let lock_err = Error::lock_timeout(1000);
        let other_err = Error::connection("test");

        assert!(send_err.is_timeout());
        assert!(lock_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        let conn_err = Error::connection("test");
        let timeout_err = Error::connection_timeout(1000);
        let closed_err = Error::ConnectionClosed;
        let rejected_err = Error::handshake_rejected(400);
        let other_err = Error::config("test");

        assert!(conn_err.is_connection_error());
        assert!(timeout_err.is_connection_error());
        assert!(closed_err.is_connection_error());
        assert!(rejected_err.is_connection_error());
        assert!(!other_err.is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        let send_err = Error::send_timeout(1000);
        let config_err = Error::config("test");
        let arg_err = Error::invalid_argument("brightness out of range");

        assert!(send_err.is_recoverable());
        assert!(!config_err.is_recoverable());
        assert!(!arg_err.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "no route");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
