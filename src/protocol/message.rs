//! JSON-RPC-shaped message parsing and response envelopes.
//!
//! Inbound payloads are UTF-8 JSON objects carrying a `method`, an
//! optional correlation `id` and optional `params`. A message without an
//! `id` is a notification and must never receive a response; the `id` of
//! a request is echoed verbatim in its response.
//!
//! # Wire format
//!
//! Request:
//! ```json
//! {"jsonrpc":"2.0","id":1,"method":"tools/call","params":{...}}
//! ```
//!
//! Success / error response:
//! ```json
//! {"jsonrpc":"2.0","id":1,"result":{...}}
//! {"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"..."}}
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};

// ============================================================================
// Constants
// ============================================================================

/// MCP protocol revision served by this device.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// The message was not a well-formed request.
pub const CODE_INVALID_REQUEST: i32 = -32600;

/// Unknown method, tool or unsupported capability.
pub const CODE_METHOD_NOT_FOUND: i32 = -32601;

/// Required parameters missing or unusable.
pub const CODE_INVALID_PARAMS: i32 = -32602;

// ============================================================================
// InboundMessage
// ============================================================================

/// One decoded inbound payload, scoped to a single dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// A method call; a response is owed iff `id` is present.
    Call {
        /// Method name.
        method: String,
        /// Correlation id, echoed verbatim in the response.
        id: Option<Value>,
        /// Method parameters.
        params: Option<Value>,
    },
    /// Parsed as JSON but `method` is missing or not a string.
    Malformed {
        /// Correlation id if one was present.
        id: Option<Value>,
    },
}

impl InboundMessage {
    /// Classifies one payload.
    ///
    /// Returns `None` if the payload is not parseable JSON at all; such
    /// messages are dropped without a protocol-level error.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;

        let id = value.get("id").cloned();
        let params = value.get("params").cloned();

        match value.get("method").and_then(Value::as_str) {
            Some(method) => Some(Self::Call {
                method: method.to_owned(),
                id,
                params,
            }),
            None => Some(Self::Malformed { id }),
        }
    }

    /// Returns the correlation id, if any.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        match self {
            Self::Call { id, .. } | Self::Malformed { id } => id.as_ref(),
        }
    }

    /// Returns `true` if this message owes no response.
    #[inline]
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id().is_none()
    }
}

// ============================================================================
// RpcError
// ============================================================================

/// Protocol-level error carried in an error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    /// Numeric code from the JSON-RPC reserved range.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl RpcError {
    /// Creates an invalid-request error (-32600).
    #[inline]
    #[must_use]
    pub fn invalid_request() -> Self {
        Self {
            code: CODE_INVALID_REQUEST,
            message: "Invalid Request".to_owned(),
        }
    }

    /// Creates a not-found / not-supported error (-32601).
    #[inline]
    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self {
            code: CODE_METHOD_NOT_FOUND,
            message: message.into(),
        }
    }

    /// Creates an invalid-params error (-32602).
    #[inline]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: CODE_INVALID_PARAMS,
            message: message.into(),
        }
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// Builds a success envelope echoing the request id.
#[must_use]
pub fn success_envelope(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

/// Builds an error envelope echoing the request id.
#[must_use]
pub fn error_envelope(id: &Value, error: &RpcError) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message,
        },
    })
}

// ============================================================================
// Tests
// ============================================================================
