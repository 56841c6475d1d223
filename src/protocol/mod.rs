//! MCP protocol message types and catalogs.
//!
//! The device serves a JSON-RPC-shaped tool/resource protocol to the
//! remote orchestrator. Payloads travel as UTF-8 text frames over the
//! outbound WebSocket connection.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | Request | Relay → Device | Method call, carries an `id` |
//! | Notification | Relay → Device | Method call without `id`, no response |
//! | Response | Device → Relay | `result` or `error`, echoes the `id` |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `catalog` | Declarative tool/resource tables, schema synthesis, validation |
//! | `message` | Inbound classification and response envelopes |

// ============================================================================
// Submodules
// ============================================================================

/// Declarative tool and resource catalogs.
pub mod catalog;

/// Inbound message classification and response envelopes.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalog::{
    ParamSpec, ParamType, RESOURCES, ResourceSpec, STATUS_RESOURCE_URI, TOOLS, ToolKind, ToolSpec,
    ValidatedArgs, find_tool, validate_arguments,
};
pub use message::{
    CODE_INVALID_PARAMS, CODE_INVALID_REQUEST, CODE_METHOD_NOT_FOUND, InboundMessage,
    PROTOCOL_VERSION, RpcError, error_envelope, success_envelope,
};
