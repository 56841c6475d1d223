//! Outbound WebSocket transport layer.
//!
//! The device is never a listening server; it dials out to the cloud
//! relay and keeps the connection alive indefinitely.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Device (Rust)  │                              │  Cloud Relay    │
//! │                 │         WebSocket            │                 │
//! │  WsClient       │─────────────────────────────►│  wss://host/mcp │
//! │  state machine  │      outbound only           │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `WsClient::new` - Parse and validate the endpoint
//! 2. `WsClient::start` - Spawn the driving task (connect + reconnect)
//! 3. `WsClient::send` - Enqueue frames; lifecycle events arrive on the
//!    channel returned by `new`
//! 4. `WsClient::stop` - Graceful close, bounded wait, abort as last resort
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | Connection state machine and client handle |
//! | `frame` | Outbound frame types and the bounded send queue |
//! | `options` | Client configuration |

// ============================================================================
// Submodules
// ============================================================================

/// Connection state machine and client handle.
pub mod client;

/// Outbound frame types and the bounded send queue.
pub mod frame;

/// Client configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ConnectionState, ConnectionStats, WsClient, WsEvent};
pub use frame::{FrameKind, FrameQueue, OutboundFrame};
pub use options::ClientOptions;
