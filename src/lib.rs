//! MCP device agent - outbound tool/resource server for constrained devices.
//!
//! This library lets a small smart device act as a long-lived outbound
//! WebSocket client to a cloud relay while serving an MCP
//! (JSON-RPC-shaped) tool/resource protocol to the remote orchestrator on
//! the other side of that connection.
//!
//! # Architecture
//!
//! The device dials out; it is never a listening server:
//!
//! - **Connection state machine** ([`WsClient`]): connect, handshake
//!   validation, keep-alive pings, outbound queue draining, inbound frame
//!   decoding, exponential-backoff reconnection
//! - **Protocol dispatcher** ([`McpServer`]): method routing, declarative
//!   argument validation, response envelopes; notifications (no `id`)
//!   never receive a response
//! - **Device state store** ([`DeviceState`]): one shared record behind a
//!   bounded lock, range-validated at the mutation boundary
//!
//! Lifecycle and payload events flow from the state machine to the
//! dispatcher over an mpsc channel; [`DeviceAgent`] wires the pump.
//!
//! # Quick Start
//!
//! ```no_run
//! use mcp_device_agent::{AgentConfig, DeviceAgent, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let agent = DeviceAgent::start(AgentConfig::new(
//!         "wss://relay.example.com/mcp/?token=secret",
//!     ))?;
//!
//!     // The agent reconnects with backoff until shut down.
//!     tokio::signal::ctrl_c().await?;
//!     agent.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | Composition root: [`DeviceAgent`], [`AgentConfig`] |
//! | [`device`] | State store, sensor task, actuation seam |
//! | [`endpoint`] | Relay endpoint resolution |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | MCP message types and declarative catalogs |
//! | [`server`] | Request dispatcher |
//! | [`transport`] | Outbound WebSocket client and frame queue |

// ============================================================================
// Modules
// ============================================================================

/// Device agent composition root.
///
/// Use [`DeviceAgent::start`] to run the full stack.
pub mod agent;

/// Device-side state, sensing and actuation.
pub mod device;

/// Relay endpoint resolution.
pub mod endpoint;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// MCP protocol message types and catalogs.
pub mod protocol;

/// MCP request dispatcher.
pub mod server;

/// Outbound WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Agent types
pub use agent::{AgentConfig, DeviceAgent};

// Device types
pub use device::{
    ActuationSink, ControlCommand, DeviceState, DeviceStatus, FanStatus, LightStatus, NullSink,
    SensorReadings, SensorSimulator,
};

// Endpoint types
pub use endpoint::{Endpoint, WsScheme};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{InboundMessage, PROTOCOL_VERSION, ResourceSpec, RpcError, ToolSpec};

// Server types
pub use server::{McpServer, ServerInfo};

// Transport types
pub use transport::{
    ClientOptions, ConnectionState, ConnectionStats, FrameKind, OutboundFrame, WsClient, WsEvent,
};
