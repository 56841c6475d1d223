//! Device agent composition root.
//!
//! Wires the pieces together: the device state store, the sensor task,
//! the MCP dispatcher and the outbound connection client. A small event
//! pump moves inbound payloads from the connection into the dispatcher
//! and responses back into the outbound queue.
//!
//! ```text
//! relay ──► WsClient ──► WsEvent channel ──► McpServer ──► WsClient ──► relay
//!                                               │
//!                                          DeviceState ◄── SensorSimulator
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mcp_device_agent::{AgentConfig, DeviceAgent};
//!
//! # async fn example() -> mcp_device_agent::Result<()> {
//! let agent = DeviceAgent::start(AgentConfig::new("wss://relay.example.com/mcp/?token=abc"))?;
//! // ... runs until shutdown
//! agent.shutdown().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::device::sensor::{DEFAULT_SENSOR_INTERVAL, SensorSimulator};
use crate::device::state::DeviceState;
use crate::error::Result;
use crate::server::{McpServer, ServerInfo};
use crate::transport::client::{WsClient, WsEvent};
use crate::transport::options::ClientOptions;

// ============================================================================
// AgentConfig
// ============================================================================

/// Configuration of the full device agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Connection client options.
    pub client: ClientOptions,
    /// Identity advertised during `initialize`.
    pub info: ServerInfo,
    /// Sensor sampling interval.
    pub sensor_interval: Duration,
    /// Whether to run the synthetic sensor task.
    pub sensor_enabled: bool,
}

impl AgentConfig {
    /// Creates a configuration for the given relay endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: ClientOptions::new(endpoint),
            info: ServerInfo::default(),
            sensor_interval: DEFAULT_SENSOR_INTERVAL,
            sensor_enabled: true,
        }
    }

    /// Replaces the connection client options.
    #[must_use]
    pub fn with_client_options(mut self, client: ClientOptions) -> Self {
        self.client = client;
        self
    }

    /// Replaces the advertised server identity.
    #[must_use]
    pub fn with_server_info(mut self, info: ServerInfo) -> Self {
        self.info = info;
        self
    }

    /// Sets the sensor sampling interval.
    #[must_use]
    pub fn with_sensor_interval(mut self, interval: Duration) -> Self {
        self.sensor_interval = interval;
        self
    }

    /// Enables or disables the synthetic sensor task.
    #[must_use]
    pub fn with_sensor_enabled(mut self, enabled: bool) -> Self {
        self.sensor_enabled = enabled;
        self
    }
}

// ============================================================================
// DeviceAgent
// ============================================================================

/// A running device agent.
///
/// Owns the connection client, the dispatcher pump and the sensor task;
/// dropping the agent without [`DeviceAgent::shutdown`] leaves the tasks
/// running until the runtime stops.
pub struct DeviceAgent {
    client: Arc<WsClient>,
    state: DeviceState,
    sensor: Option<SensorSimulator>,
    pump: JoinHandle<()>,
}

impl DeviceAgent {
    /// Builds and starts the agent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the endpoint is
    /// rejected.
    pub fn start(config: AgentConfig) -> Result<Self> {
        let state = DeviceState::new();
        let dispatcher = McpServer::new(state.clone()).with_info(config.info);

        let (client, events) = WsClient::new(config.client)?;
        let client = Arc::new(client);
        client.start()?;

        let sensor = config
            .sensor_enabled
            .then(|| SensorSimulator::spawn(state.clone(), config.sensor_interval));

        let pump = tokio::spawn(run_event_pump(Arc::clone(&client), dispatcher, events));
        info!("device agent started");

        Ok(Self {
            client,
            state,
            sensor,
            pump,
        })
    }

    /// Returns the device state handle.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Returns the connection client handle.
    #[inline]
    #[must_use]
    pub fn client(&self) -> &WsClient {
        &self.client
    }

    /// Returns `true` if the relay connection is live.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Stops sensor, connection and pump.
    pub async fn shutdown(&self) {
        if let Some(sensor) = &self.sensor {
            sensor.shutdown();
        }
        self.client.stop().await;
        self.pump.abort();
        info!("device agent stopped");
    }
}

// ============================================================================
// Event Pump
// ============================================================================

/// Moves connection events into the dispatcher and responses back out.
async fn run_event_pump(
    client: Arc<WsClient>,
    dispatcher: McpServer,
    mut events: mpsc::UnboundedReceiver<WsEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            WsEvent::Connected => {
                info!("connected to relay, serving MCP requests");
            }
            WsEvent::Disconnected => {
                info!("disconnected from relay");
            }
            WsEvent::MessageReceived(text) => {
                if let Some(response) = dispatcher.handle_message(&text)
                    && let Err(err) = client.send_text(response).await
                {
                    warn!(error = %err, "failed to enqueue response");
                }
            }
            WsEvent::MessageSent(_) => {}
            WsEvent::Error(message) => {
                error!(%message, "connection error");
            }
        }
    }
    debug!("event pump ended");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, StreamExt};
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;

    fn test_config(url: &str) -> AgentConfig {
        AgentConfig::new(url)
            .with_client_options(
                ClientOptions::new(url)
                    .with_auto_reconnect(false)
                    .with_connect_timeout(Duration::from_secs(2)),
            )
            .with_sensor_enabled(false)
    }

    async fn next_text(
        ws: &mut tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    ) -> String {
        loop {
            match timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("read in time")
                .expect("frame")
                .expect("no error")
            {
                Message::Text(text) => return text.as_str().to_owned(),
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_agent_serves_requests_end_to_end() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let url = format!("ws://127.0.0.1:{port}/mcp/?token=test");

        let agent = DeviceAgent::start(test_config(&url)).expect("start");

        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");

        // initialize
        ws.send(Message::Text(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#.into(),
        ))
        .await
        .expect("send");
        let response = next_text(&mut ws).await;
        assert!(response.contains("\"protocolVersion\":\"2024-11-05\""));
        assert!(response.contains("\"serverInfo\""));

        // tools/call mutating device state
        ws.send(Message::Text(
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"fan_speed_control","arguments":{"speed":3}}}"#.into(),
        ))
        .await
        .expect("send");
        let response = next_text(&mut ws).await;
        assert!(response.contains("Fan speed set to level 3"));
        assert_eq!(agent.state().snapshot().expect("snapshot").fan.speed, 3);

        // notification: applied silently
        ws.send(Message::Text(
            r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"light_power_control","arguments":{"enabled":true}}}"#.into(),
        ))
        .await
        .expect("send");

        // A follow-up request proves the notification produced no frame:
        // the next text received must answer the ping, not the call.
        ws.send(Message::Text(r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#.into()))
            .await
            .expect("send");
        let response = next_text(&mut ws).await;
        assert!(response.contains("\"id\":3"));
        assert!(agent.state().snapshot().expect("snapshot").light.enabled);

        agent.shutdown().await;
    }

    #[tokio::test]
    async fn test_agent_rejects_bad_endpoint() {
        assert!(DeviceAgent::start(test_config("http://not-ws")).is_err());
    }

    #[tokio::test]
    async fn test_sensor_feeds_agent_state() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let url = format!("ws://127.0.0.1:{port}/mcp/");

        let config = test_config(&url)
            .with_sensor_enabled(true)
            .with_sensor_interval(Duration::from_millis(10));
        let agent = DeviceAgent::start(config).expect("start");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(agent.state().snapshot().expect("snapshot").sensors.last_update_ms > 0);

        agent.shutdown().await;
    }
}
