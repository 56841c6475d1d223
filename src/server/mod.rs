//! MCP request dispatcher.
//!
//! Routes decoded text payloads to method handlers over a fixed method
//! table, validates parameters, mutates the device state store and
//! produces response envelopes. Runs synchronously on the event pump;
//! every handler is non-blocking and bounded (the only wait is the
//! bounded state lock).
//!
//! Request/notification discrimination: a payload without an `id` still
//! executes (side effects apply) but never produces a response.
//!
//! # Method table
//!
//! | Method | Behavior |
//! |--------|----------|
//! | `initialize` | Version + capabilities + server info |
//! | `ping` | Empty success |
//! | `tools/list`, `tools/call` | Tool catalog and execution |
//! | `resources/list`, `resources/read` | Resource catalog and status read |
//! | `prompts/list` | Empty catalog |
//! | `logging/setLevel`, `resources/subscribe`, `resources/unsubscribe` | Accepted, inert |
//! | `prompts/get`, `completion/complete` | Not supported (-32601) |
//! | anything else | Method not found (-32601) |

// ============================================================================
// Submodules
// ============================================================================

/// Tool execution handlers.
mod tools;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error, trace, warn};

use crate::device::actuation::{ActuationSink, NullSink};
use crate::device::state::DeviceState;
use crate::protocol::catalog::{RESOURCES, STATUS_RESOURCE_URI, TOOLS, find_tool, validate_arguments};
use crate::protocol::message::{
    InboundMessage, PROTOCOL_VERSION, RpcError, error_envelope, success_envelope,
};

// ============================================================================
// ServerInfo
// ============================================================================

/// Identity advertised in the `initialize` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl ServerInfo {
    /// Creates a server identity.
    #[inline]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

// ============================================================================
// McpServer
// ============================================================================

/// Stateless request router over the fixed method table.
///
/// Cheap to clone; holds only handles.
#[derive(Clone)]
pub struct McpServer {
    state: DeviceState,
    sink: Arc<dyn ActuationSink>,
    info: ServerInfo,
}

impl McpServer {
    /// Creates a dispatcher over `state` with no actuation backend.
    #[must_use]
    pub fn new(state: DeviceState) -> Self {
        Self {
            state,
            sink: Arc::new(NullSink),
            info: ServerInfo::default(),
        }
    }

    /// Replaces the actuation sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ActuationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the advertised server identity.
    #[must_use]
    pub fn with_info(mut self, info: ServerInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the state store handle.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Accessor for tool handlers.
    #[inline]
    pub(crate) fn sink(&self) -> &dyn ActuationSink {
        self.sink.as_ref()
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Handles one inbound text payload.
    ///
    /// Returns the serialized response envelope, or `None` when no
    /// response is owed: unparsable payloads, malformed notifications and
    /// well-formed notifications (whose side effects still apply).
    #[must_use]
    pub fn handle_message(&self, text: &str) -> Option<String> {
        let Some(message) = InboundMessage::parse(text) else {
            warn!(len = text.len(), "dropping unparsable payload");
            return None;
        };

        let envelope = match message {
            InboundMessage::Malformed { id: Some(id) } => {
                error_envelope(&id, &RpcError::invalid_request())
            }
            InboundMessage::Malformed { id: None } => {
                debug!("dropping malformed notification");
                return None;
            }
            InboundMessage::Call { method, id, params } => {
                debug!(%method, "processing method");
                let outcome = self.dispatch(&method, params.as_ref());

                let Some(id) = id else {
                    trace!(%method, "notification, response suppressed");
                    return None;
                };
                match outcome {
                    Ok(result) => success_envelope(&id, result),
                    Err(err) => error_envelope(&id, &err),
                }
            }
        };

        match serde_json::to_string(&envelope) {
            Ok(response) => Some(response),
            Err(err) => {
                error!(error = %err, "failed to serialize response");
                None
            }
        }
    }

    /// Routes one method call.
    fn dispatch(&self, method: &str, params: Option<&Value>) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            "prompts/get" => Err(RpcError::method_not_found("Prompts not supported")),
            "logging/setLevel" => Ok(json!({})),
            "completion/complete" => Err(RpcError::method_not_found("Completion not supported")),
            "resources/subscribe" | "resources/unsubscribe" => Ok(json!({})),
            "tools/list" => Ok(Self::list_tools()),
            "tools/call" => self.call_tool(params),
            "resources/list" => Ok(Self::list_resources()),
            "resources/read" => self.read_resource(params),
            _ => Err(RpcError::method_not_found("Method not found")),
        }
    }

    // ------------------------------------------------------------------
    // Method handlers
    // ------------------------------------------------------------------

    /// Builds the `initialize` result.
    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
                "prompts": { "listChanged": false },
                "experimental": {},
            },
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version,
            },
        })
    }

    /// Serializes the tool catalog.
    fn list_tools() -> Value {
        let tools: Vec<Value> = TOOLS.iter().map(|tool| tool.describe()).collect();
        json!({ "tools": tools })
    }

    /// Serializes the resource catalog.
    fn list_resources() -> Value {
        let resources: Vec<Value> = RESOURCES.iter().map(|res| res.describe()).collect();
        json!({ "resources": resources })
    }

    /// Executes `tools/call`.
    ///
    /// Validation failures of the declared argument shape or range are
    /// reported as text content inside a success envelope; only a missing
    /// tool name is a protocol-level error.
    fn call_tool(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let params = params.ok_or_else(|| RpcError::invalid_params("Invalid params"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("Tool name required"))?;
        let spec = find_tool(name).ok_or_else(|| RpcError::method_not_found("Tool not found"))?;

        debug!(tool = name, "calling tool");
        let text = match validate_arguments(spec, params.get("arguments")) {
            Ok(args) => self.execute_tool(spec.kind, &args),
            Err(failure) => {
                warn!(tool = name, %failure, "tool arguments rejected");
                failure
            }
        };

        Ok(json!({
            "content": [{ "type": "text", "text": text }],
        }))
    }

    /// Executes `resources/read`.
    fn read_resource(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let params = params.ok_or_else(|| RpcError::invalid_params("Invalid params"))?;
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("URI required"))?;

        if uri != STATUS_RESOURCE_URI {
            return Err(RpcError::invalid_params("Resource not found"));
        }

        let status = self
            .state
            .snapshot()
            .map_err(|err| RpcError::invalid_params(err.to_string()))?;
        let text = serde_json::to_string(&status)
            .map_err(|err| RpcError::invalid_params(err.to_string()))?;

        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": "application/json",
                "text": text,
            }],
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    use crate::device::actuation::ControlCommand;
    use crate::device::state::DeviceStatus;
    use crate::protocol::message::{CODE_INVALID_PARAMS, CODE_INVALID_REQUEST, CODE_METHOD_NOT_FOUND};

    /// Sink that records every applied command.
    #[derive(Default)]
    struct RecordingSink {
        commands: Mutex<Vec<ControlCommand>>,
    }

    impl ActuationSink for RecordingSink {
        fn apply(&self, command: &ControlCommand) {
            self.commands.lock().push(*command);
        }
    }

    fn server() -> McpServer {
        McpServer::new(DeviceState::new())
    }

    fn respond(server: &McpServer, text: &str) -> Value {
        let response = server.handle_message(text).expect("response");
        serde_json::from_str(&response).expect("valid JSON response")
    }

    // ------------------------------------------------------------------
    // Envelope discipline
    // ------------------------------------------------------------------

    #[test]
    fn test_unparsable_payload_is_dropped() {
        assert!(server().handle_message("{oops").is_none());
        assert!(server().handle_message("").is_none());
    }

    #[test]
    fn test_missing_method_with_id_is_invalid_request() {
        let response = respond(&server(), r#"{"id":4}"#);
        assert_eq!(response["id"], 4);
        assert_eq!(response["error"]["code"], CODE_INVALID_REQUEST);
    }

    #[test]
    fn test_missing_method_without_id_is_dropped() {
        assert!(server().handle_message(r#"{"params":{}}"#).is_none());
    }

    #[test]
    fn test_unknown_method() {
        let response = respond(&server(), r#"{"id":1,"method":"tools/uninstall"}"#);
        assert_eq!(response["error"]["code"], CODE_METHOD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Method not found");
    }

    #[test]
    fn test_response_carries_exactly_result_or_error() {
        let ok = respond(&server(), r#"{"id":1,"method":"ping"}"#);
        assert!(ok.get("result").is_some());
        assert!(ok.get("error").is_none());
        assert_eq!(ok["jsonrpc"], "2.0");

        let err = respond(&server(), r#"{"id":1,"method":"prompts/get"}"#);
        assert!(err.get("result").is_none());
        assert!(err.get("error").is_some());
        assert_eq!(err["jsonrpc"], "2.0");
    }

    // ------------------------------------------------------------------
    // Simple methods
    // ------------------------------------------------------------------

    #[test]
    fn test_initialize() {
        let response = respond(&server(), r#"{"id":1,"method":"initialize"}"#);
        let result = &response["result"];

        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "mcp-device-agent");
        assert!(result["serverInfo"]["version"].is_string());
        assert_eq!(result["capabilities"]["resources"]["subscribe"], false);
    }

    #[test]
    fn test_inert_acknowledgements() {
        for method in [
            "ping",
            "logging/setLevel",
            "resources/subscribe",
            "resources/unsubscribe",
        ] {
            let response = respond(&server(), &format!(r#"{{"id":2,"method":"{method}"}}"#));
            assert_eq!(response["result"], json!({}), "{method}");
        }
    }

    #[test]
    fn test_prompts() {
        let response = respond(&server(), r#"{"id":1,"method":"prompts/list"}"#);
        assert_eq!(response["result"]["prompts"], json!([]));

        let response = respond(&server(), r#"{"id":1,"method":"prompts/get"}"#);
        assert_eq!(response["error"]["code"], CODE_METHOD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Prompts not supported");
    }

    #[test]
    fn test_completion_not_supported() {
        let response = respond(&server(), r#"{"id":1,"method":"completion/complete"}"#);
        assert_eq!(response["error"]["code"], CODE_METHOD_NOT_FOUND);
    }

    // ------------------------------------------------------------------
    // Catalogs
    // ------------------------------------------------------------------

    #[test]
    fn test_tools_list() {
        let response = respond(&server(), r#"{"id":1,"method":"tools/list"}"#);
        let tools = response["result"]["tools"].as_array().expect("tools");
        assert_eq!(tools.len(), 8);

        let get_temp = tools
            .iter()
            .find(|t| t["name"] == "get_temperature")
            .expect("get_temperature");
        assert!(get_temp["inputSchema"].get("required").is_none());

        let brightness = tools
            .iter()
            .find(|t| t["name"] == "light_brightness_control")
            .expect("light_brightness_control");
        assert_eq!(brightness["inputSchema"]["required"], json!(["brightness"]));
    }

    #[test]
    fn test_resources_list() {
        let response = respond(&server(), r#"{"id":1,"method":"resources/list"}"#);
        let resources = response["result"]["resources"].as_array().expect("resources");
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0]["uri"], "device://status");
    }

    // ------------------------------------------------------------------
    // tools/call
    // ------------------------------------------------------------------

    #[test]
    fn test_call_fan_speed_success() {
        let srv = server();
        let response = respond(
            &srv,
            r#"{"id":1,"method":"tools/call","params":{"name":"fan_speed_control","arguments":{"speed":3}}}"#,
        );

        let text = response["result"]["content"][0]["text"].as_str().expect("text");
        assert_eq!(text, "Fan speed set to level 3");
        assert_eq!(srv.state().snapshot().expect("snapshot").fan.speed, 3);
    }

    #[test]
    fn test_call_brightness_out_of_range_keeps_state() {
        let srv = server();
        let before = srv.state().snapshot().expect("snapshot");

        let response = respond(
            &srv,
            r#"{"id":1,"method":"tools/call","params":{"name":"light_brightness_control","arguments":{"brightness":150}}}"#,
        );

        // Validation failure rides in a success envelope.
        assert!(response.get("error").is_none());
        let text = response["result"]["content"][0]["text"].as_str().expect("text");
        assert_eq!(text, "Invalid brightness: 150 (range: 0-100)");
        assert_eq!(srv.state().snapshot().expect("snapshot"), before);
    }

    #[test]
    fn test_call_missing_name_is_invalid_params() {
        let response = respond(
            &server(),
            r#"{"id":1,"method":"tools/call","params":{"arguments":{}}}"#,
        );
        assert_eq!(response["error"]["code"], CODE_INVALID_PARAMS);
        assert_eq!(response["error"]["message"], "Tool name required");
    }

    #[test]
    fn test_call_missing_params_is_invalid_params() {
        let response = respond(&server(), r#"{"id":1,"method":"tools/call"}"#);
        assert_eq!(response["error"]["code"], CODE_INVALID_PARAMS);
    }

    #[test]
    fn test_call_unknown_tool() {
        let response = respond(
            &server(),
            r#"{"id":1,"method":"tools/call","params":{"name":"warp_drive_control"}}"#,
        );
        assert_eq!(response["error"]["code"], CODE_METHOD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Tool not found");
    }

    #[test]
    fn test_call_forwards_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let srv = McpServer::new(DeviceState::new()).with_sink(sink.clone());

        respond(
            &srv,
            r#"{"id":1,"method":"tools/call","params":{"name":"light_power_control","arguments":{"enabled":true}}}"#,
        );

        let commands = sink.commands.lock();
        assert_eq!(commands.as_slice(), &[ControlCommand::LightPower { enabled: true }]);
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    #[test]
    fn test_notification_applies_side_effects_without_response() {
        let srv = server();
        let outcome = srv.handle_message(
            r#"{"method":"tools/call","params":{"name":"fan_speed_control","arguments":{"speed":4}}}"#,
        );

        assert!(outcome.is_none());
        assert_eq!(srv.state().snapshot().expect("snapshot").fan.speed, 4);
    }

    // ------------------------------------------------------------------
    // resources/read
    // ------------------------------------------------------------------

    #[test]
    fn test_read_status_round_trips() {
        let srv = server();
        srv.state().set_light_brightness(33).expect("brightness");

        let response = respond(
            &srv,
            r#"{"id":1,"method":"resources/read","params":{"uri":"device://status"}}"#,
        );

        let content = &response["result"]["contents"][0];
        assert_eq!(content["uri"], "device://status");
        assert_eq!(content["mimeType"], "application/json");

        let text = content["text"].as_str().expect("text");
        let parsed: DeviceStatus = serde_json::from_str(text).expect("parse status");
        assert_eq!(parsed, srv.state().snapshot().expect("snapshot"));
        assert_eq!(parsed.light.brightness, 33);
    }

    #[test]
    fn test_read_unknown_resource() {
        let response = respond(
            &server(),
            r#"{"id":1,"method":"resources/read","params":{"uri":"device://unknown"}}"#,
        );
        assert_eq!(response["error"]["code"], CODE_INVALID_PARAMS);
        assert_eq!(response["error"]["message"], "Resource not found");
    }

    #[test]
    fn test_read_missing_uri() {
        let response = respond(&server(), r#"{"id":1,"method":"resources/read","params":{}}"#);
        assert_eq!(response["error"]["code"], CODE_INVALID_PARAMS);
        assert_eq!(response["error"]["message"], "URI required");
    }
}
