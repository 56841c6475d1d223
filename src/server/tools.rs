//! Tool execution handlers.
//!
//! Each handler receives arguments that already passed declarative
//! validation, forwards the typed command to the actuation sink and
//! records the new target state. The returned text rides in the tool
//! result's content block; a state-store failure is reported there as
//! well, never as a protocol error.

// ============================================================================
// Imports
// ============================================================================

use tracing::warn;

use crate::device::actuation::ControlCommand;
use crate::protocol::catalog::{ToolKind, ValidatedArgs};

use super::McpServer;

// ============================================================================
// Execution
// ============================================================================

impl McpServer {
    /// Runs one tool, returning the content text for the result block.
    pub(super) fn execute_tool(&self, kind: ToolKind, args: &ValidatedArgs) -> String {
        match kind {
            ToolKind::GetTemperature => match self.state().snapshot() {
                Ok(status) => {
                    format!("Current temperature: {:.1}°C", status.sensors.temperature)
                }
                Err(err) => {
                    warn!(error = %err, "temperature read failed");
                    "Failed to read temperature".to_owned()
                }
            },

            ToolKind::GetHumidity => match self.state().snapshot() {
                Ok(status) => format!("Current humidity: {:.1}%", status.sensors.humidity),
                Err(err) => {
                    warn!(error = %err, "humidity read failed");
                    "Failed to read humidity".to_owned()
                }
            },

            ToolKind::LightPower => {
                let enabled = args.flag("enabled");
                self.sink().apply(&ControlCommand::LightPower { enabled });
                match self.state().set_light_power(enabled) {
                    Ok(()) => format!(
                        "Light {} successfully",
                        if enabled { "enabled" } else { "disabled" }
                    ),
                    Err(err) => {
                        warn!(error = %err, "light power update failed");
                        "Failed to control light power".to_owned()
                    }
                }
            }

            ToolKind::LightBrightness => {
                let brightness = args.integer("brightness");
                self.sink().apply(&ControlCommand::LightBrightness {
                    brightness: brightness as u8,
                });
                match self.state().set_light_brightness(brightness) {
                    Ok(()) => format!("Light brightness set to {brightness}%"),
                    Err(err) => {
                        warn!(error = %err, "light brightness update failed");
                        "Failed to set light brightness".to_owned()
                    }
                }
            }

            ToolKind::LightColor => {
                let (red, green, blue) = (
                    args.integer("red"),
                    args.integer("green"),
                    args.integer("blue"),
                );
                self.sink().apply(&ControlCommand::LightColor {
                    red: red as u8,
                    green: green as u8,
                    blue: blue as u8,
                });
                match self.state().set_light_color(red, green, blue) {
                    Ok(()) => format!("Light color set to RGB({red}, {green}, {blue})"),
                    Err(err) => {
                        warn!(error = %err, "light color update failed");
                        "Failed to set light color".to_owned()
                    }
                }
            }

            ToolKind::FanPower => {
                let enabled = args.flag("enabled");
                self.sink().apply(&ControlCommand::FanPower { enabled });
                match self.state().set_fan_power(enabled) {
                    Ok(()) => format!(
                        "Fan {} successfully",
                        if enabled { "enabled" } else { "disabled" }
                    ),
                    Err(err) => {
                        warn!(error = %err, "fan power update failed");
                        "Failed to control fan power".to_owned()
                    }
                }
            }

            ToolKind::FanSpeed => {
                let speed = args.integer("speed");
                self.sink()
                    .apply(&ControlCommand::FanSpeed { speed: speed as u8 });
                match self.state().set_fan_speed(speed) {
                    Ok(()) => format!("Fan speed set to level {speed}"),
                    Err(err) => {
                        warn!(error = %err, "fan speed update failed");
                        "Failed to set fan speed".to_owned()
                    }
                }
            }

            ToolKind::FanTimer => {
                let minutes = args.integer("minutes");
                self.sink().apply(&ControlCommand::FanTimer {
                    minutes: minutes as u32,
                });
                match self.state().set_fan_timer(minutes) {
                    Ok(()) if minutes > 0 => format!("Fan timer set to {minutes} minutes"),
                    Ok(()) => "Fan timer disabled".to_owned(),
                    Err(err) => {
                        warn!(error = %err, "fan timer update failed");
                        "Failed to set fan timer".to_owned()
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::device::state::DeviceState;
    use crate::protocol::catalog::{find_tool, validate_arguments};
    use crate::server::McpServer;

    use serde_json::json;

    fn run(server: &McpServer, tool: &str, arguments: serde_json::Value) -> String {
        let spec = find_tool(tool).expect("tool");
        let args = validate_arguments(spec, Some(&arguments)).expect("valid arguments");
        server.execute_tool(spec.kind, &args)
    }

    #[test]
    fn test_light_power_text() {
        let server = McpServer::new(DeviceState::new());
        assert_eq!(
            run(&server, "light_power_control", json!({"enabled": true})),
            "Light enabled successfully"
        );
        assert_eq!(
            run(&server, "light_power_control", json!({"enabled": false})),
            "Light disabled successfully"
        );
    }

    #[test]
    fn test_light_color_text_and_state() {
        let server = McpServer::new(DeviceState::new());
        assert_eq!(
            run(
                &server,
                "light_color_control",
                json!({"red": 255, "green": 128, "blue": 0})
            ),
            "Light color set to RGB(255, 128, 0)"
        );

        let status = server.state().snapshot().expect("snapshot");
        assert_eq!(
            (status.light.red, status.light.green, status.light.blue),
            (255, 128, 0)
        );
    }

    #[test]
    fn test_fan_timer_texts() {
        let server = McpServer::new(DeviceState::new());
        assert_eq!(
            run(&server, "fan_timer_control", json!({"minutes": 45})),
            "Fan timer set to 45 minutes"
        );
        assert_eq!(
            run(&server, "fan_timer_control", json!({"minutes": 0})),
            "Fan timer disabled"
        );
    }

    #[test]
    fn test_sensor_reads_format() {
        let server = McpServer::new(DeviceState::new());
        server.state().update_sensors(23.46, 51.04).expect("update");

        assert_eq!(
            run(&server, "get_temperature", json!({})),
            "Current temperature: 23.5°C"
        );
        assert_eq!(run(&server, "get_humidity", json!({})), "Current humidity: 51.0%");
    }
}
