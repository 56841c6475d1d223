//! Declarative tool and resource catalogs.
//!
//! Tools and resources are described by static data tables; the JSON
//! schemas served by `tools/list` and the argument validation performed
//! by `tools/call` are both derived from the same [`ParamSpec`] entries,
//! so a tool cannot advertise one contract and enforce another.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde_json::{Map, Value, json};

// ============================================================================
// ParamSpec
// ============================================================================

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// JSON boolean.
    Boolean,
    /// JSON number.
    Number,
}

impl ParamType {
    /// Returns the JSON-schema type string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
        }
    }
}

/// One declared tool parameter with its constraints.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Argument key.
    pub name: &'static str,
    /// JSON type.
    pub param_type: ParamType,
    /// Human-readable description served in the schema.
    pub description: &'static str,
    /// Whether the argument must be present.
    pub required: bool,
    /// Inclusive lower bound for numbers.
    pub min: Option<f64>,
    /// Inclusive upper bound for numbers.
    pub max: Option<f64>,
}

impl ParamSpec {
    /// Declares a required boolean parameter.
    #[must_use]
    pub const fn boolean(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            param_type: ParamType::Boolean,
            description,
            required: true,
            min: None,
            max: None,
        }
    }

    /// Declares a required number parameter with an inclusive range.
    #[must_use]
    pub const fn number(
        name: &'static str,
        description: &'static str,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Number,
            description,
            required: true,
            min: Some(min),
            max: Some(max),
        }
    }

    /// Declares a required number parameter with only a lower bound.
    #[must_use]
    pub const fn number_min(name: &'static str, description: &'static str, min: f64) -> Self {
        Self {
            name,
            param_type: ParamType::Number,
            description,
            required: true,
            min: Some(min),
            max: None,
        }
    }
}

// ============================================================================
// ToolSpec
// ============================================================================

/// Dispatch target of a tool, matched exhaustively by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Read the current temperature.
    GetTemperature,
    /// Read the current humidity.
    GetHumidity,
    /// Switch the light on or off.
    LightPower,
    /// Set light brightness.
    LightBrightness,
    /// Set light RGB color.
    LightColor,
    /// Switch the fan on or off.
    FanPower,
    /// Set fan speed level.
    FanSpeed,
    /// Set or clear the fan timer.
    FanTimer,
}

/// One entry of the static tool catalog.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Dispatch target.
    pub kind: ToolKind,
    /// Wire name.
    pub name: &'static str,
    /// Description served by `tools/list`.
    pub description: &'static str,
    /// Declared parameters.
    pub params: &'static [ParamSpec],
}

/// The built-in tool catalog, fixed at startup.
pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        kind: ToolKind::GetTemperature,
        name: "get_temperature",
        description: "Get current temperature reading",
        params: &[],
    },
    ToolSpec {
        kind: ToolKind::GetHumidity,
        name: "get_humidity",
        description: "Get current humidity reading",
        params: &[],
    },
    ToolSpec {
        kind: ToolKind::LightPower,
        name: "light_power_control",
        description: "Control light power on/off",
        params: &[ParamSpec::boolean("enabled", "Enable or disable light")],
    },
    ToolSpec {
        kind: ToolKind::LightBrightness,
        name: "light_brightness_control",
        description: "Set light brightness level",
        params: &[ParamSpec::number(
            "brightness",
            "Brightness level 0-100%",
            0.0,
            100.0,
        )],
    },
    ToolSpec {
        kind: ToolKind::LightColor,
        name: "light_color_control",
        description: "Set light RGB color",
        params: &[
            ParamSpec::number("red", "Red component 0-255", 0.0, 255.0),
            ParamSpec::number("green", "Green component 0-255", 0.0, 255.0),
            ParamSpec::number("blue", "Blue component 0-255", 0.0, 255.0),
        ],
    },
    ToolSpec {
        kind: ToolKind::FanPower,
        name: "fan_power_control",
        description: "Control fan power on/off",
        params: &[ParamSpec::boolean("enabled", "Enable or disable fan")],
    },
    ToolSpec {
        kind: ToolKind::FanSpeed,
        name: "fan_speed_control",
        description: "Set fan speed level",
        params: &[ParamSpec::number("speed", "Fan speed level 1-5", 1.0, 5.0)],
    },
    ToolSpec {
        kind: ToolKind::FanTimer,
        name: "fan_timer_control",
        description: "Set fan timer in minutes",
        params: &[ParamSpec::number_min(
            "minutes",
            "Timer in minutes (0 to disable timer)",
            0.0,
        )],
    },
];

/// Looks up a tool by wire name.
#[must_use]
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|tool| tool.name == name)
}

impl ToolSpec {
    /// Synthesizes the JSON input schema for this tool.
    ///
    /// The `required` array is omitted entirely when no parameter is
    /// required.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in self.params {
            properties.insert(
                param.name.to_owned(),
                json!({
                    "type": param.param_type.as_str(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::from(param.name));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_owned(), Value::from("object"));
        schema.insert("properties".to_owned(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_owned(), Value::Array(required));
        }
        Value::Object(schema)
    }

    /// Serializes the catalog entry for `tools/list`.
    #[must_use]
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

// ============================================================================
// ResourceSpec
// ============================================================================

/// One entry of the static resource catalog.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    /// Resource URI.
    pub uri: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Description served by `resources/list`.
    pub description: &'static str,
    /// MIME type of the resource content.
    pub mime_type: &'static str,
}

/// URI of the full device status resource.
pub const STATUS_RESOURCE_URI: &str = "device://status";

/// The discoverable resource catalog.
///
/// Only [`STATUS_RESOURCE_URI`] is readable in this snapshot; the other
/// entries are listed for discovery.
pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        uri: STATUS_RESOURCE_URI,
        name: "Device Status",
        description: "Real-time device status including sensors and controls",
        mime_type: "application/json",
    },
    ResourceSpec {
        uri: "device://sensors",
        name: "Environmental Sensors",
        description: "Temperature and humidity sensor readings",
        mime_type: "application/json",
    },
    ResourceSpec {
        uri: "device://controls",
        name: "Device Controls",
        description: "Current state of all controllable devices",
        mime_type: "application/json",
    },
];

impl ResourceSpec {
    /// Serializes the catalog entry for `resources/list`.
    #[must_use]
    pub fn describe(&self) -> Value {
        json!({
            "uri": self.uri,
            "name": self.name,
            "description": self.description,
            "mimeType": self.mime_type,
        })
    }
}

// ============================================================================
// Argument Validation
// ============================================================================

/// Arguments that passed declarative validation for one tool call.
#[derive(Debug, Default)]
pub struct ValidatedArgs {
    values: FxHashMap<&'static str, Value>,
}

impl ValidatedArgs {
    /// Returns a validated boolean argument.
    ///
    /// Defaults to `false` for a name that was never declared.
    #[inline]
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or_default()
    }

    /// Returns a validated numeric argument truncated to an integer.
    ///
    /// Defaults to `0` for a name that was never declared.
    #[inline]
    #[must_use]
    pub fn integer(&self, name: &str) -> i64 {
        self.values
            .get(name)
            .and_then(Value::as_f64)
            .unwrap_or_default() as i64
    }
}

/// Validates `arguments` against a tool's declared parameters.
///
/// Checks presence, JSON type and numeric range, in declaration order.
/// The error string describes the first failure and is suitable for a
/// tool-result content block; it is not a protocol-level error.
pub fn validate_arguments(
    spec: &ToolSpec,
    arguments: Option<&Value>,
) -> std::result::Result<ValidatedArgs, String> {
    let mut validated = ValidatedArgs::default();

    for param in spec.params {
        let value = arguments.and_then(|args| args.get(param.name));

        let Some(value) = value else {
            if param.required {
                return Err(format!("Missing required argument \"{}\"", param.name));
            }
            continue;
        };

        match param.param_type {
            ParamType::Boolean => {
                if !value.is_boolean() {
                    return Err(format!("Argument \"{}\" must be a boolean", param.name));
                }
            }
            ParamType::Number => {
                let Some(number) = value.as_f64() else {
                    return Err(format!("Argument \"{}\" must be a number", param.name));
                };
                match (param.min, param.max) {
                    (Some(min), Some(max)) if number < min || number > max => {
                        return Err(format!(
                            "Invalid {}: {} (range: {}-{})",
                            param.name, number, min, max
                        ));
                    }
                    (Some(min), None) if number < min => {
                        return Err(format!(
                            "Invalid {}: {} (must be >= {})",
                            param.name, number, min
                        ));
                    }
                    _ => {}
                }
            }
        }

        validated.values.insert(param.name, value.clone());
    }

    Ok(validated)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_eight_tools() {
        assert_eq!(TOOLS.len(), 8);
    }

    #[test]
    fn test_find_tool() {
        assert!(find_tool("fan_speed_control").is_some());
        assert!(find_tool("warp_drive_control").is_none());
    }

    #[test]
    fn test_schema_without_params_omits_required() {
        let spec = find_tool("get_temperature").expect("tool");
        let schema = spec.input_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema.get("required").is_none());
        assert!(
            schema["properties"]
                .as_object()
                .expect("properties")
                .is_empty()
        );
    }

    #[test]
    fn test_schema_with_params() {
        let spec = find_tool("light_color_control").expect("tool");
        let schema = spec.input_schema();

        let properties = schema["properties"].as_object().expect("properties");
        assert_eq!(properties.len(), 3);
        assert_eq!(properties["red"]["type"], "number");

        let required = schema["required"].as_array().expect("required");
        assert_eq!(required.len(), 3);
    }

    #[test]
    fn test_describe_tool() {
        let described = find_tool("fan_power_control").expect("tool").describe();
        assert_eq!(described["name"], "fan_power_control");
        assert_eq!(described["description"], "Control fan power on/off");
        assert!(described["inputSchema"].is_object());
    }

    #[test]
    fn test_resource_catalog() {
        assert_eq!(RESOURCES.len(), 3);
        assert_eq!(RESOURCES[0].uri, STATUS_RESOURCE_URI);

        let described = RESOURCES[0].describe();
        assert_eq!(described["mimeType"], "application/json");
    }

    #[test]
    fn test_validate_accepts_in_range() {
        let spec = find_tool("light_brightness_control").expect("tool");
        let args = serde_json::json!({"brightness": 75});
        let validated = validate_arguments(spec, Some(&args)).expect("valid");
        assert_eq!(validated.integer("brightness"), 75);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let spec = find_tool("light_brightness_control").expect("tool");
        let args = serde_json::json!({"brightness": 150});
        let err = validate_arguments(spec, Some(&args)).expect_err("invalid");
        assert_eq!(err, "Invalid brightness: 150 (range: 0-100)");
    }

    #[test]
    fn test_validate_rejects_missing_argument() {
        let spec = find_tool("fan_power_control").expect("tool");
        let err = validate_arguments(spec, None).expect_err("invalid");
        assert_eq!(err, "Missing required argument \"enabled\"");
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let spec = find_tool("fan_power_control").expect("tool");
        let args = serde_json::json!({"enabled": "yes"});
        let err = validate_arguments(spec, Some(&args)).expect_err("invalid");
        assert_eq!(err, "Argument \"enabled\" must be a boolean");
    }

    #[test]
    fn test_validate_lower_bound_only() {
        let spec = find_tool("fan_timer_control").expect("tool");
        let args = serde_json::json!({"minutes": -5});
        let err = validate_arguments(spec, Some(&args)).expect_err("invalid");
        assert_eq!(err, "Invalid minutes: -5 (must be >= 0)");

        let args = serde_json::json!({"minutes": 0});
        assert!(validate_arguments(spec, Some(&args)).is_ok());
    }
}
