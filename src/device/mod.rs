//! Device-side state, sensing and actuation.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `state` | Shared device status record behind a bounded lock |
//! | `sensor` | Synthetic environmental sensor task |
//! | `actuation` | Injectable sink for validated control commands |

// ============================================================================
// Submodules
// ============================================================================

/// Shared device state store.
pub mod state;

/// Synthetic environmental sensor.
pub mod sensor;

/// Actuation sink seam.
pub mod actuation;

// ============================================================================
// Re-exports
// ============================================================================

pub use actuation::{ActuationSink, ControlCommand, NullSink};
pub use sensor::{DEFAULT_SENSOR_INTERVAL, SensorSimulator};
pub use state::{DeviceState, DeviceStatus, FanStatus, LightStatus, SensorReadings};
