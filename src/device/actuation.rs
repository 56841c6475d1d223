//! Actuation sink seam.
//!
//! Control handlers record target state in the store and hand the typed
//! command to an [`ActuationSink`]. Driving real hardware (or a command
//! bus) is an integration concern injected by the embedder; the default
//! [`NullSink`] discards commands.

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;

// ============================================================================
// ControlCommand
// ============================================================================

/// One validated control operation, ready for actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Switch the light on or off.
    LightPower {
        /// Target power state.
        enabled: bool,
    },
    /// Set light brightness.
    LightBrightness {
        /// Target brightness, 0–100.
        brightness: u8,
    },
    /// Set light color.
    LightColor {
        /// Red channel.
        red: u8,
        /// Green channel.
        green: u8,
        /// Blue channel.
        blue: u8,
    },
    /// Switch the fan on or off.
    FanPower {
        /// Target power state.
        enabled: bool,
    },
    /// Set fan speed.
    FanSpeed {
        /// Target speed level, 1–5.
        speed: u8,
    },
    /// Arm or clear the fan timer.
    FanTimer {
        /// Countdown in minutes; 0 clears.
        minutes: u32,
    },
}

// ============================================================================
// ActuationSink
// ============================================================================

/// Receiver of validated control commands.
///
/// Implementations must not block; they run on the dispatch path.
pub trait ActuationSink: Send + Sync {
    /// Applies one control command.
    fn apply(&self, command: &ControlCommand);
}

// ============================================================================
// NullSink
// ============================================================================

/// Sink that discards every command.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ActuationSink for NullSink {
    fn apply(&self, command: &ControlCommand) {
        trace!(?command, "no actuation backend, command discarded");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_accepts_all_commands() {
        let sink = NullSink;
        sink.apply(&ControlCommand::LightPower { enabled: true });
        sink.apply(&ControlCommand::LightBrightness { brightness: 70 });
        sink.apply(&ControlCommand::LightColor {
            red: 1,
            green: 2,
            blue: 3,
        });
        sink.apply(&ControlCommand::FanPower { enabled: false });
        sink.apply(&ControlCommand::FanSpeed { speed: 4 });
        sink.apply(&ControlCommand::FanTimer { minutes: 0 });
    }
}
