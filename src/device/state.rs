//! Shared device state store.
//!
//! One [`DeviceStatus`] record holds everything the device knows about
//! itself: light, fan and the latest sensor readings. The record sits
//! behind a single mutex with a bounded acquisition timeout; control
//! handlers, the resource reader and the sensor callback all go through
//! [`DeviceState`] and never hold the lock across I/O.
//!
//! Range validation happens at the mutation boundary: a call with an
//! out-of-range value fails without touching prior state.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Bound on acquiring the state lock.
const LOCK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Maximum light brightness, percent.
pub const BRIGHTNESS_MAX: i64 = 100;

/// Maximum value of one RGB channel.
pub const COLOR_CHANNEL_MAX: i64 = 255;

/// Minimum fan speed level.
pub const FAN_SPEED_MIN: i64 = 1;

/// Maximum fan speed level.
pub const FAN_SPEED_MAX: i64 = 5;

// ============================================================================
// Status Records
// ============================================================================

/// Light attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightStatus {
    /// Power state.
    pub enabled: bool,
    /// Brightness percentage, 0–100.
    pub brightness: u8,
    /// Red channel, 0–255.
    pub red: u8,
    /// Green channel, 0–255.
    pub green: u8,
    /// Blue channel, 0–255.
    pub blue: u8,
}

impl Default for LightStatus {
    fn default() -> Self {
        Self {
            enabled: false,
            brightness: 50,
            red: 255,
            green: 255,
            blue: 255,
        }
    }
}

/// Fan attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FanStatus {
    /// Power state.
    pub enabled: bool,
    /// Speed level, 1–5.
    pub speed: u8,
    /// Countdown in minutes; 0 means no timer.
    pub timer_minutes: u32,
    /// Unix-ms timestamp when the timer was armed; 0 when cleared.
    pub timer_started_ms: u64,
}

impl Default for FanStatus {
    fn default() -> Self {
        Self {
            enabled: false,
            speed: 3,
            timer_minutes: 0,
            timer_started_ms: 0,
        }
    }
}

/// Latest environmental readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    /// Temperature in °C.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
    /// Unix-ms timestamp of the last update; 0 before the first one.
    pub last_update_ms: u64,
}

impl Default for SensorReadings {
    fn default() -> Self {
        Self {
            temperature: 22.5,
            humidity: 45.0,
            last_update_ms: 0,
        }
    }
}

/// Full device status record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Light attributes.
    pub light: LightStatus,
    /// Fan attributes.
    pub fan: FanStatus,
    /// Latest sensor readings.
    pub sensors: SensorReadings,
}

// ============================================================================
// DeviceState
// ============================================================================

/// Cloneable handle to the shared device state.
#[derive(Clone, Default)]
pub struct DeviceState {
    inner: Arc<Mutex<DeviceStatus>>,
}

impl DeviceState {
    /// Creates a store with default status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock within the bounded timeout.
    fn lock(&self) -> Result<MutexGuard<'_, DeviceStatus>> {
        self.inner
            .try_lock_for(LOCK_TIMEOUT)
            .ok_or_else(|| Error::lock_timeout(LOCK_TIMEOUT.as_millis() as u64))
    }

    /// Returns a copy of the full status record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the lock cannot be acquired.
    pub fn snapshot(&self) -> Result<DeviceStatus> {
        Ok(*self.lock()?)
    }

    /// Records new sensor readings with the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the lock cannot be acquired.
    pub fn update_sensors(&self, temperature: f32, humidity: f32) -> Result<()> {
        let mut status = self.lock()?;
        status.sensors.temperature = temperature;
        status.sensors.humidity = humidity;
        status.sensors.last_update_ms = now_ms();
        Ok(())
    }

    /// Sets the light power state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the lock cannot be acquired.
    pub fn set_light_power(&self, enabled: bool) -> Result<()> {
        let mut status = self.lock()?;
        status.light.enabled = enabled;
        debug!(enabled, "light power updated");
        Ok(())
    }

    /// Sets the light brightness.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `brightness` is outside 0–100
    /// - [`Error::LockTimeout`] if the lock cannot be acquired
    pub fn set_light_brightness(&self, brightness: i64) -> Result<()> {
        if !(0..=BRIGHTNESS_MAX).contains(&brightness) {
            return Err(Error::invalid_argument(format!(
                "brightness {brightness} outside 0-{BRIGHTNESS_MAX}"
            )));
        }
        let mut status = self.lock()?;
        status.light.brightness = brightness as u8;
        debug!(brightness, "light brightness updated");
        Ok(())
    }

    /// Sets the light color.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if any channel is outside 0–255
    /// - [`Error::LockTimeout`] if the lock cannot be acquired
    pub fn set_light_color(&self, red: i64, green: i64, blue: i64) -> Result<()> {
        for (channel, value) in [("red", red), ("green", green), ("blue", blue)] {
            if !(0..=COLOR_CHANNEL_MAX).contains(&value) {
                return Err(Error::invalid_argument(format!(
                    "{channel} {value} outside 0-{COLOR_CHANNEL_MAX}"
                )));
            }
        }
        let mut status = self.lock()?;
        status.light.red = red as u8;
        status.light.green = green as u8;
        status.light.blue = blue as u8;
        debug!(red, green, blue, "light color updated");
        Ok(())
    }

    /// Sets the fan power state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the lock cannot be acquired.
    pub fn set_fan_power(&self, enabled: bool) -> Result<()> {
        let mut status = self.lock()?;
        status.fan.enabled = enabled;
        debug!(enabled, "fan power updated");
        Ok(())
    }

    /// Sets the fan speed level.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `speed` is outside 1–5
    /// - [`Error::LockTimeout`] if the lock cannot be acquired
    pub fn set_fan_speed(&self, speed: i64) -> Result<()> {
        if !(FAN_SPEED_MIN..=FAN_SPEED_MAX).contains(&speed) {
            return Err(Error::invalid_argument(format!(
                "speed {speed} outside {FAN_SPEED_MIN}-{FAN_SPEED_MAX}"
            )));
        }
        let mut status = self.lock()?;
        status.fan.speed = speed as u8;
        debug!(speed, "fan speed updated");
        Ok(())
    }

    /// Sets or clears the fan timer.
    ///
    /// A positive value arms the timer and records the start timestamp;
    /// zero clears both.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `minutes` is negative
    /// - [`Error::LockTimeout`] if the lock cannot be acquired
    pub fn set_fan_timer(&self, minutes: i64) -> Result<()> {
        if minutes < 0 {
            return Err(Error::invalid_argument(format!(
                "timer {minutes} minutes must be >= 0"
            )));
        }
        let mut status = self.lock()?;
        status.fan.timer_minutes = minutes as u32;
        status.fan.timer_started_ms = if minutes > 0 { now_ms() } else { 0 };
        debug!(minutes, "fan timer updated");
        Ok(())
    }
}

/// Current Unix time in milliseconds.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================
