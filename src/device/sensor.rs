//! Synthetic environmental sensor.
//!
//! A periodic task feeds the state store with plausible temperature and
//! humidity values: a slow random drift, small per-sample noise and a
//! 24-hour sinusoid on top of fixed base readings. Real sensor hardware
//! would replace this task and call
//! [`DeviceState::update_sensors`](crate::device::DeviceState::update_sensors)
//! the same way.

// ============================================================================
// Imports
// ============================================================================

use std::f32::consts::TAU;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::device::state::DeviceState;

// ============================================================================
// Constants
// ============================================================================

/// Default sampling interval.
pub const DEFAULT_SENSOR_INTERVAL: Duration = Duration::from_secs(2);

/// Base temperature in °C.
const BASE_TEMPERATURE: f32 = 22.0;

/// Base relative humidity in percent.
const BASE_HUMIDITY: f32 = 45.0;

/// Drift bound for temperature, ±°C.
const TEMP_DRIFT_LIMIT: f32 = 5.0;

/// Drift bound for humidity, ±%.
const HUMIDITY_DRIFT_LIMIT: f32 = 15.0;

/// Seconds between drift adjustments.
const DRIFT_ADJUST_PERIOD_SECS: u64 = 10;

/// Amplitude of the daily temperature sinusoid, °C.
const DAILY_SWING: f32 = 3.0;

// ============================================================================
// SensorModel
// ============================================================================

/// State of the synthetic environment.
#[derive(Debug, Default)]
struct SensorModel {
    temp_offset: f32,
    humidity_offset: f32,
    last_adjust_secs: u64,
}

impl SensorModel {
    /// Produces the next (temperature, humidity) pair.
    fn sample(&mut self, elapsed_secs: u64) -> (f32, f32) {
        if elapsed_secs.saturating_sub(self.last_adjust_secs) > DRIFT_ADJUST_PERIOD_SECS {
            self.temp_offset = (self.temp_offset + (rand::random::<f32>() - 0.5) * 0.5)
                .clamp(-TEMP_DRIFT_LIMIT, TEMP_DRIFT_LIMIT);
            self.humidity_offset = (self.humidity_offset + (rand::random::<f32>() - 0.5) * 2.0)
                .clamp(-HUMIDITY_DRIFT_LIMIT, HUMIDITY_DRIFT_LIMIT);
            self.last_adjust_secs = elapsed_secs;
        }

        let temp_noise = (rand::random::<f32>() - 0.5) * 0.2;
        let humidity_noise = (rand::random::<f32>() - 0.5) * 1.0;

        // One full swing per simulated day.
        let daily = (elapsed_secs as f32 / 3600.0 * TAU / 24.0).sin() * DAILY_SWING;

        let temperature = BASE_TEMPERATURE + self.temp_offset + temp_noise + daily;
        let humidity = (BASE_HUMIDITY + self.humidity_offset + humidity_noise).clamp(10.0, 95.0);

        (temperature, humidity)
    }
}

// ============================================================================
// SensorSimulator
// ============================================================================

/// Handle to the running sensor task.
pub struct SensorSimulator {
    handle: JoinHandle<()>,
}

impl SensorSimulator {
    /// Spawns the sampling task writing into `state` every `interval`.
    #[must_use]
    pub fn spawn(state: DeviceState, interval: Duration) -> Self {
        let handle = tokio::spawn(run_simulator(state, interval));
        debug!(interval_ms = interval.as_millis() as u64, "sensor task started");
        Self { handle }
    }

    /// Stops the sampling task.
    pub fn shutdown(&self) {
        self.handle.abort();
        debug!("sensor task stopped");
    }
}

/// The sampling loop.
async fn run_simulator(state: DeviceState, interval: Duration) {
    let started = Instant::now();
    let mut model = SensorModel::default();

    loop {
        let (temperature, humidity) = model.sample(started.elapsed().as_secs());
        if let Err(err) = state.update_sensors(temperature, humidity) {
            warn!(error = %err, "failed to record sensor readings");
        }
        sleep(interval).await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_plausible_bounds() {
        let mut model = SensorModel::default();

        for elapsed in (0u64..86_400).step_by(2) {
            let (temperature, humidity) = model.sample(elapsed);

            // base ± (drift + noise + daily swing)
            assert!(
                (BASE_TEMPERATURE - 8.2..=BASE_TEMPERATURE + 8.2).contains(&temperature),
                "temperature {temperature} out of bounds at {elapsed}s"
            );
            assert!(
                (10.0..=95.0).contains(&humidity),
                "humidity {humidity} out of bounds at {elapsed}s"
            );
        }
    }

    #[test]
    fn test_drift_adjusts_periodically() {
        let mut model = SensorModel::default();
        model.sample(0);
        assert_eq!(model.last_adjust_secs, 0);

        model.sample(DRIFT_ADJUST_PERIOD_SECS + 1);
        assert_eq!(model.last_adjust_secs, DRIFT_ADJUST_PERIOD_SECS + 1);
    }

    #[tokio::test]
    async fn test_simulator_feeds_state() {
        let state = DeviceState::new();
        let simulator = SensorSimulator::spawn(state.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(100)).await;
        simulator.shutdown();

        let status = state.snapshot().expect("snapshot");
        assert!(status.sensors.last_update_ms > 0);
    }
}
