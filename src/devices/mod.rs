//! Concrete sensors and actuators of the farm container, grouped by the
//! subsystem they belong to.
//!
//! Every device owns its hardware handle behind a mutex (or shares a bus
//! handle with its neighbours), so a sample and a command on the same device
//! are serialized. Failed samples are logged here and become an empty
//! reading sequence; nothing above this layer sees a hardware error.

pub mod geo;
pub mod plant;
pub mod security;

pub use geo::{AngleSensor, GpsSensor, VibrationSensor};
pub use plant::{Fan, RgbLedStick, SoilMoistureSensor, TemperatureHumiditySensor, WaterLevelSensor};
pub use security::{Buzzer, DoorLock, LuminositySensor, MagneticDoorSensor, MotionSensor, NoiseSensor};

use crate::error::Result;
use crate::model::{Command, CommandType, Reading, SwitchState};
use tracing::{debug, warn};

/// Turn a sampling attempt into readings, dropping (and logging) failures.
pub(crate) fn readings_or_empty(device: &str, sample: Result<Vec<Reading>>) -> Vec<Reading> {
    match sample {
        Ok(readings) => readings,
        Err(e) if e.is_transient() => {
            debug!(device, error = %e, "No sample this cycle");
            Vec::new()
        }
        Err(e) => {
            warn!(device, error = %e, "Sensor read failed");
            Vec::new()
        }
    }
}

/// The on/off state a command asks of an actuator accepting `accepted`.
pub(crate) fn requested_switch_state(command: &Command, accepted: CommandType) -> Option<SwitchState> {
    if command.command_type() != accepted {
        return None;
    }
    SwitchState::from_value(command.value())
}

/// Round half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
