//! Geo-location subsystem devices: orientation, position and vibration.

pub mod angle;
pub mod gps;
pub mod nmea;
pub mod vibration;

pub use angle::AngleSensor;
pub use gps::GpsSensor;
pub use vibration::VibrationSensor;

use std::time::Duration;

/// How long a geo device waits for its hardware before giving up on a cycle.
pub const SAMPLE_TIMEOUT: Duration = Duration::from_secs(4);
