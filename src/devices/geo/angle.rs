//! Container pitch and roll from the accelerometer.

use super::SAMPLE_TIMEOUT;
use crate::devices::readings_or_empty;
use crate::error::Result;
use crate::hal::{lock, Acceleration, Accelerometer, Shared};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};
use std::time::Duration;

const READING_TYPES: [ReadingType; 2] = [ReadingType::Pitch, ReadingType::Roll];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Degrees];

/// Pitch in degrees, `None` when y and z are both zero.
pub fn pitch(sample: &Acceleration) -> Option<f64> {
    tilt(sample.x, sample.y, sample.z)
}

/// Roll in degrees, `None` when x and z are both zero.
pub fn roll(sample: &Acceleration) -> Option<f64> {
    tilt(sample.y, sample.x, sample.z)
}

fn tilt(axis: f64, other: f64, z: f64) -> Option<f64> {
    let denominator = (other * other + z * z).sqrt();
    if denominator == 0.0 {
        return None;
    }
    Some((axis / denominator).atan().to_degrees())
}

pub struct AngleSensor {
    accelerometer: Shared<dyn Accelerometer>,
    timeout: Duration,
}

impl AngleSensor {
    pub fn new(accelerometer: Shared<dyn Accelerometer>) -> Self {
        Self {
            accelerometer,
            timeout: SAMPLE_TIMEOUT,
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let acceleration = lock(&self.accelerometer, "accelerometer")?.read_acceleration(self.timeout)?;

        let pitch = pitch(&acceleration)
            .and_then(|degrees| Reading::number(degrees, ReadingType::Pitch, ReadingUnit::Degrees));
        let roll = roll(&acceleration)
            .and_then(|degrees| Reading::number(degrees, ReadingType::Roll, ReadingUnit::Degrees));

        Ok(pitch.into_iter().chain(roll).collect())
    }
}

impl Sensor for AngleSensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("angle", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}
