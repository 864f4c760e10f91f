//! Vibration as the mean per-axis change in acceleration between samples.

use super::SAMPLE_TIMEOUT;
use crate::devices::readings_or_empty;
use crate::error::Result;
use crate::hal::{lock, Acceleration, Accelerometer, Shared};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};
use std::sync::Mutex;

const READING_TYPES: [ReadingType; 1] = [ReadingType::Vibration];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::None];

pub struct VibrationSensor {
    accelerometer: Shared<dyn Accelerometer>,
    previous: Mutex<Acceleration>,
}

impl VibrationSensor {
    pub fn new(accelerometer: Shared<dyn Accelerometer>) -> Self {
        Self {
            accelerometer,
            previous: Mutex::new(Acceleration::new(0.0, 0.0, 0.0)),
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let current = lock(&self.accelerometer, "accelerometer")?.read_acceleration(SAMPLE_TIMEOUT)?;
        let mut previous = lock(&self.previous, "vibration baseline")?;

        let mean = ((current.x - previous.x) + (current.y - previous.y) + (current.z - previous.z)) / 3.0;
        *previous = current;

        Ok(Reading::number(mean, ReadingType::Vibration, ReadingUnit::None)
            .into_iter()
            .collect())
    }
}

impl Sensor for VibrationSensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("vibration", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::SimAccelerometer;
    use crate::model::ReadingValue;
    use std::sync::Arc;

    #[test]
    fn test_vibration_tracks_previous_sample() {
        let accelerometer = SimAccelerometer::default();
        let sensor = VibrationSensor::new(Arc::new(Mutex::new(accelerometer.clone())));

        accelerometer.set_sample(Some(Acceleration::new(3.0, 6.0, 9.0)));
        let first = sensor.read();
        assert_eq!(first[0].value(), &ReadingValue::Number(6.0));
        assert_eq!(first[0].reading_unit(), ReadingUnit::None);

        // Same sample again: no change, no vibration.
        let second = sensor.read();
        assert_eq!(second[0].value(), &ReadingValue::Number(0.0));

        accelerometer.set_sample(Some(Acceleration::new(0.0, 6.0, 9.0)));
        assert_eq!(sensor.read()[0].value(), &ReadingValue::Number(-1.0));
    }

    #[test]
    fn test_timeout_keeps_baseline() {
        let accelerometer = SimAccelerometer::default();
        let sensor = VibrationSensor::new(Arc::new(Mutex::new(accelerometer.clone())));
        assert!(sensor.read().is_empty());

        accelerometer.set_sample(Some(Acceleration::new(3.0, 3.0, 3.0)));
        assert_eq!(sensor.read()[0].value(), &ReadingValue::Number(3.0));
    }
}
