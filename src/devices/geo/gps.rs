//! GPS position from the NMEA stream on the container's serial port.

use super::nmea::GllSentence;
use super::SAMPLE_TIMEOUT;
use crate::devices::readings_or_empty;
use crate::error::{FarmError, Result};
use crate::hal::{lock, LineReader};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const GLL_PREFIX: &str = "$GNGLL";
const READING_TYPES: [ReadingType; 1] = [ReadingType::GeoLocation];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::None];

pub struct GpsSensor {
    serial: Mutex<Box<dyn LineReader>>,
    timeout: Duration,
}

impl GpsSensor {
    pub fn new(serial: Box<dyn LineReader>) -> Self {
        Self {
            serial: Mutex::new(serial),
            timeout: SAMPLE_TIMEOUT,
        }
    }

    /// Skip sentences until a GLL one arrives, or the deadline passes.
    fn next_gll_line(&self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;
        let mut serial = lock(&self.serial, "gps serial")?;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(FarmError::timeout("GLL sentence"));
            }
            let line = serial.read_line(remaining)?;
            if line.starts_with(GLL_PREFIX) {
                return Ok(line);
            }
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let sentence: GllSentence = self.next_gll_line()?.parse()?;
        Ok(vec![Reading::new(
            sentence.to_map(),
            ReadingType::GeoLocation,
            ReadingUnit::None,
        )])
    }
}

impl Sensor for GpsSensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("gps", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}
