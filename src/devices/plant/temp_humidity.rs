//! Air temperature and humidity from the AHT20.

use crate::devices::readings_or_empty;
use crate::error::{FarmError, Result};
use crate::hal::{lock, Hygrometer};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};
use std::sync::Mutex;

pub struct TemperatureHumiditySensor {
    hygrometer: Mutex<Box<dyn Hygrometer>>,
    reading_types: Vec<ReadingType>,
    reading_units: Vec<ReadingUnit>,
}

impl TemperatureHumiditySensor {
    /// Report temperature, then humidity.
    pub fn new(hygrometer: Box<dyn Hygrometer>) -> Self {
        Self {
            hygrometer: Mutex::new(hygrometer),
            reading_types: vec![ReadingType::Temperature, ReadingType::Humidity],
            reading_units: vec![ReadingUnit::Celsius, ReadingUnit::Percentage],
        }
    }

    /// Report only `reading_types`, in the given order.
    ///
    /// Fails for any type other than temperature or humidity.
    pub fn with_reading_types(hygrometer: Box<dyn Hygrometer>, reading_types: &[ReadingType]) -> Result<Self> {
        let reading_units = reading_types
            .iter()
            .map(|kind| match kind {
                ReadingType::Temperature => Ok(ReadingUnit::Celsius),
                ReadingType::Humidity => Ok(ReadingUnit::Percentage),
                other => Err(FarmError::config_error(format!(
                    "reading type {} is not supported by the temperature/humidity sensor",
                    other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            hygrometer: Mutex::new(hygrometer),
            reading_types: reading_types.to_vec(),
            reading_units,
        })
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let climate = lock(&self.hygrometer, "hygrometer")?.measure()?;
        Ok(self
            .reading_types
            .iter()
            .zip(&self.reading_units)
            .filter_map(|(&kind, &unit)| {
                let value = if kind == ReadingType::Temperature {
                    climate.celsius
                } else {
                    climate.humidity_percent
                };
                Reading::number(value, kind, unit)
            })
            .collect())
    }
}

impl Sensor for TemperatureHumiditySensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("temperature/humidity", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &self.reading_types
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &self.reading_units
    }
}
