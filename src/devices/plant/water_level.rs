//! Reservoir water level probe on the Grove ADC.

use crate::devices::{readings_or_empty, round_to};
use crate::error::Result;
use crate::hal::{lock, AnalogInput, Shared};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};

const RAW_PER_CENTIMETER: f64 = 100.0;
const READING_TYPES: [ReadingType; 1] = [ReadingType::WaterLevel];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Centimeters];

pub struct WaterLevelSensor {
    adc: Shared<dyn AnalogInput>,
    channel: u8,
}

impl WaterLevelSensor {
    pub fn new(adc: Shared<dyn AnalogInput>, channel: u8) -> Self {
        Self { adc, channel }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let raw = lock(&self.adc, "adc")?.read_raw(self.channel)?;
        let centimeters = round_to(raw as f64 / RAW_PER_CENTIMETER, 2);
        Ok(Reading::number(centimeters, ReadingType::WaterLevel, ReadingUnit::Centimeters)
            .into_iter()
            .collect())
    }
}

impl Sensor for WaterLevelSensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("water level", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}
