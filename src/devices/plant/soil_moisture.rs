//! Capacitive soil moisture probe on the Grove ADC.

use crate::devices::{readings_or_empty, round_to};
use crate::error::Result;
use crate::hal::{lock, AnalogInput, Shared};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};

/// Full-scale reading of the 10-bit conversion.
const FULL_SCALE: f64 = 1023.0;
const READING_TYPES: [ReadingType; 1] = [ReadingType::SoilMoisture];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Percentage];

pub struct SoilMoistureSensor {
    adc: Shared<dyn AnalogInput>,
    channel: u8,
}

impl SoilMoistureSensor {
    pub fn new(adc: Shared<dyn AnalogInput>, channel: u8) -> Self {
        Self { adc, channel }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let raw = lock(&self.adc, "adc")?.read_raw(self.channel)?;
        let percent = round_to(raw as f64 / FULL_SCALE * 100.0, 2);
        Ok(Reading::number(percent, ReadingType::SoilMoisture, ReadingUnit::Percentage)
            .into_iter()
            .collect())
    }
}

impl Sensor for SoilMoistureSensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("soil moisture", self.sample())
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
    use crate::hal::sim::SimAdc;
    use crate::model::ReadingValue;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_percentage_of_full_scale() {
        let adc = SimAdc::default();
        adc.set_raw(0, 512);
        let sensor = SoilMoistureSensor::new(Arc::new(Mutex::new(adc.clone())), 0);

        let readings = sensor.read();
        assert_eq!(readings[0].value(), &ReadingValue::Number(50.05));
        assert_eq!(readings[0].reading_unit(), ReadingUnit::Percentage);

        adc.set_raw(0, 1023);
        assert_eq!(sensor.read()[0].value(), &ReadingValue::Number(100.0));
    }

    #[test]
    fn test_bus_failure_gives_nothing() {
        let adc = SimAdc::default();
        adc.set_failing(true);
        let sensor = SoilMoistureSensor::new(Arc::new(Mutex::new(adc)), 0);
        assert!(sensor.read().is_empty());
    }
}
