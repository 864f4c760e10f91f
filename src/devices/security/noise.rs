//! Loudness sensor on the Grove ADC.

use crate::devices::readings_or_empty;
use crate::error::Result;
use crate::hal::{lock, AnalogInput, Shared};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};

const READING_TYPES: [ReadingType; 1] = [ReadingType::Noise];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Decibel];

/// Sound level relative to 1 mV: `20·log10(mV)`, 0 for silence.
pub fn decibels(millivolts: u16) -> f64 {
    if millivolts == 0 {
        0.0
    } else {
        20.0 * (millivolts as f64).log10()
    }
}

pub struct NoiseSensor {
    adc: Shared<dyn AnalogInput>,
    channel: u8,
}

impl NoiseSensor {
    pub fn new(adc: Shared<dyn AnalogInput>, channel: u8) -> Self {
        Self { adc, channel }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let millivolts = lock(&self.adc, "adc")?.read_millivolts(self.channel)?;
        Ok(Reading::number(decibels(millivolts), ReadingType::Noise, ReadingUnit::Decibel)
            .into_iter()
            .collect())
    }
}

impl Sensor for NoiseSensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("noise", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}
