//! Ambient light level inside the container.

use crate::devices::readings_or_empty;
use crate::error::Result;
use crate::hal::{lock, LightMeter};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};
use std::sync::Mutex;

const READING_TYPES: [ReadingType; 1] = [ReadingType::Luminosity];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Lux];

pub struct LuminositySensor {
    meter: Mutex<Box<dyn LightMeter>>,
}

impl LuminositySensor {
    pub fn new(meter: Box<dyn LightMeter>) -> Self {
        Self {
            meter: Mutex::new(meter),
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let lux = lock(&self.meter, "light meter")?.illuminance_lux()?;
        Ok(Reading::number(lux, ReadingType::Luminosity, ReadingUnit::Lux)
            .into_iter()
            .collect())
    }
}

impl Sensor for LuminositySensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("luminosity", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}
