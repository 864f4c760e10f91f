//! Reed switch on the container door.

use crate::devices::readings_or_empty;
use crate::error::Result;
use crate::hal::{lock, DigitalInput};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};
use std::sync::Mutex;

const READING_TYPES: [ReadingType; 1] = [ReadingType::DoorLocked];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Bool];

/// The switch closes to ground when the door magnet is in place.
pub struct MagneticDoorSensor {
    contact: Mutex<Box<dyn DigitalInput>>,
}

impl MagneticDoorSensor {
    pub fn new(contact: Box<dyn DigitalInput>) -> Self {
        Self {
            contact: Mutex::new(contact),
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        // Active low behind the pull-up.
        let locked = !lock(&self.contact, "door contact")?.is_high()?;
        Ok(vec![Reading::new(locked, ReadingType::DoorLocked, ReadingUnit::Bool)])
    }
}

impl Sensor for MagneticDoorSensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("magnetic door", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}
