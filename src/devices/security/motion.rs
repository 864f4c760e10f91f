//! Mini PIR motion sensor.

use crate::devices::readings_or_empty;
use crate::error::Result;
use crate::hal::{lock, MotionLatch};
use crate::model::{Reading, ReadingType, ReadingUnit, Sensor};
use std::sync::Mutex;
use tracing::info;

const READING_TYPES: [ReadingType; 1] = [ReadingType::Motion];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Bool];

/// Reports whether motion was seen since the previous read.
pub struct MotionSensor {
    latch: Mutex<Box<dyn MotionLatch>>,
}

impl MotionSensor {
    pub fn new(latch: Box<dyn MotionLatch>) -> Self {
        Self {
            latch: Mutex::new(latch),
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let detected = lock(&self.latch, "motion latch")?.take_detected();
        if detected {
            info!("Motion detected");
        }
        Ok(vec![Reading::new(detected, ReadingType::Motion, ReadingUnit::Bool)])
    }
}

impl Sensor for MotionSensor {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("motion", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}
