//! The alarm buzzer.

use crate::devices::{readings_or_empty, requested_switch_state};
use crate::error::Result;
use crate::hal::{lock, DigitalOutput};
use crate::model::{Actuator, Command, CommandType, Reading, ReadingType, ReadingUnit, Sensor, SwitchState};
use std::sync::Mutex;
use tracing::warn;

const READING_TYPES: [ReadingType; 1] = [ReadingType::Buzzer];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Bool];

pub struct Buzzer {
    output: Mutex<Box<dyn DigitalOutput>>,
}

impl Buzzer {
    pub fn new(output: Box<dyn DigitalOutput>) -> Self {
        Self {
            output: Mutex::new(output),
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let sounding = lock(&self.output, "buzzer")?.is_set_high()?;
        Ok(vec![Reading::new(sounding, ReadingType::Buzzer, ReadingUnit::Bool)])
    }

    fn switch(&self, state: SwitchState) -> Result<()> {
        lock(&self.output, "buzzer")?.write(state.is_on())
    }
}

impl Sensor for Buzzer {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("buzzer", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}

impl Actuator for Buzzer {
    fn validate_command(&self, command: &Command) -> bool {
        requested_switch_state(command, CommandType::Buzzer).is_some()
    }

    fn control_actuator(&self, command: &Command) -> bool {
        let Some(state) = requested_switch_state(command, CommandType::Buzzer) else {
            return false;
        };
        self.switch(state)
            .map_err(|e| warn!(error = %e, "Failed to switch buzzer {:?}", state))
            .is_ok()
    }
}
