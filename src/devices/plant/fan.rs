//! Ventilation fan on a relay output.

use crate::devices::{readings_or_empty, requested_switch_state};
use crate::error::Result;
use crate::hal::{lock, DigitalOutput};
use crate::model::{Actuator, Command, CommandType, Reading, ReadingType, ReadingUnit, Sensor, SwitchState};
use std::sync::Mutex;
use tracing::warn;

const READING_TYPES: [ReadingType; 1] = [ReadingType::Fan];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Bool];

/// Reports the relay pin level, not the last command.
pub struct Fan {
    relay: Mutex<Box<dyn DigitalOutput>>,
}

impl Fan {
    pub fn new(relay: Box<dyn DigitalOutput>) -> Self {
        Self {
            relay: Mutex::new(relay),
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let running = lock(&self.relay, "fan relay")?.is_set_high()?;
        Ok(vec![Reading::new(running, ReadingType::Fan, ReadingUnit::Bool)])
    }

    fn switch(&self, state: SwitchState) -> Result<()> {
        lock(&self.relay, "fan relay")?.write(state.is_on())
    }
}

impl Sensor for Fan {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("fan", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}

impl Actuator for Fan {
    fn validate_command(&self, command: &Command) -> bool {
        requested_switch_state(command, CommandType::Fan).is_some()
    }

    fn control_actuator(&self, command: &Command) -> bool {
        let Some(state) = requested_switch_state(command, CommandType::Fan) else {
            return false;
        };
        match self.switch(state) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to switch fan {:?}", state);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::SimPin;
    use crate::model::{CommandUnit, ReadingValue};

    fn fan_command(value: bool) -> Command {
        Command::new(CommandType::Fan, CommandUnit::Bool, value)
    }

    #[test]
    fn test_fan_follows_commands() {
        let relay = SimPin::default();
        let fan = Fan::new(Box::new(relay.clone()));
        assert_eq!(fan.read()[0].value(), &ReadingValue::Bool(false));

        assert!(fan.control_actuator(&fan_command(true)));
        assert!(relay.level());
        assert_eq!(fan.read()[0].value(), &ReadingValue::Bool(true));

        assert!(fan.control_actuator(&fan_command(false)));
        assert!(!relay.level());
    }

    #[test]
    fn test_reports_pin_level_not_last_command() {
        let relay = SimPin::default();
        let fan = Fan::new(Box::new(relay.clone()));
        fan.control_actuator(&fan_command(true));

        relay.set_level(false);
        assert_eq!(fan.read()[0].value(), &ReadingValue::Bool(false));
    }

    #[test]
    fn test_rejects_foreign_and_non_switch_commands() {
        let relay = SimPin::default();
        let fan = Fan::new(Box::new(relay.clone()));

        let buzzer = Command::new(CommandType::Buzzer, CommandUnit::Bool, true);
        let numeric = Command::new(CommandType::Fan, CommandUnit::Bool, crate::model::CommandValue::Number(0.5));
        for command in [buzzer, numeric] {
            assert!(!fan.validate_command(&command));
            assert!(!fan.control_actuator(&command));
        }
        assert!(!relay.level());
    }

    #[test]
    fn test_repeated_command_is_idempotent() {
        let relay = SimPin::default();
        let fan = Fan::new(Box::new(relay.clone()));
        fan.control_actuator(&fan_command(true));
        fan.control_actuator(&fan_command(true));
        assert!(relay.level());
    }
}
