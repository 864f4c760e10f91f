//! Servo-driven door lock.

use crate::devices::readings_or_empty;
use crate::error::Result;
use crate::hal::{lock, PulseOutput};
use crate::model::{Actuator, Command, CommandType, DoorState, Reading, ReadingType, ReadingUnit, Sensor};
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Pulse that swings the servo to its open extreme (2.5 ms / 1.5).
pub const OPEN_PULSE: Duration = Duration::from_nanos(1_666_667);
/// Pulse that swings the servo to its closed extreme.
pub const CLOSED_PULSE: Duration = Duration::from_micros(500);

const READING_TYPES: [ReadingType; 1] = [ReadingType::DoorOpened];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Bool];

pub struct DoorLock {
    servo: Mutex<Box<dyn PulseOutput>>,
}

impl DoorLock {
    pub fn new(servo: Box<dyn PulseOutput>) -> Self {
        Self {
            servo: Mutex::new(servo),
        }
    }

    fn requested_state(command: &Command) -> Option<DoorState> {
        if command.command_type() != CommandType::MicroServoMotor {
            return None;
        }
        DoorState::from_value(command.value())
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let opened = lock(&self.servo, "door servo")?.pulse_width() == Some(OPEN_PULSE);
        Ok(vec![Reading::new(opened, ReadingType::DoorOpened, ReadingUnit::Bool)])
    }

    fn drive(&self, state: DoorState) -> Result<()> {
        let pulse = match state {
            DoorState::Open => OPEN_PULSE,
            DoorState::Closed => CLOSED_PULSE,
        };
        lock(&self.servo, "door servo")?.set_pulse_width(pulse)
    }
}

impl Sensor for DoorLock {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("door lock", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}

impl Actuator for DoorLock {
    fn validate_command(&self, command: &Command) -> bool {
        Self::requested_state(command).is_some()
    }

    fn control_actuator(&self, command: &Command) -> bool {
        let Some(state) = Self::requested_state(command) else {
            return false;
        };
        match self.drive(state) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to move door servo to {:?}", state);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::SimServo;
    use crate::model::{CommandUnit, ReadingValue};

    fn door_command(value: bool) -> Command {
        Command::new(CommandType::MicroServoMotor, CommandUnit::Bool, value)
    }

    #[test]
    fn test_true_opens_false_closes() {
        let servo = SimServo::default();
        let door = DoorLock::new(Box::new(servo.clone()));
        assert_eq!(door.read()[0].value(), &ReadingValue::Bool(false));

        assert!(door.control_actuator(&door_command(true)));
        assert_eq!(servo.current_pulse(), Some(OPEN_PULSE));
        assert_eq!(door.read()[0].value(), &ReadingValue::Bool(true));

        assert!(door.control_actuator(&door_command(false)));
        assert_eq!(servo.current_pulse(), Some(CLOSED_PULSE));
        assert_eq!(door.read()[0].value(), &ReadingValue::Bool(false));
    }

    #[test]
    fn test_control_only_succeeds_for_valid_commands() {
        let servo = SimServo::default();
        let door = DoorLock::new(Box::new(servo.clone()));
        let wrong_type = Command::new(CommandType::MagneticDoorSensor, CommandUnit::Bool, true);
        assert!(!door.validate_command(&wrong_type));
        assert!(!door.control_actuator(&wrong_type));
        assert_eq!(servo.current_pulse(), None);
    }
}
