//! Grow light: a WS2813 RGB LED stick switched through its brightness.

use crate::devices::{readings_or_empty, requested_switch_state};
use crate::error::Result;
use crate::hal::{lock, LedStrip, Rgb};
use crate::model::{Actuator, Command, CommandType, Reading, ReadingType, ReadingUnit, Sensor, SwitchState};
use std::sync::Mutex;
use tracing::warn;

pub const ON_BRIGHTNESS: u8 = 255;
pub const OFF_BRIGHTNESS: u8 = 0;

const READING_TYPES: [ReadingType; 1] = [ReadingType::RgbLedStick];
const READING_UNITS: [ReadingUnit; 1] = [ReadingUnit::Bool];

pub struct RgbLedStick {
    strip: Mutex<Box<dyn LedStrip>>,
}

impl RgbLedStick {
    /// Paint every pixel `color`; the strip stays dark until switched on.
    pub fn new(mut strip: Box<dyn LedStrip>, color: Rgb) -> Self {
        strip.fill(color);
        Self {
            strip: Mutex::new(strip),
        }
    }

    fn sample(&self) -> Result<Vec<Reading>> {
        let lit = lock(&self.strip, "led strip")?.brightness() == ON_BRIGHTNESS;
        Ok(vec![Reading::new(lit, ReadingType::RgbLedStick, ReadingUnit::Bool)])
    }

    fn switch(&self, state: SwitchState) -> Result<()> {
        let mut strip = lock(&self.strip, "led strip")?;
        strip.set_brightness(if state.is_on() { ON_BRIGHTNESS } else { OFF_BRIGHTNESS });
        strip.show()
    }
}

impl Sensor for RgbLedStick {
    fn read(&self) -> Vec<Reading> {
        readings_or_empty("rgb led stick", self.sample())
    }

    fn reading_types(&self) -> &[ReadingType] {
        &READING_TYPES
    }

    fn reading_units(&self) -> &[ReadingUnit] {
        &READING_UNITS
    }
}

impl Actuator for RgbLedStick {
    fn validate_command(&self, command: &Command) -> bool {
        requested_switch_state(command, CommandType::RgbLedStick).is_some()
    }

    fn control_actuator(&self, command: &Command) -> bool {
        let Some(state) = requested_switch_state(command, CommandType::RgbLedStick) else {
            return false;
        };
        match self.switch(state) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to switch LED stick {:?}", state);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::SimLedStrip;
    use crate::model::{CommandUnit, ReadingValue};

    fn led_command(value: bool) -> Command {
        Command::new(CommandType::RgbLedStick, CommandUnit::Bool, value)
    }

    #[test]
    fn test_switching_latches_the_strip() {
        let strip = SimLedStrip::new(10);
        let stick = RgbLedStick::new(Box::new(strip.clone()), Rgb::RED);
        assert_eq!(stick.read()[0].value(), &ReadingValue::Bool(false));

        assert!(stick.control_actuator(&led_command(true)));
        assert_eq!(strip.shown(), vec![Rgb::RED; 10]);
        assert_eq!(stick.read()[0].value(), &ReadingValue::Bool(true));

        assert!(stick.control_actuator(&led_command(false)));
        assert_eq!(strip.shown(), vec![Rgb::new(0, 0, 0); 10]);
        assert_eq!(stick.read()[0].value(), &ReadingValue::Bool(false));
    }

    #[test]
    fn test_ignores_fan_commands() {
        let strip = SimLedStrip::new(3);
        let stick = RgbLedStick::new(Box::new(strip.clone()), Rgb::RED);
        let fan = Command::new(CommandType::Fan, CommandUnit::Bool, true);
        assert!(!stick.control_actuator(&fan));
        assert!(strip.shown().is_empty());
    }
}
