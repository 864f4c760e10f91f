//! Actuator commands.

use crate::error::{FarmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The actuator family a command is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    #[serde(rename = "PIR-Motion-Sensor")]
    PirMotionSensor,
    #[serde(rename = "Magnetic-Door-Sensor")]
    MagneticDoorSensor,
    #[serde(rename = "Micro-Servo-Motor")]
    MicroServoMotor,
    #[serde(rename = "Loudness-Sensor")]
    LoudnessSensor,
    #[serde(rename = "Buzzer")]
    Buzzer,
    #[serde(rename = "Fan")]
    Fan,
    #[serde(rename = "RGB-Led-Stick")]
    RgbLedStick,
}

impl CommandType {
    pub const ALL: [CommandType; 7] = [
        Self::PirMotionSensor,
        Self::MagneticDoorSensor,
        Self::MicroServoMotor,
        Self::LoudnessSensor,
        Self::Buzzer,
        Self::Fan,
        Self::RgbLedStick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PirMotionSensor => "PIR-Motion-Sensor",
            Self::MagneticDoorSensor => "Magnetic-Door-Sensor",
            Self::MicroServoMotor => "Micro-Servo-Motor",
            Self::LoudnessSensor => "Loudness-Sensor",
            Self::Buzzer => "Buzzer",
            Self::Fan => "Fan",
            Self::RgbLedStick => "RGB-Led-Stick",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = FarmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FarmError::parse_error(format!("command type '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandUnit {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "Closed")]
    Closed,
    #[serde(rename = "dB")]
    Decibel,
    #[serde(rename = "Motion-light-on")]
    MotionLightOn,
    #[serde(rename = "Motion-light-off")]
    MotionLightOff,
    #[serde(rename = "Bool")]
    Bool,
}

impl CommandUnit {
    pub const ALL: [CommandUnit; 6] = [
        Self::Open,
        Self::Closed,
        Self::Decibel,
        Self::MotionLightOn,
        Self::MotionLightOff,
        Self::Bool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Decibel => "dB",
            Self::MotionLightOn => "Motion-light-on",
            Self::MotionLightOff => "Motion-light-off",
            Self::Bool => "Bool",
        }
    }
}

impl fmt::Display for CommandUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandUnit {
    type Err = FarmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| FarmError::parse_error(format!("command unit '{}'", s)))
    }
}

/// The target value of a command. Actuators decide which values they accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CommandValue {
    /// Switch reading of the value: booleans, plus the numbers 1 and 0.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Number(value) if *value == 1.0 => Some(true),
            Self::Number(value) if *value == 0.0 => Some(false),
            _ => None,
        }
    }
}

impl From<bool> for CommandValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Number(value) => write!(f, "{}", value),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl TryFrom<&serde_json::Value> for CommandValue {
    type Error = FarmError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(flag) => Ok(Self::Bool(*flag)),
            serde_json::Value::Number(number) => number
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| FarmError::invalid_command(format!("unrepresentable number {}", number))),
            serde_json::Value::String(text) => Ok(Self::Text(text.clone())),
            other => Err(FarmError::invalid_command(format!(
                "unsupported value {}, expected a boolean, number or string",
                other
            ))),
        }
    }
}

/// An immutable instruction to whichever actuators accept its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    command_type: CommandType,
    value: CommandValue,
    unit: CommandUnit,
}

impl Command {
    pub fn new(command_type: CommandType, unit: CommandUnit, value: impl Into<CommandValue>) -> Self {
        Self {
            command_type,
            value: value.into(),
            unit,
        }
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    pub fn unit(&self) -> CommandUnit {
        self.unit
    }

    pub fn value(&self) -> &CommandValue {
        &self.value
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "(Command: {})", json),
            Err(_) => write!(f, "(Command: {} {} {})", self.command_type, self.value, self.unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_record_shape() {
        let command = Command::new(CommandType::MicroServoMotor, CommandUnit::Bool, true);
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value, json!({"type": "Micro-Servo-Motor", "value": true, "unit": "Bool"}));

        let parsed: Command = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(CommandValue::try_from(&json!(false)).unwrap(), CommandValue::Bool(false));
        assert_eq!(CommandValue::try_from(&json!(3)).unwrap(), CommandValue::Number(3.0));
        assert_eq!(CommandValue::try_from(&json!("on")).unwrap(), CommandValue::Text("on".into()));
        assert!(CommandValue::try_from(&json!(null)).is_err());
        assert!(CommandValue::try_from(&json!([true])).is_err());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert_eq!("Fan".parse::<CommandType>().unwrap(), CommandType::Fan);
        assert!("Sprinkler".parse::<CommandType>().is_err());
        assert!(serde_json::from_value::<Command>(json!({"type": "Sprinkler", "value": true, "unit": "Bool"})).is_err());
    }

    #[test]
    fn test_display_includes_json() {
        let command = Command::new(CommandType::Fan, CommandUnit::Bool, false);
        assert_eq!(command.to_string(), r#"(Command: {"type":"Fan","value":false,"unit":"Bool"})"#);
    }
}
