//! Direct methods: named remote calls translated into farm commands.

use crate::error::{FarmError, Result};
use crate::farm::Farm;
use crate::model::{Command, CommandType, CommandUnit, CommandValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The direct methods the agent answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectMethod {
    IsOnline,
    BuzzerOn,
    DoorLock,
    FanOn,
    LedOn,
}

impl DirectMethod {
    pub const ALL: [DirectMethod; 5] = [
        Self::IsOnline,
        Self::BuzzerOn,
        Self::DoorLock,
        Self::FanOn,
        Self::LedOn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsOnline => "is_online",
            Self::BuzzerOn => "buzzer-on",
            Self::DoorLock => "door-lock",
            Self::FanOn => "fan-on",
            Self::LedOn => "led-on",
        }
    }

    /// The actuator family this method drives; `None` for pure queries.
    pub fn command_type(&self) -> Option<CommandType> {
        match self {
            Self::IsOnline => None,
            Self::BuzzerOn => Some(CommandType::Buzzer),
            Self::DoorLock => Some(CommandType::MicroServoMotor),
            Self::FanOn => Some(CommandType::Fan),
            Self::LedOn => Some(CommandType::RgbLedStick),
        }
    }
}

impl fmt::Display for DirectMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectMethod {
    type Err = FarmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| FarmError::invalid_command(format!("unknown method '{}'", s)))
    }
}

/// Status and payload returned to the caller of a direct method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResponse {
    pub status: u16,
    pub payload: Value,
}

impl MethodResponse {
    pub fn ok() -> Self {
        Self {
            status: 200,
            payload: Value::Null,
        }
    }

    pub fn bad_request(details: impl Into<String>) -> Self {
        Self {
            status: 400,
            payload: json!({ "details": details.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Why a method payload could not become a command.
enum PayloadError {
    MissingValue,
    Invalid(String),
}

fn command_value(payload: &Value) -> std::result::Result<CommandValue, PayloadError> {
    let value = match payload {
        Value::Null => return Err(PayloadError::MissingValue),
        Value::Object(fields) => fields.get("value").ok_or(PayloadError::MissingValue)?,
        other => {
            return Err(PayloadError::Invalid(format!(
                "expected an object with a value, got {}",
                other
            )))
        }
    };
    CommandValue::try_from(value).map_err(|e| PayloadError::Invalid(e.to_string()))
}

/// Translate a direct method call into the command it stands for.
///
/// `Ok(None)` for methods that only answer; `Err` carries the 400 response.
pub fn command_for(name: &str, payload: &Value) -> std::result::Result<Option<Command>, MethodResponse> {
    let method: DirectMethod = name
        .parse()
        .map_err(|_| MethodResponse::bad_request("method name unknown"))?;

    let Some(command_type) = method.command_type() else {
        return Ok(None);
    };

    match command_value(payload) {
        Ok(value) => Ok(Some(Command::new(command_type, CommandUnit::Bool, value))),
        Err(PayloadError::MissingValue) => Err(MethodResponse::bad_request("No value was found in the payload")),
        Err(PayloadError::Invalid(cause)) => Err(MethodResponse::bad_request(format!("Invalid payload {}", cause))),
    }
}

/// Answer a direct method against `farm`.
pub fn handle_method(farm: &Farm, name: &str, payload: &Value) -> MethodResponse {
    match command_for(name, payload) {
        Ok(Some(command)) => match farm.dispatch(&command) {
            Ok(()) => {
                info!("{} set to {}", name, command.value());
                MethodResponse::ok()
            }
            Err(e) => {
                warn!(method = name, error = %e, "Direct method failed to apply");
                MethodResponse::bad_request(format!("Invalid payload {}", e))
            }
        },
        Ok(None) => {
            debug!("executed method: {}", name);
            MethodResponse::ok()
        }
        Err(response) => {
            warn!(method = name, payload = %response.payload, "Rejected direct method");
            response
        }
    }
}

/// [`handle_method`] from async code; hardware work runs on the blocking pool.
pub async fn invoke(farm: Arc<Farm>, name: String, payload: Value) -> MethodResponse {
    let result = tokio::task::spawn_blocking(move || handle_method(&farm, &name, &payload)).await;
    result.unwrap_or_else(|e| MethodResponse {
        status: 500,
        payload: json!({ "details": format!("method failed: {}", e) }),
    })
}
