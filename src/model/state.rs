//! Two-valued actuator states and their command-value mapping.

use crate::model::command::CommandValue;

/// On/off state shared by the fan, LED strip and buzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    /// `true -> On`, `false -> Off`; anything else is not a switch state.
    pub fn from_value(value: &CommandValue) -> Option<Self> {
        value.as_bool().map(Self::from)
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// Door servo state: `true -> Open`, `false -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Closed,
}

impl DoorState {
    pub fn from_value(value: &CommandValue) -> Option<Self> {
        value
            .as_bool()
            .map(|open| if open { Self::Open } else { Self::Closed })
    }
}
