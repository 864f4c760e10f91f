//! Data contracts shared by every device: readings, commands and the
//! sensor/actuator capabilities.

pub mod command;
pub mod reading;
pub mod state;
pub mod traits;

// Re-export commonly used items
pub use command::{Command, CommandType, CommandUnit, CommandValue};
pub use reading::{Reading, ReadingType, ReadingUnit, ReadingValue};
pub use state::{DoorState, SwitchState};
pub use traits::{Actuator, Device, Sensor};
