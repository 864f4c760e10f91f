//! Security subsystem devices: intrusion sensing, the door lock and the alarm.

pub mod buzzer;
pub mod door_lock;
pub mod luminosity;
pub mod magnetic_door;
pub mod motion;
pub mod noise;

pub use buzzer::Buzzer;
pub use door_lock::DoorLock;
pub use luminosity::LuminositySensor;
pub use magnetic_door::MagneticDoorSensor;
pub use motion::MotionSensor;
pub use noise::NoiseSensor;
