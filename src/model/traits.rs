//! Capability traits for sensors and actuators.
//!
//! A device implements whichever capabilities its hardware supports. Devices
//! that both observe and drive the same physical resource (fan, LED strip,
//! buzzer, door servo) implement both traits over one shared hardware handle,
//! and are then [`Device`]s.
//!
//! All methods take `&self`: devices guard their hardware handle internally so
//! one instance can sit in a subsystem's sensor list and actuator list at the
//! same time, and a read never overlaps a control call on the same device.

use crate::model::command::Command;
use crate::model::reading::{Reading, ReadingType, ReadingUnit};

/// Something that produces readings.
pub trait Sensor: Send + Sync {
    /// Sample the hardware.
    ///
    /// Never fails: a device that cannot produce a valid sample this cycle
    /// returns an empty vector, and a reading whose value is undefined is
    /// left out rather than emitted with a placeholder.
    fn read(&self) -> Vec<Reading>;

    /// Every reading type this sensor can produce.
    fn reading_types(&self) -> &[ReadingType];

    /// Every unit this sensor's readings can carry.
    fn reading_units(&self) -> &[ReadingUnit];
}

/// Something that can be driven by commands.
pub trait Actuator: Send + Sync {
    /// True iff the command targets this actuator's type and carries one of
    /// its accepted states.
    fn validate_command(&self, command: &Command) -> bool;

    /// Apply the command. Returns false without side effects when the command
    /// does not validate or does not map to a known action.
    fn control_actuator(&self, command: &Command) -> bool;
}

/// A unit that is both a sensor and an actuator over one physical resource.
pub trait Device: Sensor + Actuator {}

impl<T: Sensor + Actuator> Device for T {}
