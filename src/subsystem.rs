//! Subsystems: fixed bundles of sensors and actuators grouped by area of the
//! container.
//!
//! A subsystem reads its sensors in wiring order and offers every command to
//! every actuator it owns; actuators filter for themselves through
//! [`Actuator::validate_command`].

use crate::devices::{
    AngleSensor, Buzzer, DoorLock, Fan, GpsSensor, LuminositySensor, MagneticDoorSensor, MotionSensor,
    NoiseSensor, RgbLedStick, SoilMoistureSensor, TemperatureHumiditySensor, VibrationSensor,
    WaterLevelSensor,
};
use crate::error::{FarmError, Result};
use crate::hal::{GeoHardware, HardwareSet, PlantHardware, Rgb, SecurityHardware, Wiring};
use crate::model::{Actuator, Command, Device, Reading, Sensor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which area of the container a subsystem covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubsystemKind {
    #[serde(rename = "GeoLocationSubsystem")]
    GeoLocation,
    #[serde(rename = "SecuritySubsystem")]
    Security,
    #[serde(rename = "PlantSubsystem")]
    Plant,
}

impl SubsystemKind {
    /// The key this subsystem's readings are published under.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GeoLocation => "GeoLocationSubsystem",
            Self::Security => "SecuritySubsystem",
            Self::Plant => "PlantSubsystem",
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

pub struct Subsystem {
    kind: SubsystemKind,
    sensors: Vec<Arc<dyn Sensor>>,
    actuators: Vec<Arc<dyn Actuator>>,
}

impl Subsystem {
    pub fn builder(kind: SubsystemKind) -> SubsystemBuilder {
        SubsystemBuilder {
            kind,
            sensors: Vec::new(),
            actuators: Vec::new(),
        }
    }

    pub fn kind(&self) -> SubsystemKind {
        self.kind
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn actuator_count(&self) -> usize {
        self.actuators.len()
    }

    /// Every sensor's readings, concatenated in sensor order.
    pub fn read_sensors(&self) -> Vec<Reading> {
        self.sensors.iter().flat_map(|sensor| sensor.read()).collect()
    }

    /// Offer each command, in order, to every actuator that validates it.
    ///
    /// Every claimed command is offered even after one fails to apply; the
    /// failures are then reported together. Commands nobody claims are not
    /// an error.
    pub fn control_actuators(&self, commands: &[Command]) -> Result<()> {
        let mut failed = Vec::new();
        for command in commands {
            for actuator in &self.actuators {
                if actuator.validate_command(command) {
                    let applied = actuator.control_actuator(command);
                    debug!(subsystem = %self.kind, %command, applied, "Command offered");
                    if !applied {
                        failed.push(command.command_type().to_string());
                    }
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(FarmError::hardware_error(format!(
                "{} could not apply {}",
                self.kind,
                failed.join(", ")
            )))
        }
    }

    /// Orientation, position and vibration of the container.
    pub fn geo_location(hardware: GeoHardware) -> Self {
        Self::builder(SubsystemKind::GeoLocation)
            .sensor(Arc::new(AngleSensor::new(Arc::clone(&hardware.accelerometer))))
            .sensor(Arc::new(GpsSensor::new(hardware.gps)))
            .sensor(Arc::new(VibrationSensor::new(hardware.accelerometer)))
            .build()
    }

    /// Intrusion sensing, the door lock and the alarm buzzer.
    pub fn security(hardware: SecurityHardware, wiring: &Wiring) -> Self {
        Self::builder(SubsystemKind::Security)
            .sensor(Arc::new(NoiseSensor::new(hardware.adc, wiring.noise_channel)))
            .sensor(Arc::new(MotionSensor::new(hardware.motion)))
            .sensor(Arc::new(MagneticDoorSensor::new(hardware.door_contact)))
            .sensor(Arc::new(LuminositySensor::new(hardware.light)))
            .actuator(Arc::new(DoorLock::new(hardware.servo)))
            .device(Arc::new(Buzzer::new(hardware.buzzer)))
            .build()
    }

    /// Growing conditions, the fan and the grow light.
    pub fn plant(hardware: PlantHardware, wiring: &Wiring) -> Self {
        Self::builder(SubsystemKind::Plant)
            .sensor(Arc::new(SoilMoistureSensor::new(
                Arc::clone(&hardware.adc),
                wiring.soil_moisture_channel,
            )))
            .sensor(Arc::new(TemperatureHumiditySensor::new(hardware.climate)))
            .sensor(Arc::new(WaterLevelSensor::new(hardware.adc, wiring.water_level_channel)))
            .actuator(Arc::new(Fan::new(hardware.fan)))
            .device(Arc::new(RgbLedStick::new(hardware.leds, Rgb::RED)))
            .build()
    }

    /// The container's three subsystems in publishing order.
    pub fn defaults(hardware: HardwareSet, wiring: &Wiring) -> Vec<Self> {
        vec![
            Self::geo_location(hardware.geo),
            Self::security(hardware.security, wiring),
            Self::plant(hardware.plant, wiring),
        ]
    }
}

impl fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystem")
            .field("kind", &self.kind)
            .field("sensors", &self.sensors.len())
            .field("actuators", &self.actuators.len())
            .finish()
    }
}

/// Assembles a subsystem. The device lists are fixed once built.
pub struct SubsystemBuilder {
    kind: SubsystemKind,
    sensors: Vec<Arc<dyn Sensor>>,
    actuators: Vec<Arc<dyn Actuator>>,
}

impl SubsystemBuilder {
    pub fn sensor(mut self, sensor: Arc<dyn Sensor>) -> Self {
        self.sensors.push(sensor);
        self
    }

    pub fn actuator(mut self, actuator: Arc<dyn Actuator>) -> Self {
        self.actuators.push(actuator);
        self
    }

    /// Add a dual-role device to both lists; both entries share one instance.
    pub fn device<D: Device + 'static>(mut self, device: Arc<D>) -> Self {
        self.sensors.push(Arc::clone(&device) as Arc<dyn Sensor>);
        self.actuators.push(device as Arc<dyn Actuator>);
        self
    }

    /// Drop the sensor at `index`; out-of-range indexes are ignored.
    pub fn remove_sensor(mut self, index: usize) -> Self {
        if index < self.sensors.len() {
            self.sensors.remove(index);
        }
        self
    }

    /// Drop the actuator at `index`; out-of-range indexes are ignored.
    pub fn remove_actuator(mut self, index: usize) -> Self {
        if index < self.actuators.len() {
            self.actuators.remove(index);
        }
        self
    }

    pub fn build(self) -> Subsystem {
        Subsystem {
            kind: self.kind,
            sensors: self.sensors,
            actuators: self.actuators,
        }
    }
}
