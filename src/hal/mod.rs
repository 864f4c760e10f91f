//! Hardware handles for the container's peripherals.
//!
//! Devices never talk to `rppal` directly: they hold one of the small handle
//! traits below. With the `gpio` feature the handles are backed by real
//! Raspberry Pi peripherals ([`rpi`]); without it, by in-memory simulated
//! peripherals ([`sim`]) so the agent compiles and runs on any machine.

pub mod sim;
pub mod wiring;

#[cfg(feature = "gpio")]
pub mod rpi;

pub use wiring::Wiring;

use crate::error::{FarmError, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A GPIO output, or anything driven like one (sysfs LEDs, the buzzer).
pub trait DigitalOutput: Send {
    fn write(&mut self, high: bool) -> Result<()>;

    /// The level the output is actually driving.
    fn is_set_high(&self) -> Result<bool>;
}

/// A GPIO input.
pub trait DigitalInput: Send {
    fn is_high(&self) -> Result<bool>;
}

/// An edge-triggered input that remembers whether it fired.
pub trait MotionLatch: Send {
    /// Whether the input fired since the last call; clears the latch.
    fn take_detected(&mut self) -> bool;
}

/// A multi-channel analog-to-digital converter.
pub trait AnalogInput: Send {
    /// Raw conversion result for `channel`.
    fn read_raw(&mut self, channel: u8) -> Result<u16>;

    /// Channel input voltage in millivolts.
    fn read_millivolts(&mut self, channel: u8) -> Result<u16>;
}

/// A pulse-width driven output such as a hobby servo.
pub trait PulseOutput: Send {
    fn set_pulse_width(&mut self, width: Duration) -> Result<()>;

    /// The pulse width currently being driven, if any.
    fn pulse_width(&self) -> Option<Duration>;
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Scale each channel by `brightness / 255`.
    pub fn scaled(self, brightness: u8) -> Self {
        let scale = |channel: u8| ((channel as u16 * brightness as u16) / 255) as u8;
        Self::new(scale(self.red), scale(self.green), scale(self.blue))
    }
}

/// An addressable LED strip with a global brightness.
pub trait LedStrip: Send {
    fn pixel_count(&self) -> usize;

    fn fill(&mut self, color: Rgb);

    fn set_brightness(&mut self, brightness: u8);

    fn brightness(&self) -> u8;

    /// Push the buffered pixels and brightness out to the strip.
    fn show(&mut self) -> Result<()>;
}

/// One three-axis acceleration sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Acceleration {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// An accelerometer that delivers axes asynchronously.
pub trait Accelerometer: Send {
    /// Wait at most `timeout` for a complete x/y/z sample.
    fn read_acceleration(&mut self, timeout: Duration) -> Result<Acceleration>;
}

/// A line-oriented serial device.
pub trait LineReader: Send {
    /// Read one line, waiting at most `timeout`.
    fn read_line(&mut self, timeout: Duration) -> Result<String>;
}

/// Air temperature and relative humidity from one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    pub celsius: f64,
    pub humidity_percent: f64,
}

pub trait Hygrometer: Send {
    fn measure(&mut self) -> Result<Climate>;
}

pub trait LightMeter: Send {
    fn illuminance_lux(&mut self) -> Result<f64>;
}

/// A handle shared by several devices on the same bus.
pub type Shared<T> = Arc<Mutex<T>>;

/// Lock a hardware handle, turning a poisoned lock into a hardware error.
pub fn lock<'a, T: ?Sized>(handle: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    handle
        .lock()
        .map_err(|_| FarmError::hardware_error(format!("{} handle poisoned", what)))
}

/// Handles for the geo-location subsystem.
pub struct GeoHardware {
    pub accelerometer: Shared<dyn Accelerometer>,
    pub gps: Box<dyn LineReader>,
}

/// Handles for the security subsystem.
pub struct SecurityHardware {
    pub adc: Shared<dyn AnalogInput>,
    pub motion: Box<dyn MotionLatch>,
    pub door_contact: Box<dyn DigitalInput>,
    pub light: Box<dyn LightMeter>,
    pub servo: Box<dyn PulseOutput>,
    pub buzzer: Box<dyn DigitalOutput>,
}

/// Handles for the plant subsystem.
pub struct PlantHardware {
    pub adc: Shared<dyn AnalogInput>,
    pub climate: Box<dyn Hygrometer>,
    pub fan: Box<dyn DigitalOutput>,
    pub leds: Box<dyn LedStrip>,
}

/// Every peripheral the container is wired with.
pub struct HardwareSet {
    pub geo: GeoHardware,
    pub security: SecurityHardware,
    pub plant: PlantHardware,
}

/// Open the real peripherals described by `wiring`.
#[cfg(feature = "gpio")]
pub fn default_hardware(wiring: &Wiring) -> Result<HardwareSet> {
    rpi::connect(wiring)
}

/// Without the `gpio` feature, the container is simulated.
#[cfg(not(feature = "gpio"))]
pub fn default_hardware(_wiring: &Wiring) -> Result<HardwareSet> {
    tracing::info!("GPIO feature not compiled, using simulated peripherals");
    Ok(sim::SimulatedHardware::new().hardware_set())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_scaling() {
        assert_eq!(Rgb::RED.scaled(255), Rgb::RED);
        assert_eq!(Rgb::RED.scaled(0), Rgb::new(0, 0, 0));
        assert_eq!(Rgb::new(200, 100, 50).scaled(128), Rgb::new(100, 50, 25));
    }

    #[test]
    fn test_lock_shared_handle() {
        let adc: Shared<dyn AnalogInput> = Arc::new(Mutex::new(sim::SimAdc::default()));
        let mut guard = lock(&adc, "adc").unwrap();
        assert_eq!(guard.read_raw(0).unwrap(), 0);
    }
}
