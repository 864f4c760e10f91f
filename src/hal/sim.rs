//! Simulated peripherals for machines without the container hardware.
//!
//! Every simulated handle is a cheap clone over shared state, so a test (or
//! the simulator itself) can keep one clone to inject inputs and observe the
//! physical state the devices drive.

use super::{
    lock, Acceleration, Accelerometer, AnalogInput, Climate, DigitalInput, DigitalOutput,
    GeoHardware, HardwareSet, Hygrometer, LedStrip, LightMeter, LineReader, MotionLatch,
    PlantHardware, PulseOutput, Rgb, SecurityHardware, Shared,
};
use crate::error::{FarmError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A GPIO pin; usable as output or input.
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    level: Arc<AtomicBool>,
}

impl SimPin {
    pub fn set_level(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
    }

    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

impl DigitalOutput for SimPin {
    fn write(&mut self, high: bool) -> Result<()> {
        tracing::debug!("[SIM GPIO] write {}", high);
        self.set_level(high);
        Ok(())
    }

    fn is_set_high(&self) -> Result<bool> {
        Ok(self.level())
    }
}

impl DigitalInput for SimPin {
    fn is_high(&self) -> Result<bool> {
        Ok(self.level())
    }
}

/// A PIR motion sensor latch.
#[derive(Debug, Clone, Default)]
pub struct SimMotion {
    detected: Arc<AtomicBool>,
}

impl SimMotion {
    /// Simulate a rising edge on the motion input.
    pub fn trigger(&self) {
        self.detected.store(true, Ordering::SeqCst);
    }
}

impl MotionLatch for SimMotion {
    fn take_detected(&mut self) -> bool {
        self.detected.swap(false, Ordering::SeqCst)
    }
}

/// A multi-channel ADC whose channels are set by hand.
#[derive(Debug, Clone, Default)]
pub struct SimAdc {
    raw: Arc<Mutex<HashMap<u8, u16>>>,
    millivolts: Arc<Mutex<HashMap<u8, u16>>>,
    failing: Arc<AtomicBool>,
}

impl SimAdc {
    pub fn set_raw(&self, channel: u8, value: u16) {
        if let Ok(mut raw) = self.raw.lock() {
            raw.insert(channel, value);
        }
    }

    pub fn set_millivolts(&self, channel: u8, value: u16) {
        if let Ok(mut millivolts) = self.millivolts.lock() {
            millivolts.insert(channel, value);
        }
    }

    /// Make every conversion fail, as a disconnected bus would.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_bus(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FarmError::hardware_error("simulated ADC bus failure"));
        }
        Ok(())
    }
}

impl AnalogInput for SimAdc {
    fn read_raw(&mut self, channel: u8) -> Result<u16> {
        self.check_bus()?;
        Ok(lock(&self.raw, "sim adc")?.get(&channel).copied().unwrap_or(0))
    }

    fn read_millivolts(&mut self, channel: u8) -> Result<u16> {
        self.check_bus()?;
        Ok(lock(&self.millivolts, "sim adc")?.get(&channel).copied().unwrap_or(0))
    }
}

/// A servo that remembers the pulse it was last given.
#[derive(Debug, Clone, Default)]
pub struct SimServo {
    pulse: Arc<Mutex<Option<Duration>>>,
}

impl SimServo {
    pub fn current_pulse(&self) -> Option<Duration> {
        self.pulse.lock().ok().and_then(|pulse| *pulse)
    }
}

impl PulseOutput for SimServo {
    fn set_pulse_width(&mut self, width: Duration) -> Result<()> {
        tracing::debug!("[SIM SERVO] pulse {:?}", width);
        *lock(&self.pulse, "sim servo")? = Some(width);
        Ok(())
    }

    fn pulse_width(&self) -> Option<Duration> {
        self.current_pulse()
    }
}

#[derive(Debug, Clone, Default)]
struct LedState {
    pixels: Vec<Rgb>,
    brightness: u8,
    shown: Vec<Rgb>,
}

/// An LED strip that records what was pushed to it.
#[derive(Debug, Clone, Default)]
pub struct SimLedStrip {
    state: Arc<Mutex<LedState>>,
}

impl SimLedStrip {
    pub fn new(pixel_count: usize) -> Self {
        let state = LedState {
            pixels: vec![Rgb::new(0, 0, 0); pixel_count],
            ..LedState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// The colors last latched onto the strip, brightness applied.
    pub fn shown(&self) -> Vec<Rgb> {
        self.state
            .lock()
            .map(|state| state.shown.clone())
            .unwrap_or_default()
    }
}

impl LedStrip for SimLedStrip {
    fn pixel_count(&self) -> usize {
        self.state.lock().map(|state| state.pixels.len()).unwrap_or(0)
    }

    fn fill(&mut self, color: Rgb) {
        if let Ok(mut state) = self.state.lock() {
            state.pixels.iter_mut().for_each(|pixel| *pixel = color);
        }
    }

    fn set_brightness(&mut self, brightness: u8) {
        if let Ok(mut state) = self.state.lock() {
            state.brightness = brightness;
        }
    }

    fn brightness(&self) -> u8 {
        self.state.lock().map(|state| state.brightness).unwrap_or(0)
    }

    fn show(&mut self) -> Result<()> {
        let mut state = lock(&self.state, "sim led strip")?;
        let brightness = state.brightness;
        state.shown = state.pixels.iter().map(|pixel| pixel.scaled(brightness)).collect();
        tracing::debug!("[SIM LED] show brightness {}", brightness);
        Ok(())
    }
}

/// An accelerometer; `None` means the device never completes a sample.
#[derive(Debug, Clone, Default)]
pub struct SimAccelerometer {
    sample: Arc<Mutex<Option<Acceleration>>>,
}

impl SimAccelerometer {
    pub fn set_sample(&self, sample: Option<Acceleration>) {
        if let Ok(mut current) = self.sample.lock() {
            *current = sample;
        }
    }
}

impl Accelerometer for SimAccelerometer {
    fn read_acceleration(&mut self, _timeout: Duration) -> Result<Acceleration> {
        (*lock(&self.sample, "sim accelerometer")?)
            .ok_or_else(|| FarmError::timeout("acceleration sample"))
    }
}

/// A serial port fed from a queue, falling back to a repeated line.
#[derive(Debug, Clone, Default)]
pub struct SimSerial {
    queue: Arc<Mutex<VecDeque<String>>>,
    repeat: Arc<Mutex<Option<String>>>,
}

impl SimSerial {
    pub fn push_line(&self, line: impl Into<String>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(line.into());
        }
    }

    /// Line served whenever the queue is empty; `None` makes reads time out.
    pub fn set_repeat(&self, line: Option<String>) {
        if let Ok(mut repeat) = self.repeat.lock() {
            *repeat = line;
        }
    }
}

impl LineReader for SimSerial {
    fn read_line(&mut self, _timeout: Duration) -> Result<String> {
        if let Some(line) = lock(&self.queue, "sim serial")?.pop_front() {
            return Ok(line);
        }
        lock(&self.repeat, "sim serial")?
            .clone()
            .ok_or_else(|| FarmError::timeout("serial line"))
    }
}

/// A temperature/humidity sensor; `None` makes measurements fail.
#[derive(Debug, Clone, Default)]
pub struct SimHygrometer {
    climate: Arc<Mutex<Option<Climate>>>,
}

impl SimHygrometer {
    pub fn set_climate(&self, climate: Option<Climate>) {
        if let Ok(mut current) = self.climate.lock() {
            *current = climate;
        }
    }
}

impl Hygrometer for SimHygrometer {
    fn measure(&mut self) -> Result<Climate> {
        (*lock(&self.climate, "sim hygrometer")?)
            .ok_or_else(|| FarmError::hardware_error("simulated AHT20 not responding"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimLightMeter {
    lux: Arc<Mutex<f64>>,
}

impl SimLightMeter {
    pub fn set_lux(&self, lux: f64) {
        if let Ok(mut current) = self.lux.lock() {
            *current = lux;
        }
    }
}

impl LightMeter for SimLightMeter {
    fn illuminance_lux(&mut self) -> Result<f64> {
        Ok(*lock(&self.lux, "sim light meter")?)
    }
}

/// The whole container, simulated.
#[derive(Debug, Clone)]
pub struct SimulatedHardware {
    pub accelerometer: SimAccelerometer,
    pub gps: SimSerial,
    pub adc: SimAdc,
    pub motion: SimMotion,
    pub door_contact: SimPin,
    pub light: SimLightMeter,
    pub servo: SimServo,
    pub buzzer: SimPin,
    pub climate: SimHygrometer,
    pub fan: SimPin,
    pub leds: SimLedStrip,
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHardware {
    /// A container standing level, door shut, with plausible plant readings.
    pub fn new() -> Self {
        let wiring = super::Wiring::default();

        let accelerometer = SimAccelerometer::default();
        accelerometer.set_sample(Some(Acceleration::new(0.02, -0.01, 0.98)));

        let gps = SimSerial::default();
        gps.set_repeat(Some("$GNGLL,4530.1234,N,07334.5678,W,181502.00,A,A".to_string()));

        let adc = SimAdc::default();
        adc.set_raw(wiring.soil_moisture_channel, 512);
        adc.set_raw(wiring.water_level_channel, 1250);
        adc.set_millivolts(wiring.noise_channel, 120);

        let door_contact = SimPin::default();
        // Reed switch closed pulls the input low.
        door_contact.set_level(false);

        let light = SimLightMeter::default();
        light.set_lux(320.0);

        let climate = SimHygrometer::default();
        climate.set_climate(Some(Climate {
            celsius: 22.5,
            humidity_percent: 55.0,
        }));

        Self {
            accelerometer,
            gps,
            adc,
            motion: SimMotion::default(),
            door_contact,
            light,
            servo: SimServo::default(),
            buzzer: SimPin::default(),
            climate,
            fan: SimPin::default(),
            leds: SimLedStrip::new(wiring.led_count),
        }
    }

    /// Hand out device handles backed by this simulation.
    pub fn hardware_set(&self) -> HardwareSet {
        let adc: Shared<dyn AnalogInput> = Arc::new(Mutex::new(self.adc.clone()));
        let accelerometer: Shared<dyn Accelerometer> =
            Arc::new(Mutex::new(self.accelerometer.clone()));

        HardwareSet {
            geo: GeoHardware {
                accelerometer,
                gps: Box::new(self.gps.clone()),
            },
            security: SecurityHardware {
                adc: Arc::clone(&adc),
                motion: Box::new(self.motion.clone()),
                door_contact: Box::new(self.door_contact.clone()),
                light: Box::new(self.light.clone()),
                servo: Box::new(self.servo.clone()),
                buzzer: Box::new(self.buzzer.clone()),
            },
            plant: PlantHardware {
                adc,
                climate: Box::new(self.climate.clone()),
                fan: Box::new(self.fan.clone()),
                leds: Box::new(self.leds.clone()),
            },
        }
    }
}
