//! Raspberry Pi peripherals backed by `rppal`, sysfs and evdev.

use super::{
    lock, Acceleration, Accelerometer, AnalogInput, Climate, DigitalInput, DigitalOutput, GeoHardware,
    HardwareSet, Hygrometer, LedStrip, LightMeter, LineReader, MotionLatch, PlantHardware,
    PulseOutput, Rgb, SecurityHardware, Shared, Wiring,
};
use crate::error::{FarmError, Result};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use rppal::i2c::I2c;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use rppal::uart::{Parity, Uart};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Open every peripheral listed in `wiring`.
pub fn connect(wiring: &Wiring) -> Result<HardwareSet> {
    let gpio = Gpio::new()
        .map_err(|e| FarmError::gpio_error(format!("Failed to initialize GPIO: {}", e)))?;

    let adc: Shared<dyn AnalogInput> =
        Arc::new(Mutex::new(GroveAdc::open(wiring.adc_bus, wiring.adc_address)?));
    let accelerometer: Shared<dyn Accelerometer> =
        Arc::new(Mutex::new(EventAccelerometer::open(&wiring.accelerometer_path)?));

    Ok(HardwareSet {
        geo: GeoHardware {
            accelerometer,
            gps: Box::new(SerialLines::open(&wiring.gps_serial)?),
        },
        security: SecurityHardware {
            adc: Arc::clone(&adc),
            motion: Box::new(EdgeLatch::open(&gpio, wiring.motion_gpio)?),
            door_contact: Box::new(PulledUpInput::open(&gpio, wiring.door_contact_gpio)?),
            light: Box::new(SysfsLightMeter::new(&wiring.light_sensor_path)),
            servo: Box::new(SoftPwmServo::open(&gpio, wiring.servo_gpio)?),
            buzzer: Box::new(SysfsLed::new(&wiring.buzzer_path)),
        },
        plant: PlantHardware {
            adc,
            climate: Box::new(Aht20::open(wiring.climate_bus, wiring.climate_address)?),
            fan: Box::new(Output::open(&gpio, wiring.fan_gpio)?),
            leds: Box::new(Ws2813Strip::open(wiring.led_count)?),
        },
    })
}

fn claim(gpio: &Gpio, pin: u8) -> Result<rppal::gpio::Pin> {
    gpio.get(pin)
        .map_err(|e| FarmError::gpio_error(format!("Failed to access pin {}: {}", pin, e)))
}

/// A plain push-pull output pin.
pub struct Output {
    pin: OutputPin,
}

impl Output {
    pub fn open(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: claim(gpio, pin)?.into_output_low(),
        })
    }
}

impl DigitalOutput for Output {
    fn write(&mut self, high: bool) -> Result<()> {
        if high {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }

    fn is_set_high(&self) -> Result<bool> {
        Ok(self.pin.is_set_high())
    }
}

/// An input with the internal pull-up enabled.
pub struct PulledUpInput {
    pin: InputPin,
}

impl PulledUpInput {
    pub fn open(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: claim(gpio, pin)?.into_input_pullup(),
        })
    }
}

impl DigitalInput for PulledUpInput {
    fn is_high(&self) -> Result<bool> {
        Ok(self.pin.is_high())
    }
}

/// Latches rising edges delivered by the GPIO interrupt thread.
pub struct EdgeLatch {
    // Dropping the pin cancels the interrupt.
    _pin: InputPin,
    fired: Arc<AtomicBool>,
}

impl EdgeLatch {
    pub fn open(gpio: &Gpio, pin: u8) -> Result<Self> {
        let mut input = claim(gpio, pin)?.into_input();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        input
            .set_async_interrupt(Trigger::RisingEdge, move |_level: Level| {
                flag.store(true, Ordering::SeqCst);
            })
            .map_err(|e| FarmError::gpio_error(format!("Failed to watch pin {}: {}", pin, e)))?;
        Ok(Self { _pin: input, fired })
    }
}

impl MotionLatch for EdgeLatch {
    fn take_detected(&mut self) -> bool {
        self.fired.swap(false, Ordering::SeqCst)
    }
}

const SERVO_FRAME: Duration = Duration::from_millis(20);

/// Hobby servo driven by software PWM on a GPIO pin.
pub struct SoftPwmServo {
    pin: OutputPin,
    pulse: Option<Duration>,
}

impl SoftPwmServo {
    pub fn open(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: claim(gpio, pin)?.into_output_low(),
            pulse: None,
        })
    }
}

impl PulseOutput for SoftPwmServo {
    fn set_pulse_width(&mut self, width: Duration) -> Result<()> {
        self.pin
            .set_pwm(SERVO_FRAME, width)
            .map_err(|e| FarmError::gpio_error(format!("Failed to drive servo: {}", e)))?;
        self.pulse = Some(width);
        Ok(())
    }

    fn pulse_width(&self) -> Option<Duration> {
        self.pulse
    }
}

const ADC_REG_RAW: u8 = 0x30;
const ADC_REG_VOLTAGE: u8 = 0x20;

/// The STM32 ADC on the Grove base hat.
pub struct GroveAdc {
    bus: I2c,
}

impl GroveAdc {
    pub fn open(bus: u8, address: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus)
            .map_err(|e| FarmError::hardware_error(format!("Failed to open I2C bus {}: {}", bus, e)))?;
        i2c.set_slave_address(address)
            .map_err(|e| FarmError::hardware_error(format!("Failed to address ADC: {}", e)))?;
        Ok(Self { bus: i2c })
    }

    fn read_register(&mut self, register: u8) -> Result<u16> {
        self.bus
            .smbus_read_word(register)
            .map_err(|e| FarmError::hardware_error(format!("ADC register {:#04x}: {}", register, e)))
    }
}

impl AnalogInput for GroveAdc {
    fn read_raw(&mut self, channel: u8) -> Result<u16> {
        self.read_register(ADC_REG_RAW + channel)
    }

    fn read_millivolts(&mut self, channel: u8) -> Result<u16> {
        self.read_register(ADC_REG_VOLTAGE + channel)
    }
}

const AHT20_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];
const AHT20_BUSY: u8 = 0x80;

/// AHT20 temperature and humidity sensor.
pub struct Aht20 {
    bus: I2c,
}

impl Aht20 {
    pub fn open(bus: u8, address: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus)
            .map_err(|e| FarmError::hardware_error(format!("Failed to open I2C bus {}: {}", bus, e)))?;
        i2c.set_slave_address(address)
            .map_err(|e| FarmError::hardware_error(format!("Failed to address AHT20: {}", e)))?;
        Ok(Self { bus: i2c })
    }
}

impl Hygrometer for Aht20 {
    fn measure(&mut self) -> Result<Climate> {
        self.bus
            .write(&AHT20_TRIGGER)
            .map_err(|e| FarmError::hardware_error(format!("AHT20 trigger: {}", e)))?;
        thread::sleep(Duration::from_millis(80));

        let mut frame = [0u8; 7];
        self.bus
            .read(&mut frame)
            .map_err(|e| FarmError::hardware_error(format!("AHT20 read: {}", e)))?;
        if frame[0] & AHT20_BUSY != 0 {
            return Err(FarmError::timeout("AHT20 measurement"));
        }

        let humidity_raw =
            ((frame[1] as u32) << 12) | ((frame[2] as u32) << 4) | ((frame[3] as u32) >> 4);
        let temperature_raw =
            (((frame[3] as u32) & 0x0F) << 16) | ((frame[4] as u32) << 8) | frame[5] as u32;
        let full_scale = (1u32 << 20) as f64;

        Ok(Climate {
            celsius: temperature_raw as f64 / full_scale * 200.0 - 50.0,
            humidity_percent: humidity_raw as f64 / full_scale * 100.0,
        })
    }
}

/// An LED exposed through a sysfs `brightness` file.
pub struct SysfsLed {
    path: PathBuf,
}

impl SysfsLed {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl DigitalOutput for SysfsLed {
    fn write(&mut self, high: bool) -> Result<()> {
        fs::write(&self.path, if high { "1" } else { "0" })?;
        Ok(())
    }

    fn is_set_high(&self) -> Result<bool> {
        let text = fs::read_to_string(&self.path)?;
        let level: u32 = text
            .trim()
            .parse()
            .map_err(|_| FarmError::parse_error(format!("brightness '{}'", text.trim())))?;
        Ok(level > 0)
    }
}

/// Illuminance from an IIO sysfs attribute.
pub struct SysfsLightMeter {
    path: PathBuf,
}

impl SysfsLightMeter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl LightMeter for SysfsLightMeter {
    fn illuminance_lux(&mut self) -> Result<f64> {
        let text = fs::read_to_string(&self.path)?;
        text.trim()
            .parse()
            .map_err(|_| FarmError::parse_error(format!("illuminance '{}'", text.trim())))
    }
}

const INPUT_EVENT_SIZE: usize = 24;
const EV_ABS: u16 = 0x03;
const ABS_X: u16 = 0x00;
const ABS_Y: u16 = 0x01;
const ABS_Z: u16 = 0x02;

/// Latest value of each absolute axis as last reported by the device.
#[derive(Debug, Default)]
struct AxisState {
    axes: [Option<i32>; 3],
    updates: u64,
    stopped: bool,
}

/// Accelerometer exposed as a Linux input event device.
///
/// A reader thread keeps only the newest value per axis. A read returns the
/// current x/y/z once every axis has reported and something changed since
/// the previous read; it never replays an older sample.
pub struct EventAccelerometer {
    shared: Arc<(Mutex<AxisState>, Condvar)>,
    seen: u64,
}

impl EventAccelerometer {
    pub fn open(path: &Path) -> Result<Self> {
        let device = File::open(path)?;
        Self::from_reader(device, path.display().to_string())
    }

    fn from_reader<R: Read + Send + 'static>(mut device: R, name: String) -> Result<Self> {
        let shared = Arc::new((Mutex::new(AxisState::default()), Condvar::new()));
        let writer = Arc::clone(&shared);

        thread::Builder::new()
            .name("accelerometer".to_string())
            .spawn(move || {
                let (state, changed) = &*writer;
                let mut record = [0u8; INPUT_EVENT_SIZE];
                loop {
                    let event = device.read_exact(&mut record);
                    let Ok(mut current) = state.lock() else {
                        return;
                    };
                    if let Err(e) = event {
                        warn!("Accelerometer {} stopped: {}", name, e);
                        current.stopped = true;
                        changed.notify_all();
                        return;
                    }
                    let kind = u16::from_ne_bytes([record[16], record[17]]);
                    let code = u16::from_ne_bytes([record[18], record[19]]);
                    let value = i32::from_ne_bytes([record[20], record[21], record[22], record[23]]);
                    if kind == EV_ABS && code <= ABS_Z {
                        current.axes[usize::from(code)] = Some(value);
                        current.updates += 1;
                        changed.notify_all();
                    }
                }
            })?;

        Ok(Self { shared, seen: 0 })
    }

    /// Whether the reader thread is still receiving events.
    pub fn is_streaming(&self) -> bool {
        lock(&self.shared.0, "accelerometer").map_or(false, |state| !state.stopped)
    }
}

impl Accelerometer for EventAccelerometer {
    fn read_acceleration(&mut self, timeout: Duration) -> Result<Acceleration> {
        let (state, changed) = &*self.shared;
        let seen = self.seen;
        let ready = |state: &AxisState| state.updates != seen && state.axes.iter().all(Option::is_some);

        let guard = lock(state, "accelerometer")?;
        let (guard, _) = changed
            .wait_timeout_while(guard, timeout, |state| !state.stopped && !ready(state))
            .map_err(|_| FarmError::hardware_error("accelerometer state poisoned"))?;

        match guard.axes {
            [Some(x), Some(y), Some(z)] if ready(&guard) => {
                self.seen = guard.updates;
                Ok(Acceleration::new(x as f64, y as f64, z as f64))
            }
            _ if guard.stopped => Err(FarmError::hardware_error("accelerometer reader stopped")),
            _ => Err(FarmError::timeout("acceleration sample")),
        }
    }
}

/// Line reader over a UART.
pub struct SerialLines {
    uart: Uart,
    pending: Vec<u8>,
}

impl SerialLines {
    pub fn open(path: &Path) -> Result<Self> {
        let mut uart = Uart::with_path(path, 9600, Parity::None, 8, 1)
            .map_err(|e| FarmError::hardware_error(format!("Failed to open {}: {}", path.display(), e)))?;
        uart.set_read_mode(0, Duration::from_millis(100))
            .map_err(|e| FarmError::hardware_error(format!("Failed to configure UART: {}", e)))?;
        Ok(Self {
            uart,
            pending: Vec::new(),
        })
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&byte| byte == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).trim_end().to_string())
    }
}

impl LineReader for SerialLines {
    fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; 128];

        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }
            if Instant::now() >= deadline {
                return Err(FarmError::timeout("serial line"));
            }
            let count = self
                .uart
                .read(&mut chunk)
                .map_err(|e| FarmError::hardware_error(format!("UART read: {}", e)))?;
            self.pending.extend_from_slice(&chunk[..count]);
        }
    }
}

// Each WS2813 bit becomes three SPI bits at 2.4 MHz: 0 -> 100, 1 -> 110.
const WS2813_SPI_HZ: u32 = 2_400_000;
const WS2813_RESET_BYTES: usize = 90;

/// WS2813 strip driven from SPI0 MOSI.
pub struct Ws2813Strip {
    spi: Spi,
    pixels: Vec<Rgb>,
    brightness: u8,
}

impl Ws2813Strip {
    pub fn open(pixel_count: usize) -> Result<Self> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, WS2813_SPI_HZ, Mode::Mode0)
            .map_err(|e| FarmError::hardware_error(format!("Failed to open SPI0: {}", e)))?;
        Ok(Self {
            spi,
            pixels: vec![Rgb::new(0, 0, 0); pixel_count],
            brightness: 0,
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut bits: Vec<bool> = Vec::with_capacity(self.pixels.len() * 72);
        for pixel in &self.pixels {
            let pixel = pixel.scaled(self.brightness);
            for byte in [pixel.green, pixel.red, pixel.blue] {
                for shift in (0..8).rev() {
                    let one = (byte >> shift) & 1 == 1;
                    bits.extend_from_slice(&[true, one, false]);
                }
            }
        }

        let mut frame: Vec<u8> = bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << (7 - i)))
            })
            .collect();
        frame.extend(std::iter::repeat(0).take(WS2813_RESET_BYTES));
        frame
    }
}

impl LedStrip for Ws2813Strip {
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn fill(&mut self, color: Rgb) {
        self.pixels.iter_mut().for_each(|pixel| *pixel = color);
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }

    fn show(&mut self) -> Result<()> {
        let frame = self.encode();
        self.spi
            .write(&frame)
            .map_err(|e| FarmError::hardware_error(format!("LED strip write: {}", e)))?;
        debug!("Latched {} LED pixels", self.pixels.len());
        Ok(())
    }
}
