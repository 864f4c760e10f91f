//! Peripheral wiring of the farm container.

use std::path::PathBuf;

/// Where each peripheral is attached.
#[derive(Debug, Clone)]
pub struct Wiring {
    /// Fan relay output (BCM numbering)
    pub fan_gpio: u8,
    /// Door servo signal pin
    pub servo_gpio: u8,
    /// PIR motion sensor input
    pub motion_gpio: u8,
    /// Magnetic door reed switch input
    pub door_contact_gpio: u8,
    /// Number of pixels on the WS2813 strip (data on SPI0 MOSI)
    pub led_count: usize,
    /// I2C bus of the Grove base hat ADC
    pub adc_bus: u8,
    /// I2C address of the Grove base hat ADC
    pub adc_address: u16,
    /// ADC channel of the soil moisture probe
    pub soil_moisture_channel: u8,
    /// ADC channel of the water level probe
    pub water_level_channel: u8,
    /// ADC channel of the loudness sensor
    pub noise_channel: u8,
    /// I2C bus of the AHT20 temperature/humidity sensor
    pub climate_bus: u8,
    /// I2C address of the AHT20
    pub climate_address: u16,
    /// Serial device the GPS module streams NMEA on
    pub gps_serial: PathBuf,
    /// Sysfs brightness file of the on-board buzzer
    pub buzzer_path: PathBuf,
    /// Sysfs illuminance file of the on-board light sensor
    pub light_sensor_path: PathBuf,
    /// Input event device of the on-board accelerometer
    pub accelerometer_path: PathBuf,
}

impl Default for Wiring {
    fn default() -> Self {
        Self {
            fan_gpio: 5,
            servo_gpio: 12,
            motion_gpio: 16,
            door_contact_gpio: 24,
            led_count: 10,
            adc_bus: 1,
            adc_address: 0x04,
            soil_moisture_channel: 0,
            water_level_channel: 2,
            noise_channel: 4,
            climate_bus: 4,
            climate_address: 0x38,
            gps_serial: PathBuf::from("/dev/ttyAMA0"),
            buzzer_path: PathBuf::from("/sys/class/leds/usr_buzzer/brightness"),
            light_sensor_path: PathBuf::from("/sys/bus/iio/devices/iio:device0/in_illuminance_input"),
            accelerometer_path: PathBuf::from("/dev/input/event0"),
        }
    }
}

impl Wiring {
    /// Set the fan relay pin.
    pub fn with_fan_gpio(mut self, pin: u8) -> Self {
        self.fan_gpio = pin;
        self
    }

    /// Set the door servo pin.
    pub fn with_servo_gpio(mut self, pin: u8) -> Self {
        self.servo_gpio = pin;
        self
    }

    /// Set the LED strip length.
    pub fn with_led_count(mut self, count: usize) -> Self {
        self.led_count = count;
        self
    }

    /// Set the GPS serial device.
    pub fn with_gps_serial(mut self, path: impl Into<PathBuf>) -> Self {
        self.gps_serial = path.into();
        self
    }

    /// Set the accelerometer event device.
    pub fn with_accelerometer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.accelerometer_path = path.into();
        self
    }
}
