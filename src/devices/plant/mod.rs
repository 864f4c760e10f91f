//! Plant subsystem devices: growing conditions and the climate actuators.

pub mod fan;
pub mod rgb_led_stick;
pub mod soil_moisture;
pub mod temp_humidity;
pub mod water_level;

pub use fan::Fan;
pub use rgb_led_stick::RgbLedStick;
pub use soil_moisture::SoilMoistureSensor;
pub use temp_humidity::TemperatureHumiditySensor;
pub use water_level::WaterLevelSensor;
