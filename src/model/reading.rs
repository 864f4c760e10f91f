//! Sensor readings and their enumerated kinds and units.

use crate::error::{FarmError, Result};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The kind of physical quantity a reading describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadingType {
    #[serde(rename = "Geo-Location")]
    GeoLocation,
    #[serde(rename = "Pitch")]
    Pitch,
    #[serde(rename = "Roll")]
    Roll,
    #[serde(rename = "Buzzer")]
    Buzzer,
    #[serde(rename = "Vibration")]
    Vibration,
    #[serde(rename = "Fan")]
    Fan,
    #[serde(rename = "Soil-Moisture")]
    SoilMoisture,
    #[serde(rename = "Water-Level")]
    WaterLevel,
    #[serde(rename = "Temperature")]
    Temperature,
    #[serde(rename = "Humidity")]
    Humidity,
    #[serde(rename = "RGB-LED-Stick")]
    RgbLedStick,
    #[serde(rename = "Luminosity")]
    Luminosity,
    #[serde(rename = "Door-Opened")]
    DoorOpened,
    #[serde(rename = "Door-Locked")]
    DoorLocked,
    #[serde(rename = "Motion")]
    Motion,
    #[serde(rename = "Noise")]
    Noise,
}

impl ReadingType {
    /// Every reading type, in declaration order.
    pub const ALL: [ReadingType; 16] = [
        Self::GeoLocation,
        Self::Pitch,
        Self::Roll,
        Self::Buzzer,
        Self::Vibration,
        Self::Fan,
        Self::SoilMoisture,
        Self::WaterLevel,
        Self::Temperature,
        Self::Humidity,
        Self::RgbLedStick,
        Self::Luminosity,
        Self::DoorOpened,
        Self::DoorLocked,
        Self::Motion,
        Self::Noise,
    ];

    /// The wire name of this reading type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeoLocation => "Geo-Location",
            Self::Pitch => "Pitch",
            Self::Roll => "Roll",
            Self::Buzzer => "Buzzer",
            Self::Vibration => "Vibration",
            Self::Fan => "Fan",
            Self::SoilMoisture => "Soil-Moisture",
            Self::WaterLevel => "Water-Level",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::RgbLedStick => "RGB-LED-Stick",
            Self::Luminosity => "Luminosity",
            Self::DoorOpened => "Door-Opened",
            Self::DoorLocked => "Door-Locked",
            Self::Motion => "Motion",
            Self::Noise => "Noise",
        }
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingType {
    type Err = FarmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FarmError::parse_error(format!("reading type '{}'", s)))
    }
}

/// The unit a reading value is measured in.
///
/// `None` is a real unit here (dimensionless or structured values) and is
/// carried on the wire as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingUnit {
    None,
    Degrees,
    Bool,
    Percentage,
    Centimeters,
    Celsius,
    Decibel,
    Lux,
}

impl ReadingUnit {
    /// Every reading unit, in declaration order.
    pub const ALL: [ReadingUnit; 8] = [
        Self::None,
        Self::Degrees,
        Self::Bool,
        Self::Percentage,
        Self::Centimeters,
        Self::Celsius,
        Self::Decibel,
        Self::Lux,
    ];

    /// The wire symbol of this unit, `None` for the dimensionless unit.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Degrees => Some("°"),
            Self::Bool => Some("Bool"),
            Self::Percentage => Some("%"),
            Self::Centimeters => Some("cm"),
            Self::Celsius => Some("°C"),
            Self::Decibel => Some("Decibel"),
            Self::Lux => Some("Lux"),
        }
    }

    /// Look a unit up by its wire symbol (`None` maps to the dimensionless unit).
    pub fn from_symbol(symbol: Option<&str>) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.symbol() == symbol)
            .ok_or_else(|| FarmError::parse_error(format!("reading unit '{:?}'", symbol)))
    }
}

impl fmt::Display for ReadingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol().unwrap_or("None"))
    }
}

impl Serialize for ReadingUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.symbol().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ReadingUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let symbol: Option<String> = Option::deserialize(deserializer)?;
        Self::from_symbol(symbol.as_deref()).map_err(serde::de::Error::custom)
    }
}

/// The value carried by a reading.
///
/// There is no null variant: a sensor that cannot produce a
/// value omits the reading instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Bool(bool),
    Number(f64),
    Structured(serde_json::Map<String, serde_json::Value>),
}

impl From<bool> for ReadingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ReadingValue {
    fn from(value: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Structured(value)
    }
}

/// One observed quantity at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    value: ReadingValue,
    reading_type: ReadingType,
    reading_unit: ReadingUnit,
    #[serde(with = "timestamp_format")]
    timestamp: DateTime<Utc>,
}

impl Reading {
    /// Create a reading stamped with the current time.
    pub fn new(value: impl Into<ReadingValue>, reading_type: ReadingType, reading_unit: ReadingUnit) -> Self {
        Self::with_timestamp(value, reading_type, reading_unit, Utc::now())
    }

    /// Create a reading with an explicit capture instant.
    ///
    /// Timestamps are kept at microsecond precision, the precision of the
    /// wire format.
    pub fn with_timestamp(
        value: impl Into<ReadingValue>,
        reading_type: ReadingType,
        reading_unit: ReadingUnit,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            value: value.into(),
            reading_type,
            reading_unit,
            timestamp: timestamp.trunc_subsecs(6),
        }
    }

    /// Create a numeric reading, or `None` when the value is not finite.
    pub fn number(value: f64, reading_type: ReadingType, reading_unit: ReadingUnit) -> Option<Self> {
        value
            .is_finite()
            .then(|| Self::new(ReadingValue::Number(value), reading_type, reading_unit))
    }

    pub fn value(&self) -> &ReadingValue {
        &self.value
    }

    pub fn reading_type(&self) -> ReadingType {
        self.reading_type
    }

    pub fn reading_unit(&self) -> ReadingUnit {
        self.reading_unit
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Serialize this reading as a `{value, reading_type, reading_unit, timestamp}` record.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a reading record produced by [`Reading::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fixed-width UTC timestamps (`2024-03-01T12:00:00.000000Z`) so the textual
/// form sorts the same way as the instants.
mod timestamp_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

    pub fn serialize<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&timestamp.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reading_record_shape() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let reading = Reading::with_timestamp(
            ReadingValue::Number(21.5),
            ReadingType::Temperature,
            ReadingUnit::Celsius,
            timestamp,
        );

        let json: serde_json::Value = serde_json::from_str(&reading.to_json().unwrap()).unwrap();
        assert_eq!(json["value"], 21.5);
        assert_eq!(json["reading_type"], "Temperature");
        assert_eq!(json["reading_unit"], "°C");
        assert_eq!(json["timestamp"], "2024-03-01T12:00:00.000000Z");
    }

    #[test]
    fn test_dimensionless_unit_is_null() {
        let reading = Reading::new(ReadingValue::Number(0.2), ReadingType::Vibration, ReadingUnit::None);
        let json: serde_json::Value = serde_json::from_str(&reading.to_json().unwrap()).unwrap();
        assert!(json["reading_unit"].is_null());

        let parsed = Reading::from_json(&reading.to_json().unwrap()).unwrap();
        assert_eq!(parsed.reading_unit(), ReadingUnit::None);
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let mut location = serde_json::Map::new();
        location.insert("Status".to_string(), "A".into());
        let readings = [
            Reading::new(true, ReadingType::Motion, ReadingUnit::Bool),
            Reading::new(ReadingValue::Number(-12.345678901), ReadingType::Pitch, ReadingUnit::Degrees),
            Reading::new(location, ReadingType::GeoLocation, ReadingUnit::None),
        ];

        for reading in readings {
            let parsed = Reading::from_json(&reading.to_json().unwrap()).unwrap();
            assert_eq!(parsed, reading);
        }
    }

    #[test]
    fn test_null_value_is_rejected() {
        let json = r#"{"value":null,"reading_type":"Noise","reading_unit":"Decibel","timestamp":"2024-03-01T12:00:00.000000Z"}"#;
        assert!(Reading::from_json(json).is_err());
    }

    #[test]
    fn test_non_finite_numbers_are_omitted() {
        assert!(Reading::number(f64::NAN, ReadingType::Pitch, ReadingUnit::Degrees).is_none());
        assert!(Reading::number(f64::INFINITY, ReadingType::Roll, ReadingUnit::Degrees).is_none());
        assert!(Reading::number(1.0, ReadingType::Roll, ReadingUnit::Degrees).is_some());
    }

    #[test]
    fn test_unknown_names_are_errors() {
        assert!("Soil-Moisture".parse::<ReadingType>().is_ok());
        assert!("Soil Moisture".parse::<ReadingType>().is_err());
        assert!(ReadingUnit::from_symbol(Some("kelvin")).is_err());
    }

    #[test]
    fn test_timestamps_sort_textually() {
        let earlier = Reading::with_timestamp(true, ReadingType::Fan, ReadingUnit::Bool, Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap());
        let later = Reading::with_timestamp(true, ReadingType::Fan, ReadingUnit::Bool, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        assert!(earlier.to_json().unwrap() < later.to_json().unwrap());
    }
}
