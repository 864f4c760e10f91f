//! Just enough NMEA 0183 to decode GLL (geographic position) sentences.

use crate::error::{FarmError, Result};
use serde_json::{json, Map, Value};
use std::str::FromStr;

/// XOR of every byte between `$` and `*`.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, byte| acc ^ byte)
}

/// A decoded `$..GLL` sentence. Fields are kept as transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GllSentence {
    pub latitude: String,
    pub latitude_direction: String,
    pub longitude: String,
    pub longitude_direction: String,
    pub timestamp: String,
    pub status: String,
    /// Only present from NMEA 2.3 on.
    pub faa_mode: Option<String>,
}

impl FromStr for GllSentence {
    type Err = FarmError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let body = line
            .strip_prefix('$')
            .ok_or_else(|| FarmError::parse_error(format!("NMEA sentence without '$': {}", line)))?;

        let body = match body.split_once('*') {
            Some((body, expected)) => {
                let expected = u8::from_str_radix(expected.trim(), 16)
                    .map_err(|_| FarmError::parse_error(format!("NMEA checksum '{}'", expected)))?;
                let actual = checksum(body);
                if actual != expected {
                    return Err(FarmError::parse_error(format!(
                        "NMEA sentence, checksum {:02X} != {:02X}",
                        actual, expected
                    )));
                }
                body
            }
            None => body,
        };

        let mut fields = body.split(',');
        let header = fields.next().unwrap_or_default();
        if header.len() != 5 || !header.ends_with("GLL") {
            return Err(FarmError::parse_error(format!("GLL sentence, got '{}'", header)));
        }

        let fields: Vec<&str> = fields.collect();
        if fields.len() < 6 {
            return Err(FarmError::parse_error(format!(
                "GLL sentence, {} fields instead of at least 6",
                fields.len()
            )));
        }

        Ok(Self {
            latitude: fields[0].to_string(),
            latitude_direction: fields[1].to_string(),
            longitude: fields[2].to_string(),
            longitude_direction: fields[3].to_string(),
            timestamp: fields[4].to_string(),
            status: fields[5].to_string(),
            faa_mode: fields.get(6).map(|mode| mode.to_string()),
        })
    }
}

/// Split `ddmm.mmmm` / `dddmm.mmmm` into degrees and minutes.
fn degrees_and_minutes(coordinate: &str, degree_digits: usize) -> Value {
    let split = coordinate
        .char_indices()
        .nth(degree_digits)
        .map_or(coordinate.len(), |(index, _)| index);
    let (degrees, minutes) = coordinate.split_at(split);
    json!({ "degrees": degrees, "minutes": minutes })
}

impl GllSentence {
    /// The structured value of a Geo-Location reading.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("Latitude".into(), degrees_and_minutes(&self.latitude, 2));
        map.insert("Latitude Direction".into(), self.latitude_direction.clone().into());
        map.insert("Longitude".into(), degrees_and_minutes(&self.longitude, 3));
        map.insert("Longitude Direction".into(), self.longitude_direction.clone().into());
        map.insert("Timestamp".into(), self.timestamp.clone().into());
        map.insert("Status".into(), self.status.clone().into());
        if let Some(mode) = &self.faa_mode {
            map.insert("FAA mode indicator".into(), mode.clone().into());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(body: &str) -> String {
        format!("${}*{:02X}", body, checksum(body))
    }

    #[test]
    fn test_parse_gll_with_checksum() {
        let line = with_checksum("GNGLL,4530.1234,N,07334.5678,W,181502.00,A,A");
        let sentence: GllSentence = line.parse().unwrap();
        assert_eq!(sentence.latitude, "4530.1234");
        assert_eq!(sentence.longitude_direction, "W");
        assert_eq!(sentence.faa_mode.as_deref(), Some("A"));
    }

    #[test]
    fn test_bad_checksum_is_rejected() {
        let line = "$GNGLL,4530.1234,N,07334.5678,W,181502.00,A,A*00";
        assert!(line.parse::<GllSentence>().is_err());
    }

    #[test]
    fn test_other_sentences_are_rejected() {
        assert!("$GNRMC,181502.00,A,4530.1234,N".parse::<GllSentence>().is_err());
        assert!("GNGLL,4530.1234,N,07334.5678,W,181502.00,A".parse::<GllSentence>().is_err());
        assert!("$GNGLL,4530.1234,N".parse::<GllSentence>().is_err());
    }

    #[test]
    fn test_map_splits_degrees() {
        let sentence: GllSentence = "$GNGLL,4530.1234,N,07334.5678,W,181502.00,A".parse().unwrap();
        let map = sentence.to_map();
        assert_eq!(map["Latitude"], json!({"degrees": "45", "minutes": "30.1234"}));
        assert_eq!(map["Longitude"], json!({"degrees": "073", "minutes": "34.5678"}));
        assert_eq!(map["Status"], "A");
        assert!(!map.contains_key("FAA mode indicator"));
    }

    #[test]
    fn test_empty_coordinates_without_fix() {
        let sentence: GllSentence = "$GNGLL,,,,,181502.00,V,N".parse().unwrap();
        let map = sentence.to_map();
        assert_eq!(map["Latitude"], json!({"degrees": "", "minutes": ""}));
        assert_eq!(map["Status"], "V");
    }
}
