use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

pub const INTERNAL_SUFFIX: &str = "(internal)";
pub const EXTERNAL_SUFFIX: &str = "(external)";

/// One reading as sent by the unit: `[amount, timestamp, measurement id, sensor code]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSample(
    pub f64,
    pub String,
    #[serde(deserialize_with = "measurement_id")] pub i64,
    pub String,
);

impl RawSample {
    pub fn amount(&self) -> f64 {
        self.0
    }

    pub fn timestamp(&self) -> &str {
        &self.1
    }

    pub fn measurement_id(&self) -> i64 {
        self.2
    }

    pub fn sensor(&self) -> &str {
        &self.3
    }

    pub fn into_timestamp(self) -> String {
        self.1
    }
}

// The unit encodes the id as a JSON number, sometimes with a trailing `.0`
fn measurement_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(id) = number.as_i64() {
        return Ok(id);
    }
    match number.as_f64() {
        Some(id) if id.is_finite() && id.fract() == 0.0 => Ok(id as i64),
        _ => Err(D::Error::custom(format!("measurement id {} is not an integer", number))),
    }
}

/// Placement suffix for environmental sensors. Ids 4 and 5 are the sensors
/// inside the enclosure, 6 and 7 the ones outside.
pub fn placement_suffix(measurement_id: i64) -> Option<&'static str> {
    match measurement_id {
        4 | 5 => Some(INTERNAL_SUFFIX),
        6 | 7 => Some(EXTERNAL_SUFFIX),
        _ => None,
    }
}

pub fn placement_key(sensor: &str, measurement_id: i64) -> String {
    match placement_suffix(measurement_id) {
        Some(suffix) => format!("{}{}", sensor, suffix),
        None => sensor.to_string(),
    }
}
