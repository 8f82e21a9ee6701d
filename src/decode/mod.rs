pub mod environmental;
pub mod pollutant;
pub mod sample;

use std::fmt;

use serde::Serialize;

use crate::error::DecodeError;
use crate::mapping::MappingTable;
use sample::RawSample;

/// The two feeds served by the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Pollutant,
    Environmental,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Pollutant => write!(f, "pollutant"),
            Feed::Environmental => write!(f, "environmental"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedReading {
    pub field: String,
    pub amount: f64,
}

/// Readings decoded from one feed, plus the timestamp of the last sample in
/// feed order (not necessarily the latest one).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFeed {
    pub readings: Vec<NormalizedReading>,
    pub last_timestamp: Option<String>,
}

impl DecodedFeed {
    fn push(
        &mut self,
        feed: Feed,
        index: usize,
        sensor: String,
        sample: RawSample,
        table: &MappingTable,
    ) -> Result<(), DecodeError> {
        let Some(entry) = table.get(&sensor) else {
            return Err(DecodeError::UnmappedSensor { feed, index, sensor });
        };
        let amount = entry.scale(sample.amount());
        if !amount.is_finite() {
            return Err(DecodeError::NonFiniteAmount { feed, index, sensor });
        }
        self.readings.push(NormalizedReading { field: entry.field.clone(), amount });
        self.last_timestamp = Some(sample.into_timestamp());
        Ok(())
    }
}
