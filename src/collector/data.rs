use serde::Serialize;

use crate::decode::{Feed, NormalizedReading};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordData {
    pub values: Vec<NormalizedReading>, // pollutant readings first, then environmental
    pub datetime: String,               // UTC, from the last pollutant sample
}

/// Envelope handed to the host: `{"entity": ..., "data": {"values": [...], "datetime": ...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub entity: String,
    pub data: RecordData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completeness {
    Complete,
    Partial { missing: Feed, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub record: OutputRecord,
    pub completeness: Completeness,
}

impl Evaluation {
    pub fn is_complete(&self) -> bool {
        self.completeness == Completeness::Complete
    }
}
