//! Environmental feed: `{"items": [[amount, timestamp, id, sensor], ...]}`.
//!
//! The same sensor code is reported for the probes inside and outside the
//! enclosure, so the measurement id picks the placement suffix before lookup.

use serde::Deserialize;
use tracing::debug;

use super::sample::{placement_key, RawSample};
use super::{DecodedFeed, Feed};
use crate::error::DecodeError;
use crate::mapping::MappingTable;

#[derive(Debug, Deserialize)]
struct EnvironmentalBody {
    items: Vec<RawSample>,
}

pub fn decode(body: &str, table: &MappingTable) -> Result<DecodedFeed, DecodeError> {
    let feed = Feed::Environmental;
    let body: EnvironmentalBody =
        serde_json::from_str(body).map_err(|source| DecodeError::Shape { feed, source })?;

    let mut decoded = DecodedFeed::default();
    for (index, sample) in body.items.into_iter().enumerate() {
        let sensor = placement_key(sample.sensor(), sample.measurement_id());
        decoded.push(feed, index, sensor, sample, table)?;
    }

    debug!("Decoded {} environmental readings", decoded.readings.len());
    Ok(decoded)
}
