//! Pollutant feed: `{"items": [[[amount, timestamp, id, sensor], ...], ...]}`.
//!
//! Samples arrive grouped by measurement batch. The measurement id carries no
//! placement information here and is ignored.

use serde::Deserialize;
use tracing::debug;

use super::sample::RawSample;
use super::{DecodedFeed, Feed};
use crate::error::DecodeError;
use crate::mapping::MappingTable;

#[derive(Debug, Deserialize)]
struct PollutantBody {
    items: Vec<Vec<RawSample>>,
}

pub fn decode(body: &str, table: &MappingTable) -> Result<DecodedFeed, DecodeError> {
    let feed = Feed::Pollutant;
    let body: PollutantBody =
        serde_json::from_str(body).map_err(|source| DecodeError::Shape { feed, source })?;

    let mut decoded = DecodedFeed::default();
    let samples = body.items.into_iter().flatten();
    for (index, sample) in samples.enumerate() {
        let sensor = sample.sensor().to_string();
        decoded.push(feed, index, sensor, sample, table)?;
    }

    debug!("Decoded {} pollutant readings", decoded.readings.len());
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MappingTable {
        MappingTable::from_json(
            r#"{"gases": {
                "O3": {"field": "ozone", "multiplier": 2.0},
                "NO2": {"field": "nitrogen_dioxide"},
                "H2S": {"field": "hydrogen_sulfide", "multiplier": 1000}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_single_sample() {
        let decoded =
            decode(r#"{"items": [[[1.5, "2021-01-01T00:00:00.000Z", 0, "O3"]]]}"#, &table())
                .unwrap();
        assert_eq!(
            decoded.readings,
            vec![crate::decode::NormalizedReading { field: "ozone".into(), amount: 3.0 }]
        );
        assert_eq!(decoded.last_timestamp.as_deref(), Some("2021-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_groups_flattened_in_order() {
        let body = r#"{"items": [
            [[1.0, "a", 1, "O3"], [2.0, "b", 1, "NO2"]],
            [],
            [[0.5, "c", 2, "H2S"]]
        ]}"#;
        let decoded = decode(body, &table()).unwrap();
        let fields: Vec<_> = decoded.readings.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, ["ozone", "nitrogen_dioxide", "hydrogen_sulfide"]);
        assert_eq!(decoded.readings[2].amount, 500.0);
        assert_eq!(decoded.last_timestamp.as_deref(), Some("c"));
    }

    #[test]
    fn test_measurement_id_not_used_for_lookup() {
        // id 4 would mean "internal" on the environmental feed
        let decoded = decode(r#"{"items": [[[1.0, "t", 4, "NO2"]]]}"#, &table()).unwrap();
        assert_eq!(decoded.readings[0].field, "nitrogen_dioxide");
    }

    #[test]
    fn test_unmapped_sensor_reports_flat_index() {
        let body = r#"{"items": [[[1.0, "a", 0, "O3"]], [[1.0, "b", 0, "CO"]]]}"#;
        match decode(body, &table()).unwrap_err() {
            DecodeError::UnmappedSensor { feed, index, sensor } => {
                assert_eq!(feed, Feed::Pollutant);
                assert_eq!(index, 1);
                assert_eq!(sensor, "CO");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overflowing_amount_rejected() {
        let table =
            MappingTable::from_json(r#"{"gases": {"O3": {"field": "ozone", "multiplier": 1e300}}}"#)
                .unwrap();
        let body = r#"{"items": [[[1.0, "a", 0, "O3"], [1e300, "1609459200000", 0, "O3"]]]}"#;
        match decode(body, &table).unwrap_err() {
            DecodeError::NonFiniteAmount { feed, index, sensor } => {
                assert_eq!(feed, Feed::Pollutant);
                assert_eq!(index, 1);
                assert_eq!(sensor, "O3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_environmental_shape_rejected() {
        let err = decode(r#"{"items": [[1.0, "a", 0, "O3"]]}"#, &table()).unwrap_err();
        assert!(matches!(err, DecodeError::Shape { feed: Feed::Pollutant, .. }));
    }
}
