//! Sensor code to output field mapping.
//!
//! The mapping configuration is a JSON object of groups, each group mapping
//! sensor codes to `{"field": ..., "multiplier": ...}`. Groups only exist to
//! keep the configuration readable; they are flattened into one table.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_MULTIPLIER: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub field: String,
    pub multiplier: f64,
}

impl MappingEntry {
    pub fn scale(&self, amount: f64) -> f64 {
        amount * self.multiplier
    }
}

/// Flat lookup from (possibly suffixed) sensor code to its mapping entry.
/// Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, MappingEntry>,
}

impl MappingTable {
    /// Build the table from the JSON mapping configuration.
    ///
    /// Entries without a `field` are dropped. A sensor code declared in more
    /// than one group is rejected, since group iteration order is not
    /// something a configuration author can rely on.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let Entries(groups): Entries<Entries<Value>> =
            serde_json::from_str(text).map_err(ConfigError::Mappings)?;

        let mut entries = HashMap::new();
        let mut seen_groups = HashSet::new();
        let mut owners: HashMap<String, String> = HashMap::new();

        for (group, Entries(sensors)) in &groups {
            if !seen_groups.insert(group.as_str()) {
                return Err(ConfigError::DuplicateGroup { group: group.clone() });
            }

            for (sensor, info) in sensors {
                if let Some(first) = owners.insert(sensor.clone(), group.clone()) {
                    return Err(ConfigError::DuplicateSensor {
                        sensor: sensor.clone(),
                        first,
                        second: group.clone(),
                    });
                }

                let info = info.as_object().ok_or_else(|| ConfigError::EntryNotObject {
                    group: group.clone(),
                    sensor: sensor.clone(),
                })?;

                match parse_entry(sensor, info)? {
                    Some(entry) => {
                        entries.insert(sensor.clone(), entry);
                    }
                    None => debug!("Sensor {} in group {} has no field, skipping", sensor, group),
                }
            }
        }

        info!(
            "Built mapping table with {} entries from {} groups",
            entries.len(),
            groups.len()
        );
        Ok(MappingTable { entries })
    }

    pub fn get(&self, sensor: &str) -> Option<&MappingEntry> {
        self.entries.get(sensor)
    }

    pub fn contains(&self, sensor: &str) -> bool {
        self.entries.contains_key(sensor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// JSON object read as ordered key/value pairs, keeping repeated keys that
/// `serde_json::Map` would collapse.
struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

fn parse_entry(
    sensor: &str,
    info: &Map<String, Value>,
) -> Result<Option<MappingEntry>, ConfigError> {
    let field = match info.get("field") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(field)) => field.clone(),
        Some(_) => {
            return Err(ConfigError::FieldNotString { sensor: sensor.to_string() });
        }
    };

    let multiplier = match info.get("multiplier") {
        None | Some(Value::Null) => DEFAULT_MULTIPLIER,
        Some(value) => value
            .as_f64()
            .filter(|m| m.is_finite())
            .ok_or_else(|| ConfigError::InvalidMultiplier { sensor: sensor.to_string() })?,
    };

    Ok(Some(MappingEntry { field, multiplier }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_group() {
        let table =
            MappingTable::from_json(r#"{"group1": {"O3": {"field": "ozone", "multiplier": 2.0}}}"#)
                .unwrap();
        assert_eq!(table.len(), 1);
        let entry = table.get("O3").unwrap();
        assert_eq!(entry.field, "ozone");
        assert_eq!(entry.multiplier, 2.0);
        assert_eq!(entry.scale(1.5), 3.0);
    }

    #[test]
    fn test_groups_are_flattened() {
        let table = MappingTable::from_json(
            r#"{
                "gases": {"O3": {"field": "ozone"}, "NO2": {"field": "no2", "multiplier": 1000}},
                "climate": {
                    "TEMP(internal)": {"field": "temp_in"},
                    "TEMP(external)": {"field": "temp_out"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get("NO2").unwrap().multiplier, 1000.0);
        assert!(table.contains("TEMP(internal)"));
        assert!(table.contains("TEMP(external)"));
        assert!(!table.contains("TEMP"));
    }

    #[test]
    fn test_missing_field_dropped() {
        let table = MappingTable::from_json(
            r#"{"g": {"H2S": {"multiplier": 3.0}, "SO2": {"field": "so2"}}}"#,
        )
        .unwrap();
        assert!(!table.contains("H2S"));
        assert_eq!(table.get("SO2").unwrap().multiplier, DEFAULT_MULTIPLIER);
    }

    #[test]
    fn test_multiplier_read_exactly() {
        let table = MappingTable::from_json(
            r#"{"g": {"PM10": {"field": "pm10", "multiplier": 502543.28876136884}}}"#,
        )
        .unwrap();
        assert_eq!(table.get("PM10").unwrap().multiplier, 502543.28876136884_f64);
    }

    #[test]
    fn test_null_field_dropped() {
        let table = MappingTable::from_json(r#"{"g": {"H2S": {"field": null}}}"#).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_config() {
        assert!(MappingTable::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = MappingTable::from_json(r#"{"g": {"O3": "#).unwrap_err();
        assert!(matches!(err, ConfigError::Mappings(_)));

        let err = MappingTable::from_json("[]").unwrap_err();
        assert!(matches!(err, ConfigError::Mappings(_)));
    }

    #[test]
    fn test_group_must_be_object() {
        let err = MappingTable::from_json(r#"{"g": ["O3"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Mappings(_)));
    }

    #[test]
    fn test_repeated_group_rejected() {
        let err = MappingTable::from_json(
            r#"{"gases": {"O3": {"field": "ozone"}}, "gases": {"NO2": {"field": "no2"}}}"#,
        )
        .unwrap_err();
        match err {
            ConfigError::DuplicateGroup { group } => assert_eq!(group, "gases"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeated_sensor_within_group_rejected() {
        let err = MappingTable::from_json(
            r#"{"gases": {"O3": {"field": "ozone"}, "O3": {"field": "ozone_ppb"}}}"#,
        )
        .unwrap_err();
        match err {
            ConfigError::DuplicateSensor { sensor, first, second } => {
                assert_eq!(sensor, "O3");
                assert_eq!(first, "gases");
                assert_eq!(second, "gases");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_entry_must_be_object() {
        let err = MappingTable::from_json(r#"{"g": {"O3": "ozone"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::EntryNotObject { .. }));
    }

    #[test]
    fn test_bad_types_rejected() {
        let err = MappingTable::from_json(r#"{"g": {"O3": {"field": 7}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::FieldNotString { .. }));

        let err = MappingTable::from_json(r#"{"g": {"O3": {"field": "ozone", "multiplier": "2"}}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMultiplier { .. }));
    }

    #[test]
    fn test_duplicate_sensor_across_groups_rejected() {
        let err = MappingTable::from_json(
            r#"{"a": {"O3": {"field": "ozone"}}, "b": {"O3": {"field": "ozone_ppb"}}}"#,
        )
        .unwrap_err();
        match err {
            ConfigError::DuplicateSensor { sensor, first, second } => {
                assert_eq!(sensor, "O3");
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn entry_strategy() -> impl Strategy<Value = (Option<String>, Option<f64>)> {
        (
            proptest::option::of("[a-z_]{1,12}"),
            proptest::option::of(-1.0e6f64..1.0e6),
        )
    }

    proptest! {
        #[test]
        fn prop_fieldless_entries_never_present_and_multiplier_defaults(
            entries in proptest::collection::btree_map("[A-Z0-9]{1,6}", entry_strategy(), 0..16)
        ) {
            let mut group = Map::new();
            for (sensor, (field, multiplier)) in &entries {
                let mut info = Map::new();
                if let Some(field) = field {
                    info.insert("field".into(), Value::from(field.clone()));
                }
                if let Some(multiplier) = multiplier {
                    info.insert("multiplier".into(), Value::from(*multiplier));
                }
                group.insert(sensor.clone(), Value::Object(info));
            }
            let config = serde_json::json!({ "group": group }).to_string();
            let table = MappingTable::from_json(&config).unwrap();

            for (sensor, (field, multiplier)) in &entries {
                match field {
                    None => prop_assert!(!table.contains(sensor)),
                    Some(field) => {
                        let entry = table.get(sensor).unwrap();
                        prop_assert_eq!(&entry.field, field);
                        prop_assert_eq!(entry.multiplier, multiplier.unwrap_or(DEFAULT_MULTIPLIER));
                    }
                }
            }
        }
    }
}
