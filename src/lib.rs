//! Collector for Scentroid SL50 air-quality units.
//!
//! Polls the unit's pollutant and environmental feeds, maps device sensor
//! codes to named fields through a configured table and emits one record
//! per evaluation.

pub mod collector;
pub mod decode;
pub mod devices;
pub mod error;
pub mod export;
pub mod mapping;
pub mod settings;
pub mod timestamp;

pub use collector::data::{Completeness, Evaluation, OutputRecord, RecordData};
pub use collector::{Collector, FetchAndNormalize, OutputSink, OUTPUT_NAME};
pub use decode::{Feed, NormalizedReading};
pub use devices::{FeedSource, SL50};
pub use error::{ConfigError, DecodeError, EvalError, FetchError};
pub use mapping::{MappingEntry, MappingTable};
pub use settings::UnitSettings;
