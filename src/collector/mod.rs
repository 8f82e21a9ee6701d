pub mod data;

use std::thread;

use tracing::{error, info, warn};

use crate::decode::{environmental, pollutant, DecodedFeed, Feed};
use crate::devices::{FeedSource, SL50};
use crate::error::{ConfigError, EvalError, FetchError, Result};
use crate::mapping::MappingTable;
use crate::settings::UnitSettings;
use crate::timestamp::normalize_utc;
use data::{Completeness, Evaluation, OutputRecord, RecordData};

type FetchResult = std::result::Result<String, FetchError>;

/// Name of the output value handed to the host
pub const OUTPUT_NAME: &str = "connectorMsg";

/// Host-side receiver of the finished envelope
pub trait OutputSink {
    fn set_output(
        &mut self,
        name: &str,
        value: serde_json::Value,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Poll both feeds once and produce a normalized record
pub trait FetchAndNormalize {
    fn evaluate(&self) -> Result<Evaluation>;
}

/// One SL50 unit as seen by the host: a feed source, the mapping table built
/// at construction and the entity the records are tagged with.
pub struct Collector<S: FeedSource = SL50> {
    source: S,
    table: MappingTable,
    entity: String,
    allow_partial: bool,
    parallel_fetch: bool,
}

impl Collector<SL50> {
    pub fn from_settings(settings: &UnitSettings) -> std::result::Result<Self, ConfigError> {
        info!("Creating collector for entity {}", settings.entity);
        settings.validate()?;

        let table = MappingTable::from_json(&settings.mappings)?;
        let source = SL50::new(&settings.base_url(), &settings.serial_number, settings.timeout())?;

        Ok(Collector::new(source, table, settings.entity.clone())
            .allow_partial(settings.allow_partial)
            .parallel_fetch(settings.parallel_fetch))
    }
}

impl<S: FeedSource> Collector<S> {
    pub fn new(source: S, table: MappingTable, entity: impl Into<String>) -> Self {
        Collector {
            source,
            table,
            entity: entity.into(),
            allow_partial: false,
            parallel_fetch: false,
        }
    }

    /// Emit pollutant-only records when the environmental fetch fails
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    pub fn parallel_fetch(mut self, parallel: bool) -> Self {
        self.parallel_fetch = parallel;
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.table
    }

    /// Evaluate once and hand the envelope to the sink
    pub fn eval(&self, sink: &mut dyn OutputSink) -> Result<Evaluation> {
        info!("Evaluating entity {}", self.entity);
        let evaluation = self.evaluate()?;

        let value = serde_json::to_value(&evaluation.record).map_err(|e| EvalError::Output {
            name: OUTPUT_NAME.to_string(),
            reason: e.to_string(),
        })?;
        if let Err(e) = sink.set_output(OUTPUT_NAME, value) {
            error!("Failed to set output {}: {}", OUTPUT_NAME, e);
            return Err(EvalError::Output { name: OUTPUT_NAME.to_string(), reason: e.to_string() });
        }

        info!(
            "Emitted {} readings for {} at {}",
            evaluation.record.data.values.len(),
            self.entity,
            evaluation.record.data.datetime
        );
        Ok(evaluation)
    }

    fn fetch_parallel(&self) -> (FetchResult, FetchResult) {
        thread::scope(|scope| {
            let environmental = scope.spawn(|| self.source.fetch(Feed::Environmental));
            let pollutant = self.source.fetch(Feed::Pollutant);
            let environmental = environmental
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (pollutant, environmental)
        })
    }
}

impl<S: FeedSource> FetchAndNormalize for Collector<S> {
    fn evaluate(&self) -> Result<Evaluation> {
        let (pollutant, environmental_body) = if self.parallel_fetch {
            let (pollutant_body, environmental_body) = self.fetch_parallel();
            (pollutant::decode(&pollutant_body?, &self.table)?, environmental_body)
        } else {
            let pollutant = pollutant::decode(&self.source.fetch(Feed::Pollutant)?, &self.table)?;
            (pollutant, self.source.fetch(Feed::Environmental))
        };

        let (environmental, completeness) = match environmental_body {
            Ok(body) => (environmental::decode(&body, &self.table)?, Completeness::Complete),
            Err(e) if self.allow_partial => {
                warn!("Emitting partial record for {}: {}", self.entity, e);
                let completeness = Completeness::Partial {
                    missing: e.feed(),
                    reason: e.to_string(),
                };
                (DecodedFeed::default(), completeness)
            }
            Err(e) => return Err(e.into()),
        };

        let record = merge(&self.entity, pollutant, environmental)?;
        Ok(Evaluation { record, completeness })
    }
}

/// Pollutant readings first, environmental after. Only the pollutant feed's
/// last timestamp dates the record.
pub fn merge(
    entity: &str,
    pollutant: DecodedFeed,
    environmental: DecodedFeed,
) -> Result<OutputRecord> {
    let raw_time = pollutant.last_timestamp.ok_or(EvalError::MissingTimestamp)?;
    let datetime = normalize_utc(&raw_time)?;

    let mut values = pollutant.readings;
    values.extend(environmental.readings);

    Ok(OutputRecord {
        entity: entity.to_string(),
        data: RecordData { values, datetime },
    })
}
