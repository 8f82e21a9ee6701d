use thiserror::Error;

use crate::decode::Feed;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed settings: {0}")]
    Settings(#[source] serde_json::Error),

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Request timeout must be at least one second")]
    ZeroTimeout,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Malformed mappings: {0}")]
    Mappings(#[source] serde_json::Error),

    #[error("Mapping group {group} is declared more than once")]
    DuplicateGroup { group: String },

    #[error("Mapping for sensor {sensor} in group {group} is not an object")]
    EntryNotObject { group: String, sensor: String },

    #[error("Field for sensor {sensor} is not a string")]
    FieldNotString { sensor: String },

    #[error("Multiplier for sensor {sensor} is not a finite number")]
    InvalidMultiplier { sensor: String },

    #[error("Sensor {sensor} is mapped in both group {first} and group {second}")]
    DuplicateSensor {
        sensor: String,
        first: String,
        second: String,
    },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{feed} request timed out: {source}")]
    Timeout {
        feed: Feed,
        #[source]
        source: reqwest::Error,
    },

    #[error("{feed} request failed: {source}")]
    Transport {
        feed: Feed,
        #[source]
        source: reqwest::Error,
    },

    #[error("{feed} request returned HTTP {status}")]
    Status { feed: Feed, status: u16 },
}

impl FetchError {
    pub fn feed(&self) -> Feed {
        match self {
            FetchError::Timeout { feed, .. }
            | FetchError::Transport { feed, .. }
            | FetchError::Status { feed, .. } => *feed,
        }
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{feed} response has unexpected shape: {source}")]
    Shape {
        feed: Feed,
        #[source]
        source: serde_json::Error,
    },

    #[error("{feed} sample {index} uses sensor {sensor} which has no mapping")]
    UnmappedSensor {
        feed: Feed,
        index: usize,
        sensor: String,
    },

    #[error("{feed} sample {index} from sensor {sensor} scales to a non-finite amount")]
    NonFiniteAmount {
        feed: Feed,
        index: usize,
        sensor: String,
    },

    #[error("Unrecognised timestamp: {0:?}")]
    Timestamp(String),
}

#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Pollutant feed returned no samples, no record timestamp available")]
    MissingTimestamp,

    #[error("Failed to set output {name}: {reason}")]
    Output { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EvalError>;
