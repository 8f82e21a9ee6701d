use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use tracing::{error, info, warn};

use crate::decode::Feed;
use crate::error::{ConfigError, FetchError};

// The unit's API names are crossed: the nested pollutant batches come from
// rpi_get_samples and the flat environmental list from rpi_get_pollutant.
pub const POLLUTANT_ENDPOINT: &str = "/do/api/v1.rpi_get_samples";
pub const ENVIRONMENTAL_ENDPOINT: &str = "/do/api/v1.rpi_get_pollutant";

/// Anything that can hand back the raw JSON body of a feed
pub trait FeedSource: Sync {
    fn fetch(&self, feed: Feed) -> Result<String, FetchError>;
}

/// HTTP connection to a Scentroid SL50 unit
pub struct SL50 {
    client: Client,
    base_url: String,
    serial_number: String,
}

impl SL50 {
    pub fn new(
        base_url: &str,
        serial_number: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        info!("Initializing SL50 {} at {} (timeout {:?})", serial_number, base_url, timeout);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(SL50 {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            serial_number: serial_number.to_string(),
        })
    }

    pub fn url(&self, feed: Feed) -> String {
        let endpoint = match feed {
            Feed::Pollutant => POLLUTANT_ENDPOINT,
            Feed::Environmental => ENVIRONMENTAL_ENDPOINT,
        };
        format!("{}{}", self.base_url, endpoint)
    }
}

impl FeedSource for SL50 {
    fn fetch(&self, feed: Feed) -> Result<String, FetchError> {
        let url = self.url(feed);
        info!("Requesting {} data from {}", feed, url);

        let response = self
            .client
            .get(&url)
            .query(&[("sn", self.serial_number.as_str()), ("latest", "true")])
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| transport_error(feed, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("SL50 answered {} request with HTTP {}", feed, status);
            return Err(FetchError::Status { feed, status: status.as_u16() });
        }

        let body = response.text().map_err(|e| transport_error(feed, e))?;
        info!("Received {} bytes of {} data", body.len(), feed);
        Ok(body)
    }
}

fn transport_error(feed: Feed, source: reqwest::Error) -> FetchError {
    error!("{} request failed: {}", feed, source);
    if source.is_timeout() {
        FetchError::Timeout { feed, source }
    } else {
        FetchError::Transport { feed, source }
    }
}
