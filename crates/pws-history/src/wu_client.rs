use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{Map, Value};

/// Settings for the weather.com PWS history API, built once at startup.
#[derive(Clone, Debug)]
pub struct WuConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("WU_API_KEY is not configured")]
    MissingApiKey,
    #[error("WU HTTP {0}")]
    Status(u16),
    #[error("Failed to parse WU response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to reach WU: {0}")]
    Request(reqwest::Error),
}

impl From<reqwest::Error> for Error {
    /// The request URL carries the API key, so it never ends up in the message.
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.without_url())
    }
}

#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    /// Raw history payload for one station on one `YYYYMMDD` day.
    async fn fetch_day(&self, station_id: &str, date: &str) -> Result<Value, Error>;
}

pub struct WuClient {
    client: Client,
    history_url: String,
    api_key: Option<String>,
}

impl WuClient {
    pub fn new(config: &WuConfig) -> Self {
        Self {
            client: Client::new(),
            history_url: format!(
                "{}/v2/pws/history/all",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
        }
    }
}

#[async_trait]
impl HistoryFetcher for WuClient {
    async fn fetch_day(&self, station_id: &str, date: &str) -> Result<Value, Error> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingApiKey)?;

        debug!("requesting WU history for {} on {}", station_id, date);
        let response = self
            .client
            .get(&self.history_url)
            .query(&[
                ("stationId", station_id),
                ("format", "json"),
                ("units", "m"),
                ("date", date),
                ("apiKey", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_body(&body)
    }
}

/// An empty body means "nothing recorded", not a malformed response.
pub fn parse_body(body: &str) -> Result<Value, Error> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_str(body)?)
}
