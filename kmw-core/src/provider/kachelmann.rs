use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, HeaderName},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{RawRecord, error::FetchError};

use super::{ForecastSource, Resource};

pub const DEFAULT_BASE_URL: &str = "https://api.kachelmannwetter.com/v02";

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// HTTP source for the Kachelmann Wetter API.
#[derive(Debug, Clone)]
pub struct KachelmannSource {
    api_key: String,
    base_url: String,
    latitude: f64,
    longitude: f64,
    http: Client,
}

impl KachelmannSource {
    pub fn new(api_key: String, latitude: f64, longitude: f64) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            latitude,
            longitude,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    fn url(&self, resource: Resource) -> String {
        let (base, lat, lon) = (&self.base_url, self.latitude, self.longitude);

        match resource {
            Resource::Current => format!("{base}/current/{lat}/{lon}"),
            Resource::Hourly => format!("{base}/forecast/{lat}/{lon}/advanced/1h"),
            Resource::ThreeHourly => format!("{base}/forecast/{lat}/{lon}/advanced/3h"),
            Resource::Daily => format!("{base}/forecast/{lat}/{lon}/trend14days"),
        }
    }

    async fn fetch_data(&self, resource: Resource) -> Result<Value, FetchError> {
        let url = self.url(resource);

        let res = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send()
            .await
            .map_err(|source| FetchError::Transport { resource, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Transport { resource, source })?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth {
                resource,
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                resource,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode { resource, source })?;

        debug!(%resource, %url, "fetched resource");

        Ok(envelope.data)
    }

    async fn fetch_list(&self, resource: Resource) -> Result<Vec<RawRecord>, FetchError> {
        let data = self.fetch_data(resource).await?;
        Ok(records_from_data(resource, data))
    }
}

/// Every resource wraps its payload in a `data` member.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Value,
}

fn records_from_data(resource: Resource, data: Value) -> Vec<RawRecord> {
    match data {
        Value::Array(items) => {
            let total = items.len();
            let records: Vec<RawRecord> =
                items.into_iter().filter_map(RawRecord::from_value).collect();

            if records.len() < total {
                warn!(
                    %resource,
                    dropped = total - records.len(),
                    "dropping non-object forecast records"
                );
            }

            records
        }
        Value::Null => Vec::new(),
        other => {
            warn!(%resource, kind = value_kind(&other), "expected a list of records");
            Vec::new()
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl ForecastSource for KachelmannSource {
    async fn fetch_current(&self) -> Result<RawRecord, FetchError> {
        let resource = Resource::Current;
        let data = self.fetch_data(resource).await?;

        match data {
            Value::Object(fields) => Ok(RawRecord::new(fields)),
            Value::Null => Ok(RawRecord::default()),
            other => {
                warn!(%resource, kind = value_kind(&other), "expected a single record");
                Ok(RawRecord::default())
            }
        }
    }

    async fn fetch_hourly(&self) -> Result<Vec<RawRecord>, FetchError> {
        self.fetch_list(Resource::Hourly).await
    }

    async fn fetch_three_hourly(&self) -> Result<Vec<RawRecord>, FetchError> {
        self.fetch_list(Resource::ThreeHourly).await
    }

    async fn fetch_daily(&self) -> Result<Vec<RawRecord>, FetchError> {
        self.fetch_list(Resource::Daily).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
