use crate::{Config, RawRecord, error::FetchError, provider::kachelmann::KachelmannSource};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod kachelmann;

/// The vendor resources the normalizer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Current,
    /// Fine-grained forecast, 1-hour intervals.
    Hourly,
    /// Coarse-grained forecast, 3-hour intervals.
    ThreeHourly,
    Daily,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Current => "current",
            Resource::Hourly => "hourly",
            Resource::ThreeHourly => "three_hourly",
            Resource::Daily => "daily",
        }
    }

    pub const fn all() -> &'static [Resource] {
        &[
            Resource::Current,
            Resource::Hourly,
            Resource::ThreeHourly,
            Resource::Daily,
        ]
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Resource {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        Resource::all()
            .iter()
            .copied()
            .find(|resource| resource.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown resource '{value}'. \
                     Supported resources: current, hourly, three_hourly, daily."
                )
            })
    }
}

/// Fetch adapter: delivers raw vendor records, or fails with a transport/auth error.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch_current(&self) -> Result<RawRecord, FetchError>;

    async fn fetch_hourly(&self) -> Result<Vec<RawRecord>, FetchError>;

    async fn fetch_three_hourly(&self) -> Result<Vec<RawRecord>, FetchError>;

    async fn fetch_daily(&self) -> Result<Vec<RawRecord>, FetchError>;
}

/// Construct the HTTP source from a validated config.
pub fn source_from_config(config: &Config) -> anyhow::Result<KachelmannSource> {
    config.validate()?;

    let api_key = config.api_key()?;
    let (latitude, longitude) = config.coordinates()?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let mut source =
        KachelmannSource::new(api_key.to_owned(), latitude, longitude).with_http_client(http);
    if let Some(base_url) = &config.base_url {
        source = source.with_base_url(base_url);
    }

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn resource_as_str_roundtrip() {
        for resource in Resource::all() {
            let parsed = Resource::try_from(resource.as_str()).expect("roundtrip should succeed");
            assert_eq!(*resource, parsed);
        }
    }

    #[test]
    fn unknown_resource_error() {
        let err = Resource::try_from("minutely").unwrap_err();
        assert!(err.to_string().contains("Unknown resource"));
    }

    #[test]
    fn source_from_config_errors_when_missing_api_key() {
        let mut cfg = Config::default();
        cfg.latitude = Some(47.37);
        cfg.longitude = Some(8.54);

        let err = source_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn source_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_credentials("KEY".to_string(), 47.37, 8.54);

        assert!(source_from_config(&cfg).is_ok());
    }
}
