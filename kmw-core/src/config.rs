use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    merge::{DEFAULT_DETAIL_HOURS, MergeOptions},
    refresh::RefreshOptions,
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "KMW_API_KEY";

/// Just over ten minutes, matching the vendor update rate.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 610;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// api_key = "..."
/// latitude = 47.37
/// longitude = 8.54
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Number of 1-hour forecast points before switching to 3-hour steps.
    #[serde(default = "default_hourly_detail_hours")]
    pub hourly_detail_hours: usize,

    /// Fetch hourly and daily forecasts, not only current conditions.
    #[serde(default = "default_forecast")]
    pub forecast: bool,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_hourly_detail_hours() -> usize {
    DEFAULT_DETAIL_HOURS
}

fn default_forecast() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            latitude: None,
            longitude: None,
            poll_interval_secs: default_poll_interval_secs(),
            hourly_detail_hours: default_hourly_detail_hours(),
            forecast: default_forecast(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Returns the API key, if present.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `kmw configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn coordinates(&self) -> Result<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(anyhow!(
                "No location configured.\n\
                 Hint: run `kmw configure` and enter latitude and longitude."
            )),
        }
    }

    /// Check everything a refresh cycle needs before it starts.
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;

        let (lat, lon) = self.coordinates()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            bail!(
                "Invalid coordinates {lat}, {lon}: latitude must be -90..90, longitude -180..180."
            );
        }

        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero.");
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn refresh_options(&self) -> RefreshOptions {
        RefreshOptions {
            forecast: self.forecast,
            merge: MergeOptions {
                max_detail_points: self.hourly_detail_hours,
            },
        }
    }

    /// Convenience helper: set/replace the API key and location.
    pub fn set_credentials(&mut self, api_key: String, latitude: f64, longitude: f64) {
        self.api_key = Some(api_key);
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
    }

    /// A non-empty override replaces the stored key.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    ///
    /// `KMW_API_KEY` takes precedence over the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            // First run: no config file, return empty.
            Self::default()
        };

        Ok(cfg.with_api_key_override(std::env::var(API_KEY_ENV).ok()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "kmw", "kmw")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("kmw configure"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.api_key = Some("   ".into());

        assert!(cfg.api_key().is_err());
    }

    #[test]
    fn set_credentials_makes_config_valid() {
        let mut cfg = Config::default();
        cfg.set_credentials("KEY".into(), 47.37, 8.54);

        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.api_key().unwrap(), "KEY");
        assert_eq!(cfg.coordinates().unwrap(), (47.37, 8.54));
    }

    #[test]
    fn validate_rejects_out_of_range_coordinates() {
        let mut cfg = Config::default();
        cfg.set_credentials("KEY".into(), 120.0, 8.54);

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid coordinates"));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut cfg = Config::default();
        cfg.set_credentials("KEY".into(), 47.37, 8.54);
        cfg.poll_interval_secs = 0;

        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg =
            Config::from_toml("api_key = \"KEY\"\nlatitude = 47.0\nlongitude = 8.0\n").unwrap();

        assert_eq!(cfg.poll_interval_secs, 610);
        assert_eq!(cfg.hourly_detail_hours, 24);
        assert!(cfg.forecast);
        assert_eq!(cfg.timeout_secs, 30);
        assert!(cfg.base_url.is_none());
    }

    #[test]
    fn toml_roundtrip_preserves_settings() {
        let mut cfg = Config::default();
        cfg.set_credentials("KEY".into(), 47.37, 8.54);
        cfg.forecast = false;
        cfg.hourly_detail_hours = 12;

        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml(&text).unwrap();

        assert_eq!(parsed.api_key.as_deref(), Some("KEY"));
        assert!(!parsed.forecast);
        assert_eq!(parsed.refresh_options().merge.max_detail_points, 12);
        assert!(!parsed.refresh_options().forecast);
    }

    #[test]
    fn env_override_replaces_stored_key() {
        let mut cfg = Config::default();
        cfg.api_key = Some("STORED".into());

        let cfg = cfg.with_api_key_override(Some("FROM_ENV".into()));
        assert_eq!(cfg.api_key().unwrap(), "FROM_ENV");

        let cfg = cfg.with_api_key_override(Some(String::new()));
        assert_eq!(cfg.api_key().unwrap(), "FROM_ENV");

        let cfg = cfg.with_api_key_override(None);
        assert_eq!(cfg.api_key().unwrap(), "FROM_ENV");
    }
}
