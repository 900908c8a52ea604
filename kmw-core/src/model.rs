use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::condition::Condition;

/// One vendor record as delivered: field names mapped to JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, or `None` if it is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Interval length of a forecast point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Hourly,
    ThreeHourly,
}

impl Resolution {
    pub fn duration(self) -> Duration {
        match self {
            Resolution::Hourly => Duration::hours(1),
            Resolution::ThreeHourly => Duration::hours(3),
        }
    }
}

/// The stable attribute set shared by current, hourly and daily data.
///
/// `None` is the "unknown" sentinel: upstream did not supply the field, or
/// supplied it with a type that cannot be read. It is never replaced by zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// °C
    pub temperature: Option<f64>,
    /// °C
    pub apparent_temperature: Option<f64>,
    /// %
    pub precipitation_probability: Option<f64>,
    /// mm
    pub precipitation: Option<f64>,
    /// hPa, mean sea level
    pub pressure: Option<f64>,
    /// %
    pub humidity: Option<f64>,
    /// °C
    pub dew_point: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Degrees, 0 = north.
    pub wind_bearing: Option<f64>,
    pub wind_gust_speed: Option<f64>,
    /// %
    pub cloud_coverage: Option<f64>,
    /// %, per layer. Forecast only.
    pub cloud_coverage_low: Option<f64>,
    pub cloud_coverage_medium: Option<f64>,
    pub cloud_coverage_high: Option<f64>,
    pub sun_hours: Option<f64>,
    /// W/m²
    pub global_radiation: Option<f64>,
    /// mm, accumulated over the trailing window.
    pub precipitation_6h: Option<f64>,
    pub precipitation_12h: Option<f64>,
    pub precipitation_24h: Option<f64>,
    /// mm, accumulated since the start of the forecast run.
    pub precipitation_total: Option<f64>,
    pub snow_amount: Option<f64>,
    pub snow_height: Option<f64>,
    pub wmo_code: Option<i64>,
    pub condition: Option<Condition>,
    /// Vendor symbol the condition was derived from, kept even when unmapped.
    pub weather_symbol: Option<String>,
}

impl Attributes {
    /// True when no attribute is known.
    pub fn is_unknown(&self) -> bool {
        *self == Attributes::default()
    }
}

/// One interval of the merged hourly forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// Interval start.
    pub start: DateTime<Utc>,
    pub resolution: Resolution,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl HourlyPoint {
    pub fn duration(&self) -> Duration {
        self.resolution.duration()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration()
    }
}

/// Instantaneous conditions from the dedicated current-conditions resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observed_at: Option<DateTime<Utc>>,
    pub is_day: Option<bool>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl CurrentConditions {
    /// Current conditions cover no interval.
    pub fn duration(&self) -> Duration {
        Duration::zero()
    }

    pub fn has_data(&self) -> bool {
        self.observed_at.is_some() || self.is_day.is_some() || !self.attributes.is_unknown()
    }
}

/// A weather risk flagged by the vendor for a day, passed through as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// One calendar day of the daily forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Probability of at least 10 mm, in %.
    pub precipitation_probability_10mm: Option<f64>,
    pub risks: Vec<Risk>,
    /// `precipitation` is the daily sum; `precipitation_probability` is for at least 1 mm.
    #[serde(flatten)]
    pub attributes: Attributes,
}
