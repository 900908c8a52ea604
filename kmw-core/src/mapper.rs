//! Field mapping from vendor records onto the stable attribute schema.
//!
//! Each resource has its own table of `(source key, transform, target)`
//! entries. Mapping is pure and total: a missing key, a `null`, or a value of
//! the wrong type leaves the target at its unknown sentinel. Values are never
//! range-checked here.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::{
    condition::Condition,
    model::{Attributes, RawRecord, Risk},
    provider::Resource,
};

/// Turns a raw vendor value into the scalar the target expects.
pub type Transform = fn(&Value) -> Option<Value>;

/// Normalized attribute a table entry writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Timestamp,
    Temperature,
    ApparentTemperature,
    TemperatureMax,
    TemperatureMin,
    PrecipitationProbability,
    PrecipitationProbability10mm,
    Precipitation,
    Pressure,
    Humidity,
    DewPoint,
    WindSpeed,
    WindBearing,
    WindGustSpeed,
    CloudCoverage,
    CloudCoverageLow,
    CloudCoverageMedium,
    CloudCoverageHigh,
    SunHours,
    GlobalRadiation,
    Precipitation6h,
    Precipitation12h,
    Precipitation24h,
    PrecipitationTotal,
    SnowAmount,
    SnowHeight,
    WmoCode,
    WeatherSymbol,
    IsDay,
    Sunrise,
    Sunset,
    Risks,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub source: &'static str,
    pub transform: Transform,
    pub target: Target,
}

const fn field(source: &'static str, transform: Transform, target: Target) -> FieldMapping {
    FieldMapping {
        source,
        transform,
        target,
    }
}

/// Forecast values arrive as bare scalars.
fn plain(value: &Value) -> Option<Value> {
    (!value.is_null()).then(|| value.clone())
}

/// Current-conditions values arrive as `{"value": ..., "unit": ...}`.
fn measured(value: &Value) -> Option<Value> {
    value.get("value").and_then(plain)
}

/// Cloud cover in eighths (oktas) to percent.
fn eighths_to_percent(value: &Value) -> Option<Value> {
    value.as_f64().map(|eighths| Value::from(eighths * 12.5))
}

const CURRENT_FIELDS: &[FieldMapping] = &[
    field("dateTime", plain, Target::Timestamp),
    field("temp", measured, Target::Temperature),
    field("feelsLike", measured, Target::ApparentTemperature),
    field("prec1h", measured, Target::Precipitation),
    field("pressureMsl", measured, Target::Pressure),
    field("humidityRelative", measured, Target::Humidity),
    field("dewpoint", measured, Target::DewPoint),
    field("windSpeed", measured, Target::WindSpeed),
    field("windDirection", measured, Target::WindBearing),
    field("windGust", measured, Target::WindGustSpeed),
    field("cloudCoverage", measured, Target::CloudCoverage),
    field("sunHours", measured, Target::SunHours),
    field("snowAmount", measured, Target::SnowAmount),
    field("snowHeight", measured, Target::SnowHeight),
    field("wmoCode", measured, Target::WmoCode),
    field("weatherSymbol", measured, Target::WeatherSymbol),
    field("isDay", measured, Target::IsDay),
];

const HOURLY_FIELDS: &[FieldMapping] = &[
    field("dateTime", plain, Target::Timestamp),
    field("temp", plain, Target::Temperature),
    field("feelsLike", plain, Target::ApparentTemperature),
    field("precCurrent", plain, Target::Precipitation),
    field("pressureMsl", plain, Target::Pressure),
    field("humidityRelative", plain, Target::Humidity),
    field("dewpoint", plain, Target::DewPoint),
    field("windSpeed", plain, Target::WindSpeed),
    field("windDirection", plain, Target::WindBearing),
    field("windGust", plain, Target::WindGustSpeed),
    field("cloudCoverage", plain, Target::CloudCoverage),
    field("cloudCoverageLow", plain, Target::CloudCoverageLow),
    field("cloudCoverageMedium", plain, Target::CloudCoverageMedium),
    field("cloudCoverageHigh", plain, Target::CloudCoverageHigh),
    field("sunHours", plain, Target::SunHours),
    field("globalRadiation", plain, Target::GlobalRadiation),
    field("prec6h", plain, Target::Precipitation6h),
    field("prec12h", plain, Target::Precipitation12h),
    field("prec24h", plain, Target::Precipitation24h),
    field("precTotal", plain, Target::PrecipitationTotal),
    field("snowAmount", plain, Target::SnowAmount),
    field("snowHeight", plain, Target::SnowHeight),
    field("wmoCode", plain, Target::WmoCode),
    field("weatherSymbol", plain, Target::WeatherSymbol),
];

// No dew point, apparent temperature or snow height at 3h resolution, but it
// carries a precipitation probability the 1h resource lacks.
const THREE_HOURLY_FIELDS: &[FieldMapping] = &[
    field("dateTime", plain, Target::Timestamp),
    field("temp", plain, Target::Temperature),
    field("prec3h", plain, Target::Precipitation),
    field("precProb1mm", plain, Target::PrecipitationProbability),
    field("pressureMsl", plain, Target::Pressure),
    field("humidityRelative", plain, Target::Humidity),
    field("windSpeed", plain, Target::WindSpeed),
    field("windDirection", plain, Target::WindBearing),
    field("windGust", plain, Target::WindGustSpeed),
    field("cloudCoverage", plain, Target::CloudCoverage),
    field("sunHours", plain, Target::SunHours),
    field("snowAmount", plain, Target::SnowAmount),
    field("wmoCode", plain, Target::WmoCode),
    field("weatherSymbol", plain, Target::WeatherSymbol),
];

const DAILY_FIELDS: &[FieldMapping] = &[
    field("dateTime", plain, Target::Timestamp),
    field("tempMax", plain, Target::TemperatureMax),
    field("tempMin", plain, Target::TemperatureMin),
    field("prec", plain, Target::Precipitation),
    field("precProb1mm", plain, Target::PrecipitationProbability),
    field("precProb10mm", plain, Target::PrecipitationProbability10mm),
    field("windGust", plain, Target::WindGustSpeed),
    field("windDirection", plain, Target::WindBearing),
    field("cloudCoverageEighths", eighths_to_percent, Target::CloudCoverage),
    field("sunHours", plain, Target::SunHours),
    field("weatherSymbol", plain, Target::WeatherSymbol),
    field("sunrise", plain, Target::Sunrise),
    field("sunset", plain, Target::Sunset),
    field("risks", plain, Target::Risks),
];

pub fn table(resource: Resource) -> &'static [FieldMapping] {
    match resource {
        Resource::Current => CURRENT_FIELDS,
        Resource::Hourly => HOURLY_FIELDS,
        Resource::ThreeHourly => THREE_HOURLY_FIELDS,
        Resource::Daily => DAILY_FIELDS,
    }
}

/// Everything a table can populate. Builders pick what their point type needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRecord {
    /// Keeps the vendor's UTC offset so daily records resolve to their local date.
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub attributes: Attributes,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation_probability_10mm: Option<f64>,
    pub is_day: Option<bool>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub risks: Vec<Risk>,
}

impl MappedRecord {
    fn assign(&mut self, target: Target, value: &Value) {
        let attrs = &mut self.attributes;

        match target {
            Target::Timestamp => self.timestamp = parse_timestamp(value),
            Target::Temperature => attrs.temperature = value.as_f64(),
            Target::ApparentTemperature => attrs.apparent_temperature = value.as_f64(),
            Target::TemperatureMax => self.temperature_max = value.as_f64(),
            Target::TemperatureMin => self.temperature_min = value.as_f64(),
            Target::PrecipitationProbability => attrs.precipitation_probability = value.as_f64(),
            Target::PrecipitationProbability10mm => {
                self.precipitation_probability_10mm = value.as_f64()
            }
            Target::Precipitation => attrs.precipitation = value.as_f64(),
            Target::Pressure => attrs.pressure = value.as_f64(),
            Target::Humidity => attrs.humidity = value.as_f64(),
            Target::DewPoint => attrs.dew_point = value.as_f64(),
            Target::WindSpeed => attrs.wind_speed = value.as_f64(),
            Target::WindBearing => attrs.wind_bearing = value.as_f64(),
            Target::WindGustSpeed => attrs.wind_gust_speed = value.as_f64(),
            Target::CloudCoverage => attrs.cloud_coverage = value.as_f64(),
            Target::CloudCoverageLow => attrs.cloud_coverage_low = value.as_f64(),
            Target::CloudCoverageMedium => attrs.cloud_coverage_medium = value.as_f64(),
            Target::CloudCoverageHigh => attrs.cloud_coverage_high = value.as_f64(),
            Target::SunHours => attrs.sun_hours = value.as_f64(),
            Target::GlobalRadiation => attrs.global_radiation = value.as_f64(),
            Target::Precipitation6h => attrs.precipitation_6h = value.as_f64(),
            Target::Precipitation12h => attrs.precipitation_12h = value.as_f64(),
            Target::Precipitation24h => attrs.precipitation_24h = value.as_f64(),
            Target::PrecipitationTotal => attrs.precipitation_total = value.as_f64(),
            Target::SnowAmount => attrs.snow_amount = value.as_f64(),
            Target::SnowHeight => attrs.snow_height = value.as_f64(),
            Target::WmoCode => attrs.wmo_code = as_integer(value),
            Target::WeatherSymbol => {
                if let Some(symbol) = value.as_str() {
                    attrs.condition = Condition::from_symbol(symbol);
                    attrs.weather_symbol = Some(symbol.to_owned());
                }
            }
            Target::IsDay => self.is_day = as_flag(value),
            Target::Sunrise => self.sunrise = parse_timestamp(value).map(|t| t.with_timezone(&Utc)),
            Target::Sunset => self.sunset = parse_timestamp(value).map(|t| t.with_timezone(&Utc)),
            Target::Risks => self.risks = parse_risks(value),
        }
    }
}

/// Map one raw record through the table for `resource`.
pub fn map_record(record: &RawRecord, resource: Resource) -> MappedRecord {
    let mut mapped = MappedRecord::default();

    for mapping in table(resource) {
        if let Some(value) = record.get(mapping.source).and_then(mapping.transform) {
            mapped.assign(mapping.target, &value);
        }
    }

    mapped
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC), a bare
/// date (midnight UTC) or Unix seconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<FixedOffset>> {
    let utc = FixedOffset::east_opt(0)?;

    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                        .ok()
                        .map(|naive| naive.and_utc().with_timezone(&utc))
                })
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .map(|naive| naive.and_utc().with_timezone(&utc))
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|t| t.with_timezone(&utc)),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn parse_risks(value: &Value) -> Vec<Risk> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).expect("test record must be an object")
    }

    #[test]
    fn hourly_record_maps_known_fields() {
        let raw = record(json!({
            "dateTime": "2026-02-05T10:00:00Z",
            "temp": 3.4,
            "dewpoint": -1.2,
            "precCurrent": 0.3,
            "windSpeed": 12,
            "windDirection": 250,
            "weatherSymbol": "rain_light",
            "wmoCode": 61
        }));

        let mapped = map_record(&raw, Resource::Hourly);

        assert_eq!(
            mapped.timestamp.map(|t| t.with_timezone(&Utc)),
            Some(Utc.with_ymd_and_hms(2026, 2, 5, 10, 0, 0).unwrap())
        );
        assert_eq!(mapped.attributes.temperature, Some(3.4));
        assert_eq!(mapped.attributes.dew_point, Some(-1.2));
        assert_eq!(mapped.attributes.precipitation, Some(0.3));
        assert_eq!(mapped.attributes.wind_speed, Some(12.0));
        assert_eq!(mapped.attributes.wind_bearing, Some(250.0));
        assert_eq!(mapped.attributes.condition, Some(Condition::Rainy));
        assert_eq!(mapped.attributes.wmo_code, Some(61));
        assert_eq!(mapped.attributes.precipitation_probability, None);
    }

    #[test]
    fn missing_dewpoint_is_unknown_not_zero() {
        let raw = record(json!({ "dateTime": "2026-02-05T10:00:00Z", "temp": 3.4 }));
        let mapped = map_record(&raw, Resource::Hourly);

        assert_eq!(mapped.attributes.dew_point, None);
        assert_eq!(mapped.attributes.precipitation, None);
    }

    #[test]
    fn null_and_wrong_type_values_are_unknown() {
        let raw = record(json!({
            "dateTime": "2026-02-05T10:00:00Z",
            "temp": null,
            "humidityRelative": "very",
            "weatherSymbol": 17
        }));
        let mapped = map_record(&raw, Resource::Hourly);

        assert_eq!(mapped.attributes.temperature, None);
        assert_eq!(mapped.attributes.humidity, None);
        assert_eq!(mapped.attributes.weather_symbol, None);
        assert_eq!(mapped.attributes.condition, None);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let raw = record(json!({ "dateTime": "2026-02-05T10:00:00Z", "humidityRelative": -5 }));
        let mapped = map_record(&raw, Resource::Hourly);

        assert_eq!(mapped.attributes.humidity, Some(-5.0));
    }

    #[test]
    fn mapping_is_idempotent() {
        let raw = record(json!({
            "dateTime": "2026-02-05T10:00:00Z",
            "temp": 3.4,
            "weatherSymbol": "snowrain"
        }));

        assert_eq!(map_record(&raw, Resource::Hourly), map_record(&raw, Resource::Hourly));
    }

    #[test]
    fn unmapped_symbol_keeps_raw_symbol() {
        let raw = record(json!({ "weatherSymbol": "sandstorm" }));
        let mapped = map_record(&raw, Resource::ThreeHourly);

        assert_eq!(mapped.attributes.condition, None);
        assert_eq!(mapped.attributes.weather_symbol.as_deref(), Some("sandstorm"));
    }

    #[test]
    fn hourly_record_maps_layered_cloud_radiation_and_accumulations() {
        let raw = record(json!({
            "dateTime": "2026-02-05T10:00:00Z",
            "cloudCoverageLow": 80,
            "cloudCoverageMedium": 40.5,
            "cloudCoverageHigh": 0,
            "globalRadiation": 312.0,
            "prec6h": 1.2,
            "prec12h": 2.4,
            "prec24h": 5.0,
            "precTotal": 7.5
        }));

        let attrs = map_record(&raw, Resource::Hourly).attributes;

        assert_eq!(attrs.cloud_coverage_low, Some(80.0));
        assert_eq!(attrs.cloud_coverage_medium, Some(40.5));
        assert_eq!(attrs.cloud_coverage_high, Some(0.0));
        assert_eq!(attrs.global_radiation, Some(312.0));
        assert_eq!(attrs.precipitation_6h, Some(1.2));
        assert_eq!(attrs.precipitation_12h, Some(2.4));
        assert_eq!(attrs.precipitation_24h, Some(5.0));
        assert_eq!(attrs.precipitation_total, Some(7.5));
        // the merged value still comes from precCurrent only
        assert_eq!(attrs.precipitation, None);
    }

    #[test]
    fn absent_layered_fields_stay_unknown() {
        let raw = record(json!({ "dateTime": "2026-02-05T10:00:00Z", "temp": 2.0 }));
        let attrs = map_record(&raw, Resource::Hourly).attributes;

        assert_eq!(attrs.cloud_coverage_low, None);
        assert_eq!(attrs.cloud_coverage_medium, None);
        assert_eq!(attrs.cloud_coverage_high, None);
        assert_eq!(attrs.global_radiation, None);
        assert_eq!(attrs.precipitation_6h, None);
        assert_eq!(attrs.precipitation_12h, None);
        assert_eq!(attrs.precipitation_24h, None);
        assert_eq!(attrs.precipitation_total, None);
    }

    #[test]
    fn tables_differ_between_resolutions() {
        let raw = record(json!({
            "dateTime": "2026-02-05T12:00:00Z",
            "dewpoint": 1.0,
            "precProb1mm": 40,
            "prec3h": 1.5,
            "precCurrent": 0.2
        }));

        let fine = map_record(&raw, Resource::Hourly);
        assert_eq!(fine.attributes.dew_point, Some(1.0));
        assert_eq!(fine.attributes.precipitation_probability, None);
        assert_eq!(fine.attributes.precipitation, Some(0.2));

        let coarse = map_record(&raw, Resource::ThreeHourly);
        assert_eq!(coarse.attributes.dew_point, None);
        assert_eq!(coarse.attributes.precipitation_probability, Some(40.0));
        assert_eq!(coarse.attributes.precipitation, Some(1.5));
    }

    #[test]
    fn current_record_unwraps_measured_values() {
        let raw = record(json!({
            "dateTime": "2026-02-05T10:20:00Z",
            "temp": { "value": 4.1, "unit": "degC" },
            "prec1h": { "value": 2.5, "unit": "mm" },
            "isDay": { "value": true },
            "windGust": 30.0
        }));

        let mapped = map_record(&raw, Resource::Current);

        assert_eq!(mapped.attributes.temperature, Some(4.1));
        assert_eq!(mapped.attributes.precipitation, Some(2.5));
        assert_eq!(mapped.is_day, Some(true));
        // a bare scalar is not the shape this resource delivers
        assert_eq!(mapped.attributes.wind_gust_speed, None);
    }

    #[test]
    fn daily_record_maps_extremes_and_risks() {
        let raw = record(json!({
            "dateTime": "2026-02-05",
            "tempMax": 7.5,
            "tempMin": -2.0,
            "prec": 4.2,
            "precProb10mm": 5,
            "cloudCoverageEighths": 6,
            "sunrise": "2026-02-05T07:31:00+01:00",
            "risks": [{ "type": "frost", "level": 2 }, "bogus"]
        }));

        let mapped = map_record(&raw, Resource::Daily);

        assert_eq!(mapped.temperature_max, Some(7.5));
        assert_eq!(mapped.temperature_min, Some(-2.0));
        assert_eq!(mapped.attributes.precipitation, Some(4.2));
        assert_eq!(mapped.precipitation_probability_10mm, Some(5.0));
        assert_eq!(mapped.attributes.cloud_coverage, Some(75.0));
        assert_eq!(
            mapped.sunrise,
            Some(Utc.with_ymd_and_hms(2026, 2, 5, 6, 31, 0).unwrap())
        );
        assert_eq!(mapped.sunset, None);
        assert_eq!(mapped.risks.len(), 1);
        assert_eq!(mapped.risks[0].kind.as_deref(), Some("frost"));
        assert_eq!(mapped.risks[0].details.get("level"), Some(&json!(2)));
    }

    #[test]
    fn parse_timestamp_accepts_vendor_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 2, 5, 10, 0, 0).unwrap();
        let as_utc = |v: Value| parse_timestamp(&v).map(|t| t.with_timezone(&Utc));

        assert_eq!(as_utc(json!("2026-02-05T10:00:00.000Z")), Some(expected));
        assert_eq!(as_utc(json!("2026-02-05T11:00:00+01:00")), Some(expected));
        assert_eq!(as_utc(json!("2026-02-05T10:00:00")), Some(expected));
        assert_eq!(as_utc(json!(expected.timestamp())), Some(expected));
        assert_eq!(
            as_utc(json!("2026-02-05")),
            Some(Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(as_utc(json!("yesterday")), None);
        assert_eq!(as_utc(json!(true)), None);
    }
}
