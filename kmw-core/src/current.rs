use chrono::Utc;

use crate::{
    mapper::map_record,
    model::{CurrentConditions, RawRecord},
    provider::Resource,
};

/// Build current conditions from the current-conditions record alone.
///
/// Precipitation comes only from that record's own 1-hour precipitation
/// field. If the field is absent it stays unknown; it is never filled in from
/// forecast data.
pub fn resolve_current(record: &RawRecord) -> CurrentConditions {
    let mapped = map_record(record, Resource::Current);

    CurrentConditions {
        observed_at: mapped.timestamp.map(|t| t.with_timezone(&Utc)),
        is_day: mapped.is_day,
        attributes: mapped.attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use serde_json::json;

    #[test]
    fn precipitation_comes_from_the_current_field() {
        let record = RawRecord::from_value(json!({
            "temp": { "value": 5.0 },
            "prec1h": { "value": 2.5, "unit": "mm" },
            "precCurrent": 0.0
        }))
        .unwrap();

        let current = resolve_current(&record);

        assert_eq!(current.attributes.precipitation, Some(2.5));
    }

    #[test]
    fn missing_precipitation_is_unknown() {
        let record = RawRecord::from_value(json!({ "temp": { "value": 5.0 } })).unwrap();

        let current = resolve_current(&record);

        assert_eq!(current.attributes.precipitation, None);
        assert_eq!(current.attributes.temperature, Some(5.0));
        assert!(current.has_data());
    }

    #[test]
    fn resolves_full_record() {
        let record = RawRecord::from_value(json!({
            "dateTime": "2026-02-05T09:50:00Z",
            "temp": { "value": -1.5, "unit": "degC" },
            "dewpoint": { "value": -3.0 },
            "humidityRelative": { "value": 86 },
            "pressureMsl": { "value": 1021.3 },
            "windSpeed": { "value": 3.2 },
            "windDirection": { "value": 90 },
            "weatherSymbol": { "value": "fog" },
            "wmoCode": { "value": 45 },
            "isDay": { "value": 1 }
        }))
        .unwrap();

        let current = resolve_current(&record);

        assert!(current.observed_at.is_some());
        assert_eq!(current.is_day, Some(true));
        assert_eq!(current.attributes.dew_point, Some(-3.0));
        assert_eq!(current.attributes.humidity, Some(86.0));
        assert_eq!(current.attributes.pressure, Some(1021.3));
        assert_eq!(current.attributes.condition, Some(Condition::Fog));
        assert_eq!(current.attributes.wmo_code, Some(45));
    }

    #[test]
    fn empty_record_has_no_data() {
        assert!(!resolve_current(&RawRecord::default()).has_data());
    }
}
