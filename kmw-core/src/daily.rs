use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    mapper::map_record,
    model::{DailyPoint, RawRecord},
    provider::Resource,
};

/// Normalize the daily trend: one point per calendar date, ascending.
///
/// A date supplied twice keeps the later record. The date is taken in the
/// vendor's own UTC offset so a local midnight does not slip to the previous day.
pub fn normalize_daily(records: &[RawRecord]) -> Vec<DailyPoint> {
    let mut by_date: BTreeMap<NaiveDate, DailyPoint> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let mapped = map_record(record, Resource::Daily);

        let Some(date) = mapped.timestamp.map(|t| t.date_naive()) else {
            warn!(index, "dropping daily point without a valid date");
            continue;
        };

        let point = DailyPoint {
            date,
            temperature_max: mapped.temperature_max,
            temperature_min: mapped.temperature_min,
            sunrise: mapped.sunrise,
            sunset: mapped.sunset,
            precipitation_probability_10mm: mapped.precipitation_probability_10mm,
            risks: mapped.risks,
            attributes: mapped.attributes,
        };

        if by_date.insert(date, point).is_some() {
            debug!(%date, "duplicate daily point, keeping the later one");
        }
    }

    by_date.into_values().collect()
}
