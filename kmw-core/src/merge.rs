//! Merges the 1-hour and 3-hour forecasts into one gap-free series.
//!
//! The result is 1-hour detail up to the merge boundary, then 3-hour steps.
//! The boundary is where the fine series actually ends (capped at
//! `max_detail_points`), moved back to the nearest 3-hour start the coarse
//! series offers so the two halves join without a gap or an overlap.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    mapper::map_record,
    model::{HourlyPoint, RawRecord, Resolution},
    provider::Resource,
};

/// "24h detail, then 3h step".
pub const DEFAULT_DETAIL_HOURS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Upper bound on 1-hour points before switching to 3-hour steps.
    pub max_detail_points: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_detail_points: DEFAULT_DETAIL_HOURS,
        }
    }
}

/// Build the merged hourly sequence from the raw fine and coarse records.
pub fn merge_hourly(
    fine: &[RawRecord],
    coarse: &[RawRecord],
    options: MergeOptions,
) -> Vec<HourlyPoint> {
    let fine = normalize_series(fine, Resource::Hourly, Resolution::Hourly);
    let coarse = normalize_series(coarse, Resource::ThreeHourly, Resolution::ThreeHourly);

    let detail = contiguous_run(fine, options.max_detail_points, Resource::Hourly);

    let (Some(first), Some(last)) = (detail.first(), detail.last()) else {
        // Nothing fine-grained: the series is the coarse forecast alone.
        return contiguous_run(coarse, usize::MAX, Resource::ThreeHourly);
    };

    let (first_start, reach) = (first.start, last.end());

    let Some(boundary) = merge_boundary(first_start, reach, &coarse) else {
        if !coarse.is_empty() {
            warn!(
                detail_end = %reach,
                coarse_start = %coarse[0].start,
                "3-hour forecast does not continue the hourly detail, using hourly detail only"
            );
        }
        return detail;
    };

    debug!(%boundary, detail_end = %reach, "merging forecasts");

    let mut merged: Vec<HourlyPoint> =
        detail.into_iter().take_while(|p| p.start < boundary).collect();
    let tail: Vec<HourlyPoint> = coarse.into_iter().skip_while(|p| p.start < boundary).collect();
    merged.extend(contiguous_run(tail, usize::MAX, Resource::ThreeHourly));

    merged
}

/// Latest coarse start that falls on the hourly grid inside the detail window.
///
/// It must lie after the first detail point so at least one hour of detail
/// survives, and no later than where the detail ends. The coarse run from
/// there must also extend past the detail; otherwise it would only replace
/// fine hours and there is no boundary.
fn merge_boundary(
    first_start: DateTime<Utc>,
    reach: DateTime<Utc>,
    coarse: &[HourlyPoint],
) -> Option<DateTime<Utc>> {
    let hour = Resolution::Hourly.duration().num_seconds();

    let boundary = coarse
        .iter()
        .map(|p| p.start)
        .filter(|start| *start > first_start && *start <= reach)
        .filter(|start| (*start - first_start).num_seconds() % hour == 0)
        .max()?;

    let mut coarse_end = boundary;
    for point in coarse.iter().skip_while(|p| p.start < boundary) {
        if point.start != coarse_end {
            break;
        }
        coarse_end = point.end();
    }

    (coarse_end > reach).then_some(boundary)
}

/// Normalize, drop points without a usable timestamp, order by start and
/// keep the last record seen for any repeated start.
fn normalize_series(
    records: &[RawRecord],
    resource: Resource,
    resolution: Resolution,
) -> Vec<HourlyPoint> {
    let mut by_start: BTreeMap<DateTime<Utc>, HourlyPoint> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let mapped = map_record(record, resource);

        let Some(start) = mapped.timestamp.map(|t| t.with_timezone(&Utc)) else {
            warn!(%resource, index, "dropping forecast point without a valid timestamp");
            continue;
        };

        let point = HourlyPoint {
            start,
            resolution,
            attributes: mapped.attributes,
        };

        if by_start.insert(start, point).is_some() {
            debug!(%resource, %start, "duplicate forecast point, keeping the later one");
        }
    }

    by_start.into_values().collect()
}

/// Longest gap-free run from the first point, at most `limit` points long.
fn contiguous_run(points: Vec<HourlyPoint>, limit: usize, resource: Resource) -> Vec<HourlyPoint> {
    let mut run: Vec<HourlyPoint> = Vec::with_capacity(points.len().min(limit));

    for point in points {
        if run.len() == limit {
            break;
        }

        if let Some(prev) = run.last() {
            if point.start != prev.end() {
                warn!(
                    %resource,
                    expected = %prev.end(),
                    found = %point.start,
                    "gap in forecast series, truncating"
                );
                break;
            }
        }

        run.push(point);
    }

    run
}
