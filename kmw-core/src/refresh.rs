//! One fetch-then-normalize cycle, publishing a fresh snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    current::resolve_current,
    daily::normalize_daily,
    error::FetchError,
    merge::{MergeOptions, merge_hourly},
    model::{CurrentConditions, DailyPoint, HourlyPoint, RawRecord},
    provider::ForecastSource,
    snapshot::{Freshness, Snapshot, SnapshotStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOptions {
    /// When false only current conditions are fetched.
    pub forecast: bool,
    pub merge: MergeOptions,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            forecast: true,
            merge: MergeOptions::default(),
        }
    }
}

/// What a cycle did with one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Updated { points: usize },
    /// The previous value was kept.
    Stale { reason: String },
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub version: u64,
    pub current: Outcome,
    pub hourly: Outcome,
    pub daily: Outcome,
}

struct Update<T> {
    value: T,
    freshness: Freshness,
    outcome: Outcome,
}

impl<T> Update<T> {
    fn fresh(value: T, points: usize, at: DateTime<Utc>) -> Self {
        Self {
            value,
            freshness: Freshness::fresh(at),
            outcome: Outcome::Updated { points },
        }
    }

    fn keep(previous: T, freshness: Freshness, reason: String) -> Self {
        Self {
            value: previous,
            freshness: freshness.into_stale(),
            outcome: Outcome::Stale { reason },
        }
    }

    fn disabled(value: T) -> Self {
        Self {
            value,
            freshness: Freshness::default(),
            outcome: Outcome::Disabled,
        }
    }
}

type ForecastFetch = (
    Result<Vec<RawRecord>, FetchError>,
    Result<Vec<RawRecord>, FetchError>,
    Result<Vec<RawRecord>, FetchError>,
);

/// Runs refresh cycles against a source and publishes into a store.
///
/// At most one cycle runs at a time; an overlapping call returns `None`
/// without touching the store.
#[derive(Debug)]
pub struct Refresher<S> {
    source: S,
    store: Arc<SnapshotStore>,
    options: RefreshOptions,
    in_flight: Mutex<()>,
}

impl<S: ForecastSource> Refresher<S> {
    pub fn new(source: S, options: RefreshOptions) -> Self {
        Self::with_store(source, options, Arc::new(SnapshotStore::new()))
    }

    pub fn with_store(source: S, options: RefreshOptions, store: Arc<SnapshotStore>) -> Self {
        Self {
            source,
            store,
            options,
            in_flight: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.load()
    }

    pub async fn refresh(&self) -> Option<CycleReport> {
        let Ok(_cycle) = self.in_flight.try_lock() else {
            warn!("refresh already in progress, skipping this cycle");
            return None;
        };

        let previous = self.store.load();
        let (current, forecasts) =
            tokio::join!(self.source.fetch_current(), self.fetch_forecasts());
        let now = Utc::now();

        let current = self.update_current(&previous, current, now);
        let (hourly, daily) = match forecasts {
            Some((fine, coarse, daily)) => (
                self.update_hourly(&previous, fine, coarse, now),
                self.update_daily(&previous, daily, now),
            ),
            None => (Update::disabled(Arc::default()), Update::disabled(Arc::default())),
        };

        let snapshot = self.store.publish(Snapshot {
            version: previous.version + 1,
            current: current.value,
            hourly: hourly.value,
            daily: daily.value,
            current_freshness: current.freshness,
            hourly_freshness: hourly.freshness,
            daily_freshness: daily.freshness,
        });

        let report = CycleReport {
            version: snapshot.version,
            current: current.outcome,
            hourly: hourly.outcome,
            daily: daily.outcome,
        };

        info!(
            version = report.version,
            current = ?report.current,
            hourly = ?report.hourly,
            daily = ?report.daily,
            "refresh cycle complete"
        );

        Some(report)
    }

    async fn fetch_forecasts(&self) -> Option<ForecastFetch> {
        if !self.options.forecast {
            return None;
        }

        Some(tokio::join!(
            self.source.fetch_hourly(),
            self.source.fetch_three_hourly(),
            self.source.fetch_daily(),
        ))
    }

    fn update_current(
        &self,
        previous: &Snapshot,
        fetched: Result<RawRecord, FetchError>,
        now: DateTime<Utc>,
    ) -> Update<Option<Arc<CurrentConditions>>> {
        let keep = |reason: String| {
            warn!(resource = "current", %reason, "keeping previous current conditions");
            Update::keep(previous.current.clone(), previous.current_freshness, reason)
        };

        match fetched {
            Ok(record) => {
                let current = resolve_current(&record);
                if current.has_data() {
                    Update::fresh(Some(Arc::new(current)), 1, now)
                } else {
                    keep("current-conditions record carried no usable fields".to_string())
                }
            }
            Err(err) => keep(err.to_string()),
        }
    }

    fn update_hourly(
        &self,
        previous: &Snapshot,
        fine: Result<Vec<RawRecord>, FetchError>,
        coarse: Result<Vec<RawRecord>, FetchError>,
        now: DateTime<Utc>,
    ) -> Update<Arc<[HourlyPoint]>> {
        let keep = |reason: String| {
            warn!(resource = "hourly", %reason, "keeping previous hourly forecast");
            Update::keep(Arc::clone(&previous.hourly), previous.hourly_freshness, reason)
        };

        match (fine, coarse) {
            (Ok(fine), Ok(coarse)) => {
                let merged = merge_hourly(&fine, &coarse, self.options.merge);
                if merged.is_empty() && !(fine.is_empty() && coarse.is_empty()) {
                    return keep("no usable hourly forecast points".to_string());
                }
                let points = merged.len();
                Update::fresh(Arc::from(merged), points, now)
            }
            (Err(err), _) | (_, Err(err)) => keep(err.to_string()),
        }
    }

    fn update_daily(
        &self,
        previous: &Snapshot,
        fetched: Result<Vec<RawRecord>, FetchError>,
        now: DateTime<Utc>,
    ) -> Update<Arc<[DailyPoint]>> {
        let keep = |reason: String| {
            warn!(resource = "daily", %reason, "keeping previous daily forecast");
            Update::keep(Arc::clone(&previous.daily), previous.daily_freshness, reason)
        };

        match fetched {
            Ok(records) => {
                let daily = normalize_daily(&records);
                if daily.is_empty() && !records.is_empty() {
                    return keep("no usable daily forecast points".to_string());
                }
                let points = daily.len();
                Update::fresh(Arc::from(daily), points, now)
            }
            Err(err) => keep(err.to_string()),
        }
    }
}
