use std::{fmt, sync::Arc};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{CurrentConditions, DailyPoint, HourlyPoint};

/// When a resource was last refreshed, and whether the latest attempt failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Freshness {
    pub updated_at: Option<DateTime<Utc>>,
    pub stale: bool,
}

impl Freshness {
    pub fn fresh(at: DateTime<Utc>) -> Self {
        Self {
            updated_at: Some(at),
            stale: false,
        }
    }

    /// Same update time, flagged stale.
    pub fn into_stale(self) -> Self {
        Self { stale: true, ..self }
    }
}

/// One complete set of normalized data, produced by a single refresh cycle.
///
/// Shared behind an `Arc` and never mutated after publication.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub version: u64,
    pub current: Option<Arc<CurrentConditions>>,
    pub hourly: Arc<[HourlyPoint]>,
    pub daily: Arc<[DailyPoint]>,
    pub current_freshness: Freshness,
    pub hourly_freshness: Freshness,
    pub daily_freshness: Freshness,
}

/// Holds the latest snapshot; readers never observe a half-built one.
pub struct SnapshotStore {
    latest: ArcSwap<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            latest: ArcSwap::from_pointee(Snapshot::default()),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.latest.load_full()
    }

    /// Replace the current snapshot in one step.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.latest.store(Arc::clone(&snapshot));
        snapshot
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("version", &self.latest.load().version)
            .finish()
    }
}
