//! Core library for the `kmw` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The fetch adapter for the Kachelmann Wetter API
//! - The forecast normalizer: field mapping, hourly merge, current and daily resolution
//! - Immutable snapshots and the refresh cycle that publishes them
//!
//! It is used by `kmw-cli`, but can also be reused by other binaries or services.

pub mod condition;
pub mod config;
pub mod current;
pub mod daily;
pub mod error;
pub mod mapper;
pub mod merge;
pub mod model;
pub mod provider;
pub mod refresh;
pub mod snapshot;

pub use condition::Condition;
pub use config::Config;
pub use current::resolve_current;
pub use daily::normalize_daily;
pub use error::FetchError;
pub use mapper::map_record;
pub use merge::{MergeOptions, merge_hourly};
pub use model::{
    Attributes, CurrentConditions, DailyPoint, HourlyPoint, RawRecord, Resolution, Risk,
};
pub use provider::{ForecastSource, Resource, kachelmann::KachelmannSource, source_from_config};
pub use refresh::{CycleReport, Outcome, RefreshOptions, Refresher};
pub use snapshot::{Freshness, Snapshot, SnapshotStore};
