//! Core library for corona-tray.
//!
//! Fetches COVID-19 case statistics for the user's country (geolocated or
//! manually pinned), caches them in the settings store, and serves them
//! back when offline.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod location;
pub mod models;
pub mod protocol;
pub mod settings;

#[cfg(test)]
mod testing;

pub use aggregator::DataAggregator;
pub use api::{ApiClient, RemoteDataClient};
pub use config::Config;
pub use error::{Operation, StatsError};
pub use location::{LocationResolver, Resolution};
pub use models::{CoronaRecord, CountryCode, CountryDirectory, DailySummary, LocationMode};
pub use protocol::{Reply, Request};
pub use settings::{AppSettings, JsonFileStore, MemoryStore, SettingsStore};
