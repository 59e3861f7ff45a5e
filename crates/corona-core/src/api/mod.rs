//! Remote data access.
//!
//! `RemoteDataClient` is the seam the aggregator talks to; `ApiClient` is
//! the production implementation backed by ip-api.com and the
//! covid19.mathdro.id statistics API.

pub mod client;
pub mod error;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CaseOverview, CountryCode, CountryDirectory, DailySummary, GeoLocation};

pub use client::ApiClient;
pub use error::ApiError;

/// The four independent network operations the aggregator depends on.
///
/// Implementations must be side-effect free beyond the request itself and
/// must not retry on their own.
#[async_trait]
pub trait RemoteDataClient: Send + Sync {
    /// Resolve the caller's country from its public IP.
    async fn geolocate(&self) -> Result<GeoLocation>;

    /// Fetch the directory of supported countries.
    async fn list_countries(&self) -> Result<CountryDirectory>;

    /// Fetch deaths/confirmed/recovered for one country.
    async fn fetch_overview(&self, code: &CountryCode) -> Result<CaseOverview>;

    /// Fetch the global daily series, most recent entry last.
    async fn fetch_daily_global(&self) -> Result<Vec<DailySummary>>;
}
