//! Effective target country resolution.

use std::sync::Arc;

use tracing::debug;

use crate::api::RemoteDataClient;
use crate::error::{Operation, Result, StatsError};
use crate::models::{CountryCode, GeoLocation, LocationMode};
use crate::settings::AppSettings;

/// Outcome of resolving the target country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Manual mode: the stored code, no network involved.
    Pinned(CountryCode),
    /// Auto mode, online: the geolocated country.
    Located(GeoLocation),
    /// Auto mode, offline: nothing can be resolved.
    Unresolvable,
}

impl Resolution {
    /// Display name and code, if a country was resolved.
    pub fn into_country(self) -> Option<(String, CountryCode)> {
        match self {
            Resolution::Pinned(code) => Some((code.to_string(), code)),
            Resolution::Located(geo) => Some((geo.country, geo.country_code)),
            Resolution::Unresolvable => None,
        }
    }
}

pub struct LocationResolver {
    settings: AppSettings,
    client: Arc<dyn RemoteDataClient>,
}

impl LocationResolver {
    pub fn new(settings: AppSettings, client: Arc<dyn RemoteDataClient>) -> Self {
        Self { settings, client }
    }

    /// Resolve using the currently stored location mode.
    pub async fn resolve(&self, online: bool) -> Result<Resolution> {
        self.resolve_for(self.settings.location_mode(), online).await
    }

    /// Resolve for a mode the caller already read, without consulting the
    /// stored mode again.
    pub async fn resolve_for(&self, mode: LocationMode, online: bool) -> Result<Resolution> {
        match mode {
            LocationMode::Manual => self.pinned_code().map(Resolution::Pinned),
            LocationMode::Auto if online => self.locate().await.map(Resolution::Located),
            LocationMode::Auto => {
                debug!("Auto location while offline, nothing to resolve");
                Ok(Resolution::Unresolvable)
            }
        }
    }

    /// Geolocate the current network address.
    pub async fn locate(&self) -> Result<GeoLocation> {
        self.client
            .geolocate()
            .await
            .map_err(|e| StatsError::network(Operation::CountryDetection, e))
    }

    /// The manually configured code, or `InvalidConfiguration` if none was ever set.
    pub fn pinned_code(&self) -> Result<CountryCode> {
        self.settings.configured_code().ok_or_else(StatsError::missing_manual_code)
    }
}
