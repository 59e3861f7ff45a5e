//! HTTP client for the geolocation and COVID-19 statistics services.
//!
//! Each operation is a single GET with no shared state and no retry. A
//! failure is returned to the caller, which decides how to report it.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::models::{CaseOverview, CountryCode, CountryDirectory, DailySummary, GeoLocation};

use super::{ApiError, RemoteDataClient};

// ============================================================================
// Constants
// ============================================================================

/// IP geolocation endpoint.
pub const DEFAULT_GEOLOCATION_URL: &str = "http://ip-api.com/json";

/// Base URL of the COVID-19 statistics API.
pub const DEFAULT_API_BASE_URL: &str = "https://covid19.mathdro.id/api";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

impl IpApiResponse {
    fn into_location(self) -> Result<GeoLocation, ApiError> {
        if self.status.as_deref() == Some("fail") {
            let reason = self.message.unwrap_or_else(|| "unknown reason".to_string());
            return Err(ApiError::LookupFailed(reason));
        }
        match (self.country, self.country_code) {
            (Some(country), Some(code)) if !code.is_empty() => Ok(GeoLocation {
                country,
                country_code: CountryCode::new(code),
            }),
            _ => Err(ApiError::InvalidResponse(
                "geolocation response missing country or countryCode".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountriesResponse {
    countries: CountryDirectory,
}

#[derive(Debug, Default, Deserialize)]
struct CountValue {
    #[serde(default)]
    value: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OverviewResponse {
    #[serde(default)]
    deaths: CountValue,
    #[serde(default)]
    confirmed: CountValue,
    #[serde(default)]
    recovered: CountValue,
}

impl From<OverviewResponse> for CaseOverview {
    fn from(r: OverviewResponse) -> Self {
        Self {
            deaths: r.deaths.value.unwrap_or(0),
            confirmed: r.confirmed.value.unwrap_or(0),
            recovered: r.recovered.value.unwrap_or(0),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client for the remote statistics and geolocation APIs.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    geolocation_url: String,
    api_base_url: String,
}

impl ApiClient {
    /// Create a client against the public endpoints.
    pub fn new() -> Result<Self> {
        Self::with_endpoints(
            DEFAULT_GEOLOCATION_URL,
            DEFAULT_API_BASE_URL,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Create a client against custom endpoints (mirrors, local stubs).
    pub fn with_endpoints(geolocation_url: &str, api_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            geolocation_url: geolocation_url.to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn countries_url(&self) -> String {
        format!("{}/countries", self.api_base_url)
    }

    fn overview_url(&self, code: &CountryCode) -> String {
        format!("{}/countries/{}", self.api_base_url, code.as_path_segment())
    }

    fn daily_url(&self) -> String {
        format!("{}/daily", self.api_base_url)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

#[async_trait]
impl RemoteDataClient for ApiClient {
    async fn geolocate(&self) -> Result<GeoLocation> {
        let response: IpApiResponse = self.get(&self.geolocation_url).await?;
        let location = response.into_location()?;
        debug!(country = %location.country, code = %location.country_code, "Geolocated");
        Ok(location)
    }

    async fn list_countries(&self) -> Result<CountryDirectory> {
        let response: CountriesResponse = self.get(&self.countries_url()).await?;
        debug!(count = response.countries.len(), "Countries fetched");
        Ok(response.countries)
    }

    async fn fetch_overview(&self, code: &CountryCode) -> Result<CaseOverview> {
        let response: OverviewResponse = self.get(&self.overview_url(code)).await?;
        Ok(response.into())
    }

    async fn fetch_daily_global(&self) -> Result<Vec<DailySummary>> {
        let daily: Vec<DailySummary> = self.get(&self.daily_url()).await?;
        debug!(entries = daily.len(), "Daily feed fetched");
        Ok(daily)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::with_endpoints(
            DEFAULT_GEOLOCATION_URL,
            "https://covid19.mathdro.id/api/",
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let api = client();
        assert_eq!(api.countries_url(), "https://covid19.mathdro.id/api/countries");
        assert_eq!(api.daily_url(), "https://covid19.mathdro.id/api/daily");
        assert_eq!(
            api.overview_url(&CountryCode::new("US")),
            "https://covid19.mathdro.id/api/countries/us"
        );
    }

    #[test]
    fn test_parse_ip_api_success() {
        let json = r#"{"status":"success","country":"United States","countryCode":"US","query":"1.2.3.4"}"#;
        let resp: IpApiResponse = serde_json::from_str(json).unwrap();
        let loc = resp.into_location().unwrap();
        assert_eq!(loc.country, "United States");
        assert_eq!(loc.country_code.as_str(), "US");
    }

    #[test]
    fn test_parse_ip_api_failure() {
        let json = r#"{"status":"fail","message":"private range","query":"10.0.0.1"}"#;
        let resp: IpApiResponse = serde_json::from_str(json).unwrap();
        match resp.into_location() {
            Err(ApiError::LookupFailed(msg)) => assert_eq!(msg, "private range"),
            other => panic!("expected LookupFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ip_api_missing_code() {
        let resp: IpApiResponse = serde_json::from_str(r#"{"country":"Nowhere"}"#).unwrap();
        assert!(matches!(resp.into_location(), Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_overview_response() {
        let json = r#"{
            "confirmed": {"value": 100, "detail": "https://covid19.mathdro.id/api/countries/us/confirmed"},
            "recovered": {"value": null},
            "deaths": {"value": 10},
            "lastUpdate": "2020-03-01T00:00:00.000Z"
        }"#;
        let resp: OverviewResponse = serde_json::from_str(json).unwrap();
        let overview: CaseOverview = resp.into();
        assert_eq!(overview.confirmed, 100);
        assert_eq!(overview.recovered, 0);
        assert_eq!(overview.deaths, 10);
    }

    #[test]
    fn test_parse_countries_response() {
        let json = r#"{"countries": {"Germany": "DE", "France": "FR"}}"#;
        let resp: CountriesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.countries.get("France"), Some("FR"));
    }
}
