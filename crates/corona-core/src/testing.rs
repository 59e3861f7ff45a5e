//! Scripted `RemoteDataClient` for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::RemoteDataClient;
use crate::models::{CaseOverview, CountryCode, CountryDirectory, DailySummary, GeoLocation};

#[derive(Default)]
pub struct FakeRemote {
    location: Option<GeoLocation>,
    overviews: HashMap<String, CaseOverview>,
    daily: Mutex<Vec<DailySummary>>,
    countries: Option<CountryDirectory>,
    fail_geolocate: bool,
    fail_overview: bool,
    fail_daily: bool,
    geolocate_calls: AtomicUsize,
    countries_calls: AtomicUsize,
    overview_calls: AtomicUsize,
    daily_calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, country: &str, code: &str) -> Self {
        self.location = Some(GeoLocation {
            country: country.to_string(),
            country_code: code.into(),
        });
        self
    }

    pub fn with_overview(mut self, code: &str, deaths: u64, confirmed: u64, recovered: u64) -> Self {
        self.overviews.insert(
            code.to_lowercase(),
            CaseOverview {
                deaths,
                confirmed,
                recovered,
            },
        );
        self
    }

    pub fn with_daily(self, report_dates: &[&str]) -> Self {
        *self.daily.lock() = report_dates
            .iter()
            .enumerate()
            .map(|(i, d)| DailySummary {
                total_confirmed: 100 * (i as u64 + 1),
                report_date_string: d.to_string(),
                ..Default::default()
            })
            .collect();
        self
    }

    pub fn with_countries(mut self, entries: &[(&str, &str)]) -> Self {
        self.countries = Some(CountryDirectory::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    pub fn failing_geolocate(mut self) -> Self {
        self.fail_geolocate = true;
        self
    }

    pub fn failing_overview(mut self) -> Self {
        self.fail_overview = true;
        self
    }

    pub fn failing_daily(mut self) -> Self {
        self.fail_daily = true;
        self
    }

    /// Append an entry to the daily feed, as a later publication would.
    pub fn publish_daily(&self, report_date: &str) {
        self.daily.lock().push(DailySummary {
            report_date_string: report_date.to_string(),
            ..Default::default()
        });
    }

    pub fn geolocate_calls(&self) -> usize {
        self.geolocate_calls.load(Ordering::SeqCst)
    }

    pub fn countries_calls(&self) -> usize {
        self.countries_calls.load(Ordering::SeqCst)
    }

    pub fn overview_calls(&self) -> usize {
        self.overview_calls.load(Ordering::SeqCst)
    }

    pub fn daily_calls(&self) -> usize {
        self.daily_calls.load(Ordering::SeqCst)
    }

    pub fn network_calls(&self) -> usize {
        self.geolocate_calls() + self.countries_calls() + self.overview_calls() + self.daily_calls()
    }
}

#[async_trait]
impl RemoteDataClient for FakeRemote {
    async fn geolocate(&self) -> Result<GeoLocation> {
        self.geolocate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_geolocate {
            return Err(anyhow!("geolocation service unreachable"));
        }
        self.location.clone().ok_or_else(|| anyhow!("no location scripted"))
    }

    async fn list_countries(&self) -> Result<CountryDirectory> {
        self.countries_calls.fetch_add(1, Ordering::SeqCst);
        self.countries.clone().ok_or_else(|| anyhow!("countries endpoint unreachable"))
    }

    async fn fetch_overview(&self, code: &CountryCode) -> Result<CaseOverview> {
        self.overview_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_overview {
            return Err(anyhow!("overview endpoint unreachable"));
        }
        self.overviews
            .get(&code.as_path_segment())
            .copied()
            .ok_or_else(|| anyhow!("Resource not found: {}", code))
    }

    async fn fetch_daily_global(&self) -> Result<Vec<DailySummary>> {
        self.daily_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_daily {
            return Err(anyhow!("daily endpoint unreachable"));
        }
        Ok(self.daily.lock().clone())
    }
}
