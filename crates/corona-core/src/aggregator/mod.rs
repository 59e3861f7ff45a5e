//! Statistics orchestration.
//!
//! `DataAggregator` turns an online/offline request into a `CoronaRecord`:
//! a pure planning step picks cache hit, placeholder, or fetch, and a single
//! executor carries the plan out. An online failure abandons the request
//! without persisting anything.

pub mod plan;

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, error, info, warn};

use crate::api::RemoteDataClient;
use crate::error::{Operation, Result, StatsError};
use crate::location::LocationResolver;
use crate::models::{CoronaRecord, CountryCode, CountryDirectory, DailySummary};
use crate::settings::AppSettings;

pub use plan::{plan, Plan, PlanInput, Target};

pub struct DataAggregator {
    settings: AppSettings,
    client: Arc<dyn RemoteDataClient>,
    resolver: LocationResolver,
}

impl DataAggregator {
    pub fn new(settings: AppSettings, client: Arc<dyn RemoteDataClient>) -> Self {
        let resolver = LocationResolver::new(settings.clone(), Arc::clone(&client));
        Self {
            settings,
            client,
            resolver,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Current statistics for the effective country.
    pub async fn get_stats(&self, online: bool) -> Result<CoronaRecord> {
        debug!(online, "Statistics requested");
        self.execute(self.plan(online)?).await
    }

    /// Same sequencing as `get_stats`; online requests always go to the network.
    pub async fn refresh(&self, online: bool) -> Result<CoronaRecord> {
        info!(online, "Refresh requested");
        self.execute(self.plan(online)?).await
    }

    /// Directory of supported countries, cached after the first fetch.
    pub async fn list_all_countries(&self, online: bool) -> Result<CountryDirectory> {
        if let Some(countries) = self.settings.cached_countries() {
            debug!(count = countries.len(), "Serving cached country directory");
            return Ok(countries);
        }

        if !online {
            debug!("No cached country directory while offline");
            return Ok(CountryDirectory::placeholder());
        }

        let countries = self
            .client
            .list_countries()
            .await
            .map_err(|e| StatsError::network(Operation::CountriesListing, e))?;

        if let Err(e) = self.settings.save_countries(&countries) {
            error!(error = %e, "Failed to cache country directory");
        }
        Ok(countries)
    }

    fn plan(&self, online: bool) -> Result<Plan> {
        plan(PlanInput {
            mode: self.settings.location_mode(),
            configured: self.settings.configured_code(),
            cached: self.settings.cached_record(),
            online,
        })
    }

    async fn execute(&self, plan: Plan) -> Result<CoronaRecord> {
        match plan {
            Plan::CacheHit(record) => {
                debug!(code = %record.country_code, "Serving cached statistics");
                Ok(record)
            }
            Plan::Placeholder => {
                debug!("Nothing cached for this selection, serving placeholder");
                Ok(CoronaRecord::placeholder_today())
            }
            Plan::FetchAndPersist(target) => self.fetch_and_persist(target).await,
        }
    }

    async fn fetch_and_persist(&self, target: Target) -> Result<CoronaRecord> {
        let (country, code) = match &target {
            Target::Pinned(code) => (code.to_string(), code.clone()),
            // The mode was read once while planning; a selection made since
            // then applies to the next request.
            Target::Geolocate => {
                let geo = self.resolver.locate().await?;
                (geo.country, geo.country_code)
            }
        };

        let record = self.assemble(country, code).await?;
        info!(
            code = %record.country_code,
            total = record.total,
            report_date = %record.daily.report_date_string,
            "Statistics fetched"
        );

        match &target {
            Target::Pinned(code) => match self.settings.save_pinned_record(&record, code) {
                Ok(true) => {}
                Ok(false) => warn!(code = %code, "Selection changed during fetch, not caching record"),
                Err(e) => error!(error = %e, "Failed to cache statistics"),
            },
            Target::Geolocate => {
                if let Err(e) = self.settings.save_record(&record) {
                    error!(error = %e, "Failed to cache statistics");
                }
            }
        }

        Ok(record)
    }

    /// Fetch the overview and the daily feed together and build the record.
    async fn assemble(&self, country: String, code: CountryCode) -> Result<CoronaRecord> {
        let (overview, daily) = tokio::join!(
            self.client.fetch_overview(&code),
            self.client.fetch_daily_global(),
        );

        let overview = overview.map_err(|e| StatsError::network(Operation::CoronaDetection, e))?;
        let daily = latest_daily(daily.map_err(|e| StatsError::network(Operation::LatestUpdateDetection, e))?)?;

        Ok(CoronaRecord::assemble(country, code, overview, daily))
    }
}

/// Most recent entry of the daily series.
fn latest_daily(mut series: Vec<DailySummary>) -> Result<DailySummary> {
    series.pop().ok_or_else(|| {
        StatsError::network(Operation::LatestUpdateDetection, anyhow!("daily feed is empty"))
    })
}
