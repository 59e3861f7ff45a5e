//! Case statistics models.
//!
//! `CoronaRecord` is the composite value handed to the display layer. It is
//! assembled from one country overview plus the most recent entry of the
//! global daily feed, or replaced by the all-zero "Mars" placeholder when
//! nothing can be fetched.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::country::{CountryCode, MARS};

/// Most recent global daily report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_confirmed: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_recovered: u64,
    #[serde(default, alias = "reportDate")]
    pub report_date_string: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub mainland_china: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub other_locations: u64,
}

impl DailySummary {
    /// Zeroed summary dated `date`, formatted like a US locale date (`3/1/2020`).
    pub fn zeroed(date: NaiveDate) -> Self {
        Self {
            report_date_string: format_report_date(date),
            ..Default::default()
        }
    }
}

/// Country-level case counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaseOverview {
    pub deaths: u64,
    pub confirmed: u64,
    pub recovered: u64,
}

/// Composite statistics record served to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CoronaRecord {
    pub country: String,
    pub country_code: CountryCode,
    pub deaths: u64,
    pub confirmed: u64,
    pub recovered: u64,
    pub total: u64,
    pub daily: DailySummary,
}

impl CoronaRecord {
    /// Build a record from fetched parts. `total` is always derived here.
    pub fn assemble(
        country: impl Into<String>,
        country_code: CountryCode,
        overview: CaseOverview,
        daily: DailySummary,
    ) -> Self {
        let total = overview
            .deaths
            .saturating_add(overview.confirmed)
            .saturating_add(overview.recovered);
        Self {
            country: country.into(),
            country_code,
            deaths: overview.deaths,
            confirmed: overview.confirmed,
            recovered: overview.recovered,
            total,
            daily,
        }
    }

    /// All-zero "Mars" record dated `date`.
    pub fn placeholder(date: NaiveDate) -> Self {
        Self::assemble(
            MARS,
            CountryCode::mars(),
            CaseOverview::default(),
            DailySummary::zeroed(date),
        )
    }

    /// Placeholder dated with the local calendar day.
    pub fn placeholder_today() -> Self {
        Self::placeholder(Local::now().date_naive())
    }

    pub fn is_placeholder(&self) -> bool {
        self.country_code.is_mars()
    }

    /// Whether `total` matches the sum of the three counters.
    pub fn is_consistent(&self) -> bool {
        self.deaths
            .checked_add(self.confirmed)
            .and_then(|sum| sum.checked_add(self.recovered))
            .map(|sum| sum == self.total)
            .unwrap_or(false)
    }
}

/// `M/D/YYYY` without zero padding.
pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

// The daily feed reports `null` for counters it has not collected yet.
fn count_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
