//! Data models for case statistics and country selection.
//!
//! - `CoronaRecord`, `DailySummary`, `CaseOverview`: statistics served to the display
//! - `CountryCode`, `LocationMode`, `GeoLocation`: how the target country is chosen
//! - `CountryDirectory`: the list of supported countries

pub mod corona;
pub mod country;

pub use corona::{format_report_date, CaseOverview, CoronaRecord, DailySummary};
pub use country::{CountryCode, CountryDirectory, GeoLocation, LocationMode, MARS};
