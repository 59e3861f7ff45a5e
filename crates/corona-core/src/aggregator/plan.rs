//! Request planning: decide how a statistics request is served before any
//! network I/O happens.

use crate::error::{Result, StatsError};
use crate::models::{CoronaRecord, CountryCode, LocationMode};

/// Where the country of a fresh fetch comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Pinned(CountryCode),
    Geolocate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Serve the persisted record unchanged.
    CacheHit(CoronaRecord),
    /// Serve the all-zero "Mars" record.
    Placeholder,
    /// Fetch overview and daily feed, assemble, persist, serve.
    FetchAndPersist(Target),
}

/// Everything the decision depends on, read once per request.
#[derive(Debug, Clone)]
pub struct PlanInput {
    pub mode: LocationMode,
    pub configured: Option<CountryCode>,
    pub cached: Option<CoronaRecord>,
    pub online: bool,
}

pub fn plan(input: PlanInput) -> Result<Plan> {
    let PlanInput {
        mode,
        configured,
        cached,
        online,
    } = input;

    match (mode, online) {
        (LocationMode::Manual, true) => match configured {
            Some(code) => Ok(Plan::FetchAndPersist(Target::Pinned(code))),
            None => Err(StatsError::missing_manual_code()),
        },
        // Only a record fetched for the currently pinned code may be reused.
        (LocationMode::Manual, false) => match (cached, configured) {
            (Some(record), Some(code)) if record.country_code == code => Ok(Plan::CacheHit(record)),
            _ => Ok(Plan::Placeholder),
        },
        (LocationMode::Auto, true) => Ok(Plan::FetchAndPersist(Target::Geolocate)),
        (LocationMode::Auto, false) => Ok(match cached {
            Some(record) => Plan::CacheHit(record),
            None => Plan::Placeholder,
        }),
    }
}
