use thiserror::Error;

/// Remote operation that failed, worded for the user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CountryDetection,
    CountriesListing,
    CoronaDetection,
    LatestUpdateDetection,
}

impl Operation {
    pub fn describe(&self) -> &'static str {
        match self {
            Operation::CountryDetection => "Country detection",
            Operation::CountriesListing => "Countries listing",
            Operation::CoronaDetection => "Corona detection",
            Operation::LatestUpdateDetection => "latest update detection",
        }
    }
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("An error occurred during {}. {source:#}", .operation.describe())]
    NetworkFailure {
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl StatsError {
    pub fn network(operation: Operation, source: anyhow::Error) -> Self {
        StatsError::NetworkFailure { operation, source }
    }

    pub fn missing_manual_code() -> Self {
        StatsError::InvalidConfiguration("manual location selected but no country code set".to_string())
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
