//! Request/reply contract between the display layer and the background process.
//!
//! Messages are JSON objects tagged by `"type"`, using the channel names of
//! the tray front end (`online-status`, `corona-data`, ...).

use serde::{Deserialize, Serialize};

use crate::models::{CoronaRecord, CountryCode, CountryDirectory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    /// Current statistics, answered on `corona-data`.
    OnlineStatus { online: bool },
    /// Forced re-fetch, answered on `refresh-back`.
    Refresh { online: bool },
    /// Supported countries, answered on `send-all-countries`.
    GetAllCountries { online: bool },
    /// Persist the user's selection. No reply.
    #[serde(rename_all = "camelCase")]
    ManualCountrySelection {
        country_code: CountryCode,
        locate_style: String,
    },
    /// Persist the launch-at-login preference. No reply.
    #[serde(rename_all = "camelCase")]
    OpenAtLogin { is_open_at_login: bool },
    /// Shut the process down.
    CloseApp,
}

impl Request {
    pub fn channel(&self) -> &'static str {
        match self {
            Request::OnlineStatus { .. } => "online-status",
            Request::Refresh { .. } => "refresh",
            Request::GetAllCountries { .. } => "get-all-countries",
            Request::ManualCountrySelection { .. } => "manual-country-selection",
            Request::OpenAtLogin { .. } => "open-at-login",
            Request::CloseApp => "close-app",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Reply {
    CoronaData { corona: CoronaRecord },
    RefreshBack { corona: CoronaRecord },
    SendAllCountries { countries: CountryDirectory },
    /// A request failed; `message` is suitable for a user notification.
    Error {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        request: Option<String>,
        message: String,
    },
}

impl Reply {
    pub fn error(request: Option<&str>, message: impl Into<String>) -> Self {
        Reply::Error {
            request: request.map(str::to_string),
            message: message.into(),
        }
    }
}
