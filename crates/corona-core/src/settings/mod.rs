//! Persisted settings and cached data.
//!
//! - `SettingsStore`: the raw key/value store (`JsonFileStore`, `MemoryStore`)
//! - `AppSettings`: typed view used by the resolver, aggregator and process

pub mod store;

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::models::{CoronaRecord, CountryCode, CountryDirectory, LocationMode};

pub use store::{Guard, JsonFileStore, MemoryStore, SettingsError, SettingsStore, SettingsStoreExt};

/// Persisted keys.
pub mod keys {
    pub const COUNTRIES: &str = "countries";
    pub const CORONA: &str = "corona";
    pub const COUNTRY_CODE: &str = "corona.countryCode";
    pub const COUNTRY_LOCATE: &str = "corona.countryLocate";
    pub const OPEN_AT_LOGIN: &str = "settings.isOpenAtLogin";
}

/// Typed access to the persisted settings.
///
/// Unreadable values are logged and treated as absent so a damaged entry
/// degrades to the offline placeholder instead of failing every request.
#[derive(Clone)]
pub struct AppSettings {
    store: Arc<dyn SettingsStore>,
}

impl AppSettings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key, error = %e, "Ignoring unreadable setting");
                None
            }
        }
    }

    // ===== Location selection =====

    pub fn location_mode(&self) -> LocationMode {
        let style: Option<String> = self.read(keys::COUNTRY_LOCATE);
        LocationMode::from_locate_style(style.as_deref())
    }

    pub fn configured_code(&self) -> Option<CountryCode> {
        self.read::<CountryCode>(keys::COUNTRY_CODE)
            .filter(|code| !code.as_str().is_empty())
    }

    /// Record an explicit user selection. `locate_style` is stored verbatim;
    /// only `"manual"` pins the code.
    pub fn select_country(&self, code: &CountryCode, locate_style: &str) -> Result<(), SettingsError> {
        self.store.commit(vec![
            (keys::COUNTRY_CODE, store::to_value(keys::COUNTRY_CODE, code)?),
            (keys::COUNTRY_LOCATE, Value::String(locate_style.to_string())),
        ])
    }

    // ===== Cached statistics =====

    pub fn cached_record(&self) -> Option<CoronaRecord> {
        self.read(keys::CORONA)
    }

    pub fn cached_countries(&self) -> Option<CountryDirectory> {
        self.read(keys::COUNTRIES)
    }

    pub fn save_countries(&self, countries: &CountryDirectory) -> Result<(), SettingsError> {
        self.store.set(keys::COUNTRIES, countries)
    }

    /// Persist an auto-mode record.
    pub fn save_record(&self, record: &CoronaRecord) -> Result<(), SettingsError> {
        self.store.set(keys::CORONA, record)
    }

    /// Persist a manual-mode record, but only while the selection it was
    /// fetched for (`code` in manual mode) is still the stored one. Returns
    /// whether the write happened.
    pub fn save_pinned_record(&self, record: &CoronaRecord, code: &CountryCode) -> Result<bool, SettingsError> {
        let code_value = store::to_value(keys::COUNTRY_CODE, code)?;
        let manual = Value::String(LocationMode::Manual.locate_style().to_string());
        self.store.commit_if(
            &[
                (keys::COUNTRY_CODE, Some(&code_value)),
                (keys::COUNTRY_LOCATE, Some(&manual)),
            ],
            vec![(keys::CORONA, store::to_value(keys::CORONA, record)?)],
        )
    }

    // ===== Process preferences =====

    /// Whether to launch at login. Defaults to `true` until the user says otherwise.
    pub fn open_at_login(&self) -> bool {
        self.read(keys::OPEN_AT_LOGIN).unwrap_or(true)
    }

    pub fn set_open_at_login(&self, open: bool) -> Result<(), SettingsError> {
        self.store.set(keys::OPEN_AT_LOGIN, &open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn settings() -> AppSettings {
        AppSettings::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_defaults_when_empty() {
        let s = settings();
        assert_eq!(s.location_mode(), LocationMode::Auto);
        assert_eq!(s.configured_code(), None);
        assert!(s.cached_record().is_none());
        assert!(s.cached_countries().is_none());
        assert!(s.open_at_login());
    }

    #[test]
    fn test_select_country_manual_and_other() {
        let s = settings();
        s.select_country(&"US".into(), "manual").unwrap();
        assert_eq!(s.location_mode(), LocationMode::Manual);
        assert_eq!(s.configured_code(), Some("US".into()));

        s.select_country(&"US".into(), "auto").unwrap();
        assert_eq!(s.location_mode(), LocationMode::Auto);
    }

    #[test]
    fn test_empty_code_is_not_configured() {
        let s = settings();
        s.select_country(&"".into(), "manual").unwrap();
        assert_eq!(s.configured_code(), None);
    }

    #[test]
    fn test_unreadable_record_is_absent() {
        let s = settings();
        s.store().set_value(keys::CORONA, Value::String("garbage".into())).unwrap();
        assert!(s.cached_record().is_none());
    }

    #[test]
    fn test_save_pinned_record_skips_when_selection_changed() {
        let s = settings();
        let record = CoronaRecord::placeholder(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        s.select_country(&"DE".into(), "manual").unwrap();

        assert!(!s.save_pinned_record(&record, &"US".into()).unwrap());
        assert!(s.cached_record().is_none());
        assert_eq!(s.configured_code(), Some("DE".into()));

        assert!(s.save_pinned_record(&record, &"DE".into()).unwrap());
        assert_eq!(s.cached_record(), Some(record));
    }

    #[test]
    fn test_save_pinned_record_skips_when_switched_to_auto() {
        let s = settings();
        let record = CoronaRecord::placeholder(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        s.select_country(&"US".into(), "manual").unwrap();
        s.select_country(&"US".into(), "auto").unwrap();

        assert!(!s.save_pinned_record(&record, &"US".into()).unwrap());
        assert_eq!(s.location_mode(), LocationMode::Auto);
        assert!(s.cached_record().is_none());
    }

    #[test]
    fn test_open_at_login_roundtrip() {
        let s = settings();
        s.set_open_at_login(false).unwrap();
        assert!(!s.open_at_login());
    }
}
