//! Country identification types: codes, location mode, and the directory
//! of supported countries.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel used wherever no real location is available.
pub const MARS: &str = "Mars";

/// Representation stored for directory entries that have no code.
const NO_REPRESENTATION: &str = "None";

/// Persisted value of `corona.countryLocate` that selects manual mode.
const MANUAL_LOCATE_STYLE: &str = "manual";

/// Short country identifier (e.g. `"US"`), or the `"Mars"` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn mars() -> Self {
        Self(MARS.to_string())
    }

    pub fn is_mars(&self) -> bool {
        self.0 == MARS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used in the per-country overview URL.
    pub fn as_path_segment(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// How the target country is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationMode {
    /// IP geolocation on every online fetch.
    #[default]
    Auto,
    /// A country code pinned by the user.
    Manual,
}

impl LocationMode {
    /// Interpret a persisted `corona.countryLocate` value.
    /// Only `"manual"` selects manual mode; anything else (or nothing) is auto.
    pub fn from_locate_style(style: Option<&str>) -> Self {
        match style {
            Some(MANUAL_LOCATE_STYLE) => LocationMode::Manual,
            _ => LocationMode::Auto,
        }
    }

    pub fn locate_style(&self) -> &'static str {
        match self {
            LocationMode::Manual => MANUAL_LOCATE_STYLE,
            LocationMode::Auto => "auto",
        }
    }
}

/// Result of an IP geolocation lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub country: String,
    pub country_code: CountryCode,
}

/// Supported countries, keyed by display name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(transparent)]
pub struct CountryDirectory(BTreeMap<String, String>);

impl CountryDirectory {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    /// Directory returned when nothing is cached and nothing can be fetched.
    pub fn placeholder() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(MARS.to_string(), NO_REPRESENTATION.to_string());
        Self(entries)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// The countries endpoint has served both a name -> code object and a list
// of `{name, iso2, iso3}` entries. Both collapse into the same directory.
#[derive(Deserialize)]
#[serde(untagged)]
enum DirectoryWire {
    Map(BTreeMap<String, String>),
    List(Vec<DirectoryEntry>),
}

#[derive(Deserialize)]
struct DirectoryEntry {
    name: String,
    #[serde(default)]
    iso2: Option<String>,
}

impl<'de> Deserialize<'de> for CountryDirectory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = match DirectoryWire::deserialize(deserializer)? {
            DirectoryWire::Map(map) => map,
            DirectoryWire::List(list) => list
                .into_iter()
                .map(|e| {
                    let repr = e.iso2.unwrap_or_else(|| NO_REPRESENTATION.to_string());
                    (e.name, repr)
                })
                .collect(),
        };
        Ok(Self(entries))
    }
}
