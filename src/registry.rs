//! The city registry: a read-only mapping from display name to coordinate,
//! loaded once at startup from a JSON configuration file.
//!
//! File shape:
//!
//! ```json
//! {
//!     "Beijing":   { "lat": 39.9042, "lon": 116.4074 },
//!     "Guangzhou": { "lat": 23.1291, "lon": 113.2644 }
//! }
//! ```
//!
//! A missing file, malformed JSON, a city missing either field, or an
//! out-of-range coordinate is a startup-time error; nothing here fails per
//! request.

use crate::types::point::LatLon;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read city configuration file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse city configuration: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("City '{city}' has an invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { city: String, lat: f64, lon: f64 },

    #[error("Unknown city '{0}'")]
    UnknownCity(String),
}

#[derive(Debug, Deserialize)]
struct RawCity {
    lat: f64,
    lon: f64,
}

/// Read-only registry of selectable cities.
///
/// Keys are unique display names, matched exactly (case-sensitive). Iteration
/// order is name order, which keeps selection lists stable across runs.
#[derive(Debug, Clone)]
pub struct CityRegistry {
    cities: BTreeMap<String, LatLon>,
}

impl CityRegistry {
    /// Loads the registry from a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::FileRead(path.to_path_buf(), e))?;
        Self::from_json_str(&contents)
    }

    /// Parses a registry from a JSON string. `load` delegates here; it is
    /// also handy for tests and embedded defaults.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let raw: BTreeMap<String, RawCity> =
            serde_json::from_str(json).map_err(RegistryError::Parse)?;

        let mut cities = BTreeMap::new();
        for (name, coords) in raw {
            let point = LatLon::new(coords.lat, coords.lon).map_err(|_| {
                RegistryError::InvalidCoordinate {
                    city: name.clone(),
                    lat: coords.lat,
                    lon: coords.lon,
                }
            })?;
            cities.insert(name, point);
        }
        Ok(CityRegistry { cities })
    }

    /// Looks up a city by exact, case-sensitive display name.
    pub fn get(&self, name: &str) -> Option<LatLon> {
        self.cities.get(name).copied()
    }

    /// Resolves an ordered selection of city names into (name, point) pairs,
    /// preserving the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownCity`] for the first name not present
    /// in the registry.
    pub fn selection(&self, names: &[&str]) -> Result<Vec<(String, LatLon)>, RegistryError> {
        names
            .iter()
            .map(|&name| {
                self.get(name)
                    .map(|point| (name.to_string(), point))
                    .ok_or_else(|| RegistryError::UnknownCity(name.to_string()))
            })
            .collect()
    }

    /// City display names, in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cities.keys().map(String::as_str)
    }

    /// All (name, point) entries, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, LatLon)> {
        self.cities.iter().map(|(name, point)| (name.as_str(), *point))
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_JSON: &str = r#"{
        "Beijing":   { "lat": 39.9042, "lon": 116.4074 },
        "Chengdu":   { "lat": 30.5728, "lon": 104.0668 },
        "Guangzhou": { "lat": 23.1291, "lon": 113.2644 }
    }"#;

    #[test]
    fn loads_registry_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID_JSON.as_bytes()).unwrap();
        file.flush().unwrap();

        let registry = CityRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("Beijing"), Some(LatLon(39.9042, 116.4074)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = CityRegistry::load("/nonexistent/cities.json");
        assert!(matches!(result, Err(RegistryError::FileRead(_, _))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = CityRegistry::from_json_str("{ not json");
        assert!(matches!(result, Err(RegistryError::Parse(_))));
    }

    #[test]
    fn missing_coordinate_field_is_a_parse_error() {
        let result = CityRegistry::from_json_str(r#"{ "Beijing": { "lat": 39.9 } }"#);
        assert!(matches!(result, Err(RegistryError::Parse(_))));
    }

    #[test]
    fn out_of_range_coordinate_is_rejected() {
        let result =
            CityRegistry::from_json_str(r#"{ "Nowhere": { "lat": 95.0, "lon": 10.0 } }"#);
        assert!(matches!(
            result,
            Err(RegistryError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = CityRegistry::from_json_str(VALID_JSON).unwrap();
        assert!(registry.get("Guangzhou").is_some());
        assert!(registry.get("guangzhou").is_none());
    }

    #[test]
    fn selection_preserves_requested_order() {
        let registry = CityRegistry::from_json_str(VALID_JSON).unwrap();
        let selected = registry.selection(&["Guangzhou", "Beijing"]).unwrap();
        let names: Vec<&str> = selected.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Guangzhou", "Beijing"]);
    }

    #[test]
    fn selection_of_unknown_city_errors() {
        let registry = CityRegistry::from_json_str(VALID_JSON).unwrap();
        assert!(matches!(
            registry.selection(&["Beijing", "Atlantis"]),
            Err(RegistryError::UnknownCity(name)) if name == "Atlantis"
        ));
    }

    #[test]
    fn names_are_sorted() {
        let registry = CityRegistry::from_json_str(VALID_JSON).unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["Beijing", "Chengdu", "Guangzhou"]);
    }
}
