//! Data structures for Meteostat weather stations, including the inventory
//! metadata used to pre-filter candidates and the `rstar` implementations
//! required for spatial indexing.

use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single Meteostat weather station and the metadata this crate needs from
/// the station list: identity, location, and monthly data availability.
///
/// Unknown fields in the upstream JSON (hourly/daily inventory, alternative
/// identifiers, and so on) are ignored during deserialization.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// The unique Meteostat station identifier (e.g., "10637").
    pub id: String,
    /// The country code where the station is located (e.g., "CN", "DE").
    pub country: String,
    /// A map of station names in different languages
    /// (e.g., {"en": "Guangzhou / Baiyun"}).
    pub name: HashMap<String, String>,
    /// Geographical location details (latitude, longitude, elevation).
    pub location: Location,
    /// Data availability periods reported by Meteostat.
    pub inventory: Inventory,
}

impl Station {
    /// The English display name, falling back to the station id when the
    /// station list carries no English entry.
    pub fn display_name(&self) -> &str {
        self.name.get("en").map(String::as_str).unwrap_or(&self.id)
    }
}

/// The monthly data availability reported for a station.
///
/// Indicates the approximate start and end years for which monthly data is
/// expected to exist according to Meteostat's metadata. Gaps can exist within
/// the reported range.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Inventory {
    /// The reported start and end years for monthly data.
    pub monthly: YearRange,
}

/// A year range with optional start and end years.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct YearRange {
    /// The earliest year for which data is reported available, if known.
    pub start: Option<i32>,
    /// The latest year for which data is reported available, if known.
    pub end: Option<i32>,
}

/// The geographical location of a weather station.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
    /// Elevation above sea level in meters, if available.
    pub elevation: Option<i32>,
}

/// Treats a `Station` as a point object within an R-Tree, enabling efficient
/// nearest-neighbour queries on (latitude, longitude).
impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.latitude, self.location.longitude])
    }
}

impl PointDistance for Station {
    /// Squared Euclidean distance between the station and a query point
    /// `[latitude, longitude]`. Treating degrees as Cartesian coordinates is
    /// an approximation, acceptable for candidate selection; the final
    /// ordering uses Haversine distances.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.latitude - point[0];
        let dy = self.location.longitude - point[1];
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_station_ignoring_unknown_fields() {
        let json = r#"{
            "id": "59287",
            "country": "CN",
            "region": "GD",
            "timezone": "Asia/Shanghai",
            "name": {"en": "Guangzhou / Baiyun"},
            "identifiers": {"national": null, "wmo": "59287", "icao": "ZGGG"},
            "location": {"latitude": 23.1667, "longitude": 113.3333, "elevation": 70},
            "inventory": {
                "daily": {"start": "1945-10-01", "end": "2024-12-31"},
                "hourly": {"start": "1945-10-01", "end": "2024-12-31"},
                "model": {"start": null, "end": null},
                "monthly": {"start": 1945, "end": 2024},
                "normals": {"start": 1961, "end": 1990}
            }
        }"#;

        let station: Station = serde_json::from_str(json).unwrap();
        assert_eq!(station.id, "59287");
        assert_eq!(station.display_name(), "Guangzhou / Baiyun");
        assert_eq!(station.inventory.monthly.start, Some(1945));
        assert_eq!(station.inventory.monthly.end, Some(2024));
        assert_eq!(station.location.latitude, 23.1667);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let station = Station {
            id: "00000".to_string(),
            country: "XX".to_string(),
            name: HashMap::new(),
            location: Location {
                latitude: 0.0,
                longitude: 0.0,
                elevation: None,
            },
            inventory: Inventory {
                monthly: YearRange {
                    start: None,
                    end: None,
                },
            },
        };
        assert_eq!(station.display_name(), "00000");
    }
}
