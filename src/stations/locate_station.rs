//! Nearest-station lookup over the Meteostat station list.
//!
//! The full station list is downloaded once, cached on disk as bincode, and
//! indexed in an R-tree. Queries return the closest stations to a coordinate,
//! optionally restricted to stations whose reported monthly inventory covers
//! a requested year range.

use crate::stations::error::LocateStationError;
use crate::types::query_range::QueryRange;
use crate::types::station::Station;
use async_compression::tokio::bufread::GzipDecoder;
use bincode::config::{Configuration, Fixint, LittleEndian};
use futures_util::TryStreamExt;
use haversine::{distance, Location as HaversineLocation, Units};
use log::info;
use ordered_float::OrderedFloat;
use reqwest::Client;
use rstar::RTree;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io;
use std::path::Path;
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

const STATION_LIST_URL: &str = "https://bulk.meteostat.net/v2/stations/lite.json.gz";
const BINCODE_CACHE_FILE_NAME: &str = "stations_lite.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

#[derive(Debug, Clone)]
pub struct StationLocator {
    rtree: RTree<Station>,
}

// Heap entry for the filtered query; ordering considers distance only.
struct StationCandidate<'a> {
    distance_km: OrderedFloat<f64>,
    station: &'a Station,
}

impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.distance_km == other.distance_km
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_km.cmp(&other.distance_km)
    }
}

impl StationLocator {
    /// Loads the station index, reading the bincode cache when present and
    /// downloading the station list otherwise.
    pub async fn new(cache_dir: &Path) -> Result<Self, LocateStationError> {
        let cache_file = cache_dir.join(BINCODE_CACHE_FILE_NAME);

        let stations: Vec<Station>;
        if cache_file.exists() {
            let path_clone = cache_file.clone();
            stations = tokio::task::spawn_blocking(move || Self::get_cached_stations(&path_clone))
                .await??;
        } else {
            info!(
                "Station cache not found, fetching from {}",
                STATION_LIST_URL
            );
            stations = Self::fetch_stations().await?;
            Self::cache_stations(stations.clone(), &cache_file).await?;
        }

        Ok(Self::from_stations(stations))
    }

    /// Builds a locator directly from a station list, bypassing cache and
    /// network. Used by tests and by callers that bring their own metadata.
    pub fn from_stations(stations: Vec<Station>) -> Self {
        let rtree = RTree::bulk_load(stations);
        StationLocator { rtree }
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<Station>, LocateStationError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| LocateStationError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded_stations, _) =
            bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG).map_err(
                |e| LocateStationError::CacheDecode(cache_path.to_path_buf(), Box::from(e)),
            )?;
        Ok(decoded_stations)
    }

    async fn fetch_stations() -> Result<Vec<Station>, LocateStationError> {
        let client = Client::new();
        let response = client
            .get(STATION_LIST_URL)
            .send()
            .await
            .map_err(|e| LocateStationError::NetworkRequest(STATION_LIST_URL.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    LocateStationError::HttpStatus {
                        url: STATION_LIST_URL.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    LocateStationError::NetworkRequest(STATION_LIST_URL.to_string(), e)
                });
            }
        };
        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let stream_reader = StreamReader::new(stream);
        let gzip_decoder = GzipDecoder::new(BufReader::new(stream_reader));
        let mut decoder_reader = BufReader::new(gzip_decoder);
        let mut decompressed_json = Vec::with_capacity(20_000_000);
        decoder_reader.read_to_end(&mut decompressed_json).await?;

        let stations = tokio::task::spawn_blocking(move || {
            serde_json::from_slice::<Vec<Station>>(&decompressed_json)
                .map_err(LocateStationError::from)
        })
        .await??;
        info!("Parsed {} stations from station list", stations.len());
        Ok(stations)
    }

    async fn cache_stations(
        stations: Vec<Station>,
        cache_path: &Path,
    ) -> Result<(), LocateStationError> {
        let bincode_data = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| LocateStationError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(&cache_path, &bincode_data)
            .await
            .map_err(|e| LocateStationError::CacheWrite(cache_path.to_path_buf(), e))?;
        info!(
            "Wrote station cache ({} bytes) to {}",
            bincode_data.len(),
            cache_path.display()
        );
        Ok(())
    }

    /// Finds up to `n_results` nearest stations, closest first. When
    /// `required_years` is given, only stations whose reported monthly
    /// inventory fully covers that range are considered.
    pub fn query(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_km: f64,
        required_years: Option<QueryRange>,
    ) -> Vec<(Station, f64)> {
        if n_results == 0 {
            return vec![];
        }

        match required_years {
            None => self.proximity_query(latitude, longitude, n_results, max_distance_km),
            Some(range) => {
                self.filtered_heap_query(latitude, longitude, n_results, max_distance_km, range)
            }
        }
    }

    /// Proximity-only query. Takes a few more R-tree neighbours than asked
    /// for, because R-tree ordering (flat squared degrees) and Haversine
    /// ordering can disagree near the cutoff.
    fn proximity_query(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_km: f64,
    ) -> Vec<(Station, f64)> {
        let query_point = [latitude, longitude];
        let candidate_limit = (n_results * 2).max(20);

        let mut stations_with_dist: Vec<(Station, f64)> = self
            .rtree
            .nearest_neighbor_iter(&query_point)
            .take(candidate_limit)
            .filter_map(|station| {
                let dist_km = distance(
                    HaversineLocation {
                        latitude,
                        longitude,
                    },
                    HaversineLocation {
                        latitude: station.location.latitude,
                        longitude: station.location.longitude,
                    },
                    Units::Kilometers,
                );
                (dist_km <= max_distance_km).then(|| (station.to_owned(), dist_km))
            })
            .collect();

        stations_with_dist.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        stations_with_dist.truncate(n_results);
        stations_with_dist
    }

    /// Inventory-filtered query using a bounded max-heap of the best
    /// candidates seen so far.
    fn filtered_heap_query(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_km: f64,
        required_years: QueryRange,
    ) -> Vec<(Station, f64)> {
        let query_point = [latitude, longitude];
        let mut heap: BinaryHeap<StationCandidate<'_>> = BinaryHeap::with_capacity(n_results);

        for station in self.rtree.nearest_neighbor_iter(&query_point) {
            if !Self::covers_years(station, required_years) {
                continue;
            }

            let dist_km = distance(
                HaversineLocation {
                    latitude,
                    longitude,
                },
                HaversineLocation {
                    latitude: station.location.latitude,
                    longitude: station.location.longitude,
                },
                Units::Kilometers,
            );

            // R-tree neighbours arrive roughly distance-ordered, so the
            // first neighbour past the radius ends the scan.
            if dist_km > max_distance_km {
                break;
            }

            let candidate = StationCandidate {
                distance_km: OrderedFloat(dist_km),
                station,
            };

            if heap.len() < n_results {
                heap.push(candidate);
            } else {
                // unwrap safe: heap is full (len >= n_results >= 1)
                let worst = heap.peek().unwrap().distance_km;
                if candidate.distance_km < worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| (c.station.to_owned(), c.distance_km.into_inner()))
            .collect()
    }

    /// Whether the station's reported monthly inventory covers the whole
    /// requested year range. Stations without reported monthly coverage
    /// never match.
    fn covers_years(station: &Station, required_years: QueryRange) -> bool {
        let inventory = &station.inventory.monthly;
        let (Some(inv_start), Some(inv_end)) = (inventory.start, inventory.end) else {
            return false;
        };
        inv_start <= required_years.start_year() && inv_end >= required_years.end_year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::{Inventory, Location, Station, YearRange};
    use std::collections::HashMap;

    fn station(id: &str, lat: f64, lon: f64, monthly: (Option<i32>, Option<i32>)) -> Station {
        Station {
            id: id.to_string(),
            country: "CN".to_string(),
            name: HashMap::from([("en".to_string(), format!("Station {id}"))]),
            location: Location {
                latitude: lat,
                longitude: lon,
                elevation: None,
            },
            inventory: Inventory {
                monthly: YearRange {
                    start: monthly.0,
                    end: monthly.1,
                },
            },
        }
    }

    // Roughly Beijing and two stations nearby, plus Guangzhou ~1900 km away.
    fn test_locator() -> StationLocator {
        StationLocator::from_stations(vec![
            station("54511", 39.93, 116.28, (Some(1951), Some(2024))),
            station("54514", 39.72, 116.35, (Some(2005), Some(2024))),
            station("54594", 39.80, 116.47, (None, None)),
            station("59287", 23.17, 113.33, (Some(1945), Some(2024))),
        ])
    }

    #[test]
    fn returns_nearest_stations_sorted_by_distance() {
        let locator = test_locator();
        let results = locator.query(39.9042, 116.4074, 3, 100.0, None);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.id, "54511");
        for pair in results.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn respects_max_distance() {
        let locator = test_locator();
        let results = locator.query(39.9042, 116.4074, 10, 50.0, None);
        assert!(results.iter().all(|(_, d)| *d <= 50.0));
        assert!(results.iter().all(|(s, _)| s.id != "59287"));
    }

    #[test]
    fn inventory_filter_excludes_partial_coverage() {
        let locator = test_locator();
        let range = QueryRange::new(1995, 2020).unwrap();
        let results = locator.query(39.9042, 116.4074, 5, 100.0, Some(range));

        // 54514 starts in 2005 and 54594 reports no coverage at all.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "54511");
    }

    #[test]
    fn inventory_filter_accepts_full_coverage() {
        let locator = test_locator();
        let range = QueryRange::new(2010, 2020).unwrap();
        let results = locator.query(39.9042, 116.4074, 5, 100.0, Some(range));

        let ids: Vec<&str> = results.iter().map(|(s, _)| s.id.as_str()).collect();
        assert_eq!(ids, ["54511", "54514"]);
    }

    #[test]
    fn zero_results_requested_returns_empty() {
        let locator = test_locator();
        assert!(locator.query(39.9042, 116.4074, 0, 100.0, None).is_empty());
    }

    #[test]
    fn remote_point_returns_empty() {
        let locator = test_locator();
        // Middle of the Pacific.
        assert!(locator.query(0.0, 160.0, 5, 100.0, None).is_empty());
    }
}
