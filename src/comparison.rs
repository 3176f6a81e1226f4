//! Multi-city annual comparison.
//!
//! Each city is fetched and validated independently; one broken city degrades
//! the batch (it lands in `rejected` with a reason) without aborting the
//! remaining cities. Output order always follows input city order.

use crate::aggregate::is_plausible;
use crate::error::CityTrendError;
use crate::types::observation::CitySeries;
use crate::types::point::LatLon;
use crate::types::query_range::QueryRange;
use crate::view::SeriesStats;
use log::{info, warn};
use std::fmt;
use std::time::Duration;

/// Upper bound on cities per comparison request.
pub const MAX_COMPARISON_CITIES: usize = 10;

/// Pause inserted between successive per-city retrievals, as politeness
/// towards the data provider. Not a correctness requirement.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Anything that can produce an annual series for a point and year range.
///
/// The production implementation is [`crate::CityTrend`]; tests substitute a
/// scripted source to exercise the batch semantics without network access.
#[allow(async_fn_in_trait)]
pub trait AnnualSeriesSource {
    /// Fetches and aggregates the series for one city. `Ok(None)` means the
    /// provider had no data for the range, which is distinct from a failure.
    async fn fetch_annual_series(
        &self,
        point: LatLon,
        range: QueryRange,
    ) -> Result<Option<CitySeries>, CityTrendError>;
}

/// Why a city was excluded from a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// Retrieval failed; carries the human-readable error message.
    Fetch(String),
    /// The provider returned no rows for the requested range.
    NoData,
    /// The aggregated series fell outside the plausibility bound.
    Implausible,
    /// The aggregated series was structurally malformed.
    Malformed(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Fetch(msg) => write!(f, "retrieval failed: {}", msg),
            RejectionReason::NoData => write!(f, "no data for the requested range"),
            RejectionReason::Implausible => write!(f, "suspicious data outside plausible bounds"),
            RejectionReason::Malformed(msg) => write!(f, "malformed series: {}", msg),
        }
    }
}

/// A city excluded from a comparison, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCity {
    pub name: String,
    pub reason: RejectionReason,
}

/// Per-city summary row of the comparison statistics table.
#[derive(Debug, Clone, PartialEq)]
pub struct CityStats {
    pub name: String,
    pub stats: SeriesStats,
}

/// The outcome of a comparison request.
///
/// `series` and `stats_table` contain only the surviving cities and preserve
/// the input city order. When every city was rejected both are empty; that is
/// a legitimate "nothing plotted" outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonView {
    /// One annual (year, temperature) series per surviving city.
    pub series: Vec<(String, Vec<(i32, f64)>)>,
    /// Cities excluded from the comparison, in input order.
    pub rejected: Vec<RejectedCity>,
    /// Summary statistics per surviving city.
    pub stats_table: Vec<CityStats>,
}

impl ComparisonView {
    /// Whether no city survived; nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Runs the comparison over `cities` sequentially, pausing `delay` between
/// successive retrievals.
///
/// # Errors
///
/// Returns [`CityTrendError::TooManyCities`] before any retrieval when more
/// than [`MAX_COMPARISON_CITIES`] are requested. Per-city failures never
/// abort the batch; they are recorded in the view's `rejected` list.
pub async fn run_comparison<S: AnnualSeriesSource>(
    source: &S,
    cities: &[(String, LatLon)],
    range: QueryRange,
    delay: Duration,
) -> Result<ComparisonView, CityTrendError> {
    if cities.len() > MAX_COMPARISON_CITIES {
        return Err(CityTrendError::TooManyCities {
            given: cities.len(),
            max: MAX_COMPARISON_CITIES,
        });
    }

    let mut view = ComparisonView {
        series: Vec::new(),
        rejected: Vec::new(),
        stats_table: Vec::new(),
    };

    for (idx, (name, point)) in cities.iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let series = match source.fetch_annual_series(*point, range).await {
            Ok(Some(series)) => series,
            Ok(None) => {
                info!("No data for '{}' in {:?}", name, range);
                view.rejected.push(RejectedCity {
                    name: name.clone(),
                    reason: RejectionReason::NoData,
                });
                continue;
            }
            Err(e) => {
                warn!("Retrieval failed for '{}': {}", name, e);
                view.rejected.push(RejectedCity {
                    name: name.clone(),
                    reason: RejectionReason::Fetch(e.to_string()),
                });
                continue;
            }
        };

        if !is_plausible(&series.annual) {
            warn!("Annual series for '{}' failed the plausibility bound", name);
            view.rejected.push(RejectedCity {
                name: name.clone(),
                reason: RejectionReason::Implausible,
            });
            continue;
        }

        let stats = match SeriesStats::from_annual(&series.annual) {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Annual series for '{}' is malformed: {}", name, e);
                view.rejected.push(RejectedCity {
                    name: name.clone(),
                    reason: RejectionReason::Malformed(e.to_string()),
                });
                continue;
            }
        };

        view.series.push((
            name.clone(),
            series
                .annual
                .iter()
                .map(|a| (a.year, a.mean_temperature))
                .collect(),
        ));
        view.stats_table.push(CityStats {
            name: name.clone(),
            stats,
        });
    }

    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::observation::{AnnualAverage, ObservationRow};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: behavior is chosen by the latitude of the query
    /// point, and every call is counted.
    struct ScriptedSource {
        calls: AtomicUsize,
    }

    const OK_LAT: f64 = 1.0;
    const FAIL_LAT: f64 = 2.0;
    const EMPTY_LAT: f64 = 3.0;
    const IMPLAUSIBLE_LAT: f64 = 4.0;

    fn series(mean: f64) -> CitySeries {
        CitySeries {
            rows: vec![ObservationRow {
                year: 2000,
                month: 1,
                average_temperature: mean,
            }],
            annual: vec![
                AnnualAverage {
                    year: 2000,
                    mean_temperature: mean,
                },
                AnnualAverage {
                    year: 2001,
                    mean_temperature: mean + 1.0,
                },
            ],
        }
    }

    impl AnnualSeriesSource for ScriptedSource {
        async fn fetch_annual_series(
            &self,
            point: LatLon,
            _range: QueryRange,
        ) -> Result<Option<CitySeries>, CityTrendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if point.0 == FAIL_LAT {
                Err(CityTrendError::NoStationWithinRadius {
                    radius: 50.0,
                    lat: point.0,
                    lon: point.1,
                })
            } else if point.0 == EMPTY_LAT {
                Ok(None)
            } else if point.0 == IMPLAUSIBLE_LAT {
                Ok(Some(series(99.0)))
            } else {
                Ok(Some(series(10.0)))
            }
        }
    }

    fn source() -> ScriptedSource {
        ScriptedSource {
            calls: AtomicUsize::new(0),
        }
    }

    fn city(name: &str, lat: f64) -> (String, LatLon) {
        (name.to_string(), LatLon(lat, 0.0))
    }

    fn range() -> QueryRange {
        QueryRange::new(2000, 2001).unwrap()
    }

    #[tokio::test]
    async fn failing_city_degrades_but_does_not_block_batch() {
        let src = source();
        let cities = [
            city("A", OK_LAT),
            city("B", FAIL_LAT),
            city("C", OK_LAT),
        ];

        let view = run_comparison(&src, &cities, range(), Duration::ZERO)
            .await
            .unwrap();

        let names: Vec<&str> = view.series.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
        let stats_names: Vec<&str> = view.stats_table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(stats_names, ["A", "C"]);
        assert_eq!(view.rejected.len(), 1);
        assert_eq!(view.rejected[0].name, "B");
        assert!(matches!(
            view.rejected[0].reason,
            RejectionReason::Fetch(_)
        ));
    }

    #[tokio::test]
    async fn too_many_cities_fails_before_any_retrieval() {
        let src = source();
        let cities: Vec<(String, LatLon)> = (0..11)
            .map(|i| city(&format!("City {i}"), OK_LAT))
            .collect();

        let result = run_comparison(&src, &cities, range(), Duration::ZERO).await;
        assert!(matches!(
            result,
            Err(CityTrendError::TooManyCities { given: 11, max: 10 })
        ));
        assert_eq!(src.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exactly_ten_cities_is_allowed() {
        let src = source();
        let cities: Vec<(String, LatLon)> = (0..10)
            .map(|i| city(&format!("City {i}"), OK_LAT))
            .collect();

        let view = run_comparison(&src, &cities, range(), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(view.series.len(), 10);
        assert_eq!(src.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn no_data_city_rejected_with_distinct_reason() {
        let src = source();
        let cities = [city("A", EMPTY_LAT)];

        let view = run_comparison(&src, &cities, range(), Duration::ZERO)
            .await
            .unwrap();
        assert!(view.is_empty());
        assert_eq!(view.rejected[0].reason, RejectionReason::NoData);
    }

    #[tokio::test]
    async fn implausible_series_rejected_wholesale() {
        let src = source();
        let cities = [city("Hot", IMPLAUSIBLE_LAT), city("Fine", OK_LAT)];

        let view = run_comparison(&src, &cities, range(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(view.series.len(), 1);
        assert_eq!(view.series[0].0, "Fine");
        assert_eq!(view.rejected[0].name, "Hot");
        assert_eq!(view.rejected[0].reason, RejectionReason::Implausible);
    }

    #[tokio::test]
    async fn all_rejected_yields_empty_view_not_error() {
        let src = source();
        let cities = [city("A", FAIL_LAT), city("B", EMPTY_LAT)];

        let view = run_comparison(&src, &cities, range(), Duration::ZERO)
            .await
            .unwrap();
        assert!(view.is_empty());
        assert!(view.stats_table.is_empty());
        assert_eq!(view.rejected.len(), 2);
    }

    #[tokio::test]
    async fn output_preserves_input_order() {
        let src = source();
        let cities = [
            city("Z", OK_LAT),
            city("A", OK_LAT),
            city("M", OK_LAT),
        ];

        let view = run_comparison(&src, &cities, range(), Duration::ZERO)
            .await
            .unwrap();
        let names: Vec<&str> = view.series.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Z", "A", "M"]);
    }
}
