//! Presentation structures derived from retrieval results.
//!
//! Everything here is plain data: ordered (year, value) pairs and summary
//! numbers. Rendering them with a charting library is a separate concern and
//! no charting type appears in these signatures.

use crate::error::CityTrendError;
use crate::types::observation::{AnnualAverage, ObservationRow};
use std::collections::BTreeMap;

/// Summary statistics over an annual series: the overall mean plus the
/// extreme values and the years they first occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    /// Mean of the annual means.
    pub mean: f64,
    /// Highest annual mean in the series.
    pub max_value: f64,
    /// Year of the first occurrence of `max_value`.
    pub max_year: i32,
    /// Lowest annual mean in the series.
    pub min_value: f64,
    /// Year of the first occurrence of `min_value`.
    pub min_year: i32,
}

impl SeriesStats {
    /// Computes statistics over an annual series.
    ///
    /// Ties for the extreme values resolve to the earliest year: a single
    /// left-to-right scan over the year-ordered series keeps the first
    /// strictly better candidate, so reordering equal input entries cannot
    /// change the result.
    ///
    /// # Errors
    ///
    /// Returns [`CityTrendError::EmptySeries`] for an empty series and
    /// [`CityTrendError::DuplicateYear`] when a year appears more than once;
    /// duplicate years are malformed input, not something to paper over.
    pub fn from_annual(series: &[AnnualAverage]) -> Result<Self, CityTrendError> {
        let mut ordered: Vec<AnnualAverage> = series.to_vec();
        ordered.sort_by_key(|a| a.year);
        for pair in ordered.windows(2) {
            if pair[0].year == pair[1].year {
                return Err(CityTrendError::DuplicateYear(pair[0].year));
            }
        }

        let first = ordered.first().ok_or(CityTrendError::EmptySeries)?;
        let mut max = (first.mean_temperature, first.year);
        let mut min = (first.mean_temperature, first.year);
        let mut sum = 0.0;
        for entry in &ordered {
            sum += entry.mean_temperature;
            if entry.mean_temperature > max.0 {
                max = (entry.mean_temperature, entry.year);
            }
            if entry.mean_temperature < min.0 {
                min = (entry.mean_temperature, entry.year);
            }
        }

        Ok(SeriesStats {
            mean: sum / ordered.len() as f64,
            max_value: max.0,
            max_year: max.1,
            min_value: min.0,
            min_year: min.1,
        })
    }
}

/// Chart-ready data for one city: per-month trend lines, the annual trend
/// line, and summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleCityView {
    /// One entry per calendar month present in the observations, keyed by
    /// month number (1..=12); each value is the (year, temperature) sequence
    /// for that month, ordered by year.
    pub monthly_series: BTreeMap<u32, Vec<(i32, f64)>>,
    /// The annual-average trend as (year, temperature) pairs, ordered by year.
    pub annual_series: Vec<(i32, f64)>,
    /// Summary statistics over the annual series.
    pub stats: SeriesStats,
}

/// Builds the single-city presentation from retrieval output.
///
/// `rows` and `annual` are the two halves of a [`crate::CitySeries`]; the
/// function is pure and performs no I/O.
///
/// # Errors
///
/// Returns [`CityTrendError::EmptySeries`] when `annual` is empty and
/// [`CityTrendError::DuplicateYear`] when it contains a repeated year.
pub fn build_single_city_view(
    rows: &[ObservationRow],
    annual: &[AnnualAverage],
) -> Result<SingleCityView, CityTrendError> {
    let stats = SeriesStats::from_annual(annual)?;

    let mut monthly_series: BTreeMap<u32, Vec<(i32, f64)>> = BTreeMap::new();
    for row in rows {
        monthly_series
            .entry(row.month)
            .or_default()
            .push((row.year, row.average_temperature));
    }
    for series in monthly_series.values_mut() {
        series.sort_by_key(|(year, _)| *year);
    }

    let mut annual_series: Vec<(i32, f64)> = annual
        .iter()
        .map(|a| (a.year, a.mean_temperature))
        .collect();
    annual_series.sort_by_key(|(year, _)| *year);

    Ok(SingleCityView {
        monthly_series,
        annual_series,
        stats,
    })
}
