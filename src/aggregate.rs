//! Annual aggregation and plausibility validation of monthly observations.

use crate::types::observation::{AnnualAverage, ObservationRow};
use std::collections::BTreeMap;

/// Lower plausibility bound (exclusive) for an annual mean, in °C.
pub const PLAUSIBLE_MIN_C: f64 = -50.0;
/// Upper plausibility bound (exclusive) for an annual mean, in °C.
pub const PLAUSIBLE_MAX_C: f64 = 50.0;

/// Groups observations by calendar year and computes each year's arithmetic
/// mean, ordered by year.
///
/// The mean is unweighted across the months present: a year with two valid
/// months averages exactly like a year with twelve. That matches the source
/// data's semantics, where missing months simply do not contribute.
///
/// # Examples
///
/// ```
/// use citytrend::{annual_averages, ObservationRow};
///
/// let rows = [
///     ObservationRow { year: 2000, month: 1, average_temperature: 10.0 },
///     ObservationRow { year: 2000, month: 2, average_temperature: 20.0 },
/// ];
/// let annual = annual_averages(&rows);
/// assert_eq!(annual.len(), 1);
/// assert_eq!(annual[0].mean_temperature, 15.0);
/// ```
pub fn annual_averages(rows: &[ObservationRow]) -> Vec<AnnualAverage> {
    let mut by_year: BTreeMap<i32, (f64, u32)> = BTreeMap::new();
    for row in rows {
        let entry = by_year.entry(row.year).or_insert((0.0, 0));
        entry.0 += row.average_temperature;
        entry.1 += 1;
    }

    by_year
        .into_iter()
        .map(|(year, (sum, count))| AnnualAverage {
            year,
            mean_temperature: sum / count as f64,
        })
        .collect()
}

/// Whether every annual mean lies strictly inside the plausibility bound
/// (−50, 50) °C.
///
/// A single out-of-range year marks the whole series implausible; callers
/// exclude such a series wholesale rather than clamping or partially
/// including it. The bound is a proxy for detecting corrupted provider data,
/// not a physical model.
pub fn is_plausible(series: &[AnnualAverage]) -> bool {
    series
        .iter()
        .all(|a| a.mean_temperature > PLAUSIBLE_MIN_C && a.mean_temperature < PLAUSIBLE_MAX_C)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, month: u32, temp: f64) -> ObservationRow {
        ObservationRow {
            year,
            month,
            average_temperature: temp,
        }
    }

    fn annual(year: i32, mean: f64) -> AnnualAverage {
        AnnualAverage {
            year,
            mean_temperature: mean,
        }
    }

    #[test]
    fn two_month_year_averages_exactly() {
        let annuals = annual_averages(&[row(2000, 1, 10.0), row(2000, 2, 20.0)]);
        assert_eq!(annuals, vec![annual(2000, 15.0)]);
    }

    #[test]
    fn one_entry_per_distinct_year_ordered() {
        let rows = [
            row(2002, 1, 1.0),
            row(2000, 1, 2.0),
            row(2001, 1, 3.0),
            row(2000, 7, 4.0),
        ];
        let annuals = annual_averages(&rows);
        let years: Vec<i32> = annuals.iter().map(|a| a.year).collect();
        assert_eq!(years, [2000, 2001, 2002]);
    }

    #[test]
    fn sparse_year_weighs_like_full_year() {
        // Two months only; the mean is over the present months, not twelve.
        let sparse = annual_averages(&[row(2000, 1, -10.0), row(2000, 12, 10.0)]);
        assert_eq!(sparse[0].mean_temperature, 0.0);

        let full_rows: Vec<ObservationRow> =
            (1..=12).map(|m| row(2001, m, 5.0)).collect();
        let full = annual_averages(&full_rows);
        assert_eq!(full[0].mean_temperature, 5.0);
    }

    #[test]
    fn no_rows_invented_or_duplicated() {
        let rows = [
            row(2000, 1, 1.0),
            row(2000, 2, 2.0),
            row(2000, 3, 3.0),
            row(2001, 1, 4.0),
        ];
        let annuals = annual_averages(&rows);

        // Reconstructed per-year counts must match the input row set.
        for a in &annuals {
            let input_count = rows.iter().filter(|r| r.year == a.year).count();
            assert!(input_count > 0);
            let input_mean: f64 = rows
                .iter()
                .filter(|r| r.year == a.year)
                .map(|r| r.average_temperature)
                .sum::<f64>()
                / input_count as f64;
            assert_eq!(a.mean_temperature, input_mean);
        }
        let distinct_years: std::collections::BTreeSet<i32> =
            rows.iter().map(|r| r.year).collect();
        assert_eq!(annuals.len(), distinct_years.len());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(annual_averages(&[]).is_empty());
    }

    #[test]
    fn plausibility_accepts_values_inside_bound() {
        let series = [annual(2000, -49.9), annual(2001, 0.0), annual(2002, 49.9)];
        assert!(is_plausible(&series));
    }

    #[test]
    fn plausibility_rejects_bound_values() {
        assert!(!is_plausible(&[annual(2000, -50.0)]));
        assert!(!is_plausible(&[annual(2000, 50.0)]));
    }

    #[test]
    fn plausibility_single_bad_year_rejects_whole_series() {
        let series = [annual(2000, 10.0), annual(2001, 120.0), annual(2002, 11.0)];
        assert!(!is_plausible(&series));
    }

    #[test]
    fn plausibility_accepts_empty_series() {
        assert!(is_plausible(&[]));
    }
}
