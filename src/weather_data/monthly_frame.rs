//! The `MonthlyLazyFrame` wrapper around lazily loaded monthly weather data.

use crate::types::observation::ObservationRow;
use crate::types::query_range::QueryRange;
use crate::weather_data::error::WeatherDataError;
use polars::prelude::{col, lit, DataType, Expr, LazyFrame};

/// A wrapper around a Polars `LazyFrame` holding monthly weather data for one
/// station, with the schema columns "year", "month", "tavg", and so on.
///
/// Provides the year-range filter and the typed extraction step that turns
/// raw provider rows into [`ObservationRow`]s. Instances are produced by the
/// crate's fetch layer; tests construct them from in-memory frames.
#[derive(Clone)]
pub struct MonthlyLazyFrame {
    /// The underlying Polars LazyFrame containing the monthly data.
    pub frame: LazyFrame,
}

impl MonthlyLazyFrame {
    /// Wraps a `LazyFrame` assumed to carry the monthly schema.
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Applies an arbitrary Polars predicate, returning a new frame and
    /// leaving this one unchanged.
    pub fn filter(&self, predicate: Expr) -> MonthlyLazyFrame {
        MonthlyLazyFrame::new(self.frame.clone().filter(predicate))
    }

    /// Restricts the frame to rows whose year lies within `range`
    /// (inclusive on both ends).
    pub fn filter_years(&self, range: QueryRange) -> MonthlyLazyFrame {
        self.filter(
            col("year")
                .gt_eq(lit(range.start_year() as i64))
                .and(col("year").lt_eq(lit(range.end_year() as i64))),
        )
    }

    /// Collects the frame into typed observations.
    ///
    /// Rows whose average temperature is null are dropped here, before any
    /// aggregation sees them. Rows with a null year/month or a month outside
    /// 1..=12 are malformed provider data and surface as an error rather
    /// than being silently skipped.
    ///
    /// The result is ordered by (year, month).
    pub fn collect_observations(&self) -> Result<Vec<ObservationRow>, WeatherDataError> {
        let df = self
            .frame
            .clone()
            .select([
                col("year").cast(DataType::Int64),
                col("month").cast(DataType::Int64),
                col("tavg").cast(DataType::Float64),
            ])
            .collect()?;

        let years = df
            .column("year")
            .map_err(|e| WeatherDataError::ColumnNotFound("year".to_string(), e))?
            .i64()?;
        let months = df
            .column("month")
            .map_err(|e| WeatherDataError::ColumnNotFound("month".to_string(), e))?
            .i64()?;
        let temps = df
            .column("tavg")
            .map_err(|e| WeatherDataError::ColumnNotFound("tavg".to_string(), e))?
            .f64()?;

        let mut rows = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            // Absent temperature: drop the row entirely.
            let Some(tavg) = temps.get(idx) else {
                continue;
            };

            let (Some(year), Some(month)) = (years.get(idx), months.get(idx)) else {
                return Err(WeatherDataError::UnexpectedData {
                    row: idx,
                    message: "null year or month".to_string(),
                });
            };
            if !(1..=12).contains(&month) {
                return Err(WeatherDataError::UnexpectedData {
                    row: idx,
                    message: format!("month {} outside 1..=12", month),
                });
            }

            rows.push(ObservationRow {
                year: year as i32,
                month: month as u32,
                average_temperature: tavg,
            });
        }

        rows.sort_by_key(|r| (r.year, r.month));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn frame(
        years: &[i64],
        months: &[i64],
        temps: &[Option<f64>],
    ) -> MonthlyLazyFrame {
        let df = df!(
            "year" => years,
            "month" => months,
            "tavg" => temps,
        )
        .unwrap();
        MonthlyLazyFrame::new(df.lazy())
    }

    #[test]
    fn collects_rows_and_drops_null_temperatures() {
        let monthly = frame(
            &[2000, 2000, 2000],
            &[1, 2, 3],
            &[Some(5.0), None, Some(9.5)],
        );

        let rows = monthly.collect_observations().unwrap();
        assert_eq!(
            rows,
            vec![
                ObservationRow {
                    year: 2000,
                    month: 1,
                    average_temperature: 5.0
                },
                ObservationRow {
                    year: 2000,
                    month: 3,
                    average_temperature: 9.5
                },
            ]
        );
    }

    #[test]
    fn filter_years_is_inclusive() {
        let monthly = frame(
            &[1999, 2000, 2001, 2002],
            &[6, 6, 6, 6],
            &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
        );
        let range = QueryRange::new(2000, 2001).unwrap();

        let rows = monthly.filter_years(range).collect_observations().unwrap();
        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, [2000, 2001]);
    }

    #[test]
    fn output_ordered_by_year_then_month() {
        let monthly = frame(
            &[2001, 2000, 2000],
            &[1, 12, 2],
            &[Some(1.0), Some(2.0), Some(3.0)],
        );

        let rows = monthly.collect_observations().unwrap();
        let keys: Vec<(i32, u32)> = rows.iter().map(|r| (r.year, r.month)).collect();
        assert_eq!(keys, [(2000, 2), (2000, 12), (2001, 1)]);
    }

    #[test]
    fn rejects_out_of_range_month() {
        let monthly = frame(&[2000], &[13], &[Some(1.0)]);
        assert!(matches!(
            monthly.collect_observations(),
            Err(WeatherDataError::UnexpectedData { .. })
        ));
    }

    #[test]
    fn empty_frame_collects_to_no_rows() {
        let monthly = frame(&[], &[], &[]);
        assert!(monthly.collect_observations().unwrap().is_empty());
    }
}
