//! Closed year interval for temperature queries.

use crate::error::CityTrendError;
use chrono::{Datelike, Utc};

/// The earliest year that can be queried. Meteostat monthly coverage before
/// this point is too sparse to chart meaningfully.
pub const MIN_QUERY_YEAR: i32 = 1990;

/// A validated, closed year interval `[start_year, end_year]`.
///
/// Construction enforces that the start year is strictly before the end year
/// and that both lie within `[MIN_QUERY_YEAR, current year]`, so any
/// `QueryRange` handed to the retrieval layer is known to be well-formed.
///
/// # Examples
///
/// ```
/// use citytrend::QueryRange;
///
/// let range = QueryRange::new(1995, 2024)?;
/// assert_eq!(range.start_year(), 1995);
/// assert_eq!(range.end_year(), 2024);
/// assert!(range.contains(2000));
/// assert!(!range.contains(1994));
///
/// // A single-year or inverted range is rejected.
/// assert!(QueryRange::new(2000, 2000).is_err());
/// assert!(QueryRange::new(2001, 2000).is_err());
/// # Ok::<(), citytrend::CityTrendError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryRange {
    start_year: i32,
    end_year: i32,
}

impl QueryRange {
    /// Creates a new `QueryRange`.
    ///
    /// # Errors
    ///
    /// Returns [`CityTrendError::YearOutOfBounds`] if either year falls outside
    /// `[MIN_QUERY_YEAR, current year]`, and [`CityTrendError::InvalidYearRange`]
    /// if `start_year >= end_year`.
    pub fn new(start_year: i32, end_year: i32) -> Result<Self, CityTrendError> {
        let max_year = Utc::now().year();
        for year in [start_year, end_year] {
            if !(MIN_QUERY_YEAR..=max_year).contains(&year) {
                return Err(CityTrendError::YearOutOfBounds {
                    year,
                    min: MIN_QUERY_YEAR,
                    max: max_year,
                });
            }
        }
        if start_year >= end_year {
            return Err(CityTrendError::InvalidYearRange {
                start: start_year,
                end: end_year,
            });
        }
        Ok(QueryRange {
            start_year,
            end_year,
        })
    }

    /// The first year of the range (inclusive).
    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// The last year of the range (inclusive).
    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    /// Whether `year` falls within the range.
    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_range() {
        let range = QueryRange::new(1995, 2024).unwrap();
        assert_eq!(range.start_year(), 1995);
        assert_eq!(range.end_year(), 2024);
    }

    #[test]
    fn rejects_equal_years() {
        assert!(matches!(
            QueryRange::new(2000, 2000),
            Err(CityTrendError::InvalidYearRange {
                start: 2000,
                end: 2000
            })
        ));
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(matches!(
            QueryRange::new(2001, 2000),
            Err(CityTrendError::InvalidYearRange {
                start: 2001,
                end: 2000
            })
        ));
    }

    #[test]
    fn rejects_year_before_minimum() {
        assert!(matches!(
            QueryRange::new(1989, 2000),
            Err(CityTrendError::YearOutOfBounds { year: 1989, .. })
        ));
    }

    #[test]
    fn rejects_future_year() {
        let next_year = Utc::now().year() + 1;
        assert!(matches!(
            QueryRange::new(2000, next_year),
            Err(CityTrendError::YearOutOfBounds { .. })
        ));
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let range = QueryRange::new(2000, 2010).unwrap();
        assert!(range.contains(2000));
        assert!(range.contains(2010));
        assert!(!range.contains(1999));
        assert!(!range.contains(2011));
    }
}
