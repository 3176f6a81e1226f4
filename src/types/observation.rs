//! Row types produced by retrieval and aggregation.

/// A single monthly average-temperature observation.
///
/// One row per (year, month) for which the provider reported a value; rows
/// whose temperature was absent in the source data are dropped before they
/// reach this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationRow {
    /// Calendar year of the observation.
    pub year: i32,
    /// Calendar month, 1 through 12.
    pub month: u32,
    /// Monthly average temperature in degrees Celsius.
    pub average_temperature: f64,
}

/// The arithmetic mean of a year's available monthly averages.
///
/// Derived by grouping [`ObservationRow`]s by year. A year appears here only
/// if it has at least one valid monthly observation; the mean is unweighted
/// across the months that are present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualAverage {
    /// Calendar year.
    pub year: i32,
    /// Mean of the year's monthly average temperatures, in degrees Celsius.
    pub mean_temperature: f64,
}

/// The retrieval result for one city: the surviving monthly observations and
/// the annual averages derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySeries {
    /// Monthly observations within the requested range, ordered by
    /// (year, month).
    pub rows: Vec<ObservationRow>,
    /// Per-year means, ordered by year.
    pub annual: Vec<AnnualAverage>,
}
