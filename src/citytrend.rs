//! The main entry point for fetching city temperature trends.
//!
//! A [`CityTrend`] client resolves a coordinate to the nearest weather
//! stations, retrieves their monthly data, aggregates it into annual
//! averages, and builds chart-ready views for a single city or a multi-city
//! comparison.

use crate::aggregate::annual_averages;
use crate::comparison::{
    run_comparison, AnnualSeriesSource, ComparisonView, DEFAULT_REQUEST_DELAY,
};
use crate::error::CityTrendError;
use crate::stations::locate_station::StationLocator;
use crate::types::observation::CitySeries;
use crate::types::point::LatLon;
use crate::types::query_range::QueryRange;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use crate::view::{build_single_city_view, SingleCityView};
use crate::weather_data::frame_fetcher::FrameFetcher;
use crate::weather_data::monthly_frame::MonthlyLazyFrame;
use bon::bon;
use std::path::PathBuf;
use std::time::Duration;

/// The main client for retrieving and aggregating city temperature data.
///
/// Handles station lookup, data download with on-disk caching, aggregation,
/// and view assembly. Create an instance with [`CityTrend::new()`] for the
/// default cache directory or [`CityTrend::with_cache_folder()`] to control
/// where downloads are stored.
///
/// # Examples
///
/// ```no_run
/// # use citytrend::{CityTrend, CityTrendError, LatLon, QueryRange};
/// # async fn run() -> Result<(), CityTrendError> {
/// let client = CityTrend::new().await?;
/// let guangzhou = LatLon(23.1291, 113.2644);
/// let range = QueryRange::new(1995, 2024)?;
///
/// if let Some(view) = client
///     .single_city()
///     .point(guangzhou)
///     .range(range)
///     .call()
///     .await?
/// {
///     println!(
///         "mean {:.1} °C, warmest {:.1} °C in {}",
///         view.stats.mean, view.stats.max_value, view.stats.max_year
///     );
/// }
/// # Ok(())
/// # }
/// ```
pub struct CityTrend {
    fetcher: FrameFetcher,
    station_locator: StationLocator,
}

#[bon]
impl CityTrend {
    /// Creates a client with a specific cache directory, creating the
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CityTrendError::CacheDirCreation`] if the directory cannot
    /// be created, and [`CityTrendError::LocateStation`] variants if the
    /// station list cannot be loaded.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, CityTrendError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| CityTrendError::CacheDirCreation(cache_folder.clone(), e))?;
        Ok(Self {
            station_locator: StationLocator::new(&cache_folder)
                .await
                .map_err(CityTrendError::from)?,
            fetcher: FrameFetcher::new(&cache_folder),
        })
    }

    /// Creates a client using the default cache directory (resolved via the
    /// `dirs` crate, e.g. `~/.cache/citytrend_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`CityTrendError::CacheDirResolution`] if no cache directory
    /// can be determined, plus the errors of
    /// [`CityTrend::with_cache_folder()`].
    pub async fn new() -> Result<Self, CityTrendError> {
        let cache_folder = get_cache_dir().map_err(CityTrendError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    /// Fetches monthly observations for a point and aggregates them into
    /// annual averages.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.point(LatLon)`: **Required.** The query coordinate.
    /// * `.range(QueryRange)`: **Required.** The year range; one retrieval
    ///   covers the whole span.
    /// * `.max_distance_km(f64)`: Optional. Station search radius, default 50.
    /// * `.station_limit(usize)`: Optional. How many candidate stations to
    ///   try, closest first, default 3. The first station whose data fetch
    ///   succeeds wins.
    /// * `.require_inventory(bool)`: Optional, default `false`. When set,
    ///   only stations whose reported monthly inventory covers the whole
    ///   range are considered. The metadata errs on the pessimistic side, so
    ///   this trades recall for fewer wasted downloads.
    ///
    /// # Returns
    ///
    /// `Ok(Some(CitySeries))` with the surviving rows and annual means,
    /// or `Ok(None)` when the provider has no usable rows for the range.
    /// "No data" is an outcome, not a failure, and callers must treat the
    /// two differently.
    ///
    /// # Errors
    ///
    /// Returns [`CityTrendError::NoStationWithinRadius`] when no candidate
    /// station exists, [`CityTrendError::NoDataForNearbyStations`] when every
    /// candidate's fetch failed, and [`CityTrendError::WeatherData`] variants
    /// for download or parse failures of the chosen station.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use citytrend::{CityTrend, CityTrendError, LatLon, QueryRange};
    /// # async fn run() -> Result<(), CityTrendError> {
    /// let client = CityTrend::new().await?;
    /// let series = client
    ///     .annual_series()
    ///     .point(LatLon(39.9042, 116.4074))
    ///     .range(QueryRange::new(2000, 2020)?)
    ///     .call()
    ///     .await?;
    ///
    /// match series {
    ///     Some(series) => println!("{} years of data", series.annual.len()),
    ///     None => println!("no data for this range"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn annual_series(
        &self,
        point: LatLon,
        range: QueryRange,
        max_distance_km: Option<f64>,
        station_limit: Option<usize>,
        require_inventory: Option<bool>,
    ) -> Result<Option<CitySeries>, CityTrendError> {
        let max_distance_km = max_distance_km.unwrap_or(50.0);
        let station_limit = station_limit.unwrap_or(3);
        let require_inventory = require_inventory.unwrap_or(false);

        let frame = self
            .monthly_frame_near(
                point,
                max_distance_km,
                station_limit,
                require_inventory.then_some(range),
            )
            .await?;

        let rows = frame.filter_years(range).collect_observations()?;
        if rows.is_empty() {
            return Ok(None);
        }
        let annual = annual_averages(&rows);
        Ok(Some(CitySeries { rows, annual }))
    }

    /// Fetches one city and assembles the single-city presentation: one
    /// series per calendar month, the annual trend, and summary statistics.
    ///
    /// This method uses a builder pattern; it accepts the same arguments as
    /// [`CityTrend::annual_series`] and returns `Ok(None)` in the same
    /// "no data" case.
    #[builder]
    pub async fn single_city(
        &self,
        point: LatLon,
        range: QueryRange,
        max_distance_km: Option<f64>,
        station_limit: Option<usize>,
        require_inventory: Option<bool>,
    ) -> Result<Option<SingleCityView>, CityTrendError> {
        let series = self
            .annual_series()
            .point(point)
            .range(range)
            .maybe_max_distance_km(max_distance_km)
            .maybe_station_limit(station_limit)
            .maybe_require_inventory(require_inventory)
            .call()
            .await?;

        match series {
            Some(series) => Ok(Some(build_single_city_view(&series.rows, &series.annual)?)),
            None => Ok(None),
        }
    }

    /// Runs a multi-city comparison over an ordered list of (name, point)
    /// pairs, fetching each city sequentially.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.cities(Vec<(String, LatLon)>)`: **Required.** At most 10 cities;
    ///   typically produced by [`crate::CityRegistry::selection`].
    /// * `.range(QueryRange)`: **Required.**
    /// * `.delay(Duration)`: Optional. Pause between successive retrievals,
    ///   default 500 ms; pass `Duration::ZERO` to disable.
    ///
    /// # Returns
    ///
    /// A [`ComparisonView`] whose `series` and `stats_table` follow the
    /// input city order. Cities whose retrieval failed, that had no data, or
    /// whose series failed the plausibility bound appear only in `rejected`;
    /// an all-rejected batch yields an empty view, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CityTrendError::TooManyCities`] before any retrieval when
    /// more than ten cities are requested.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use citytrend::{CityTrend, CityTrendError, LatLon, QueryRange};
    /// # async fn run() -> Result<(), CityTrendError> {
    /// let client = CityTrend::new().await?;
    /// let view = client
    ///     .compare()
    ///     .cities(vec![
    ///         ("Beijing".to_string(), LatLon(39.9042, 116.4074)),
    ///         ("Guangzhou".to_string(), LatLon(23.1291, 113.2644)),
    ///     ])
    ///     .range(QueryRange::new(1995, 2024)?)
    ///     .call()
    ///     .await?;
    ///
    /// for entry in &view.stats_table {
    ///     println!("{}: mean {:.1} °C", entry.name, entry.stats.mean);
    /// }
    /// for rejected in &view.rejected {
    ///     eprintln!("{} skipped: {}", rejected.name, rejected.reason);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn compare(
        &self,
        cities: Vec<(String, LatLon)>,
        range: QueryRange,
        delay: Option<Duration>,
    ) -> Result<ComparisonView, CityTrendError> {
        run_comparison(
            self,
            &cities,
            range,
            delay.unwrap_or(DEFAULT_REQUEST_DELAY),
        )
        .await
    }

    /// Finds candidate stations near `point` and returns the monthly frame
    /// of the closest one whose data fetch succeeds.
    async fn monthly_frame_near(
        &self,
        point: LatLon,
        max_distance_km: f64,
        station_limit: usize,
        required_years: Option<QueryRange>,
    ) -> Result<MonthlyLazyFrame, CityTrendError> {
        let stations = self.station_locator.query(
            point.0,
            point.1,
            station_limit,
            max_distance_km,
            required_years,
        );

        if stations.is_empty() {
            return Err(CityTrendError::NoStationWithinRadius {
                radius: max_distance_km,
                lat: point.0,
                lon: point.1,
            });
        }

        let mut last_error: Option<CityTrendError> = None;
        for (station, _distance) in &stations {
            match self.fetcher.monthly_frame(&station.id).await {
                Ok(frame) => return Ok(frame),
                Err(e) => last_error = Some(CityTrendError::from(e)),
            }
        }

        Err(CityTrendError::NoDataForNearbyStations {
            radius: max_distance_km,
            lat: point.0,
            lon: point.1,
            stations_tried: stations.len(),
            last_error: last_error.map(Box::new),
        })
    }
}

impl AnnualSeriesSource for CityTrend {
    async fn fetch_annual_series(
        &self,
        point: LatLon,
        range: QueryRange,
    ) -> Result<Option<CitySeries>, CityTrendError> {
        self.annual_series().point(point).range(range).call().await
    }
}
