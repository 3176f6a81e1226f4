use crate::registry::RegistryError;
use crate::stations::error::LocateStationError;
use crate::weather_data::error::WeatherDataError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CityTrendError {
    #[error(transparent)]
    WeatherData(#[from] WeatherDataError),

    #[error(transparent)]
    LocateStation(#[from] LocateStationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("No weather station within {radius} km of ({lat}, {lon})")]
    NoStationWithinRadius { radius: f64, lat: f64, lon: f64 },

    #[error("Tried {stations_tried} station(s) within {radius} km of ({lat}, {lon}), but none had retrievable monthly data")]
    NoDataForNearbyStations {
        radius: f64,
        lat: f64,
        lon: f64,
        stations_tried: usize,
        #[source]
        last_error: Option<Box<CityTrendError>>,
    },

    #[error("Invalid coordinate ({lat}, {lon}): latitude must lie in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Invalid year range: start year {start} must be before end year {end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Year {year} is outside the supported range [{min}, {max}]")]
    YearOutOfBounds { year: i32, min: i32, max: i32 },

    #[error("Too many cities: {given} requested, at most {max} per comparison")]
    TooManyCities { given: usize, max: usize },

    #[error("Annual series is empty")]
    EmptySeries,

    #[error("Annual series contains year {0} more than once")]
    DuplicateYear(i32),
}
