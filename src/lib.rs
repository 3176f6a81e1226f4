mod aggregate;
mod citytrend;
mod comparison;
mod error;
mod registry;
mod stations;
mod types;
mod utils;
mod view;
mod weather_data;

pub use citytrend::CityTrend;
pub use error::CityTrendError;

pub use aggregate::{annual_averages, is_plausible, PLAUSIBLE_MAX_C, PLAUSIBLE_MIN_C};
pub use comparison::{
    run_comparison, AnnualSeriesSource, CityStats, ComparisonView, RejectedCity, RejectionReason,
    DEFAULT_REQUEST_DELAY, MAX_COMPARISON_CITIES,
};
pub use registry::{CityRegistry, RegistryError};
pub use view::{build_single_city_view, SeriesStats, SingleCityView};

pub use types::observation::{AnnualAverage, CitySeries, ObservationRow};
pub use types::point::LatLon;
pub use types::query_range::{QueryRange, MIN_QUERY_YEAR};
pub use types::station::{Inventory, Location, Station, YearRange};

pub use stations::error::LocateStationError;
pub use stations::locate_station::StationLocator;
pub use weather_data::error::WeatherDataError;
pub use weather_data::monthly_frame::MonthlyLazyFrame;
