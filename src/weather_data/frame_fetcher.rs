use crate::weather_data::data_loader::MonthlyDataLoader;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::monthly_frame::MonthlyLazyFrame;
use polars::prelude::LazyFrame;
use std::collections::{hash_map::Entry, HashMap};
use std::path::Path;
use tokio::sync::Mutex;

/// Per-process memo of monthly LazyFrames, keyed by station id, backed by the
/// on-disk loader.
pub struct FrameFetcher {
    loader: MonthlyDataLoader,
    lazyframe_cache: Mutex<HashMap<String, LazyFrame>>,
}

impl FrameFetcher {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            loader: MonthlyDataLoader::new(cache_dir),
            lazyframe_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Gets the monthly frame for a station, using the memo if possible.
    pub async fn monthly_frame(&self, station: &str) -> Result<MonthlyLazyFrame, WeatherDataError> {
        // Fast path: already memoized.
        {
            let cache = self.lazyframe_cache.lock().await;
            if let Some(cached) = cache.get(station) {
                return Ok(MonthlyLazyFrame::new(cached.clone()));
            }
            // Release the lock before the potentially slow load.
        }

        let loaded_frame = self.loader.get_frame(station).await?;

        let mut cache = self.lazyframe_cache.lock().await;
        match cache.entry(station.to_string()) {
            Entry::Occupied(entry) => {
                // Another task loaded it while we were downloading; use theirs.
                Ok(MonthlyLazyFrame::new(entry.get().clone()))
            }
            Entry::Vacant(entry) => {
                entry.insert(loaded_frame.clone());
                Ok(MonthlyLazyFrame::new(loaded_frame))
            }
        }
    }
}
