//! Download and on-disk caching of per-station monthly weather data.
//!
//! The Meteostat bulk endpoint serves one gzipped, header-less CSV per
//! station. The first download is parsed into a DataFrame and cached as
//! parquet; later loads scan the parquet lazily.

use crate::weather_data::error::WeatherDataError;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use polars::frame::DataFrame;
use polars::prelude::*;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::{fs, task};
use tokio_util::io::StreamReader;

/// Column names of the monthly bulk CSV, in file order.
pub(crate) const MONTHLY_SCHEMA: [&str; 9] = [
    "year", "month", "tavg", "tmin", "tmax", "prcp", "wspd", "pres", "tsun",
];

pub struct MonthlyDataLoader {
    cache_dir: PathBuf,
    download_client: Client,
}

impl MonthlyDataLoader {
    pub fn new(cache_dir: &Path) -> MonthlyDataLoader {
        MonthlyDataLoader {
            cache_dir: cache_dir.to_path_buf(),
            download_client: Client::new(),
        }
    }

    /// Loads the monthly LazyFrame for a station, downloading and caching it
    /// on first use.
    pub async fn get_frame(&self, station: &str) -> Result<LazyFrame, WeatherDataError> {
        let parquet_path = self.cache_dir.join(format!("monthly-{}.parquet", station));

        if fs::metadata(&parquet_path).await.is_ok() {
            info!(
                "Cache hit for monthly data for station {} at {:?}",
                station, parquet_path
            );
        } else {
            warn!(
                "Cache miss for monthly data for station {}. Downloading and processing.",
                station
            );
            let raw_bytes = self.download(station).await?;
            let df = Self::csv_to_dataframe(raw_bytes, station).await?;

            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| WeatherDataError::CacheDirCreation(self.cache_dir.clone(), e))?;
            Self::cache_dataframe(df, &parquet_path).await?;
            info!(
                "Cached monthly data for station {} to {:?}",
                station, parquet_path
            );
        }

        LazyFrame::scan_parquet(&parquet_path, Default::default())
            .map_err(|e| WeatherDataError::ParquetScan(parquet_path.clone(), e))
    }

    /// Downloads and decompresses the monthly CSV for a station.
    async fn download(&self, station: &str) -> Result<Vec<u8>, WeatherDataError> {
        let url = format!("https://bulk.meteostat.net/v2/monthly/{}.csv.gz", station);
        info!("Downloading monthly data from {}", url);

        let response = self
            .download_client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    WeatherDataError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    WeatherDataError::NetworkRequest(url, e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let stream_reader = StreamReader::new(stream);
        let mut decoder = GzipDecoder::new(stream_reader);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .await
            .map_err(WeatherDataError::DownloadIo)?;
        info!(
            "Downloaded and decompressed {} bytes for station {}",
            decompressed.len(),
            station
        );
        Ok(decompressed)
    }

    /// Parses raw header-less CSV bytes into a DataFrame on a blocking task
    /// and assigns the monthly schema column names.
    async fn csv_to_dataframe(
        bytes: Vec<u8>,
        station: &str,
    ) -> Result<DataFrame, WeatherDataError> {
        let station_owned = station.to_string();

        task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new().map_err(|e| WeatherDataError::CsvReadIo {
                station: station_owned.clone(),
                source: e,
            })?;
            temp_file
                .write_all(&bytes)
                .and_then(|_| temp_file.flush())
                .map_err(|e| WeatherDataError::CsvReadIo {
                    station: station_owned.clone(),
                    source: e,
                })?;

            let mut df = CsvReadOptions::default()
                .with_has_header(false)
                .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
                .map_err(|e| WeatherDataError::CsvReadPolars {
                    station: station_owned.clone(),
                    source: e,
                })?
                .finish()
                .map_err(|e| WeatherDataError::CsvReadPolars {
                    station: station_owned.clone(),
                    source: e,
                })?;

            if df.width() != MONTHLY_SCHEMA.len() {
                warn!(
                    "CSV column count ({}) does not match the monthly schema ({}) for station {}",
                    df.width(),
                    MONTHLY_SCHEMA.len(),
                    station_owned
                );
                return Err(WeatherDataError::SchemaMismatch {
                    station: station_owned,
                    expected: MONTHLY_SCHEMA.len(),
                    found: df.width(),
                });
            }

            df.set_column_names(MONTHLY_SCHEMA.iter().copied())
                .map_err(|e| WeatherDataError::ColumnRename {
                    station: station_owned,
                    source: e,
                })?;

            Ok(df)
        })
        .await?
    }

    /// Writes a DataFrame to a parquet file on a blocking task.
    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), WeatherDataError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| WeatherDataError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| WeatherDataError::ParquetWritePolars(path_buf, e))?;
            Ok::<(), WeatherDataError>(())
        })
        .await??;
        Ok(())
    }
}
