//! Grid download from the NOMADS HRRR filter service.
//!
//! Each request asks the filter for the MSLMA field at mean sea level of one
//! forecast step, so the response is a small single-message GRIB2 file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use mslp_common::{grib_file_name, ForecastCycle, ForecastStep};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

/// NOMADS grib filter for HRRR 2-D surface fields.
pub const DEFAULT_BASE_URL: &str = "https://nomads.ncep.noaa.gov/cgi-bin/filter_hrrr_2d.pl";

/// Size of the write buffer between the response stream and the file.
pub const WRITE_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid archive URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP transfer of {file} failed: {source}")]
    Transport {
        file: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fetches one grid file per forecast step into a directory.
pub struct GridFetcher {
    client: Client,
    base_url: Url,
    grib_dir: PathBuf,
}

impl GridFetcher {
    pub fn new(base_url: &str, grib_dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url,
            grib_dir: grib_dir.into(),
        })
    }

    pub fn grib_dir(&self) -> &Path {
        &self.grib_dir
    }

    /// Filter URL for one step, with URL-encoded query values.
    pub fn request_url(&self, cycle: &ForecastCycle, step: ForecastStep) -> Url {
        let dir = format!("/hrrr.{}/conus", cycle.date_str());
        let file = grib_file_name(cycle, step);

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("dir", &dir)
            .append_pair("file", &file)
            .append_pair("var_MSLMA", "on")
            .append_pair("lev_mean_sea_level", "on");
        url
    }

    /// Download one step.
    ///
    /// Returns `Ok(None)` without touching the filesystem when the archive
    /// answers with anything but 200. Transport and write failures are
    /// errors.
    #[instrument(skip_all, fields(cycle = %cycle, step = %step))]
    pub async fn fetch(
        &self,
        cycle: &ForecastCycle,
        step: ForecastStep,
    ) -> Result<Option<PathBuf>, FetchError> {
        let file_name = grib_file_name(cycle, step);
        let url = self.request_url(cycle, step);
        debug!(url = %url, "Requesting grid");

        let transport = |source| FetchError::Transport {
            file: file_name.clone(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(
                file = %file_name,
                status = status.as_u16(),
                "Failed to download {}: HTTP {}",
                file_name,
                status.as_u16()
            );
            return Ok(None);
        }

        let path = self.grib_dir.join(&file_name);
        let io_error = |source| FetchError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).await.map_err(io_error)?;
        let mut writer = BufWriter::with_capacity(WRITE_CHUNK_SIZE, file);

        let mut stream = response.bytes_stream();
        let mut bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(transport)?;
            writer.write_all(&chunk).await.map_err(io_error)?;
            bytes += chunk.len() as u64;
        }
        writer.flush().await.map_err(io_error)?;

        info!(file = %file_name, bytes, "Downloaded {}", file_name);
        Ok(Some(path))
    }
}
