//! The main entry point: discovers sensor start dates, keeps the local mirror of the
//! Luftdaten archive up to date and aggregates the mirrored data.

use crate::aggregate::summary::ProcessingSummary;
use crate::aggregate::Aggregator;
use crate::archive::client::ArchiveClient;
use crate::archive::mirror::{MirrorSynchronizer, SyncReport};
use crate::archive::start_date::StartDateFinder;
use crate::error::LuftdatenError;
use crate::types::sensor::Sensor;
use crate::utils::{aggregated_dir, ensure_dir_exists, get_data_dir, raw_dir};
use bon::bon;
use chrono::{Local, NaiveDate};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// What happened when a single sensor was synced.
#[derive(Debug)]
pub enum SensorSyncStatus {
    /// The mirror was brought up to date. Individual files may still have failed,
    /// see [`SyncReport::failed`].
    Synced(SyncReport),
    /// The sensor has no configured start date and none could be discovered, so
    /// nothing was downloaded.
    StartDateUnknown,
}

/// The client struct for the Luftdaten archive mirror.
///
/// All files live below one data directory: the raw mirror in
/// `<data_dir>/luftdaten/raw` and aggregated output in `<data_dir>/luftdaten/aggregated`.
///
/// # Examples
///
/// ```rust,no_run
/// # use luftdaten::{Luftdaten, LuftdatenError};
/// # async fn run() -> Result<(), LuftdatenError> {
/// let client = Luftdaten::builder().concurrency(8).build().await?;
/// let start = client.find_start_date().sensor_code("12345").call().await?;
/// println!("{:?}", start);
/// # Ok(())
/// # }
/// ```
pub struct Luftdaten {
    data_dir: PathBuf,
    finder: StartDateFinder<Arc<ArchiveClient>>,
    synchronizer: MirrorSynchronizer<Arc<ArchiveClient>>,
    aggregator: Aggregator,
    today: Option<NaiveDate>,
}

#[bon]
impl Luftdaten {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `.data_dir(PathBuf)`: Optional. Defaults to `luftdaten_rs` in the user's data directory. Created if missing.
    /// * `.archive_url(String)`: Optional. Base URL of the archive, defaults to the public archive.
    /// * `.timeout(Duration)`: Optional. Per-request timeout, defaults to 30 seconds.
    /// * `.concurrency(usize)`: Optional. Downloads in flight per sensor, defaults to 4.
    /// * `.today(NaiveDate)`: Optional. Pins the date used as "today" instead of the local clock.
    ///
    /// # Errors
    ///
    /// Returns [`LuftdatenError::DataDirResolution`] if no default data directory exists,
    /// [`LuftdatenError::DataDirCreation`] if the data directory cannot be created, or an
    /// [`LuftdatenError::Archive`] error if the HTTP client cannot be built.
    #[builder]
    pub async fn new(
        data_dir: Option<PathBuf>,
        #[builder(into)] archive_url: Option<String>,
        timeout: Option<Duration>,
        concurrency: Option<usize>,
        today: Option<NaiveDate>,
    ) -> Result<Self, LuftdatenError> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => get_data_dir()?,
        };
        ensure_dir_exists(&data_dir)
            .await
            .map_err(|e| LuftdatenError::DataDirCreation(data_dir.clone(), e))?;

        let client = Arc::new(
            ArchiveClient::builder()
                .maybe_archive_url(archive_url)
                .maybe_timeout(timeout)
                .build()?,
        );

        let mut finder = StartDateFinder::new(Arc::clone(&client));
        if let Some(today) = today {
            finder = finder.with_today(today);
        }
        let mut synchronizer = MirrorSynchronizer::new(client, raw_dir(&data_dir));
        if let Some(concurrency) = concurrency {
            synchronizer = synchronizer.with_concurrency(concurrency);
        }

        Ok(Self {
            aggregator: Aggregator::new(&data_dir),
            data_dir,
            finder,
            synchronizer,
            today,
        })
    }

    /// Creates a client with default settings storing its files in `data_dir`.
    pub async fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, LuftdatenError> {
        Self::builder().data_dir(data_dir.into()).build().await
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn raw_dir(&self) -> PathBuf {
        raw_dir(&self.data_dir)
    }

    pub fn aggregated_dir(&self) -> PathBuf {
        aggregated_dir(&self.data_dir)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.aggregator.summary_path()
    }

    /// Finds the first date the archive holds data for a sensor.
    ///
    /// # Arguments
    ///
    /// * `.sensor_code(impl Into<String>)`: **Required.** The archive sensor code.
    /// * `.earliest(NaiveDate)`: Optional. Lower bound of the search, defaults to 2015-10-01.
    /// * `.latest(NaiveDate)`: Optional. Upper bound of the search, defaults to today.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no data was found in the window.
    #[builder]
    pub async fn find_start_date(
        &self,
        #[builder(into)] sensor_code: String,
        earliest: Option<NaiveDate>,
        latest: Option<NaiveDate>,
    ) -> Result<Option<NaiveDate>, LuftdatenError> {
        Ok(self
            .finder
            .find_start_date(&sensor_code, earliest, latest)
            .await?)
    }

    /// Brings the mirror of one sensor up to date, discovering its start date first
    /// if it was not configured.
    pub async fn sync_sensor(&self, sensor: &Sensor) -> Result<SensorSyncStatus, LuftdatenError> {
        let sensor = match sensor.start_date {
            Some(_) => sensor.clone(),
            None => {
                info!("Sensor {} has no start date, discovering it", sensor);
                match self.finder.find_start_date(&sensor.code, None, None).await? {
                    Some(start_date) => sensor.with_start_date(start_date),
                    None => {
                        warn!("No archived data found for sensor {}, skipping", sensor);
                        return Ok(SensorSyncStatus::StartDateUnknown);
                    }
                }
            }
        };

        let end = self.today.unwrap_or_else(|| Local::now().date_naive());
        let report = self.synchronizer.sync_until(&sensor, end).await?;
        Ok(SensorSyncStatus::Synced(report))
    }

    /// Syncs every sensor in turn. A sensor that fails does not stop the others; each
    /// result is returned alongside its sensor code.
    pub async fn sync_all(
        &self,
        sensors: &[Sensor],
    ) -> Vec<(String, Result<SensorSyncStatus, LuftdatenError>)> {
        let mut results = Vec::with_capacity(sensors.len());
        for sensor in sensors {
            let result = self.sync_sensor(sensor).await;
            if let Err(e) = &result {
                warn!("Sync failed for sensor {}: {}", sensor, e);
            }
            results.push((sensor.code.clone(), result));
        }
        results
    }

    /// Regenerates the aggregated files and summary for `sensors` from the mirror.
    pub async fn process(&self, sensors: &[Sensor]) -> Result<ProcessingSummary, LuftdatenError> {
        Ok(self.aggregator.process(sensors).await?)
    }
}
