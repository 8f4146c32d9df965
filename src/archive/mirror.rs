//! Keeps a local mirror of a sensor's archive files up to date.
//!
//! The mirror is append-only: files already present are trusted as-is and never
//! fetched again, files that fail to download are reported and picked up again
//! on the next run.

use crate::archive::error::{ArchiveError, DownloadFailure};
use crate::types::archive_file::ArchiveFile;
use crate::types::sensor::Sensor;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use futures_util::{stream, StreamExt};
use log::{info, warn};
use reqwest::StatusCode;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::{fs, task};

const DEFAULT_CONCURRENCY: usize = 4;

/// The result of asking the archive for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The archive returned the file's contents.
    Found(Vec<u8>),
    /// The archive answered, but not with a success status.
    Missing(StatusCode),
}

#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch(&self, file: &ArchiveFile) -> Result<FetchOutcome, ArchiveError>;
}

#[async_trait]
impl<T: ArchiveFetcher + ?Sized> ArchiveFetcher for Arc<T> {
    async fn fetch(&self, file: &ArchiveFile) -> Result<FetchOutcome, ArchiveError> {
        (**self).fetch(file).await
    }
}

#[derive(Debug)]
pub struct FailedDownload {
    pub file: ArchiveFile,
    pub reason: DownloadFailure,
}

/// What one sync run did for one sensor.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub sensor_code: String,
    /// Number of days the mirror should hold.
    pub required: usize,
    /// Number of those days that were already mirrored.
    pub already_present: usize,
    pub downloaded: Vec<ArchiveFile>,
    pub failed: Vec<FailedDownload>,
}

impl SyncReport {
    /// Number of fetches issued during the run.
    pub fn fetched(&self) -> usize {
        self.downloaded.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Every archive file a sensor should have for `start..end` (end exclusive).
pub fn required_files(
    sensor_code: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeSet<ArchiveFile> {
    start
        .iter_days()
        .take_while(|date| *date < end)
        .map(|date| ArchiveFile::new(sensor_code, date))
        .collect()
}

/// The archive files of `sensor_code` already present in the mirror.
///
/// Only files at their canonical location (`<date>/<filename>`) are recognised.
/// A mirror directory that does not exist yet is simply empty.
pub async fn scan_mirror(
    mirror_dir: &Path,
    sensor_code: &str,
) -> Result<BTreeSet<ArchiveFile>, ArchiveError> {
    let scan_err = |path: &Path, e: io::Error| ArchiveError::MirrorScan(path.to_path_buf(), e);
    let mut present = BTreeSet::new();

    let mut date_dirs = match fs::read_dir(mirror_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(present),
        Err(e) => return Err(scan_err(mirror_dir, e)),
    };

    while let Some(date_dir) = date_dirs
        .next_entry()
        .await
        .map_err(|e| scan_err(mirror_dir, e))?
    {
        let dir_path = date_dir.path();
        let is_dir = date_dir
            .file_type()
            .await
            .map_err(|e| scan_err(&dir_path, e))?
            .is_dir();
        if !is_dir {
            continue;
        }
        let dir_name = date_dir.file_name();

        let mut files = fs::read_dir(&dir_path)
            .await
            .map_err(|e| scan_err(&dir_path, e))?;
        while let Some(entry) = files
            .next_entry()
            .await
            .map_err(|e| scan_err(&dir_path, e))?
        {
            let Some(file) = entry
                .file_name()
                .to_str()
                .and_then(ArchiveFile::parse_filename)
            else {
                continue;
            };
            let in_date_dir = dir_name.to_str() == Some(file.date_dir().as_str());
            if file.sensor_code == sensor_code && in_date_dir {
                present.insert(file);
            }
        }
    }

    Ok(present)
}

/// Downloads the archive files a sensor is missing from the local mirror.
pub struct MirrorSynchronizer<F> {
    fetcher: F,
    mirror_dir: PathBuf,
    concurrency: usize,
}

impl<F: ArchiveFetcher> MirrorSynchronizer<F> {
    pub fn new(fetcher: F, mirror_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            mirror_dir: mirror_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Maximum number of downloads in flight at once. `1` downloads sequentially.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn mirror_dir(&self) -> &Path {
        &self.mirror_dir
    }

    /// Brings the mirror up to date with everything up to (but excluding) today.
    pub async fn sync(&self, sensor: &Sensor) -> Result<SyncReport, ArchiveError> {
        self.sync_until(sensor, Local::now().date_naive()).await
    }

    /// Mirrors every day from the sensor's start date up to, but excluding, `end`.
    ///
    /// The required set is recomputed on every call. Per-file failures (non-success
    /// status, failed local write) are collected in the report and do not stop the
    /// remaining downloads.
    ///
    /// # Errors
    ///
    /// * [`ArchiveError::MissingStartDate`] if the sensor has no start date.
    /// * [`ArchiveError::MirrorScan`] if the mirror cannot be read.
    /// * Transport errors from the fetcher, which abort the run. Files written before
    ///   the error stay in the mirror.
    pub async fn sync_until(
        &self,
        sensor: &Sensor,
        end: NaiveDate,
    ) -> Result<SyncReport, ArchiveError> {
        let start = sensor
            .start_date
            .ok_or_else(|| ArchiveError::MissingStartDate(sensor.code.clone()))?;

        let required = required_files(&sensor.code, start, end);
        let present = scan_mirror(&self.mirror_dir, &sensor.code).await?;
        let missing: Vec<ArchiveFile> = required.difference(&present).cloned().collect();
        info!(
            "Sensor {}: {} files required, {} to download",
            sensor.code,
            required.len(),
            missing.len()
        );

        let mut report = SyncReport {
            sensor_code: sensor.code.clone(),
            required: required.len(),
            already_present: required.intersection(&present).count(),
            ..Default::default()
        };
        let mut downloads = pin!(stream::iter(missing)
            .map(|file| async move {
                let outcome = self.mirror_file(&file).await;
                (file, outcome)
            })
            .buffer_unordered(self.concurrency));

        while let Some((file, outcome)) = downloads.next().await {
            match outcome {
                Ok(Ok(())) => report.downloaded.push(file),
                Ok(Err(reason)) => {
                    warn!("{} download failed: {}", file, reason);
                    report.failed.push(FailedDownload { file, reason });
                }
                Err(e) => {
                    // Files written so far stay in the mirror and count as present next run.
                    warn!(
                        "Sensor {}: sync aborted at {} after writing {} files: {}",
                        sensor.code,
                        file,
                        report.downloaded.len(),
                        e
                    );
                    return Err(e);
                }
            }
        }
        info!(
            "Sensor {}: downloaded {}, failed {}",
            sensor.code,
            report.downloaded.len(),
            report.failed.len()
        );

        Ok(report)
    }

    async fn mirror_file(
        &self,
        file: &ArchiveFile,
    ) -> Result<Result<(), DownloadFailure>, ArchiveError> {
        match self.fetcher.fetch(file).await? {
            FetchOutcome::Found(payload) => {
                write_payload(file.local_path(&self.mirror_dir), payload).await
            }
            FetchOutcome::Missing(status) => Ok(Err(DownloadFailure::HttpStatus(status))),
        }
    }
}

/// Writes `payload` to `path` through a temporary file in the same directory, so a
/// partially written file never carries a canonical name. Existing files are kept.
async fn write_payload(
    path: PathBuf,
    payload: Vec<u8>,
) -> Result<Result<(), DownloadFailure>, ArchiveError> {
    let written = task::spawn_blocking(move || {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let write = || -> io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut temp_file = NamedTempFile::new_in(&dir)?;
            temp_file.write_all(&payload)?;
            temp_file.flush()?;
            temp_file.persist_noclobber(&path).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|e| DownloadFailure::Write(path.clone(), e))
    })
    .await?;
    Ok(written)
}
