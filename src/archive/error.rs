use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Failed to read response body from {0}")]
    ResponseBody(String, #[source] reqwest::Error),

    #[error("Search window is inverted: {earliest} is after {latest}")]
    InvalidWindow {
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    // The oracle answered inconsistently or the narrowing logic is broken.
    #[error("Start date search for sensor {sensor} reached an impossible state: {message}")]
    SearchInvariant { sensor: String, message: String },

    #[error("Sensor {0} has no start date to sync from")]
    MissingStartDate(String),

    #[error("Failed to scan mirror directory '{0}'")]
    MirrorScan(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Why a single file could not be mirrored. Recorded in the sync report, never raised.
#[derive(Debug, Error)]
pub enum DownloadFailure {
    #[error("archive answered with HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("failed to write '{0}'")]
    Write(PathBuf, #[source] std::io::Error),
}
