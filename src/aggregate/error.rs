use crate::archive::error::ArchiveError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Failed to list mirrored files")]
    Mirror(#[from] ArchiveError),

    #[error("Failed to read raw CSV file '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Raw CSV file '{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Raw data for sensor {sensor} has {rows} rows without a valid timestamp")]
    NullTimestamps { sensor: String, rows: usize },

    #[error("Invalid year/month grouping key ({year:?}, {month:?})")]
    InvalidGroupKey {
        year: Option<i32>,
        month: Option<i32>,
    },

    #[error("Failed to clear previous output directory '{0}'")]
    ClearOutput(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing aggregated file '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing aggregated CSV file '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed to encode sensor summary")]
    SummaryEncode(#[from] serde_json::Error),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
