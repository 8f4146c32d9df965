use crate::aggregate::error::AggregateError;
use crate::archive::error::ArchiveError;
use crate::config::error::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LuftdatenError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Failed to create data directory '{0}'")]
    DataDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine data directory")]
    DataDirResolution,
}
