mod aggregate;
mod archive;
mod config;
mod error;
mod luftdaten;
mod types;
mod utils;

pub use error::LuftdatenError;
pub use luftdaten::*;

pub use types::archive_file::{ArchiveFile, DEFAULT_ARCHIVE_URL};
pub use types::sensor::{Location, Sensor, SENSOR_TYPE};

pub use archive::client::ArchiveClient;
pub use archive::error::{ArchiveError, DownloadFailure};
pub use archive::mirror::{
    required_files, scan_mirror, ArchiveFetcher, FailedDownload, FetchOutcome,
    MirrorSynchronizer, SyncReport,
};
pub use archive::oracle::{DateAvailabilityCache, ExistenceOracle};
pub use archive::start_date::{sample_dates, SearchWindow, StartDateFinder, ARCHIVE_EPOCH};

pub use config::error::ConfigError;
pub use config::{load_sensors, parse_sensors, DEFAULT_CONFIG_PATH};

pub use aggregate::error::AggregateError;
pub use aggregate::summary::{AvailableDates, MonthEntry, ProcessingSummary, SensorSummary};
pub use aggregate::Aggregator;
