//! Command line interface.

pub mod command;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use luftdaten::{Luftdaten, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Mirrors the Luftdaten sensor archive and aggregates particulate readings
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command
#[derive(Args)]
pub struct Settings {
    /// Directory holding the raw mirror and aggregated output
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the archive
    #[arg(long, global = true)]
    pub archive_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Downloads in flight per sensor
    #[arg(long, global = true, default_value_t = 4)]
    pub concurrency: usize,
}

impl Settings {
    pub async fn client(&self) -> Result<Luftdaten> {
        let client = Luftdaten::builder()
            .maybe_data_dir(self.data_dir.clone())
            .maybe_archive_url(self.archive_url.clone())
            .timeout(Duration::from_secs(self.timeout_secs))
            .concurrency(self.concurrency)
            .build()
            .await?;
        Ok(client)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the first date the archive holds data for a sensor
    FindStartDate {
        /// Archive sensor code
        sensor: String,
        /// Start of the search window (YYYY-MM-DD), defaults to 2015-10-01
        #[arg(long)]
        earliest: Option<NaiveDate>,
        /// End of the search window (YYYY-MM-DD), defaults to today
        #[arg(long)]
        latest: Option<NaiveDate>,
    },
    /// Download every missing archive file for the configured sensors
    Download {
        /// Sensor configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Aggregate the mirrored data of the configured sensors
    Process {
        /// Sensor configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}
