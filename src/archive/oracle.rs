//! The existence oracle answers "does the archive hold data for this sensor on this day?".
//!
//! [`DateAvailabilityCache`] memoises those answers for the duration of one
//! start date search, so overlapping narrowed windows never repeat a remote check.

use crate::archive::error::ArchiveError;
use crate::types::archive_file::ArchiveFile;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait ExistenceOracle: Send + Sync {
    /// Whether `file` exists in the archive. Transport failures are returned as errors,
    /// never as `false`.
    async fn has_data(&self, file: &ArchiveFile) -> Result<bool, ArchiveError>;
}

#[async_trait]
impl<T: ExistenceOracle + ?Sized> ExistenceOracle for Arc<T> {
    async fn has_data(&self, file: &ArchiveFile) -> Result<bool, ArchiveError> {
        (**self).has_data(file).await
    }
}

/// Memoised `(sensor code, date) -> has data` answers.
///
/// Process local and never persisted. Create one per top-level search; sharing one
/// between concurrent searches requires external synchronisation.
#[derive(Debug, Default, Clone)]
pub struct DateAvailabilityCache {
    entries: HashMap<(String, NaiveDate), bool>,
}

impl DateAvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sensor_code: &str, date: NaiveDate) -> Option<bool> {
        self.entries.get(&(sensor_code.to_string(), date)).copied()
    }

    pub fn insert(&mut self, sensor_code: &str, date: NaiveDate, has_data: bool) {
        self.entries.insert((sensor_code.to_string(), date), has_data);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Answers from the cache, asking `oracle` only for dates not seen before.
    pub async fn check<O: ExistenceOracle + ?Sized>(
        &mut self,
        oracle: &O,
        sensor_code: &str,
        date: NaiveDate,
    ) -> Result<bool, ArchiveError> {
        if let Some(has_data) = self.get(sensor_code, date) {
            debug!("Cache hit for sensor {} on {}", sensor_code, date);
            return Ok(has_data);
        }

        let file = ArchiveFile::new(sensor_code, date);
        let has_data = oracle.has_data(&file).await?;
        debug!(
            "{} {}",
            file,
            if has_data { "has data" } else { "no data" }
        );
        self.insert(sensor_code, date, has_data);
        Ok(has_data)
    }
}
