//! HTTP access to the Luftdaten archive.

use crate::archive::error::ArchiveError;
use crate::archive::mirror::{ArchiveFetcher, FetchOutcome};
use crate::archive::oracle::ExistenceOracle;
use crate::types::archive_file::{ArchiveFile, DEFAULT_ARCHIVE_URL};
use async_trait::async_trait;
use bon::bon;
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the remote archive over HTTP.
///
/// Acts both as the [`ExistenceOracle`] used by start date discovery and as the
/// [`ArchiveFetcher`] used by mirror synchronisation. No retries are made here;
/// the request timeout is the only bound on a hanging archive.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    archive_url: String,
    http: Client,
}

#[bon]
impl ArchiveClient {
    /// Creates a client for the archive at `archive_url` (defaults to the public archive).
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::ClientBuild`] if the TLS backend cannot be initialised.
    #[builder]
    pub fn new(
        #[builder(into)] archive_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ArchiveError> {
        let http = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(ArchiveError::ClientBuild)?;
        Ok(Self {
            archive_url: archive_url.unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string()),
            http,
        })
    }

    pub fn archive_url(&self) -> &str {
        &self.archive_url
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ArchiveError> {
        self.http
            .get(url)
            .send()
            .await
            .map_err(|e| ArchiveError::NetworkRequest(url.to_string(), e))
    }
}

#[async_trait]
impl ExistenceOracle for ArchiveClient {
    async fn has_data(&self, file: &ArchiveFile) -> Result<bool, ArchiveError> {
        let url = file.url(&self.archive_url);
        let response = self.get(&url).await?;
        let status = response.status();
        debug!("Existence check {} -> {}", url, status);
        Ok(status.as_u16() < 400)
    }
}

#[async_trait]
impl ArchiveFetcher for ArchiveClient {
    async fn fetch(&self, file: &ArchiveFile) -> Result<FetchOutcome, ArchiveError> {
        let url = file.url(&self.archive_url);
        info!("Downloading {}", url);
        let response = self.get(&url).await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(FetchOutcome::Missing(status));
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| ArchiveError::ResponseBody(url.clone(), e))?;
        Ok(FetchOutcome::Found(payload.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_archive_url() -> Result<(), ArchiveError> {
        let client = ArchiveClient::builder().build()?;
        assert_eq!(client.archive_url(), "http://archive.luftdaten.info");
        Ok(())
    }

    #[test]
    fn test_custom_archive_url() -> Result<(), ArchiveError> {
        let client = ArchiveClient::builder()
            .archive_url("http://127.0.0.1:9000")
            .timeout(Duration::from_secs(2))
            .build()?;
        assert_eq!(client.archive_url(), "http://127.0.0.1:9000");
        Ok(())
    }
}
