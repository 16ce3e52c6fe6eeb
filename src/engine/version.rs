//! Engine version resolution against the release index.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ControllerConfig;
use crate::defaults;
use crate::engine::release::{EngineVersion, ReleaseUrls};

/// Errors that can occur while resolving a version token.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Empty version token")]
    EmptyVersion,

    #[error("Release index request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Release index returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed release index response: {0}")]
    InvalidIndex(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

/// Turns `latest` or an explicit tag into a concrete [`EngineVersion`].
pub struct VersionResolver {
    client: Client,
    urls: ReleaseUrls,
    request_timeout: std::time::Duration,
}

impl VersionResolver {
    pub fn new(config: &ControllerConfig) -> Self {
        Self::with_client(config, config.http_client())
    }

    pub fn with_client(config: &ControllerConfig, client: Client) -> Self {
        Self {
            client,
            urls: ReleaseUrls::new(config),
            request_timeout: config.request_timeout,
        }
    }

    /// Resolve a version token.
    ///
    /// Only the literal `latest` touches the network. Any other token is
    /// normalized locally.
    pub async fn resolve(&self, token: &str) -> Result<EngineVersion> {
        let tag = if token.trim() == defaults::LATEST_ALIAS {
            self.latest_tag().await?
        } else {
            token.to_string()
        };

        EngineVersion::from_tag(&tag).ok_or(ResolveError::EmptyVersion)
    }

    /// Fetch the tag of the most recent published release.
    pub async fn latest_tag(&self) -> Result<String> {
        let url = self.urls.latest_release();
        log::debug!("Querying release index {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .timeout(self.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResolveError::Status(response.status()));
        }

        let body = response.text().await?;
        let release: LatestRelease = serde_json::from_str(&body)
            .map_err(|e| ResolveError::InvalidIndex(e.to_string()))?;

        log::info!("Latest Apalache release is {}", release.tag_name);
        Ok(release.tag_name)
    }
}
