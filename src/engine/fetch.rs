//! Release archive and protocol descriptor fetching.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use reqwest::Client;
use tar::Archive;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::ControllerConfig;
use crate::defaults;
use crate::engine::cache::DownloadCache;
use crate::engine::release::{EngineVersion, ReleaseUrls};

/// Errors that can occur while fetching release files.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No regular file ending in {entry} found in {archive:?}")]
    ArtifactNotFound { archive: PathBuf, entry: String },

    #[error("Extraction task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Downloads release archives and protocol descriptors.
pub struct EngineFetcher {
    client: Client,
    urls: ReleaseUrls,
    cache: DownloadCache,
    request_timeout: std::time::Duration,
}

impl EngineFetcher {
    pub fn new(config: &ControllerConfig) -> Self {
        Self::with_client(config, config.http_client())
    }

    pub fn with_client(config: &ControllerConfig, client: Client) -> Self {
        Self {
            client,
            urls: ReleaseUrls::new(config),
            cache: DownloadCache::new(config.cache_dir.join("downloads")),
            request_timeout: config.request_timeout,
        }
    }

    pub fn urls(&self) -> &ReleaseUrls {
        &self.urls
    }

    pub fn cache(&self) -> &DownloadCache {
        &self.cache
    }

    /// Get the jar for `version`, downloading and extracting it if needed.
    ///
    /// An already extracted jar is returned without touching the network.
    /// An archive without the jar is reported as [`FetchError::ArtifactNotFound`].
    pub async fn ensure_artifact(&self, version: &EngineVersion) -> Result<PathBuf> {
        let jar_path = self.urls.artifact_path(version);
        if jar_path.is_file() {
            log::debug!("Using cached jar {:?}", jar_path);
            return Ok(jar_path);
        }

        match self.fetch_artifact(version).await? {
            Some(path) => Ok(path),
            None => Err(FetchError::ArtifactNotFound {
                archive: self.cache.path_for(&self.urls.archive(version)),
                entry: defaults::TGZ_JAR_NAME.to_string(),
            }),
        }
    }

    /// Download the release archive and extract the jar from it.
    ///
    /// Returns `Ok(None)` when the archive has no matching entry; no file is
    /// written in that case. An archive that fails to decompress is evicted
    /// from the download cache.
    pub async fn fetch_artifact(&self, version: &EngineVersion) -> Result<Option<PathBuf>> {
        let url = self.urls.archive(version);
        let archive = self.cache.fetch(&self.client, &url).await?;
        let dest = self.urls.artifact_path(version);
        std::fs::create_dir_all(self.urls.artifact_dir())?;

        let extracted = match tokio::task::spawn_blocking(move || {
            extract_entry(&archive, defaults::TGZ_JAR_NAME, &dest)
        })
        .await
        .map_err(|e| FetchError::Task(e.to_string()))?
        {
            Ok(extracted) => extracted,
            Err(e) => {
                // A body that is not a readable archive must not stay cached.
                log::warn!("Discarding unreadable archive {}: {}", url, e);
                self.cache.evict(&url)?;
                return Err(e);
            }
        };

        match &extracted {
            Some(path) => log::info!("Installed Apalache {} at {:?}", version, path),
            None => log::warn!("Archive for {} has no {}", version, defaults::TGZ_JAR_NAME),
        }
        Ok(extracted)
    }

    /// Fetch the text of `cmdExecutor.proto` for `version`.
    pub async fn fetch_protocol(&self, version: &EngineVersion) -> Result<String> {
        let url = self.urls.protocol(version);
        log::debug!("Fetching protocol descriptor {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Stream a gzip-compressed tar archive and copy out the first regular file
/// whose name ends with `suffix` to `dest`.
///
/// Stops at the first match. Returns `Ok(None)` without writing anything when
/// no entry matches.
pub fn extract_entry(archive: &Path, suffix: &str, dest: &Path) -> Result<Option<PathBuf>> {
    let file = File::open(archive)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut archive = Archive::new(decoder);

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry.path()?.to_string_lossy().into_owned();
        if !name.ends_with(suffix) {
            continue;
        }

        log::debug!("Extracting {} to {:?}", name, dest);
        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        io::copy(&mut entry, tmp.as_file_mut())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Owner read/write always; no setuid, setgid or sticky bits.
            let mode = (entry.header().mode().unwrap_or(0o644) & 0o755) | 0o644;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(mode))?;
        }

        tmp.persist(dest).map_err(|e| FetchError::Io(e.error))?;
        return Ok(Some(dest.to_path_buf()));
    }

    Ok(None)
}
