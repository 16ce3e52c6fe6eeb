//! On-disk byte cache for downloaded release files, keyed by source URL.

use std::path::{Path, PathBuf};

use reqwest::Client;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::engine::fetch::{FetchError, Result};

/// Stores each downloaded URL under `<root>/<sha256(url)>`.
#[derive(Debug, Clone)]
pub struct DownloadCache {
    root: PathBuf,
}

impl DownloadCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path where `url` is (or would be) cached.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(hex::encode(Sha256::digest(url.as_bytes())))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.path_for(url).is_file()
    }

    /// Return the cached file for `url`, downloading it first on a miss.
    ///
    /// The body is streamed into a temporary file next to the cache entry and
    /// only renamed into place once fully written, so a failed download never
    /// leaves a partial entry behind.
    pub async fn fetch(&self, client: &Client, url: &str) -> Result<PathBuf> {
        let dest = self.path_for(url);
        if dest.is_file() {
            log::debug!("Cache hit for {}", url);
            return Ok(dest);
        }

        std::fs::create_dir_all(&self.root)?;

        log::info!("Downloading {}", url);
        let mut response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let tmp = NamedTempFile::new_in(&self.root)?;
        let mut file = tokio::fs::File::from_std(tmp.as_file().try_clone()?);
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        tmp.persist(&dest).map_err(|e| FetchError::Io(e.error))?;
        log::debug!("Cached {} bytes from {} at {:?}", written, url, dest);
        Ok(dest)
    }

    /// Remove the cached entry for `url`, if any.
    pub fn evict(&self, url: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(url)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_stable_per_url() {
        let cache = DownloadCache::new("/cache/downloads");
        let a = cache.path_for("https://example.com/a.tgz");
        let b = cache.path_for("https://example.com/a.tgz");
        let c = cache.path_for("https://example.com/b.tgz");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("/cache/downloads"));
        assert_eq!(a.file_name().unwrap().len(), 64);
    }

    #[test]
    fn test_evict_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        cache.evict("https://example.com/missing").unwrap();
    }

    #[tokio::test]
    async fn test_hit_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        let url = "http://127.0.0.1:9/never-fetched.tgz";
        std::fs::write(cache.path_for(url), b"cached").unwrap();

        let path = cache.fetch(&Client::new(), url).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        let url = "http://127.0.0.1:9/unreachable.tgz";

        assert!(cache.fetch(&Client::new(), url).await.is_err());
        assert!(!cache.contains(url));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
