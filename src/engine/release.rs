//! Release locations derived from an engine version.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ControllerConfig;
use crate::defaults;

/// A concrete engine version with any leading `v` removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineVersion(String);

impl EngineVersion {
    /// Normalize a concrete tag such as `v0.44.2` or `0.44.2`.
    ///
    /// Returns `None` for an empty tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let version = tag.strip_prefix('v').unwrap_or(tag);
        if version.is_empty() {
            None
        } else {
            Some(Self(version.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Git tag for this version, e.g. `v0.44.2`.
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }

    /// Name of the extracted jar, e.g. `apalache-0.44.2.jar`.
    pub fn jar_name(&self) -> String {
        format!("{}-{}.jar", defaults::ENGINE_NAME, self.0)
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL and path builder for releases of the engine.
#[derive(Debug, Clone)]
pub struct ReleaseUrls {
    api_base: String,
    download_base: String,
    artifact_dir: PathBuf,
}

impl ReleaseUrls {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            download_base: config.download_base.trim_end_matches('/').to_string(),
            artifact_dir: config.artifact_dir.clone(),
        }
    }

    pub fn latest_release(&self) -> String {
        format!("{}/repos/{}/releases/latest", self.api_base, defaults::GH_REPO)
    }

    pub fn archive(&self, version: &EngineVersion) -> String {
        format!(
            "{}/{}/releases/download/{}/{}-{}.tgz",
            self.download_base,
            defaults::GH_REPO,
            version.tag(),
            defaults::ENGINE_NAME,
            version
        )
    }

    pub fn protocol(&self, version: &EngineVersion) -> String {
        format!(
            "{}/{}/raw/{}/{}",
            self.download_base,
            defaults::GH_REPO,
            version.tag(),
            defaults::PROTO_PATH
        )
    }

    pub fn artifact_path(&self, version: &EngineVersion) -> PathBuf {
        self.artifact_dir.join(version.jar_name())
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> ReleaseUrls {
        ReleaseUrls::new(&ControllerConfig::with_cache_dir("/cache"))
    }

    #[test]
    fn test_version_strips_single_leading_v() {
        assert_eq!(EngineVersion::from_tag("v0.44.2").unwrap().as_str(), "0.44.2");
        assert_eq!(EngineVersion::from_tag("0.44.2").unwrap().as_str(), "0.44.2");
        assert_eq!(EngineVersion::from_tag("vv1").unwrap().as_str(), "v1");
        assert!(EngineVersion::from_tag("v").is_none());
        assert!(EngineVersion::from_tag("  ").is_none());
    }

    #[test]
    fn test_release_urls() {
        let version = EngineVersion::from_tag("v0.44.2").unwrap();
        let urls = urls();

        assert_eq!(
            urls.latest_release(),
            "https://api.github.com/repos/informalsystems/apalache/releases/latest"
        );
        assert_eq!(
            urls.archive(&version),
            "https://github.com/informalsystems/apalache/releases/download/v0.44.2/apalache-0.44.2.tgz"
        );
        assert_eq!(
            urls.protocol(&version),
            "https://github.com/informalsystems/apalache/raw/v0.44.2/shai/src/main/protobuf/cmdExecutor.proto"
        );
        assert_eq!(
            urls.artifact_path(&version),
            PathBuf::from("/cache/apalache-0.44.2.jar")
        );
    }

    #[test]
    fn test_trailing_slash_in_base() {
        let config = ControllerConfig::with_cache_dir("/cache").with_base_url("http://localhost:1/");
        let urls = ReleaseUrls::new(&config);
        assert_eq!(
            urls.latest_release(),
            "http://localhost:1/repos/informalsystems/apalache/releases/latest"
        );
    }
}
