//! Controller configuration.
//!
//! All environment reads happen once, in [`ControllerConfig::from_env`]. Every
//! component receives the resulting value instead of consulting the process
//! environment on its own.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::defaults;

/// Errors raised while building a configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Configuration shared by the resolver, fetchers, supervisor and RPC session.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Port the engine server binds to and the RPC session dials by default.
    pub server_port: u16,
    /// Host the RPC session dials when no hostname is given.
    pub hostname: String,
    /// Root directory for downloaded archives.
    pub cache_dir: PathBuf,
    /// Directory holding extracted `apalache-<version>.jar` files.
    pub artifact_dir: PathBuf,
    /// JVM launcher used to run the jar.
    pub java: PathBuf,
    /// Base URL of the release index API.
    pub api_base: String,
    /// Base URL for release archives and raw repository files.
    pub download_base: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub download_timeout: Duration,
    /// Per-call RPC deadline. `None` leaves the transport default in place.
    pub rpc_timeout: Option<Duration>,
    /// How long `stop()` waits after SIGINT before killing the engine.
    pub shutdown_timeout: Duration,
    /// When set, engine stdout/stderr go to this file instead of being inherited.
    pub engine_log_file: Option<PathBuf>,
}

impl ControllerConfig {
    /// Build a configuration with defaults rooted at `cache_dir`.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        Self {
            server_port: defaults::SERVER_PORT,
            hostname: defaults::HOSTNAME.to_string(),
            artifact_dir: cache_dir.clone(),
            cache_dir,
            java: PathBuf::from(defaults::JAVA),
            api_base: defaults::API_BASE.to_string(),
            download_base: defaults::DOWNLOAD_BASE.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            download_timeout: Duration::from_secs(defaults::DOWNLOAD_TIMEOUT_SECS),
            rpc_timeout: None,
            shutdown_timeout: Duration::from_secs(defaults::SHUTDOWN_TIMEOUT_SECS),
            engine_log_file: None,
        }
    }

    /// Build a configuration from `APALACHE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("APALACHE_CACHE_DIR") {
            config.artifact_dir = PathBuf::from(&dir);
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("APALACHE_ARTIFACT_DIR") {
            config.artifact_dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("APALACHE_SERVER_PORT") {
            config.server_port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "APALACHE_SERVER_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(hostname) = lookup("APALACHE_HOSTNAME") {
            config.hostname = hostname;
        }
        if let Some(java) = lookup("APALACHE_JAVA") {
            config.java = PathBuf::from(java);
        }
        if let Some(log_file) = lookup("APALACHE_LOG_FILE") {
            config.engine_log_file = Some(PathBuf::from(log_file));
        }

        Ok(config)
    }

    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    /// Point both the release index and the download host at `base`.
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_base = base.clone();
        self.download_base = base;
        self
    }

    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = Some(timeout);
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_engine_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_log_file = Some(path.into());
        self
    }

    /// Shared HTTP client for the resolver and fetchers.
    pub(crate) fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.download_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(defaults::ENGINE_NAME);
        Self::with_cache_dir(cache_dir)
    }
}
