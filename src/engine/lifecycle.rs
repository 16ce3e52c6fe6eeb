//! Engine server process lifecycle management.
//!
//! Provides the `EngineServer` struct which manages:
//! - Spawning `java -jar apalache-<version>.jar server --port=<port>`
//! - Graceful shutdown with SIGINT and a kill fallback
//! - Cleanup when the owner is dropped

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::ControllerConfig;
use crate::engine::multiprocess::stop_child;

/// Errors that can occur during engine lifecycle management.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Engine already running with PID {0}")]
    AlreadyRunning(u32),

    #[error("Engine jar not found at {0:?}")]
    ArtifactMissing(PathBuf),

    #[error("Failed to spawn engine: {0}")]
    SpawnFailed(std::io::Error),

    #[error("Engine shutdown failed: {0}")]
    ShutdownFailed(String),

    #[error("Engine process exited before its port opened ({0})")]
    ExitedEarly(String),

    #[error("Timed out after {0:?} waiting for engine port {1}")]
    StartupTimeout(Duration, u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Supervises at most one engine server process.
pub struct EngineServer {
    java: PathBuf,
    hostname: String,
    port: u16,
    shutdown_timeout: Duration,
    log_file: Option<PathBuf>,
    process: Option<Child>,
}

impl EngineServer {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            java: config.java.clone(),
            hostname: config.hostname.clone(),
            port: config.server_port,
            shutdown_timeout: config.shutdown_timeout,
            log_file: config.engine_log_file.clone(),
            process: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(Child::id)
    }

    /// Whether a process handle is currently retained. The process may
    /// have exited since; `start` reaps such a handle.
    pub fn has_process(&self) -> bool {
        self.process.is_some()
    }

    /// Spawn the engine server from `jar`.
    ///
    /// Fails with [`LifecycleError::AlreadyRunning`] if the retained process
    /// is still alive; a retained process that already exited is replaced.
    /// No readiness check is made; see [`EngineServer::wait_until_ready`].
    pub fn start(&mut self, jar: &Path) -> Result<u32> {
        if let Some(child) = self.process.as_mut() {
            match child.try_wait()? {
                None => return Err(LifecycleError::AlreadyRunning(child.id())),
                Some(status) => {
                    log::info!("Apalache server PID {} exited on its own ({})", child.id(), status);
                    self.process = None;
                }
            }
        }
        if !jar.is_file() {
            return Err(LifecycleError::ArtifactMissing(jar.to_path_buf()));
        }

        let mut command = Command::new(&self.java);
        command
            .arg("-jar")
            .arg(jar)
            .arg("server")
            .arg(format!("--port={}", self.port))
            .stdin(Stdio::null());

        if let Some(path) = &self.log_file {
            let log_file = File::create(path)?;
            command
                .stdout(Stdio::from(log_file.try_clone()?))
                .stderr(Stdio::from(log_file));
        }

        log::info!("Launching Apalache server from {:?} on port {}", jar, self.port);
        let child = command.spawn().map_err(LifecycleError::SpawnFailed)?;
        let pid = child.id();
        self.process = Some(child);

        log::debug!("Apalache server spawned with PID {}", pid);
        Ok(pid)
    }

    /// Interrupt the retained process and release its handle.
    ///
    /// A no-op when nothing is running.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.process.take() else {
            return Ok(());
        };

        let pid = child.id();
        log::info!("Stopping Apalache server PID {}", pid);

        if stop_child(&mut child, self.shutdown_timeout) {
            log::info!("Apalache server PID {} stopped", pid);
            Ok(())
        } else {
            Err(LifecycleError::ShutdownFailed(format!(
                "Failed to stop engine PID {}",
                pid
            )))
        }
    }

    /// Block until the server port accepts TCP connections.
    ///
    /// Fails early if the process exits, and after `timeout` otherwise.
    pub async fn wait_until_ready(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let address = format!("{}:{}", self.hostname, self.port);

        log::info!("Waiting for Apalache server on {}", address);
        while Instant::now() < deadline {
            if let Some(child) = self.process.as_mut() {
                if let Some(status) = child.try_wait()? {
                    self.process = None;
                    return Err(LifecycleError::ExitedEarly(status.to_string()));
                }
            }

            if port_is_open(&address).await {
                log::info!("Apalache server is accepting connections on {}", address);
                return Ok(());
            }

            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        Err(LifecycleError::StartupTimeout(timeout, self.port))
    }
}

impl Drop for EngineServer {
    fn drop(&mut self) {
        if self.process.is_some() {
            if let Err(e) = self.stop() {
                log::error!("Failed to stop Apalache server on drop: {}", e);
            }
        }
    }
}

async fn port_is_open(address: &str) -> bool {
    matches!(
        tokio::time::timeout(
            Duration::from_millis(200),
            tokio::net::TcpStream::connect(address)
        )
        .await,
        Ok(Ok(_))
    )
}
