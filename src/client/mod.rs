//! High-level controller API.
//!
//! [`Apalache`] ties together version resolution, jar fetching, the server
//! process and the RPC session. The version must be set before anything that
//! depends on it.

mod seed;

use std::path::PathBuf;

use crate::config::ControllerConfig;
use crate::engine::fetch::EngineFetcher;
use crate::engine::lifecycle::EngineServer;
use crate::engine::release::EngineVersion;
use crate::engine::version::VersionResolver;
use crate::error::{Error, Result};
use crate::rpc::client::{CommandResponse, RpcSession};
use crate::rpc::descriptor::ProtocolDescriptor;
use crate::rpc::serialization::CommandRequest;

pub use seed::{FixedSeed, SeedSource, ThreadRngSeeds};

/// Controller for one Apalache server.
///
/// Owns at most one server process and one RPC session. Dropping the
/// controller stops the process.
pub struct Apalache {
    config: ControllerConfig,
    resolver: VersionResolver,
    fetcher: EngineFetcher,
    server: EngineServer,
    version: Option<EngineVersion>,
    session: Option<RpcSession>,
    seeds: Box<dyn SeedSource>,
}

impl Apalache {
    pub fn new(config: ControllerConfig) -> Self {
        let client = config.http_client();
        Self {
            resolver: VersionResolver::with_client(&config, client.clone()),
            fetcher: EngineFetcher::with_client(&config, client),
            server: EngineServer::new(&config),
            version: None,
            session: None,
            seeds: Box::new(ThreadRngSeeds),
            config,
        }
    }

    /// Build a controller from `APALACHE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ControllerConfig::from_env()?))
    }

    /// Replace the source of `smt.randomSeed` values.
    pub fn with_seed_source(mut self, seeds: impl SeedSource + 'static) -> Self {
        self.seeds = Box::new(seeds);
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Resolve and store the engine version (`latest` or an explicit tag).
    pub async fn set_version(&mut self, token: &str) -> Result<&EngineVersion> {
        let version = self.resolver.resolve(token).await?;
        log::debug!("Using Apalache version {}", version);
        Ok(&*self.version.insert(version))
    }

    pub fn version(&self) -> Option<&EngineVersion> {
        self.version.as_ref()
    }

    /// Tag of the most recent release, as published (with its leading `v`).
    pub async fn latest_version(&self) -> Result<String> {
        Ok(self.resolver.latest_tag().await?)
    }

    fn require_version(&self) -> Result<&EngineVersion> {
        self.version.as_ref().ok_or(Error::VersionNotSet)
    }

    pub fn jar_name(&self) -> Result<String> {
        Ok(self.require_version()?.jar_name())
    }

    pub fn jar_path(&self) -> Result<PathBuf> {
        let version = self.require_version()?;
        Ok(self.fetcher.urls().artifact_path(version))
    }

    pub fn protocol_url(&self) -> Result<String> {
        let version = self.require_version()?;
        Ok(self.fetcher.urls().protocol(version))
    }

    /// Make sure the jar for the current version is on disk.
    pub async fn fetch_jar(&self) -> Result<PathBuf> {
        let version = self.require_version()?;
        Ok(self.fetcher.ensure_artifact(version).await?)
    }

    /// Fetch and compile the protocol descriptor for the current version.
    pub async fn fetch_protocol(&self) -> Result<ProtocolDescriptor> {
        let version = self.require_version()?;
        let source = self.fetcher.fetch_protocol(version).await?;
        Ok(ProtocolDescriptor::parse(source)?)
    }

    /// Start the server from the cached jar. Returns the child PID.
    pub fn spawn_server(&mut self) -> Result<u32> {
        let jar = self.jar_path()?;
        Ok(self.server.start(&jar)?)
    }

    /// Stop the server, if one is running.
    pub fn kill_server(&mut self) -> Result<()> {
        Ok(self.server.stop()?)
    }

    pub fn server(&self) -> &EngineServer {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut EngineServer {
        &mut self.server
    }

    /// Open the RPC session.
    ///
    /// `hostname` defaults to the configured host and `port` to the
    /// configured server port.
    pub async fn connect(&mut self, hostname: Option<&str>, port: Option<u16>) -> Result<&RpcSession> {
        let descriptor = self.fetch_protocol().await?;
        self.connect_with(&descriptor, hostname, port).await
    }

    /// Open the RPC session with an already fetched descriptor.
    pub async fn connect_with(
        &mut self,
        descriptor: &ProtocolDescriptor,
        hostname: Option<&str>,
        port: Option<u16>,
    ) -> Result<&RpcSession> {
        self.require_version()?;
        let hostname = hostname.unwrap_or(self.config.hostname.as_str());
        let port = port.unwrap_or(self.config.server_port);

        let session =
            RpcSession::connect(descriptor, hostname, port, self.config.rpc_timeout).await?;
        Ok(&*self.session.insert(session))
    }

    pub fn session(&self) -> Option<&RpcSession> {
        self.session.as_ref()
    }

    /// Build the check request that [`Apalache::model_check`] would send.
    pub fn check_request(&mut self, tla: &str, invariant: &str, length: u32) -> CommandRequest {
        let seed = self.seeds.next_seed();
        CommandRequest::check(tla, invariant, length, seed)
    }

    /// Bounded model check of `invariant` up to `length` steps.
    pub async fn model_check(
        &mut self,
        tla: &str,
        invariant: &str,
        length: u32,
    ) -> Result<CommandResponse> {
        let request = self.check_request(tla, invariant, length);
        self.submit(&request).await
    }

    /// Simulation run: five runs with trace output.
    pub async fn model_simulate(&self, tla: &str) -> Result<CommandResponse> {
        self.submit(&CommandRequest::simulate(tla)).await
    }

    async fn submit(&self, request: &CommandRequest) -> Result<CommandResponse> {
        let session = self.session.as_ref().ok_or(Error::NotConnected)?;
        Ok(session.run(request).await?)
    }
}
