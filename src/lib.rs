//! Rust controller for the Apalache model checker server.
//!
//! Resolves a release, caches its jar, runs `apalache server` as a child
//! process and drives it over gRPC.

mod defaults;
pub mod config;
pub mod error;

pub mod client;
pub mod engine;
pub mod rpc;

pub use config::{ConfigError, ControllerConfig};
pub use error::{Error, Result};

pub use client::{Apalache, FixedSeed, SeedSource, ThreadRngSeeds};

pub use engine::cache::DownloadCache;
pub use engine::fetch::{extract_entry, EngineFetcher, FetchError};
pub use engine::lifecycle::{EngineServer, LifecycleError};
pub use engine::release::{EngineVersion, ReleaseUrls};
pub use engine::version::{ResolveError, VersionResolver};

pub use rpc::client::{CommandResponse, RpcSession};
pub use rpc::descriptor::{CommandTable, ProtocolDescriptor};
pub use rpc::serialization::{CommandKind, CommandRequest, MAX_RANDOM_SEED};
pub use rpc::RpcError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
