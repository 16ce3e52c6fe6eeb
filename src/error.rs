//! Error types for the Apalache controller.

use thiserror::Error;

/// Controller error type.
#[derive(Error, Debug)]
pub enum Error {
    /// No engine version has been set yet
    #[error("Engine version not set")]
    VersionNotSet,

    /// RPC session has not been opened
    #[error("RPC session not connected")]
    NotConnected,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Version resolution error
    #[error("Resolution error: {0}")]
    Resolve(#[from] crate::engine::version::ResolveError),

    /// Archive or descriptor fetch error
    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::engine::fetch::FetchError),

    /// Engine lifecycle error
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] crate::engine::lifecycle::LifecycleError),

    /// RPC transport or protocol error
    #[error("RPC error: {0}")]
    Rpc(#[from] crate::rpc::RpcError),
}

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, Error>;
