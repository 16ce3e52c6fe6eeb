//! Engine management for the Apalache server.
//!
//! This module provides:
//! - Release locations and version normalization (`release`)
//! - Version resolution against the release index (`version`)
//! - Archive download, caching and jar extraction (`cache`, `fetch`)
//! - Server process lifecycle management (`lifecycle`, `multiprocess`)

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod multiprocess;
pub mod release;
pub mod version;

pub use cache::DownloadCache;
pub use fetch::{extract_entry, EngineFetcher, FetchError};
pub use lifecycle::{EngineServer, LifecycleError};
pub use release::{EngineVersion, ReleaseUrls};
pub use version::{ResolveError, VersionResolver};
