//! Default values for release locations, the engine server and timeouts.

pub const GH_REPO: &str = "informalsystems/apalache";
pub const API_BASE: &str = "https://api.github.com";
pub const DOWNLOAD_BASE: &str = "https://github.com";
pub const PROTO_PATH: &str = "shai/src/main/protobuf/cmdExecutor.proto";

pub const ENGINE_NAME: &str = "apalache";
pub const TGZ_JAR_NAME: &str = "apalache.jar";
pub const LATEST_ALIAS: &str = "latest";

pub const SERVER_PORT: u16 = 8822;
pub const HOSTNAME: &str = "127.0.0.1";
pub const JAVA: &str = "java";

pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 5;

pub const USER_AGENT: &str = concat!("apalache-rs/", env!("CARGO_PKG_VERSION"));

pub const SERVICE_NAME: &str = "shai.cmdExecutor.CmdExecutor";
pub const RUN_METHOD: &str = "run";
pub const CMD_ENUM: &str = "Cmd";
