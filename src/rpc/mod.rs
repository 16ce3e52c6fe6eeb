//! gRPC communication with the Apalache server.
//!
//! The service definition is not compiled in. The `.proto` text published
//! with each release is compiled at runtime and calls are made with dynamic
//! messages over a tonic channel.

pub mod client;
pub mod codec;
pub mod descriptor;
pub mod endpoints;
pub mod serialization;

use thiserror::Error;

/// Errors raised by the RPC layer.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Malformed protocol descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Service {0} not found in protocol descriptor")]
    UnknownService(String),

    #[error("Method {method} not found on service {service}")]
    UnknownMethod { service: String, method: String },

    #[error("Enum {0} not found in protocol descriptor")]
    UnknownEnum(String),

    #[error("Value {value} not found in enum {enum_name}")]
    UnknownEnumValue { enum_name: String, value: String },

    #[error("Invalid request field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Invalid endpoint {0}")]
    InvalidEndpoint(String),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Call failed: {0}")]
    Status(#[from] tonic::Status),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RpcError>;
