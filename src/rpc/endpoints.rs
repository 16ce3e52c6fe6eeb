//! RPC endpoint addressing for the Apalache server.

use tonic::transport::Endpoint;

use crate::rpc::{Result, RpcError};

/// Format a host and port into a plaintext gRPC URI.
pub fn server_uri(hostname: &str, port: u16) -> String {
    if hostname.contains(':') && !hostname.starts_with('[') {
        // Bare IPv6 literal
        format!("http://[{}]:{}", hostname, port)
    } else {
        format!("http://{}:{}", hostname, port)
    }
}

/// Build a tonic endpoint for `hostname:port`.
pub fn endpoint(hostname: &str, port: u16) -> Result<Endpoint> {
    let uri = server_uri(hostname, port);
    Endpoint::from_shared(uri.clone()).map_err(|_| RpcError::InvalidEndpoint(uri))
}

/// gRPC request path for `method` on `service`.
pub fn method_path(service: &str, method: &str) -> String {
    format!("/{}/{}", service, method)
}
