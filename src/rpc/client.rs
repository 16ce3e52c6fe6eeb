//! gRPC session with the Apalache `CmdExecutor` service.

use std::time::Duration;

use prost::Message;
use prost_reflect::{DynamicMessage, ServiceDescriptor, Value};
use tonic::client::Grpc;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

use crate::defaults;
use crate::rpc::codec::DynamicCodec;
use crate::rpc::descriptor::{find_method, CommandTable, ProtocolDescriptor};
use crate::rpc::endpoints::{endpoint, method_path};
use crate::rpc::serialization::{CommandKind, CommandRequest};
use crate::rpc::{Result, RpcError};

/// Opaque engine response.
///
/// The engine does not guarantee a schema, so the message is passed through
/// as-is with views for JSON and raw bytes.
#[derive(Debug, Clone)]
pub struct CommandResponse {
    message: DynamicMessage,
}

impl CommandResponse {
    pub fn message(&self) -> &DynamicMessage {
        &self.message
    }

    pub fn into_message(self) -> DynamicMessage {
        self.message
    }

    /// Render the response with the protobuf JSON mapping.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&self.message)?)
    }

    /// Encoded protobuf bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.message.encode_to_vec()
    }
}

/// Connection to one engine server, bound to a compiled protocol descriptor.
///
/// Calls are independent; the session keeps no queue.
#[derive(Debug, Clone)]
pub struct RpcSession {
    channel: Channel,
    service: ServiceDescriptor,
    commands: CommandTable,
    hostname: String,
    port: u16,
}

impl RpcSession {
    /// Connect to `hostname:port` using `descriptor`.
    ///
    /// The service, its `run` method and the `Cmd` values are resolved here so
    /// a descriptor missing any of them is rejected before the first call.
    pub async fn connect(
        descriptor: &ProtocolDescriptor,
        hostname: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let service = descriptor.service(defaults::SERVICE_NAME)?;
        let commands = CommandTable::resolve(&service, defaults::RUN_METHOD, defaults::CMD_ENUM)?;

        let mut endpoint = endpoint(hostname, port)?;
        if let Some(timeout) = timeout {
            endpoint = endpoint.timeout(timeout);
        }

        log::debug!("Connecting to {} at {}:{}", service.full_name(), hostname, port);
        let channel = endpoint.connect().await?;
        log::info!("Connected to Apalache server at {}:{}", hostname, port);

        Ok(Self {
            channel,
            service,
            commands,
            hostname: hostname.to_string(),
            port,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Empty request message for `method`, to be filled by the caller.
    pub fn new_request(&self, method: &str) -> Result<DynamicMessage> {
        let method = find_method(&self.service, method)?;
        Ok(DynamicMessage::new(method.input()))
    }

    /// Perform a unary call of `method` with `request`.
    pub async fn invoke(&self, method: &str, request: DynamicMessage) -> Result<CommandResponse> {
        let method = find_method(&self.service, method)?;
        let path = method_path(self.service.full_name(), method.name());
        let path = PathAndQuery::try_from(path.as_str())
            .map_err(|_| RpcError::InvalidEndpoint(path.clone()))?;

        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready().await?;

        log::debug!("Calling {}", path);
        let response = grpc
            .unary(
                tonic::Request::new(request),
                path,
                DynamicCodec::new(method.output()),
            )
            .await?;

        Ok(CommandResponse {
            message: response.into_inner(),
        })
    }

    /// Submit a command through the `run` method.
    pub async fn run(&self, request: &CommandRequest) -> Result<CommandResponse> {
        let message = build_run_request(&self.commands, request.kind(), request.config_json()?)?;
        log::info!("Submitting {} command", request.kind());
        self.invoke(defaults::RUN_METHOD, message).await
    }
}

/// Build a `CmdRequest { cmd, config }` message.
pub fn build_run_request(
    commands: &CommandTable,
    kind: CommandKind,
    config: String,
) -> Result<DynamicMessage> {
    let mut message = DynamicMessage::new(commands.method().input());
    set_field(&mut message, "cmd", Value::EnumNumber(commands.number(kind)))?;
    set_field(&mut message, "config", Value::String(config))?;
    Ok(message)
}

fn set_field(message: &mut DynamicMessage, field: &str, value: Value) -> Result<()> {
    message
        .try_set_field_by_name(field, value)
        .map_err(|e| RpcError::InvalidField {
            field: field.to_string(),
            reason: e.to_string(),
        })
}
