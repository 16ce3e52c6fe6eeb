#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use prost_reflect::{DynamicMessage, MessageDescriptor, Value};
use tonic::codegen::{empty_body, http, BoxFuture, Context, Poll, Service, StdError};
use tonic::server::{Grpc, NamedService, UnaryService};

use apalache::rpc::codec::DynamicCodec;
use apalache::ProtocolDescriptor;

/// A request as the stand-in engine received it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedCommand {
    pub cmd: i32,
    pub config: serde_json::Value,
}

#[derive(Default)]
struct EngineState {
    received: Mutex<Vec<ReceivedCommand>>,
}

/// In-process `CmdExecutor` that records every `run` call and answers with
/// `CmdResponse { success: "ok" }`.
pub struct FakeEngine {
    addr: SocketAddr,
    state: Arc<EngineState>,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeEngine {
    pub async fn start(descriptor: &ProtocolDescriptor) -> Self {
        let pool = descriptor.pool();
        let service = ExecutorService {
            state: Arc::new(EngineState::default()),
            request: pool.get_message_by_name("shai.cmdExecutor.CmdRequest").unwrap(),
            response: pool.get_message_by_name("shai.cmdExecutor.CmdResponse").unwrap(),
        };
        let state = Arc::clone(&service.state);

        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let handle = tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(service)
                .serve(addr)
                .await
                .unwrap();
        });

        for _ in 0..100 {
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Self {
            addr,
            state,
            _handle: handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn received(&self) -> Vec<ReceivedCommand> {
        self.state.received.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct ExecutorService {
    state: Arc<EngineState>,
    request: MessageDescriptor,
    response: MessageDescriptor,
}

impl NamedService for ExecutorService {
    const NAME: &'static str = "shai.cmdExecutor.CmdExecutor";
}

impl<B> Service<http::Request<B>> for ExecutorService
where
    B: tonic::codegen::Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        if req.uri().path() != "/shai.cmdExecutor.CmdExecutor/run" {
            return Box::pin(async move {
                let mut response = http::Response::new(empty_body());
                let headers = response.headers_mut();
                headers.insert("grpc-status", (tonic::Code::Unimplemented as i32).into());
                headers.insert(
                    http::header::CONTENT_TYPE,
                    http::HeaderValue::from_static("application/grpc"),
                );
                Ok(response)
            });
        }

        let handler = RunHandler {
            state: Arc::clone(&self.state),
            response: self.response.clone(),
        };
        let codec = DynamicCodec::new(self.request.clone());
        Box::pin(async move {
            let mut grpc = Grpc::new(codec);
            Ok(grpc.unary(handler, req).await)
        })
    }
}

struct RunHandler {
    state: Arc<EngineState>,
    response: MessageDescriptor,
}

impl UnaryService<DynamicMessage> for RunHandler {
    type Response = DynamicMessage;
    type Future = BoxFuture<tonic::Response<DynamicMessage>, tonic::Status>;

    fn call(&mut self, request: tonic::Request<DynamicMessage>) -> Self::Future {
        let state = Arc::clone(&self.state);
        let descriptor = self.response.clone();
        Box::pin(async move {
            let message = request.into_inner();
            let cmd = message
                .get_field_by_name("cmd")
                .and_then(|v| v.as_enum_number())
                .ok_or_else(|| tonic::Status::invalid_argument("missing cmd"))?;
            let config = message
                .get_field_by_name("config")
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or_else(|| tonic::Status::invalid_argument("missing config"))?;
            let config = serde_json::from_str(&config)
                .map_err(|e| tonic::Status::invalid_argument(e.to_string()))?;

            state
                .received
                .lock()
                .unwrap()
                .push(ReceivedCommand { cmd, config });

            let mut response = DynamicMessage::new(descriptor);
            response.set_field_by_name("success", Value::String("ok".to_string()));
            Ok(tonic::Response::new(response))
        })
    }
}
