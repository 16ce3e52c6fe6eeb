#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::net::TcpListener;

pub const CMD_EXECUTOR_PROTO: &str = include_str!("../fixtures/cmdExecutor.proto");

pub const LATEST_PATH: &str = "/repos/informalsystems/apalache/releases/latest";

pub fn archive_path(version: &str) -> String {
    format!(
        "/informalsystems/apalache/releases/download/v{}/apalache-{}.tgz",
        version, version
    )
}

pub fn proto_path(version: &str) -> String {
    format!(
        "/informalsystems/apalache/raw/v{}/shai/src/main/protobuf/cmdExecutor.proto",
        version
    )
}

#[derive(Default)]
struct FixtureState {
    routes: Mutex<HashMap<String, (StatusCode, Vec<u8>)>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// Local stand-in for the release index and download host.
pub struct ReleaseServer {
    addr: SocketAddr,
    state: Arc<FixtureState>,
    _handle: tokio::task::JoinHandle<()>,
}

impl ReleaseServer {
    pub async fn start() -> Self {
        let state = Arc::new(FixtureState::default());
        let app = Router::new()
            .fallback(serve_route)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _handle: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn serve(&self, path: &str, status: StatusCode, body: impl Into<Vec<u8>>) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    pub fn serve_latest(&self, tag: &str) {
        let body = serde_json::json!({ "tag_name": tag, "name": tag }).to_string();
        self.serve(LATEST_PATH, StatusCode::OK, body);
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }
}

async fn serve_route(State(state): State<Arc<FixtureState>>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    *state.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    let route = state.routes.lock().unwrap().get(&path).cloned();
    match route {
        Some((status, body)) => (status, Body::from(body)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Build a gzip-compressed tar archive in memory.
pub fn tgz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Build a tar archive with a directory entry named like the jar.
pub fn tgz_with_dir(dir: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, dir, std::io::empty())
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}
