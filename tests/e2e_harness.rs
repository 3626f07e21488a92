#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// How the mock backend answers `GET /health/`.
#[derive(Debug, Clone, Copy)]
pub enum MockHealth {
    Healthy { collections: u64 },
    DatabaseDown,
}

#[derive(Clone)]
struct MockServerState {
    health: MockHealth,
    traces: Arc<Mutex<Vec<String>>>,
}

impl MockServerState {
    fn trace(&self, line: String) {
        self.traces
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line);
    }
}

async fn mock_health(State(state): State<MockServerState>) -> (StatusCode, Json<Value>) {
    state.trace("GET /health/".to_string());
    match state.health {
        MockHealth::Healthy { collections } => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "message": "MongoDB AI Chat API is running",
                "mongodb_connected": true,
                "collections_count": collections,
                "collections": ["orders", "customers"],
            })),
        ),
        MockHealth::DatabaseDown => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": "Health check failed: connection refused",
                "mongodb_connected": false,
            })),
        ),
    }
}

async fn mock_collections(State(state): State<MockServerState>) -> Json<Value> {
    state.trace("GET /api/collections/".to_string());
    Json(json!({
        "success": true,
        "collections": {
            "orders": {
                "fields": ["status", "_id", "amount"],
                "document_count": 12,
                "sample_document": {"_id": "1", "status": "shipped", "amount": 40},
            },
            "audit": {
                "fields": [],
                "document_count": 1,
                "sample_document": null,
            }
        }
    }))
}

/// Refuses every question the way the backend refuses write operations.
async fn mock_chat(
    State(state): State<MockServerState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.trace(format!("POST /api/chat/ {}", payload));
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "error": "Only read operations are allowed",
        })),
    )
}

async fn mock_execute(
    State(state): State<MockServerState>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    state.trace(format!("POST /api/execute-query/ {}", payload));
    Json(json!({
        "success": true,
        "question": payload.get("question").cloned().unwrap_or(Value::Null),
        "query": payload.get("query").cloned().unwrap_or(Value::Null),
        "result": [],
        "answer": "No orders found",
    }))
}

pub struct MockBackendServer {
    pub port: u16,
    traces: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockBackendServer {
    pub async fn start(health: MockHealth) -> TestResult<Self> {
        let port = find_free_port()?;
        let traces = Arc::new(Mutex::new(Vec::new()));
        let state = MockServerState {
            health,
            traces: Arc::clone(&traces),
        };
        let app = Router::new()
            .route("/health/", get(mock_health))
            .route("/api/collections/", get(mock_collections))
            .route("/api/chat/", post(mock_chat))
            .route("/api/execute-query/", post(mock_execute))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Ok(Self {
            port,
            traces,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn traces(&self) -> Vec<String> {
        self.traces
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

pub fn find_free_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// Runs the built binary in an isolated data directory. The working
/// directory is the same temp dir so no stray `.env` file is picked up.
pub async fn run_cli(args: &[&str]) -> TestResult<CliRun> {
    let data_dir = tempfile::tempdir()?;
    let child = tokio::process::Command::new(env!("CARGO_BIN_EXE_mongo-chat"))
        .args(args)
        .current_dir(data_dir.path())
        .env("MONGO_CHAT_DATA_DIR", data_dir.path())
        .env_remove("MONGO_CHAT_API_URL")
        .env_remove("MONGO_CHAT_LOG")
        .stdin(std::process::Stdio::null())
        .output();
    let output = tokio::time::timeout(Duration::from_secs(30), child).await??;
    let log = std::fs::read_to_string(data_dir.path().join("logs").join("mongo-chat.log"))
        .unwrap_or_default();
    Ok(CliRun { output, log })
}

pub struct CliRun {
    pub output: Output,
    pub log: String,
}

impl CliRun {
    pub fn success(&self) -> bool {
        self.output.status.success()
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }
}

pub fn is_bind_denied(err: &(dyn std::error::Error + Send + Sync)) -> bool {
    err.to_string().contains("Operation not permitted")
}
