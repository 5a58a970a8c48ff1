use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};

pub const UPLOAD_PATH: &str = "/1/upload";

pub const SUCCESS_BODY: &str = r#"{"status":"success","processed":1,"unprocessed":[]}"#;

const INVALID_JSON_BODY: &str = r#"{"status":"fail","error":"Invalid JSON"}"#;

/// One upload as the server saw it.
#[derive(Clone, Debug)]
pub struct CapturedUpload {
    pub account_id: Option<String>,
    pub passcode: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

/// Status and body returned for every well-formed upload.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            status: 200,
            body: SUCCESS_BODY.to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockState {
    uploads: Arc<RwLock<Vec<CapturedUpload>>>,
    reply: Arc<RwLock<Reply>>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(status: u16, body: &str) -> Self {
        Self {
            uploads: Arc::default(),
            reply: Arc::new(RwLock::new(Reply {
                status,
                body: body.to_string(),
            })),
        }
    }

    pub async fn set_reply(&self, status: u16, body: &str) {
        *self.reply.write().await = Reply {
            status,
            body: body.to_string(),
        };
    }

    pub async fn uploads(&self) -> Vec<CapturedUpload> {
        self.uploads.read().await.clone()
    }

    /// Snapshot of recorded uploads for callers outside an async context.
    /// Panics if called from within a tokio runtime.
    pub fn blocking_uploads(&self) -> Vec<CapturedUpload> {
        self.uploads.blocking_read().clone()
    }
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route(UPLOAD_PATH, post(upload))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn upload(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let json = [(header::CONTENT_TYPE, "application/json")];

    let Ok(parsed) = serde_json::from_slice::<serde_json::Value>(&body) else {
        return (StatusCode::BAD_REQUEST, json, INVALID_JSON_BODY.to_string());
    };

    state.uploads.write().await.push(CapturedUpload {
        account_id: header_value(&headers, "x-clevertap-account-id"),
        passcode: header_value(&headers, "x-clevertap-passcode"),
        content_type: header_value(&headers, "content-type"),
        body: parsed,
    });

    let reply = state.reply.read().await.clone();
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, json, reply.body)
}
