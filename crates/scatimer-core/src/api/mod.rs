//! Feedback HTTP contract.
//!
//! [`FeedbackApi::handle`] maps a method, URL and body to a response without
//! touching sockets. [`server`] puts it behind a tiny_http listener; a
//! serverless host can call `handle` directly.
//!
//! | method  | path            | response                                   |
//! |---------|-----------------|--------------------------------------------|
//! | POST    | /api/feedback   | `{success, message}` or 400/500 `{error}`  |
//! | GET     | /api/feedback   | summary with the last 10 entries           |
//! | GET     | /api/health     | `{status: "ok", timestamp}`                |
//! | OPTIONS | any             | 200, empty                                 |
//! | GET     | anything else   | static file, if a directory is configured  |

pub mod server;

use std::path::{Component, Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::error::ValidationError;
use crate::feedback::{FeedbackAck, FeedbackEntry, FeedbackRequest};
use crate::storage::FeedbackStore;

pub use server::ApiServer;

/// Headers attached to every response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

const JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some(JSON),
            body: value.to_string().into_bytes(),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &json!({ "error": message }))
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    /// Body parsed as JSON, for callers and tests.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackApi {
    store: FeedbackStore,
    static_dir: Option<PathBuf>,
}

impl FeedbackApi {
    pub fn new(store: FeedbackStore) -> Self {
        Self {
            store,
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn store(&self) -> &FeedbackStore {
        &self.store
    }

    /// Dispatch one request.
    pub fn handle(&self, method: &str, url: &str, body: &[u8]) -> ApiResponse {
        let path = url.split(['?', '#']).next().unwrap_or("/");

        if method.eq_ignore_ascii_case("OPTIONS") {
            return ApiResponse::empty(200);
        }

        match path {
            "/api/feedback" => {
                // Idempotent; serverless hosts may land on a fresh temp dir.
                if let Err(e) = self.store.init() {
                    tracing::error!(error = %e, "cannot initialize feedback store");
                }
                match method.to_ascii_uppercase().as_str() {
                    "POST" => self.post_feedback(body),
                    "GET" => self.get_feedback(),
                    _ => ApiResponse::error(405, "Method not allowed"),
                }
            }
            "/api/health" => match method.to_ascii_uppercase().as_str() {
                "GET" => ApiResponse::json(
                    200,
                    &json!({ "status": "ok", "timestamp": now_iso() }),
                ),
                _ => ApiResponse::error(405, "Method not allowed"),
            },
            p if p.starts_with("/api/") => ApiResponse::error(404, "Not found"),
            p if method.eq_ignore_ascii_case("GET") => self.static_file(p),
            _ => ApiResponse::error(404, "Not found"),
        }
    }

    fn post_feedback(&self, body: &[u8]) -> ApiResponse {
        let request = match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(doc) => FeedbackRequest::from_json(doc),
            Err(_) => return ApiResponse::error(400, &ValidationError::InvalidJson.to_string()),
        };
        let (rating, mode) = match request.validate() {
            Ok(valid) => valid,
            Err(e) => return ApiResponse::error(400, &e.to_string()),
        };

        let entry = FeedbackEntry::now(rating, mode);
        match self.store.append(entry.clone()) {
            Ok(()) => {
                tracing::info!(%rating, %mode, timestamp = %entry.timestamp, "feedback received");
                let ack = FeedbackAck {
                    success: true,
                    message: "Feedback recorded".to_string(),
                };
                ApiResponse::json(200, &json!(ack))
            }
            Err(e) => {
                tracing::error!(error = %e, "error saving feedback");
                ApiResponse::error(500, "Failed to save feedback")
            }
        }
    }

    fn get_feedback(&self) -> ApiResponse {
        match serde_json::to_value(self.store.summary()) {
            Ok(summary) => ApiResponse::json(200, &summary),
            Err(e) => {
                tracing::error!(error = %e, "error loading feedback");
                ApiResponse::error(500, "Failed to load feedback")
            }
        }
    }

    fn static_file(&self, path: &str) -> ApiResponse {
        let Some(root) = &self.static_dir else {
            return ApiResponse::error(404, "Not found");
        };
        let Some(relative) = sanitize(path) else {
            return ApiResponse::error(404, "Not found");
        };
        let file = root.join(relative);
        match std::fs::read(&file) {
            Ok(body) => ApiResponse {
                status: 200,
                content_type: Some(content_type_for(&file)),
                body,
            },
            Err(_) => ApiResponse::error(404, "Not found"),
        }
    }
}

/// Map a URL path to a relative file path, refusing anything that could
/// leave the static root.
fn sanitize(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    let trimmed = if trimmed.is_empty() || trimmed.ends_with('/') {
        format!("{trimmed}index.html")
    } else {
        trimmed.to_string()
    };
    let candidate = PathBuf::from(trimmed);
    let contained = candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    contained.then_some(candidate)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => JSON,
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
