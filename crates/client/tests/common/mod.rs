//! In-process stand-in for the generation service.
//!
//! Binds an axum router to `127.0.0.1:0` and records every request so
//! tests can assert on exactly what the client sent.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

/// Body served at `/files/song.mp3`.
pub const ARTIFACT_BYTES: &[u8] = b"ID3\x03fake-mp3-payload";

/// One multipart part as received by the fake service.
#[derive(Debug, Clone)]
pub struct CapturedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Scripted reply for one `GET /download`.
#[derive(Debug, Clone)]
pub enum DownloadReply {
    Pending,
    Ready(String),
    Status(u16),
    Garbage,
}

#[derive(Default)]
pub struct FakeService {
    pub uploads: Mutex<Vec<Vec<CapturedPart>>>,
    pub download_ids: Mutex<Vec<String>>,
    pub user_agents: Mutex<Vec<String>>,
    upload_delay: Mutex<Option<Duration>>,
    upload_status: Mutex<Option<u16>>,
    download_script: Mutex<VecDeque<DownloadReply>>,
    upload_count: AtomicUsize,
}

impl FakeService {
    /// Make every `POST /upload` fail with `status`.
    pub fn fail_uploads_with(&self, status: u16) {
        *self.upload_status.lock().unwrap() = Some(status);
    }

    /// Hold every `POST /upload` for `delay` before answering.
    pub fn delay_uploads(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    /// Queue replies for `GET /download`; once exhausted, jobs stay pending.
    pub fn script_downloads(&self, replies: impl IntoIterator<Item = DownloadReply>) {
        self.download_script.lock().unwrap().extend(replies);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn download_count(&self) -> usize {
        self.download_ids.lock().unwrap().len()
    }
}

/// A running fake service.
pub struct TestServer {
    pub url: String,
    pub state: Arc<FakeService>,
}

pub async fn spawn_service() -> TestServer {
    let state = Arc::new(FakeService::default());

    let app = Router::new()
        .route("/upload", post(upload))
        .route("/download", get(download))
        .route("/health", get(health))
        .route("/files/song.mp3", get(artifact))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake service");
    });

    TestServer {
        url: format!("http://{addr}"),
        state,
    }
}

/// Song body the fake returns for job `id`.
pub fn song_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Sunset Drive",
        "genre_tags": ["pop"],
        "song_bpm": 100,
        "language": "English",
        "singer": "female",
        "lyrics": "Golden light on the water",
        "audio_url": format!("https://cdn.example/{id}/preview.mp3"),
    })
}

async fn upload(State(state): State<Arc<FakeService>>, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.expect("field bytes").to_vec();
        parts.push(CapturedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state.uploads.lock().unwrap().push(parts);

    let delay = *state.upload_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(status) = *state.upload_status.lock().unwrap() {
        let status = StatusCode::from_u16(status).expect("valid status");
        return (status, Json(json!({ "error": "Failed to generate lyrics" }))).into_response();
    }

    let n = state.upload_count.fetch_add(1, Ordering::SeqCst) + 1;
    let id = if n == 1 { "abc".to_string() } else { format!("abc-{n}") };
    Json(song_json(&id)).into_response()
}

async fn download(
    State(state): State<Arc<FakeService>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let id = query.get("id").cloned().unwrap_or_default();
    state.download_ids.lock().unwrap().push(id);

    let reply = state
        .download_script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(DownloadReply::Pending);

    match reply {
        DownloadReply::Pending => Json(json!({ "ready": false })).into_response(),
        DownloadReply::Ready(url) => Json(json!({ "ready": true, "audio_url": url })).into_response(),
        DownloadReply::Status(code) => StatusCode::from_u16(code)
            .expect("valid status")
            .into_response(),
        DownloadReply::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
    }
}

async fn health(State(state): State<Arc<FakeService>>, headers: HeaderMap) -> Json<serde_json::Value> {
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.user_agents.lock().unwrap().push(agent);
    Json(json!({ "status": "healthy" }))
}

async fn artifact() -> &'static [u8] {
    ARTIFACT_BYTES
}
