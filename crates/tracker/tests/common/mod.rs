//! In-process stand-in for the dubbing server.
//!
//! Serves the same routes as the real server on `127.0.0.1:0` and records
//! what it receives. Status replies are scripted per test.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// What the mock saw in a `POST /upload`.
#[derive(Debug, Clone, Default)]
pub struct ReceivedUpload {
    pub file_name: Option<String>,
    pub bytes: usize,
    pub target_language: String,
}

#[derive(Default)]
pub struct MockState {
    /// Overrides the default successful upload reply.
    pub upload_reply: Mutex<Option<(StatusCode, String)>>,
    pub uploads: Mutex<Vec<ReceivedUpload>>,
    /// Scripted `/status` replies, consumed in order.
    pub statuses: Mutex<VecDeque<(StatusCode, Value)>>,
    pub status_hits: AtomicUsize,
    /// Job IDs whose download is available.
    pub downloads: Mutex<HashMap<String, Vec<u8>>>,
    pub preferences: Mutex<Vec<HashMap<String, String>>>,
}

impl MockState {
    pub fn script_status(&self, code: StatusCode, body: Value) {
        self.statuses.lock().unwrap().push_back((code, body));
    }

    pub fn script_processing(&self, times: usize) {
        for _ in 0..times {
            self.script_status(
                StatusCode::OK,
                json!({"status": "transcribing", "progress": 30, "message": "Transcribing audio..."}),
            );
        }
    }

    pub fn script_completed(&self) {
        self.script_status(
            StatusCode::OK,
            json!({"status": "completed", "progress": 100, "message": "Processing completed"}),
        );
    }

    pub fn status_hits(&self) -> usize {
        self.status_hits.load(Ordering::SeqCst)
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockState>,
}

/// Bind the mock server to an ephemeral port and serve it in the
/// background.
pub async fn spawn_server() -> MockServer {
    let state = Arc::new(MockState::default());

    let app = Router::new()
        .route("/upload", post(upload))
        .route("/status/{job_id}", get(status))
        .route("/jobs", get(jobs))
        .route("/preferences", post(preferences))
        .route("/download/{job_id}", get(download))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    MockServer {
        base_url: format!("http://{addr}"),
        state,
    }
}

async fn upload(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    let mut received = ReceivedUpload::default();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                received.file_name = field.file_name().map(str::to_string);
                received.bytes = field.bytes().await.expect("video bytes").len();
            }
            "target_language" => {
                received.target_language = field.text().await.expect("language text");
            }
            _ => {}
        }
    }
    state.uploads.lock().unwrap().push(received);

    if let Some((code, body)) = state.upload_reply.lock().unwrap().clone() {
        return (code, body).into_response();
    }

    let job_id = uuid::Uuid::new_v4().to_string();
    Json(json!({
        "success": true,
        "job_id": job_id,
        "message": "Video uploaded successfully. Processing started.",
    }))
    .into_response()
}

async fn status(State(state): State<Arc<MockState>>, Path(_job_id): Path<String>) -> Response {
    state.status_hits.fetch_add(1, Ordering::SeqCst);
    let scripted = state.statuses.lock().unwrap().pop_front();
    let (code, body) = scripted.unwrap_or_else(|| {
        (
            StatusCode::OK,
            json!({"status": "processing", "progress": 50, "message": "Working..."}),
        )
    });
    (code, Json(body)).into_response()
}

async fn jobs() -> Json<Value> {
    Json(json!({
        "success": true,
        "jobs": [
            {
                "id": "j-2",
                "filename": "talk.webm",
                "status": "translating",
                "progress": 60,
                "message": "Translating text...",
                "target_language": "de",
                "source_language": null,
                "created_at": "2024-03-02T08:00:00",
                "completed_at": null,
                "file_size": 1024,
                "duration": null,
                "output_path": null
            },
            {
                "id": "j-1",
                "filename": "clip.mp4",
                "status": "completed",
                "progress": 100,
                "message": "Processing completed",
                "target_language": "es",
                "source_language": "en",
                "created_at": "2024-03-01T10:15:30.123456",
                "completed_at": "2024-03-01T10:17:02.000001",
                "file_size": 2048,
                "duration": 12.5,
                "output_path": "processed/j-1/dubbed.mp4"
            }
        ]
    }))
}

async fn preferences(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    state.preferences.lock().unwrap().push(form.clone());
    Json(json!({
        "success": true,
        "message": "Preferences updated",
        "preferences": {
            "preferred_language": form.get("preferred_language").cloned().unwrap_or_else(|| "en".into()),
            "theme": form.get("theme").cloned().unwrap_or_else(|| "dark".into()),
        }
    }))
}

async fn download(State(state): State<Arc<MockState>>, Path(job_id): Path<String>) -> Response {
    match state.downloads.lock().unwrap().get(&job_id) {
        Some(bytes) => ([(header::CONTENT_TYPE, "video/mp4")], bytes.clone()).into_response(),
        // The real server redirects to its index page here.
        None => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            "<html><body>Video not found</body></html>",
        )
            .into_response(),
    }
}
