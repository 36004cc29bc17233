//! In-process fixture backend for integration tests.
//!
//! Serves the backend's HTTP contract under `/api/v1` on `127.0.0.1:0`,
//! using the backend's own mixed-case field names, and records every JSON
//! request body it receives.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Scores returned by the search endpoint, in the order they are sent.
pub const SEARCH_SCORES: [f64; 5] = [0.9, 0.7, 0.7, 0.3, 0.1];

pub const SCRAPE_INSERTED_CHUNKS: i64 = 41;
pub const SCRAPE_PROCESSED_PAGES: i64 = 9;

#[derive(Default)]
pub struct Recorder {
    name: String,
    scrape_delay: Duration,
    /// `(path, body)` of every JSON request, in arrival order.
    pub requests: Mutex<Vec<(String, Value)>>,
    /// Raw multipart bodies received by the upload endpoints.
    pub uploads: Mutex<Vec<Vec<u8>>>,
    /// Query strings received by the index info endpoint.
    pub info_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl Recorder {
    fn record(&self, path: &str, body: &Value) {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
    }

    pub fn bodies_for(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, b)| b.clone())
            .collect()
    }
}

pub struct Fixture {
    /// Absolute API base URL, e.g. `http://127.0.0.1:41234/api/v1`.
    pub api_url: String,
    pub recorder: Arc<Recorder>,
}

impl Fixture {
    pub async fn start() -> Self {
        Self::start_with("fixture", Duration::ZERO).await
    }

    pub async fn start_named(name: &str) -> Self {
        Self::start_with(name, Duration::ZERO).await
    }

    /// A backend whose scrape endpoint takes `delay` before answering.
    pub async fn start_slow_scrape(delay: Duration) -> Self {
        Self::start_with("fixture", delay).await
    }

    async fn start_with(name: &str, scrape_delay: Duration) -> Self {
        let recorder = Arc::new(Recorder {
            name: name.to_string(),
            scrape_delay,
            ..Default::default()
        });

        let api = Router::new()
            .route("/health", get(health))
            .route("/broken", get(broken))
            .route("/data/libraries", get(libraries))
            .route("/data/upload", post(upload))
            .route("/data/process", post(process))
            .route("/data/scrape", post(scrape))
            .route("/data/scrape/cancel", post(cancel))
            .route("/data/scrape/cache/process", post(scrape_cache))
            .route("/data/reset", post(reset))
            .route("/data/asset/{id}", delete(delete_asset))
            .route("/data/assets", delete(delete_assets))
            .route("/nlp/index/push", post(push))
            .route("/nlp/index/info", get(info))
            .route("/nlp/index/search", post(search))
            .route("/nlp/index/answer", post(answer))
            .route("/prescription/analyze", post(analyze))
            .with_state(recorder.clone());
        let app = Router::new().nest("/api/v1", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            api_url: format!("http://{}/api/v1", addr),
            recorder,
        }
    }
}

type Shared = State<Arc<Recorder>>;

async fn health(State(s): Shared) -> Json<Value> {
    Json(json!({"app_name": s.name, "app_version": "0.1"}))
}

async fn broken() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "disk full"})),
    )
        .into_response()
}

async fn libraries() -> Json<Value> {
    Json(json!({
        "signal": "libraries_retrieved",
        "libraries": [
            {"id": 3, "name": "langchain"},
            {"id": 7, "name": "tokio"}
        ]
    }))
}

async fn upload(State(s): Shared, body: Bytes) -> Json<Value> {
    let mut uploads = s.uploads.lock().unwrap();
    uploads.push(body.to_vec());
    Json(json!({"signal": "file_upload_success", "file_id": format!("f-{}", uploads.len())}))
}

async fn process(State(s): Shared, Json(body): Json<Value>) -> Json<Value> {
    s.record("/data/process", &body);
    Json(json!({"signal": "processing_success", "Inserted_chunks": 12, "processed_files": 2}))
}

fn scrape_counts() -> Value {
    json!({
        "signal": "processing_done",
        "Inserted_chunks": SCRAPE_INSERTED_CHUNKS,
        "processed_pages": SCRAPE_PROCESSED_PAGES,
        "total_pages_scraped": 10
    })
}

async fn scrape(State(s): Shared, Json(body): Json<Value>) -> Json<Value> {
    s.record("/data/scrape", &body);
    if !s.scrape_delay.is_zero() {
        tokio::time::sleep(s.scrape_delay).await;
    }
    if body["base_url"].as_str().is_some_and(|u| u.contains("cancel-me")) {
        let mut counts = scrape_counts();
        counts["signal"] = json!("cancelled");
        return Json(counts);
    }
    Json(scrape_counts())
}

async fn scrape_cache(State(s): Shared, Json(body): Json<Value>) -> Json<Value> {
    s.record("/data/scrape/cache/process", &body);
    Json(scrape_counts())
}

async fn cancel() -> Json<Value> {
    Json(json!({"signal": "cancelled", "message": "Cancel requested"}))
}

async fn reset() -> Json<Value> {
    Json(json!({"signal": "project_reset"}))
}

async fn delete_asset(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({"signal": "asset_deleted", "asset_id": id}))
}

async fn delete_assets() -> Json<Value> {
    Json(json!({"signal": "assets_deleted", "deleted_count": 3}))
}

async fn push(State(s): Shared, Json(body): Json<Value>) -> Json<Value> {
    s.record("/nlp/index/push", &body);
    Json(json!({"Signal": "insert_into_vectordb_success", "InsertedItemsCount": 41}))
}

async fn info(State(s): Shared, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    s.info_queries.lock().unwrap().push(query);
    Json(json!({
        "Signal": "vectordb_collection_retrieved",
        "CollectionInfo": {"points_count": 42, "status": "green"}
    }))
}

async fn search(State(s): Shared, Json(body): Json<Value>) -> Json<Value> {
    s.record("/nlp/index/search", &body);
    let limit = body["limit"].as_u64().unwrap_or(5) as usize;
    let results: Vec<Value> = SEARCH_SCORES
        .iter()
        .enumerate()
        .take(limit)
        .map(|(i, score)| json!({"text": format!("chunk {}", i), "score": score, "metadata": {"source": "fixture"}}))
        .collect();
    Json(json!({"Signal": "vectordb_search_success", "Results": results}))
}

async fn answer(State(s): Shared, Json(body): Json<Value>) -> Response {
    s.record("/nlp/index/answer", &body);
    let text = body["text"].as_str().unwrap_or_default().to_string();
    if text.contains("fail") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"Signal": "rag_answer_error", "error": "llm offline"})),
        )
            .into_response();
    }
    Json(json!({
        "Signal": "rag_answer_success",
        "Answer": format!("answer to: {}", text),
        "FullPrompt": "## Documents\n...",
        "ChatHistory": [{"role": "system", "content": "You are a helpful assistant."}]
    }))
    .into_response()
}

async fn analyze(State(s): Shared, body: Bytes) -> Json<Value> {
    s.uploads.lock().unwrap().push(body.to_vec());
    Json(json!({
        "signal": "prescription_analyzed",
        "ocr_text": "Amoxil 500mg twice daily",
        "medicines": [
            {"name": "Amoxil", "active_ingredient": "Amoxicillin", "image_url": "http://img/amoxil.png"},
            {"name": "Panadol", "active_ingredient": "Paracetamol"}
        ]
    }))
}
