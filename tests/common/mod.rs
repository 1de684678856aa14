#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use castlytics::config::AppConfig;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

pub const API_KEY: &str = "test-key";

/// In-process stand-in for the Neynar v2 API.
#[derive(Clone)]
pub struct MockNeynar {
    pub hits: Arc<AtomicUsize>,
    pub queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub experimental_headers: Arc<AtomicUsize>,
    pub api_keys: Arc<Mutex<Vec<String>>>,
    fail_first: usize,
    fail_status: StatusCode,
}

impl MockNeynar {
    pub fn new() -> Self {
        Self::failing(0, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Answers the first `count` cast requests with `status`.
    pub fn failing(count: usize, status: StatusCode) -> Self {
        Self {
            hits: Arc::new(AtomicUsize::new(0)),
            queries: Arc::new(Mutex::new(Vec::new())),
            experimental_headers: Arc::new(AtomicUsize::new(0)),
            api_keys: Arc::new(Mutex::new(Vec::new())),
            fail_first: count,
            fail_status: status,
        }
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> HashMap<String, String> {
        self.queries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    /// Binds to an ephemeral port and returns the API base URL.
    pub async fn spawn(self) -> String {
        let app = Router::new()
            .route("/v2/farcaster/user/casts", get(casts))
            .route("/v2/farcaster/feed", get(feed))
            .route("/v2/farcaster/user/by_username", get(by_username))
            .with_state(self);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v2", addr)
    }
}

pub fn sample_page() -> Value {
    json!({
        "casts": [
            {
                "hash": "0x1",
                "text": "gm farcaster",
                "author": { "fid": 3, "username": "dwr.eth", "display_name": "Dan", "pfp_url": "https://i/dan.png" },
                "reactions": { "likes_count": 10, "recasts_count": 2 },
                "replies": { "count": 1 },
                "timestamp": "2025-03-10T10:00:00Z",
                "embeds": []
            },
            {
                "hash": "0x2",
                "text": "   ",
                "author": { "fid": 3, "username": "dwr.eth" },
                "reactions": { "likes_count": 500, "recasts_count": 50 },
                "replies": { "count": 5 },
                "timestamp": "2025-03-09T10:00:00Z"
            },
            {
                "hash": "0x3",
                "text": "second best",
                "author": { "fid": 3, "username": "dwr.eth", "display_name": "Dan" },
                "reactions": { "likes": [{ "fid": 1 }, { "fid": 2 }] },
                "replies": { "count": 20 },
                "timestamp": "2025-03-08T10:00:00Z"
            },
            {
                "hash": "0x4",
                "text": "quiet one",
                "author": { "fid": 3, "username": "dwr.eth", "display_name": "Dan" },
                "timestamp": "2025-03-07T10:00:00Z"
            }
        ],
        "next": { "cursor": null }
    })
}

pub fn config_for(api_base: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.neynar.api_key = Some(API_KEY.to_string());
    config.neynar.api_base = api_base.to_string();
    config.neynar.timeout_ms = 5_000;
    config.retry.delay_ms = 0;
    config
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == API_KEY)
        .unwrap_or(false)
}

fn record(state: &MockNeynar, query: HashMap<String, String>) -> Option<Response> {
    state.queries.lock().unwrap().push(query);
    let hit = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    if hit <= state.fail_first {
        return Some((state.fail_status, "upstream unavailable").into_response());
    }
    None
}

async fn casts(
    State(state): State<MockNeynar>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(key) = headers.get("x-api-key").and_then(|value| value.to_str().ok()) {
        state.api_keys.lock().unwrap().push(key.to_string());
    }
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, r#"{"message":"invalid api key"}"#).into_response();
    }
    if let Some(failure) = record(&state, query) {
        return failure;
    }
    Json(sample_page()).into_response()
}

async fn feed(
    State(state): State<MockNeynar>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if headers.get("x-neynar-experimental").is_some() {
        state.experimental_headers.fetch_add(1, Ordering::SeqCst);
    }
    if let Some(failure) = record(&state, query) {
        return failure;
    }
    Json(sample_page()).into_response()
}

async fn by_username(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match query.get("username").map(String::as_str) {
        Some("dwr.eth") => Json(json!({
            "user": {
                "fid": 3,
                "username": "dwr.eth",
                "display_name": "Dan",
                "pfp_url": "https://i/dan.png"
            }
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, r#"{"message":"user not found"}"#).into_response(),
    }
}
