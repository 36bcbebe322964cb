//! Shared fixtures: a local stand-in for the Vision `images:annotate` API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

/// One request received by the fake engine.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub key: Option<String>,
    pub body: Value,
}

/// Canned reply for every request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct FakeState {
    reply: Arc<Reply>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Running fake engine.
pub struct FakeVision {
    pub endpoint: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeVision {
    pub async fn start(reply: Reply) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            reply: Arc::new(reply),
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/annotate", post(annotate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: format!("http://{}/annotate", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn annotate(
    State(state): State<FakeState>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(RecordedRequest {
        key: query.get("key").cloned(),
        body,
    });

    if !state.reply.delay.is_zero() {
        tokio::time::sleep(state.reply.delay).await;
    }

    (state.reply.status, Json(state.reply.body.clone()))
}

/// Word whose last symbol carries `brk` (e.g. "SPACE", "LINE_BREAK").
pub fn word(text: &str, confidence: f32, brk: Option<&str>) -> Value {
    let chars: Vec<char> = text.chars().collect();
    let symbols: Vec<Value> = chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut symbol = json!({ "text": c.to_string(), "confidence": confidence });
            if i + 1 == chars.len() {
                if let Some(b) = brk {
                    symbol["property"] = json!({ "detectedBreak": { "type": b } });
                }
            }
            symbol
        })
        .collect();
    json!({ "symbols": symbols })
}

/// Batch response with one page; each inner vec is a block of words.
pub fn annotation(text: &str, blocks: Vec<Vec<Value>>) -> Value {
    let blocks: Vec<Value> = blocks
        .into_iter()
        .map(|words| json!({ "paragraphs": [{ "words": words }] }))
        .collect();
    json!({
        "responses": [{
            "fullTextAnnotation": { "text": text, "pages": [{ "blocks": blocks }] },
            "textAnnotations": [{ "description": text }]
        }]
    })
}

/// Small PNG label stand-in.
pub fn label_png() -> Vec<u8> {
    let img = image::GrayImage::from_fn(32, 16, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            image::Luma([30u8])
        } else {
            image::Luma([220u8])
        }
    });
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}
