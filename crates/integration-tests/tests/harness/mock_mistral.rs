//! Mock Mistral API server for integration tests
//!
//! Serves `/v1/chat/completions` with canned content, either as one JSON
//! body or as an SSE stream, and records what it was sent.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Where the mock reports token usage in a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageMode {
    /// On the final chunk, top level
    Inline,
    /// Inside the final chunk's choice
    Nested,
    /// Not at all
    Omitted,
}

/// Canned behavior for the mock
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Content deltas, one per stream chunk
    pub pieces: Vec<String>,
    pub usage: UsageMode,
    /// Pause before each body segment
    pub segment_delay: Option<Duration>,
    /// Re-cut the stream body into segments of this many bytes
    pub segment_bytes: Option<usize>,
    /// Number of requests to fail before succeeding
    pub fail_count: u32,
    /// Status returned for failed requests
    pub fail_status: StatusCode,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            pieces: vec!["Hello".to_owned(), " from".to_owned(), " Mistral".to_owned()],
            usage: UsageMode::Inline,
            segment_delay: None,
            segment_bytes: None,
            fail_count: 0,
            fail_status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

pub const PROMPT_TOKENS: u32 = 12;
pub const COMPLETION_TOKENS: u32 = 3;

/// Mock Mistral backend
pub struct MockMistral {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    options: MockOptions,
    completion_count: AtomicU32,
    fail_remaining: AtomicU32,
    last_body: Mutex<Option<Value>>,
    last_authorization: Mutex<Option<String>>,
}

impl MockMistral {
    /// Start with default content
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MockOptions::default()).await
    }

    /// Start a mock that fails the first `n` requests with `status`
    pub async fn start_failing(n: u32, status: StatusCode) -> anyhow::Result<Self> {
        Self::start_with(MockOptions {
            fail_count: n,
            fail_status: status,
            ..MockOptions::default()
        })
        .await
    }

    pub async fn start_with(options: MockOptions) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            completion_count: AtomicU32::new(0),
            fail_remaining: AtomicU32::new(options.fail_count),
            options,
            last_body: Mutex::new(None),
            last_authorization: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including the `/v1` prefix
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of completion requests received, failed ones included
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// JSON body of the most recent request
    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }

    /// `Authorization` header of the most recent request
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

impl Drop for MockMistral {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Handlers --

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *state.last_body.lock().unwrap() = Some(body.clone());

    let remaining = state.fail_remaining.load(Ordering::Relaxed);
    if remaining > 0 {
        state.fail_remaining.fetch_sub(1, Ordering::Relaxed);
        let message = if state.options.fail_status == StatusCode::UNAUTHORIZED {
            "Unauthorized"
        } else {
            "mock server intentional failure"
        };
        return (
            state.options.fail_status,
            Json(json!({"object": "error", "message": message, "type": "mock_error", "code": null})),
        )
            .into_response();
    }

    let model = body["model"].as_str().unwrap_or("mistral-small-latest").to_owned();
    if body["stream"].as_bool().unwrap_or(false) {
        return streaming_response(&state.options, &model);
    }

    let content: String = state.options.pieces.concat();
    let mut response = json!({
        "id": "cmpl-mock-1",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content, "tool_calls": null},
            "finish_reason": "stop"
        }]
    });
    if state.options.usage != UsageMode::Omitted {
        response["usage"] = usage();
    }

    Json(response).into_response()
}

fn usage() -> Value {
    json!({
        "prompt_tokens": PROMPT_TOKENS,
        "completion_tokens": COMPLETION_TOKENS,
        "total_tokens": PROMPT_TOKENS + COMPLETION_TOKENS
    })
}

/// Build the SSE body, one event per segment unless re-cut by bytes
fn streaming_response(options: &MockOptions, model: &str) -> Response {
    let mut events = Vec::new();

    for (i, piece) in options.pieces.iter().enumerate() {
        let mut delta = json!({"content": piece});
        if i == 0 {
            delta["role"] = json!("assistant");
        }
        let chunk = json!({
            "id": "cmpl-mock-stream",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000u64,
            "model": model,
            "choices": [{"index": 0, "delta": delta, "finish_reason": null}]
        });
        events.push(format!("data: {chunk}\n\n"));
    }

    let mut last_choice = json!({"index": 0, "delta": {"content": ""}, "finish_reason": "stop"});
    let mut last = json!({
        "id": "cmpl-mock-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000u64,
        "model": model,
    });
    match options.usage {
        UsageMode::Inline => last["usage"] = usage(),
        UsageMode::Nested => last_choice["usage"] = usage(),
        UsageMode::Omitted => {}
    }
    last["choices"] = json!([last_choice]);
    events.push(format!("data: {last}\n\n"));
    events.push("data: [DONE]\n\n".to_owned());

    let segments: Vec<Bytes> = match options.segment_bytes {
        Some(size) => events
            .concat()
            .into_bytes()
            .chunks(size)
            .map(Bytes::copy_from_slice)
            .collect(),
        None => events.into_iter().map(Bytes::from).collect(),
    };

    let delay = options.segment_delay;
    let stream = futures_util::stream::iter(segments).then(move |segment| async move {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok::<_, Infallible>(segment)
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(stream))
        .unwrap()
}
