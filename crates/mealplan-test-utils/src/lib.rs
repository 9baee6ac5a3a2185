//! Shared test utilities for meal plan integration tests.
//!
//! Provides an in-process stub of the meal plan server. Each test starts its
//! own [`StubServer`] on an ephemeral localhost port, scripts the replies it
//! wants, and inspects the requests the server saw.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A canned reply for one request.
#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubReply {
    /// 200 with a JSON body.
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// A reply with an arbitrary status and raw body.
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// Hold the reply back for `delay` before answering.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl IntoResponse for StubReply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

/// A request the stub received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub user_id: Option<String>,
    pub query: Option<String>,
}

#[derive(Default)]
struct StubState {
    generate: Mutex<VecDeque<StubReply>>,
    history: Mutex<Option<StubReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl StubState {
    fn record(&self, request: RecordedRequest) {
        lock(&self.requests).push(request);
    }

    fn next_generate(&self) -> StubReply {
        lock(&self.generate).pop_front().unwrap_or_else(|| {
            StubReply::raw(500, json!({"detail": "no scripted reply"}).to_string())
        })
    }
}

/// Build the stub's router.
fn build_router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/mealplan/generate/{user_id}", post(generate))
        .route("/users/{user_id}/mealplans", get(history))
        .route("/health", get(health))
        .with_state(state)
}

async fn generate(State(state): State<Arc<StubState>>, Path(user_id): Path<String>) -> StubReply {
    state.record(RecordedRequest {
        method: "POST",
        path: format!("/mealplan/generate/{user_id}"),
        user_id: Some(user_id),
        query: None,
    });
    let reply = state.next_generate();
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    reply
}

async fn history(
    State(state): State<Arc<StubState>>,
    Path(user_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> StubReply {
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    state.record(RecordedRequest {
        method: "GET",
        path: format!("/users/{user_id}/mealplans"),
        user_id: Some(user_id.clone()),
        query: (!query.is_empty()).then_some(query),
    });
    lock(&state.history).clone().unwrap_or_else(|| {
        StubReply::json(json!({"status": "success", "user_id": user_id, "history": []}))
    })
}

async fn health(State(state): State<Arc<StubState>>) -> StubReply {
    state.record(RecordedRequest {
        method: "GET",
        path: "/health".to_owned(),
        user_id: None,
        query: None,
    });
    StubReply::json(json!({"status": "healthy"}))
}

/// Stub meal plan server bound to `127.0.0.1` on an ephemeral port.
///
/// The server task is aborted when the handle is dropped.
pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Start a stub server on the current tokio runtime.
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub server");
        let addr = listener.local_addr().expect("stub server has no address");
        let app = build_router(Arc::clone(&state));
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("stub server stopped: {e}");
            }
        });
        Self { addr, state, task }
    }

    /// `http://127.0.0.1:<port>`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a reply for the next generation request. Replies are served in
    /// the order requests arrive.
    pub fn push_generate(&self, reply: StubReply) -> &Self {
        lock(&self.state.generate).push_back(reply);
        self
    }

    /// Reply to every history request with `reply`.
    pub fn set_history(&self, reply: StubReply) -> &Self {
        *lock(&self.state.history) = Some(reply);
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Wait until at least `count` requests have arrived.
    pub async fn wait_for_requests(&self, count: usize) {
        for _ in 0..500 {
            if lock(&self.state.requests).len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("stub server did not receive {count} requests in time");
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A base URL on which nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind probe listener");
    let addr = listener.local_addr().expect("probe listener has no address");
    drop(listener);
    format!("http://{addr}")
}
