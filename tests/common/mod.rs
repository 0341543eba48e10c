//! Shared doubles and the mocked Dash API for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dash_bridge::approval::Approval;
use dash_bridge::config::Config;
use dash_bridge::desktop::{DesktopOps, OpOutcome};
use dash_bridge::report::Reporter;

// ── Desktop double ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct DesktopCalls {
    pub probes: usize,
    pub launches: usize,
    pub pref_writes: usize,
}

/// Scripted desktop: probe outcomes play in order (the last repeats),
/// launch and preference-write outcomes are fixed, and a hook can mimic
/// Dash reacting to the preference write (e.g. by creating the status
/// file).
pub struct FakeDesktop {
    probe_script: Mutex<Vec<OpOutcome>>,
    launch_outcome: OpOutcome,
    pref_outcome: OpOutcome,
    on_pref_write: Option<Box<dyn Fn() + Send + Sync>>,
    pub calls: Mutex<DesktopCalls>,
}

impl FakeDesktop {
    pub fn new(probe_script: Vec<OpOutcome>) -> Self {
        Self {
            probe_script: Mutex::new(probe_script),
            launch_outcome: OpOutcome::Done,
            pref_outcome: OpOutcome::Done,
            on_pref_write: None,
            calls: Mutex::new(DesktopCalls::default()),
        }
    }

    /// The app is already running.
    pub fn running() -> Self {
        Self::new(vec![OpOutcome::Done])
    }

    /// The app never shows up, no matter how often it is probed.
    pub fn never_running() -> Self {
        Self::new(vec![OpOutcome::Missing("no process matching 'Dash'".into())])
    }

    pub fn with_launch(mut self, outcome: OpOutcome) -> Self {
        self.launch_outcome = outcome;
        self
    }

    pub fn with_pref(mut self, outcome: OpOutcome) -> Self {
        self.pref_outcome = outcome;
        self
    }

    pub fn on_pref_write(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_pref_write = Some(Box::new(hook));
        self
    }

    pub fn probes(&self) -> usize {
        self.calls.lock().unwrap().probes
    }

    pub fn launches(&self) -> usize {
        self.calls.lock().unwrap().launches
    }

    pub fn pref_writes(&self) -> usize {
        self.calls.lock().unwrap().pref_writes
    }
}

#[async_trait]
impl DesktopOps for FakeDesktop {
    async fn probe_process(&self, _pattern: &str) -> OpOutcome {
        self.calls.lock().unwrap().probes += 1;
        let mut script = self.probe_script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script
                .first()
                .cloned()
                .unwrap_or(OpOutcome::Missing("unscripted probe".into()))
        }
    }

    async fn launch_app(&self, _bundle_id: &str) -> OpOutcome {
        self.calls.lock().unwrap().launches += 1;
        self.launch_outcome.clone()
    }

    async fn write_preference(&self, _domain: &str, _key: &str) -> OpOutcome {
        self.calls.lock().unwrap().pref_writes += 1;
        if self.pref_outcome.is_done() {
            if let Some(hook) = &self.on_pref_write {
                hook();
            }
        }
        self.pref_outcome.clone()
    }
}

// ── Reporter double ──────────────────────────────────────────────────────

/// Records every diagnostic with its level.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    fn record(&self, level: &'static str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }

    /// Was a message at `level` containing `needle` reported?
    pub fn saw(&self, level: &str, needle: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn debug(&self, message: &str) {
        self.record("debug", message);
    }
    async fn info(&self, message: &str) {
        self.record("info", message);
    }
    async fn warn(&self, message: &str) {
        self.record("warn", message);
    }
    async fn error(&self, message: &str) {
        self.record("error", message);
    }
}

// ── Approval doubles ─────────────────────────────────────────────────────

/// Always answers the same way.
pub struct StaticApproval(pub bool);

#[async_trait]
impl Approval for StaticApproval {
    async fn request(&self, _message: &str) -> bool {
        self.0
    }
}

/// Never answers; exercises the approval timeout.
pub struct NeverAnswers;

#[async_trait]
impl Approval for NeverAnswers {
    async fn request(&self, _message: &str) -> bool {
        std::future::pending().await
    }
}

// ── Mocked Dash API ──────────────────────────────────────────────────────

pub struct MockState {
    pub health_hits: AtomicUsize,
    pub list_hits: AtomicUsize,
    pub search_hits: AtomicUsize,
    pub fts_hits: AtomicUsize,
    pub list_response: Mutex<(u16, serde_json::Value)>,
    pub search_response: Mutex<(u16, serde_json::Value)>,
    pub fts_response: Mutex<(u16, serde_json::Value)>,
    pub last_search_params: Mutex<Option<HashMap<String, String>>>,
    pub last_fts_params: Mutex<Option<HashMap<String, String>>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            health_hits: AtomicUsize::new(0),
            list_hits: AtomicUsize::new(0),
            search_hits: AtomicUsize::new(0),
            fts_hits: AtomicUsize::new(0),
            list_response: Mutex::new((200, serde_json::json!({ "docsets": [] }))),
            search_response: Mutex::new((200, serde_json::json!({ "results": [] }))),
            fts_response: Mutex::new((200, serde_json::json!({}))),
            last_search_params: Mutex::new(None),
            last_fts_params: Mutex::new(None),
        }
    }
}

pub struct MockDash {
    pub state: Arc<MockState>,
    pub port: u16,
    pub base_url: String,
}

impl MockDash {
    pub fn health_hits(&self) -> usize {
        self.state.health_hits.load(Ordering::SeqCst)
    }

    pub fn set_list_response(&self, status: u16, body: serde_json::Value) {
        *self.state.list_response.lock().unwrap() = (status, body);
    }

    pub fn set_search_response(&self, status: u16, body: serde_json::Value) {
        *self.state.search_response.lock().unwrap() = (status, body);
    }

    pub fn set_fts_response(&self, status: u16, body: serde_json::Value) {
        *self.state.fts_response.lock().unwrap() = (status, body);
    }
}

async fn health(State(state): State<Arc<MockState>>) -> StatusCode {
    state.health_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn list(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = state.list_response.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), Json(body))
}

async fn search(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.search_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_search_params.lock().unwrap() = Some(params);
    let (status, body) = state.search_response.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), Json(body))
}

async fn enable_fts(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.fts_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_fts_params.lock().unwrap() = Some(params);
    let (status, body) = state.fts_response.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), Json(body))
}

/// Bind the mock API to an ephemeral port and serve it for the rest of
/// the test.
pub async fn spawn_mock_dash() -> MockDash {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/health", get(health))
        .route("/docsets/list", get(list))
        .route("/search", get(search))
        .route("/docsets/enable_fts", get(enable_fts))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockDash {
        state,
        port,
        base_url: format!("http://127.0.0.1:{}", port),
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

/// Write a Dash-shaped status file advertising `port`.
pub fn write_status_file(path: &Path, port: u16) {
    std::fs::write(path, serde_json::json!({ "port": port }).to_string()).unwrap();
}

/// Config with test-friendly timings and an isolated status-file path.
pub fn test_config(status_file: PathBuf) -> Config {
    let mut config = Config::default();
    config.app.status_file = Some(status_file);
    config.bootstrap.launch_settle_ms = 200;
    config.bootstrap.enable_settle_ms = 200;
    config.bootstrap.poll_step_ms = 10;
    config.bootstrap.health_timeout_secs = 2;
    config.bootstrap.request_timeout_secs = 5;
    config.bootstrap.approval_timeout_secs = 5;
    config
}

/// A port with nothing listening on it (bound briefly, then released).
pub async fn dead_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
