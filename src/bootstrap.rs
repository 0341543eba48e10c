//! Connection bootstrap: from unknown state to a verified base URL.
//!
//! Every documentation operation starts here. The sequence is linear:
//!
//! ```text
//! probe process ──missing──▶ launch + poll ──still missing──▶ NotReady
//!       │
//!       ▼
//! resolve port ──none──▶ ask operator ──approved──▶ write pref + poll
//!       │                     │                          │
//!       ▼                     └──declined/timeout──▶ NotReady
//! health check ──2xx──▶ Ready(base_url)
//!       └──anything else──▶ NotReady
//! ```
//!
//! Nothing is memoized across calls: Dash may restart and pick a new port
//! between invocations, so a returned base URL is always health-verified
//! within the same call. Expected unavailability (app absent, API
//! disabled, operator declines) is a [`BootstrapOutcome::NotReady`] value,
//! never an error.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::approval::Approval;
use crate::config::Config;
use crate::desktop::{DesktopOps, OpOutcome};
use crate::health;
use crate::report::Reporter;
use crate::status;

/// Where a single bootstrap attempt currently stands. Transient: the
/// state machine is re-run from `Unknown` on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unknown,
    ProcessMissing,
    ProcessRunning,
    CapabilityDisabled,
    PortKnown(u16),
    Ready(String),
    Failed(String),
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Unknown => write!(f, "unknown"),
            ConnectionState::ProcessMissing => write!(f, "Dash is not running"),
            ConnectionState::ProcessRunning => write!(f, "Dash is running, port unknown"),
            ConnectionState::CapabilityDisabled => write!(f, "the Dash API server is disabled"),
            ConnectionState::PortKnown(port) => write!(f, "port {} resolved, unverified", port),
            ConnectionState::Ready(url) => write!(f, "ready at {}", url),
            ConnectionState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// The sole contract exposed to operation code: a verified base URL, or a
/// user-facing reason there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Ready(String),
    NotReady(String),
}

impl BootstrapOutcome {
    pub fn base_url(&self) -> Option<&str> {
        match self {
            BootstrapOutcome::Ready(url) => Some(url),
            BootstrapOutcome::NotReady(_) => None,
        }
    }
}

const NOT_RUNNING: &str = "Dash is not running and could not be launched. \
    Start it manually with: open -b com.kapeli.dashdoc";

const NOT_ENABLED: &str = "The Dash API server is not enabled. Enable it in \
    Dash Settings > Integration, or run: defaults write com.kapeli.dashdoc \
    DHAPIServerEnabled YES";

/// Drives the bootstrap state machine.
///
/// Holds no connection state of its own; the desktop, reporter, and
/// approval seams are injected so the same machine serves MCP, CLI, and
/// tests.
pub struct Bootstrapper {
    config: Arc<Config>,
    desktop: Arc<dyn DesktopOps>,
    reporter: Arc<dyn Reporter>,
    approval: Arc<dyn Approval>,
}

impl Bootstrapper {
    pub fn new(
        config: Arc<Config>,
        desktop: Arc<dyn DesktopOps>,
        reporter: Arc<dyn Reporter>,
        approval: Arc<dyn Approval>,
    ) -> Self {
        Self {
            config,
            desktop,
            reporter,
            approval,
        }
    }

    /// Run one full bootstrap attempt.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        match self.attempt().await {
            ConnectionState::Ready(url) => BootstrapOutcome::Ready(url),
            ConnectionState::ProcessMissing => BootstrapOutcome::NotReady(NOT_RUNNING.to_string()),
            ConnectionState::CapabilityDisabled => {
                BootstrapOutcome::NotReady(NOT_ENABLED.to_string())
            }
            ConnectionState::Failed(reason) => BootstrapOutcome::NotReady(reason),
            // attempt() only returns terminal states; anything else is a bug
            // in the state machine, reported as plainly as possible.
            state => BootstrapOutcome::NotReady(format!("bootstrap stopped at: {}", state)),
        }
    }

    /// Run the state machine and return the terminal [`ConnectionState`].
    ///
    /// Used directly by `dashb status`, which wants the state rather than
    /// the flattened outcome.
    pub async fn attempt(&self) -> ConnectionState {
        // A fixed URL bypasses detection entirely, but still gets health
        // checked: the invariant is that a returned URL answered within
        // this call.
        if let Some(url) = self.config.api.custom_url() {
            let url = url.trim_end_matches('/').to_string();
            self.reporter
                .debug(&format!("using custom Dash API URL: {}", url))
                .await;
            return if health::verify(&url, self.health_timeout()).await {
                ConnectionState::Ready(url)
            } else {
                self.reporter
                    .error(&format!("custom Dash API URL is not responding: {}", url))
                    .await;
                ConnectionState::Failed(format!(
                    "The configured Dash API URL {} is not responding.",
                    url
                ))
            };
        }

        let mut state = ConnectionState::Unknown;
        tracing::trace!("bootstrap state: {}", state);

        if !self.ensure_running().await {
            return ConnectionState::ProcessMissing;
        }
        state = ConnectionState::ProcessRunning;
        tracing::trace!("bootstrap state: {}", state);

        let status_path = match self.config.app.status_file_path() {
            Some(path) => path,
            None => {
                self.reporter
                    .error("cannot locate the Dash status file (no home directory)")
                    .await;
                return ConnectionState::Failed(
                    "Cannot locate the Dash status file on this host.".to_string(),
                );
            }
        };

        let port = match status::resolve_port(&status_path) {
            Some(port) => port,
            None => match self.try_enable(&status_path).await {
                Some(port) => port,
                None => return ConnectionState::CapabilityDisabled,
            },
        };
        state = ConnectionState::PortKnown(port);
        tracing::trace!("bootstrap state: {}", state);

        let base_url = format!("http://127.0.0.1:{}", port);
        if health::verify(&base_url, self.health_timeout()).await {
            self.reporter
                .debug(&format!("connected to Dash API at {}", base_url))
                .await;
            ConnectionState::Ready(base_url)
        } else {
            self.reporter
                .error(&format!("Dash API at {} is not responding", base_url))
                .await;
            ConnectionState::Failed(format!(
                "The Dash API server at {} is not responding. Toggle it off and \
                 on in Dash Settings > Integration.",
                base_url
            ))
        }
    }

    /// Probe for the app, launching it once if absent.
    ///
    /// At most one launch request per call; after it, the probe is polled
    /// within the settle budget instead of retrying the launch.
    async fn ensure_running(&self) -> bool {
        let pattern = &self.config.app.process_pattern;
        match self.desktop.probe_process(pattern).await {
            OpOutcome::Done => return true,
            OpOutcome::Missing(detail) => self.reporter.debug(&detail).await,
            // Fail-safe: a broken probe reads as "not running".
            OpOutcome::Failed(detail) => {
                self.reporter
                    .debug(&format!("process probe failed ({}), assuming not running", detail))
                    .await
            }
        }

        self.reporter.info("Dash is not running, launching it").await;
        match self.desktop.launch_app(&self.config.app.bundle_id).await {
            OpOutcome::Done => {}
            outcome => {
                self.reporter
                    .error(&format!("failed to launch Dash: {}", outcome.detail()))
                    .await;
                return false;
            }
        }

        let desktop = &self.desktop;
        let appeared = poll_until(
            Duration::from_millis(self.config.bootstrap.launch_settle_ms),
            Duration::from_millis(self.config.bootstrap.poll_step_ms),
            move || async move { desktop.probe_process(pattern).await.is_done().then_some(()) },
        )
        .await
        .is_some();

        if appeared {
            self.reporter.info("Dash launched").await;
        } else {
            self.reporter
                .error("Dash did not appear in the process table after launch")
                .await;
        }
        appeared
    }

    /// Ask the operator to enable the API server, write the preference on
    /// approval, and wait for the port to become resolvable.
    ///
    /// Declines, timeouts, write failures, and an exhausted settle budget
    /// all end the same way: `None`, terminal for this bootstrap call.
    async fn try_enable(&self, status_path: &Path) -> Option<u16> {
        self.reporter
            .info("The Dash API server is not enabled; asking for permission to enable it")
            .await;

        let question = format!(
            "Dash's HTTP API server is currently disabled. Enable it automatically \
             (writes the {} preference for {})? Decline to enable it yourself in \
             Dash Settings > Integration.",
            self.config.app.enable_key, self.config.app.bundle_id
        );

        let wait = Duration::from_secs(self.config.bootstrap.approval_timeout_secs);
        let approved = match tokio::time::timeout(wait, self.approval.request(&question)).await {
            Ok(answer) => answer,
            Err(_) => {
                self.reporter
                    .warn("no answer to the enable-API prompt; treating it as declined")
                    .await;
                false
            }
        };
        if !approved {
            self.reporter.info("automatic enabling declined").await;
            return None;
        }

        match self
            .desktop
            .write_preference(&self.config.app.bundle_id, &self.config.app.enable_key)
            .await
        {
            OpOutcome::Done => {}
            outcome => {
                self.reporter
                    .error(&format!(
                        "could not write the enable preference: {}",
                        outcome.detail()
                    ))
                    .await;
                return None;
            }
        }

        let port = poll_until(
            Duration::from_millis(self.config.bootstrap.enable_settle_ms),
            Duration::from_millis(self.config.bootstrap.poll_step_ms),
            move || async move { status::resolve_port(status_path) },
        )
        .await;

        match port {
            Some(port) => {
                self.reporter.info("Dash API server enabled").await;
                Some(port)
            }
            None => {
                self.reporter
                    .error(
                        "enabling the Dash API server did not take effect; enable it \
                         manually in Dash Settings > Integration",
                    )
                    .await;
                None
            }
        }
    }

    fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.config.bootstrap.health_timeout_secs)
    }
}

/// Poll `check` until it yields a value or the budget runs out.
///
/// The first check runs immediately. Misses wait `step`, doubling each
/// time, with the final wait clipped so the total never exceeds `budget`.
/// A fast-starting app is caught at the first hit; a slow one gets the
/// whole budget.
pub(crate) async fn poll_until<T, F, Fut>(
    budget: Duration,
    step: Duration,
    mut check: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let mut waited = Duration::ZERO;
    let mut step = step.max(Duration::from_millis(1));
    loop {
        if let Some(value) = check().await {
            return Some(value);
        }
        if waited >= budget {
            return None;
        }
        let wait = step.min(budget - waited);
        tokio::time::sleep(wait).await;
        waited += wait;
        step = step.saturating_mul(2);
    }
}
