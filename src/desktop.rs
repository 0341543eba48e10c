//! Desktop-application primitives.
//!
//! The bootstrap sequence needs three things from the host OS: a process
//! probe, a background app launch, and a persisted preference write. They
//! are grouped behind the [`DesktopOps`] trait so the bootstrapper can be
//! driven by a scripted double in tests, and so a port to another platform
//! only has to supply one implementation.
//!
//! Every primitive resolves to an [`OpOutcome`] rather than a bare bool:
//! `Missing` is the expected negative (no matching process, app not
//! installed, tool not on this platform), `Failed` is the unexpected one
//! (spawn error, timeout, nonzero exit where none was expected). Callers
//! collapse both to the same control-flow branch but report them
//! differently.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

/// Outcome of a single desktop primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    /// The operation did what was asked.
    Done,
    /// Expected negative: the thing being probed or acted on is not there.
    Missing(String),
    /// Unexpected failure of the probing/launching mechanism itself.
    Failed(String),
}

impl OpOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, OpOutcome::Done)
    }

    /// Diagnostic detail for the negative outcomes, empty for `Done`.
    pub fn detail(&self) -> &str {
        match self {
            OpOutcome::Done => "",
            OpOutcome::Missing(detail) | OpOutcome::Failed(detail) => detail,
        }
    }
}

/// Host-OS operations on the backing desktop application.
#[async_trait]
pub trait DesktopOps: Send + Sync {
    /// Is a process matching `pattern` in the process table?
    async fn probe_process(&self, pattern: &str) -> OpOutcome;

    /// Launch the application by bundle identifier, in the background,
    /// without bringing it to the foreground. Must not wait for the app
    /// to finish starting.
    async fn launch_app(&self, bundle_id: &str) -> OpOutcome;

    /// Persist a boolean `true` under `key` in the application's
    /// preference domain.
    async fn write_preference(&self, domain: &str, key: &str) -> OpOutcome;
}

/// macOS implementation backed by `pgrep`, `open`, and `defaults`.
pub struct MacDesktop {
    op_timeout: Duration,
}

impl MacDesktop {
    pub fn new(op_timeout: Duration) -> Self {
        Self { op_timeout }
    }

    /// Run a command to completion under the per-op timeout.
    ///
    /// A spawn failure with `NotFound` means the tool itself is absent
    /// (non-macOS host) and maps to `Missing`; every other mechanical
    /// failure maps to `Failed`. Exit-status interpretation is left to
    /// the caller via `on_exit`.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        on_exit: impl FnOnce(std::process::Output) -> OpOutcome,
    ) -> OpOutcome {
        let output = tokio::time::timeout(
            self.op_timeout,
            Command::new(program).args(args).output(),
        )
        .await;

        match output {
            Ok(Ok(output)) => on_exit(output),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                OpOutcome::Missing(format!("{} is not available on this host: {}", program, e))
            }
            Ok(Err(e)) => OpOutcome::Failed(format!("failed to run {}: {}", program, e)),
            Err(_) => OpOutcome::Failed(format!(
                "{} did not finish within {:?}",
                program, self.op_timeout
            )),
        }
    }
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait]
impl DesktopOps for MacDesktop {
    async fn probe_process(&self, pattern: &str) -> OpOutcome {
        let not_running = format!("no process matching '{}'", pattern);
        self.run("pgrep", &["-f", pattern], move |output| {
            if output.status.success() {
                OpOutcome::Done
            } else {
                // pgrep exits 1 when nothing matches; that is the normal
                // "not running" answer, not a probe failure.
                OpOutcome::Missing(not_running)
            }
        })
        .await
    }

    async fn launch_app(&self, bundle_id: &str) -> OpOutcome {
        // -g: do not bring to foreground; -j: launch hidden.
        self.run("open", &["-g", "-j", "-b", bundle_id], |output| {
            if output.status.success() {
                OpOutcome::Done
            } else {
                OpOutcome::Missing(format!(
                    "open could not locate the application: {}",
                    stderr_of(&output)
                ))
            }
        })
        .await
    }

    async fn write_preference(&self, domain: &str, key: &str) -> OpOutcome {
        self.run("defaults", &["write", domain, key, "-bool", "true"], |output| {
            if output.status.success() {
                OpOutcome::Done
            } else {
                OpOutcome::Failed(format!("defaults write failed: {}", stderr_of(&output)))
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_tool_is_missing_not_error() {
        // Exercise the spawn-failure path directly with a program that
        // cannot exist; the probe contract is "never raise".
        let desktop = MacDesktop::new(Duration::from_secs(1));
        let outcome = desktop
            .run("definitely-not-a-real-binary-7f3a", &[], |_| OpOutcome::Done)
            .await;
        assert!(matches!(outcome, OpOutcome::Missing(_)));
    }

    #[test]
    fn test_outcome_detail() {
        assert_eq!(OpOutcome::Done.detail(), "");
        assert_eq!(OpOutcome::Missing("x".into()).detail(), "x");
        assert!(!OpOutcome::Failed("boom".into()).is_done());
    }
}
