//! Leveled diagnostics emitted alongside results.
//!
//! Every operation narrates what it is doing (and why it failed) through a
//! [`Reporter`] rather than stuffing diagnostics into return values. When
//! serving MCP the reporter forwards to the client as log notifications;
//! in the CLI and in library use it forwards to `tracing`.

use async_trait::async_trait;

/// Sink for operation diagnostics.
///
/// Implementations must never fail the surrounding operation: a reporter
/// that cannot deliver a message drops it.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn debug(&self, message: &str);
    async fn info(&self, message: &str);
    async fn warn(&self, message: &str);
    async fn error(&self, message: &str);
}

/// Reporter backed by the process-wide `tracing` subscriber.
pub struct LogReporter;

#[async_trait]
impl Reporter for LogReporter {
    async fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    async fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    async fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    async fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
