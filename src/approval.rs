//! Operator approval seam for the capability-enable step.
//!
//! Enabling Dash's HTTP API writes a persisted preference on the user's
//! machine, so the bootstrapper asks first. The question travels through
//! this trait: over MCP it becomes an elicitation request, in the CLI a
//! terminal prompt. The bootstrapper bounds the wait with the configured
//! approval timeout and treats a timeout as a decline, so implementations
//! may block for as long as the operator takes.

use async_trait::async_trait;

/// A single yes/no question to the human operator.
#[async_trait]
pub trait Approval: Send + Sync {
    /// Returns true only on an explicit "yes". Any failure to reach the
    /// operator is a "no".
    async fn request(&self, message: &str) -> bool;
}

/// Declines every request. The default for non-interactive contexts.
pub struct AutoDecline;

#[async_trait]
impl Approval for AutoDecline {
    async fn request(&self, _message: &str) -> bool {
        false
    }
}

/// Terminal y/N prompt for CLI use.
///
/// Auto-declines when stdin is not a TTY so scripted invocations never
/// hang on a question nobody will see.
pub struct TerminalApproval;

#[async_trait]
impl Approval for TerminalApproval {
    async fn request(&self, message: &str) -> bool {
        if !atty::is(atty::Stream::Stdin) {
            tracing::debug!("stdin is not a TTY, declining: {}", message);
            return false;
        }

        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            use std::io::Write;
            eprint!("{} [y/N] ", message);
            let _ = std::io::stderr().flush();
            let mut line = String::new();
            match std::io::stdin().read_line(&mut line) {
                Ok(_) => line,
                Err(_) => String::new(),
            }
        })
        .await;

        match answer {
            Ok(line) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_decline() {
        assert!(!AutoDecline.request("enable?").await);
    }
}
