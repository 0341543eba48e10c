//! Health probe for a candidate base URL.

use std::time::Duration;

/// One bounded `GET {base_url}/health`.
///
/// True only on a 2xx response. Transport errors, timeouts, and non-2xx
/// statuses are all false; retrying is the orchestrator's decision, not
/// this probe's. The client is built fresh per call and dropped on return,
/// so no connection outlives the probe.
pub async fn verify(base_url: &str, timeout: Duration) -> bool {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::debug!("could not build health-check client: {}", e);
            return false;
        }
    };

    match client.get(format!("{}/health", base_url)).send().await {
        Ok(response) => {
            let healthy = response.status().is_success();
            if !healthy {
                tracing::debug!(
                    "health check for {} returned {}",
                    base_url,
                    response.status()
                );
            }
            healthy
        }
        Err(e) => {
            tracing::debug!("health check for {} failed: {}", base_url, e);
            false
        }
    }
}
