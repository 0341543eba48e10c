//! The documentation operations against the Dash HTTP API.
//!
//! Each operation follows the same pattern: validate caller input, run a
//! full bootstrap, issue exactly one HTTP request on a client built for
//! that call, and reshape the JSON response. Failure never propagates as
//! an error — every path yields a usable, typed result with the reason
//! carried in the result and narrated through the reporter.
//!
//! Responses are trimmed to a token budget before returning, so one call
//! against an installation with hundreds of docsets cannot flood the
//! calling agent's context.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::approval::Approval;
use crate::bootstrap::{BootstrapOutcome, Bootstrapper};
use crate::config::Config;
use crate::desktop::DesktopOps;
use crate::models::{DocsetInfo, DocsetList, SearchOutcome, SearchResult};
use crate::report::Reporter;

/// Token budget for a single response (1 token ≈ 4 characters).
const TOKEN_LIMIT: usize = 25_000;
/// Estimated overhead of the response envelope itself.
const ENVELOPE_TOKENS: usize = 100;

/// Parameters for [`DashClient::search`].
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    /// Restrict the search to these docsets; `None` searches everything
    /// `search_snippets` permits.
    pub docset_identifiers: Option<Vec<String>>,
    pub search_snippets: bool,
    pub max_results: u32,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            docset_identifiers: None,
            search_snippets: true,
            max_results: 100,
        }
    }
}

/// One client per logical call: constructed, used for a single operation's
/// bootstrap plus request, and dropped.
pub struct DashClient {
    config: Arc<Config>,
    bootstrapper: Bootstrapper,
    reporter: Arc<dyn Reporter>,
}

impl DashClient {
    pub fn new(
        config: Arc<Config>,
        desktop: Arc<dyn DesktopOps>,
        reporter: Arc<dyn Reporter>,
        approval: Arc<dyn Approval>,
    ) -> Self {
        let bootstrapper =
            Bootstrapper::new(config.clone(), desktop, reporter.clone(), approval);
        Self {
            config,
            bootstrapper,
            reporter,
        }
    }

    /// List the docsets installed in Dash.
    ///
    /// A 404 from the listing endpoint means "no docsets", which is a
    /// normal empty answer with installation guidance, not a fault.
    pub async fn list_docsets(&self) -> DocsetList {
        let base_url = match self.bootstrapper.bootstrap().await {
            BootstrapOutcome::Ready(url) => url,
            BootstrapOutcome::NotReady(reason) => {
                self.reporter.error(&reason).await;
                return DocsetList::failed(reason);
            }
        };

        let client = match self.http() {
            Ok(client) => client,
            Err(reason) => {
                self.reporter.error(&reason).await;
                return DocsetList::failed(reason);
            }
        };

        self.reporter.debug("fetching installed docsets").await;
        let response = match client
            .get(format!("{}/docsets/list", base_url))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let reason = format!("Failed to get installed docsets: {}", e);
                self.reporter.error(&reason).await;
                return DocsetList::failed(reason);
            }
        };

        let status = response.status();
        if status.as_u16() == 404 {
            self.reporter
                .warn("no docsets found; install some in Dash Settings > Downloads")
                .await;
            return DocsetList::failed(
                "No docsets installed. Install some in Dash Settings > Downloads.",
            );
        }
        if !status.is_success() {
            let reason = format!("Dash API error {} while listing docsets", status);
            self.reporter.error(&reason).await;
            return DocsetList::failed(reason);
        }

        #[derive(Deserialize)]
        struct Wire {
            #[serde(default)]
            docsets: Vec<DocsetInfo>,
        }

        let wire: Wire = match response.json().await {
            Ok(wire) => wire,
            Err(e) => {
                let reason = format!("Unreadable docset listing from Dash: {}", e);
                self.reporter.error(&reason).await;
                return DocsetList::failed(reason);
            }
        };

        self.reporter
            .info(&format!("found {} installed docsets", wire.docsets.len()))
            .await;
        let docsets = self.truncate_to_budget(wire.docsets, "docsets").await;
        DocsetList {
            docsets,
            error: None,
        }
    }

    /// Search documentation across docsets and snippets.
    pub async fn search(&self, params: &SearchParams) -> SearchOutcome {
        // Caller input faults are rejected before any process or network
        // activity.
        if params.query.trim().is_empty() {
            self.reporter.error("query must not be empty").await;
            return SearchOutcome::failed("query must not be empty");
        }
        if !(1..=1000).contains(&params.max_results) {
            self.reporter
                .error("max_results must be between 1 and 1000")
                .await;
            return SearchOutcome::failed("max_results must be between 1 and 1000");
        }

        let base_url = match self.bootstrapper.bootstrap().await {
            BootstrapOutcome::Ready(url) => url,
            BootstrapOutcome::NotReady(reason) => {
                self.reporter.error(&reason).await;
                return SearchOutcome::failed(reason);
            }
        };

        let client = match self.http() {
            Ok(client) => client,
            Err(reason) => {
                self.reporter.error(&reason).await;
                return SearchOutcome::failed(reason);
            }
        };

        let mut query: Vec<(&str, String)> = vec![
            ("query", params.query.clone()),
            ("search_snippets", params.search_snippets.to_string()),
            ("max_results", params.max_results.to_string()),
        ];
        if let Some(identifiers) = &params.docset_identifiers {
            if !identifiers.is_empty() {
                query.push(("docset_identifiers", identifiers.join(",")));
            }
        }

        self.reporter
            .debug(&format!("searching Dash for '{}'", params.query))
            .await;
        let response = match client
            .get(format!("{}/search", base_url))
            .query(&query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let reason = format!("Search failed: {}", e);
                self.reporter.error(&reason).await;
                return SearchOutcome::failed(reason);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = search_failure_reason(status, &body);
            self.reporter.error(&reason).await;
            return SearchOutcome::failed(reason);
        }

        #[derive(Deserialize)]
        struct Wire {
            #[serde(default)]
            results: Vec<SearchResult>,
            message: Option<String>,
        }

        let wire: Wire = match response.json().await {
            Ok(wire) => wire,
            Err(e) => {
                let reason = format!("Unreadable search response from Dash: {}", e);
                self.reporter.error(&reason).await;
                return SearchOutcome::failed(reason);
            }
        };

        if let Some(message) = &wire.message {
            // Advisory from Dash (e.g. a muted docset); surfaced, not fatal.
            self.reporter.warn(message).await;
        }
        self.reporter
            .info(&format!("found {} results", wire.results.len()))
            .await;
        let results = self.truncate_to_budget(wire.results, "results").await;
        SearchOutcome {
            results,
            error: wire.message,
        }
    }

    /// Enable full-text indexing for one docset. True only when Dash
    /// accepted the request.
    pub async fn enable_fts(&self, identifier: &str) -> bool {
        if identifier.trim().is_empty() {
            self.reporter
                .error("docset identifier must not be empty")
                .await;
            return false;
        }

        let base_url = match self.bootstrapper.bootstrap().await {
            BootstrapOutcome::Ready(url) => url,
            BootstrapOutcome::NotReady(reason) => {
                self.reporter.error(&reason).await;
                return false;
            }
        };

        let client = match self.http() {
            Ok(client) => client,
            Err(reason) => {
                self.reporter.error(&reason).await;
                return false;
            }
        };

        self.reporter
            .debug(&format!("enabling full-text indexing for {}", identifier))
            .await;
        let response = match client
            .get(format!("{}/docsets/enable_fts", base_url))
            .query(&[("identifier", identifier)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.reporter
                    .error(&format!("failed to enable full-text indexing: {}", e))
                    .await;
                return false;
            }
        };

        match response.status().as_u16() {
            200..=299 => {
                self.reporter
                    .info(&format!("full-text indexing enabled for {}", identifier))
                    .await;
                true
            }
            400 => {
                let body = response.text().await.unwrap_or_default();
                self.reporter
                    .error(&format!("bad enable-indexing request: {}", body))
                    .await;
                false
            }
            404 => {
                self.reporter
                    .error(&format!("docset not found: {}", identifier))
                    .await;
                false
            }
            status => {
                self.reporter
                    .error(&format!("Dash API error {} while enabling indexing", status))
                    .await;
                false
            }
        }
    }

    fn http(&self) -> Result<reqwest::Client, String> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(
                self.config.bootstrap.request_timeout_secs,
            ))
            .build()
            .map_err(|e| format!("could not build HTTP client: {}", e))
    }

    /// Trim a record list to the response token budget, warning about
    /// what was dropped.
    async fn truncate_to_budget<T: Serialize>(&self, items: Vec<T>, what: &str) -> Vec<T> {
        let total = items.len();
        let mut used = ENVELOPE_TOKENS;
        let mut kept = Vec::with_capacity(total);
        for item in items {
            let cost = estimate_tokens(
                &serde_json::to_value(&item).unwrap_or(serde_json::Value::Null),
            );
            if used + cost > TOKEN_LIMIT {
                self.reporter
                    .warn(&format!(
                        "token limit reached; returning {} of {} {}",
                        kept.len(),
                        total,
                        what
                    ))
                    .await;
                break;
            }
            used += cost;
            kept.push(item);
        }
        kept
    }
}

/// Map a non-2xx search response to an actionable reason.
///
/// Dash reports several distinct conditions through 400/403 with an
/// explanatory body; the body text is the only way to tell them apart.
fn search_failure_reason(status: reqwest::StatusCode, body: &str) -> String {
    match status.as_u16() {
        400 if body.contains("Docset with identifier") && body.contains("not found") => {
            "Invalid docset identifier. Run list_installed_docsets and use an exact \
             identifier from that list."
                .to_string()
        }
        400 if body.contains("No docsets found") => {
            "No valid docsets to search. Provide identifiers from \
             list_installed_docsets, or set search_snippets to true to search \
             snippets only."
                .to_string()
        }
        400 => format!("Bad search request: {}", body),
        403 if body.contains("API access blocked due to Dash trial expiration") => {
            "Your Dash trial has expired and API access is blocked. Purchase Dash \
             at https://kapeli.com/dash to keep using the API."
                .to_string()
        }
        403 => format!("Dash refused the search request: {}", body),
        _ => format!("Dash API error {} during search", status),
    }
}

/// Rough token estimate for a serialized value: 1 token ≈ 4 characters.
pub(crate) fn estimate_tokens(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::String(s) => (s.len() / 4).max(1),
        serde_json::Value::Array(items) => items.iter().map(estimate_tokens).sum(),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| (key.len() / 4).max(1) + estimate_tokens(value))
            .sum(),
        serde_json::Value::Null => 0,
        other => (other.to_string().len() / 4).max(1),
    }
}
