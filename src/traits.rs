//! The tool seam: trait, registry, and execution context.
//!
//! The three documentation operations are exposed to callers as tools
//! with JSON Schema parameters. The MCP bridge discovers them from the
//! [`ToolRegistry`] and dispatches through [`Tool::execute`]; the CLI
//! calls the underlying [`DashClient`](crate::dash::DashClient) methods
//! directly.
//!
//! # Usage
//!
//! ```rust
//! use dash_bridge::traits::ToolRegistry;
//!
//! let tools = ToolRegistry::with_builtins();
//! assert!(tools.find("search_documentation").is_some());
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::approval::Approval;
use crate::config::Config;
use crate::dash::{DashClient, SearchParams};
use crate::desktop::DesktopOps;
use crate::report::Reporter;

/// A callable tool exposed to agents.
///
/// # Lifecycle
///
/// 1. The tool is registered via [`ToolRegistry::register`].
/// 2. [`name`](Tool::name), [`description`](Tool::description), and
///    [`parameters_schema`](Tool::parameters_schema) feed tool discovery.
/// 3. [`execute`](Tool::execute) runs once per invocation against a
///    fresh [`ToolContext`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores (e.g. `"search_documentation"`).
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// JSON Schema for the parameters: an object schema with `properties`
    /// and optionally `required`.
    fn parameters_schema(&self) -> Value;

    /// Execute with the caller's parameters (always a JSON object).
    ///
    /// Expected unavailability and input faults are part of the returned
    /// value (an `error` field, an empty list, `enabled: false`); `Err`
    /// is reserved for internal faults.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Per-invocation execution context.
///
/// Bundles the configuration with the desktop, reporter, and approval
/// seams the invocation should use — over MCP those talk to the connected
/// client, in the CLI to the terminal.
pub struct ToolContext {
    config: Arc<Config>,
    desktop: Arc<dyn DesktopOps>,
    reporter: Arc<dyn Reporter>,
    approval: Arc<dyn Approval>,
}

impl ToolContext {
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

    /// A documentation client scoped to this invocation.
    pub fn client(&self) -> DashClient {
        DashClient::new(
            self.config.clone(),
            self.desktop.clone(),
            self.reporter.clone(),
            self.approval.clone(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in tools
// ═══════════════════════════════════════════════════════════════════════

/// Lists the docsets installed in Dash.
pub struct ListDocsetsTool;

#[async_trait]
impl Tool for ListDocsetsTool {
    fn name(&self) -> &str {
        "list_installed_docsets"
    }

    fn description(&self) -> &str {
        "List all documentation sets installed in Dash, with their identifiers \
         and full-text-search state"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let listing = ctx.client().list_docsets().await;
        Ok(serde_json::to_value(&listing)?)
    }
}

/// Searches documentation across docsets and snippets.
pub struct SearchDocumentationTool;

#[async_trait]
impl Tool for SearchDocumentationTool {
    fn name(&self) -> &str {
        "search_documentation"
    }

    fn description(&self) -> &str {
        "Search Dash documentation; optionally restricted to specific docsets \
         (identifiers from list_installed_docsets)"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "docset_identifiers": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Docset identifiers to restrict the search to"
                },
                "search_snippets": {
                    "type": "boolean",
                    "default": true,
                    "description": "Also search saved snippets"
                },
                "max_results": {
                    "type": "integer",
                    "default": 100,
                    "minimum": 1,
                    "maximum": 1000
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let mut search = SearchParams::new(params["query"].as_str().unwrap_or(""));
        search.docset_identifiers = params
            .get("docset_identifiers")
            .and_then(Value::as_array)
            .map(|identifiers| {
                identifiers
                    .iter()
                    .filter_map(|id| id.as_str().map(String::from))
                    .collect()
            });
        search.search_snippets = params["search_snippets"].as_bool().unwrap_or(true);
        // A present-but-unusable max_results becomes 0 so the range check
        // rejects it instead of silently searching with the default.
        search.max_results = match params.get("max_results") {
            None => 100,
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
        };

        let outcome = ctx.client().search(&search).await;
        Ok(serde_json::to_value(&outcome)?)
    }
}

/// Enables full-text indexing for one docset.
pub struct EnableFtsTool;

#[async_trait]
impl Tool for EnableFtsTool {
    fn name(&self) -> &str {
        "enable_docset_fts"
    }

    fn description(&self) -> &str {
        "Enable full-text-search indexing for a docset (identifier from \
         list_installed_docsets)"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "identifier": { "type": "string", "description": "Docset identifier" }
            },
            "required": ["identifier"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let identifier = params["identifier"].as_str().unwrap_or("");
        let enabled = ctx.client().enable_fts(identifier).await;
        Ok(serde_json::json!({ "enabled": enabled }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of callable tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry pre-loaded with the three documentation tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ListDocsetsTool));
        registry.register(Box::new(SearchDocumentationTool));
        registry.register(Box::new(EnableFtsTool));
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Get all registered tools.
    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 3);
        for name in [
            "list_installed_docsets",
            "search_documentation",
            "enable_docset_fts",
        ] {
            assert!(registry.find(name).is_some(), "missing tool {}", name);
        }
        assert!(registry.find("nope").is_none());
    }

    #[test]
    fn test_schemas_are_object_schemas() {
        for tool in ToolRegistry::with_builtins().tools() {
            let schema = tool.parameters_schema();
            assert_eq!(schema["type"], "object", "tool {}", tool.name());
            assert!(schema["properties"].is_object(), "tool {}", tool.name());
        }
    }

    #[test]
    fn test_search_schema_requires_query() {
        let registry = ToolRegistry::with_builtins();
        let schema = registry.find("search_documentation").unwrap().parameters_schema();
        assert_eq!(schema["required"][0], "query");
    }
}
