//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] to a standard MCP server over stdio, for
//! Claude, Cursor, and other MCP clients.
//!
//! * **Tools** are exposed via `list_tools` / `call_tool`.
//! * **Diagnostics** reach the client as `notifications/message` log
//!   notifications, leveled debug through error.
//! * **The enable-API approval** is an elicitation request: the client
//!   shows the operator the question and returns accept/decline.
//!
//! # Client configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "dash": { "command": "dashb", "args": ["serve"] }
//!   }
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::*;
use rmcp::service::{Peer, RequestContext};
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};

use crate::approval::Approval;
use crate::config::Config;
use crate::desktop::DesktopOps;
use crate::report::Reporter;
use crate::traits::{ToolContext, ToolRegistry};

/// Bridges the tool registry to the MCP JSON-RPC protocol.
///
/// Each MCP session receives a clone of this struct (everything is
/// behind `Arc`), so all sessions share the same tool set.
#[derive(Clone)]
pub struct DashBridge {
    config: Arc<Config>,
    desktop: Arc<dyn DesktopOps>,
    tools: Arc<ToolRegistry>,
}

impl DashBridge {
    pub fn new(
        config: Arc<Config>,
        desktop: Arc<dyn DesktopOps>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            config,
            desktop,
            tools,
        }
    }

    /// Convert a registry tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::traits::Tool) -> Tool {
        let schema_value = tool.parameters_schema();
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> = match schema_value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(tool.name() != "enable_docset_fts")),
            execution: None,
            icons: None,
            meta: None,
        }
    }
}

impl ServerHandler for DashBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),
            server_info: Implementation {
                name: "dash-bridge".to_string(),
                title: Some("Dash Bridge".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Dash Bridge — documentation lookup backed by the Dash desktop app. \
                 Use list_installed_docsets to discover docsets and their \
                 identifiers, search_documentation to search across them, and \
                 enable_docset_fts to turn on full-text indexing for one. If the \
                 Dash API server is disabled you may be asked to approve enabling \
                 it automatically."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|tool| Self::to_mcp_tool(tool.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        // The reporter and approval for this invocation talk to the
        // session that issued it.
        let reporter: Arc<dyn Reporter> = Arc::new(McpReporter {
            peer: context.peer.clone(),
        });
        let approval: Arc<dyn Approval> = Arc::new(McpApproval {
            peer: context.peer.clone(),
        });
        let ctx = ToolContext::new(
            self.config.clone(),
            self.desktop.clone(),
            reporter,
            approval,
        );

        match tool.execute(params, &ctx).await {
            Ok(result) => {
                let text = serde_json::to_string_pretty(&result).unwrap_or_default();
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }
}

/// Forwards diagnostics to the connected client as log notifications.
struct McpReporter {
    peer: Peer<RoleServer>,
}

impl McpReporter {
    async fn notify(&self, level: LoggingLevel, message: &str) {
        let param = LoggingMessageNotificationParam {
            level,
            logger: Some("dash-bridge".to_string()),
            data: serde_json::Value::String(message.to_string()),
        };
        // A reporter never fails the operation it narrates.
        if let Err(e) = self.peer.notify_logging_message(param).await {
            tracing::debug!("log notification not delivered: {}", e);
        }
    }
}

#[async_trait]
impl Reporter for McpReporter {
    async fn debug(&self, message: &str) {
        self.notify(LoggingLevel::Debug, message).await;
    }

    async fn info(&self, message: &str) {
        self.notify(LoggingLevel::Info, message).await;
    }

    async fn warn(&self, message: &str) {
        self.notify(LoggingLevel::Warning, message).await;
    }

    async fn error(&self, message: &str) {
        self.notify(LoggingLevel::Error, message).await;
    }
}

/// Asks the operator through an MCP elicitation request.
///
/// Clients that do not support elicitation return an error, which reads
/// as a decline; the bootstrapper then reports the manual-enable path.
struct McpApproval {
    peer: Peer<RoleServer>,
}

#[async_trait]
impl Approval for McpApproval {
    async fn request(&self, message: &str) -> bool {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "enable": {
                    "type": "boolean",
                    "title": "Enable the Dash API server",
                    "description": "Write the preference and re-check the port"
                }
            },
            "required": ["enable"]
        });
        let requested_schema: ElicitationSchema = match serde_json::from_value(schema) {
            Ok(schema) => schema,
            Err(_) => return false,
        };

        let result = self
            .peer
            .create_elicitation(CreateElicitationRequestParams::FormElicitationParams {
                meta: None,
                message: message.to_string(),
                requested_schema,
            })
            .await;

        match result {
            Ok(answer) => match answer.action {
                ElicitationAction::Accept => answer
                    .content
                    .as_ref()
                    .and_then(|content| content.get("enable"))
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(true),
                _ => false,
            },
            Err(e) => {
                tracing::debug!("elicitation failed, treating as declined: {}", e);
                false
            }
        }
    }
}

/// Serve the bridge over stdio until the client disconnects.
pub async fn serve_stdio(
    config: Arc<Config>,
    desktop: Arc<dyn DesktopOps>,
) -> anyhow::Result<()> {
    let bridge = DashBridge::new(config, desktop, Arc::new(ToolRegistry::with_builtins()));
    let service = bridge
        .serve((tokio::io::stdin(), tokio::io::stdout()))
        .await?;
    service.waiting().await?;
    Ok(())
}
