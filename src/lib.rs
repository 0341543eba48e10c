//! # Dash Bridge
//!
//! A bootstrapped bridge to the Dash documentation app's local HTTP API.
//!
//! Dash chooses its API port dynamically, publishes it to a per-user
//! status file, and may have the API disabled entirely. Dash Bridge owns
//! the protocol for getting from that unknown state to a verified base
//! URL — probing and launching the app, resolving the port, asking the
//! operator before enabling the API, and health-checking the result —
//! then exposes docset listing, documentation search, and per-docset
//! full-text-indexing over MCP and a CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────────────┐   ┌──────────┐
//! │ MCP / CLI   │──▶│   ConnectionBootstrapper     │──▶│ Dash app │
//! │ tool call   │   │ probe→launch→port→enable→    │   │ HTTP API │
//! └─────────────┘   │ health                       │   └────┬─────┘
//!                   └──────────┬───────────────────┘        │
//!                              │ Ready(base_url)            │
//!                              ▼                            │
//!                   ┌──────────────────────┐                │
//!                   │   DashClient         │◀───────────────┘
//!                   │ list/search/enable   │   one request per call
//!                   └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dashb status                  # diagnose the connection
//! dashb docsets                 # list installed docsets
//! dashb search "tokio spawn"    # search documentation
//! dashb serve                   # start the MCP server on stdio
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with full defaults |
//! | [`desktop`] | Process probe / launch / preference-write primitives |
//! | [`status`] | Port resolution from Dash's status file |
//! | [`health`] | Base-URL health probe |
//! | [`approval`] | Operator approval seam (terminal, auto-decline) |
//! | [`report`] | Leveled diagnostics seam |
//! | [`bootstrap`] | The connection state machine |
//! | [`dash`] | The three documentation operations |
//! | [`models`] | Docset and search-result types |
//! | [`traits`] | Tool trait and registry |
//! | [`mcp`] | MCP stdio server |

pub mod approval;
pub mod bootstrap;
pub mod config;
pub mod dash;
pub mod desktop;
pub mod health;
pub mod mcp;
pub mod models;
pub mod report;
pub mod status;
pub mod traits;
