//! # Dash Bridge CLI (`dashb`)
//!
//! The `dashb` binary serves the MCP bridge and offers the same
//! documentation operations as CLI subcommands for direct use and
//! debugging.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dashb serve` | Start the MCP server on stdio |
//! | `dashb status` | Run one bootstrap attempt and report the connection state |
//! | `dashb docsets` | List installed docsets |
//! | `dashb search "<query>"` | Search documentation |
//! | `dashb enable-fts <identifier>` | Enable full-text indexing for a docset |
//!
//! ## Examples
//!
//! ```bash
//! # Diagnose why the API is unreachable
//! dashb status
//!
//! # Search only the Rust docset
//! dashb search "spawn_blocking" --docsets rust-lang
//!
//! # MCP client configuration: { "command": "dashb", "args": ["serve"] }
//! dashb serve
//! ```
//!
//! Diagnostics go to stderr (tracing, controlled by `RUST_LOG`); stdout
//! carries command output, or the MCP protocol under `serve`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dash_bridge::approval::{Approval, TerminalApproval};
use dash_bridge::bootstrap::Bootstrapper;
use dash_bridge::config::load_config;
use dash_bridge::dash::{DashClient, SearchParams};
use dash_bridge::desktop::{DesktopOps, MacDesktop};
use dash_bridge::mcp;
use dash_bridge::report::{LogReporter, Reporter};

/// Dash Bridge — documentation lookup backed by the Dash desktop app.
#[derive(Parser)]
#[command(
    name = "dashb",
    about = "Documentation lookup backed by the Dash desktop app",
    version,
    long_about = "Dash Bridge connects to the Dash documentation app's local HTTP API, \
    launching the app and enabling the API (with your approval) when needed, and exposes \
    docset listing, search, and full-text-indexing control over MCP and this CLI."
)]
struct Cli {
    /// Path to configuration file (TOML). Every setting has a default,
    /// so the file is optional.
    #[arg(long, global = true, default_value = "./dashb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio.
    ///
    /// The operator approval for enabling the Dash API travels to the
    /// connected client as an elicitation request.
    Serve,

    /// Run one bootstrap attempt and report the connection state.
    Status,

    /// List installed docsets.
    Docsets,

    /// Search documentation.
    Search {
        /// The search query.
        query: String,

        /// Comma-separated docset identifiers to restrict the search to.
        #[arg(long)]
        docsets: Option<String>,

        /// Exclude saved snippets from the search.
        #[arg(long)]
        no_snippets: bool,

        /// Maximum number of results (1–1000).
        #[arg(long, default_value_t = 100)]
        max_results: u32,
    },

    /// Enable full-text indexing for a docset.
    EnableFts {
        /// Docset identifier (from `dashb docsets`).
        identifier: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dash_bridge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Arc::new(load_config(&cli.config)?);
    let desktop: Arc<dyn DesktopOps> = Arc::new(MacDesktop::new(Duration::from_secs(
        config.bootstrap.op_timeout_secs,
    )));

    match cli.command {
        Commands::Serve => {
            mcp::serve_stdio(config, desktop).await?;
        }
        Commands::Status => {
            let reporter: Arc<dyn Reporter> = Arc::new(LogReporter);
            let approval: Arc<dyn Approval> = Arc::new(TerminalApproval);
            let bootstrapper = Bootstrapper::new(config, desktop, reporter, approval);
            let state = bootstrapper.attempt().await;
            println!("{}", state);
        }
        Commands::Docsets => {
            let listing = cli_client(config, desktop).list_docsets().await;
            if let Some(error) = &listing.error {
                eprintln!("{}", error);
            }
            if !listing.docsets.is_empty() {
                println!("{:<28} {:<32} {:<12} FTS", "NAME", "IDENTIFIER", "PLATFORM");
                for docset in &listing.docsets {
                    println!(
                        "{:<28} {:<32} {:<12} {}",
                        docset.name, docset.identifier, docset.platform, docset.full_text_search
                    );
                    if let Some(notice) = &docset.notice {
                        println!("  note: {}", notice);
                    }
                }
            }
        }
        Commands::Search {
            query,
            docsets,
            no_snippets,
            max_results,
        } => {
            let mut params = SearchParams::new(query);
            params.docset_identifiers = docsets.map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            });
            params.search_snippets = !no_snippets;
            params.max_results = max_results;

            let outcome = cli_client(config, desktop).search(&params).await;
            if let Some(error) = &outcome.error {
                eprintln!("{}", error);
            }
            for result in &outcome.results {
                let docset = result.docset.as_deref().unwrap_or("-");
                println!(
                    "{:<10} {:<24} {:<40} {}",
                    result.kind.to_string(),
                    docset,
                    result.name,
                    result.load_url
                );
            }
        }
        Commands::EnableFts { identifier } => {
            let enabled = cli_client(config, desktop).enable_fts(&identifier).await;
            if enabled {
                println!("full-text indexing enabled for {}", identifier);
            } else {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn cli_client(
    config: Arc<dash_bridge::config::Config>,
    desktop: Arc<dyn DesktopOps>,
) -> DashClient {
    DashClient::new(
        config,
        desktop,
        Arc::new(LogReporter),
        Arc::new(TerminalApproval),
    )
}
