use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Identity of the backing desktop application.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_bundle_id")]
    pub bundle_id: String,
    #[serde(default = "default_process_pattern")]
    pub process_pattern: String,
    #[serde(default = "default_enable_key")]
    pub enable_key: String,
    /// Overrides the status-file location. Defaults to the per-user path
    /// Dash writes (`~/Library/Application Support/Dash/.dash_api_server/status.json`).
    #[serde(default)]
    pub status_file: Option<PathBuf>,
}

fn default_bundle_id() -> String {
    "com.kapeli.dashdoc".to_string()
}
fn default_process_pattern() -> String {
    "Dash".to_string()
}
fn default_enable_key() -> String {
    "DHAPIServerEnabled".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bundle_id: default_bundle_id(),
            process_pattern: default_process_pattern(),
            enable_key: default_enable_key(),
            status_file: None,
        }
    }
}

impl AppConfig {
    /// Resolved status-file path, or `None` when the home directory is
    /// undeterminable and no override is configured.
    pub fn status_file_path(&self) -> Option<PathBuf> {
        self.status_file.clone().or_else(|| {
            dirs::home_dir().map(|home| {
                home.join("Library")
                    .join("Application Support")
                    .join("Dash")
                    .join(".dash_api_server")
                    .join("status.json")
            })
        })
    }
}

/// Timing knobs for the bootstrap sequence.
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapConfig {
    /// Total budget for the app to appear in the process table after launch.
    #[serde(default = "default_launch_settle_ms")]
    pub launch_settle_ms: u64,
    /// Total budget for the status file to appear after the preference write.
    #[serde(default = "default_enable_settle_ms")]
    pub enable_settle_ms: u64,
    /// Initial poll step within the settle budgets; doubles on each miss.
    #[serde(default = "default_poll_step_ms")]
    pub poll_step_ms: u64,
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long to wait for the operator to answer the enable-API prompt
    /// before treating it as declined.
    #[serde(default = "default_approval_timeout_secs")]
    pub approval_timeout_secs: u64,
    /// Timeout for each desktop primitive (pgrep, open, defaults).
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,
}

fn default_launch_settle_ms() -> u64 {
    4000
}
fn default_enable_settle_ms() -> u64 {
    4000
}
fn default_poll_step_ms() -> u64 {
    500
}
fn default_health_timeout_secs() -> u64 {
    5
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_approval_timeout_secs() -> u64 {
    120
}
fn default_op_timeout_secs() -> u64 {
    10
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            launch_settle_ms: default_launch_settle_ms(),
            enable_settle_ms: default_enable_settle_ms(),
            poll_step_ms: default_poll_step_ms(),
            health_timeout_secs: default_health_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            approval_timeout_secs: default_approval_timeout_secs(),
            op_timeout_secs: default_op_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ApiConfig {
    /// Fixed base URL that bypasses detection entirely. The `DASH_API_URL`
    /// environment variable takes precedence over this field.
    #[serde(default)]
    pub custom_url: Option<String>,
}

impl ApiConfig {
    /// The effective custom base URL, if any (env var first, then config).
    pub fn custom_url(&self) -> Option<String> {
        std::env::var("DASH_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.custom_url.clone())
    }
}

/// Load configuration from a TOML file.
///
/// A missing file is not an error: every setting has a default, so the
/// bridge works without any configuration at all.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.app.bundle_id, "com.kapeli.dashdoc");
        assert_eq!(config.app.process_pattern, "Dash");
        assert_eq!(config.app.enable_key, "DHAPIServerEnabled");
        assert_eq!(config.bootstrap.launch_settle_ms, 4000);
        assert_eq!(config.bootstrap.approval_timeout_secs, 120);
        assert!(config.api.custom_url.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [bootstrap]
            launch_settle_ms = 250

            [app]
            process_pattern = "Zeal"
            "#,
        )
        .unwrap();
        assert_eq!(config.bootstrap.launch_settle_ms, 250);
        assert_eq!(config.bootstrap.poll_step_ms, 500);
        assert_eq!(config.app.process_pattern, "Zeal");
        assert_eq!(config.app.bundle_id, "com.kapeli.dashdoc");
    }

    #[test]
    fn test_status_file_override() {
        let config: Config = toml::from_str(
            r#"
            [app]
            status_file = "/tmp/status.json"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.app.status_file_path(),
            Some(PathBuf::from("/tmp/status.json"))
        );
    }

    #[test]
    fn test_missing_config_file_is_defaults() {
        let config = load_config(Path::new("/nonexistent/dashb.toml")).unwrap();
        assert_eq!(config.app.bundle_id, "com.kapeli.dashdoc");
    }
}
