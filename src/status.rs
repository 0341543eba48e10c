//! Port resolution from the application's status artifact.
//!
//! Dash publishes its dynamically chosen HTTP port to a small JSON file
//! under the per-user application-support directory. The file is owned and
//! written by Dash; this module only reads it. Absence or malformed
//! content is the normal signature of "API server not enabled" and yields
//! `None` — the distinct causes are only visible at debug log level.

use std::path::Path;

/// Read the status artifact and extract a usable port.
///
/// Returns `None` when the file is missing, is not valid JSON, lacks a
/// `port` field, or carries a port outside 1–65535. None of these raise.
pub fn resolve_port(path: &Path) -> Option<u16> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("status file {} unreadable: {}", path.display(), e);
            return None;
        }
    };

    let status: serde_json::Value = match serde_json::from_str(&content) {
        Ok(status) => status,
        Err(e) => {
            tracing::debug!("status file {} is not valid JSON: {}", path.display(), e);
            return None;
        }
    };

    let port = match status.get("port").and_then(serde_json::Value::as_u64) {
        Some(port) => port,
        None => {
            tracing::debug!("status file {} has no usable port field", path.display());
            return None;
        }
    };

    match u16::try_from(port) {
        Ok(port) if port > 0 => Some(port),
        _ => {
            tracing::debug!("status file {} port {} out of range", path.display(), port);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn status_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_port() {
        let file = status_file(r#"{"port": 4242}"#);
        assert_eq!(resolve_port(file.path()), Some(4242));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let file = status_file(r#"{"pid": 123, "port": 60000, "token": "abc"}"#);
        assert_eq!(resolve_port(file.path()), Some(60000));
    }

    #[test]
    fn test_missing_file() {
        assert_eq!(resolve_port(Path::new("/nonexistent/status.json")), None);
    }

    #[test]
    fn test_malformed_json() {
        let file = status_file("{port: oops");
        assert_eq!(resolve_port(file.path()), None);
    }

    #[test]
    fn test_port_field_absent() {
        let file = status_file(r#"{"pid": 99}"#);
        assert_eq!(resolve_port(file.path()), None);
    }

    #[test]
    fn test_port_not_an_integer() {
        let file = status_file(r#"{"port": "4242"}"#);
        assert_eq!(resolve_port(file.path()), None);
    }

    #[test]
    fn test_port_out_of_range() {
        let file = status_file(r#"{"port": 0}"#);
        assert_eq!(resolve_port(file.path()), None);
        let file = status_file(r#"{"port": 70000}"#);
        assert_eq!(resolve_port(file.path()), None);
    }
}
