//! Result types for the documentation operations.
//!
//! These mirror the records returned by the Dash HTTP API. The two
//! string-typed wire enums (`full_text_search`, result `type`) are closed
//! variants with an `Other` fallback: the backing application evolves
//! independently, and an unrecognized value must survive a round trip
//! rather than break deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-docset full-text-search state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FtsState {
    NotSupported,
    Disabled,
    Indexing,
    Enabled,
    Other(String),
}

impl From<String> for FtsState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "not supported" => FtsState::NotSupported,
            "disabled" => FtsState::Disabled,
            "indexing" => FtsState::Indexing,
            "enabled" => FtsState::Enabled,
            _ => FtsState::Other(value),
        }
    }
}

impl From<FtsState> for String {
    fn from(state: FtsState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for FtsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtsState::NotSupported => write!(f, "not supported"),
            FtsState::Disabled => write!(f, "disabled"),
            FtsState::Indexing => write!(f, "indexing"),
            FtsState::Enabled => write!(f, "enabled"),
            FtsState::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Kind of entry a search result points at.
///
/// Dash emits many more types than these; the common ones get variants,
/// everything else is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResultKind {
    Function,
    Method,
    Class,
    Type,
    Property,
    Constant,
    Guide,
    Snippet,
    Other(String),
}

impl From<String> for ResultKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Function" => ResultKind::Function,
            "Method" => ResultKind::Method,
            "Class" => ResultKind::Class,
            "Type" => ResultKind::Type,
            "Property" => ResultKind::Property,
            "Constant" => ResultKind::Constant,
            "Guide" => ResultKind::Guide,
            "Snippet" => ResultKind::Snippet,
            _ => ResultKind::Other(value),
        }
    }
}

impl From<ResultKind> for String {
    fn from(kind: ResultKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::Function => write!(f, "Function"),
            ResultKind::Method => write!(f, "Method"),
            ResultKind::Class => write!(f, "Class"),
            ResultKind::Type => write!(f, "Type"),
            ResultKind::Property => write!(f, "Property"),
            ResultKind::Constant => write!(f, "Constant"),
            ResultKind::Guide => write!(f, "Guide"),
            ResultKind::Snippet => write!(f, "Snippet"),
            ResultKind::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// An installed documentation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsetInfo {
    pub name: String,
    /// Unique per installation; the handle for search filters and
    /// enable-indexing calls.
    pub identifier: String,
    pub platform: String,
    pub full_text_search: FtsState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// One documentation search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub load_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Snippet results only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Snippet results only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// Outcome of `list_installed_docsets`.
///
/// Expected unavailability (app absent, API disabled, no docsets) shows up
/// as an empty list plus `error`; it is never a fault.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsetList {
    #[serde(default)]
    pub docsets: Vec<DocsetInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocsetList {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            docsets: Vec::new(),
            error: Some(reason.into()),
        }
    }
}

/// Outcome of `search_documentation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fts_state_known_values() {
        assert_eq!(FtsState::from("enabled".to_string()), FtsState::Enabled);
        assert_eq!(
            FtsState::from("not supported".to_string()),
            FtsState::NotSupported
        );
        assert_eq!(FtsState::from("indexing".to_string()), FtsState::Indexing);
        assert_eq!(FtsState::from("disabled".to_string()), FtsState::Disabled);
    }

    #[test]
    fn test_fts_state_unknown_round_trips() {
        let state = FtsState::from("rebuilding".to_string());
        assert_eq!(state, FtsState::Other("rebuilding".to_string()));
        assert_eq!(state.to_string(), "rebuilding");
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#""rebuilding""#);
    }

    #[test]
    fn test_docset_deserializes_from_wire_record() {
        let docset: DocsetInfo = serde_json::from_str(
            r#"{
                "name": "Rust",
                "identifier": "rust-lang",
                "platform": "rust",
                "full_text_search": "enabled"
            }"#,
        )
        .unwrap();
        assert_eq!(docset.name, "Rust");
        assert_eq!(docset.full_text_search, FtsState::Enabled);
        assert!(docset.notice.is_none());
    }

    #[test]
    fn test_search_result_tolerates_absent_optionals() {
        let result: SearchResult = serde_json::from_str(
            r#"{
                "name": "Vec::push",
                "type": "Method",
                "load_url": "dash-apple-api://load?id=1"
            }"#,
        )
        .unwrap();
        assert_eq!(result.kind, ResultKind::Method);
        assert!(result.platform.is_none());
        assert!(result.tags.is_none());
    }

    #[test]
    fn test_result_kind_unknown_survives() {
        let result: SearchResult = serde_json::from_str(
            r#"{"name": "x", "type": "Mixin", "load_url": "u"}"#,
        )
        .unwrap();
        assert_eq!(result.kind, ResultKind::Other("Mixin".to_string()));
        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["type"], "Mixin");
    }
}
