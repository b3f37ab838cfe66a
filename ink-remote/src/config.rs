//! Backend connection settings.

use serde::{Deserialize, Serialize};

/// Where the OCR, synthesis and storage services live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL; endpoints are resolved relative to it.
    pub base_url: String,
    /// Per-request timeout in seconds. Zero disables the timeout.
    pub timeout_secs: u64,
    /// User agent override.
    pub user_agent: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl RemoteConfig {
    /// Configuration pointing at `base_url` with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
