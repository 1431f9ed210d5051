//! Sync configuration and the server's market config file.

use crate::protocol::MAX_PAYLOAD_BYTES;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration shared by both sides of the protocol.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum bytes per category payload.
    pub payload_ceiling: usize,
    /// How long a client waits without progress before giving up on a cycle.
    pub sync_timeout: Duration,
    /// Notice the server appends to every completion.
    pub warn_text: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            payload_ceiling: MAX_PAYLOAD_BYTES,
            sync_timeout: Duration::from_millis(30_000),
            warn_text: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MarketConfig {
    #[serde(rename = "WarnText")]
    warn_text: Option<String>,
}

/// Reads the completion notice from the first market config that has one.
///
/// Candidates that are missing, unreadable or malformed are skipped.
pub fn load_warn_text(candidates: &[PathBuf]) -> Option<String> {
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                continue;
            }
        };
        match serde_json::from_str::<MarketConfig>(&contents) {
            Ok(config) => {
                if let Some(text) = config.warn_text.filter(|t| !t.trim().is_empty()) {
                    debug!("Using warn text from {}", path.display());
                    return Some(text);
                }
            }
            Err(e) => warn!("Ignoring malformed market config {}: {}", path.display(), e),
        }
    }
    None
}
