//! Client configuration.
//!
//! Loaded from `kotoba.json`; a missing file yields defaults, a malformed
//! one is a parse error with the offending path. Values are validated
//! after loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KotobaError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "kotoba.json";

/// Default service endpoint.
fn default_server_url() -> String {
    "http://localhost:8787/api".to_string()
}

/// Default session snapshot path.
fn default_session_file() -> String {
    ".kotoba/session.json".to_string()
}

/// Default overlay safety timeout in seconds.
const fn default_overlay_timeout() -> u64 {
    10
}

/// Client configuration for the Kotoba lesson engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the remote content/grading service.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Path of the persisted session snapshot.
    #[serde(default = "default_session_file")]
    pub session_file: String,

    /// Upper bound, in seconds, on how long the blocking overlay may
    /// stay up before it is forcibly released.
    #[serde(default = "default_overlay_timeout")]
    pub overlay_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            session_file: default_session_file(),
            overlay_timeout_secs: default_overlay_timeout(),
        }
    }
}

impl Config {
    /// Loads configuration from `kotoba.json` in the given directory.
    ///
    /// A missing file yields defaults.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            KotobaError::validation(format!("invalid config '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(KotobaError::validation("serverUrl must not be empty"));
        }
        if self.session_file.trim().is_empty() {
            return Err(KotobaError::validation("sessionFile must not be empty"));
        }
        if self.overlay_timeout_secs == 0 {
            return Err(KotobaError::validation(
                "overlayTimeoutSecs must be greater than 0",
            ));
        }
        Ok(())
    }

    /// The overlay safety timeout as a [`std::time::Duration`].
    #[must_use]
    pub const fn overlay_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.overlay_timeout_secs)
    }
}
