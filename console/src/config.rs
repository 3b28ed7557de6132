//! Console settings loaded via OrthoConfig.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::settings::DEFAULT_BOOTSTRAP_THROTTLE;

/// Default timeout applied to each settings API request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration values for the settings client and preference storage.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ADMIN_CONSOLE")]
pub struct ConsoleSettings {
    /// Origin of the admin settings API.
    pub api_base_url: Option<String>,
    /// Bootstrap coalescing window in milliseconds.
    pub bootstrap_throttle_ms: Option<u64>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Directory holding per-operator column preferences.
    pub preference_dir: Option<PathBuf>,
}

impl ConsoleSettings {
    /// Parse the configured API origin, if any.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the configured value is not a URL.
    pub fn api_base_url(&self) -> Result<Option<Url>, url::ParseError> {
        self.api_base_url.as_deref().map(Url::parse).transpose()
    }

    /// Return the bootstrap throttle window, falling back to the default.
    #[must_use]
    pub fn bootstrap_throttle(&self) -> Duration {
        self.bootstrap_throttle_ms
            .map_or(DEFAULT_BOOTSTRAP_THROTTLE, Duration::from_millis)
    }

    /// Return the request timeout, falling back to the default.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Return the configured preference directory.
    #[must_use]
    pub fn preference_dir(&self) -> Option<&Path> {
        self.preference_dir.as_deref()
    }
}
