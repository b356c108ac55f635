//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration against a local development API.

use std::path::PathBuf;
use std::time::Duration;

use oasis_shared::constants::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Client configuration.
///
/// `Debug` redacts the API token so the config can be logged.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    /// Env: `OASIS_API_URL`
    /// Default: `http://127.0.0.1:8080/api`
    pub api_base_url: String,

    /// Bearer token sent with every request.
    /// Env: `OASIS_API_TOKEN`
    /// Default: none (anonymous requests).
    pub api_token: Option<String>,

    /// Location of the local cache database.
    /// Env: `OASIS_DB_PATH`
    /// Default: none (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Transport timeout for a single request, in seconds.
    /// Env: `OASIS_REQUEST_TIMEOUT_SECS`
    /// Default: `30`
    pub request_timeout_secs: u64,

    /// Customer whose records the headless sync refreshes.
    /// Env: `OASIS_CUSTOMER_ID`
    pub customer_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            database_path: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            customer_id: None,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("database_path", &self.database_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("customer_id", &self.customer_id)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("OASIS_API_URL") {
            if url.trim().is_empty() {
                tracing::warn!("Empty OASIS_API_URL, using default");
            } else {
                config.api_base_url = url.trim().to_string();
            }
        }

        if let Ok(token) = std::env::var("OASIS_API_TOKEN") {
            if !token.is_empty() {
                config.api_token = Some(token);
            }
        }

        if let Ok(path) = std::env::var("OASIS_DB_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(val) = std::env::var("OASIS_REQUEST_TIMEOUT_SECS") {
            match parse_timeout_secs(&val) {
                Ok(secs) => config.request_timeout_secs = secs,
                Err(e) => {
                    tracing::warn!(
                        value = %val,
                        error = %e,
                        "Invalid OASIS_REQUEST_TIMEOUT_SECS, using default"
                    );
                }
            }
        }

        if let Ok(id) = std::env::var("OASIS_CUSTOMER_ID") {
            if !id.trim().is_empty() {
                config.customer_id = Some(id.trim().to_string());
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse a strictly positive number of seconds.
fn parse_timeout_secs(value: &str) -> Result<u64, String> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|e| format!("not a number of seconds: {e}"))?;
    if secs == 0 {
        return Err("timeout must be greater than zero".into());
    }
    Ok(secs)
}
