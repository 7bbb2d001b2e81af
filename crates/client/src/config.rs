use std::time::Duration;

/// Default base URL: the registration service on a development machine.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the registration service, without a trailing slash.
    pub api_url: String,
    /// Timeout applied to every request (default: `30`).
    pub request_timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid number of seconds, got '{value}'")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{var} must be an http(s) URL, got '{value}'")]
    InvalidUrl { var: &'static str, value: String },
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `TURMAS_API_URL`              | `http://localhost:8080` |
    /// | `TURMAS_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("TURMAS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let api_url = normalize_url(&api_url).ok_or(ConfigError::InvalidUrl {
            var: "TURMAS_API_URL",
            value: api_url.clone(),
        })?;

        let request_timeout_secs = match lookup("TURMAS_REQUEST_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout {
                    var: "TURMAS_REQUEST_TIMEOUT_SECS",
                    value,
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            request_timeout_secs,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn normalize_url(raw: &str) -> Option<String> {
    let url = raw.trim().trim_end_matches('/');
    (url.starts_with("http://") || url.starts_with("https://")).then(|| url.to_string())
}
