//! Backend location and default timeout.

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_API_VERSION: &str = "v1";

/// Supplies the base URL and default timeout.
///
/// Read once at the start of every call; a retry loop never re-reads it.
pub trait ConfigSource: Send + Sync {
    fn base_url(&self) -> String;
    fn default_timeout_ms(&self) -> u64;
}

/// Static configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiConfig {
    /// Prefix joined with every endpoint, without a trailing `/`.
    pub base_url: String,
    /// Per-attempt timeout used when a call does not set one.
    pub timeout_ms: u64,
    pub api_version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_version: DEFAULT_API_VERSION.to_owned(),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads:
    /// - `SOCIAL_API_BASE_URL` (default `http://localhost:5000`)
    /// - `SOCIAL_API_TIMEOUT_MS` (default `30000`)
    /// - `SOCIAL_API_VERSION` (default `v1`)
    ///
    /// Unset variables fall back to defaults. A set but empty base URL, or a
    /// timeout that is not a positive integer, is an error.
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SOCIAL_API_BASE_URL") {
            if url.trim().is_empty() {
                return Err("SOCIAL_API_BASE_URL is set but empty".to_owned());
            }
            config.base_url = normalize_base_url(&url);
        }

        if let Some(raw) = lookup("SOCIAL_API_TIMEOUT_MS") {
            config.timeout_ms = match raw.trim().parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(format!(
                        "SOCIAL_API_TIMEOUT_MS must be a positive integer, got '{raw}'"
                    ))
                }
                Ok(value) => value,
            };
        }

        if let Some(version) = lookup("SOCIAL_API_VERSION") {
            if !version.trim().is_empty() {
                config.api_version = version.trim().to_owned();
            }
        }

        Ok(config)
    }
}

impl ConfigSource for ApiConfig {
    fn base_url(&self) -> String {
        self.base_url.clone()
    }

    fn default_timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}
