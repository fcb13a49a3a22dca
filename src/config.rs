//! Client configuration.
//!
//! # Example
//!
//! ```ignore
//! use streamchat::config::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_base_url("https://chat.example.com")
//!     .with_session_cookie("SESSION=abc123");
//! ```

/// Environment variable overriding the backend base URL.
pub const ENV_API_URL: &str = "STREAMCHAT_API_URL";
/// Environment variable carrying the session cookie.
pub const ENV_SESSION: &str = "STREAMCHAT_SESSION";
/// Environment variable overriding the connect timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "STREAMCHAT_TIMEOUT_SECS";

/// Default backend location for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings shared by every request the client makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, without the `/api` prefix
    pub base_url: String,
    /// Value of the `Cookie` header carrying the login session
    pub session_cookie: Option<String>,
    /// Connect timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_cookie: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend origin. A trailing slash is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Build from `STREAMCHAT_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = non_empty_var(ENV_API_URL) {
            config = config.with_base_url(url);
        }
        if let Some(cookie) = non_empty_var(ENV_SESSION) {
            config = config.with_session_cookie(cookie);
        }
        if let Some(raw) = non_empty_var(ENV_TIMEOUT_SECS) {
            match raw.parse() {
                Ok(secs) => config = config.with_request_timeout_secs(secs),
                Err(_) => tracing::warn!("Ignoring invalid {}={:?}", ENV_TIMEOUT_SECS, raw),
            }
        }

        config
    }

    /// `{base_url}/api{path}`
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_SESSION);
        std::env::remove_var(ENV_TIMEOUT_SECS);
    }

    #[test]
    fn test_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.session_cookie.is_none());
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let config = ClientConfig::new().with_base_url("https://chat.example.com/");
        assert_eq!(
            config.api_url("/chats/1"),
            "https://chat.example.com/api/chats/1"
        );
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var(ENV_API_URL, "http://10.0.0.5:9000");
        std::env::set_var(ENV_SESSION, "SESSION=xyz");
        std::env::set_var(ENV_TIMEOUT_SECS, "5");

        let config = ClientConfig::from_env();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.session_cookie.as_deref(), Some("SESSION=xyz"));
        assert_eq!(config.request_timeout_secs, 5);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_bad_values() {
        clear_env();
        std::env::set_var(ENV_SESSION, "   ");
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");

        assert_eq!(ClientConfig::from_env(), ClientConfig::default());

        clear_env();
    }
}
