//! Server configuration

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8123;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TWITTER_API_BASE: &str = "https://api.twitter.com";

#[derive(Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Address to bind
    pub bind: String,

    /// Timeout for every outbound post fetch
    pub http_timeout: Duration,

    /// Bearer token for the Twitter API; without it tweets cannot be fetched
    pub twitter_bearer_token: Option<String>,

    /// Twitter API base URL
    pub twitter_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            twitter_bearer_token: None,
            twitter_api_base: DEFAULT_TWITTER_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Optional:
    /// - BLUESKID_PORT (default: 8123)
    /// - BLUESKID_BIND (default: 0.0.0.0)
    /// - BLUESKID_HTTP_TIMEOUT_SECS (default: 10)
    /// - TWITTER_BEARER_TOKEN
    /// - TWITTER_API_BASE (default: https://api.twitter.com)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();

        let port = parse_or(get("BLUESKID_PORT"), "BLUESKID_PORT", defaults.port);
        let timeout_secs = parse_or(
            get("BLUESKID_HTTP_TIMEOUT_SECS"),
            "BLUESKID_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        );

        Self {
            port,
            bind: get("BLUESKID_BIND").unwrap_or(defaults.bind),
            http_timeout: Duration::from_secs(timeout_secs),
            twitter_bearer_token: get("TWITTER_BEARER_TOKEN"),
            twitter_api_base: get("TWITTER_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.twitter_api_base),
        }
    }

    /// Socket address to listen on
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address {}: {}", addr, e))
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + fmt::Display + Copy,
{
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, %default, "ignoring malformed setting");
            default
        }),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("bind", &self.bind)
            .field("http_timeout", &self.http_timeout)
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "<redacted>"),
            )
            .field("twitter_api_base", &self.twitter_api_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8123);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.twitter_bearer_token, None);
        assert_eq!(config.twitter_api_base, "https://api.twitter.com");
        assert_eq!(config.listen_addr().unwrap().to_string(), "0.0.0.0:8123");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BLUESKID_PORT", "9000"),
            ("BLUESKID_BIND", "127.0.0.1"),
            ("BLUESKID_HTTP_TIMEOUT_SECS", "3"),
            ("TWITTER_BEARER_TOKEN", "sekrit"),
            ("TWITTER_API_BASE", "http://localhost:9999/"),
        ]);
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.twitter_bearer_token.as_deref(), Some("sekrit"));
        assert_eq!(config.twitter_api_base, "http://localhost:9999");
    }

    #[test]
    fn test_malformed_numbers_fall_back() {
        let config = config_from(&[
            ("BLUESKID_PORT", "eighty"),
            ("BLUESKID_HTTP_TIMEOUT_SECS", "-1"),
            ("TWITTER_BEARER_TOKEN", "  "),
        ]);
        assert_eq!(config.port, 8123);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.twitter_bearer_token, None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = config_from(&[("TWITTER_BEARER_TOKEN", "sekrit")]);
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sekrit"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_bad_bind_address() {
        let config = config_from(&[("BLUESKID_BIND", "not an address")]);
        assert!(config.listen_addr().is_err());
    }
}
