//! Client configuration.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthOptions;

/// Environment variable holding the ship's base URL.
pub const URL_VAR: &str = "URBIT_URL";
/// Environment variable enabling anonymous fallback ("1" or "true").
pub const ANON_FALLBACK_VAR: &str = "URBIT_ANON_FALLBACK";
/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_VAR: &str = "URBIT_TIMEOUT_SECS";

const DEFAULT_URL: &str = "http://localhost:8080";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid value: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Connection settings for one ship.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Base URL of the ship, e.g. "http://localhost:8080".
    pub url: String,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Per-request timeout. Must exceed how long the ship holds a
    /// long-poll open, or every idle poll ends in a timeout.
    pub request_timeout: Duration,

    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,

    pub auth: AuthOptions,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            user_agent: concat!("urbit-channel/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(60),
            headers: Vec::new(),
            auth: AuthOptions::default(),
        }
    }
}

impl ChannelConfig {
    /// Defaults overridden by `URBIT_URL`, `URBIT_ANON_FALLBACK` and
    /// `URBIT_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(URL_VAR) {
            config.url = url;
        }

        if let Some(value) = lookup(ANON_FALLBACK_VAR) {
            let flag = value.trim().to_ascii_lowercase();
            config.auth.allow_anonymous_fallback = match flag.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: ANON_FALLBACK_VAR,
                        value,
                    });
                }
            };
        }

        if let Some(value) = lookup(TIMEOUT_VAR) {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: TIMEOUT_VAR,
                value: value.clone(),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ChannelConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(!config.auth.allow_anonymous_fallback);
        assert!(config.user_agent.starts_with("urbit-channel/"));
    }

    #[test]
    fn overrides() {
        let config = ChannelConfig::from_lookup(lookup(&[
            (URL_VAR, "http://ship.example:80"),
            (ANON_FALLBACK_VAR, "true"),
            (TIMEOUT_VAR, "90"),
        ]))
        .unwrap();
        assert_eq!(config.url, "http://ship.example:80");
        assert!(config.auth.allow_anonymous_fallback);
        assert_eq!(config.request_timeout, Duration::from_secs(90));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            ChannelConfig::from_lookup(lookup(&[(ANON_FALLBACK_VAR, "maybe")])).unwrap_err(),
            ConfigError::InvalidValue {
                var: ANON_FALLBACK_VAR,
                value: "maybe".to_string()
            }
        );
        assert!(ChannelConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")])).is_err());
    }
}
