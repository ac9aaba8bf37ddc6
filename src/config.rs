use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Record store
    pub store_url: String,

    // Identity service
    pub identity_url: String,

    // Bearer token sent to both collaborators
    pub api_token: Option<String>,

    // Moderator allow-list (user ids), loaded once and immutable afterwards
    pub moderators: HashSet<String>,

    // Outbound request timeout for collaborator calls
    pub request_timeout: Duration,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store_url: required_env("STORE_URL")?,
            identity_url: required_env("IDENTITY_URL")?,
            api_token: optional_env("API_TOKEN"),
            moderators: parse_moderators(&env_or_default("MODERATORS", "")),
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 30)?),
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8090)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "STORE_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.identity_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "IDENTITY_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Whether a resolved user id is on the moderator allow-list.
    #[must_use]
    pub fn is_moderator(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.moderators.contains(user_id)
    }

    /// A configuration suitable for tests: collaborator URLs point at the
    /// given bases, no token, short timeout.
    #[must_use]
    pub fn for_testing(store_url: &str, identity_url: &str) -> Self {
        Self {
            store_url: store_url.to_string(),
            identity_url: identity_url.to_string(),
            api_token: None,
            moderators: HashSet::new(),
            request_timeout: Duration::from_secs(5),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
        }
    }
}

/// Parse the CSV moderator list into a set, dropping empty entries.
fn parse_moderators(csv: &str) -> HashSet<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moderators() {
        let mods = parse_moderators("alice,bob, carol ,");
        assert_eq!(mods.len(), 3);
        assert!(mods.contains("alice"));
        assert!(mods.contains("bob"));
        assert!(mods.contains("carol"));
    }

    #[test]
    fn test_parse_moderators_empty() {
        assert!(parse_moderators("").is_empty());
        assert!(parse_moderators(" , ,").is_empty());
    }

    #[test]
    fn test_is_moderator() {
        let mut config = Config::for_testing("http://store", "http://identity");
        config.moderators = parse_moderators("mod-1,mod-2");
        assert!(config.is_moderator("mod-1"));
        assert!(!config.is_moderator("user-9"));
        // An empty resolved id must never match, even if the list is odd
        assert!(!config.is_moderator(""));
    }

    #[test]
    fn test_validate_rejects_empty_urls() {
        let mut config = Config::for_testing("http://store", "http://identity");
        config.store_url = String::new();
        assert!(config.validate().is_err());
    }
}
