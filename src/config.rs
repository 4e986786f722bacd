use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const DEFAULT_TWITTER_API_URL: &str = "https://api.twitter.com/2/tweets/search/recent";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
///
/// External secrets are optional here. A missing Google client or Twitter
/// token makes the matching feature fail at request time, not at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
    pub client_origin: String,

    // Google sign-in
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_url: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,

    // Hashtag search
    pub twitter_bearer_token: Option<String>,
    pub twitter_api_url: String,
    pub twitter_max_results: u32,
    pub hashtag_fallback_enabled: bool,

    // Outbound HTTP
    pub http_timeout: Duration,

    // Login attempts
    pub login_attempt_ttl: Duration,
    pub login_cleanup_interval: Duration,
    pub popup_close_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Database
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/blog.sqlite")),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 5001)?,
            client_origin: env_or_default("CLIENT_ORIGIN", "http://localhost:3000"),

            // Google sign-in
            google_client_id: optional_env("GOOGLE_CLIENT_ID"),
            google_client_secret: optional_env("GOOGLE_CLIENT_SECRET"),
            google_redirect_url: env_or_default(
                "GOOGLE_REDIRECT_URL",
                "http://localhost:5001/auth/google/callback",
            ),
            google_auth_url: env_or_default("GOOGLE_AUTH_URL", DEFAULT_GOOGLE_AUTH_URL),
            google_token_url: env_or_default("GOOGLE_TOKEN_URL", DEFAULT_GOOGLE_TOKEN_URL),
            google_userinfo_url: env_or_default("GOOGLE_USERINFO_URL", DEFAULT_GOOGLE_USERINFO_URL),

            // Hashtag search
            twitter_bearer_token: optional_env("TWITTER_BEARER_TOKEN"),
            twitter_api_url: env_or_default("TWITTER_API_URL", DEFAULT_TWITTER_API_URL),
            twitter_max_results: parse_env_u32("TWITTER_MAX_RESULTS", 12)?,
            hashtag_fallback_enabled: parse_env_bool("HASHTAG_FALLBACK_ENABLED", true)?,

            // Outbound HTTP
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 15)?),

            // Login attempts
            login_attempt_ttl: Duration::from_secs(parse_env_u64("LOGIN_ATTEMPT_TTL_SECS", 600)?),
            login_cleanup_interval: Duration::from_secs(parse_env_u64(
                "LOGIN_CLEANUP_INTERVAL_SECS",
                300,
            )?),
            popup_close_delay: Duration::from_millis(parse_env_u64("POPUP_CLOSE_DELAY_MS", 1000)?),
        })
    }

    /// Configuration with defaults and no external secrets, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            database_path: PathBuf::from("./data/test.sqlite"),
            web_host: "127.0.0.1".to_string(),
            web_port: 5001,
            client_origin: "http://localhost:3000".to_string(),
            google_client_id: None,
            google_client_secret: None,
            google_redirect_url: "http://localhost:5001/auth/google/callback".to_string(),
            google_auth_url: DEFAULT_GOOGLE_AUTH_URL.to_string(),
            google_token_url: DEFAULT_GOOGLE_TOKEN_URL.to_string(),
            google_userinfo_url: DEFAULT_GOOGLE_USERINFO_URL.to_string(),
            twitter_bearer_token: None,
            twitter_api_url: DEFAULT_TWITTER_API_URL.to_string(),
            twitter_max_results: 12,
            hashtag_fallback_enabled: true,
            http_timeout: Duration::from_secs(5),
            login_attempt_ttl: Duration::from_secs(600),
            login_cleanup_interval: Duration::from_secs(300),
            popup_close_delay: Duration::from_millis(1000),
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The recent-search endpoint rejects anything outside 10..=100.
        if !(10..=100).contains(&self.twitter_max_results) {
            return Err(ConfigError::InvalidValue {
                name: "TWITTER_MAX_RESULTS".to_string(),
                message: format!("must be between 10 and 100, got {}", self.twitter_max_results),
            });
        }
        if self.login_attempt_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "LOGIN_ATTEMPT_TTL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.login_cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "LOGIN_CLEANUP_INTERVAL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        for (name, value) in [
            ("CLIENT_ORIGIN", &self.client_origin),
            ("GOOGLE_REDIRECT_URL", &self.google_redirect_url),
            ("GOOGLE_AUTH_URL", &self.google_auth_url),
            ("GOOGLE_TOKEN_URL", &self.google_token_url),
            ("GOOGLE_USERINFO_URL", &self.google_userinfo_url),
            ("TWITTER_API_URL", &self.twitter_api_url),
        ] {
            if let Err(e) = url::Url::parse(value) {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("not a valid URL: {e}"),
                });
            }
        }
        Ok(())
    }
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

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
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

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_default() {
        assert!(parse_env_bool("UGC_BLOG_NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("UGC_BLOG_NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_testing_config_is_valid() {
        assert!(Config::for_testing().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_max_results() {
        let config = Config {
            twitter_max_results: 5,
            ..Config::for_testing()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "TWITTER_MAX_RESULTS"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let config = Config {
            client_origin: "not a url".to_string(),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = Config {
            login_attempt_ttl: Duration::ZERO,
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }
}
