// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Application configuration loaded from environment variables (and `.env`).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Supabase project connection
    pub backend: BackendConfig,

    /// Session persistence
    #[serde(default)]
    pub auth: AuthConfig,

    /// Confirmation link settings
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Public anon key
    pub anon_key: SecretString,

    /// Per-request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Where to keep the session between runs; in-memory only when unset.
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessagingConfig {
    /// Messaging service link prefix
    #[serde(default = "default_messaging_url")]
    pub base_url: String,

    /// Country calling code prepended to the local number
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Closing line of the confirmation message
    #[serde(default = "default_signature")]
    pub signature: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            base_url: default_messaging_url(),
            country_code: default_country_code(),
            signature: default_signature(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_messaging_url() -> String {
    "https://wa.me".into()
}

fn default_country_code() -> String {
    "55".into()
}

fn default_signature() -> String {
    "Equipe FutVôlei".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                environment
                    .separator("__")
                    // Keep numeric-looking values such as the country code as strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Url::parse(&config.backend.url)
            .with_context(|| format!("BACKEND__URL is not a valid URL: {}", config.backend.url))?;
        Url::parse(&config.messaging.base_url).with_context(|| {
            format!(
                "MESSAGING__BASE_URL is not a valid URL: {}",
                config.messaging.base_url
            )
        })?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn environment(pairs: &[(&str, &str)]) -> config::Environment {
        let mut map = config::Map::new();
        for (key, value) in pairs {
            map.insert((*key).to_string(), (*value).to_string());
        }
        config::Environment::default().source(Some(map))
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let config = Config::from_environment(environment(&[
            ("BACKEND__URL", "https://demo.supabase.co"),
            ("BACKEND__ANON_KEY", "anon"),
        ]))
        .unwrap();

        assert_eq!(config.backend.anon_key.expose_secret(), "anon");
        assert_eq!(config.backend.timeout, Duration::from_secs(15));
        assert_eq!(config.messaging, MessagingConfig::default());
        assert_eq!(config.messaging.country_code, "55");
        assert!(config.auth.session_file.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_environment(environment(&[
            ("BACKEND__URL", "https://demo.supabase.co"),
            ("BACKEND__ANON_KEY", "anon"),
            ("BACKEND__TIMEOUT", "3s"),
            ("AUTH__SESSION_FILE", "/tmp/session.json"),
            ("MESSAGING__COUNTRY_CODE", "351"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.backend.timeout, Duration::from_secs(3));
        assert_eq!(
            config.auth.session_file,
            Some(PathBuf::from("/tmp/session.json"))
        );
        assert_eq!(config.messaging.country_code, "351");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_backend_is_an_error() {
        assert!(Config::from_environment(environment(&[])).is_err());
    }

    #[test]
    fn invalid_backend_url_is_rejected() {
        let result = Config::from_environment(environment(&[
            ("BACKEND__URL", "not a url"),
            ("BACKEND__ANON_KEY", "anon"),
        ]));

        assert!(result.is_err());
    }
}
