//! Configuration structures
//!
//! Loaded by `magicbox-infra::config` from the environment or a config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DESTINATION, DEFAULT_SESSION_TIMEOUT_MS, DEV_REDIRECT_URL, LOGIN_PATH,
    PLACEHOLDER_ANON_KEY, PLACEHOLDER_BACKEND_URL, PRODUCTION_DOMAIN, PROD_REDIRECT_URL,
};
use crate::errors::{MagicBoxError, Result};

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse an environment name (`development`/`dev`, `production`/`prod`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Whether this is the production environment
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Hosted backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { url: PLACEHOLDER_BACKEND_URL.to_string(), anon_key: PLACEHOLDER_ANON_KEY.to_string() }
    }
}

impl BackendConfig {
    /// True when either value is still the development placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.url == PLACEHOLDER_BACKEND_URL || self.anon_key == PLACEHOLDER_ANON_KEY
    }
}

/// Sign-in flow settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bound on how long the callback waits for a session.
    pub session_timeout_ms: u64,
    pub redirect_url_development: String,
    pub redirect_url_production: String,
    /// Origins containing any of these hosts always use the production
    /// redirect URL.
    pub production_domains: Vec<String>,
    pub default_destination: String,
    pub login_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: DEFAULT_SESSION_TIMEOUT_MS,
            redirect_url_development: DEV_REDIRECT_URL.to_string(),
            redirect_url_production: PROD_REDIRECT_URL.to_string(),
            production_domains: vec![PRODUCTION_DOMAIN.to_string()],
            default_destination: DEFAULT_DESTINATION.to_string(),
            login_path: LOGIN_PATH.to_string(),
        }
    }
}

impl AuthConfig {
    /// Session wait bound as a `Duration`
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Pick the OAuth redirect URL for the current origin.
    ///
    /// The production URL wins whenever the environment is production or the
    /// origin is served from a production domain, even if the build was
    /// detected as development.
    pub fn redirect_url(&self, current_origin: Option<&str>) -> &str {
        let on_production_domain = current_origin.is_some_and(|origin| {
            self.auth.production_domains.iter().any(|domain| origin.contains(domain.as_str()))
        });

        if self.environment.is_production() || on_production_domain {
            &self.auth.redirect_url_production
        } else {
            &self.auth.redirect_url_development
        }
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    /// Returns `MagicBoxError::Config` if production runs with placeholder
    /// backend settings, the backend URL is malformed, or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.backend.is_placeholder() {
            return Err(MagicBoxError::Config("Missing backend environment variables".into()));
        }

        url::Url::parse(&self.backend.url).map_err(|err| {
            MagicBoxError::Config(format!("invalid backend URL '{}': {err}", self.backend.url))
        })?;

        if self.auth.session_timeout_ms == 0 {
            return Err(MagicBoxError::Config("session timeout must be greater than zero".into()));
        }

        Ok(())
    }
}
