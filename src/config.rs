//! Client configuration.
//!
//! Handles loading credentials from environment variables and .env files.

use dotenv::dotenv;
use std::env;

use crate::constants::{endpoints, services};
use crate::elvanto::auth::{Credentials, OAuthApp};
use crate::error::{Error, Result};

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct Config {
    /// The crate name
    app_name: String,
    /// The crate version
    app_version: String,
    /// `Elvanto` API key
    pub api_key: Option<String>,
    /// OAuth access token
    pub access_token: Option<String>,
    /// OAuth refresh token
    pub refresh_token: Option<String>,
    /// OAuth app client ID
    pub client_id: Option<String>,
    /// OAuth app client secret
    pub client_secret: Option<String>,
    /// OAuth app redirect URI
    pub redirect_uri: Option<String>,
    /// API host, without trailing slash
    pub base_url: String,
    /// How many days ahead to load services
    pub days_ahead: i64,
}

impl Config {
    /// Get the crate name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get the crate version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            api_key: None,
            access_token: None,
            refresh_token: None,
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            base_url: endpoints::DEFAULT_BASE_URL.to_string(),
            days_ahead: services::DEFAULT_DAYS_AHEAD,
        }
    }
}

/// Read a variable, treating empty values as unset
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    #[allow(clippy::unnecessary_wraps)] // Returns Result for forward-compatible API
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();

        let mut config = Self {
            api_key: non_empty_var("ELVANTO_API_KEY"),
            access_token: non_empty_var("ELVANTO_ACCESS_TOKEN"),
            refresh_token: non_empty_var("ELVANTO_REFRESH_TOKEN"),
            client_id: non_empty_var("ELVANTO_CLIENT_ID"),
            client_secret: non_empty_var("ELVANTO_CLIENT_SECRET"),
            redirect_uri: non_empty_var("ELVANTO_REDIRECT_URI"),
            ..Self::default()
        };

        if let Some(base) = non_empty_var("ELVANTO_BASE_URL") {
            config.base_url = base.trim_end_matches('/').to_string();
        }

        if let Ok(days) = env::var("DAYS_AHEAD") {
            if let Ok(days) = days.parse::<i64>() {
                config.days_ahead = days;
            }
        }

        Ok(config)
    }

    /// Check if any `Elvanto` credentials are configured
    pub const fn has_credentials(&self) -> bool {
        self.api_key.is_some() || self.access_token.is_some()
    }

    /// Resolve the single authentication mode to use.
    ///
    /// An API key wins over an access token when both are present.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.api_key, &self.access_token) {
            (Some(key), token) => {
                if token.is_some() {
                    tracing::warn!("Both ELVANTO_API_KEY and ELVANTO_ACCESS_TOKEN set; using the API key");
                }
                Ok(Credentials::ApiKey(key.clone()))
            }
            (None, Some(token)) => Ok(Credentials::OAuth {
                access_token: token.clone(),
                refresh_token: self.refresh_token.clone(),
            }),
            (None, None) => Err(Error::config(
                "No Elvanto credentials configured",
                "Set ELVANTO_API_KEY, or ELVANTO_ACCESS_TOKEN with an optional ELVANTO_REFRESH_TOKEN",
            )),
        }
    }

    /// OAuth app registration, when all of its variables are set
    pub fn oauth_app(&self) -> Option<OAuthApp> {
        Some(OAuthApp {
            client_id: self.client_id.clone()?,
            client_secret: self.client_secret.clone()?,
            redirect_uri: self.redirect_uri.clone()?,
        })
    }
}
