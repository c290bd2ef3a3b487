use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration as StdDuration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::{endpoints, envelope, http};
use crate::elvanto::auth::{self, Credentials};
use crate::elvanto::types::Contact;
use crate::error::{Error, Result};
use crate::types::PersonId;

/// Connection to the `Elvanto` API
///
/// Holds the credentials (refreshed in place when an OAuth token expires) and
/// the people directory from the last [`Connection::get_people`] call.
/// Calls are sequential; methods that may refresh the token take `&mut self`.
pub struct Connection {
    client: Client,
    base_url: String,
    credentials: Credentials,
    pub(crate) people: BTreeMap<PersonId, Contact>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.credentials {
            Credentials::ApiKey(_) => "api_key",
            Credentials::OAuth { refresh_token: Some(_), .. } => "oauth (refreshable)",
            Credentials::OAuth { .. } => "oauth",
        };
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .field("auth", &mode)
            .field("people", &self.people.len())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Connect to the default API host
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_base_url(credentials, endpoints::DEFAULT_BASE_URL)
    }

    /// Connect to a specific API host (no trailing slash needed)
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Result<Self> {
        credentials.validate()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: Client::builder()
                .timeout(StdDuration::from_secs(http::REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url,
            credentials,
            people: BTreeMap::new(),
        })
    }

    /// Create a connection from config
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_base_url(config.credentials()?, config.base_url.clone())
    }

    /// Credentials currently in use
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// API host this connection talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client, for token calls made outside the connection
    pub const fn http_client(&self) -> &Client {
        &self.client
    }

    /// Full URL of an API endpoint such as `people/getAll`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        let suffix = if endpoint.ends_with(".json") {
            ""
        } else if endpoint.ends_with('.') {
            "json"
        } else {
            ".json"
        };
        format!("{}{}{endpoint}{suffix}", self.base_url, endpoints::API_PATH)
    }

    /// Call an API endpoint.
    ///
    /// Non-ok envelopes are returned as data. An expired access token is
    /// refreshed and the call retried once; without a refresh token the
    /// result is `{"status": "Token expired please renew"}`.
    pub async fn post(&mut self, endpoint: &str, params: Value) -> Result<Value> {
        let response = self.send(endpoint, &params).await?;
        if is_ok(&response) || error_code(&response) != Some(envelope::TOKEN_EXPIRED_CODE) {
            return Ok(response);
        }

        if self.credentials.refresh_token().is_none() {
            warn!(endpoint, "Access token expired and no refresh token is available");
            return Ok(json!({ "status": envelope::TOKEN_EXPIRED_STATUS }));
        }

        info!(endpoint, "Access token expired; refreshing and retrying");
        self.refresh_token().await?;
        self.send(endpoint, &params).await
    }

    /// Make one authenticated POST and decode the JSON envelope
    async fn send(&self, endpoint: &str, params: &Value) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        debug!(endpoint, "POST {}", url);

        let resp = self
            .credentials
            .apply(self.client.post(&url))
            .json(params)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request to {endpoint} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Network(format!("Reading response from {endpoint} failed: {e}")))?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(Error::api_status(
                format!("Request to {endpoint} returned {status}"),
                status.as_u16(),
            )),
            Err(e) => Err(Error::parse(
                format!("Invalid JSON from {endpoint}: {e}"),
                endpoint.to_string(),
            )),
        }
    }

    /// Refresh the OAuth tokens in place.
    ///
    /// Returns the new token lifetime in seconds.
    pub async fn refresh_token(&mut self) -> Result<u64> {
        let refresh = self
            .credentials
            .refresh_token()
            .ok_or_else(|| {
                Error::config(
                    "Connection has no refresh token",
                    "Create the connection with an access token and a refresh token",
                )
            })?
            .to_string();

        let tokens = auth::refresh(&self.client, &self.base_url, &refresh).await?;
        self.credentials = Credentials::OAuth {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token.or(Some(refresh)),
        };
        info!(expires_in = tokens.expires_in, "Refreshed access token");
        Ok(tokens.expires_in)
    }
}

/// The `status` field of a response envelope
pub fn status(response: &Value) -> &str {
    response.get("status").and_then(Value::as_str).unwrap_or("")
}

/// True when the envelope reports `status: "ok"`
pub fn is_ok(response: &Value) -> bool {
    status(response) == envelope::STATUS_OK
}

/// `error.code` of a failed envelope; the API sends it as a number or a string
pub fn error_code(response: &Value) -> Option<i64> {
    match response.get("error")?.get("code")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
