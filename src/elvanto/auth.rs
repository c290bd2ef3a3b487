//! Authentication for the `Elvanto` API.
//!
//! Covers the two supported modes (API key and OAuth bearer token), the
//! browser authorization URL, and the form-encoded token endpoint used for
//! code exchange and refresh.

use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::constants::endpoints;
use crate::error::{Error, Result};

/// How a connection authenticates. Exactly one mode per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP Basic auth with the key as username and an empty password.
    ApiKey(String),
    /// Bearer token, refreshable when a refresh token is held.
    OAuth {
        /// Current access token.
        access_token: String,
        /// Refresh token, if the integration was granted one.
        refresh_token: Option<String>,
    },
}

impl Credentials {
    /// Reject blank keys and tokens.
    pub fn validate(&self) -> Result<()> {
        let blank = match self {
            Self::ApiKey(key) => key.trim().is_empty(),
            Self::OAuth { access_token, .. } => access_token.trim().is_empty(),
        };
        if blank {
            return Err(Error::config(
                "Invalid auth method: credential is empty",
                "Use an API key or an access token (with an optional refresh token)",
            ));
        }
        Ok(())
    }

    /// Refresh token held by these credentials, if any.
    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            Self::ApiKey(_) => None,
            Self::OAuth { refresh_token, .. } => refresh_token.as_deref(),
        }
    }

    /// Attach the auth header for this mode to a request.
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiKey(key) => request.basic_auth(key, Some("")),
            Self::OAuth { access_token, .. } => request.bearer_auth(access_token),
        }
    }
}

/// Requested permission scope: a single scope or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// One scope, or an already comma-delimited string.
    One(String),
    /// Several scopes, joined with commas on the wire.
    Many(Vec<String>),
}

impl Scope {
    /// Wire form of the scope parameter.
    pub fn to_param(&self) -> String {
        match self {
            Self::One(s) => s.clone(),
            Self::Many(list) => list.join(","),
        }
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Self::One(s.to_string())
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Self::One(s)
    }
}

impl From<Vec<String>> for Scope {
    fn from(list: Vec<String>) -> Self {
        Self::Many(list)
    }
}

impl From<&[&str]> for Scope {
    fn from(list: &[&str]) -> Self {
        Self::Many(list.iter().map(ToString::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Scope {
    fn from(list: [&str; N]) -> Self {
        Self::from(&list[..])
    }
}

/// Kind of integration requesting authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppType {
    /// Server-side web app. May round-trip an opaque `state` value.
    WebServer {
        /// Value echoed back on the redirect.
        state: Option<String>,
    },
    /// Client-side app receiving the token directly.
    UserAgent,
}

/// Tokens returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenSet {
    /// New access token.
    pub access_token: String,
    /// New refresh token, when issued.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
}

/// Registered OAuth integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthApp {
    /// Client ID of the integration.
    pub client_id: String,
    /// Client secret of the integration.
    pub client_secret: String,
    /// Where users are sent after logging in.
    pub redirect_uri: String,
}

impl OAuthApp {
    /// Login URL for this app.
    pub fn authorize_url(
        &self,
        base_url: &str,
        scope: impl Into<Scope>,
        app_type: &AppType,
    ) -> Result<String> {
        authorize_url(base_url, &self.client_id, &self.redirect_uri, scope, app_type)
    }

    /// Exchange the code from the login redirect for tokens.
    pub async fn exchange_code(&self, http: &Client, base_url: &str, code: &str) -> Result<TokenSet> {
        exchange_code(
            http,
            base_url,
            &self.client_id,
            &self.client_secret,
            code,
            &self.redirect_uri,
        )
        .await
    }
}

/// Build the URL users visit to authorize an integration.
pub fn authorize_url(
    base_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: impl Into<Scope>,
    app_type: &AppType,
) -> Result<String> {
    let mut url = Url::parse(&format!("{base_url}{}", endpoints::OAUTH_PATH))
        .map_err(|e| Error::config(format!("Invalid base URL {base_url}: {e}"), "Check ELVANTO_BASE_URL"))?;

    let kind = match app_type {
        AppType::WebServer { .. } => "web_server",
        AppType::UserAgent => "user_agent",
    };

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("type", kind)
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &scope.into().to_param());
        if let AppType::WebServer { state: Some(state) } = app_type {
            if !state.is_empty() {
                query.append_pair("state", state);
            }
        }
    }

    Ok(url.into())
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    http: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenSet> {
    request_tokens(
        http,
        base_url,
        &[
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ],
    )
    .await
}

/// Trade a refresh token for a new token set.
pub async fn refresh(http: &Client, base_url: &str, refresh_token: &str) -> Result<TokenSet> {
    request_tokens(
        http,
        base_url,
        &[("grant_type", "refresh_token"), ("refresh_token", refresh_token)],
    )
    .await
}

async fn request_tokens(http: &Client, base_url: &str, form: &[(&str, &str)]) -> Result<TokenSet> {
    let url = format!("{base_url}{}", endpoints::TOKEN_PATH);
    let resp = http
        .post(&url)
        .form(form)
        .send()
        .await
        .map_err(|e| Error::Network(format!("Token request failed: {e}")))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| Error::Network(format!("Reading token response failed: {e}")))?;

    if let Ok(tokens) = serde_json::from_str::<TokenSet>(&body) {
        return Ok(tokens);
    }

    // Token endpoint errors come back as {"error": ..., "error_description": ...}
    let reason = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?.as_str()?.to_string();
            Some(match v.get("error_description").and_then(Value::as_str) {
                Some(desc) => format!("{error}: {desc}"),
                None => error,
            })
        })
        .unwrap_or_else(|| format!("unexpected token response (HTTP {status})"));

    Err(Error::Auth(reason))
}
