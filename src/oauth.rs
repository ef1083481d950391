//! GitHub OAuth: authorize URL and code → token exchange

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{HttpConfig, OAuthConfig};

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("OAuth app not configured. Set GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET")]
    NotConfigured,

    /// `error_description` (or `error`) reported by the provider
    #[error("{0}")]
    Provider(String),

    #[error("Token response did not contain an access token")]
    MissingToken,

    #[error("Failed to fetch user profile: HTTP {0}")]
    UserFetch(u16),

    #[error("OAuth request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to build authorize URL: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}

pub type Result<T> = std::result::Result<T, OAuthError>;

/// Successful exchange: the token plus the raw user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenExchange {
    pub access_token: String,
    pub user: serde_json::Value,
}

impl TokenExchange {
    pub fn login(&self) -> Option<&str> {
        self.user.get("login").and_then(|v| v.as_str())
    }
}

/// Anything that can turn an authorization code into a token
pub trait CodeExchange {
    /// `origin` is the caller's Origin header, used when no redirect URI is configured
    fn exchange(&self, code: &str, origin: Option<&str>) -> Result<TokenExchange>;
}

/// URL that starts the browser login
pub fn authorize_url(config: &OAuthConfig) -> Result<String> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or(OAuthError::NotConfigured)?;

    let mut params = vec![("client_id", client_id)];
    if let Some(uri) = config.redirect_uri.as_deref() {
        params.push(("redirect_uri", uri));
    }
    params.push(("scope", config.scope.as_str()));

    Ok(format!(
        "{}?{}",
        config.authorize_url,
        serde_urlencoded::to_string(&params)?
    ))
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanges codes against GitHub's token endpoint
pub struct OAuthExchanger {
    http: Client,
    config: OAuthConfig,
    api_base: String,
}

impl OAuthExchanger {
    pub fn new(config: OAuthConfig, api_base: &str, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http: client,
            config,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
        ) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(OAuthError::NotConfigured),
        }
    }

    fn fetch_user(&self, token: &str) -> Result<serde_json::Value> {
        let resp = self
            .http
            .get(format!("{}/user", self.api_base))
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .send()?;
        if !resp.status().is_success() {
            return Err(OAuthError::UserFetch(resp.status().as_u16()));
        }
        Ok(resp.json()?)
    }
}

impl CodeExchange for OAuthExchanger {
    fn exchange(&self, code: &str, origin: Option<&str>) -> Result<TokenExchange> {
        let (client_id, client_secret) = self.credentials()?;

        let resp = self
            .http
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .json(&TokenRequest {
                client_id,
                client_secret,
                code,
                redirect_uri: self.config.redirect_uri.as_deref().or(origin),
            })
            .send()?;
        let token: TokenResponse = resp.json()?;

        if let Some(error) = token.error {
            return Err(OAuthError::Provider(token.error_description.unwrap_or(error)));
        }
        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(OAuthError::MissingToken)?;

        let user = self.fetch_user(&access_token)?;
        log::info!(
            "exchanged OAuth code for {}",
            user.get("login").and_then(|v| v.as_str()).unwrap_or("unknown user")
        );
        Ok(TokenExchange { access_token, user })
    }
}
