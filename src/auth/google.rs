use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::OAuthError;
use crate::config::Config;

/// Scopes requested on the consent screen.
pub const GOOGLE_SCOPES: &str = "profile email";

/// Profile relayed to the opener window.
///
/// Field names follow what the browser client stores in local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleUserInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<GoogleUserInfo> for UserProfile {
    fn from(info: GoogleUserInfo) -> Self {
        let email = info.email.unwrap_or_default();
        let display_name = info
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| email.split('@').next().filter(|s| !s.is_empty()).map(String::from))
            .unwrap_or_else(|| "Google User".to_string());

        Self {
            display_name,
            photo_url: info.picture.unwrap_or_default(),
            email,
        }
    }
}

/// Google OAuth 2.0 client for the authorization-code flow.
#[derive(Clone)]
pub struct GoogleOAuth {
    http: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuth {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("Failed to create OAuth HTTP client")?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_url: config.google_redirect_url.clone(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            userinfo_url: config.google_userinfo_url.clone(),
        })
    }

    /// Build the consent URL the browser is redirected to.
    ///
    /// A missing client id is not an error here; Google rejects the request
    /// and shows its own error page.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is malformed.
    pub fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let client_id = self.client_id.as_deref().unwrap_or_else(|| {
            warn!("GOOGLE_CLIENT_ID is unset; the identity provider will reject this login");
            ""
        });

        let url = url::Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", client_id),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| OAuthError::Internal(format!("invalid authorization URL: {e}")))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for the user's profile.
    ///
    /// This performs:
    /// 1. POST to the token URL to exchange the code for an access token
    /// 2. GET to the userinfo URL with that token
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails or returns an unusable body.
    pub async fn exchange_code(&self, code: &str) -> Result<UserProfile, OAuthError> {
        let access_token = self.request_access_token(code).await?;
        let profile = self.fetch_profile(&access_token).await?;
        info!(email = %profile.email, "Google sign-in completed");
        Ok(profile)
    }

    async fn request_access_token(&self, code: &str) -> Result<String, OAuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or(OAuthError::NotConfigured("GOOGLE_CLIENT_ID"))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or(OAuthError::NotConfigured("GOOGLE_CLIENT_SECRET"))?;

        debug!(url = %self.token_url, "Exchanging authorization code");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::TokenExchange(format!("unreadable token response: {e}")))?;

        Ok(tokens.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, OAuthError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Profile(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(OAuthError::Profile(format!(
                "userinfo endpoint returned {status}"
            )));
        }

        let info: GoogleUserInfo = response
            .json()
            .await
            .map_err(|e| OAuthError::Profile(format!("unreadable userinfo response: {e}")))?;

        Ok(info.into())
    }
}
