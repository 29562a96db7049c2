//! Google OAuth 2.0 / `OpenID` Connect sign-in.
//!
//! Authorization-code flow: build the consent URL, exchange the returned code
//! for an access token, then read the verified e-mail from the `OpenID`
//! userinfo endpoint.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use nearby_core::{Email, EmailError};

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Provider endpoints used by the flow.
#[derive(Debug, Clone)]
struct Endpoints {
    authorize: String,
    token: String,
    userinfo: String,
}

/// Errors from the sign-in flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Userinfo request failed: {0}")]
    UserInfo(String),

    #[error("Provider reported an unverified e-mail")]
    UnverifiedEmail,

    #[error("Provider returned an invalid e-mail: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Identity returned by the provider after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub email: Email,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

/// Google OAuth client. Cheap to clone.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    inner: Arc<GoogleOAuthClientInner>,
}

struct GoogleOAuthClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    endpoints: Endpoints,
}

impl GoogleOAuthClient {
    #[must_use]
    pub fn new(config: &GoogleConfig) -> Self {
        Self::with_endpoints(
            config,
            Endpoints {
                authorize: AUTHORIZE_URL.to_string(),
                token: TOKEN_URL.to_string(),
                userinfo: USERINFO_URL.to_string(),
            },
        )
    }

    /// Create a client against a different provider root (e.g. a local stub)
    /// serving `/auth`, `/token` and `/userinfo`.
    #[must_use]
    pub fn with_base_url(config: &GoogleConfig, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self::with_endpoints(
            config,
            Endpoints {
                authorize: format!("{base_url}/auth"),
                token: format!("{base_url}/token"),
                userinfo: format!("{base_url}/userinfo"),
            },
        )
    }

    fn with_endpoints(config: &GoogleConfig, endpoints: Endpoints) -> Self {
        Self {
            inner: Arc::new(GoogleOAuthClientInner {
                client: reqwest::Client::new(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                endpoints,
            }),
        }
    }

    /// Build the consent-screen URL the visitor is redirected to.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String {
        format!(
            "{}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            state={}&\
            nonce={}&\
            prompt=select_account",
            self.inner.endpoints.authorize,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce)
        )
    }

    /// Exchange an authorization code and fetch the verified identity.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::TokenExchange` or `OAuthError::UserInfo` when the
    /// provider rejects a request, and `OAuthError::UnverifiedEmail` when the
    /// account's e-mail is missing or unverified.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleIdentity, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(&self.inner.endpoints.token)
            .form(&params)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(text.chars().take(500).collect()));
        }

        let token: TokenResponse = response.json().await?;

        let response = self
            .inner
            .client
            .get(&self.inner.endpoints.userinfo)
            .bearer_auth(&token.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::UserInfo(text.chars().take(500).collect()));
        }

        let info: UserInfoResponse = response.json().await?;
        identity_from_userinfo(info)
    }
}

fn identity_from_userinfo(info: UserInfoResponse) -> Result<GoogleIdentity, OAuthError> {
    let email = match info.email {
        Some(email) if info.email_verified => Email::parse(&email)?,
        _ => return Err(OAuthError::UnverifiedEmail),
    };

    Ok(GoogleIdentity {
        email,
        name: info.name.filter(|n| !n.trim().is_empty()),
        picture: info.picture,
    })
}

/// Generate a cryptographically secure random string for state and nonce.
#[must_use]
pub fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}
