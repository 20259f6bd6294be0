use serde::{Deserialize, Serialize};

use super::error::{Result, TwitchError};

const DEFAULT_ID_BASE: &str = "https://id.twitch.tv";

/// Scope needed to post chat messages via Helix
pub const REQUIRED_SCOPE: &str = "user:write:chat";

/// Redirect URI registered for the authorization-code flow. Nothing
/// listens there; the user pastes the resulting URL back into the CLI.
pub const REDIRECT_URI: &str = "http://localhost:3000";

/// Response from the token endpoint (exchange and refresh)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[allow(dead_code)] // Part of Twitch API response
    #[serde(default)]
    pub scope: Vec<String>,
    #[allow(dead_code)] // Part of Twitch API response
    pub expires_in: Option<u64>,
    #[allow(dead_code)] // Part of Twitch API response
    pub token_type: Option<String>,
}

/// A usable access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    client_id: Option<String>,
    login: Option<String>,
    user_id: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
}

/// Outcome of token introspection. Scope insufficiency is distinct from
/// invalidity: a live token that cannot post chat needs reauthorization,
/// not a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid { login: String, user_id: String },
    MissingScope,
    Invalid,
}

/// OAuth client for the Twitch identity endpoints
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl AuthClient {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_ID_BASE.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    /// Point the client at a different identity host (tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Validate an access token against the introspection endpoint
    ///
    /// A 401 or a response body without a `client_id` field both mean the
    /// token is dead. A live token without the chat-write scope comes back
    /// as `MissingScope` so the caller can reauthorize instead of refresh.
    pub async fn validate(&self, access_token: &str) -> Result<Validation> {
        let response = self
            .client
            .get(format!("{}/oauth2/validate", self.base_url))
            .header("Authorization", format!("OAuth {}", access_token))
            .send()
            .await?;

        if response.status().as_u16() == 401 {
            return Ok(Validation::Invalid);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TwitchError::HttpError(format!(
                "Token validation failed: HTTP {} - {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let parsed: ValidateResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(Validation::Invalid),
        };

        if parsed.client_id.is_none() {
            return Ok(Validation::Invalid);
        }
        if !parsed.scopes.iter().any(|s| s == REQUIRED_SCOPE) {
            log::warn!("Token is valid but lacks the {} scope", REQUIRED_SCOPE);
            return Ok(Validation::MissingScope);
        }

        match (parsed.login, parsed.user_id) {
            (Some(login), Some(user_id)) => Ok(Validation::Valid { login, user_id }),
            _ => Ok(Validation::Invalid),
        }
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// Returns `None` when the provider refuses the refresh, so the caller
    /// can fall back to the full authorization flow.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .client
            .post(format!("{}/oauth2/token", self.base_url))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::warn!("Token refresh failed: HTTP {} - {}", status, error_text);
            return Ok(None);
        }

        let token_response = response.json::<TokenResponse>().await?;
        match (token_response.access_token, token_response.refresh_token) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(TokenPair {
                access_token,
                refresh_token,
            })),
            _ => {
                log::warn!("Token refresh returned no access token");
                Ok(None)
            }
        }
    }

    /// Exchange an authorization code for a token pair
    pub async fn exchange_code(&self, code: &str) -> Result<TokenPair> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
        ];

        let response = self
            .client
            .post(format!("{}/oauth2/token", self.base_url))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TwitchError::TokenExchange(format!(
                "HTTP {} - {}",
                status, error_text
            )));
        }

        let token_response = response.json::<TokenResponse>().await?;
        match (token_response.access_token, token_response.refresh_token) {
            (Some(access_token), Some(refresh_token)) => Ok(TokenPair {
                access_token,
                refresh_token,
            }),
            _ => Err(TwitchError::TokenExchange(
                "no access token in response".to_string(),
            )),
        }
    }

    /// Build the authorization URL the user opens in a browser
    pub fn build_authorize_url(&self) -> String {
        format!(
            "{}/oauth2/authorize?response_type=code&client_id={}&redirect_uri={}&scope={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(REDIRECT_URI),
            urlencoding::encode(REQUIRED_SCOPE),
        )
    }
}

/// Pull the `code` query parameter out of a pasted redirect URL
pub fn extract_code(redirect_url: &str) -> Option<&str> {
    let (_, rest) = redirect_url.split_once("code=")?;
    let code = rest.split('&').next().unwrap_or(rest);
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}
