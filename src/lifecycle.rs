use std::io::{BufRead, IsTerminal};
use std::path::Path;

use log::{debug, info, warn};

use crate::config::Credentials;
use crate::twitch::{
    extract_code, AuthClient, Result, TokenPair, TwitchApi, TwitchError, Validation,
};

/// Everything needed for a chat send. The sender is the broadcaster, so
/// one ID serves both fields of the send request.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub broadcaster_id: String,
}

/// Drives a credential record to a usable session: load → validate →
/// refresh or reauthorize → resolve broadcaster ID. Every token or ID
/// change is written back to the store before the next step runs.
pub struct Lifecycle {
    auth: AuthClient,
    helix_base: Option<String>,
}

impl Lifecycle {
    pub fn new(creds: &Credentials) -> Self {
        Self {
            auth: AuthClient::new(&creds.client_id, &creds.client_secret),
            helix_base: None,
        }
    }

    /// Redirect both API hosts at a mock server (tests)
    #[cfg(test)]
    fn with_base_urls(creds: &Credentials, base_url: &str) -> Self {
        Self {
            auth: AuthClient::new(&creds.client_id, &creds.client_secret)
                .with_base_url(base_url),
            helix_base: Some(base_url.to_string()),
        }
    }

    fn helix_client(&self, access_token: &str) -> TwitchApi {
        let api = TwitchApi::new(self.auth.client_id(), access_token);
        match &self.helix_base {
            Some(base) => api.with_base_url(base),
            None => api,
        }
    }

    /// Ensure a valid access token and broadcaster ID, persisting any
    /// changes, and return the ready-to-send session.
    pub async fn ensure_session<R: BufRead>(
        &self,
        creds: &mut Credentials,
        store_path: &Path,
        input: &mut R,
    ) -> Result<Session> {
        match creds.auth_token.clone() {
            None => {
                info!("No stored token, starting authorization");
                let pair = self.authorize(input).await?;
                self.persist_tokens(creds, store_path, pair)?;
            }
            Some(token) => match self.auth.validate(&token).await? {
                Validation::Valid { login, .. } => {
                    debug!("Stored token is valid for {}", login);
                }
                Validation::Invalid => {
                    info!("Stored token is invalid, attempting refresh");
                    self.refresh_or_reauthorize(creds, store_path, input).await?;
                }
                Validation::MissingScope => {
                    // A refresh keeps the old grant, so it cannot add the
                    // missing scope. Go straight to reauthorization.
                    warn!("Stored token lacks the chat-write scope, reauthorizing");
                    let pair = self.authorize(input).await?;
                    self.persist_tokens(creds, store_path, pair)?;
                }
            },
        }

        let access_token = creds
            .auth_token
            .clone()
            .ok_or_else(|| TwitchError::ConfigError("no access token after auth".to_string()))?;

        let broadcaster_id = match creds.broadcaster_id.clone() {
            Some(id) => {
                debug!("Using cached broadcaster ID {}", id);
                id
            }
            None => {
                let user = self.helix_client(&access_token).current_user().await?;
                info!("Resolved broadcaster ID {} ({})", user.id, user.login);
                creds.broadcaster_id = Some(user.id.clone());
                creds.to_file(store_path)?;
                user.id
            }
        };

        Ok(Session {
            access_token,
            broadcaster_id,
        })
    }

    /// Exactly one refresh attempt; anything short of a new, valid token
    /// falls back to the full authorization flow.
    async fn refresh_or_reauthorize<R: BufRead>(
        &self,
        creds: &mut Credentials,
        store_path: &Path,
        input: &mut R,
    ) -> Result<()> {
        if let Some(refresh_token) = creds.refresh_token.clone() {
            if let Some(pair) = self.auth.refresh(&refresh_token).await? {
                let access_token = pair.access_token.clone();
                self.persist_tokens(creds, store_path, pair)?;
                if let Validation::Valid { .. } = self.auth.validate(&access_token).await? {
                    info!("Token refreshed");
                    return Ok(());
                }
                warn!("Refreshed token did not validate, reauthorizing");
            }
        } else {
            debug!("No refresh token stored");
        }

        let pair = self.authorize(input).await?;
        self.persist_tokens(creds, store_path, pair)
    }

    /// Interactive authorization-code flow: open the consent URL, accept
    /// the pasted redirect URL, exchange the code for tokens.
    async fn authorize<R: BufRead>(&self, input: &mut R) -> Result<TokenPair> {
        let url = self.auth.build_authorize_url();
        println!("Open this URL in a browser and authorize the app:");
        println!("\n  {}\n", url);
        if std::io::stdin().is_terminal() && webbrowser::open(&url).is_ok() {
            println!("(opened in your default browser)");
        }
        println!("After authorizing you will land on a localhost URL that fails to load.");
        println!("Paste that full URL here and press enter:");

        let mut line = String::new();
        input.read_line(&mut line)?;
        let code = extract_code(line.trim()).ok_or(TwitchError::MissingAuthCode)?;

        self.auth.exchange_code(code).await
    }

    fn persist_tokens(
        &self,
        creds: &mut Credentials,
        store_path: &Path,
        pair: TokenPair,
    ) -> Result<()> {
        creds.set_tokens(pair.access_token, pair.refresh_token);
        creds.to_file(store_path)
    }
}
