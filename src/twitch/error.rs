use std::fmt;

/// Errors that can occur during Twitch operations
#[derive(Debug)]
pub enum TwitchError {
    /// HTTP request error
    HttpError(String),

    /// JSON parsing error
    JsonError(String),

    /// Filesystem error (credential store)
    IoError(String),

    /// Credential store missing or incomplete
    ConfigError(String),

    /// Pasted redirect URL contained no `code` parameter
    MissingAuthCode,

    /// Token endpoint returned no access token for an authorization code
    TokenExchange(String),

    /// User lookup returned no broadcaster ID
    BroadcasterLookup(String),

    /// Chat send rejected by the API
    SendFailed { status: u16, body: String },
}

impl fmt::Display for TwitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwitchError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            TwitchError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            TwitchError::IoError(msg) => write!(f, "I/O error: {}", msg),
            TwitchError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            TwitchError::MissingAuthCode => {
                write!(f, "No authorization code found in the pasted URL")
            }
            TwitchError::TokenExchange(msg) => write!(f, "Token exchange failed: {}", msg),
            TwitchError::BroadcasterLookup(msg) => {
                write!(f, "Broadcaster lookup failed: {}", msg)
            }
            TwitchError::SendFailed { status, body } => {
                write!(f, "Message send failed: HTTP {} - {}", status, body)
            }
        }
    }
}

impl std::error::Error for TwitchError {}

impl From<serde_json::Error> for TwitchError {
    fn from(err: serde_json::Error) -> Self {
        TwitchError::JsonError(err.to_string())
    }
}

impl From<reqwest::Error> for TwitchError {
    fn from(err: reqwest::Error) -> Self {
        TwitchError::HttpError(err.to_string())
    }
}

impl From<std::io::Error> for TwitchError {
    fn from(err: std::io::Error) -> Self {
        TwitchError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TwitchError>;
