/// Twitch OAuth and Helix API integration
///
/// Two HTTP clients: `AuthClient` talks to the identity endpoints
/// (introspection, refresh, authorization-code exchange) and `TwitchApi`
/// talks to Helix (user lookup, chat send). Both take injectable base
/// URLs so tests can point them at a mock server.
mod api;
mod auth;
mod error;

// Re-export public types
pub use api::{SendOutcome, TwitchApi, UserData};
pub use auth::{extract_code, AuthClient, TokenPair, Validation, REDIRECT_URI, REQUIRED_SCOPE};
pub use error::{Result, TwitchError};
