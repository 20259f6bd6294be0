use serde::Deserialize;
use serde_json::json;

use super::error::{Result, TwitchError};

const DEFAULT_HELIX_BASE: &str = "https://api.twitch.tv";

/// Response from sending a chat message
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    pub data: Vec<SendMessageData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageData {
    pub message_id: String,
    pub is_sent: bool,
    pub drop_reason: Option<DropReason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DropReason {
    pub code: String,
    pub message: String,
}

/// User info response
#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    pub data: Vec<UserData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub id: String,
    pub login: String,
    #[allow(dead_code)] // Part of Twitch API response
    pub display_name: String,
}

/// Outcome of a chat send. The API can accept the request (2xx) and
/// still drop the message, so the drop reason is surfaced separately.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Sent { message_id: String },
    Dropped { code: String, message: String },
}

/// Twitch Helix API client for HTTP operations
pub struct TwitchApi {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    access_token: String,
}

impl TwitchApi {
    pub fn new(client_id: &str, access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_HELIX_BASE.to_string(),
            client_id: client_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Point the client at a different Helix host (tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Get the authenticated user (broadcaster-ID discovery)
    pub async fn current_user(&self) -> Result<UserData> {
        let response = self
            .client
            .get(format!("{}/helix/users", self.base_url))
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Client-Id", &self.client_id)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TwitchError::BroadcasterLookup(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let users_response = response.json::<UsersResponse>().await?;
        users_response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| TwitchError::BroadcasterLookup("no user in response".to_string()))
    }

    /// Send a chat message
    ///
    /// HTTP 200 and 204 both count as success; anything else surfaces the
    /// status and response body.
    pub async fn send_message(
        &self,
        broadcaster_id: &str,
        sender_id: &str,
        message: &str,
    ) -> Result<SendOutcome> {
        let body = json!({
            "broadcaster_id": broadcaster_id,
            "sender_id": sender_id,
            "message": message
        });

        let response = self
            .client
            .post(format!("{}/helix/chat/messages", self.base_url))
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Client-Id", &self.client_id)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TwitchError::SendFailed {
                status: status.as_u16(),
                body: error_text,
            });
        }

        // 204 carries no body
        if status.as_u16() == 204 {
            return Ok(SendOutcome::Sent {
                message_id: String::new(),
            });
        }

        let send_response = response.json::<SendMessageResponse>().await?;
        match send_response.data.into_iter().next() {
            Some(data) if data.is_sent => Ok(SendOutcome::Sent {
                message_id: data.message_id,
            }),
            Some(data) => {
                let reason = data.drop_reason.unwrap_or(DropReason {
                    code: "unknown".to_string(),
                    message: "message was not sent".to_string(),
                });
                Ok(SendOutcome::Dropped {
                    code: reason.code,
                    message: reason.message,
                })
            }
            None => Ok(SendOutcome::Sent {
                message_id: String::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_current_user_returns_first_entry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .and(header("Client-Id", "cid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": "141981764",
                    "login": "somestreamer",
                    "display_name": "SomeStreamer"
                }]
            })))
            .mount(&mock_server)
            .await;

        let api = TwitchApi::new("cid", "token").with_base_url(&mock_server.uri());
        let user = api.current_user().await.unwrap();
        assert_eq!(user.id, "141981764");
        assert_eq!(user.login, "somestreamer");
    }

    #[tokio::test]
    async fn test_current_user_empty_data_is_lookup_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&mock_server)
            .await;

        let api = TwitchApi::new("cid", "token").with_base_url(&mock_server.uri());
        let err = api.current_user().await.unwrap_err();
        assert!(matches!(err, TwitchError::BroadcasterLookup(_)));
    }

    #[tokio::test]
    async fn test_send_message_204_is_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/helix/chat/messages"))
            .and(body_json(serde_json::json!({
                "broadcaster_id": "123",
                "sender_id": "123",
                "message": "hello chat"
            })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let api = TwitchApi::new("cid", "token").with_base_url(&mock_server.uri());
        let outcome = api.send_message("123", "123", "hello chat").await.unwrap();
        assert!(matches!(outcome, SendOutcome::Sent { .. }));
    }

    #[tokio::test]
    async fn test_send_message_400_surfaces_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/helix/chat/messages"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":"Bad Request","message":"Missing scope"}"#),
            )
            .mount(&mock_server)
            .await;

        let api = TwitchApi::new("cid", "token").with_base_url(&mock_server.uri());
        let err = api.send_message("123", "123", "hi").await.unwrap_err();
        match err {
            TwitchError::SendFailed { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Missing scope"));
            }
            other => panic!("expected SendFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_message_dropped_reason() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/helix/chat/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "message_id": "",
                    "is_sent": false,
                    "drop_reason": {
                        "code": "followers_only_mode",
                        "message": "The message was rejected"
                    }
                }]
            })))
            .mount(&mock_server)
            .await;

        let api = TwitchApi::new("cid", "token").with_base_url(&mock_server.uri());
        let outcome = api.send_message("123", "123", "hi").await.unwrap();
        match outcome {
            SendOutcome::Dropped { code, .. } => assert_eq!(code, "followers_only_mode"),
            other => panic!("expected Dropped, got {:?}", other),
        }
    }
}
