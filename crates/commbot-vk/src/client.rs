// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the VK API.
//!
//! Provides [`VkClient`], which signs every call with the community token and
//! API version, posts parameters form-encoded, and unwraps the VK
//! `response`/`error` envelope. Chat removals use the admin user token.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use commbot_config::model::VkConfig;
use commbot_core::CommbotError;
use commbot_core::traits::adapter::PluginAdapter;
use commbot_core::traits::platform::{MAX_WALL_PAGE, PlatformAdapter};
use commbot_core::types::{AdapterType, HealthStatus, OutboundMessage, UserProfile, WallPage};

use crate::types::{
    ApiEnvelope, ConversationMembersDto, LongPollResponse, LongPollServer, UserDto, WallDto,
};

/// Peer ids of group chats start above this offset.
pub const CHAT_PEER_OFFSET: i64 = 2_000_000_000;

/// VK API client implementing [`PlatformAdapter`].
#[derive(Debug, Clone)]
pub struct VkClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    community_token: String,
    admin_token: Option<String>,
}

impl VkClient {
    /// Creates a client for the community bot `token`.
    pub fn new(
        token: impl Into<String>,
        base_url: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self, CommbotError> {
        let community_token = token.into();
        if community_token.is_empty() {
            return Err(CommbotError::Config(
                "vk.community_bot_token cannot be empty".into(),
            ));
        }

        let client = reqwest::Client::builder()
            // Long poll requests hold the connection for up to 90 seconds.
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| CommbotError::Platform {
                method: "client".into(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            community_token,
            admin_token: None,
        })
    }

    /// Creates a client from the `[vk]` configuration section.
    pub fn from_config(config: &VkConfig) -> Result<Self, CommbotError> {
        let token = config.community_bot_token.as_deref().ok_or_else(|| {
            CommbotError::Config("vk.community_bot_token is required".into())
        })?;
        let client = Self::new(token, &config.api_base_url, &config.api_version)?;
        Ok(match config.admin_user_token.as_deref() {
            Some(admin) if !admin.is_empty() => client.with_admin_token(admin),
            _ => client,
        })
    }

    /// Sets the admin user token used for chat removals.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Whether chat removals are possible.
    pub fn can_remove_users(&self) -> bool {
        self.admin_token.is_some()
    }

    /// Calls `method` with the community token.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, CommbotError> {
        self.call_with_token(method, params, &self.community_token)
            .await
    }

    async fn call_with_token<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
        token: &str,
    ) -> Result<T, CommbotError> {
        let url = format!("{}/{}", self.base_url, method);
        let mut form: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        form.push(("access_token", token));
        form.push(("v", self.api_version.as_str()));

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;

        let status = response.status();
        debug!(method, status = %status, "VK API response received");
        if !status.is_success() {
            return Err(CommbotError::platform(method, format!("HTTP {status}")));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| CommbotError::Platform {
                method: method.to_string(),
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if let Some(error) = envelope.error {
            return Err(CommbotError::platform(
                method,
                format!("VK error {}: {}", error.error_code, error.error_msg),
            ));
        }
        envelope
            .response
            .ok_or_else(|| CommbotError::platform(method, "response field missing"))
    }

    /// Fetches Bots Long Poll connection data for the community.
    pub async fn long_poll_server(&self, group_id: i64) -> Result<LongPollServer, CommbotError> {
        self.call(
            "groups.getLongPollServer",
            &[("group_id", group_id.to_string())],
        )
        .await
    }

    /// Waits up to `wait` seconds for events after `ts`.
    pub async fn long_poll(
        &self,
        server: &LongPollServer,
        ts: &str,
        wait: u64,
    ) -> Result<LongPollResponse, CommbotError> {
        let method = "long_poll";
        let wait = wait.to_string();
        let response = self
            .client
            .get(&server.server)
            .query(&[
                ("act", "a_check"),
                ("key", server.key.as_str()),
                ("ts", ts),
                ("wait", wait.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommbotError::platform(method, format!("HTTP {status}")));
        }
        response.json().await.map_err(|e| CommbotError::Platform {
            method: method.to_string(),
            message: format!("failed to parse long poll response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

fn transport_error(method: &str, e: reqwest::Error) -> CommbotError {
    CommbotError::Platform {
        method: method.to_string(),
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// `wall.get` addresses walls by numeric `owner_id` or by short name.
fn wall_owner_param(domain: &str) -> (&'static str, String) {
    match domain.parse::<i64>() {
        Ok(id) => ("owner_id", id.to_string()),
        Err(_) => ("domain", domain.to_string()),
    }
}

#[async_trait]
impl PluginAdapter for VkClient {
    fn name(&self) -> &str {
        "vk"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Platform
    }

    async fn health_check(&self) -> Result<HealthStatus, CommbotError> {
        match self.call::<serde_json::Value>("groups.getById", &[]).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("VK API unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl PlatformAdapter for VkClient {
    async fn user_profile(&self, user_id: i64) -> Result<UserProfile, CommbotError> {
        let users: Vec<UserDto> = self
            .call(
                "users.get",
                &[
                    ("user_ids", user_id.to_string()),
                    ("fields", "screen_name".to_string()),
                ],
            )
            .await?;
        users
            .into_iter()
            .next()
            .map(UserProfile::from)
            .ok_or_else(|| CommbotError::platform("users.get", format!("user {user_id} not found")))
    }

    async fn wall_get(
        &self,
        domain: &str,
        count: u32,
        offset: u64,
    ) -> Result<WallPage, CommbotError> {
        let wall: WallDto = self
            .call(
                "wall.get",
                &[
                    wall_owner_param(domain),
                    ("count", count.min(MAX_WALL_PAGE).to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;
        Ok(WallPage::from(wall))
    }

    async fn send_message(&self, msg: OutboundMessage) -> Result<i64, CommbotError> {
        let mut params = vec![
            ("peer_id", msg.peer_id.to_string()),
            ("random_id", msg.random_id.to_string()),
        ];
        if let Some(message) = msg.message {
            params.push(("message", message));
        }
        if let Some(attachment) = msg.attachment {
            params.push(("attachment", attachment));
        }
        self.call("messages.send", &params).await
    }

    async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, CommbotError> {
        let member: u8 = self
            .call(
                "groups.isMember",
                &[
                    ("group_id", group_id.to_string()),
                    ("user_id", user_id.to_string()),
                ],
            )
            .await?;
        Ok(member == 1)
    }

    async fn chat_members(&self, peer_id: i64) -> Result<Vec<i64>, CommbotError> {
        let members: ConversationMembersDto = self
            .call(
                "messages.getConversationMembers",
                &[("peer_id", peer_id.to_string())],
            )
            .await?;
        Ok(members
            .items
            .into_iter()
            .map(|m| m.member_id)
            .filter(|id| *id > 0)
            .collect())
    }

    async fn remove_chat_user(&self, chat_id: i64, user_id: i64) -> Result<(), CommbotError> {
        let Some(token) = self.admin_token.as_deref() else {
            return Err(CommbotError::Config(
                "vk.admin_user_token is required to remove chat users".into(),
            ));
        };
        let _: i64 = self
            .call_with_token(
                "messages.removeChatUser",
                &[
                    ("chat_id", chat_id.to_string()),
                    ("member_id", user_id.to_string()),
                ],
                token,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VkClient {
        VkClient::new("group-token", server.uri(), "5.199").unwrap()
    }

    #[tokio::test]
    async fn user_profile_reads_first_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users.get"))
            .and(body_string_contains("user_ids=5"))
            .and(body_string_contains("fields=screen_name"))
            .and(body_string_contains("access_token=group-token"))
            .and(body_string_contains("v=5.199"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": [{"id": 5, "first_name": "Pavel", "screen_name": "durov"}]
            })))
            .mount(&server)
            .await;

        let profile = client(&server).user_profile(5).await.unwrap();
        assert_eq!(profile.screen_name, "durov");
        assert_eq!(profile.first_name, "Pavel");
    }

    #[tokio::test]
    async fn api_errors_become_platform_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wall.get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"error_code": 15, "error_msg": "Access denied: wall is disabled"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).wall_get("closed_club", 100, 0).await.unwrap_err();
        match err {
            CommbotError::Platform { method, message, .. } => {
                assert_eq!(method, "wall.get");
                assert!(message.contains("15"));
                assert!(message.contains("wall is disabled"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn wall_get_uses_domain_or_owner_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wall.get"))
            .and(body_string_contains("domain=music_club"))
            .and(body_string_contains("offset=40"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"count": 300, "items": [
                    {"id": 1, "attachments": [{"type": "audio", "audio": {"id": 2, "owner_id": -9}}]}
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/wall.get"))
            .and(body_string_contains("owner_id=-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"count": 3, "items": []}
            })))
            .mount(&server)
            .await;

        let vk = client(&server);
        let page = vk.wall_get("music_club", 100, 40).await.unwrap();
        assert_eq!(page.count, 300);
        assert_eq!(page.items[0].attachments[0].to_attachment().render(), "audio-9_2");
        assert_eq!(vk.wall_count("-9").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn send_message_posts_attachment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages.send"))
            .and(body_string_contains("peer_id=2000000001"))
            .and(body_string_contains("attachment=audio-1_2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": 777})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .send_message(OutboundMessage {
                peer_id: 2_000_000_001,
                random_id: 3,
                message: None,
                attachment: Some("audio-1_2".into()),
            })
            .await
            .unwrap();
        assert_eq!(id, 777);
    }

    #[tokio::test]
    async fn chat_members_skip_communities() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages.getConversationMembers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"items": [{"member_id": 1}, {"member_id": -5}, {"member_id": 2}]}
            })))
            .mount(&server)
            .await;

        let members = client(&server).chat_members(2_000_000_001).await.unwrap();
        assert_eq!(members, vec![1, 2]);
    }

    #[tokio::test]
    async fn removal_needs_admin_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages.removeChatUser"))
            .and(body_string_contains("access_token=admin-token"))
            .and(body_string_contains("member_id=4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": 1})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let vk = client(&server);
        assert!(matches!(
            vk.remove_chat_user(1, 4).await,
            Err(CommbotError::Config(_))
        ));
        vk.with_admin_token("admin-token")
            .remove_chat_user(1, 4)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn is_member_reads_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/groups.isMember"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": 0})),
            )
            .mount(&server)
            .await;

        assert!(!client(&server).is_member(1, 2).await.unwrap());
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(VkClient::new("", "https://api.vk.com/method", "5.199").is_err());
    }
}
