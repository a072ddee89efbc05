// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Social platform API used by the content core and the chat handlers.

use async_trait::async_trait;

use crate::error::CommbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{OutboundMessage, UserProfile, WallPage};

/// Largest page `wall_get` may request.
pub const MAX_WALL_PAGE: u32 = 100;

/// Adapter for the social platform hosting the community chat.
#[async_trait]
pub trait PlatformAdapter: PluginAdapter {
    /// Resolves a user's display profile.
    async fn user_profile(&self, user_id: i64) -> Result<UserProfile, CommbotError>;

    /// Fetches up to `count` (at most [`MAX_WALL_PAGE`]) posts starting at `offset`.
    async fn wall_get(&self, domain: &str, count: u32, offset: u64)
        -> Result<WallPage, CommbotError>;

    /// Total number of posts on a community wall.
    async fn wall_count(&self, domain: &str) -> Result<u64, CommbotError> {
        Ok(self.wall_get(domain, 1, 0).await?.count)
    }

    /// Sends a message and returns the platform message id.
    async fn send_message(&self, msg: OutboundMessage) -> Result<i64, CommbotError>;

    /// Whether `user_id` is a member of the community `group_id`.
    async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, CommbotError>;

    /// Lists member ids of a chat. Negative ids (communities) are excluded.
    async fn chat_members(&self, peer_id: i64) -> Result<Vec<i64>, CommbotError>;

    /// Removes a user from a chat.
    async fn remove_chat_user(&self, chat_id: i64, user_id: i64) -> Result<(), CommbotError>;
}
