// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the VK API and the Bots Long Poll API.

use serde::Deserialize;

use commbot_core::{MediaKind, PostAttachment, UserProfile, WallPage, WallPost};

/// Every API answer carries either `response` or `error`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub response: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error_code: i64,
    pub error_msg: String,
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub screen_name: Option<String>,
}

impl From<UserDto> for UserProfile {
    fn from(user: UserDto) -> Self {
        let screen_name = user
            .screen_name
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("id{}", user.id));
        UserProfile {
            id: user.id,
            screen_name,
            first_name: user.first_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WallDto {
    pub count: u64,
    #[serde(default)]
    pub items: Vec<PostDto>,
}

#[derive(Debug, Deserialize)]
pub struct PostDto {
    pub id: i64,
    #[serde(default)]
    pub attachments: Vec<AttachmentDto>,
}

/// A post attachment: `type` names which of the media fields is set.
#[derive(Debug, Deserialize)]
pub struct AttachmentDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub photo: Option<MediaDto>,
    pub audio: Option<MediaDto>,
    pub video: Option<MediaDto>,
    pub doc: Option<MediaDto>,
}

#[derive(Debug, Deserialize)]
pub struct MediaDto {
    pub id: i64,
    pub owner_id: i64,
    pub access_key: Option<String>,
    /// `1` when a video may be reposted. Absent for other kinds.
    pub can_repost: Option<u8>,
}

impl AttachmentDto {
    /// Converts attachments of the four supported kinds; links, polls and
    /// the like yield `None`.
    pub fn into_post_attachment(self) -> Option<PostAttachment> {
        let (kind, media) = match self.kind.as_str() {
            "photo" => (MediaKind::Photo, self.photo?),
            "audio" => (MediaKind::Audio, self.audio?),
            "video" => (MediaKind::Video, self.video?),
            "doc" => (MediaKind::Document, self.doc?),
            _ => return None,
        };
        Some(PostAttachment {
            kind,
            owner_id: media.owner_id,
            id: media.id,
            access_key: media.access_key,
            can_repost: media.can_repost.map(|flag| flag == 1),
        })
    }
}

impl From<WallDto> for WallPage {
    fn from(wall: WallDto) -> Self {
        WallPage {
            count: wall.count,
            items: wall
                .items
                .into_iter()
                .map(|post| WallPost {
                    id: post.id,
                    attachments: post
                        .attachments
                        .into_iter()
                        .filter_map(AttachmentDto::into_post_attachment)
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationMembersDto {
    #[serde(default)]
    pub items: Vec<MemberDto>,
}

#[derive(Debug, Deserialize)]
pub struct MemberDto {
    pub member_id: i64,
}

/// Connection data for the Bots Long Poll server.
#[derive(Debug, Clone, Deserialize)]
pub struct LongPollServer {
    pub key: String,
    pub server: String,
    pub ts: String,
}

/// One `a_check` answer.
#[derive(Debug, Deserialize)]
pub struct LongPollResponse {
    pub ts: Option<serde_json::Value>,
    #[serde(default)]
    pub updates: Vec<serde_json::Value>,
    pub failed: Option<u8>,
}

impl LongPollResponse {
    /// `ts` as a string; the server sends either a number or a string.
    pub fn ts_string(&self) -> Option<String> {
        match self.ts.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
