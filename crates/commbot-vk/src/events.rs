// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed chat events decoded from Bots Long Poll updates.
//!
//! Only `message_new` updates matter to the bot. A message either carries
//! text (a potential command) or a service `action` describing a change to
//! the chat, such as a member joining or leaving.

use serde::Deserialize;
use tracing::debug;

/// A change to the chat announced by a service message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInfoChange {
    TitleChanged,
    PhotoChanged,
    AdminAdded,
    PinnedChanged,
    UserJoined,
    UserLeft,
    UserKicked,
    AdminRemoved,
}

impl ChatInfoChange {
    /// Changes in wire ordinal order.
    const ORDINALS: [ChatInfoChange; 8] = [
        ChatInfoChange::TitleChanged,
        ChatInfoChange::PhotoChanged,
        ChatInfoChange::AdminAdded,
        ChatInfoChange::PinnedChanged,
        ChatInfoChange::UserJoined,
        ChatInfoChange::UserLeft,
        ChatInfoChange::UserKicked,
        ChatInfoChange::AdminRemoved,
    ];

    /// Maps the numeric chat-info code. Codes are 1-based on the wire, so the
    /// code is shifted down by one before the ordinal lookup.
    pub fn from_type_id(type_id: i64) -> Option<Self> {
        let ordinal = usize::try_from(type_id.checked_sub(1)?).ok()?;
        Self::ORDINALS.get(ordinal).copied()
    }

    /// Maps the string `action.type` of a bot message.
    ///
    /// `chat_kick_user` is a voluntary leave when the actor is the member.
    pub fn from_action(action: &str, actor_id: i64, member_id: Option<i64>) -> Option<Self> {
        match action {
            "chat_title_update" => Some(Self::TitleChanged),
            "chat_photo_update" | "chat_photo_remove" => Some(Self::PhotoChanged),
            "chat_pin_message" | "chat_unpin_message" => Some(Self::PinnedChanged),
            "chat_invite_user" | "chat_invite_user_by_link" => Some(Self::UserJoined),
            "chat_kick_user" if member_id == Some(actor_id) => Some(Self::UserLeft),
            "chat_kick_user" => Some(Self::UserKicked),
            _ => None,
        }
    }
}

/// An event the router acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A text message from a user.
    Message {
        peer_id: i64,
        from_id: i64,
        text: String,
    },
    /// A user entered the chat.
    MemberJoined { peer_id: i64, user_id: i64 },
    /// A user left or was removed from the chat.
    MemberLeft {
        peer_id: i64,
        user_id: i64,
        kicked: bool,
    },
    /// Any other chat-info change.
    InfoChanged {
        peer_id: i64,
        change: ChatInfoChange,
    },
}

impl ChatEvent {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::Message { .. } => "message",
            ChatEvent::MemberJoined { .. } => "member_joined",
            ChatEvent::MemberLeft { .. } => "member_left",
            ChatEvent::InfoChanged { .. } => "info_changed",
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateDto {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MessageDto {
    peer_id: i64,
    from_id: i64,
    #[serde(default)]
    text: String,
    action: Option<ActionDto>,
}

#[derive(Debug, Deserialize)]
struct ActionDto {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    /// Older payloads send a numeric code instead of the string type.
    type_id: Option<i64>,
    member_id: Option<i64>,
}

/// Decodes one long poll update. Unknown or malformed updates yield `None`.
pub fn parse_update(update: &serde_json::Value) -> Option<ChatEvent> {
    let update: UpdateDto = serde_json::from_value(update.clone()).ok()?;
    if update.kind != "message_new" {
        debug!(kind = %update.kind, "ignoring update");
        return None;
    }

    // Newer API versions nest the message under `object.message`.
    let raw = update.object.get("message").unwrap_or(&update.object);
    let message: MessageDto = match serde_json::from_value(raw.clone()) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "malformed message_new update");
            return None;
        }
    };

    let Some(action) = message.action else {
        return Some(ChatEvent::Message {
            peer_id: message.peer_id,
            from_id: message.from_id,
            text: message.text,
        });
    };

    let change = match (action.kind.as_deref(), action.type_id) {
        (Some(kind), _) => ChatInfoChange::from_action(kind, message.from_id, action.member_id),
        (None, Some(type_id)) => ChatInfoChange::from_type_id(type_id),
        (None, None) => None,
    }?;
    let user_id = action.member_id.unwrap_or(message.from_id);

    Some(match change {
        ChatInfoChange::UserJoined => ChatEvent::MemberJoined {
            peer_id: message.peer_id,
            user_id,
        },
        ChatInfoChange::UserLeft | ChatInfoChange::UserKicked => ChatEvent::MemberLeft {
            peer_id: message.peer_id,
            user_id,
            kicked: change == ChatInfoChange::UserKicked,
        },
        change => ChatEvent::InfoChanged {
            peer_id: message.peer_id,
            change,
        },
    })
}
