// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message assembly.
//!
//! Turns a phrase, the requester's profile and an optional collected
//! attachment into the message handed to the platform.

use commbot_core::types::USERNAME_PLACEHOLDER;
use commbot_core::{Attachment, MediaKind, OutboundMessage, Phrase, UserProfile};

/// How users are addressed in outgoing messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageStyle {
    /// Render `%username%` as `@screen_name (first_name)`.
    pub use_first_name: bool,
}

impl MessageStyle {
    /// The mention substituted for `%username%`.
    pub fn mention(&self, profile: &UserProfile) -> String {
        if self.use_first_name {
            format!("@{} ({})", profile.screen_name, profile.first_name)
        } else {
            format!("@{}", profile.screen_name)
        }
    }

    /// Addresses `text` to the user: templated texts get the mention in place,
    /// others get `@screen_name, ` and a blank line in front.
    pub fn personalize(&self, text: &str, profile: &UserProfile) -> String {
        if text.contains(USERNAME_PLACEHOLDER) {
            text.replace(USERNAME_PLACEHOLDER, &self.mention(profile))
        } else {
            format!("@{}, \n\n{}", profile.screen_name, text)
        }
    }

    /// Builds a message from an optional phrase and an optional collected
    /// attachment.
    ///
    /// Without a phrase the body is only the user's mention. The collected
    /// attachment comes first, followed by the phrase's own audio and gif.
    pub fn compose(
        &self,
        peer_id: i64,
        profile: &UserProfile,
        phrase: Option<&Phrase>,
        content: Option<&Attachment>,
    ) -> OutboundMessage {
        let message = match phrase {
            Some(phrase) => self.personalize(&phrase.text, profile),
            None => format!("@{}", profile.screen_name),
        };

        let mut attachments: Vec<String> = Vec::new();
        if let Some(content) = content {
            attachments.push(content.render());
        }
        if let Some(phrase) = phrase {
            attachments.extend(phrase_attachment(phrase.audio_id.as_deref(), MediaKind::Audio));
            attachments.extend(phrase_attachment(phrase.gif_id.as_deref(), MediaKind::Document));
        }

        OutboundMessage {
            peer_id,
            random_id: random_id(),
            message: Some(message),
            attachment: (!attachments.is_empty()).then(|| attachments.join(",")),
        }
    }
}

/// Renders a phrase's own attachment column. Empty and `null` cells are
/// absent; ids given without the kind prefix get it added.
fn phrase_attachment(value: Option<&str>, kind: MediaKind) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return None;
    }
    let prefix = kind.attachment_prefix();
    if value.starts_with(prefix) {
        Some(value.to_string())
    } else {
        Some(format!("{prefix}{value}"))
    }
}

/// Deduplication id for `messages.send`.
pub fn random_id() -> i32 {
    rand::random()
}
