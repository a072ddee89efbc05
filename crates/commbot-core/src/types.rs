// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain records shared by the catalog, the content core, and the platform adapters.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Literal token inside phrase text that callers replace with a user mention.
pub const USERNAME_PLACEHOLDER: &str = "%username%";

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Platform,
    ObjectStore,
    Observability,
}

/// Purpose of a phrase, matching the `phrase_type` catalog column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum PhraseKind {
    Welcome,
    Goodbye,
    Info,
    MembershipWarning,
    ContentResponse,
    Retry,
}

/// A weighted, immutable chat phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub id: u32,
    pub weight: u32,
    pub kind: PhraseKind,
    pub text: String,
    pub audio_id: Option<String>,
    pub gif_id: Option<String>,
}

impl Phrase {
    /// Whether the text carries the `%username%` placeholder.
    pub fn is_user_templated(&self) -> bool {
        self.text.contains(USERNAME_PLACEHOLDER)
    }
}

/// Identifier of a command row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(pub u32);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a command answers with a phrase or with media.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CommandKind {
    Info,
    Content,
}

/// Remote media kinds a content command can deliver.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum MediaKind {
    #[strum(to_string = "photo", serialize = "picture")]
    Photo,
    #[strum(to_string = "audio")]
    Audio,
    #[strum(to_string = "video")]
    Video,
    #[strum(to_string = "doc", serialize = "document")]
    Document,
}

impl MediaKind {
    /// Prefix used by the platform when an attachment is referenced in a message.
    pub fn attachment_prefix(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Document => "doc",
        }
    }
}

/// Where a content command draws its media from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescriptor {
    /// Ordered, duplicate-free, non-empty.
    pub media_kinds: Vec<MediaKind>,
    /// Non-empty list of community domains or ids.
    pub source_communities: Vec<String>,
}

impl ContentDescriptor {
    /// Builds a descriptor, dropping repeated media kinds while keeping first-seen order.
    ///
    /// Returns `None` when either list ends up empty.
    pub fn new(media_kinds: Vec<MediaKind>, source_communities: Vec<String>) -> Option<Self> {
        let mut seen = BTreeSet::new();
        let media_kinds: Vec<MediaKind> =
            media_kinds.into_iter().filter(|k| seen.insert(*k)).collect();
        if media_kinds.is_empty() || source_communities.is_empty() {
            return None;
        }
        Some(Self {
            media_kinds,
            source_communities,
        })
    }

    /// The media kind that selects cache limits for the collector.
    pub fn primary_kind(&self) -> MediaKind {
        self.media_kinds[0]
    }
}

/// A command matched against incoming chat text.
///
/// `content` is present exactly when `kind` is [`CommandKind::Content`]; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    id: CommandId,
    kind: CommandKind,
    aliases: BTreeSet<String>,
    content: Option<ContentDescriptor>,
}

impl Command {
    /// An info command answered with an `Info` phrase.
    pub fn info<I, S>(id: CommandId, aliases: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(id, CommandKind::Info, aliases, None)
    }

    /// A content command answered with a media attachment.
    pub fn new_content<I, S>(id: CommandId, aliases: I, descriptor: ContentDescriptor) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(id, CommandKind::Content, aliases, Some(descriptor))
    }

    fn build<I, S>(
        id: CommandId,
        kind: CommandKind,
        aliases: I,
        content: Option<ContentDescriptor>,
    ) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let aliases: BTreeSet<String> = aliases
            .into_iter()
            .map(|a| fold_alias(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();
        if aliases.is_empty() {
            return None;
        }
        Some(Self {
            id,
            kind,
            aliases,
            content,
        })
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Case-folded aliases.
    pub fn aliases(&self) -> &BTreeSet<String> {
        &self.aliases
    }

    pub fn content(&self) -> Option<&ContentDescriptor> {
        self.content.as_ref()
    }
}

/// Case-folds an alias or an incoming text for alias comparison.
pub fn fold_alias(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Opaque handle to a remote media object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attachment {
    pub media_kind: MediaKind,
    /// `{owner_id}_{id}` with an optional `_{access_key}` suffix.
    pub vendor_id: String,
}

impl Attachment {
    /// Renders the attachment the way the platform expects it in `messages.send`.
    pub fn render(&self) -> String {
        format!("{}{}", self.media_kind.attachment_prefix(), self.vendor_id)
    }
}

/// A pending content delivery, produced by the event router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRequest {
    pub command_id: CommandId,
    pub peer_id: i64,
    pub user_id: i64,
}

/// Display profile of a chat member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub screen_name: String,
    pub first_name: String,
}

/// An outbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub peer_id: i64,
    pub random_id: i32,
    pub message: Option<String>,
    /// Comma-separated rendered attachments.
    pub attachment: Option<String>,
}

/// A media attachment as found on a wall post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostAttachment {
    pub kind: MediaKind,
    pub owner_id: i64,
    pub id: i64,
    pub access_key: Option<String>,
    /// Only reported for videos.
    pub can_repost: Option<bool>,
}

impl PostAttachment {
    pub fn vendor_id(&self) -> String {
        match self.access_key.as_deref() {
            Some(key) if !key.is_empty() => format!("{}_{}_{}", self.owner_id, self.id, key),
            _ => format!("{}_{}", self.owner_id, self.id),
        }
    }

    /// Videos can only be forwarded when the platform allows reposting.
    pub fn is_shareable(&self) -> bool {
        match self.kind {
            MediaKind::Video => self.can_repost == Some(true),
            _ => true,
        }
    }

    pub fn to_attachment(&self) -> Attachment {
        Attachment {
            media_kind: self.kind,
            vendor_id: self.vendor_id(),
        }
    }
}

/// A single wall post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallPost {
    pub id: i64,
    pub attachments: Vec<PostAttachment>,
}

/// One page of `wall.get` results together with the wall's total post count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WallPage {
    pub count: u64,
    pub items: Vec<WallPost>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn phrase_kind_parses_case_insensitively() {
        assert_eq!(
            PhraseKind::from_str("content_response").unwrap(),
            PhraseKind::ContentResponse
        );
        assert_eq!(PhraseKind::from_str("RETRY").unwrap(), PhraseKind::Retry);
        assert_eq!(
            PhraseKind::MembershipWarning.to_string(),
            "MEMBERSHIP_WARNING"
        );
        assert!(PhraseKind::from_str("farewell").is_err());
    }

    #[test]
    fn media_kind_accepts_aliases() {
        assert_eq!(MediaKind::from_str("Photo").unwrap(), MediaKind::Photo);
        assert_eq!(MediaKind::from_str("picture").unwrap(), MediaKind::Photo);
        assert_eq!(MediaKind::from_str("document").unwrap(), MediaKind::Document);
        assert_eq!(MediaKind::Document.to_string(), "doc");
    }

    #[test]
    fn command_aliases_are_case_folded() {
        let cmd = Command::info(CommandId(1), ["Sing", "SONG", " "]).unwrap();
        let aliases: Vec<&str> = cmd.aliases().iter().map(String::as_str).collect();
        assert_eq!(aliases, vec!["sing", "song"]);
        assert!(cmd.content().is_none());
    }

    #[test]
    fn command_without_aliases_is_rejected() {
        assert!(Command::info(CommandId(1), Vec::<String>::new()).is_none());
    }

    #[test]
    fn content_command_exposes_its_descriptor() {
        let descriptor =
            ContentDescriptor::new(vec![MediaKind::Photo], vec!["art_club".into()]).unwrap();
        let cmd = Command::new_content(CommandId(3), ["Pic"], descriptor.clone()).unwrap();
        assert_eq!(cmd.kind(), CommandKind::Content);
        assert_eq!(cmd.content(), Some(&descriptor));
        assert!(Command::new_content(CommandId(4), [""], descriptor).is_none());
    }

    #[test]
    fn descriptor_deduplicates_media_kinds() {
        let d = ContentDescriptor::new(
            vec![MediaKind::Audio, MediaKind::Photo, MediaKind::Audio],
            vec!["club".into()],
        )
        .unwrap();
        assert_eq!(d.media_kinds, vec![MediaKind::Audio, MediaKind::Photo]);
        assert_eq!(d.primary_kind(), MediaKind::Audio);
        assert!(ContentDescriptor::new(vec![], vec!["club".into()]).is_none());
        assert!(ContentDescriptor::new(vec![MediaKind::Audio], vec![]).is_none());
    }

    #[test]
    fn attachment_rendering() {
        let post = PostAttachment {
            kind: MediaKind::Audio,
            owner_id: -42,
            id: 7,
            access_key: None,
            can_repost: None,
        };
        assert_eq!(post.to_attachment().render(), "audio-42_7");

        let photo = PostAttachment {
            kind: MediaKind::Photo,
            owner_id: 1,
            id: 2,
            access_key: Some("abc".into()),
            can_repost: None,
        };
        assert_eq!(photo.to_attachment().render(), "photo1_2_abc");
    }

    #[test]
    fn only_repostable_videos_are_shareable() {
        let mut video = PostAttachment {
            kind: MediaKind::Video,
            owner_id: 1,
            id: 2,
            access_key: None,
            can_repost: None,
        };
        assert!(!video.is_shareable());
        video.can_repost = Some(true);
        assert!(video.is_shareable());
    }

    #[test]
    fn user_templated_phrase() {
        let phrase = Phrase {
            id: 1,
            weight: 1,
            kind: PhraseKind::Retry,
            text: "try again, %username%".into(),
            audio_id: None,
            gif_id: None,
        };
        assert!(phrase.is_user_templated());
    }
}
