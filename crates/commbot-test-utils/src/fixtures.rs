// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog tables and wall post builders shared by integration tests.

use commbot_core::types::{MediaKind, PostAttachment, WallPost};

/// Object key the fixtures use for the phrase table.
pub const PHRASES_KEY: &str = "phrases.csv";

/// Object key the fixtures use for the command table.
pub const COMMANDS_KEY: &str = "commands.csv";

/// One phrase of every kind. Retry and Welcome are user-templated.
pub const PHRASES_CSV: &str = "\
phrase_id,weight,phrase_type,vk_audio_id,vk_gif_id,text
1,1,CONTENT_RESPONSE,,,Enjoy!
2,1,RETRY,null,null,\"Sorry %username%, try again later\"
3,1,INFO,,,Be kind to each other
4,1,WELCOME,,doc-1_99,\"Welcome, %username%!\"
5,1,GOODBYE,,,Farewell
6,1,MEMBERSHIP_WARNING,,,\"%username%, please join the community\"
";

/// Content command 7 (`sing`/`song`, audio from `music_club`), info command 8
/// (`rules`) and content command 9 (`pic`, photos from `art_club`).
pub const COMMANDS_CSV: &str = "\
id,commands,command_type,media_types,community_ids
7,\"Sing,SONG\",CONTENT,audio,music_club
8,rules,INFO,,
9,pic,CONTENT,photo,art_club
";

/// [`COMMANDS_CSV`] without command 7.
pub const COMMANDS_WITHOUT_7_CSV: &str = "\
id,commands,command_type,media_types,community_ids
8,rules,INFO,,
9,pic,CONTENT,photo,art_club
";

/// A phrase table with no `CONTENT_RESPONSE` rows.
pub const PHRASES_WITHOUT_RESPONSE_CSV: &str = "\
phrase_id,weight,phrase_type,vk_audio_id,vk_gif_id,text
2,1,RETRY,,,\"Sorry %username%, try again later\"
";

/// An attachment owned by community `owner_id`. Videos are repostable.
pub fn attachment(kind: MediaKind, owner_id: i64, id: i64) -> PostAttachment {
    PostAttachment {
        kind,
        owner_id,
        id,
        access_key: None,
        can_repost: (kind == MediaKind::Video).then_some(true),
    }
}

/// A wall post carrying the given attachments.
pub fn post(id: i64, attachments: Vec<PostAttachment>) -> WallPost {
    WallPost { id, attachments }
}

/// `n` posts with one attachment of `kind` each, ids `1..=n`, owned by `-1`.
pub fn wall(kind: MediaKind, n: usize) -> Vec<WallPost> {
    (1..=n as i64)
        .map(|id| post(id, vec![attachment(kind, -1, id)]))
        .collect()
}
