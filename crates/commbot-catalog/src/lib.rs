// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phrase and command catalog for Commbot.
//!
//! Provides the CSV codec for both tables, the lookup indexes built from
//! them, the lazily refreshed [`CatalogCache`], and the weighted phrase
//! [`picker`].

pub mod cache;
pub mod codec;
pub mod index;
pub mod picker;

pub use cache::{CatalogCache, CatalogSettings, CatalogTable, RefreshingTable};
pub use codec::{
    CodecError, parse_commands, parse_phrases, write_commands_csv, write_phrases_csv,
};
pub use index::{CatalogSnapshot, CommandIndex, PhraseIndex};
pub use picker::{Direction, Weighted, pick, pick_with};
