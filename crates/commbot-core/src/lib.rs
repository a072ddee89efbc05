// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Commbot community assistant.
//!
//! This crate provides the adapter traits, error type, and domain records
//! (phrases, commands, attachments, requests) used throughout the workspace.

pub mod error;
pub mod traits;
pub mod types;

pub use error::CommbotError;
pub use types::{
    AdapterType, Attachment, Command, CommandId, CommandKind, ContentDescriptor, ContentRequest,
    HealthStatus, MediaKind, OutboundMessage, Phrase, PhraseKind, PostAttachment, UserProfile,
    WallPage, WallPost,
};

pub use traits::{ObjectStoreAdapter, PlatformAdapter, PluginAdapter};
