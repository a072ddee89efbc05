// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content delivery core for Commbot.
//!
//! The [`RequestDispatcher`] pops [`ContentRequest`](commbot_core::ContentRequest)s
//! off a bounded queue, serves each from a per-command
//! [`AttachmentCollector`], and sends the result to the chat. Collectors whose
//! command left the catalog are reclaimed by the [`Sweeper`].

pub mod collector;
pub mod delivery;
pub mod dispatcher;
pub mod sweeper;

pub use collector::{AttachmentCollector, CacheLimits, wall_offset};
pub use delivery::{MessageStyle, random_id};
pub use dispatcher::{DispatcherSettings, RequestDispatcher, RequestSender};
pub use sweeper::Sweeper;
