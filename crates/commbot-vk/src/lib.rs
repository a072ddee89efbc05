// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! VK platform adapter for Commbot.
//!
//! [`VkClient`] implements [`PlatformAdapter`](commbot_core::PlatformAdapter)
//! over the VK API. The [`LongPollBridge`] turns Bots Long Poll updates into
//! [`ChatEvent`]s, the [`EventRouter`] acts on them, and the
//! [`MembershipWarden`] keeps non-members out of the community chat.

pub mod client;
pub mod events;
pub mod handler;
pub mod longpoll;
pub mod types;
pub mod warden;

pub use client::{CHAT_PEER_OFFSET, VkClient};
pub use events::{ChatEvent, ChatInfoChange, parse_update};
pub use handler::{EventRouter, RouterSettings};
pub use longpoll::LongPollBridge;
pub use warden::{CheckSummary, MembershipWarden, date_key};
