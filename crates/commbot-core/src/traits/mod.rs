// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod object_store;
pub mod platform;

pub use adapter::PluginAdapter;
pub use object_store::ObjectStoreAdapter;
pub use platform::PlatformAdapter;
