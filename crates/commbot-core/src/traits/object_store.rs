// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only object store holding the catalog tables.

use async_trait::async_trait;

use crate::error::CommbotError;
use crate::traits::adapter::PluginAdapter;

/// Fetches whole objects by key.
#[async_trait]
pub trait ObjectStoreAdapter: PluginAdapter {
    /// Returns the full content of the object stored under `key`.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, CommbotError>;
}
