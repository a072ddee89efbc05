// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object store adapters for the Commbot catalog.
//!
//! [`HttpObjectStore`] reads public bucket objects over HTTP,
//! [`FsObjectStore`] reads files from a local directory. [`open_store`] picks
//! one from the catalog configuration.

pub mod fs;
pub mod http;

use std::sync::Arc;

use commbot_config::model::{CatalogConfig, CatalogStoreKind};
use commbot_core::{CommbotError, ObjectStoreAdapter};

pub use fs::FsObjectStore;
pub use http::HttpObjectStore;

/// Builds the object store selected by `catalog.store`.
pub fn open_store(config: &CatalogConfig) -> Result<Arc<dyn ObjectStoreAdapter>, CommbotError> {
    match config.store {
        CatalogStoreKind::Http => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                CommbotError::Config("catalog.base_url is required for the http store".into())
            })?;
            Ok(Arc::new(HttpObjectStore::new(base_url)?))
        }
        CatalogStoreKind::Fs => {
            let root = config.root_dir.as_deref().ok_or_else(|| {
                CommbotError::Config("catalog.root_dir is required for the fs store".into())
            })?;
            Ok(Arc::new(FsObjectStore::new(root)))
        }
    }
}
