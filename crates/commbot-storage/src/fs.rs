// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object store backed by a local directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use commbot_core::CommbotError;
use commbot_core::traits::adapter::PluginAdapter;
use commbot_core::traits::object_store::ObjectStoreAdapter;
use commbot_core::types::{AdapterType, HealthStatus};

/// Serves `{root_dir}/{key}`. Keys may not escape the root.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, CommbotError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(CommbotError::ObjectStore {
                message: format!("invalid object key `{key}`"),
                source: None,
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl PluginAdapter for FsObjectStore {
    fn name(&self) -> &str {
        "fs-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CommbotError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "{}: {e}",
                self.root.display()
            ))),
        }
    }
}

#[async_trait]
impl ObjectStoreAdapter for FsObjectStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, CommbotError> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| CommbotError::ObjectStore {
                message: format!("failed to read {}: {e}", path.display()),
                source: Some(Box::new(e)),
            })
    }
}
