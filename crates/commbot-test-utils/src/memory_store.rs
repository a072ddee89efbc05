// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory object store for deterministic catalog tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use commbot_core::CommbotError;
use commbot_core::traits::adapter::PluginAdapter;
use commbot_core::traits::object_store::ObjectStoreAdapter;
use commbot_core::types::{AdapterType, HealthStatus};

/// An object store backed by a map.
///
/// Objects can be replaced between fetches to simulate catalog edits, and
/// fetches can be made to fail to exercise refresh error handling.
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failing: AtomicBool,
    fetches: AtomicUsize,
    delay_ms: AtomicU64,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            failing: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Create a store holding the given objects.
    pub fn with_objects<I, K, V>(objects: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let map = objects
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            objects: Arc::new(Mutex::new(map)),
            failing: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Store or replace an object.
    pub async fn put(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.objects.lock().await.insert(key.into(), data.into());
    }

    /// Make every subsequent fetch fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every subsequent fetch take `delay` before answering.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of fetch calls made so far, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CommbotError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("failing on purpose".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ObjectStoreAdapter for MemoryObjectStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, CommbotError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CommbotError::ObjectStore {
                message: format!("fetch of `{key}` failed on purpose"),
                source: None,
            });
        }
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| CommbotError::ObjectStore {
                message: format!("no object under `{key}`"),
                source: None,
            })
    }
}
