// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodically refreshed catalog backed by an object store.
//!
//! Each table lives in an [`ArcSwap`] so readers take one atomic load and never
//! wait. Refreshes happen lazily on lookup once the table's interval has
//! elapsed, guarded by a mutex that is only ever `try_lock`ed from the read
//! path: while one caller refreshes, everyone else keeps reading the previous
//! snapshot.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

use commbot_config::model::CatalogConfig;
use commbot_core::{Command, CommandId, CommbotError, ObjectStoreAdapter, Phrase, PhraseKind};

use crate::codec::{self, CodecError};
use crate::index::{CatalogSnapshot, CommandIndex, PhraseIndex};
use crate::picker;

/// A decoded table that can be published as one snapshot.
pub trait CatalogTable: Send + Sync + Sized + 'static {
    /// Label used in logs and metrics.
    const NAME: &'static str;

    fn decode(bytes: &[u8]) -> Result<Self, CodecError>;

    fn rows(&self) -> usize;
}

impl CatalogTable for PhraseIndex {
    const NAME: &'static str = "phrases";

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::parse_phrases(bytes).map(PhraseIndex::build)
    }

    fn rows(&self) -> usize {
        self.len()
    }
}

impl CatalogTable for CommandIndex {
    const NAME: &'static str = "commands";

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::parse_commands(bytes).map(CommandIndex::build)
    }

    fn rows(&self) -> usize {
        self.len()
    }
}

/// Where the tables live and how often they are refreshed.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub phrases_key: String,
    pub commands_key: String,
    pub phrases_refresh_interval: Duration,
    pub commands_refresh_interval: Duration,
}

impl From<&CatalogConfig> for CatalogSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            phrases_key: config.phrases_key.clone(),
            commands_key: config.commands_key.clone(),
            phrases_refresh_interval: Duration::from_secs(config.phrases_refresh_interval_secs),
            commands_refresh_interval: Duration::from_secs(config.commands_refresh_interval_secs),
        }
    }
}

/// One object-store table with single-flight refresh.
pub struct RefreshingTable<T: CatalogTable> {
    store: Arc<dyn ObjectStoreAdapter>,
    key: String,
    interval: Duration,
    current: ArcSwap<T>,
    /// Time of the last successful load. Held for the duration of a refresh.
    last_refresh: Mutex<Instant>,
}

impl<T: CatalogTable> RefreshingTable<T> {
    /// Performs the initial load. Fails if the object cannot be fetched or decoded.
    pub async fn load(
        store: Arc<dyn ObjectStoreAdapter>,
        key: impl Into<String>,
        interval: Duration,
    ) -> Result<Self, CommbotError> {
        let key = key.into();
        let table = fetch_table::<T>(store.as_ref(), &key).await.inspect_err(|e| {
            commbot_prometheus::record_catalog_refresh(T::NAME, "error");
            error!(catalog = T::NAME, key = %key, error = %e, "initial catalog load failed");
        })?;
        commbot_prometheus::record_catalog_refresh(T::NAME, "ok");
        info!(catalog = T::NAME, key = %key, rows = table.rows(), "catalog loaded");

        Ok(Self {
            store,
            key,
            interval,
            current: ArcSwap::from_pointee(table),
            last_refresh: Mutex::new(Instant::now()),
        })
    }

    /// Returns the current snapshot, refreshing first if the interval elapsed
    /// and no other refresh is running.
    pub async fn current(&self) -> Arc<T> {
        if let Ok(mut last_refresh) = self.last_refresh.try_lock() {
            if last_refresh.elapsed() >= self.interval {
                debug!(catalog = T::NAME, "refresh interval elapsed");
                // Failures are logged inside and keep the old snapshot; the
                // timestamp stays put so the next lookup retries.
                let _ = self.refresh_locked(&mut last_refresh).await;
            }
        }
        self.current.load_full()
    }

    /// The current snapshot without any refresh check.
    pub fn peek(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Refreshes immediately, waiting for any in-flight refresh first.
    pub async fn refresh_now(&self) -> Result<(), CommbotError> {
        let mut last_refresh = self.last_refresh.lock().await;
        self.refresh_locked(&mut last_refresh).await
    }

    async fn refresh_locked(&self, last_refresh: &mut Instant) -> Result<(), CommbotError> {
        match fetch_table::<T>(self.store.as_ref(), &self.key).await {
            Ok(table) => {
                let rows = table.rows();
                self.current.store(Arc::new(table));
                *last_refresh = Instant::now();
                commbot_prometheus::record_catalog_refresh(T::NAME, "ok");
                info!(catalog = T::NAME, key = %self.key, rows, "catalog refreshed");
                Ok(())
            }
            Err(e) => {
                commbot_prometheus::record_catalog_refresh(T::NAME, "error");
                error!(
                    catalog = T::NAME,
                    key = %self.key,
                    error = %e,
                    "catalog refresh failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }
}

async fn fetch_table<T: CatalogTable>(
    store: &dyn ObjectStoreAdapter,
    key: &str,
) -> Result<T, CommbotError> {
    let bytes = store.fetch(key).await.map_err(|e| CommbotError::CatalogFetch {
        key: key.to_string(),
        source: Box::new(e),
    })?;
    T::decode(&bytes).map_err(|e| CommbotError::CatalogParse {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Phrase and command lookups over two independently refreshed tables.
pub struct CatalogCache {
    phrases: RefreshingTable<PhraseIndex>,
    commands: RefreshingTable<CommandIndex>,
}

impl CatalogCache {
    /// Loads both tables. Construction fails if either initial load fails.
    pub async fn load(
        store: Arc<dyn ObjectStoreAdapter>,
        settings: CatalogSettings,
    ) -> Result<Self, CommbotError> {
        let phrases = RefreshingTable::load(
            Arc::clone(&store),
            settings.phrases_key,
            settings.phrases_refresh_interval,
        )
        .await?;
        let commands = RefreshingTable::load(
            store,
            settings.commands_key,
            settings.commands_refresh_interval,
        )
        .await?;
        Ok(Self { phrases, commands })
    }

    /// Phrases of `kind` in table order.
    pub async fn find_phrases_by_kind(&self, kind: PhraseKind) -> Arc<[Phrase]> {
        self.phrases.current().await.by_kind(kind)
    }

    /// Weighted random phrase of `kind`, if the table has any.
    pub async fn pick_phrase(&self, kind: PhraseKind) -> Option<Phrase> {
        let pool = self.find_phrases_by_kind(kind).await;
        picker::pick(&pool).cloned()
    }

    pub async fn find_command_by_alias(&self, text: &str) -> Option<Arc<Command>> {
        self.commands.current().await.find_by_alias(text)
    }

    pub async fn find_command_by_id(&self, id: CommandId) -> Option<Arc<Command>> {
        self.commands.current().await.find_by_id(id)
    }

    /// Every command, ordered by id.
    pub async fn find_all_commands(&self) -> Vec<Arc<Command>> {
        self.commands.current().await.all()
    }

    /// Ids present in the current command snapshot.
    pub async fn command_ids(&self) -> HashSet<CommandId> {
        self.commands
            .current()
            .await
            .all()
            .iter()
            .map(|c| c.id())
            .collect()
    }

    /// Both tables as currently published.
    pub async fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            commands: self.commands.current().await,
            phrases: self.phrases.current().await,
        }
    }

    /// Forces both tables to reload now.
    pub async fn refresh_now(&self) -> Result<(), CommbotError> {
        self.phrases.refresh_now().await?;
        self.commands.refresh_now().await
    }
}
