// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content request dispatcher.
//!
//! A single task drains a bounded FIFO of [`ContentRequest`]s. It owns the
//! per-command collector map outright, so collectors need no locking. Per
//! request failures are logged and never stop the loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use commbot_catalog::CatalogCache;
use commbot_config::model::CommbotConfig;
use commbot_core::{
    CommandId, CommbotError, ContentRequest, MediaKind, PhraseKind, PlatformAdapter, UserProfile,
};

use crate::collector::{AttachmentCollector, CacheLimits};
use crate::delivery::MessageStyle;
use crate::sweeper::Sweeper;

/// Dispatcher tuning, usually derived from [`CommbotConfig`].
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub queue_size: usize,
    pub sweep_interval: Duration,
    pub photo: CacheLimits,
    pub audio: CacheLimits,
    pub video: CacheLimits,
    pub document: CacheLimits,
    pub style: MessageStyle,
}

impl DispatcherSettings {
    /// Cache limits for a collector whose primary media kind is `kind`.
    pub fn limits_for(&self, kind: MediaKind) -> CacheLimits {
        match kind {
            MediaKind::Photo => self.photo,
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
            MediaKind::Document => self.document,
        }
    }
}

impl From<&CommbotConfig> for DispatcherSettings {
    fn from(config: &CommbotConfig) -> Self {
        let content = &config.content;
        Self {
            queue_size: content.requests_queue_size.max(1),
            sweep_interval: Duration::from_secs(content.collectors_cleaning_interval_secs),
            photo: CacheLimits::from(&content.picture),
            audio: CacheLimits::from(&content.audio),
            video: CacheLimits::from(&content.video),
            document: CacheLimits::from(&content.document),
            style: MessageStyle {
                use_first_name: config.chat.use_first_name_instead_username,
            },
        }
    }
}

/// Producer handle for the request queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RequestSender {
    tx: mpsc::Sender<ContentRequest>,
}

impl RequestSender {
    /// Enqueues a request, waiting for a free slot when the queue is full.
    pub async fn enqueue(&self, request: ContentRequest) -> Result<(), CommbotError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| CommbotError::QueueClosed)
    }

    /// Enqueues a request without waiting.
    pub fn try_enqueue(&self, request: ContentRequest) -> Result<(), CommbotError> {
        self.tx.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CommbotError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => CommbotError::QueueClosed,
        })
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumes content requests and delivers media to the chat.
pub struct RequestDispatcher {
    requests: mpsc::Receiver<ContentRequest>,
    catalog: Arc<CatalogCache>,
    platform: Arc<dyn PlatformAdapter>,
    settings: DispatcherSettings,
    collectors: HashMap<CommandId, AttachmentCollector>,
    sweeper: Sweeper,
}

impl RequestDispatcher {
    /// Creates the dispatcher and the sender side of its queue.
    pub fn new(
        catalog: Arc<CatalogCache>,
        platform: Arc<dyn PlatformAdapter>,
        settings: DispatcherSettings,
    ) -> (Self, RequestSender) {
        let (tx, rx) = mpsc::channel(settings.queue_size.max(1));
        let sweeper = Sweeper::new(settings.sweep_interval);
        let dispatcher = Self {
            requests: rx,
            catalog,
            platform,
            settings,
            collectors: HashMap::new(),
            sweeper,
        };
        (dispatcher, RequestSender { tx })
    }

    /// Runs until cancelled or until every sender is dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(queue_size = self.settings.queue_size, "content dispatcher running");

        loop {
            tokio::select! {
                request = self.requests.recv() => {
                    match request {
                        Some(request) => self.process(request).await,
                        None => {
                            info!("all request senders dropped");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping content dispatcher");
                    break;
                }
            }
        }

        info!(collectors = self.collectors.len(), "content dispatcher stopped");
    }

    /// Handles one request end to end.
    pub async fn process(&mut self, request: ContentRequest) {
        commbot_prometheus::record_content_request();
        debug!(
            command_id = %request.command_id,
            peer_id = request.peer_id,
            user_id = request.user_id,
            "processing content request"
        );

        let profile = match self.platform.user_profile(request.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = request.user_id, error = %e, "user lookup failed, dropping request");
                commbot_prometheus::record_delivery("dropped");
                return;
            }
        };

        if !self.ensure_collector(request.command_id).await {
            self.ask_to_retry(request.peer_id, &profile).await;
            return;
        }

        if self.sweeper.is_due() {
            let live = self.catalog.command_ids().await;
            self.sweeper.sweep(&mut self.collectors, &live);
            commbot_prometheus::set_live_collectors(self.collectors.len());
        }

        let collected = match self.collectors.get_mut(&request.command_id) {
            Some(collector) => collector.collect_one().await,
            None => None,
        };
        let Some(attachment) = collected else {
            debug!(command_id = %request.command_id, "collector came back empty");
            self.ask_to_retry(request.peer_id, &profile).await;
            return;
        };

        let phrase = self.catalog.pick_phrase(PhraseKind::ContentResponse).await;
        let message =
            self.settings
                .style
                .compose(request.peer_id, &profile, phrase.as_ref(), Some(&attachment));

        match self.platform.send_message(message).await {
            Ok(message_id) => {
                commbot_prometheus::record_delivery("delivered");
                info!(
                    command_id = %request.command_id,
                    peer_id = request.peer_id,
                    message_id,
                    attachment = %attachment.render(),
                    "content delivered"
                );
            }
            Err(e) => {
                warn!(command_id = %request.command_id, error = %e, "content send failed");
                self.ask_to_retry(request.peer_id, &profile).await;
            }
        }
    }

    /// Ids that currently have a collector, sorted.
    pub fn collector_ids(&self) -> Vec<CommandId> {
        let mut ids: Vec<CommandId> = self.collectors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Creates the collector for `command_id` if needed. Returns `false` when
    /// the id does not name a content command in the catalog.
    async fn ensure_collector(&mut self, command_id: CommandId) -> bool {
        if self.collectors.contains_key(&command_id) {
            return true;
        }
        let Some(command) = self.catalog.find_command_by_id(command_id).await else {
            warn!(command_id = %command_id, "requested command is not in the catalog");
            return false;
        };
        let Some(descriptor) = command.content() else {
            warn!(command_id = %command_id, "requested command has no content");
            return false;
        };

        let limits = self.settings.limits_for(descriptor.primary_kind());
        let collector = AttachmentCollector::new(
            command_id,
            descriptor,
            limits,
            Arc::clone(&self.catalog),
            Arc::clone(&self.platform),
        );
        self.collectors.insert(command_id, collector);
        commbot_prometheus::set_live_collectors(self.collectors.len());
        debug!(
            command_id = %command_id,
            max_cached = limits.max_cached,
            "collector created"
        );
        true
    }

    /// Sends a `Retry` phrase, if the catalog has any.
    async fn ask_to_retry(&self, peer_id: i64, profile: &UserProfile) {
        commbot_prometheus::record_delivery("retry");
        let Some(phrase) = self.catalog.pick_phrase(PhraseKind::Retry).await else {
            debug!(peer_id, "no retry phrases, skipping");
            return;
        };
        let message = self
            .settings
            .style
            .compose(peer_id, profile, Some(&phrase), None);
        if let Err(e) = self.platform.send_message(message).await {
            warn!(peer_id, error = %e, "retry message send failed");
        }
    }
}
