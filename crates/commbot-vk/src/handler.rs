// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat event routing.
//!
//! The [`EventRouter`] turns [`ChatEvent`]s into actions: content commands
//! become queued [`ContentRequest`]s, info commands and membership changes
//! are answered with catalog phrases right away.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use commbot_catalog::CatalogCache;
use commbot_config::model::CommbotConfig;
use commbot_content::{MessageStyle, RequestSender};
use commbot_core::{CommandKind, ContentRequest, PhraseKind, PlatformAdapter};

use crate::events::ChatEvent;

/// Feature toggles and formatting for the router.
#[derive(Debug, Clone, Copy)]
pub struct RouterSettings {
    pub content_commands: bool,
    pub welcome_new_members: bool,
    pub goodbye_members: bool,
    pub style: MessageStyle,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            content_commands: true,
            welcome_new_members: true,
            goodbye_members: true,
            style: MessageStyle::default(),
        }
    }
}

impl From<&CommbotConfig> for RouterSettings {
    fn from(config: &CommbotConfig) -> Self {
        Self {
            content_commands: config.functionality.content_commands,
            welcome_new_members: config.functionality.welcome_new_members,
            goodbye_members: config.functionality.goodbye_members,
            style: MessageStyle {
                use_first_name: config.chat.use_first_name_instead_username,
            },
        }
    }
}

/// Dispatches chat events to the content queue or answers them directly.
pub struct EventRouter {
    catalog: Arc<CatalogCache>,
    platform: Arc<dyn PlatformAdapter>,
    requests: RequestSender,
    settings: RouterSettings,
}

impl EventRouter {
    pub fn new(
        catalog: Arc<CatalogCache>,
        platform: Arc<dyn PlatformAdapter>,
        requests: RequestSender,
        settings: RouterSettings,
    ) -> Self {
        Self {
            catalog,
            platform,
            requests,
            settings,
        }
    }

    /// Handles events until cancelled or until the bridge goes away.
    pub async fn run(self, mut events: mpsc::Receiver<ChatEvent>, cancel: CancellationToken) {
        info!("event router started");
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => self.handle(event).await,
                        None => {
                            info!("event channel closed, stopping router");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping router");
                    break;
                }
            }
        }
    }

    /// Handles one event.
    pub async fn handle(&self, event: ChatEvent) {
        match event {
            ChatEvent::Message {
                peer_id,
                from_id,
                text,
            } => self.on_message(peer_id, from_id, &text).await,
            ChatEvent::MemberJoined { peer_id, user_id } => {
                if self.settings.welcome_new_members {
                    self.reply(peer_id, user_id, PhraseKind::Welcome).await;
                }
            }
            ChatEvent::MemberLeft {
                peer_id, user_id, ..
            } => {
                if self.settings.goodbye_members {
                    self.reply(peer_id, user_id, PhraseKind::Goodbye).await;
                }
            }
            ChatEvent::InfoChanged { peer_id, change } => {
                debug!(peer_id, ?change, "chat info changed");
            }
        }
    }

    async fn on_message(&self, peer_id: i64, from_id: i64, text: &str) {
        // Communities and bots post with negative ids.
        if from_id <= 0 {
            return;
        }
        let Some(command) = self.catalog.find_command_by_alias(text).await else {
            return;
        };

        match command.kind() {
            CommandKind::Content => {
                if !self.settings.content_commands {
                    debug!(command_id = %command.id(), "content commands disabled");
                    return;
                }
                let request = ContentRequest {
                    command_id: command.id(),
                    peer_id,
                    user_id: from_id,
                };
                if let Err(e) = self.requests.enqueue(request).await {
                    warn!(command_id = %command.id(), error = %e, "failed to queue content request");
                }
            }
            CommandKind::Info => self.reply(peer_id, from_id, PhraseKind::Info).await,
        }
    }

    /// Sends a random phrase of `kind` addressed to `user_id`.
    async fn reply(&self, peer_id: i64, user_id: i64, kind: PhraseKind) {
        if user_id <= 0 {
            return;
        }
        let Some(phrase) = self.catalog.pick_phrase(kind).await else {
            debug!(%kind, "no phrase of this kind in the catalog");
            return;
        };
        let profile = match self.platform.user_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id, error = %e, "user lookup failed");
                return;
            }
        };

        let message = self
            .settings
            .style
            .compose(peer_id, &profile, Some(&phrase), None);
        if let Err(e) = self.platform.send_message(message).await {
            warn!(peer_id, %kind, error = %e, "phrase send failed");
        }
    }
}
