// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic community membership check for the chat.
//!
//! Chat members who do not belong to the community are warned the first day
//! they are seen and removed from the chat on a later check, provided an
//! admin token is available. The warning ledger is held in memory and starts
//! empty after a restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use commbot_catalog::CatalogCache;
use commbot_content::MessageStyle;
use commbot_core::{CommbotError, PhraseKind, PlatformAdapter};

use crate::client::CHAT_PEER_OFFSET;

/// Ledger key of a warning day, `YYYY-D-M` without zero padding.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%-d-%-m").to_string()
}

/// Outcome counts of one check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub warned: usize,
    pub removed: usize,
    pub cleared: usize,
}

pub struct MembershipWarden {
    catalog: Arc<CatalogCache>,
    platform: Arc<dyn PlatformAdapter>,
    group_id: i64,
    chat_id: i64,
    can_remove: bool,
    interval: Duration,
    style: MessageStyle,
    /// User id to the key of the day they were first warned.
    warned: HashMap<i64, String>,
}

impl MembershipWarden {
    pub fn new(
        catalog: Arc<CatalogCache>,
        platform: Arc<dyn PlatformAdapter>,
        group_id: i64,
        chat_id: i64,
        can_remove: bool,
        interval: Duration,
        style: MessageStyle,
    ) -> Self {
        Self {
            catalog,
            platform,
            group_id,
            chat_id,
            can_remove,
            interval,
            style,
            warned: HashMap::new(),
        }
    }

    fn peer_id(&self) -> i64 {
        CHAT_PEER_OFFSET + self.chat_id
    }

    /// Whether `user_id` is waiting out a warning.
    pub fn is_warned(&self, user_id: i64) -> bool {
        self.warned.contains_key(&user_id)
    }

    /// Runs a check every interval until cancelled. The first check runs
    /// immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            chat_id = self.chat_id,
            interval_secs = self.interval.as_secs(),
            "membership warden started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let today = chrono::Local::now().date_naive();
                    match self.check_once(today).await {
                        Ok(summary) => debug!(?summary, "membership check finished"),
                        Err(e) => warn!(error = %e, "membership check failed"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping membership warden");
                    break;
                }
            }
        }
    }

    /// Checks every chat member once, treating `today` as the current day.
    pub async fn check_once(&mut self, today: NaiveDate) -> Result<CheckSummary, CommbotError> {
        let today_key = date_key(today);
        let mut summary = CheckSummary::default();
        let members = self.platform.chat_members(self.peer_id()).await?;

        for user_id in members {
            let is_member = match self.platform.is_member(self.group_id, user_id).await {
                Ok(is_member) => is_member,
                Err(e) => {
                    warn!(user_id, error = %e, "membership lookup failed");
                    continue;
                }
            };

            if is_member {
                if self.warned.remove(&user_id).is_some() {
                    summary.cleared += 1;
                }
                continue;
            }

            let warned_on = self.warned.get(&user_id).cloned();
            match warned_on {
                None => {
                    if self.warn_user(user_id).await {
                        self.warned.insert(user_id, today_key.clone());
                        summary.warned += 1;
                    }
                }
                Some(key) if key != today_key => {
                    if !self.can_remove {
                        debug!(user_id, "no admin token, leaving warned user in chat");
                        continue;
                    }
                    match self.platform.remove_chat_user(self.chat_id, user_id).await {
                        Ok(()) => {
                            info!(user_id, chat_id = self.chat_id, "removed non-member from chat");
                            self.warned.remove(&user_id);
                            summary.removed += 1;
                        }
                        Err(e) => warn!(user_id, error = %e, "chat removal failed"),
                    }
                }
                Some(_) => {}
            }
        }

        Ok(summary)
    }

    /// Sends the membership warning. Returns whether the user counts as
    /// warned; a catalog without warning phrases still starts the clock.
    async fn warn_user(&self, user_id: i64) -> bool {
        let Some(phrase) = self.catalog.pick_phrase(PhraseKind::MembershipWarning).await else {
            debug!(user_id, "no membership warning phrase in the catalog");
            return true;
        };
        let profile = match self.platform.user_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id, error = %e, "user lookup failed");
                return false;
            }
        };

        let message = self
            .style
            .compose(self.peer_id(), &profile, Some(&phrase), None);
        match self.platform.send_message(message).await {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id, error = %e, "membership warning send failed");
                false
            }
        }
    }
}
