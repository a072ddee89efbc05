// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock platform adapter for deterministic testing.
//!
//! `MockPlatform` implements `PlatformAdapter` with scripted community walls,
//! user profiles and chat membership, and captures every outbound message for
//! assertion in tests. Sends can be held at a gate to simulate a slow API.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, Semaphore};

use commbot_core::CommbotError;
use commbot_core::traits::adapter::PluginAdapter;
use commbot_core::traits::platform::PlatformAdapter;
use commbot_core::types::{
    AdapterType, HealthStatus, OutboundMessage, UserProfile, WallPage, WallPost,
};

/// A `wall_get` call as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallCall {
    pub domain: String,
    pub count: u32,
    pub offset: u64,
}

/// A mock social platform.
///
/// Unknown users resolve to a generated profile (`id{n}` / `User{n}`) unless
/// marked failing with [`MockPlatform::fail_user`].
pub struct MockPlatform {
    walls: Mutex<HashMap<String, Vec<WallPost>>>,
    wall_calls: Mutex<Vec<WallCall>>,
    profiles: Mutex<HashMap<i64, UserProfile>>,
    failing_users: Mutex<HashSet<i64>>,
    sent: Mutex<Vec<OutboundMessage>>,
    sent_notify: Notify,
    send_started: Notify,
    send_gate: std::sync::Mutex<Option<Arc<Semaphore>>>,
    fail_sends: AtomicBool,
    fail_walls: AtomicBool,
    next_message_id: AtomicI64,
    chat_members: Mutex<Vec<i64>>,
    non_members: Mutex<HashSet<i64>>,
    removed: Mutex<Vec<(i64, i64)>>,
}

impl MockPlatform {
    /// Create a platform with no walls and no chat members.
    pub fn new() -> Self {
        Self {
            walls: Mutex::new(HashMap::new()),
            wall_calls: Mutex::new(Vec::new()),
            profiles: Mutex::new(HashMap::new()),
            failing_users: Mutex::new(HashSet::new()),
            sent: Mutex::new(Vec::new()),
            sent_notify: Notify::new(),
            send_started: Notify::new(),
            send_gate: std::sync::Mutex::new(None),
            fail_sends: AtomicBool::new(false),
            fail_walls: AtomicBool::new(false),
            next_message_id: AtomicI64::new(1),
            chat_members: Mutex::new(Vec::new()),
            non_members: Mutex::new(HashSet::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    /// Replace the posts of a community wall, newest first.
    pub async fn set_wall(&self, domain: impl Into<String>, posts: Vec<WallPost>) {
        self.walls.lock().await.insert(domain.into(), posts);
    }

    /// Register a user profile.
    pub async fn add_profile(&self, profile: UserProfile) {
        self.profiles.lock().await.insert(profile.id, profile);
    }

    /// Make profile lookups for `user_id` fail.
    pub async fn fail_user(&self, user_id: i64) {
        self.failing_users.lock().await.insert(user_id);
    }

    /// Make every send fail (or succeed again).
    pub fn set_fail_sends(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }

    /// Make every wall fetch fail (or succeed again).
    pub fn set_fail_walls(&self, failing: bool) {
        self.fail_walls.store(failing, Ordering::SeqCst);
    }

    /// Hold every subsequent send until [`MockPlatform::release_sends`].
    pub fn hold_sends(&self) {
        if let Ok(mut gate) = self.send_gate.lock() {
            *gate = Some(Arc::new(Semaphore::new(0)));
        }
    }

    /// Let held and future sends through.
    pub fn release_sends(&self) {
        if let Ok(mut gate) = self.send_gate.lock() {
            if let Some(gate) = gate.take() {
                gate.add_permits(Semaphore::MAX_PERMITS / 2);
            }
        }
    }

    /// Wait until a send has entered the adapter (held or not).
    pub async fn wait_for_send_started(&self) {
        self.send_started.notified().await;
    }

    /// Wait until at least `n` messages were captured.
    pub async fn wait_for_sent(&self, n: usize) -> Vec<OutboundMessage> {
        loop {
            let notified = self.sent_notify.notified();
            {
                let sent = self.sent.lock().await;
                if sent.len() >= n {
                    return sent.clone();
                }
            }
            notified.await;
        }
    }

    /// All messages passed to `send_message`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Count of captured messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// All `wall_get` calls in order.
    pub async fn wall_calls(&self) -> Vec<WallCall> {
        self.wall_calls.lock().await.clone()
    }

    /// Set the chat member list returned by `chat_members`.
    pub async fn set_chat_members(&self, members: Vec<i64>) {
        *self.chat_members.lock().await = members;
    }

    /// Mark a user as not belonging to any community.
    pub async fn set_non_member(&self, user_id: i64) {
        self.non_members.lock().await.insert(user_id);
    }

    /// Mark a user as a community member again.
    pub async fn set_member(&self, user_id: i64) {
        self.non_members.lock().await.remove(&user_id);
    }

    /// `(chat_id, user_id)` pairs passed to `remove_chat_user`.
    pub async fn removed_users(&self) -> Vec<(i64, i64)> {
        self.removed.lock().await.clone()
    }

    fn current_gate(&self) -> Option<Arc<Semaphore>> {
        self.send_gate.lock().ok().and_then(|gate| gate.clone())
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockPlatform {
    fn name(&self) -> &str {
        "mock-platform"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Platform
    }

    async fn health_check(&self) -> Result<HealthStatus, CommbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl PlatformAdapter for MockPlatform {
    async fn user_profile(&self, user_id: i64) -> Result<UserProfile, CommbotError> {
        if self.failing_users.lock().await.contains(&user_id) {
            return Err(CommbotError::platform("users.get", "user lookup failed on purpose"));
        }
        let profile = self.profiles.lock().await.get(&user_id).cloned();
        Ok(profile.unwrap_or_else(|| UserProfile {
            id: user_id,
            screen_name: format!("id{user_id}"),
            first_name: format!("User{user_id}"),
        }))
    }

    async fn wall_get(
        &self,
        domain: &str,
        count: u32,
        offset: u64,
    ) -> Result<WallPage, CommbotError> {
        self.wall_calls.lock().await.push(WallCall {
            domain: domain.to_string(),
            count,
            offset,
        });
        if self.fail_walls.load(Ordering::SeqCst) {
            return Err(CommbotError::platform("wall.get", "wall fetch failed on purpose"));
        }

        let walls = self.walls.lock().await;
        let Some(posts) = walls.get(domain) else {
            return Err(CommbotError::platform("wall.get", format!("no wall `{domain}`")));
        };
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(posts.len());
        let end = start.saturating_add(count as usize).min(posts.len());
        Ok(WallPage {
            count: posts.len() as u64,
            items: posts[start..end].to_vec(),
        })
    }

    async fn send_message(&self, msg: OutboundMessage) -> Result<i64, CommbotError> {
        self.send_started.notify_one();
        if let Some(gate) = self.current_gate() {
            let _permit = gate.acquire().await;
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(CommbotError::platform("messages.send", "send failed on purpose"));
        }
        self.sent.lock().await.push(msg);
        self.sent_notify.notify_waiters();
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn is_member(&self, _group_id: i64, user_id: i64) -> Result<bool, CommbotError> {
        Ok(!self.non_members.lock().await.contains(&user_id))
    }

    async fn chat_members(&self, _peer_id: i64) -> Result<Vec<i64>, CommbotError> {
        Ok(self.chat_members.lock().await.clone())
    }

    async fn remove_chat_user(&self, chat_id: i64, user_id: i64) -> Result<(), CommbotError> {
        self.removed.lock().await.push((chat_id, user_id));
        Ok(())
    }
}
