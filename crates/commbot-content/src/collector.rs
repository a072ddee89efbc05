// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-command attachment collector.
//!
//! Keeps a small cache of attachments sampled from the walls of the command's
//! source communities. When the cache drops to its refill threshold, one
//! random page of one random source wall is scanned for new items. Every
//! collected attachment is handed out at most once.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use commbot_catalog::CatalogCache;
use commbot_config::model::AttachmentCacheConfig;
use commbot_core::traits::platform::MAX_WALL_PAGE;
use commbot_core::{Attachment, CommandId, ContentDescriptor, MediaKind, PlatformAdapter};

/// Cache size and refill trigger for one collector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheLimits {
    pub max_cached: usize,
    /// Fraction of `max_cached`, in `[0, 1]`.
    pub refill_threshold: f64,
}

impl CacheLimits {
    /// Builds limits, clamping the threshold into `[0, 1]`.
    pub fn new(max_cached: usize, refill_threshold: f64) -> Self {
        let refill_threshold = if refill_threshold.is_nan() {
            0.0
        } else {
            refill_threshold.clamp(0.0, 1.0)
        };
        Self {
            max_cached,
            refill_threshold,
        }
    }

    /// Cache size at or below which the next `collect_one` refills.
    pub fn threshold(&self) -> usize {
        (self.max_cached as f64 * self.refill_threshold).floor() as usize
    }
}

impl From<&AttachmentCacheConfig> for CacheLimits {
    fn from(config: &AttachmentCacheConfig) -> Self {
        Self::new(config.max_cached_attachments, config.clamped_threshold())
    }
}

/// Offset of the page to fetch from a wall of `total` posts, given a uniform
/// draw in `[0, total)`.
///
/// The page starts at the drawn post unless that would run past the end of the
/// wall, in which case it is shifted left to the last full page. Walls that fit
/// in one page are always read from the start.
pub fn wall_offset(total: u64, draw: u64) -> u64 {
    let page = u64::from(MAX_WALL_PAGE);
    if total <= page {
        0
    } else {
        draw.min(total - page)
    }
}

/// Attachment cache and refill engine for one content command.
pub struct AttachmentCollector {
    command_id: CommandId,
    media_kinds: Vec<MediaKind>,
    limits: CacheLimits,
    cache: Vec<Attachment>,
    catalog: Arc<CatalogCache>,
    platform: Arc<dyn PlatformAdapter>,
}

impl AttachmentCollector {
    pub fn new(
        command_id: CommandId,
        descriptor: &ContentDescriptor,
        limits: CacheLimits,
        catalog: Arc<CatalogCache>,
        platform: Arc<dyn PlatformAdapter>,
    ) -> Self {
        Self {
            command_id,
            media_kinds: descriptor.media_kinds.clone(),
            limits,
            cache: Vec::with_capacity(limits.max_cached),
            catalog,
            platform,
        }
    }

    pub fn command_id(&self) -> CommandId {
        self.command_id
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    /// Attachments currently cached.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Takes one random attachment out of the cache, refilling it first when
    /// it is at or below the threshold.
    ///
    /// Returns `None` when nothing could be collected. Platform errors during
    /// the refill are logged and otherwise ignored.
    pub async fn collect_one(&mut self) -> Option<Attachment> {
        if self.cache.len() <= self.limits.threshold() {
            self.refill().await;
        }
        if self.cache.is_empty() {
            return None;
        }
        let i = rand::thread_rng().gen_range(0..self.cache.len());
        Some(self.cache.swap_remove(i))
    }

    /// Scans one random page of one random source wall and appends new
    /// attachments until the cache is full or the page runs out.
    async fn refill(&mut self) {
        let Some(command) = self.catalog.find_command_by_id(self.command_id).await else {
            debug!(command_id = %self.command_id, "command no longer in catalog, skipping refill");
            return;
        };
        let Some(domain) = command
            .content()
            .and_then(|d| d.source_communities.choose(&mut rand::thread_rng()))
            .cloned()
        else {
            debug!(command_id = %self.command_id, "command has no content sources");
            return;
        };

        let total = match self.platform.wall_count(&domain).await {
            Ok(total) => total,
            Err(e) => {
                warn!(command_id = %self.command_id, domain = %domain, error = %e, "wall count failed");
                return;
            }
        };
        if total == 0 {
            debug!(command_id = %self.command_id, domain = %domain, "source wall is empty");
            return;
        }

        let offset = wall_offset(total, rand::thread_rng().gen_range(0..total));
        let page = match self.platform.wall_get(&domain, MAX_WALL_PAGE, offset).await {
            Ok(page) => page,
            Err(e) => {
                warn!(command_id = %self.command_id, domain = %domain, offset, error = %e, "wall fetch failed");
                return;
            }
        };

        let before = self.cache.len();
        let mut seen: HashSet<String> = self.cache.iter().map(|a| a.vendor_id.clone()).collect();
        for post in &page.items {
            if self.cache.len() >= self.limits.max_cached {
                break;
            }
            let found = post.attachments.iter().find(|a| {
                self.media_kinds.contains(&a.kind)
                    && a.is_shareable()
                    && !seen.contains(&a.vendor_id())
            });
            if let Some(found) = found {
                let attachment = found.to_attachment();
                seen.insert(attachment.vendor_id.clone());
                self.cache.push(attachment);
            }
        }

        let added = self.cache.len() - before;
        if let Some(kind) = self.media_kinds.first() {
            commbot_prometheus::record_refill(kind.attachment_prefix(), added);
        }
        debug!(
            command_id = %self.command_id,
            domain = %domain,
            offset,
            total,
            added,
            cached = self.cache.len(),
            "collector refilled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commbot_catalog::CatalogSettings;
    use commbot_core::{Command, MediaKind};
    use commbot_test_utils::fixtures::{self, COMMANDS_CSV, COMMANDS_KEY, PHRASES_CSV, PHRASES_KEY};
    use commbot_test_utils::{MemoryObjectStore, MockPlatform};
    use std::time::Duration;

    async fn catalog() -> Arc<CatalogCache> {
        let store = Arc::new(MemoryObjectStore::with_objects([
            (PHRASES_KEY, PHRASES_CSV),
            (COMMANDS_KEY, COMMANDS_CSV),
        ]));
        let settings = CatalogSettings {
            phrases_key: PHRASES_KEY.into(),
            commands_key: COMMANDS_KEY.into(),
            phrases_refresh_interval: Duration::from_secs(900),
            commands_refresh_interval: Duration::from_secs(900),
        };
        Arc::new(CatalogCache::load(store, settings).await.unwrap())
    }

    async fn collector(
        platform: Arc<MockPlatform>,
        limits: CacheLimits,
    ) -> AttachmentCollector {
        let catalog = catalog().await;
        let command: Arc<Command> = catalog.find_command_by_id(CommandId(7)).await.unwrap();
        AttachmentCollector::new(
            CommandId(7),
            command.content().unwrap(),
            limits,
            catalog,
            platform,
        )
    }

    #[test]
    fn threshold_floors_and_clamps() {
        assert_eq!(CacheLimits::new(100, 0.2).threshold(), 20);
        assert_eq!(CacheLimits::new(7, 0.5).threshold(), 3);
        assert_eq!(CacheLimits::new(10, 3.0).threshold(), 10);
        assert_eq!(CacheLimits::new(10, -1.0).threshold(), 0);
    }

    #[test]
    fn offsets_stay_within_the_wall() {
        assert_eq!(wall_offset(50, 49), 0);
        assert_eq!(wall_offset(100, 99), 0);
        assert_eq!(wall_offset(250, 10), 10);
        assert_eq!(wall_offset(250, 200), 150);
        for draw in 0..1_000 {
            assert!(wall_offset(1_000, draw) + u64::from(MAX_WALL_PAGE) <= 1_000);
        }
    }

    #[tokio::test]
    async fn collects_distinct_items_until_exhausted() {
        let platform = Arc::new(MockPlatform::new());
        platform
            .set_wall("music_club", fixtures::wall(MediaKind::Audio, 3))
            .await;
        let mut collector = collector(platform.clone(), CacheLimits::new(10, 0.0)).await;

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let before = collector.len();
            let item = collector.collect_one().await.unwrap();
            assert_eq!(item.media_kind, MediaKind::Audio);
            assert!(seen.insert(item.vendor_id));
            if before > 0 {
                assert_eq!(collector.len(), before - 1);
            }
        }
        // One refill for the first call; the cache then drained without refilling.
        assert_eq!(platform.wall_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn refill_respects_max_cached() {
        let platform = Arc::new(MockPlatform::new());
        platform
            .set_wall("music_club", fixtures::wall(MediaKind::Audio, 40))
            .await;
        let mut collector = collector(platform, CacheLimits::new(5, 0.2)).await;

        assert!(collector.collect_one().await.is_some());
        assert_eq!(collector.len(), 4);
    }

    #[tokio::test]
    async fn only_matching_shareable_kinds_are_taken() {
        let platform = Arc::new(MockPlatform::new());
        let mut locked_video = fixtures::attachment(MediaKind::Video, -1, 1);
        locked_video.can_repost = Some(false);
        platform
            .set_wall(
                "music_club",
                vec![
                    fixtures::post(1, vec![fixtures::attachment(MediaKind::Photo, -1, 1)]),
                    fixtures::post(2, vec![locked_video]),
                    fixtures::post(
                        3,
                        vec![
                            fixtures::attachment(MediaKind::Audio, -1, 30),
                            fixtures::attachment(MediaKind::Audio, -1, 31),
                        ],
                    ),
                    fixtures::post(4, vec![fixtures::attachment(MediaKind::Audio, -1, 30)]),
                ],
            )
            .await;
        let mut collector = collector(platform, CacheLimits::new(10, 0.0)).await;

        let first = collector.collect_one().await.unwrap();
        assert_eq!(first.vendor_id, "-1_30");
        // Post 3 contributes one item; post 4 repeats it and is skipped.
        assert!(collector.is_empty());
    }

    #[tokio::test]
    async fn platform_failures_yield_nothing() {
        let platform = Arc::new(MockPlatform::new());
        platform
            .set_wall("music_club", fixtures::wall(MediaKind::Audio, 3))
            .await;
        platform.set_fail_walls(true);
        let mut collector = collector(platform, CacheLimits::new(10, 0.2)).await;

        assert!(collector.collect_one().await.is_none());
        assert!(collector.is_empty());
    }

    #[tokio::test]
    async fn empty_wall_yields_nothing() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_wall("music_club", Vec::new()).await;
        let mut collector = collector(platform.clone(), CacheLimits::new(10, 0.2)).await;

        assert!(collector.collect_one().await.is_none());
        // Only the count request; no page fetch for an empty wall.
        assert_eq!(platform.wall_calls().await.len(), 1);
    }
}
