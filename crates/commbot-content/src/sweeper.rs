// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reclaims collectors whose command left the catalog.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use commbot_core::CommandId;

/// Interval-gated sweep of the collector map.
///
/// A collector survives as long as its command id is in the catalog, no
/// matter how long it has been idle.
#[derive(Debug)]
pub struct Sweeper {
    interval: Duration,
    last_sweep: Instant,
}

impl Sweeper {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sweep: Instant::now(),
        }
    }

    /// Whether `interval` has passed since the last sweep.
    pub fn is_due(&self) -> bool {
        self.last_sweep.elapsed() >= self.interval
    }

    /// Drops every entry whose key is not in `live` and returns how many went.
    pub fn sweep<V>(
        &mut self,
        collectors: &mut HashMap<CommandId, V>,
        live: &HashSet<CommandId>,
    ) -> usize {
        let before = collectors.len();
        collectors.retain(|id, _| live.contains(id));
        self.last_sweep = Instant::now();

        let evicted = before - collectors.len();
        if evicted > 0 {
            info!(evicted, remaining = collectors.len(), "evicted stale collectors");
        }
        evicted
    }
}
