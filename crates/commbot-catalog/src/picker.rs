// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted random selection.
//!
//! Used on every delivery to choose a phrase from the pool of one kind. The
//! thread-local PRNG is seeded once per thread and advanced on every draw.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use commbot_core::Phrase;
use rand::Rng;

/// Something with a non-negative selection weight.
pub trait Weighted {
    fn weight(&self) -> u32;
}

impl Weighted for Phrase {
    fn weight(&self) -> u32 {
        self.weight
    }
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn weight(&self) -> u32 {
        (**self).weight()
    }
}

impl<T: Weighted + ?Sized> Weighted for Arc<T> {
    fn weight(&self) -> u32 {
        (**self).weight()
    }
}

/// Traversal order of the weighted walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Chooses a direction from the low bit of the wall clock milliseconds.
    ///
    /// Alternating the walk spreads the `r = 0` tie-break and rounding
    /// leftovers across both ends of the pool.
    pub fn from_clock() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_millis())
            .unwrap_or(0);
        if millis & 1 == 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}

/// Picks one item with probability proportional to its weight.
///
/// Returns `None` only for an empty pool. When every weight is zero, or the
/// draw is exactly 0, the first item in traversal order wins whatever its
/// weight. Otherwise a zero-weight item can never drive the tally to zero
/// first, so it is never chosen.
pub fn pick<T: Weighted>(items: &[T]) -> Option<&T> {
    pick_with(items, &mut rand::thread_rng(), Direction::from_clock())
}

/// [`pick`] with an explicit PRNG and traversal direction.
pub fn pick_with<'a, T, R>(items: &'a [T], rng: &mut R, direction: Direction) -> Option<&'a T>
where
    T: Weighted,
    R: Rng + ?Sized,
{
    if items.is_empty() {
        return None;
    }

    let len = items.len();
    let at = |step: usize| match direction {
        Direction::Forward => &items[step],
        Direction::Backward => &items[len - 1 - step],
    };

    let total: u64 = items.iter().map(|i| u64::from(i.weight())).sum();
    if total == 0 {
        return Some(at(0));
    }

    let mut tally = rng.gen_range(0.0..total as f64);
    let mut last_weighted = None;
    for step in 0..len {
        let item = at(step);
        let weight = item.weight();
        tally -= f64::from(weight);
        if tally <= 0.0 {
            return Some(item);
        }
        if weight > 0 {
            last_weighted = Some(item);
        }
    }

    // Floating point leftovers land on the last weighted item.
    last_weighted
}
