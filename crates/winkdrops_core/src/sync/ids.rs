//! Contact id allocation.
//!
//! # Invariants
//! - `IdAllocator::next_stamp` is strictly increasing within a session, so
//!   `manual-<ts>` ids and batch ids never collide.
//! - The first stamp equals the clock reading when the clock is ahead of all
//!   previous stamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock source in Unix epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_epoch_ms(&self) -> i64;
}

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Clock frozen at one instant. Used for deterministic ids.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0
    }
}

/// Hands out strictly increasing timestamps for id construction.
pub struct IdAllocator {
    clock: Arc<dyn Clock>,
    last: AtomicI64,
}

impl IdAllocator {
    /// Allocator reading `clock`; the first stamp equals its reading.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: AtomicI64::new(i64::MIN),
        }
    }

    /// Returns `max(now, previous + 1)`.
    pub fn next_stamp(&self) -> i64 {
        let now = self.clock.now_epoch_ms();
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = if now > previous {
                now
            } else {
                previous.saturating_add(1)
            };
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => previous = actual,
            }
        }
    }
}

/// Id of a hand-entered contact: `manual-<timestamp>`.
pub fn manual_contact_id(stamp: i64) -> String {
    format!("manual-{stamp}")
}

/// Id of a synced contact: `<source-tag>-<segment>-<timestamp>-<index>`.
pub fn batch_contact_id(source_tag: &str, segment: &str, stamp: i64, index: usize) -> String {
    format!("{source_tag}-{segment}-{stamp}-{index}")
}
