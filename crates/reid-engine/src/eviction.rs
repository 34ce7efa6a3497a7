//! Time-window eviction.
//!
//! Runs opportunistically at the start of each detection rather than on a
//! timer, so under zero traffic stale identities linger until the next call.

use reid_models::IdentityId;

use crate::store::{IdentityStore, TrackedIdentity};

/// Purges identities not seen within the tracking window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    tracking_window_ms: u64,
}

impl EvictionPolicy {
    pub fn new(tracking_window_ms: u64) -> Self {
        Self { tracking_window_ms }
    }

    pub fn tracking_window_ms(&self) -> u64 {
        self.tracking_window_ms
    }

    pub fn set_tracking_window(&mut self, ms: u64) {
        self.tracking_window_ms = ms;
    }

    /// Oldest `last_seen` that still counts as active.
    pub fn cutoff_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(i64::try_from(self.tracking_window_ms).unwrap_or(i64::MAX))
    }

    pub fn is_expired(&self, record: &TrackedIdentity, now_ms: i64) -> bool {
        record.last_seen_ms() < self.cutoff_ms(now_ms)
    }

    /// Remove every expired identity; returns the evicted ids in store order.
    pub fn cleanup(&self, store: &mut IdentityStore, now_ms: i64) -> Vec<IdentityId> {
        let expired: Vec<IdentityId> = store
            .iter()
            .filter(|record| self.is_expired(record, now_ms))
            .map(|record| record.identity_id().clone())
            .collect();

        for id in &expired {
            store.remove(id);
        }

        expired
    }
}
