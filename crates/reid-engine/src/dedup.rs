//! Deduplication for classes without appearance embeddings.
//!
//! Vehicles, animals and other classes are keyed by
//! `(class, camera, floor(now / window))`: one identity per camera, class
//! and window bucket. A repeat hit does not refresh `last_seen`, so a bucket
//! placeholder expires one window after its first sighting.

use reid_models::{DetectionClass, IdentityId, MatchResult};

use crate::store::{IdentityStore, TrackedIdentity};

/// Coarse per-camera time-bucket deduplication.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonPersonDeduplicator;

impl NonPersonDeduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Window bucket index for `now_ms`.
    pub fn bucket(now_ms: i64, tracking_window_ms: u64) -> i64 {
        let window = i64::try_from(tracking_window_ms.max(1)).unwrap_or(i64::MAX);
        now_ms.div_euclid(window)
    }

    /// Record a sighting and report whether its bucket key is new.
    pub fn observe(
        &self,
        store: &mut IdentityStore,
        class: &DetectionClass,
        camera_id: &str,
        camera_name: &str,
        now_ms: i64,
        tracking_window_ms: u64,
    ) -> MatchResult {
        let bucket = Self::bucket(now_ms, tracking_window_ms);
        let key = IdentityId::for_bucket(class, camera_id, bucket);

        if store.contains(&key) {
            return MatchResult::Existing {
                identity_id: key,
                similarity: None,
                first_detection: None,
            };
        }

        store.put(TrackedIdentity::placeholder(
            key.clone(),
            camera_id,
            camera_name,
            now_ms,
        ));

        MatchResult::New {
            identity_id: key,
            first_detection: None,
        }
    }
}
