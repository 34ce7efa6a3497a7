//! Insertion-ordered identity store.
//!
//! Holds every live tracked identity. Capacity is bounded only by the
//! tracking window; the store itself never drops entries.

use indexmap::IndexMap;
use reid_models::{IdentityId, IdentitySummary};

use crate::extractor::Embedding;

/// One re-identified subject across sightings.
#[derive(Debug, Clone)]
pub struct TrackedIdentity {
    identity_id: IdentityId,
    /// Absent for non-person placeholders
    embedding: Option<Embedding>,
    camera_id: String,
    camera_name: String,
    first_seen_ms: i64,
    last_seen_ms: i64,
    /// Image that created the identity
    snapshot: Option<Vec<u8>>,
}

impl TrackedIdentity {
    /// New person/face identity created on a similarity-search miss.
    pub fn person(
        identity_id: IdentityId,
        embedding: Embedding,
        camera_id: impl Into<String>,
        camera_name: impl Into<String>,
        snapshot: Option<Vec<u8>>,
        now_ms: i64,
    ) -> Self {
        Self {
            identity_id,
            embedding: Some(embedding),
            camera_id: camera_id.into(),
            camera_name: camera_name.into(),
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
            snapshot,
        }
    }

    /// Placeholder for a non-person time bucket; carries no embedding.
    pub fn placeholder(
        identity_id: IdentityId,
        camera_id: impl Into<String>,
        camera_name: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            identity_id,
            embedding: None,
            camera_id: camera_id.into(),
            camera_name: camera_name.into(),
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
            snapshot: None,
        }
    }

    /// Record a new sighting. `first_seen` never moves.
    pub fn refresh(&mut self, camera_id: &str, camera_name: &str, now_ms: i64) {
        self.last_seen_ms = now_ms.max(self.first_seen_ms);
        self.camera_id = camera_id.to_string();
        self.camera_name = camera_name.to_string();
    }

    pub fn identity_id(&self) -> &IdentityId {
        &self.identity_id
    }

    pub fn embedding(&self) -> Option<&Embedding> {
        self.embedding.as_ref()
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    pub fn first_seen_ms(&self) -> i64 {
        self.first_seen_ms
    }

    pub fn last_seen_ms(&self) -> i64 {
        self.last_seen_ms
    }

    pub fn snapshot(&self) -> Option<&[u8]> {
        self.snapshot.as_deref()
    }

    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            identity_id: self.identity_id.clone(),
            first_seen_ms: self.first_seen_ms,
            last_seen_ms: self.last_seen_ms,
            camera_id: self.camera_id.clone(),
            camera_name: self.camera_name.clone(),
        }
    }
}

/// Identity id -> record, iterated in insertion order.
#[derive(Debug, Default)]
pub struct IdentityStore {
    entries: IndexMap<IdentityId, TrackedIdentity>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &IdentityId) -> Option<&TrackedIdentity> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &IdentityId) -> Option<&mut TrackedIdentity> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &IdentityId) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert or replace. A replaced entry keeps its original position.
    pub fn put(&mut self, record: TrackedIdentity) -> Option<TrackedIdentity> {
        self.entries.insert(record.identity_id.clone(), record)
    }

    /// Remove an entry, preserving the order of the rest.
    pub fn remove(&mut self, id: &IdentityId) -> Option<TrackedIdentity> {
        self.entries.shift_remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedIdentity> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
