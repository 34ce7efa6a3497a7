//! Re-identification engine.
//!
//! Orchestrates one detection at a time against the shared identity store:
//!
//! ```text
//! evict stale ──► extract (blocking pool, no lock held)
//!                        │
//!        ┌───────────────┴──── store lock ─────────────────────┐
//!        │ evict stale ──► match ──► refresh hit / insert miss │
//!        └─────────────────────────────────────────────────────┘
//! ```
//!
//! Stale identities are evicted before extraction, so a detection that
//! fails to decode or infer still expires old entries. Non-person classes
//! skip extraction and use time-bucket deduplication under the store lock.
//! The lock spans the second eviction, matching and the refresh-or-insert
//! step, so concurrent calls never interleave a match decision with another
//! call's insert or eviction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reid_models::{DetectionClass, EngineHealth, EngineStats, IdentityId, MatchResult};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{validate_similarity_threshold, validate_tracking_window, EngineConfig};
use crate::dedup::NonPersonDeduplicator;
use crate::error::{ReidError, ReidResult};
use crate::eviction::EvictionPolicy;
use crate::extractor::{Embedding, EmbeddingExtractor, EMBEDDING_DIM};
use crate::matcher::Matcher;
use crate::metrics;
use crate::model::{EmbeddingModel, OrtEmbeddingModel};
use crate::store::{IdentityStore, TrackedIdentity};

/// Logs a per-detection decision at info level in debug mode, debug otherwise.
macro_rules! decision {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            info!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

/// Mutable state guarded by the engine's store lock.
struct EngineState {
    store: IdentityStore,
    eviction: EvictionPolicy,
    similarity_threshold: f32,
}

/// Person re-identification engine.
pub struct ReidEngine {
    config: EngineConfig,
    extractor: OnceCell<Arc<EmbeddingExtractor>>,
    state: Mutex<EngineState>,
    matcher: Matcher,
    dedup: NonPersonDeduplicator,
    clock: Arc<dyn Clock>,
    debug_mode: AtomicBool,
}

impl ReidEngine {
    /// Create an engine using the wall clock. The model is not loaded yet.
    pub fn new(config: EngineConfig) -> ReidResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an engine with an explicit clock.
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> ReidResult<Self> {
        config.validate()?;

        let state = EngineState {
            store: IdentityStore::new(),
            eviction: EvictionPolicy::new(config.tracking_window_ms),
            similarity_threshold: config.similarity_threshold,
        };

        Ok(Self {
            debug_mode: AtomicBool::new(config.debug_mode),
            config,
            extractor: OnceCell::new(),
            state: Mutex::new(state),
            matcher: Matcher::new(EMBEDDING_DIM),
            dedup: NonPersonDeduplicator::new(),
            clock,
        })
    }

    /// Load the ONNX model from the configured location.
    ///
    /// Safe to call concurrently: the model is loaded at most once and every
    /// caller observes the same outcome of that load.
    pub async fn initialize(&self) -> ReidResult<()> {
        self.extractor
            .get_or_try_init(|| async {
                let model_path = self.config.resolve_model_path()?;
                let model =
                    tokio::task::spawn_blocking(move || OrtEmbeddingModel::load(&model_path))
                        .await
                        .map_err(|e| {
                            ReidError::internal(format!("Blocking task join error: {e}"))
                        })??;

                info!(model = %model.name(), "Re-identification engine initialized");
                Ok::<_, ReidError>(Arc::new(EmbeddingExtractor::new(
                    Arc::new(model),
                    self.config.norm_tolerance,
                )))
            })
            .await?;
        Ok(())
    }

    /// Install an already constructed model. No-op if a model is present.
    pub async fn initialize_with(&self, model: Arc<dyn EmbeddingModel>) {
        let tolerance = self.config.norm_tolerance;
        let extractor = self
            .extractor
            .get_or_init(|| async move { Arc::new(EmbeddingExtractor::new(model, tolerance)) })
            .await;
        debug!(model = %extractor.model_name(), "Embedding model installed");
    }

    pub fn is_initialized(&self) -> bool {
        self.extractor.initialized()
    }

    /// Re-identify one cropped detection.
    ///
    /// Eviction always runs first. A failure never inserts or refreshes an
    /// identity.
    pub async fn process_detection(
        &self,
        image: Vec<u8>,
        camera_id: &str,
        camera_name: &str,
        class: &DetectionClass,
    ) -> ReidResult<MatchResult> {
        let result = self
            .process_detection_inner(image, camera_id, camera_name, class)
            .await;

        match &result {
            Ok(outcome) => metrics::record_detection(class.as_str(), outcome.outcome_label()),
            Err(e) => {
                metrics::record_detection(class.as_str(), "error");
                warn!(
                    camera_name = %camera_name,
                    class = %class,
                    error_kind = e.kind(),
                    "Detection rejected: {}", e
                );
            }
        }

        result
    }

    async fn process_detection_inner(
        &self,
        image: Vec<u8>,
        camera_id: &str,
        camera_name: &str,
        class: &DetectionClass,
    ) -> ReidResult<MatchResult> {
        let extractor = self
            .extractor
            .get()
            .cloned()
            .ok_or(ReidError::NotInitialized)?;

        if !class.supports_embedding() {
            let mut state = self.state.lock().await;
            let now_ms = self.clock.now_ms();
            self.evict(&mut state, now_ms);

            let window = state.eviction.tracking_window_ms();
            let result = self
                .dedup
                .observe(&mut state.store, class, camera_id, camera_name, now_ms, window);
            metrics::set_tracked_identities(state.store.len());

            decision!(
                self.verbose(),
                identity_id = %result.identity_id(),
                class = %class,
                camera_name = %camera_name,
                is_new = result.is_new(),
                "Non-person detection deduplicated"
            );
            return Ok(result);
        }

        {
            let mut state = self.state.lock().await;
            let now_ms = self.clock.now_ms();
            self.evict(&mut state, now_ms);
            metrics::set_tracked_identities(state.store.len());
        }

        let (embedding, image) = tokio::task::spawn_blocking(move || {
            let embedding = extractor.extract(&image)?;
            Ok::<_, ReidError>((embedding, image))
        })
        .await
        .map_err(|e| ReidError::internal(format!("Blocking task join error: {e}")))??;

        let mut state = self.state.lock().await;
        let now_ms = self.clock.now_ms();
        self.evict(&mut state, now_ms);

        let result =
            self.match_or_insert(&mut state, embedding, image, camera_id, camera_name, now_ms);
        metrics::set_tracked_identities(state.store.len());
        result
    }

    /// Refresh the best match if it clears the threshold, else create an identity.
    fn match_or_insert(
        &self,
        state: &mut EngineState,
        embedding: Embedding,
        image: Vec<u8>,
        camera_id: &str,
        camera_name: &str,
        now_ms: i64,
    ) -> ReidResult<MatchResult> {
        let best = self.matcher.find_best_match(&state.store, &embedding);

        if let Some(best) = best.filter(|m| m.similarity >= state.similarity_threshold) {
            let record = state
                .store
                .get_mut(&best.identity_id)
                .ok_or_else(|| ReidError::internal("Matched identity vanished from store"))?;
            record.refresh(camera_id, camera_name, now_ms);

            decision!(
                self.verbose(),
                identity_id = %best.identity_id,
                camera_name = %camera_name,
                similarity = best.similarity,
                "ReID match"
            );

            return Ok(MatchResult::Existing {
                first_detection: Some(record.summary()),
                identity_id: best.identity_id,
                similarity: Some(best.similarity),
            });
        }

        let identity_id = IdentityId::new_person(now_ms);
        let record = TrackedIdentity::person(
            identity_id.clone(),
            embedding,
            camera_id,
            camera_name,
            Some(image),
            now_ms,
        );
        let summary = record.summary();
        state.store.put(record);

        decision!(
            self.verbose(),
            identity_id = %identity_id,
            camera_name = %camera_name,
            "New identity"
        );

        Ok(MatchResult::New {
            identity_id,
            first_detection: Some(summary),
        })
    }

    fn evict(&self, state: &mut EngineState, now_ms: i64) -> usize {
        let evicted = state.eviction.cleanup(&mut state.store, now_ms);
        if !evicted.is_empty() {
            decision!(
                self.verbose(),
                evicted = evicted.len(),
                remaining = state.store.len(),
                "Evicted stale identities"
            );
        }
        metrics::record_evictions(evicted.len());
        evicted.len()
    }

    fn verbose(&self) -> bool {
        self.debug_mode.load(Ordering::Relaxed)
    }

    /// Change the tracking window and immediately evict under the new window.
    ///
    /// Returns the number of identities evicted.
    pub async fn set_tracking_window(&self, ms: u64) -> ReidResult<usize> {
        validate_tracking_window(ms)?;

        let mut state = self.state.lock().await;
        state.eviction.set_tracking_window(ms);
        let now_ms = self.clock.now_ms();
        let evicted = self.evict(&mut state, now_ms);
        metrics::set_tracked_identities(state.store.len());

        info!(tracking_window_ms = ms, evicted = evicted, "Tracking window updated");
        Ok(evicted)
    }

    pub async fn set_similarity_threshold(&self, threshold: f32) -> ReidResult<()> {
        validate_similarity_threshold(threshold)?;
        self.state.lock().await.similarity_threshold = threshold;
        info!(similarity_threshold = threshold, "Similarity threshold updated");
        Ok(())
    }

    pub fn set_debug_mode(&self, enabled: bool) {
        self.debug_mode.store(enabled, Ordering::Relaxed);
    }

    /// Current effective configuration.
    pub async fn config(&self) -> EngineConfig {
        let state = self.state.lock().await;
        EngineConfig {
            tracking_window_ms: state.eviction.tracking_window_ms(),
            similarity_threshold: state.similarity_threshold,
            debug_mode: self.verbose(),
            ..self.config.clone()
        }
    }

    pub async fn stats(&self) -> EngineStats {
        let tracked_count = self.state.lock().await.store.len();
        EngineStats {
            tracked_count,
            approx_cache_bytes: tracked_count * EMBEDDING_DIM * std::mem::size_of::<f32>(),
        }
    }

    pub async fn health(&self) -> EngineHealth {
        EngineHealth {
            model_loaded: self.is_initialized(),
            tracked_count: self.state.lock().await.store.len(),
        }
    }

    /// Image that created a live identity.
    pub async fn snapshot(&self, identity_id: &IdentityId) -> Option<Vec<u8>> {
        let state = self.state.lock().await;
        state
            .store
            .get(identity_id)
            .and_then(|record| record.snapshot())
            .map(<[u8]>::to_vec)
    }

    /// Drop every tracked identity.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.store.clear();
        metrics::set_tracked_identities(0);
        decision!(self.verbose(), "Cleared all tracked identities");
    }
}
