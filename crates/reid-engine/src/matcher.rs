//! Nearest-identity search by cosine similarity.
//!
//! Linear scan over every live identity, O(n·d) per lookup. The short
//! tracking window keeps n small, so no approximate index is used.

use reid_models::IdentityId;

use crate::extractor::Embedding;
use crate::store::IdentityStore;

/// Best candidate found for an embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    pub identity_id: IdentityId,
    pub similarity: f32,
}

/// Cosine similarity of two L2-normalized vectors.
#[inline]
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f32 {
    a.dot(b)
}

/// Similarity search over the identity store.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    dim: usize,
}

impl Matcher {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Find the most similar identity, regardless of any threshold.
    ///
    /// Records without an embedding of the expected dimension are skipped.
    /// Ties go to the first record in insertion order.
    pub fn find_best_match(
        &self,
        store: &IdentityStore,
        embedding: &Embedding,
    ) -> Option<BestMatch> {
        if embedding.dim() != self.dim {
            return None;
        }

        let mut best: Option<BestMatch> = None;

        for record in store.iter() {
            let Some(candidate) = record.embedding() else {
                continue;
            };
            if candidate.dim() != self.dim {
                continue;
            }

            let similarity = cosine_similarity(embedding, candidate);
            if similarity.is_nan() {
                continue;
            }

            let better = best
                .as_ref()
                .map_or(true, |current| similarity > current.similarity);
            if better {
                best = Some(BestMatch {
                    identity_id: record.identity_id().clone(),
                    similarity,
                });
            }
        }

        best
    }
}
