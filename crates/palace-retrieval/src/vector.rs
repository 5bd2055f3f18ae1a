//! Vector (embedding) retrieval (§4.4, operator 2).
//!
//! The caller supplies an already-computed query embedding (the HTTP call to
//! the embedding provider lives in the `cp` binary crate, not here). Ranking
//! is an exact brute-force cosine scan over every shard in the project
//! carrying a non-null embedding -- the documented substitution for a true
//! ANN index (see DESIGN.md).

use serde::Serialize;

use palace_core::filter::RetrievalFilter;
use palace_core::shard::Shard;
use palace_storage::Storage;

use crate::error::{Result, RetrievalError};
use crate::filters::matches_retrieval_filter;

/// A shard ranked by similarity to a query embedding.
#[derive(Debug, Clone, Serialize)]
pub struct RankedShard {
    pub shard: Shard,
    pub similarity: f32,
}

/// Computes cosine similarity between two equal-length vectors.
///
/// Returns [`RetrievalError::DimensionMismatch`] if the lengths differ --
/// per §4.4 a dimension mismatch is fatal, never silently coerced.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32> {
    if query.len() != candidate.len() {
        return Err(RetrievalError::DimensionMismatch {
            expected: query.len(),
            actual: candidate.len(),
        });
    }

    let mut dot = 0.0_f32;
    let mut norm_q = 0.0_f32;
    let mut norm_c = 0.0_f32;
    for (q, c) in query.iter().zip(candidate.iter()) {
        dot += q * c;
        norm_q += q * q;
        norm_c += c * c;
    }

    let denom = (norm_q * norm_c).sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / denom)
}

/// Ranks every embedded shard in `filter.project` against `query_embedding`,
/// keeping only results at or above `filter.min_similarity`, sorted by
/// descending similarity and truncated to `filter.limit`.
pub fn vector_retrieve(storage: &dyn Storage, query_embedding: &[f32], filter: &RetrievalFilter) -> Result<Vec<RankedShard>> {
    let candidates = storage.shards_with_embedding(&filter.project)?;

    let mut ranked = Vec::new();
    for shard in candidates {
        if !matches_retrieval_filter(storage, &shard, filter)? {
            continue;
        }
        // `shards_with_embedding` only returns non-null embeddings.
        let embedding = shard.embedding.as_deref().expect("filtered to non-null embeddings");
        let similarity = cosine_similarity(query_embedding, embedding)?;
        if similarity >= filter.min_similarity {
            ranked.push(RankedShard { shard, similarity });
        }
    }

    ranked.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(filter.limit);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::shard::ShardBuilder;
    use palace_storage::SqliteStore;

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_is_zero() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_dimension_mismatch_is_fatal() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, RetrievalError::DimensionMismatch { .. }));
    }

    #[test]
    fn vector_retrieve_filters_below_similarity_floor() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_shard(&ShardBuilder::new("palace", "Close match").id("pf-v1").embedding(vec![1.0, 0.0]).build())
            .unwrap();
        store
            .create_shard(&ShardBuilder::new("palace", "Far match").id("pf-v2").embedding(vec![0.0, 1.0]).build())
            .unwrap();

        let mut filter = RetrievalFilter::for_project("palace");
        filter.min_similarity = 0.5;

        let results = vector_retrieve(&store, &[1.0, 0.0], &filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].shard.id, "pf-v1");
    }

    #[test]
    fn vector_retrieve_excludes_shards_without_embeddings() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_shard(&ShardBuilder::new("palace", "No vec").id("pf-v3").build())
            .unwrap();

        let filter = RetrievalFilter::for_project("palace");
        let results = vector_retrieve(&store, &[1.0, 0.0], &filter).unwrap();
        assert!(results.is_empty());
    }
}
