//! Full-text keyword retrieval (§4.4, operator 1).
//!
//! Delegates the relevance-ranked FTS5 match itself to `palace-storage`,
//! then narrows the ranked list by the type/label/status/since filters that
//! FTS5 ranking alone doesn't express, preserving the rank order.

use palace_core::filter::RetrievalFilter;
use palace_core::shard::Shard;
use palace_storage::Storage;

use crate::error::Result;
use crate::filters::matches_retrieval_filter;

/// Runs a keyword query over `title||content`, ranked by FTS5 relevance,
/// narrowed by `filter`.
pub fn keyword_retrieve(storage: &dyn Storage, query: &str, filter: &RetrievalFilter) -> Result<Vec<Shard>> {
    // Over-fetch before filtering and truncating so the post-filter doesn't
    // starve the result set below `filter.limit`.
    let over_fetch = filter.limit.saturating_mul(4).max(50);
    let candidates = storage.keyword_search(&filter.project, query, over_fetch)?;

    let mut out = Vec::with_capacity(filter.limit);
    for shard in candidates {
        if out.len() >= filter.limit {
            break;
        }
        if matches_retrieval_filter(storage, &shard, filter)? {
            out.push(shard);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::enums::ShardType;
    use palace_core::shard::ShardBuilder;
    use palace_storage::SqliteStore;

    #[test]
    fn keyword_retrieve_respects_type_filter() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_shard(
                &ShardBuilder::new("palace", "Deploy runbook")
                    .id("pf-k1")
                    .content("steps to deploy the service")
                    .shard_type(ShardType::Doc)
                    .build(),
            )
            .unwrap();
        store
            .create_shard(
                &ShardBuilder::new("palace", "Deploy incident")
                    .id("pf-k2")
                    .content("deploy caused an outage")
                    .shard_type(ShardType::Memory)
                    .build(),
            )
            .unwrap();

        let mut filter = RetrievalFilter::for_project("palace");
        filter.types = vec![ShardType::Memory];

        let results = keyword_retrieve(&store, "deploy", &filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "pf-k2");
    }
}
