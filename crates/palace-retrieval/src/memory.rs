//! Memory-specialized retrieval variant (§4.4).
//!
//! Restricts either operator to memory-type, non-closed shards and returns
//! full content, for direct inclusion in an agent's context window.

use palace_core::enums::{ShardType, Status};
use palace_core::filter::RetrievalFilter;
use palace_core::shard::Shard;
use palace_storage::Storage;

use crate::error::Result;
use crate::keyword::keyword_retrieve;
use crate::vector::{vector_retrieve, RankedShard};

fn memory_scoped(mut filter: RetrievalFilter) -> RetrievalFilter {
    filter.types = vec![ShardType::Memory];
    if filter.statuses.is_empty() {
        filter.statuses = vec![Status::Open, Status::InProgress];
    }
    filter
}

/// Keyword recall scoped to non-closed memory shards.
pub fn recall_keyword(storage: &dyn Storage, query: &str, filter: RetrievalFilter) -> Result<Vec<Shard>> {
    keyword_retrieve(storage, query, &memory_scoped(filter))
}

/// Vector recall scoped to non-closed memory shards.
pub fn recall_vector(storage: &dyn Storage, query_embedding: &[f32], filter: RetrievalFilter) -> Result<Vec<RankedShard>> {
    vector_retrieve(storage, query_embedding, &memory_scoped(filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use palace_core::enums::ShardType as ST;
    use palace_core::shard::ShardBuilder;
    use palace_storage::SqliteStore;

    #[test]
    fn recall_keyword_excludes_non_memory_and_closed() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_shard(
                &ShardBuilder::new("palace", "Open memory about deploys")
                    .id("pf-m1")
                    .content("deploy notes")
                    .shard_type(ST::Memory)
                    .build(),
            )
            .unwrap();
        store
            .create_shard(
                &ShardBuilder::new("palace", "Closed memory about deploys")
                    .id("pf-m2")
                    .content("deploy notes")
                    .shard_type(ST::Memory)
                    .status(Status::Closed)
                    .build(),
            )
            .unwrap();
        store
            .create_shard(
                &ShardBuilder::new("palace", "Deploy doc")
                    .id("pf-m3")
                    .content("deploy notes")
                    .shard_type(ST::Doc)
                    .build(),
            )
            .unwrap();

        let results = recall_keyword(&store, "deploy", RetrievalFilter::for_project("palace")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "pf-m1");
    }
}
