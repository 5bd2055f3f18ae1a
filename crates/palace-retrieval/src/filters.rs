//! Shared post-ranking filter narrowing for the retrieval operators.

use palace_core::filter::RetrievalFilter;
use palace_core::shard::Shard;
use palace_storage::Storage;

use crate::error::Result;

/// Returns whether `shard` satisfies `filter`'s type/label/status/since
/// narrowing. Labels require a lookup since they aren't part of the shard
/// row itself.
pub(crate) fn matches_retrieval_filter(storage: &dyn Storage, shard: &Shard, filter: &RetrievalFilter) -> Result<bool> {
    if !filter.types.is_empty() && !filter.types.contains(&shard.shard_type) {
        return Ok(false);
    }
    if !filter.statuses.is_empty() && !filter.statuses.contains(&shard.status) {
        return Ok(false);
    }
    if let Some(since) = filter.since {
        if shard.created_at < since {
            return Ok(false);
        }
    }
    if !filter.labels.is_empty() {
        let labels = storage.get_labels(&shard.id)?;
        if !filter.labels.iter().any(|l| labels.contains(l)) {
            return Ok(false);
        }
    }
    Ok(true)
}
