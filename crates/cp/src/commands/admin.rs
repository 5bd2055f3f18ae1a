//! `cp admin` -- maintenance operations (§4.12).

use anyhow::Result;

use palace_core::filter::ShardFilter;
use palace_storage::{ShardUpdates, Storage};

use crate::cli::{AdminArgs, AdminCommands, EmbedBackfillArgs};
use crate::context::RuntimeContext;
use crate::output;

pub fn run(ctx: &RuntimeContext, args: &AdminArgs) -> Result<()> {
    match &args.command {
        AdminCommands::EmbedBackfill(a) => embed_backfill(ctx, a),
    }
}

/// Computes and stores embeddings for every shard in the project that has
/// content but no embedding yet. With `--dry-run`, reports the candidate
/// count without calling the provider or writing anything.
fn embed_backfill(ctx: &RuntimeContext, args: &EmbedBackfillArgs) -> Result<()> {
    let candidates: Vec<_> = ctx
        .storage()
        .list_shards(&ShardFilter::for_project(ctx.project()))?
        .into_iter()
        .filter(|s| s.embedding.is_none() && !s.content.is_empty())
        .collect();

    if args.dry_run {
        output::emit(ctx.output, &serde_json::json!({"candidates": candidates.len()}), |_| format!("{} shard(s) would be embedded", candidates.len()));
        return Ok(());
    }

    let embedding = ctx.embedding_provider();
    let mut updated = 0usize;
    let mut failed = 0usize;
    for shard in &candidates {
        match embedding.embed(&shard.content) {
            Ok(vector) => {
                ctx.storage().update_shard(&shard.id, &ShardUpdates { embedding: Some(Some(vector)), ..Default::default() })?;
                updated += 1;
            }
            Err(e) => {
                tracing::warn!(shard_id = %shard.id, error = %e, "embed-backfill: embedding provider failed for shard");
                failed += 1;
            }
        }
    }

    output::emit(ctx.output, &serde_json::json!({"updated": updated, "failed": failed}), |_| format!("embedded {updated} shard(s), {failed} failed"));
    Ok(())
}
