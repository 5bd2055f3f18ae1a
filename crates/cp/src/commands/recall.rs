//! `cp recall` -- semantic (vector) search over embedded shards (§4.4).

use anyhow::Result;

use palace_core::enums::ShardType;
use palace_core::filter::RetrievalFilter;

use crate::cli::RecallArgs;
use crate::context::RuntimeContext;
use crate::output::{self, shard_line};

pub fn run(ctx: &RuntimeContext, args: &RecallArgs) -> Result<()> {
    let embedding = ctx.embedding_provider();
    let query_vector = embedding.embed(&args.query)?;

    let mut filter = RetrievalFilter::for_project(ctx.project());
    filter.limit = args.limit.unwrap_or(ctx.limit);
    filter.min_similarity = ctx.config.similarity_floor;
    if let Some(t) = &args.shard_type {
        filter.types.push(ShardType::from(t.as_str()));
    }

    let ranked = palace_retrieval::vector_retrieve(ctx.storage(), &query_vector, &filter)?;
    output::emit_list(ctx.output, &ranked, |r| format!("{:.3}  {}", r.similarity, shard_line(&r.shard)));
    Ok(())
}
