//! `cp task` -- convenience verbs over a single work item (§4.9).
//!
//! A thin alias layer over `engine::work` and `engine::requirement`: `get`
//! is a scoped `shard show`, `claim` is `work::assign`, `progress` is
//! `work::next` (or `work::progress` with `--epic`), and `close` is
//! `work::close` followed by the linked requirement's auto-transition.

use anyhow::Result;
use palace_storage::Storage;

use crate::cli::{ShardCloseArgs, ShardIdArgs, TaskArgs, TaskCommands, TaskProgressArgs};
use crate::context::RuntimeContext;
use crate::engine::{requirement, work};
use crate::output::{self, shard_detail, shard_line};

pub fn run(ctx: &RuntimeContext, args: &TaskArgs) -> Result<()> {
    match &args.command {
        TaskCommands::Get(a) => get(ctx, a),
        TaskCommands::Claim(a) => claim(ctx, a),
        TaskCommands::Progress(a) => progress(ctx, a),
        TaskCommands::Close(a) => close(ctx, a),
    }
}

fn get(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let shard = ctx.storage().get_shard(&args.id)?;
    output::emit(ctx.output, &shard, |s| shard_detail(s));
    Ok(())
}

fn claim(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let shard = work::assign(ctx.storage(), &args.id, ctx.agent())?;
    output::emit(ctx.output, &shard, |s| shard_detail(s));
    Ok(())
}

fn progress(ctx: &RuntimeContext, args: &TaskProgressArgs) -> Result<()> {
    if let Some(epic_id) = &args.epic {
        let p = work::progress(ctx.storage(), epic_id)?;
        output::emit(ctx.output, &p, |p| {
            format!("{}/{} done, {} in progress, {} ready, {} blocked", p.completed, p.total, p.in_progress, p.open_unblocked, p.open_blocked)
        });
        return Ok(());
    }

    let limit = args.limit.unwrap_or(ctx.limit);
    let ready = work::next(ctx.storage(), ctx.project(), None, limit)?;
    output::emit_list(ctx.output, &ready, |s| shard_line(s));
    Ok(())
}

fn close(ctx: &RuntimeContext, args: &ShardCloseArgs) -> Result<()> {
    let result = work::close(ctx.storage(), &args.id, ctx.agent(), args.reason.as_deref())?;

    let implemented_reqs = ctx.storage().shards_via_edge(&args.id, &palace_core::enums::EdgeType::Implements, false)?;
    for req in &implemented_reqs {
        requirement::maybe_auto_implement(ctx.storage(), &req.id)?;
    }

    output::emit(ctx.output, &result, |r| {
        let mut out = shard_detail(&r.shard);
        if !r.unblocked.is_empty() {
            out.push_str("\nunblocked:\n");
            for s in &r.unblocked {
                out.push_str(&format!("  {}\n", shard_line(s)));
            }
        }
        out
    });
    Ok(())
}
