//! `cp epic` -- epics grouping work (§4.9).

use anyhow::Result;
use palace_storage::Storage;

use crate::cli::{EpicArgs, EpicCommands, EpicCreateArgs, EpicShowArgs};
use crate::context::RuntimeContext;
use crate::engine::work;
use crate::output::{self, shard_detail, shard_line};

pub fn run(ctx: &RuntimeContext, args: &EpicArgs) -> Result<()> {
    match &args.command {
        EpicCommands::Create(a) => create(ctx, a),
        EpicCommands::Show(a) => show(ctx, a),
        EpicCommands::List => list(ctx),
    }
}

fn create(ctx: &RuntimeContext, args: &EpicCreateArgs) -> Result<()> {
    let content = args.content.as_deref().unwrap_or("");
    let epic = work::create(ctx.storage(), ctx.project(), &args.title, content, &args.adopt, &args.order, ctx.agent())?;
    output::emit(ctx.output, &epic, |s| shard_detail(s));
    Ok(())
}

fn show(ctx: &RuntimeContext, args: &EpicShowArgs) -> Result<()> {
    let epic = ctx.storage().get_shard(&args.id)?;
    if !args.detail {
        output::emit(ctx.output, &epic, |s| shard_detail(s));
        return Ok(());
    }

    let progress = work::progress(ctx.storage(), &args.id)?;
    let children = work::children(ctx.storage(), &args.id)?;
    output::emit(ctx.output, &(epic.clone(), progress.clone(), children.clone()), |_| {
        let mut out = shard_detail(&epic);
        out.push_str(&format!(
            "\nprogress: {}/{} done, {} in progress, {} ready, {} blocked\n",
            progress.completed, progress.total, progress.in_progress, progress.open_unblocked, progress.open_blocked
        ));
        for c in &children {
            let blocked = if c.unresolved_blockers.is_empty() { String::new() } else { format!(" blocked_by={}", c.unresolved_blockers.join(",")) };
            out.push_str(&format!("  [{}] {}{}\n", c.kind, shard_line(&c.shard), blocked));
        }
        out
    });
    Ok(())
}

fn list(ctx: &RuntimeContext) -> Result<()> {
    let filter = palace_core::filter::ShardFilter::for_project(ctx.project()).with_type(palace_core::enums::ShardType::Epic);
    let epics = ctx.storage().list_shards(&filter)?;
    output::emit_list(ctx.output, &epics, |s| shard_line(s));
    Ok(())
}
