//! `cp requirement` -- requirement lifecycle (§4.8).

use anyhow::Result;

use crate::cli::{RequirementArgs, RequirementCommands, RequirementCreateArgs, RequirementReopenArgs, RequirementVerifyArgs, ShardIdArgs, ShardLinkArgs};
use crate::context::RuntimeContext;
use crate::engine::requirement;
use crate::output::{self, shard_detail, shard_line};

pub fn run(ctx: &RuntimeContext, args: &RequirementArgs) -> Result<()> {
    match &args.command {
        RequirementCommands::Create(a) => create(ctx, a),
        RequirementCommands::List => list(ctx),
        RequirementCommands::Show(a) => show(ctx, a),
        RequirementCommands::Approve(a) => approve(ctx, a),
        RequirementCommands::Verify(a) => verify(ctx, a),
        RequirementCommands::Reopen(a) => reopen(ctx, a),
        RequirementCommands::Link(a) => link(ctx, a),
        RequirementCommands::Unlink(a) => unlink(ctx, a),
        RequirementCommands::Dashboard => dashboard(ctx),
    }
}

fn create(ctx: &RuntimeContext, args: &RequirementCreateArgs) -> Result<()> {
    let content = args.content.as_deref().unwrap_or("");
    let req = requirement::create(ctx.storage(), ctx.project(), &args.title, content, args.priority, args.category.as_deref(), ctx.agent())?;
    output::emit(ctx.output, &req, |s| shard_detail(s));
    Ok(())
}

fn list(ctx: &RuntimeContext) -> Result<()> {
    let reqs = requirement::list(ctx.storage(), ctx.project())?;
    output::emit_list(ctx.output, &reqs, |s| shard_line(s));
    Ok(())
}

fn show(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let req = ctx.storage().get_shard(&args.id)?;
    output::emit(ctx.output, &req, |s| shard_detail(s));
    Ok(())
}

fn approve(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let req = requirement::approve(ctx.storage(), &args.id)?;
    output::emit(ctx.output, &req, |s| shard_detail(s));
    Ok(())
}

fn verify(ctx: &RuntimeContext, args: &RequirementVerifyArgs) -> Result<()> {
    let req = requirement::verify(ctx.storage(), &args.id, args.force)?;
    output::emit(ctx.output, &req, |s| shard_detail(s));
    Ok(())
}

fn reopen(ctx: &RuntimeContext, args: &RequirementReopenArgs) -> Result<()> {
    let req = requirement::reopen(ctx.storage(), &args.id, args.reason.as_deref())?;
    output::emit(ctx.output, &req, |s| shard_detail(s));
    Ok(())
}

fn link(ctx: &RuntimeContext, args: &ShardLinkArgs) -> Result<()> {
    requirement::link(ctx.storage(), &args.from, &args.to)?;
    output::emit(ctx.output, &serde_json::json!({"linked": true}), |_| format!("{} blocked by {}", args.from, args.to));
    Ok(())
}

fn unlink(ctx: &RuntimeContext, args: &ShardLinkArgs) -> Result<()> {
    requirement::unlink(ctx.storage(), &args.from, &args.to)?;
    output::emit(ctx.output, &serde_json::json!({"unlinked": true}), |_| format!("{} no longer blocked by {}", args.from, args.to));
    Ok(())
}

fn dashboard(ctx: &RuntimeContext) -> Result<()> {
    let rows = requirement::dashboard(ctx.storage(), ctx.project())?;
    output::emit_list(ctx.output, &rows, |r| {
        let blockers = if r.unresolved_blocker_ids.is_empty() { String::new() } else { format!(" blocked_by={}", r.unresolved_blocker_ids.join(",")) };
        format!(
            "{}  [{}] p{} {}  tasks={}/{} tests={}{}",
            r.id, r.lifecycle_status, r.priority, r.title, r.closed_task_count, r.linked_task_count, r.linked_test_count, blockers
        )
    });
    Ok(())
}
