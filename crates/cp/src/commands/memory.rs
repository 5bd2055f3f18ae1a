//! `cp memory` -- hierarchical agent memory (§4.6).

use std::io::Write;

use anyhow::{bail, Result};

use palace_core::filter::RetrievalFilter;

use crate::cli::{MemoryAddArgs, MemoryAddSubArgs, MemoryArgs, MemoryCommands, MemoryDeleteArgs, MemoryHotArgs, MemoryMoveArgs, MemorySyncArgs};
use crate::context::RuntimeContext;
use crate::engine::memory;
use crate::output::{self, shard_detail, shard_line};

pub fn run(ctx: &RuntimeContext, args: &MemoryArgs) -> Result<()> {
    match &args.command {
        MemoryCommands::Add(a) => add(ctx, a),
        MemoryCommands::List => list(ctx),
        MemoryCommands::Recall(a) => recall(ctx, a),
        MemoryCommands::Show(a) => show(ctx, &a.id),
        MemoryCommands::AddSub(a) => add_sub(ctx, a),
        MemoryCommands::Delete(a) => delete(ctx, a),
        MemoryCommands::Move(a) => move_cmd(ctx, a),
        MemoryCommands::Promote(a) => promote(ctx, &a.id),
        MemoryCommands::Tree(a) => tree(ctx, a.root.as_deref()),
        MemoryCommands::Hot(a) => hot(ctx, a),
        MemoryCommands::Sync(a) => sync(ctx, a),
    }
}

fn body_of(body: &Option<String>, body_file: &Option<std::path::PathBuf>) -> Result<String> {
    if let Some(body) = body {
        return Ok(body.clone());
    }
    if let Some(path) = body_file {
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(String::new())
}

fn add(ctx: &RuntimeContext, args: &MemoryAddArgs) -> Result<()> {
    let body = body_of(&args.body, &args.body_file)?;
    let embedding = ctx.embedding_provider();
    let root = memory::create_root(ctx.storage(), embedding.as_ref(), ctx.project(), &args.title, &body, ctx.agent())?;
    output::emit(ctx.output, &root, |s| shard_detail(s));
    Ok(())
}

fn list(ctx: &RuntimeContext) -> Result<()> {
    let roots = memory::list_roots(ctx.storage(), ctx.project())?;
    output::emit_list(ctx.output, &roots, |s| shard_line(s));
    Ok(())
}

fn recall(ctx: &RuntimeContext, args: &crate::cli::RecallArgs) -> Result<()> {
    let embedding = ctx.embedding_provider();
    let query_vector = embedding.embed(&args.query)?;

    let mut filter = RetrievalFilter::for_project(ctx.project());
    filter.limit = args.limit.unwrap_or(ctx.limit);
    filter.min_similarity = ctx.config.similarity_floor;

    let ranked = palace_retrieval::recall_vector(ctx.storage(), &query_vector, filter)?;
    output::emit_list(ctx.output, &ranked, |r| format!("{:.3}  {}", r.similarity, shard_line(&r.shard)));
    Ok(())
}

fn show(ctx: &RuntimeContext, id: &str) -> Result<()> {
    memory::touch(ctx.storage(), id)?;
    let shard = ctx.storage().get_shard(id)?;
    let children = memory::children(ctx.storage(), id)?;
    output::emit(ctx.output, &(shard.clone(), children.clone()), |_| {
        let mut out = shard_detail(&shard);
        if !children.is_empty() {
            out.push_str("\nchildren:\n");
            for c in &children {
                out.push_str(&format!("  {}\n", shard_line(&c.shard)));
            }
        }
        out
    });
    Ok(())
}

/// Resolves the sub-entry's summary: an explicit `--summary`, or (unless
/// `--no-ai`) an AI-proposed one presented for approve/edit/cancel on stdin.
fn resolve_summary(ctx: &RuntimeContext, args: &MemoryAddSubArgs, parent_title: &str, body: &str) -> Result<String> {
    if let Some(summary) = &args.summary {
        return Ok(summary.clone());
    }
    if args.no_ai {
        bail!("--summary is required when --no-ai is passed");
    }

    let generation = ctx.generation_provider();
    let proposed = memory::propose_child_summary(generation.as_ref(), parent_title, &args.title, body)?;

    eprintln!("proposed summary: {proposed}");
    eprint!("[a]ccept, [e]dit, [c]ancel? ");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    match line.trim().chars().next().unwrap_or('a') {
        'e' => {
            eprint!("summary: ");
            std::io::stderr().flush().ok();
            let mut edited = String::new();
            std::io::stdin().read_line(&mut edited)?;
            Ok(edited.trim().to_string())
        }
        'c' => bail!("cancelled"),
        _ => Ok(proposed),
    }
}

fn add_sub(ctx: &RuntimeContext, args: &MemoryAddSubArgs) -> Result<()> {
    let body = body_of(&args.body, &args.body_file)?;
    let parent = ctx.storage().get_shard(&args.parent)?;
    let summary = resolve_summary(ctx, args, &parent.title, &body)?;

    let embedding = ctx.embedding_provider();
    let child = memory::add_sub(ctx.storage(), embedding.as_ref(), ctx.project(), &args.parent, &args.title, &body, &args.labels, summary, ctx.agent())?;
    output::emit(ctx.output, &child, |s| shard_detail(s));
    Ok(())
}

fn delete(ctx: &RuntimeContext, args: &MemoryDeleteArgs) -> Result<()> {
    memory::delete(ctx.storage(), &args.id, args.recursive)?;
    output::emit(ctx.output, &serde_json::json!({"deleted": args.id}), |_| format!("deleted {}", args.id));
    Ok(())
}

fn move_cmd(ctx: &RuntimeContext, args: &MemoryMoveArgs) -> Result<()> {
    memory::move_shard(ctx.storage(), &args.id, args.new_parent.as_deref())?;
    let shard = ctx.storage().get_shard(&args.id)?;
    output::emit(ctx.output, &shard, |s| shard_detail(s));
    Ok(())
}

fn promote(ctx: &RuntimeContext, id: &str) -> Result<()> {
    let shard = memory::promote(ctx.storage(), id)?;
    output::emit(ctx.output, &shard, |s| shard_detail(s));
    Ok(())
}

fn tree(ctx: &RuntimeContext, root: Option<&str>) -> Result<()> {
    let nodes = memory::tree(ctx.storage(), ctx.project(), root)?;
    output::emit_list(ctx.output, &nodes, |n| format!("{}{} ({} children)", "  ".repeat(n.depth), shard_line(&n.shard), n.child_count));
    Ok(())
}

fn hot(ctx: &RuntimeContext, args: &MemoryHotArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.limit);
    let nodes = memory::hot(ctx.storage(), ctx.project(), args.min_depth, limit)?;
    output::emit_list(ctx.output, &nodes, |n| format!("{} access={} depth={}", shard_line(&n.shard), n.access_count, n.depth));
    Ok(())
}

fn sync(ctx: &RuntimeContext, args: &MemorySyncArgs) -> Result<()> {
    let report = memory::sync(ctx.storage(), ctx.project(), args.root.as_deref(), args.apply)?;
    output::emit(ctx.output, &report, |r| {
        if r.drifts.is_empty() {
            "no drift".to_string()
        } else {
            format!("{} drift(s) found{}", r.drifts.len(), if r.applied { " and healed" } else { "" })
        }
    });
    Ok(())
}
