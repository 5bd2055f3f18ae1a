//! `cp shard` -- generic shard CRUD and graph operations (§4.1, §4.3).

use anyhow::Result;

use palace_core::edge::Edge;
use palace_core::enums::{EdgeType, ShardType, Status};
use palace_core::filter::{RetrievalFilter, ShardFilter};
use palace_core::shard::ShardBuilder;
use palace_storage::{ShardUpdates, Storage};

use crate::cli::{ShardArgs, ShardCloseArgs, ShardCommands, ShardCreateArgs, ShardIdArgs, ShardLabelArgs, ShardLinkArgs, ShardListArgs, ShardShowArgs, ShardUpdateArgs};
use crate::context::RuntimeContext;
use crate::output::{self, shard_detail, shard_line};

pub fn run(ctx: &RuntimeContext, args: &ShardArgs) -> Result<()> {
    match &args.command {
        ShardCommands::List(a) => list(ctx, a),
        ShardCommands::Show(a) => show(ctx, a),
        ShardCommands::Create(a) => create(ctx, a),
        ShardCommands::Update(a) => update(ctx, a),
        ShardCommands::Close(a) => close(ctx, a),
        ShardCommands::Reopen(a) => reopen(ctx, a),
        ShardCommands::Link(a) => link(ctx, a),
        ShardCommands::Unlink(a) => unlink(ctx, a),
        ShardCommands::Edges(a) => edges(ctx, a),
        ShardCommands::Label(a) => label(ctx, a),
        ShardCommands::Labels(a) => labels(ctx, a),
    }
}

fn list(ctx: &RuntimeContext, args: &ShardListArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.limit);

    let shards = if let Some(query) = &args.search {
        let mut filter = RetrievalFilter::for_project(ctx.project());
        filter.limit = limit;
        if let Some(t) = &args.shard_type {
            filter.types.push(ShardType::from(t.as_str()));
        }
        if let Some(s) = &args.status {
            filter.statuses.push(Status::from(s.as_str()));
        }
        palace_retrieval::keyword_retrieve(ctx.storage(), query, &filter)?
    } else {
        let mut filter = ShardFilter::for_project(ctx.project()).with_limit(limit as i64);
        if let Some(t) = &args.shard_type {
            filter = filter.with_type(ShardType::from(t.as_str()));
        }
        if let Some(s) = &args.status {
            filter = filter.with_status(Status::from(s.as_str()));
        }
        ctx.storage().list_shards(&filter)?
    };

    output::emit_list(ctx.output, &shards, |s| shard_line(s));
    Ok(())
}

fn show(ctx: &RuntimeContext, args: &ShardShowArgs) -> Result<()> {
    let shard = ctx.storage().get_shard(&args.id)?;
    output::emit(ctx.output, &shard, |s| shard_detail(s));
    Ok(())
}

fn create(ctx: &RuntimeContext, args: &ShardCreateArgs) -> Result<()> {
    let content = args.content.as_deref().unwrap_or("");
    let prefix = crate::engine::prefix_for_project(ctx.project());
    let id = crate::engine::mint_unique_id(ctx.storage(), ctx.project(), &prefix, &args.title, content, ctx.agent())?;

    let mut builder = ShardBuilder::new(ctx.project(), &args.title)
        .id(id)
        .content(content)
        .shard_type(ShardType::from(args.shard_type.as_str()))
        .priority(args.priority)
        .creator(ctx.agent());
    if let Some(parent) = &args.parent {
        builder = builder.parent(parent.as_str());
    }
    let shard = builder.build();
    palace_core::validation::validate(&shard)?;
    ctx.storage().create_shard(&shard)?;

    output::emit(ctx.output, &shard, |s| shard_detail(s));
    Ok(())
}

fn update(ctx: &RuntimeContext, args: &ShardUpdateArgs) -> Result<()> {
    ctx.storage().update_shard(
        &args.id,
        &ShardUpdates {
            title: args.title.clone(),
            content: args.content.clone(),
            priority: args.priority,
            owner: args.owner.clone().map(Some),
            ..Default::default()
        },
    )?;
    let shard = ctx.storage().get_shard(&args.id)?;
    output::emit(ctx.output, &shard, |s| shard_detail(s));
    Ok(())
}

fn close(ctx: &RuntimeContext, args: &ShardCloseArgs) -> Result<()> {
    let mut shard = ctx.storage().get_shard(&args.id)?;
    shard.close(ctx.agent(), args.reason.clone());
    ctx.storage().update_shard(
        &args.id,
        &ShardUpdates {
            status: Some(shard.status),
            closed_at: Some(shard.closed_at),
            closed_by: Some(shard.closed_by.clone()),
            closed_reason: Some(shard.closed_reason.clone()),
            ..Default::default()
        },
    )?;
    let updated = ctx.storage().get_shard(&args.id)?;
    output::emit(ctx.output, &updated, |s| shard_detail(s));
    Ok(())
}

fn reopen(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let mut shard = ctx.storage().get_shard(&args.id)?;
    shard.reopen();
    ctx.storage().update_shard(
        &args.id,
        &ShardUpdates {
            status: Some(shard.status),
            closed_at: Some(None),
            closed_by: Some(None),
            closed_reason: Some(None),
            ..Default::default()
        },
    )?;
    let updated = ctx.storage().get_shard(&args.id)?;
    output::emit(ctx.output, &updated, |s| shard_detail(s));
    Ok(())
}

fn link(ctx: &RuntimeContext, args: &ShardLinkArgs) -> Result<()> {
    ctx.storage().get_shard(&args.from)?;
    ctx.storage().get_shard(&args.to)?;
    let edge_type = EdgeType::from(args.edge_type.as_str());
    ctx.storage().add_edge(&Edge::new(args.from.as_str(), args.to.as_str(), edge_type.clone()))?;
    if edge_type == EdgeType::Implements {
        crate::engine::requirement::maybe_auto_in_progress(ctx.storage(), &args.to)?;
    }
    output::emit(ctx.output, &serde_json::json!({"linked": true}), |_| format!("linked {} -> {} ({})", args.from, args.to, args.edge_type));
    Ok(())
}

fn unlink(ctx: &RuntimeContext, args: &ShardLinkArgs) -> Result<()> {
    ctx.storage().remove_edge(&args.from, &args.to, &EdgeType::from(args.edge_type.as_str()))?;
    output::emit(ctx.output, &serde_json::json!({"unlinked": true}), |_| format!("unlinked {} -> {} ({})", args.from, args.to, args.edge_type));
    Ok(())
}

fn edges(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let edges = ctx.storage().list_edges(&args.id)?;
    output::emit_list(ctx.output, &edges, |e| format!("{} --{}--> {}", e.from, e.edge_type.as_str(), e.to));
    Ok(())
}

fn label(ctx: &RuntimeContext, args: &ShardLabelArgs) -> Result<()> {
    ctx.storage().add_label(&args.id, &args.label)?;
    output::emit(ctx.output, &serde_json::json!({"labeled": true}), |_| format!("labeled {} with {}", args.id, args.label));
    Ok(())
}

fn labels(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let labels = ctx.storage().get_labels(&args.id)?;
    output::emit_list(ctx.output, &labels, |l| l.clone());
    Ok(())
}
