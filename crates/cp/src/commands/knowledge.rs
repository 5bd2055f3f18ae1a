//! `cp knowledge` -- versioned knowledge documents (§4.7).

use anyhow::Result;

use palace_core::enums::DocType;

use crate::cli::{KnowledgeArgs, KnowledgeCommands, KnowledgeCreateArgs, KnowledgeDiffArgs, KnowledgeUpdateArgs, ShardIdArgs};
use crate::context::RuntimeContext;
use crate::engine::knowledge;
use crate::output::{self, shard_detail, shard_line};

pub fn run(ctx: &RuntimeContext, args: &KnowledgeArgs) -> Result<()> {
    match &args.command {
        KnowledgeCommands::Create(a) => create(ctx, a),
        KnowledgeCommands::List => list(ctx),
        KnowledgeCommands::Show(a) => show(ctx, a),
        KnowledgeCommands::Update(a) => update(ctx, a),
        KnowledgeCommands::Append(a) => append(ctx, a),
        KnowledgeCommands::History(a) => history(ctx, a),
        KnowledgeCommands::Diff(a) => diff(ctx, a),
    }
}

fn content_of(content: &Option<String>, content_file: &Option<std::path::PathBuf>) -> Result<String> {
    if let Some(content) = content {
        return Ok(content.clone());
    }
    if let Some(path) = content_file {
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(String::new())
}

fn create(ctx: &RuntimeContext, args: &KnowledgeCreateArgs) -> Result<()> {
    let content = content_of(&args.content, &args.content_file)?;
    let doc = knowledge::create(ctx.storage(), ctx.project(), &args.title, &content, DocType::from(args.doc_type.as_str()), &args.labels, ctx.agent())?;
    output::emit(ctx.output, &doc, |s| shard_detail(s));
    Ok(())
}

fn list(ctx: &RuntimeContext) -> Result<()> {
    let docs = knowledge::list(ctx.storage(), ctx.project())?;
    output::emit_list(ctx.output, &docs, |s| shard_line(s));
    Ok(())
}

fn show(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let doc = ctx.storage().get_shard(&args.id)?;
    output::emit(ctx.output, &doc, |s| shard_detail(s));
    Ok(())
}

fn update(ctx: &RuntimeContext, args: &KnowledgeUpdateArgs) -> Result<()> {
    let content = content_of(&args.content, &args.content_file)?;
    let doc = knowledge::update(ctx.storage(), &args.id, &content, args.summary.clone(), ctx.agent())?;
    output::emit(ctx.output, &doc, |s| shard_detail(s));
    Ok(())
}

fn append(ctx: &RuntimeContext, args: &KnowledgeUpdateArgs) -> Result<()> {
    let content = content_of(&args.content, &args.content_file)?;
    let doc = knowledge::append(ctx.storage(), &args.id, &content, args.summary.clone(), ctx.agent())?;
    output::emit(ctx.output, &doc, |s| shard_detail(s));
    Ok(())
}

fn history(ctx: &RuntimeContext, args: &ShardIdArgs) -> Result<()> {
    let versions = knowledge::history(ctx.storage(), &args.id)?;
    output::emit_list(ctx.output, &versions, |s| {
        let v = s.metadata.get("version").and_then(|v| v.as_u64()).unwrap_or(1);
        let summary = s.metadata.get("last_change_summary").and_then(|v| v.as_str()).unwrap_or("");
        format!("v{v}  {summary}  {}", shard_line(s))
    });
    Ok(())
}

fn diff(ctx: &RuntimeContext, args: &KnowledgeDiffArgs) -> Result<()> {
    let text = knowledge::diff(ctx.storage(), &args.id, args.from, args.to)?;
    output::emit(ctx.output, &serde_json::json!({"diff": text}), |_| text.clone());
    Ok(())
}
