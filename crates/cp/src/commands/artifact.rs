//! `cp artifact add` -- links an existing shard to a requirement as its
//! artifact (§4.8), via a forward `has-artifact` edge from requirement to
//! artifact. `requirement::verify`'s test-artifact check reads this same
//! direction.

use anyhow::Result;

use palace_core::edge::Edge;
use palace_core::enums::EdgeType;
use palace_storage::Storage;

use crate::cli::{ArtifactAddArgs, ArtifactArgs, ArtifactCommands};
use crate::context::RuntimeContext;
use crate::output;

pub fn run(ctx: &RuntimeContext, args: &ArtifactArgs) -> Result<()> {
    match &args.command {
        ArtifactCommands::Add(a) => add(ctx, a),
    }
}

fn add(ctx: &RuntimeContext, args: &ArtifactAddArgs) -> Result<()> {
    ctx.storage().get_shard(&args.requirement)?;
    ctx.storage().get_shard(&args.artifact)?;
    ctx.storage().add_edge(&Edge::new(args.requirement.as_str(), args.artifact.as_str(), EdgeType::HasArtifact))?;
    output::emit(ctx.output, &serde_json::json!({"linked": true}), |_| format!("{} has artifact {}", args.requirement, args.artifact));
    Ok(())
}
