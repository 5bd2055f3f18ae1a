//! `cp status` -- project-wide statistics (§4.1).

use anyhow::Result;
use palace_storage::Storage;

use crate::context::RuntimeContext;
use crate::output;

pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let stats = ctx.storage().get_statistics(ctx.project())?;
    output::emit(ctx.output, &stats, |s| {
        let mut out = format!(
            "{} shards: {} open, {} in progress, {} closed\n",
            s.total_shards, s.open_shards, s.in_progress_shards, s.closed_shards
        );
        for (t, n) in &s.by_type {
            out.push_str(&format!("  {t}: {n}\n"));
        }
        out
    });
    Ok(())
}
