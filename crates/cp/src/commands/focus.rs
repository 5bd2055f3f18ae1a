//! `cp focus` -- per-agent active-epic pointer (§4.9).

use anyhow::Result;

use crate::cli::{FocusArgs, FocusCommands, FocusSetArgs};
use crate::context::RuntimeContext;
use crate::engine::work;
use crate::output;

pub fn run(ctx: &RuntimeContext, args: &FocusArgs) -> Result<()> {
    match &args.command {
        FocusCommands::Show => show(ctx),
        FocusCommands::Set(a) => set(ctx, a),
        FocusCommands::Clear => clear(ctx),
    }
}

fn show(ctx: &RuntimeContext) -> Result<()> {
    let focus = work::get_focus(ctx.storage(), ctx.project(), ctx.agent())?;
    output::emit(ctx.output, &focus, |f| match f {
        Some(f) => format!("focused on {} since {}{}", f.epic_id, f.set_at, f.note.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()),
        None => "no focus set".to_string(),
    });
    Ok(())
}

fn set(ctx: &RuntimeContext, args: &FocusSetArgs) -> Result<()> {
    work::set_focus(ctx.storage(), ctx.project(), ctx.agent(), &args.epic, args.note.as_deref())?;
    output::emit(ctx.output, &serde_json::json!({"focused": args.epic}), |_| format!("focused on {}", args.epic));
    Ok(())
}

fn clear(ctx: &RuntimeContext) -> Result<()> {
    let existed = work::clear_focus(ctx.storage(), ctx.project(), ctx.agent())?;
    output::emit(ctx.output, &serde_json::json!({"cleared": existed}), |_| if existed { "focus cleared".to_string() } else { "no focus was set".to_string() });
    Ok(())
}
