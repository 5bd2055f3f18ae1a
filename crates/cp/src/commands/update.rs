//! `cp update` -- refreshes scaffolded template files to the current
//! version (§4.12). Single template today (`config.yaml`'s own manifest
//! entry); the manifest mechanism exists so future scaffolded files
//! (hooks, CI snippets) have somewhere to register their version.

use anyhow::Result;

use palace_config::config::{load_raw_project_config, save_project_config, TemplateEntry};
use palace_config::find_palace_dir_or_error;

use crate::commands::init::TEMPLATE_VERSION;
use crate::context::RuntimeContext;
use crate::output;

pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let palace_dir = find_palace_dir_or_error(&cwd)?;
    let mut raw = load_raw_project_config(&palace_dir)?;

    let mut refreshed = Vec::new();
    for entry in &mut raw.templates.entries {
        if entry.version < TEMPLATE_VERSION {
            refreshed.push(entry.path.clone());
            entry.version = TEMPLATE_VERSION;
        }
    }
    if !raw.templates.entries.iter().any(|e| e.path == "config.yaml") {
        raw.templates.entries.push(TemplateEntry { path: "config.yaml".to_string(), version: TEMPLATE_VERSION });
        refreshed.push("config.yaml".to_string());
    }

    save_project_config(&palace_dir, &raw)?;

    output::emit(ctx.output, &refreshed, |r| {
        if r.is_empty() {
            "already up to date".to_string()
        } else {
            format!("refreshed: {}", r.join(", "))
        }
    });
    Ok(())
}
