//! `cp init` -- scaffolds a new `.palace/` project directory (§4.2, §4.12).

use anyhow::{bail, Result};

use palace_config::config::{save_project_config, RawConfig, TemplateEntry};
use palace_config::ensure_palace_dir;

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output;

/// Bumped whenever the scaffolded config's shape changes; `cp update`
/// compares this against each entry's recorded version to decide what to
/// refresh.
pub const TEMPLATE_VERSION: u32 = 1;

pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let already_initialized = cwd.join(".palace").join("config.yaml").is_file();
    if already_initialized && !args.force {
        bail!("{} already has a .palace/config.yaml; pass --force to overwrite", cwd.display());
    }

    let palace_dir = ensure_palace_dir(&cwd)?;
    let mut raw = RawConfig::default();
    raw.project = Some(ctx.project().to_string());
    raw.templates.entries.push(TemplateEntry { path: "config.yaml".to_string(), version: TEMPLATE_VERSION });
    save_project_config(&palace_dir, &raw)?;

    output::emit(ctx.output, &serde_json::json!({"initialized": palace_dir.display().to_string()}), |_| {
        format!("initialized {}", palace_dir.display())
    });
    Ok(())
}
