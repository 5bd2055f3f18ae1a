//! Output rendering: pretty JSON (the mandatory machine-readable form) or a
//! compact human-readable form, selected by `--output` (§4.12).

use clap::ValueEnum;
use serde::Serialize;

use palace_core::shard::Shard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Text
    }
}

/// Renders `value` as pretty JSON, or via `text` when `format` is `Text`.
/// JSON is the schema the §4.12 contract actually pins down; `text` is a
/// convenience view for a terminal and is free to be lossy.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T) -> String) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value).expect("engine result types always serialize")),
        OutputFormat::Text => println!("{}", text(value)),
    }
}

/// Renders a one-line-per-item list the same way `emit` renders a single
/// value.
pub fn emit_list<T: Serialize>(format: OutputFormat, items: &[T], line: impl Fn(&T) -> String) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items).expect("engine result types always serialize")),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("(none)");
            }
            for item in items {
                println!("{}", line(item));
            }
        }
    }
}

/// Renders a caught error per §4.12: a one-line message in text mode, a
/// `{"error": ...}` envelope in JSON mode. Always goes to stderr.
pub fn emit_error(format: OutputFormat, err: &anyhow::Error) {
    match format {
        OutputFormat::Json => {
            let envelope = serde_json::json!({ "error": format!("{err:#}") });
            eprintln!("{}", serde_json::to_string_pretty(&envelope).unwrap());
        }
        OutputFormat::Text => eprintln!("error: {err:#}"),
    }
}

/// Compact one-line rendering of a shard: `id [status] title (priority pN, owner)`.
pub fn shard_line(shard: &Shard) -> String {
    let owner = shard.owner.as_deref().unwrap_or("-");
    format!("{:<14} [{:<11}] p{} {:<8} {}", shard.id, shard.status.as_str(), shard.priority, owner, shard.title)
}

/// Multi-line rendering of a shard for `show`.
pub fn shard_detail(shard: &Shard) -> String {
    let mut out = format!(
        "{}\n  project:  {}\n  type:     {}\n  status:   {}\n  priority: {}\n  creator:  {}\n",
        shard.title,
        shard.project,
        shard.shard_type.as_str(),
        shard.status.as_str(),
        shard.priority,
        shard.creator,
    );
    if let Some(owner) = &shard.owner {
        out.push_str(&format!("  owner:    {owner}\n"));
    }
    if let Some(parent) = &shard.parent {
        out.push_str(&format!("  parent:   {parent}\n"));
    }
    out.push_str(&format!("  created:  {}\n", shard.created_at));
    out.push_str(&format!("  updated:  {}\n", shard.updated_at));
    if let Some(closed_at) = shard.closed_at {
        out.push_str(&format!("  closed:   {closed_at} by {} ({})\n", shard.closed_by.as_deref().unwrap_or("?"), shard.closed_reason.as_deref().unwrap_or("")));
    }
    if !shard.metadata.is_null() && shard.metadata.as_object().is_some_and(|m| !m.is_empty()) {
        out.push_str(&format!("  metadata: {}\n", shard.metadata));
    }
    if !shard.content.is_empty() {
        out.push_str(&format!("\n{}\n", shard.content));
    }
    out
}
