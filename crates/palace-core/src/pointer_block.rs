//! Pointer-block engine -- pure operations over the `sub-memories` block
//! embedded in a memory shard's content (§4.5).

use serde::{Deserialize, Serialize};

const OPEN_TAG: &str = "<!-- sub-memories -->";
const CLOSE_TAG: &str = "<!-- /sub-memories -->";

/// One entry in a pointer block: a pointer to a direct memory child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerBlockError {
    #[error("sub-memories block opened but never closed")]
    UnterminatedBlock,

    #[error("sub-memories block contains invalid JSON")]
    InvalidJson,
}

/// Result of [`parse`]: the content with the block stripped, the entries
/// (empty if no block), and an error if the block was malformed. When the
/// block is malformed, `main_content` is still the content with everything
/// from `OPEN_TAG` onward removed so callers can still render the prose.
pub struct ParsedBlock {
    pub main_content: String,
    pub entries: Vec<PointerEntry>,
    pub error: Option<PointerBlockError>,
}

/// Parses a shard's content for its pointer block. No block is not an
/// error: `(content, [], None)`.
pub fn parse(content: &str) -> ParsedBlock {
    let Some(open_idx) = content.find(OPEN_TAG) else {
        return ParsedBlock {
            main_content: content.to_string(),
            entries: Vec::new(),
            error: None,
        };
    };

    let main_content = content[..open_idx].trim_end().to_string();
    let after_open = &content[open_idx + OPEN_TAG.len()..];

    let Some(close_rel) = after_open.find(CLOSE_TAG) else {
        return ParsedBlock {
            main_content,
            entries: Vec::new(),
            error: Some(PointerBlockError::UnterminatedBlock),
        };
    };

    let inner = after_open[..close_rel].trim();
    match serde_json::from_str::<Vec<PointerEntry>>(inner) {
        Ok(entries) => ParsedBlock {
            main_content,
            entries,
            error: None,
        },
        Err(_) => ParsedBlock {
            main_content,
            entries: Vec::new(),
            error: Some(PointerBlockError::InvalidJson),
        },
    }
}

/// Appends an entry, preserving existing order. Creates the block if absent.
/// If the existing block was malformed, it is replaced rather than merged.
pub fn append(content: &str, entry: PointerEntry) -> String {
    let parsed = parse(content);
    let mut entries = parsed.entries;
    entries.push(entry);
    render(&parsed.main_content, &entries)
}

/// Drops the entry matching `id`. If that empties the list, the block
/// (and any blank lines it occupied) is removed entirely.
pub fn remove(content: &str, id: &str) -> String {
    let parsed = parse(content);
    let entries: Vec<PointerEntry> = parsed.entries.into_iter().filter(|e| e.id != id).collect();
    if entries.is_empty() {
        parsed.main_content
    } else {
        render(&parsed.main_content, &entries)
    }
}

/// Rewrites the block with exactly the given entries, discarding old ones.
pub fn replace_all(content: &str, entries: &[PointerEntry]) -> String {
    let parsed = parse(content);
    if entries.is_empty() {
        parsed.main_content
    } else {
        render(&parsed.main_content, entries)
    }
}

/// Serializes `entries` as pretty JSON (2-space indent) wrapped in the
/// delimiters, preceded by `main_content` and a blank line.
pub fn render(main_content: &str, entries: &[PointerEntry]) -> String {
    let json = serde_json::to_string_pretty(entries).expect("PointerEntry always serializes");
    if main_content.is_empty() {
        format!("{OPEN_TAG}\n{json}\n{CLOSE_TAG}")
    } else {
        format!("{main_content}\n\n{OPEN_TAG}\n{json}\n{CLOSE_TAG}")
    }
}
