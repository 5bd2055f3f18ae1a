//! Orchestration engines: each module implements one vertical's write/read
//! operations by composing `palace-storage` and `palace-retrieval` (§4.6-§4.10).
//!
//! Engines take `&dyn Storage` (and, where relevant, `&dyn EmbeddingProvider`/
//! `&dyn GenerationProvider`) rather than a concrete `SqliteStore`, so they
//! can be exercised in tests against `SqliteStore::open_in_memory()` and
//! scripted provider doubles with no real I/O.

pub mod knowledge;
pub mod memory;
pub mod requirement;
pub mod summary;
pub mod work;

use chrono::Utc;
use palace_core::error::PalaceError;
use palace_core::idgen::{self, adaptive_defaults};
use palace_storage::Storage;

/// Mints a fresh `<prefix>-<hash>` id and retries on the rare collision,
/// growing the hash length adaptively with the project's current size
/// (§3, §4.1) rather than a fixed width.
pub fn mint_unique_id(storage: &dyn Storage, project: &str, prefix: &str, title: &str, content: &str, creator: &str) -> Result<String, PalaceError> {
    let num_shards = storage.get_statistics(project)?.total_shards as usize;
    let length = idgen::compute_adaptive_length(
        num_shards,
        adaptive_defaults::MIN_LENGTH,
        adaptive_defaults::MAX_LENGTH,
        adaptive_defaults::MAX_COLLISION_PROB,
    );

    let timestamp = Utc::now();
    for nonce in 0..1000 {
        let candidate = idgen::mint_id(prefix, title, content, creator, timestamp, length, nonce);
        match storage.get_shard(&candidate) {
            Err(e) if e.is_not_found() => return Ok(candidate),
            Err(e) => return Err(e.into()),
            Ok(_) => continue,
        }
    }
    Err(PalaceError::Inconsistent(format!("could not mint a unique id under prefix '{prefix}' after 1000 attempts")))
}

/// Derives a short id prefix from a project name: its first two
/// alphanumeric characters, lowercased, falling back to `"sh"` if the
/// project name has none (e.g. an all-punctuation name).
pub fn prefix_for_project(project: &str) -> String {
    let chars: String = project.chars().filter(|c| c.is_ascii_alphanumeric()).take(2).collect::<String>().to_lowercase();
    if chars.is_empty() {
        "sh".to_string()
    } else {
        chars
    }
}
