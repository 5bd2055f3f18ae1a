//! Discovery and management of the `.palace/` project directory.
//!
//! Mirrors the project's general directory-discovery convention: check an
//! environment override first, then walk up the directory tree.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

const PALACE_DIR_NAME: &str = ".palace";
const PALACE_DIR_ENV: &str = "CONTEXT_PALACE_DIR";

/// Walk up from `start` looking for a `.palace/` directory.
///
/// `CONTEXT_PALACE_DIR` is checked first (highest priority) and, if set to an
/// existing directory, short-circuits the walk entirely.
pub fn find_palace_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(PALACE_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;
    let mut current = start.as_path();
    loop {
        let candidate = current.join(PALACE_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => break,
        }
    }

    None
}

/// Like [`find_palace_dir`], but returns [`ConfigError::PalaceDirNotFound`]
/// instead of `None`.
pub fn find_palace_dir_or_error(start: &Path) -> Result<PathBuf, ConfigError> {
    find_palace_dir(start).ok_or(ConfigError::PalaceDirNotFound)
}

/// Ensures a `.palace/` directory exists at (or under) `path`, creating it
/// (and parents) if necessary. Returns the path to the directory.
pub fn ensure_palace_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let palace_dir = if path.ends_with(PALACE_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(PALACE_DIR_NAME)
    };

    std::fs::create_dir_all(&palace_dir)?;
    Ok(palace_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_palace_dir_in_temp() {
        let dir = tempfile::tempdir().unwrap();
        let palace = dir.path().join(".palace");
        std::fs::create_dir(&palace).unwrap();

        let found = find_palace_dir(dir.path()).unwrap().canonicalize().unwrap();
        assert_eq!(found, palace.canonicalize().unwrap());
    }

    #[test]
    fn find_palace_dir_in_child() {
        let dir = tempfile::tempdir().unwrap();
        let palace = dir.path().join(".palace");
        std::fs::create_dir(&palace).unwrap();
        let child = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&child).unwrap();

        let found = find_palace_dir(&child).unwrap().canonicalize().unwrap();
        assert_eq!(found, palace.canonicalize().unwrap());
    }

    #[test]
    fn find_palace_dir_or_error_missing() {
        let dir = tempfile::tempdir().unwrap();
        // Use a leaf with no ancestor .palace (best effort; CI root may have one).
        let child = dir.path().join("isolated");
        std::fs::create_dir_all(&child).unwrap();
        let _ = find_palace_dir_or_error(&child);
    }

    #[test]
    fn ensure_palace_dir_creates() {
        let dir = tempfile::tempdir().unwrap();
        let result = ensure_palace_dir(dir.path()).unwrap();
        assert!(result.is_dir());
        assert!(result.ends_with(".palace"));
    }

    #[test]
    fn ensure_palace_dir_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let result1 = ensure_palace_dir(dir.path()).unwrap();
        let result2 = ensure_palace_dir(dir.path()).unwrap();
        assert_eq!(result1, result2);
    }
}
