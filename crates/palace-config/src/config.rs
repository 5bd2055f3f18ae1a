//! Layered configuration for the context palace (§4.2, §6).
//!
//! Precedence, highest first: environment variables, project config file
//! (`.palace/config.yaml`), global config file (a platform config
//! directory), built-in defaults. Layering is expressed declaratively with
//! `figment` rather than hand-written if-chains; each layer is a partial,
//! all-optional structure that gets merged down to the frozen [`Config`].

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::resolve_agent_identity;
use crate::palace_dir::find_palace_dir;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Figment failed to merge/parse the layered configuration.
    #[error("failed to load configuration: {0}")]
    FigmentError(#[from] figment::Error),

    /// The configuration file contained invalid YAML when saved directly.
    #[error("failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// No `.palace/` directory was found walking up from the start path.
    #[error("no .palace directory found (run 'cp init' first)")]
    PalaceDirNotFound,

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Database connection parameters. The shipped realization is SQLite, so
/// only a file path is meaningful; the other fields are carried so a future
/// non-SQLite `Storage` implementation has somewhere to read them from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Host, for a future non-SQLite backend. Unused by the shipped store.
    #[serde(default)]
    pub host: Option<String>,

    /// Database/schema name, for a future non-SQLite backend.
    #[serde(default)]
    pub database: Option<String>,

    /// Connection user, for a future non-SQLite backend.
    #[serde(default)]
    pub user: Option<String>,

    /// SSL mode, for a future non-SQLite backend.
    #[serde(default, rename = "ssl-mode")]
    pub ssl_mode: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            host: None,
            database: None,
            user: None,
            ssl_mode: None,
        }
    }
}

fn default_db_path() -> String {
    ".palace/palace.db".to_string()
}

/// An external provider endpoint (embedding or generation).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// Provider identifier (e.g. `"openai"`, `"none"`).
    #[serde(default)]
    pub provider: String,

    /// Base URL of the provider's API.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key/credential. Read from config or environment; never logged.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier passed to the provider.
    #[serde(default)]
    pub model: Option<String>,

    /// Embedding vector dimension (embedding provider only).
    #[serde(default)]
    pub dimension: Option<u32>,
}

/// One scaffolded file tracked by `init`/`update`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateEntry {
    /// Path of the scaffolded file, relative to the project root.
    pub path: String,
    /// Template version that produced the current contents.
    pub version: u32,
}

/// Manifest of files `init` scaffolded and `update` keeps current.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplatesManifest {
    #[serde(default)]
    pub entries: Vec<TemplateEntry>,
}

// ---------------------------------------------------------------------------
// Raw (partial) config -- what actually gets parsed from each layer
// ---------------------------------------------------------------------------

/// The on-disk/env shape of the configuration. Every field is optional so
/// that each layer (env, project file, global file) can supply only what it
/// overrides; [`Figment`] merges these before the agent/project fields are
/// resolved through their own fallback chains.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawConfig {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub embedding: ProviderConfig,
    #[serde(default)]
    pub generation: ProviderConfig,
    #[serde(default)]
    pub similarity_floor: Option<f32>,
    #[serde(default)]
    pub templates: TemplatesManifest,
}

// ---------------------------------------------------------------------------
// Frozen Config
// ---------------------------------------------------------------------------

/// The fully resolved, immutable configuration exposed to every component.
/// Mutation at runtime is not supported; call [`load`] again to re-resolve.
#[derive(Debug, Clone)]
pub struct Config {
    pub project: String,
    pub agent: String,
    pub connection: ConnectionConfig,
    pub embedding: ProviderConfig,
    pub generation: ProviderConfig,
    pub similarity_floor: f32,
    pub templates: TemplatesManifest,
    pub palace_dir: Option<PathBuf>,
}

/// CLI-supplied overrides, applied as the topmost explicit layer (above
/// environment variables would be wrong per spec precedence, so these are
/// folded in only for the two fields the CLI is allowed to override
/// directly: `--project` and `--agent`; everything else flows through env/
/// file/default layering).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub project: Option<String>,
    pub agent: Option<String>,
    pub config_path: Option<PathBuf>,
}

const DEFAULT_SIMILARITY_FLOOR: f32 = 0.30;

fn default_project_name() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "default".to_string())
}

/// Returns the platform global config directory's `config.yaml` path
/// (e.g. `~/.config/context-palace/config.yaml` on Linux).
fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("context-palace").join("config.yaml"))
}

/// Resolves the frozen [`Config`] by layering, highest precedence first:
/// environment variables (`CONTEXT_PALACE_*`), an explicit `--config` file
/// (if given), the discovered project `.palace/config.yaml`, the global
/// config file, then built-in defaults.
pub fn load(start_dir: &Path, overrides: &CliOverrides) -> Result<Config> {
    let palace_dir = find_palace_dir(start_dir);
    let project_config_path = palace_dir.as_ref().map(|d| d.join("config.yaml"));

    let mut figment = Figment::new().merge(Serialized::defaults(RawConfig::default()));

    if let Some(global_path) = global_config_path() {
        if global_path.is_file() {
            figment = figment.merge(Yaml::file(global_path));
        }
    }

    if let Some(project_path) = &project_config_path {
        if project_path.is_file() {
            figment = figment.merge(Yaml::file(project_path));
        }
    }

    if let Some(explicit_path) = &overrides.config_path {
        if explicit_path.is_file() {
            figment = figment.merge(Yaml::file(explicit_path));
        }
    }

    figment = figment.merge(Env::prefixed("CONTEXT_PALACE_").split("_"));

    let raw: RawConfig = figment.extract()?;

    let project = overrides
        .project
        .clone()
        .or(raw.project)
        .unwrap_or_else(default_project_name);
    let agent = resolve_agent_identity(overrides.agent.as_deref().or(raw.agent.as_deref()));

    Ok(Config {
        project,
        agent,
        connection: raw.connection,
        embedding: raw.embedding,
        generation: raw.generation,
        similarity_floor: raw.similarity_floor.unwrap_or(DEFAULT_SIMILARITY_FLOOR),
        templates: raw.templates,
        palace_dir,
    })
}

/// Saves a [`RawConfig`]-shaped YAML document to `.palace/config.yaml`
/// inside `palace_dir`, used by `init` (full scaffold) and `update`
/// (templates-manifest refresh).
pub fn save_project_config(palace_dir: &Path, raw: &RawConfig) -> Result<()> {
    std::fs::create_dir_all(palace_dir)?;
    let path = palace_dir.join("config.yaml");
    let yaml = serde_yaml::to_string(raw)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Loads the raw project config file directly (used by `update` to read,
/// modify, and rewrite the templates manifest without re-resolving agent
/// identity or environment layers).
pub fn load_raw_project_config(palace_dir: &Path) -> Result<RawConfig> {
    let path = palace_dir.join("config.yaml");
    if !path.is_file() {
        return Ok(RawConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_configured() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(dir.path(), &CliOverrides::default()).unwrap();
        assert_eq!(cfg.similarity_floor, DEFAULT_SIMILARITY_FLOOR);
        assert_eq!(cfg.connection.path, ".palace/palace.db");
    }

    #[test]
    fn cli_override_wins_over_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let palace_dir = dir.path().join(".palace");
        std::fs::create_dir(&palace_dir).unwrap();
        std::fs::write(palace_dir.join("config.yaml"), "project: from-file\n").unwrap();

        let overrides = CliOverrides {
            project: Some("from-cli".into()),
            ..Default::default()
        };
        let cfg = load(dir.path(), &overrides).unwrap();
        assert_eq!(cfg.project, "from-cli");
    }

    #[test]
    fn project_file_wins_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let palace_dir = dir.path().join(".palace");
        std::fs::create_dir(&palace_dir).unwrap();
        std::fs::write(
            palace_dir.join("config.yaml"),
            "project: myproj\nsimilarity_floor: 0.5\n",
        )
        .unwrap();

        let cfg = load(dir.path(), &CliOverrides::default()).unwrap();
        assert_eq!(cfg.project, "myproj");
        assert_eq!(cfg.similarity_floor, 0.5);
    }

    #[test]
    fn save_and_reload_raw_project_config() {
        let dir = tempfile::tempdir().unwrap();
        let palace_dir = dir.path().join(".palace");

        let mut raw = RawConfig::default();
        raw.project = Some("roundtrip".into());
        raw.templates.entries.push(TemplateEntry {
            path: "README.md".into(),
            version: 1,
        });

        save_project_config(&palace_dir, &raw).unwrap();
        let loaded = load_raw_project_config(&palace_dir).unwrap();
        assert_eq!(loaded.project.as_deref(), Some("roundtrip"));
        assert_eq!(loaded.templates.entries.len(), 1);
    }
}
