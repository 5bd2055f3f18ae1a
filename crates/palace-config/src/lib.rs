//! Identity and configuration resolution for the context palace.
//!
//! This crate discovers `.palace/` project directories, resolves acting-
//! agent identity through its fallback chain, and layers environment
//! variables, project config, global config, and defaults into a single
//! frozen [`config::Config`].

pub mod config;
pub mod identity;
pub mod palace_dir;

pub use config::{CliOverrides, Config, ConfigError, ConnectionConfig, ProviderConfig, RawConfig, TemplateEntry, TemplatesManifest};
pub use identity::resolve_agent_identity;
pub use palace_dir::{ensure_palace_dir, find_palace_dir, find_palace_dir_or_error};
