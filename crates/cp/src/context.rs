//! Runtime context for command execution.
//!
//! [`RuntimeContext`] holds the state every command handler needs: the
//! resolved [`Config`], an open store handle, and the global output/limit/
//! debug flags. Built once in `main` after CLI parsing.

use std::sync::Arc;

use palace_config::{CliOverrides, Config};
use palace_storage::{SqliteStore, Storage};

use crate::cli::GlobalArgs;
use crate::output::OutputFormat;
use crate::providers::{EmbeddingProvider, GenerationProvider, HttpEmbeddingProvider, HttpGenerationProvider, ProviderError};

/// Stand-in used when no provider endpoint is configured. Every call fails
/// with [`ProviderError::NotConfigured`], which `engine::memory::add_sub`
/// and friends already treat as non-fatal (embedding) or surface as an
/// explicit error (generation, unless `--no-ai`).
struct NullEmbeddingProvider(usize);

impl EmbeddingProvider for NullEmbeddingProvider {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
    fn dimension(&self) -> usize {
        self.0
    }
}

struct NullGenerationProvider;

impl GenerationProvider for NullGenerationProvider {
    fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
}

pub struct RuntimeContext {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub output: OutputFormat,
    pub limit: usize,
    pub debug: bool,
}

impl RuntimeContext {
    /// Resolves [`Config`] from the current directory and global flags, then
    /// opens the configured SQLite store.
    pub fn build(global: &GlobalArgs) -> anyhow::Result<Self> {
        let overrides = CliOverrides {
            project: global.project.clone(),
            agent: global.agent.clone(),
            config_path: global.config.clone(),
        };
        let cwd = std::env::current_dir()?;
        let config = palace_config::config::load(&cwd, &overrides)?;
        let storage = SqliteStore::open(&config.connection.path)?;

        Ok(Self {
            config,
            storage: Arc::new(storage),
            output: global.output,
            limit: global.limit,
            debug: global.debug,
        })
    }

    pub fn project(&self) -> &str {
        &self.config.project
    }

    pub fn agent(&self) -> &str {
        &self.config.agent
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// The configured embedding provider, or a stub that always reports
    /// "not configured" when `embedding.base_url` is unset.
    pub fn embedding_provider(&self) -> Box<dyn EmbeddingProvider> {
        match HttpEmbeddingProvider::new(&self.config.embedding) {
            Ok(provider) => Box::new(provider),
            Err(_) => Box::new(NullEmbeddingProvider(self.config.embedding.dimension.unwrap_or(768) as usize)),
        }
    }

    /// The configured generation provider, or a stub that always reports
    /// "not configured" when `generation.base_url` is unset.
    pub fn generation_provider(&self) -> Box<dyn GenerationProvider> {
        match HttpGenerationProvider::new(&self.config.generation) {
            Ok(provider) => Box::new(provider),
            Err(_) => Box::new(NullGenerationProvider),
        }
    }
}
