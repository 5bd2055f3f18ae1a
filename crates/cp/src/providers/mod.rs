//! External provider clients: embedding and text generation (§6).
//!
//! Both providers are abstracted behind a trait so engines can be exercised
//! with scripted in-memory doubles in tests; the shipped implementations
//! speak HTTP to an OpenAI-compatible endpoint via `ureq`.

pub mod embedding;
pub mod generation;

pub use embedding::{EmbeddingProvider, HttpEmbeddingProvider, ScriptedEmbeddingProvider};
pub use generation::{GenerationProvider, HttpGenerationProvider, ScriptedGenerationProvider};

use thiserror::Error;

/// Errors raised by a provider call. Callers translate these into
/// `PalaceError::Unavailable` (embedding, non-fatal on write paths) or a
/// fatal error (generation) per §7.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured")]
    NotConfigured,

    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider request timed out")]
    Timeout,

    #[error("provider returned an unparseable response: {0}")]
    BadResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
