//! Embedding provider: turns shard text into a fixed-dimension vector (§6).
//!
//! The HTTP implementation speaks the OpenAI embeddings wire format
//! (`POST {base_url}/embeddings`, `{"model": ..., "input": ...}` ->
//! `{"data": [{"embedding": [...]}]}`), which is also what the other
//! providers in this pack standardize on. Retries up to 3 attempts with
//! 1s/2s/4s backoff; each attempt is capped at a 5s timeout. Input longer
//! than roughly 8000 tokens is truncated (approximated as 4 chars/token,
//! since we have no tokenizer dependency to count exactly).

use std::time::Duration;

use palace_config::ProviderConfig;

use super::ProviderError;

const MAX_INPUT_CHARS: usize = 8000 * 4;
const CALL_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_ATTEMPTS: u32 = 3;

pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
    fn dimension(&self) -> usize;
}

/// OpenAI-compatible HTTP embedding client.
pub struct HttpEmbeddingProvider {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base_url = config.base_url.clone().ok_or(ProviderError::NotConfigured)?;
        let model = config.model.clone().unwrap_or_else(|| "text-embedding-3-small".to_string());
        let dimension = config.dimension.unwrap_or(768) as usize;

        let agent_config = ureq::Agent::config_builder().timeout_global(Some(CALL_TIMEOUT)).build();

        Ok(Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url,
            api_key: config.api_key.clone(),
            model,
            dimension,
        })
    }

    fn call_once(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let mut request = self.agent.post(&url).header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", &format!("Bearer {key}"));
        }

        let mut response = request.send_json(&body).map_err(|e| ProviderError::Request(e.to_string()))?;

        let parsed: serde_json::Value = response.body_mut().read_json().map_err(|e| ProviderError::BadResponse(e.to_string()))?;

        let embedding = parsed
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|first| first.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| ProviderError::BadResponse("missing data[0].embedding".to_string()))?;

        let vector: Vec<f32> = embedding.iter().map(|v| v.as_f64().unwrap_or(0.0) as f32).collect();

        if vector.len() != self.dimension {
            return Err(ProviderError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let truncated = if text.len() > MAX_INPUT_CHARS { &text[..MAX_INPUT_CHARS] } else { text };

        let mut delay = Duration::from_secs(1);
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.call_once(truncated) {
                Ok(vector) => return Ok(vector),
                Err(ProviderError::DimensionMismatch { expected, actual }) => {
                    // Never worth retrying: the model/dimension config is wrong.
                    return Err(ProviderError::DimensionMismatch { expected, actual });
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "embedding provider call failed");
                    last_err = Some(err);
                    if attempt < MAX_ATTEMPTS {
                        std::thread::sleep(delay);
                        delay *= 2;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(ProviderError::Timeout))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Deterministic in-memory double for engine unit tests: hashes the input
/// text into a vector of the configured dimension, so identical text always
/// embeds identically and different text (almost always) embeds
/// differently, without any network I/O.
pub struct ScriptedEmbeddingProvider {
    dimension: usize,
    pub fail: bool,
}

impl ScriptedEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension, fail: false }
    }
}

impl EmbeddingProvider for ScriptedEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Request("scripted failure".to_string()));
        }
        let mut vector = vec![0.0_f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dimension] += byte as f32;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_provider_is_deterministic() {
        let provider = ScriptedEmbeddingProvider::new(16);
        let a = provider.embed("hello world").unwrap();
        let b = provider.embed("hello world").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn scripted_provider_differs_for_different_text() {
        let provider = ScriptedEmbeddingProvider::new(16);
        let a = provider.embed("hello world").unwrap();
        let b = provider.embed("goodbye world").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn scripted_provider_respects_fail_flag() {
        let mut provider = ScriptedEmbeddingProvider::new(16);
        provider.fail = true;
        assert!(provider.embed("hello").is_err());
    }
}
