//! Text generation provider for summary assistance (§4.10, §6).
//!
//! Single-shot, 30s timeout, no retry: a slow or failing model should not
//! silently stall a write, so a miss here is surfaced to the caller rather
//! than masked by backoff. The HTTP implementation speaks the OpenAI chat
//! completions wire format and tolerates a reply wrapped in a ```json code
//! fence, since that's a common model habit worth shrugging off rather than
//! treating as a hard parse failure.

use std::time::Duration;

use palace_config::ProviderConfig;

use super::ProviderError;

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

pub trait GenerationProvider: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub struct HttpGenerationProvider {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpGenerationProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base_url = config.base_url.clone().ok_or(ProviderError::NotConfigured)?;
        let model = config.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());

        let agent_config = ureq::Agent::config_builder().timeout_global(Some(CALL_TIMEOUT)).build();

        Ok(Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url,
            api_key: config.api_key.clone(),
            model,
        })
    }
}

impl GenerationProvider for HttpGenerationProvider {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let mut request = self.agent.post(&url).header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", &format!("Bearer {key}"));
        }

        let mut response = request.send_json(&body).map_err(|e| ProviderError::Request(e.to_string()))?;

        let parsed: serde_json::Value = response.body_mut().read_json().map_err(|e| ProviderError::BadResponse(e.to_string()))?;

        let text = parsed
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|first| first.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| ProviderError::BadResponse("missing choices[0].message.content".to_string()))?;

        Ok(text.to_string())
    }
}

/// Strips a ```json ... ``` or ``` ... ``` fence wrapping a reply, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let rest = rest.trim_start_matches(['\n', '\r']);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
        return rest.trim();
    }
    trimmed
}

/// Scriptable in-memory double: returns queued responses in order, for
/// exercising `engine::summary` without any network I/O.
pub struct ScriptedGenerationProvider {
    responses: std::sync::Mutex<Vec<Result<String, String>>>,
}

impl ScriptedGenerationProvider {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().rev().collect()),
        }
    }

    pub fn once(response: &str) -> Self {
        Self::new(vec![Ok(response.to_string())])
    }
}

impl GenerationProvider for ScriptedGenerationProvider {
    fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        let mut queue = self.responses.lock().expect("scripted provider lock");
        match queue.pop() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(ProviderError::Request(msg)),
            None => Err(ProviderError::Request("scripted provider exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fence_removes_json_fence() {
        let input = "```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(strip_code_fence(input), "{\"summary\": \"ok\"}");
    }

    #[test]
    fn strip_code_fence_passes_through_plain_text() {
        assert_eq!(strip_code_fence("{\"summary\": \"ok\"}"), "{\"summary\": \"ok\"}");
    }

    #[test]
    fn scripted_provider_returns_queued_responses_in_order() {
        let provider = ScriptedGenerationProvider::new(vec![Ok("first".to_string()), Ok("second".to_string())]);
        assert_eq!(provider.generate("p").unwrap(), "first");
        assert_eq!(provider.generate("p").unwrap(), "second");
        assert!(provider.generate("p").is_err());
    }
}
