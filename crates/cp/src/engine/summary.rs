//! Summary assistance: AI-proposed summaries for memory sub-entries and
//! knowledge document updates (§4.10).
//!
//! Single-shot, 30s timeout, no retry -- the provider's own timeout budget
//! (see `providers::generation`) enforces that. A reply is asked for as a
//! JSON object `{"summary": "..."}`; models habitually wrap that in a
//! ```json fence, which is stripped before parsing. A reply that isn't
//! valid JSON at all is still usable: the raw trimmed text becomes the
//! summary rather than a hard failure, since rejecting a perfectly good
//! plain-text answer over formatting would make this feature more
//! annoying than useful. An empty summary, however the model got there, is
//! always an error.

use palace_core::error::PalaceError;

use crate::providers::generation::strip_code_fence;
use crate::providers::GenerationProvider;

/// Builds the prompt for proposing a summary of a new memory sub-entry,
/// given its parent's title for context.
pub fn child_summary_prompt(parent_title: &str, child_title: &str, child_body: &str) -> String {
    format!(
        "You are helping file a sub-memory under the parent memory \"{parent_title}\".\n\
         New entry title: {child_title}\n\
         New entry content:\n{child_body}\n\n\
         Reply with a JSON object of the form {{\"summary\": \"<one sentence>\"}} \
         summarizing the new entry for the parent's index. Keep it under 200 characters."
    )
}

/// Builds the prompt for proposing a summary of a knowledge document update,
/// given the diff between the previous and new content.
pub fn knowledge_update_prompt(title: &str, diff: &str) -> String {
    format!(
        "You are summarizing an update to the knowledge document \"{title}\".\n\
         Changes:\n{diff}\n\n\
         Reply with a JSON object of the form {{\"summary\": \"<one sentence>\"}} \
         describing what changed."
    )
}

/// Calls the generation provider with `prompt` and extracts the summary
/// text from its reply.
pub fn summarize(generation: &dyn GenerationProvider, prompt: &str) -> Result<String, PalaceError> {
    let reply = generation.generate(prompt).map_err(|e| PalaceError::Fatal(format!("generation provider: {e}")))?;

    let fenced = strip_code_fence(&reply);
    let summary = match serde_json::from_str::<serde_json::Value>(fenced) {
        Ok(value) => value.get("summary").and_then(|s| s.as_str()).map(str::to_string).unwrap_or_else(|| fenced.trim().to_string()),
        Err(_) => fenced.trim().to_string(),
    };

    if summary.is_empty() {
        return Err(PalaceError::Fatal("generation provider returned an empty summary".to_string()));
    }

    Ok(summary)
}
