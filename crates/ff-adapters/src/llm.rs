// SPDX-License-Identifier: MIT

//! Language-model adapter (C5): single-shot text completion against a
//! remote provider. The model is treated as a best-effort oracle — we
//! attempt structured JSON decoding of its reply first, then fall back to
//! extracting the first fenced code block, rather than parsing free text
//! with regular expressions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request to language model failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("language model returned an unparseable response")]
    Unparseable,
}

/// The structured shape we ask the repair prompt for. When the provider
/// can't or won't return valid JSON, `parse_fix_response` recovers a
/// best-effort value from a fenced code block instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixResponse {
    pub diagnosis: String,
    pub fixed_code: String,
    pub changes: Vec<String>,
    pub confidence: u8,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Talks to a single configured provider/model/key triple. `base_url` is
/// injected so tests can point it at a local mock server.
#[derive(Debug, Clone)]
pub struct LlmAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// The model tag this adapter is configured to call, for stamping onto
    /// a [`ff_core::Job`] once a repair cycle has actually invoked it.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(COMPLETION_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<CompletionResponse>()
            .await?;

        response.choices.into_iter().next().map(|c| c.message.content).ok_or(LlmError::Unparseable)
    }

    /// Asks the model to diagnose and repair a source file given the build
    /// or simulation error context, then parses its reply into a
    /// `FixResponse` — decoding JSON first, falling back to a fenced code
    /// block holding just the fixed source.
    pub async fn propose_fix(
        &self,
        file_path: &str,
        file_contents: &str,
        error_context: &str,
    ) -> Result<FixResponse, LlmError> {
        let system_prompt = "You are a firmware repair assistant. Respond with a JSON object \
            containing diagnosis, fixed_code, changes (array of strings), and confidence (0-100).";
        let user_prompt = format!(
            "File: {file_path}\n\nError context:\n{error_context}\n\nCurrent contents:\n{file_contents}"
        );

        let reply = self.complete(system_prompt, &user_prompt).await?;
        parse_fix_response(&reply).ok_or(LlmError::Unparseable)
    }
}

/// Decodes `reply` as a `FixResponse` JSON object; if that fails, falls back
/// to treating the first fenced code block as `fixed_code` with an empty
/// diagnosis and zero confidence.
fn parse_fix_response(reply: &str) -> Option<FixResponse> {
    if let Ok(parsed) = serde_json::from_str::<FixResponse>(reply) {
        return Some(parsed);
    }
    if let Some(start) = reply.find("{") {
        if let Some(end) = reply.rfind("}") {
            if end > start {
                if let Ok(parsed) = serde_json::from_str::<FixResponse>(&reply[start..=end]) {
                    return Some(parsed);
                }
            }
        }
    }

    let fenced = extract_fenced_code_block(reply)?;
    Some(FixResponse { diagnosis: String::new(), fixed_code: fenced, changes: Vec::new(), confidence: 0 })
}

fn extract_fenced_code_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim_end().to_string())
}

#[cfg(test)]
#[path = "llm_tests.rs"]
mod tests;
