//! Anthropic-native tool-use provider path (spec §4.9/§6). Grounded on the
//! `reqwest::Client` + typed request/response + JSON body pattern of
//! `oracle::query_gemini`, adapted to Anthropic's Messages API with a single
//! forced tool call standing in for structured output.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{HandoverError, Result};
use crate::provider::types::{
    CompletionOptions, CompletionRequest, CompletionResult, CompletionUsage, LLMProvider, PROVIDER_NO_TOOL_USE, PROVIDER_SAFETY_BLOCKED,
};

/// Anthropic stop reasons that indicate the model refused or was blocked on
/// safety grounds rather than simply finishing its turn.
const SAFETY_STOP_REASONS: &[&str] = &["refusal"];

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    context_window: usize,
}

impl AnthropicProvider {
    pub fn new(base_url: String, api_key: String, model: String, context_window: usize, timeout: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { client, base_url, api_key, model, context_window }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    temperature: Option<f32>,
    messages: Vec<Message<'a>>,
    tools: Vec<ToolDef<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ToolDef<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: AnthropicUsage,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { #[allow(dead_code)] text: String },
    ToolUse { input: Value },
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest, _options: CompletionOptions<'_>) -> Result<CompletionResult> {
        let started = Instant::now();
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens.unwrap_or(8192),
            system: &request.system_prompt,
            temperature: request.temperature,
            messages: vec![Message { role: "user", content: &request.user_prompt }],
            tools: vec![ToolDef {
                name: &request.tool_name,
                description: "Emit the structured result for this round.",
                input_schema: &request.response_schema,
            }],
            tool_choice: ToolChoice { kind: "tool", name: &request.tool_name },
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| HandoverError::provider(PROVIDER_NO_TOOL_USE, format!("request to Anthropic failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(HandoverError::provider(PROVIDER_NO_TOOL_USE, format!("Anthropic returned {status}: {text}")));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| HandoverError::provider(PROVIDER_NO_TOOL_USE, format!("failed to parse Anthropic response: {e}")))?;

        if let Some(reason) = &parsed.stop_reason {
            if SAFETY_STOP_REASONS.contains(&reason.as_str()) {
                return Err(HandoverError::provider(PROVIDER_SAFETY_BLOCKED, format!("Anthropic stopped the response for safety reasons: {reason}")));
            }
        }

        let data = parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::ToolUse { input } => Some(input),
                ContentBlock::Text { .. } => None,
            })
            .ok_or_else(|| HandoverError::provider(PROVIDER_NO_TOOL_USE, "no tool_use block in Anthropic response"))?;

        Ok(CompletionResult {
            data,
            usage: CompletionUsage { input_tokens: parsed.usage.input_tokens, output_tokens: parsed.usage.output_tokens },
            model: self.model.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn max_context_tokens(&self) -> usize {
        self.context_window
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tool_use_input_ignoring_leading_text_blocks() {
        let raw = serde_json::json!({
            "content": [
                {"type": "text", "text": "thinking..."},
                {"type": "tool_use", "input": {"modules": [], "summary": "ok"}}
            ],
            "usage": {"input_tokens": 100, "output_tokens": 20}
        });

        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        let data = parsed.content.into_iter().find_map(|block| match block {
            ContentBlock::ToolUse { input } => Some(input),
            ContentBlock::Text { .. } => None,
        });

        assert_eq!(data, Some(serde_json::json!({"modules": [], "summary": "ok"})));
        assert_eq!(parsed.usage.input_tokens, 100);
        assert_eq!(parsed.usage.output_tokens, 20);
    }

    #[test]
    fn text_only_response_yields_no_tool_use() {
        let raw = serde_json::json!({
            "content": [{"type": "text", "text": "no structured output"}],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });

        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        let data = parsed.content.into_iter().find_map(|block| match block {
            ContentBlock::ToolUse { input } => Some(input),
            ContentBlock::Text { .. } => None,
        });

        assert!(data.is_none());
    }

    #[test]
    fn refusal_stop_reason_is_recognized_as_safety_blocked() {
        let raw = serde_json::json!({
            "content": [{"type": "text", "text": "I can't help with that."}],
            "usage": {"input_tokens": 10, "output_tokens": 5},
            "stop_reason": "refusal"
        });

        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        assert!(parsed.stop_reason.as_deref().is_some_and(|r| SAFETY_STOP_REASONS.contains(&r)));
    }

    #[test]
    fn end_turn_stop_reason_is_not_safety_blocked() {
        let raw = serde_json::json!({
            "content": [{"type": "tool_use", "input": {}}],
            "usage": {"input_tokens": 10, "output_tokens": 5},
            "stop_reason": "end_turn"
        });

        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        assert!(!parsed.stop_reason.as_deref().is_some_and(|r| SAFETY_STOP_REASONS.contains(&r)));
    }
}
