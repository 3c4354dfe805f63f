//! OpenAI-compatible forced function-call provider path (spec §4.9/§6).
//! Reused by OpenAI, Groq, Together, DeepSeek, Azure (dedicated `apiVersion`
//! query param), and Ollama's `/v1/` endpoint. Grounded on the same
//! `reqwest::Client` + JSON body/response pattern as `oracle::query_gemini`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{HandoverError, Result};
use crate::provider::types::{
    CompletionOptions, CompletionRequest, CompletionResult, CompletionUsage, LLMProvider, PROVIDER_NO_TOOL_USE, PROVIDER_SAFETY_BLOCKED,
};

/// OpenAI-convention finish reason for a content-filter stop (shared by Groq,
/// Together, DeepSeek, Azure, and Ollama's `/v1/` endpoint).
const SAFETY_FINISH_REASON: &str = "content_filter";

/// Azure deployments pin this API version (spec §6).
pub const AZURE_API_VERSION: &str = "2024-10-21";

pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    context_window: usize,
    /// Set when the base URL is an Azure deployment endpoint, appending the
    /// pinned `api-version` query parameter to every request.
    azure_api_version: Option<&'static str>,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: String, api_key: String, model: String, context_window: usize, timeout: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { client, base_url, api_key, model, context_window, azure_api_version: None }
    }

    pub fn azure(base_url: String, api_key: String, model: String, context_window: usize, timeout: Duration) -> Self {
        let mut provider = Self::new(base_url, api_key, model, context_window, timeout);
        provider.azure_api_version = Some(AZURE_API_VERSION);
        provider
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    tools: Vec<FunctionTool<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct FunctionTool<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    function: FunctionDef<'a>,
}

#[derive(Serialize)]
struct FunctionDef<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    function: ToolChoiceFunction<'a>,
}

#[derive(Serialize)]
struct ToolChoiceFunction<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: ToolCallFunction,
}

#[derive(Deserialize)]
struct ToolCallFunction {
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[async_trait]
impl LLMProvider for OpenAiCompatProvider {
    async fn complete(&self, request: CompletionRequest, _options: CompletionOptions<'_>) -> Result<CompletionResult> {
        let started = Instant::now();
        let mut url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        if let Some(version) = self.azure_api_version {
            url = format!("{url}?api-version={version}");
        }

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.user_prompt },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: vec![FunctionTool {
                kind: "function",
                function: FunctionDef {
                    name: &request.tool_name,
                    description: "Emit the structured result for this round.",
                    parameters: &request.response_schema,
                },
            }],
            tool_choice: ToolChoice { kind: "function", function: ToolChoiceFunction { name: &request.tool_name } },
        };

        let mut builder = self.client.post(&url).header("content-type", "application/json");
        if !self.api_key.is_empty() {
            builder = builder.header("authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| HandoverError::provider(PROVIDER_NO_TOOL_USE, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(HandoverError::provider(PROVIDER_NO_TOOL_USE, format!("provider returned {status}: {text}")));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| HandoverError::provider(PROVIDER_NO_TOOL_USE, format!("failed to parse response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| HandoverError::provider(PROVIDER_NO_TOOL_USE, "no choices in response"))?;

        if choice.finish_reason.as_deref() == Some(SAFETY_FINISH_REASON) {
            return Err(HandoverError::provider(PROVIDER_SAFETY_BLOCKED, "provider stopped the response for a content filter"));
        }

        let tool_call = choice
            .message
            .tool_calls
            .and_then(|mut calls| if calls.is_empty() { None } else { Some(calls.remove(0)) })
            .ok_or_else(|| HandoverError::provider(PROVIDER_NO_TOOL_USE, "no tool call in response"))?;

        let data: Value = serde_json::from_str(&tool_call.function.arguments)
            .map_err(|e| HandoverError::provider(PROVIDER_NO_TOOL_USE, format!("tool call arguments were not valid JSON: {e}")))?;

        let usage = parsed.usage.map(|u| CompletionUsage { input_tokens: u.prompt_tokens, output_tokens: u.completion_tokens }).unwrap_or_default();

        Ok(CompletionResult { data, usage, model: self.model.clone(), duration_ms: started.elapsed().as_millis() as u64 })
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
    fn parses_tool_call_arguments_from_first_choice() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": {"arguments": "{\"features\":[]}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 42, "completion_tokens": 7}
        });

        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        let tool_call = parsed.choices.into_iter().next().and_then(|c| c.message.tool_calls).unwrap().remove(0);
        let data: Value = serde_json::from_str(&tool_call.function.arguments).unwrap();

        assert_eq!(data, serde_json::json!({"features": []}));
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 42);
    }

    #[test]
    fn missing_tool_calls_yields_none() {
        let raw = serde_json::json!({
            "choices": [{"message": {"tool_calls": null}}],
            "usage": null
        });

        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        let tool_calls = parsed.choices.into_iter().next().and_then(|c| c.message.tool_calls);
        assert!(tool_calls.is_none());
    }

    #[test]
    fn content_filter_finish_reason_is_recognized_as_safety_blocked() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {"tool_calls": null},
                "finish_reason": "content_filter"
            }],
            "usage": null
        });

        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        let choice = parsed.choices.into_iter().next().unwrap();
        assert_eq!(choice.finish_reason.as_deref(), Some(SAFETY_FINISH_REASON));
    }

    #[test]
    fn stop_finish_reason_is_not_safety_blocked() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {"tool_calls": [{"function": {"arguments": "{}"}}]},
                "finish_reason": "stop"
            }],
            "usage": null
        });

        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        let choice = parsed.choices.into_iter().next().unwrap();
        assert_ne!(choice.finish_reason.as_deref(), Some(SAFETY_FINISH_REASON));
    }

    #[test]
    fn azure_url_gets_pinned_api_version_query_param() {
        let provider = OpenAiCompatProvider::azure(
            "https://example.openai.azure.com/openai/deployments/gpt4".to_string(),
            "key".to_string(),
            "gpt-4".to_string(),
            128_000,
            Duration::from_secs(30),
        );
        assert_eq!(provider.azure_api_version, Some(AZURE_API_VERSION));
    }
}
