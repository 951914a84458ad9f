//! OpenAI-compatible chat-completions provider.
//!
//! Works against any endpoint speaking the chat-completions wire format,
//! including Gemini's OpenAI-compatible surface used by default.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::provider::traits::{GenerateResponse, LlmProvider, ToolInvocation};
use crate::provider::types::{GenerateConfig, Message, MessageRole};

/// Chat-completions client over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl HttpProvider {
    /// Create a provider from the `[llm]` configuration section.
    ///
    /// # Arguments
    /// * `config` - Endpoint and model settings.
    /// * `api_key` - Bearer token sent with every request.
    /// * `timeout_seconds` - Per-request timeout.
    pub fn new(config: &LlmConfig, api_key: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        let url = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.endpoint.trim_start_matches('/')
        );

        Ok(Self {
            client,
            url,
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }

    /// Full request URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl LlmProvider for HttpProvider {
    async fn generate(
        &self,
        messages: &[Message],
        config: &GenerateConfig,
    ) -> Result<GenerateResponse> {
        config.validate()?;
        let body = build_request_body(messages, config, &self.model);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read provider response body")?;

        if !status.is_success() {
            anyhow::bail!("Provider returned HTTP {}: {}", status, text);
        }

        let payload: Value = serde_json::from_str(&text)
            .with_context(|| format!("Provider response is not JSON: {}", text))?;
        parse_response(&payload)
    }

    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    fn default_model(&self) -> String {
        self.model.clone()
    }
}

/// Serialize a conversation into a chat-completions request body.
pub fn build_request_body(messages: &[Message], config: &GenerateConfig, default_model: &str) -> Value {
    let wire_messages: Vec<Value> = messages.iter().map(message_to_wire).collect();

    let mut body = Map::new();
    body.insert(
        "model".to_string(),
        json!(config.model.as_deref().unwrap_or(default_model)),
    );
    body.insert("messages".to_string(), Value::Array(wire_messages));
    if let Some(max_tokens) = config.max_tokens {
        body.insert("max_tokens".to_string(), json!(max_tokens));
    }
    if let Some(temperature) = config.temperature {
        body.insert("temperature".to_string(), json!(temperature));
    }
    if !config.tools.is_empty() {
        body.insert("tools".to_string(), Value::Array(config.tools.clone()));
    }

    Value::Object(body)
}

fn message_to_wire(message: &Message) -> Value {
    let mut wire = Map::new();
    wire.insert("role".to_string(), json!(message.role.as_str()));
    wire.insert("content".to_string(), json!(message.content));

    if message.role == MessageRole::Assistant && !message.tool_calls.is_empty() {
        let calls: Vec<Value> = message
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments.to_string(),
                    }
                })
            })
            .collect();
        wire.insert("tool_calls".to_string(), Value::Array(calls));
    }
    if let Some(id) = &message.tool_call_id {
        wire.insert("tool_call_id".to_string(), json!(id));
    }
    if let Some(name) = &message.name {
        wire.insert("name".to_string(), json!(name));
    }

    Value::Object(wire)
}

/// Interpret a chat-completions response body.
pub fn parse_response(payload: &Value) -> Result<GenerateResponse> {
    if let Some(error) = payload.get("error") {
        anyhow::bail!("Provider error: {}", error);
    }

    let message = payload
        .pointer("/choices/0/message")
        .context("Provider response has no choices[0].message")?;

    if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
        if !calls.is_empty() {
            let invocations = calls
                .iter()
                .enumerate()
                .map(|(index, call)| parse_tool_call(index, call))
                .collect::<Result<Vec<_>>>()?;
            return Ok(GenerateResponse::ToolCalls(invocations));
        }
    }

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(GenerateResponse::Content(content))
}

fn parse_tool_call(index: usize, call: &Value) -> Result<ToolInvocation> {
    let name = call
        .pointer("/function/name")
        .and_then(Value::as_str)
        .context("Tool call without function.name")?;

    let id = call
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{}", index));

    // Arguments usually arrive as a JSON-encoded string, some servers send an object.
    let arguments = match call.pointer("/function/arguments") {
        Some(Value::String(raw)) if raw.trim().is_empty() => json!({}),
        Some(Value::String(raw)) => serde_json::from_str(raw)
            .with_context(|| format!("Tool call `{}` has malformed arguments: {}", name, raw))?,
        Some(other) => other.clone(),
        None => json!({}),
    };

    Ok(ToolInvocation::new(id, name, arguments))
}
