//! LLM Provider abstraction.
//!
//! The orchestration core treats the language model as an opaque capability:
//! it hands over a conversation plus the tool schemas bound to a task and gets
//! back either text or a batch of tool calls to run.

use crate::provider::types::{GenerateConfig, Message};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Response from a generation request
#[derive(Debug, Clone)]
pub enum GenerateResponse {
    /// Text content response
    Content(String),
    /// Tool calls that need to be executed
    ToolCalls(Vec<ToolInvocation>),
}

/// A tool invocation from the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Arguments as a JSON value (already parsed)
    pub arguments: serde_json::Value,
}

impl ToolInvocation {
    /// Create a tool invocation
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Core trait that all LLM providers must implement
///
/// # Example
///
/// ```ignore
/// use lrk::provider::{GenerateConfig, GenerateResponse, LlmProvider, Message};
///
/// async fn ask(provider: &dyn LlmProvider) -> anyhow::Result<()> {
///     let messages = vec![Message::user("Summarize recent work on graph transformers")];
///     match provider.generate(&messages, &GenerateConfig::default()).await? {
///         GenerateResponse::Content(text) => println!("{}", text),
///         GenerateResponse::ToolCalls(calls) => println!("{} tool calls", calls.len()),
///     }
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response from the LLM
    ///
    /// # Arguments
    /// * `messages` - Conversation so far
    /// * `config` - Generation configuration (model, tokens, tool schemas)
    async fn generate(
        &self,
        messages: &[Message],
        config: &GenerateConfig,
    ) -> Result<GenerateResponse>;

    /// Get the provider name for logging and debugging
    fn provider_name(&self) -> &str;

    /// Get the default model name for this provider
    fn default_model(&self) -> String;
}
