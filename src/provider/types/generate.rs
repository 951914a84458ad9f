//! Configuration for LLM generation requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for a generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Model to use (None = use provider default)
    pub model: Option<String>,
    /// Temperature for sampling (None = provider default)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tool schemas in OpenAI function format
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
}

impl GenerateConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            model: None,
            temperature: None,
            max_tokens: Some(4000),
            tools: Vec::new(),
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                anyhow::bail!("Temperature must be between 0.0 and 2.0");
            }
        }

        if self.max_tokens == Some(0) {
            anyhow::bail!("Max tokens must be greater than 0");
        }

        for tool in &self.tools {
            if tool.pointer("/function/name").and_then(Value::as_str).is_none() {
                anyhow::bail!("Tool schema is missing function.name: {}", tool);
            }
        }

        Ok(())
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self::new()
    }
}
