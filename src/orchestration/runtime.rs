//! Pipeline runtime - the capabilities and settings every task runs against

use std::sync::Arc;
use std::time::Duration;

use crate::config::Configuration;
use crate::observability::Logger;
use crate::orchestration::error::{OrchestrationError, OrchestrationResult};
use crate::orchestration::task::MalformedOutputPolicy;
use crate::provider::{GenerateConfig, LlmProvider};
use crate::tools::ToolRegistry;

/// Execution settings shared by all tasks of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    /// Model override (None = provider default)
    pub model: Option<String>,
    /// Maximum tokens per generation
    pub max_tokens: u32,
    /// Sampling temperature (None = provider default)
    pub temperature: Option<f32>,
    /// Upper bound on tool-call rounds per task
    pub max_tool_rounds: u32,
    /// Pause before every provider request
    pub request_interval: Duration,
    /// Handling of unparsable structured output
    pub malformed_output: MalformedOutputPolicy,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 4000,
            temperature: None,
            max_tool_rounds: 8,
            request_interval: Duration::ZERO,
            malformed_output: MalformedOutputPolicy::Warn,
        }
    }
}

impl RuntimeSettings {
    /// Build settings from the `[execution]` and `[llm]` sections.
    pub fn from_configuration(config: &Configuration) -> OrchestrationResult<Self> {
        let execution = &config.execution;
        if execution.max_tool_rounds == 0 {
            return Err(OrchestrationError::Configuration(
                "execution.max_tool_rounds must be greater than 0".to_string(),
            ));
        }
        let malformed_output = execution
            .malformed_output
            .parse::<MalformedOutputPolicy>()
            .map_err(|e| OrchestrationError::Configuration(e.to_string()))?;

        let settings = Self {
            model: Some(config.llm.model.clone()).filter(|m| !m.is_empty()),
            max_tokens: execution.max_tokens,
            temperature: config.llm.temperature,
            max_tool_rounds: execution.max_tool_rounds,
            request_interval: Duration::from_secs(execution.request_interval_seconds),
            malformed_output,
        };
        settings
            .generate_config(Vec::new())
            .validate()
            .map_err(|e| OrchestrationError::Configuration(e.to_string()))?;
        Ok(settings)
    }

    /// Generation config for one request carrying `tools`.
    pub fn generate_config(&self, tools: Vec<serde_json::Value>) -> GenerateConfig {
        let mut config = GenerateConfig::new().with_max_tokens(self.max_tokens).with_tools(tools);
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        config
    }
}

/// Capabilities handed to a pipeline: provider, tools, settings and the run log
///
/// There is no process-wide state; everything a task needs comes through here.
#[derive(Clone)]
pub struct PipelineRuntime {
    provider: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    settings: RuntimeSettings,
    logger: Option<Arc<Logger>>,
}

impl PipelineRuntime {
    /// Create a runtime with default settings and no run log
    pub fn new(provider: Arc<dyn LlmProvider>, tools: ToolRegistry) -> Self {
        Self {
            provider,
            tools,
            settings: RuntimeSettings::default(),
            logger: None,
        }
    }

    /// Replace the settings
    pub fn with_settings(mut self, settings: RuntimeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Attach a markdown run log
    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_deref()
    }

    /// Model name reported in logs
    pub fn model_name(&self) -> String {
        self.settings
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Write to the run log, if any. Log failures never fail a run.
    pub(crate) fn log<F>(&self, write: F)
    where
        F: FnOnce(&Logger) -> anyhow::Result<()>,
    {
        if let Some(logger) = &self.logger {
            if let Err(e) = write(logger) {
                tracing::warn!(error = %e, "failed to write run log");
            }
        }
    }
}

impl std::fmt::Debug for PipelineRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRuntime")
            .field("provider", &self.provider.provider_name())
            .field("tools", &self.tools)
            .field("settings", &self.settings)
            .field("logger", &self.logger.as_ref().map(|l| l.log_file().to_path_buf()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigurationLoader;
    use crate::provider::OfflineProvider;

    #[test]
    fn test_settings_from_default_configuration() {
        let config = ConfigurationLoader::get_default_config();
        let settings = RuntimeSettings::from_configuration(&config).unwrap();
        assert_eq!(settings.model.as_deref(), Some("gemini-2.5-flash-lite"));
        assert_eq!(settings.max_tokens, 4000);
        assert_eq!(settings.max_tool_rounds, 8);
        assert_eq!(settings.request_interval, Duration::ZERO);
        assert_eq!(settings.malformed_output, MalformedOutputPolicy::Warn);
    }

    #[test]
    fn test_settings_reject_invalid_values() {
        let mut config = ConfigurationLoader::get_default_config();
        config.execution.malformed_output = "ignore".to_string();
        assert!(matches!(
            RuntimeSettings::from_configuration(&config),
            Err(OrchestrationError::Configuration(_))
        ));

        let mut config = ConfigurationLoader::get_default_config();
        config.execution.max_tokens = 0;
        assert!(RuntimeSettings::from_configuration(&config).is_err());

        let mut config = ConfigurationLoader::get_default_config();
        config.execution.max_tool_rounds = 0;
        assert!(RuntimeSettings::from_configuration(&config).is_err());
    }

    #[test]
    fn test_generate_config_carries_settings() {
        let settings = RuntimeSettings {
            model: Some("m".to_string()),
            temperature: Some(0.3),
            ..RuntimeSettings::default()
        };
        let config = settings.generate_config(vec![]);
        assert_eq!(config.model.as_deref(), Some("m"));
        assert_eq!(config.temperature, Some(0.3));
        assert_eq!(config.max_tokens, Some(4000));
    }

    #[test]
    fn test_model_name_falls_back_to_provider() {
        let runtime = PipelineRuntime::new(Arc::new(OfflineProvider::new("offline-model")), ToolRegistry::new());
        assert_eq!(runtime.model_name(), "offline-model");
        assert!(runtime.logger().is_none());
    }
}
