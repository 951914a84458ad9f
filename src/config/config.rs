//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::environment::EnvironmentLoader;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Agent identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub version: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Markdown run log. Empty means a timestamped file in the temp directory.
    #[serde(default)]
    pub log_file: String,
    pub log_level: String,
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// `sequential` or `parallel`
    pub mode: String,
    pub max_tokens: u32,
    /// Upper bound on tool-call rounds a single task may take
    pub max_tool_rounds: u32,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub request_interval_seconds: u64,
    /// `warn` stores malformed structured output as text, `fail` aborts the task
    #[serde(default = "default_malformed_output")]
    pub malformed_output: String,
}

fn default_malformed_output() -> String {
    "warn".to_string()
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            endpoint: "chat/completions".to_string(),
            model: "gemini-2.5-flash-lite".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            temperature: None,
        }
    }
}

/// Search tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub max_results: u32,
    pub arxiv_url: String,
    pub web_url: String,
    /// Characters kept from each arXiv abstract
    pub doc_chars_max: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            arxiv_url: "https://export.arxiv.org/api/query".to_string(),
            web_url: "https://api.duckduckgo.com/".to_string(),
            doc_chars_max: 2000,
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}

impl OutputConfig {
    /// Output directory with `~` and environment variables expanded.
    pub fn resolved_directory(&self) -> PathBuf {
        PathBuf::from(shellexpand::full(&self.directory).map(|s| s.into_owned()).unwrap_or_else(|_| self.directory.clone()))
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    pub config_path: PathBuf,
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, uses `~/.lrk/config.toml`
    ///   when present, otherwise the built-in defaults.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_config_path);

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Self::get_default_config()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Create a configuration loader from a pre-parsed Configuration.
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config_path: Self::default_config_path(),
            config,
        }
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lrk")
            .join("config.toml")
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Get default configuration.
    pub fn get_default_config() -> Configuration {
        Configuration {
            agent: AgentConfig {
                name: "lrk".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                log_file: String::new(),
                log_level: "INFO".to_string(),
            },
            execution: ExecutionConfig {
                mode: "sequential".to_string(),
                max_tokens: 4000,
                max_tool_rounds: 8,
                timeout_seconds: 120,
                request_interval_seconds: 0,
                malformed_output: default_malformed_output(),
            },
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            output: OutputConfig::default(),
        }
    }

    /// Overlay values taken from the process environment.
    ///
    /// `MODEL_NAME`, `EXECUTION_MODE`, `LOG_LEVEL` and `MAX_SEARCH_RESULTS`
    /// win over the file; unparsable numbers are ignored.
    pub fn apply_environment(&mut self, env: &EnvironmentLoader) {
        if let Some(model) = env.model_name() {
            self.config.llm.model = model;
        }
        if let Some(mode) = env.execution_mode() {
            self.config.execution.mode = mode;
        }
        if let Some(level) = env.log_level() {
            self.config.logging.log_level = level;
        }
        if let Some(max) = env.max_search_results() {
            self.config.search.max_results = max;
        }
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match key {
            "agent.name" => Some(self.config.agent.name.clone()),
            "agent.version" => Some(self.config.agent.version.clone()),
            "logging.log_file" => Some(self.config.logging.log_file.clone()),
            "logging.log_level" => Some(self.config.logging.log_level.clone()),
            "execution.mode" => Some(self.config.execution.mode.clone()),
            "execution.malformed_output" => Some(self.config.execution.malformed_output.clone()),
            "llm.base_url" => Some(self.config.llm.base_url.clone()),
            "llm.endpoint" => Some(self.config.llm.endpoint.clone()),
            "llm.model" => Some(self.config.llm.model.clone()),
            "llm.api_key_env" => Some(self.config.llm.api_key_env.clone()),
            "search.arxiv_url" => Some(self.config.search.arxiv_url.clone()),
            "search.web_url" => Some(self.config.search.web_url.clone()),
            "output.directory" => Some(self.config.output.directory.clone()),
            _ => None,
        }
    }

    /// Get numeric configuration value.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match key {
            "execution.max_tokens" => Some(self.config.execution.max_tokens as u64),
            "execution.max_tool_rounds" => Some(self.config.execution.max_tool_rounds as u64),
            "execution.timeout_seconds" => Some(self.config.execution.timeout_seconds),
            "execution.request_interval_seconds" => {
                Some(self.config.execution.request_interval_seconds)
            }
            "search.max_results" => Some(self.config.search.max_results as u64),
            "search.doc_chars_max" => Some(self.config.search.doc_chars_max as u64),
            _ => None,
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.config).context("Failed to serialize configuration")
    }
}
