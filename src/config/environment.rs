//! Environment variable loading and management.
//!
//! Host-level settings only: credentials, model selection and the run-wide
//! execution mode. Everything else lives in the TOML configuration.

use std::env;
use std::path::Path;

/// Fallback API key variable checked after the configured one.
const GENERIC_API_KEY_VAR: &str = "LLM_API_KEY";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Only an explicit path is loaded, so
    ///   unit tests never pick up a stray repository `.env`.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    eprintln!("Warning: Failed to load .env file: {}", e);
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// The `.env` file this loader was created with, if any.
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// API key read from `key_var`, falling back to `LLM_API_KEY`.
    pub fn api_key(&self, key_var: &str) -> Option<String> {
        non_empty(key_var).or_else(|| non_empty(GENERIC_API_KEY_VAR))
    }

    /// Model override (`MODEL_NAME`).
    pub fn model_name(&self) -> Option<String> {
        non_empty("MODEL_NAME")
    }

    /// Execution mode override (`EXECUTION_MODE`), lower-cased.
    pub fn execution_mode(&self) -> Option<String> {
        non_empty("EXECUTION_MODE").map(|m| m.to_lowercase())
    }

    /// Log level override (`LOG_LEVEL`).
    pub fn log_level(&self) -> Option<String> {
        non_empty("LOG_LEVEL")
    }

    /// Search result limit override (`MAX_SEARCH_RESULTS`).
    pub fn max_search_results(&self) -> Option<u32> {
        non_empty("MAX_SEARCH_RESULTS").and_then(|v| v.trim().parse().ok())
    }

    /// Problems worth reporting before a run starts.
    pub fn warnings(&self, key_var: &str) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.api_key(key_var).is_none() {
            warnings.push(format!("{} not found in environment variables.", key_var));
        }
        warnings
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_environment_overrides() {
        env::remove_var("LRK_TEST_KEY");
        env::remove_var(GENERIC_API_KEY_VAR);
        let env_loader = EnvironmentLoader::default();
        assert_eq!(env_loader.api_key("LRK_TEST_KEY"), None);
        assert_eq!(env_loader.warnings("LRK_TEST_KEY").len(), 1);

        env::set_var("LRK_TEST_KEY", "secret");
        assert_eq!(env_loader.api_key("LRK_TEST_KEY"), Some("secret".to_string()));
        assert!(env_loader.warnings("LRK_TEST_KEY").is_empty());
        env::remove_var("LRK_TEST_KEY");

        env::set_var("EXECUTION_MODE", "PARALLEL");
        assert_eq!(env_loader.execution_mode(), Some("parallel".to_string()));
        env::remove_var("EXECUTION_MODE");

        env::set_var("MAX_SEARCH_RESULTS", "not-a-number");
        assert_eq!(env_loader.max_search_results(), None);
        env::set_var("MAX_SEARCH_RESULTS", "7");
        assert_eq!(env_loader.max_search_results(), Some(7));
        env::remove_var("MAX_SEARCH_RESULTS");
    }

    #[test]
    fn test_env_file_loading() {
        let env_loader = EnvironmentLoader::new(None);
        assert!(env_loader.env_file().is_none());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "LRK_DOTENV_PROBE=loaded").unwrap();
        let env_loader = EnvironmentLoader::new(Some(file.path()));
        assert!(env_loader.env_file().is_some());
        assert_eq!(env::var("LRK_DOTENV_PROBE").unwrap(), "loaded");
        env::remove_var("LRK_DOTENV_PROBE");
    }
}
