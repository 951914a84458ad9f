//! Provider factory.
//!
//! Chooses between the HTTP provider and the offline provider from the
//! effective configuration, the environment and the `--dry-run` switch.

use std::sync::Arc;

use anyhow::Result;

use crate::config::{Configuration, EnvironmentLoader};
use crate::provider::http::HttpProvider;
use crate::provider::offline::OfflineProvider;
use crate::provider::LlmProvider;

/// Factory for creating LLM providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the provider for a run.
    ///
    /// # Arguments
    /// * `config` - Effective configuration (`[llm]` and `[execution]` sections)
    /// * `env` - Environment loader used to look up the API key
    /// * `dry_run` - When true, returns an [`OfflineProvider`] and needs no key
    pub fn create(
        config: &Configuration,
        env: &EnvironmentLoader,
        dry_run: bool,
    ) -> Result<Arc<dyn LlmProvider>> {
        if dry_run {
            return Ok(Arc::new(OfflineProvider::new(config.llm.model.clone())));
        }

        let api_key = env.api_key(&config.llm.api_key_env).ok_or_else(|| {
            anyhow::anyhow!(
                "No API key found: set {} (or LLM_API_KEY), or pass --dry-run",
                config.llm.api_key_env
            )
        })?;

        let provider = HttpProvider::new(&config.llm, api_key, config.execution.timeout_seconds)?;
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigurationLoader;

    #[test]
    fn test_dry_run_needs_no_key() {
        let mut config = ConfigurationLoader::get_default_config();
        config.llm.api_key_env = "LRK_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        let provider = ProviderFactory::create(&config, &EnvironmentLoader::new(None), true).unwrap();
        assert_eq!(provider.provider_name(), "offline");
        assert_eq!(provider.default_model(), "gemini-2.5-flash-lite");
    }

    #[test]
    fn test_http_provider_from_named_key() {
        std::env::set_var("LRK_TEST_FACTORY_KEY", "secret");
        let mut config = ConfigurationLoader::get_default_config();
        config.llm.api_key_env = "LRK_TEST_FACTORY_KEY".to_string();
        let provider = ProviderFactory::create(&config, &EnvironmentLoader::new(None), false).unwrap();
        assert_eq!(provider.provider_name(), "openai-compatible");
        std::env::remove_var("LRK_TEST_FACTORY_KEY");
    }
}
