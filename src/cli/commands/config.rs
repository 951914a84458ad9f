//! Config command - print the effective configuration

use std::path::PathBuf;

use colored::*;

use crate::cli::error::{CliError, CliResult};
use crate::config::{ConfigurationLoader, EnvironmentLoader};

/// Config show options
#[derive(Debug, Clone, Default)]
pub struct ConfigShowOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Print only this dotted key
    pub get: Option<String>,
}

/// Show the configuration after environment overrides, plus environment warnings
pub fn config_show(opts: ConfigShowOptions) -> CliResult<()> {
    let env = EnvironmentLoader::new(opts.env_file.as_deref());
    let mut loader = ConfigurationLoader::new(opts.config_path.as_deref())
        .map_err(|e| CliError::ConfigError(format!("{:#}", e)))?;
    loader.apply_environment(&env);

    if let Some(key) = opts.get.as_deref() {
        println!("{}", config_value(&loader, key)?);
        return Ok(());
    }

    println!("{}", "🔧 Configuration".cyan().bold());
    if loader.config_path.exists() {
        println!("Configuration file: {}", loader.config_path.display());
    } else {
        println!(
            "Configuration file: {} {}",
            loader.config_path.display(),
            "(not found, using defaults)".dimmed()
        );
    }
    if let Some(env_file) = env.env_file() {
        println!("Environment file: {}", env_file);
    }
    println!();
    println!("{}", loader.to_toml()?);

    for warning in env.warnings(&loader.config.llm.api_key_env) {
        println!("{} {}", "⚠️".yellow(), warning.yellow());
    }
    Ok(())
}

/// Look up one effective value, text keys first, then numeric ones
pub fn config_value(loader: &ConfigurationLoader, key: &str) -> CliResult<String> {
    loader
        .get_string(key)
        .or_else(|| loader.get_u64(key).map(|n| n.to_string()))
        .ok_or_else(|| CliError::InvalidInput(format!("Unknown configuration key: {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_show_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let toml = ConfigurationLoader::from_config(ConfigurationLoader::get_default_config())
            .to_toml()
            .unwrap();
        std::fs::write(&path, toml).unwrap();

        let result = config_show(ConfigShowOptions {
            config_path: Some(path),
            env_file: None,
            get: None,
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_value_by_key() {
        let mut config = ConfigurationLoader::get_default_config();
        config.execution.mode = "parallel".to_string();
        config.search.max_results = 3;
        let loader = ConfigurationLoader::from_config(config);

        assert_eq!(config_value(&loader, "execution.mode").unwrap(), "parallel");
        assert_eq!(config_value(&loader, "search.max_results").unwrap(), "3");
        assert!(matches!(
            config_value(&loader, "search.nonexistent"),
            Err(CliError::InvalidInput(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, loader.to_toml().unwrap()).unwrap();
        let result = config_show(ConfigShowOptions {
            config_path: Some(path.clone()),
            env_file: None,
            get: Some("llm.model".to_string()),
        });
        assert!(result.is_ok());

        let err = config_show(ConfigShowOptions {
            config_path: Some(path),
            env_file: None,
            get: Some("llm.nothing".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[test]
    fn test_config_show_rejects_broken_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[execution\nmode = ").unwrap();

        let err = config_show(ConfigShowOptions {
            config_path: Some(path),
            env_file: None,
            get: None,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::ConfigError(_)));
    }
}
