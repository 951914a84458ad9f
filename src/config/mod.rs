//! Configuration management for research runs.
//!
//! This module provides configuration loading through TOML files and
//! environment variable management via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use lrk::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(Some(Path::new(".env")));
//!
//! let mut loader = ConfigurationLoader::new(Some(Path::new("config/lrk.toml"))).unwrap();
//! loader.apply_environment(&env);
//!
//! println!("Execution mode: {}", loader.config.execution.mode);
//! println!("Model: {}", loader.config.llm.model);
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    AgentConfig, Configuration, ConfigurationLoader, ExecutionConfig, LlmConfig, LoggingConfig,
    OutputConfig, SearchConfig,
};
pub use self::environment::EnvironmentLoader;
