//! Error types for CLI operations

use thiserror::Error;

use crate::orchestration::OrchestrationError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur during CLI command execution
#[derive(Error, Debug)]
pub enum CliError {
    /// Error executing a command or operation
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Provider creation error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Invalid argument or input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The research pipeline failed
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] OrchestrationError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::ExecutionError(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_keeps_source() {
        let err: CliError = OrchestrationError::Configuration("stage `x` has no tasks".into()).into();
        assert!(matches!(err, CliError::PipelineError(_)));
        assert!(err.to_string().contains("stage `x` has no tasks"));
    }

    #[test]
    fn test_anyhow_context_is_flattened() {
        let err: CliError = anyhow::anyhow!("root cause").context("outer").into();
        assert_eq!(err.to_string(), "Execution error: outer: root cause");
    }
}
