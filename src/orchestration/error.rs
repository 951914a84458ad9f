//! Orchestration error taxonomy.

use thiserror::Error;

/// Result alias used throughout the orchestration core.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Errors raised while building or running a pipeline.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// A task instruction references a key that is not in the state it sees.
    #[error("task `{task}` references missing state key `{key}`")]
    MissingContext { task: String, key: String },

    /// The capability call of a task failed or produced unusable output.
    #[error("task `{task}` failed: {message}")]
    TaskExecution { task: String, message: String },

    /// A tool called on behalf of a task failed or was not bound to it.
    #[error("task `{task}` tool `{tool}` failed: {message}")]
    ToolInvocation {
        task: String,
        tool: String,
        message: String,
    },

    /// One or more tasks of a concurrent stage failed.
    #[error("stage `{stage}` had {} failing task(s): {}", .errors.len(), join_errors(.errors))]
    StageAggregate {
        stage: String,
        errors: Vec<OrchestrationError>,
    },

    /// A stage failed and the pipeline stopped.
    #[error("stage `{stage}` failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: Box<OrchestrationError>,
    },

    /// The pipeline definition or runtime settings are invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The operation is not allowed in the pipeline's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

fn join_errors(errors: &[OrchestrationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl OrchestrationError {
    /// Task the error is attributed to, if any.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            Self::MissingContext { task, .. }
            | Self::TaskExecution { task, .. }
            | Self::ToolInvocation { task, .. } => Some(task.as_str()),
            Self::StageFailed { source, .. } => source.task_name(),
            _ => None,
        }
    }

    /// Stage the error is attributed to, if any.
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::StageAggregate { stage, .. } | Self::StageFailed { stage, .. } => Some(stage.as_str()),
            _ => None,
        }
    }

    /// Innermost task-level errors: the aggregate members, or the error itself.
    pub fn task_errors(&self) -> Vec<&OrchestrationError> {
        match self {
            Self::StageFailed { source, .. } => source.task_errors(),
            Self::StageAggregate { errors, .. } => errors.iter().flat_map(|e| e.task_errors()).collect(),
            other => vec![other],
        }
    }

    pub(crate) fn task_execution(task: &str, message: impl Into<String>) -> Self {
        Self::TaskExecution {
            task: task.to_string(),
            message: message.into(),
        }
    }
}
