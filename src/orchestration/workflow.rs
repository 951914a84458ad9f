//! Workflow policy - execution mode and pipeline status

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::orchestration::stage::Discipline;

/// Run-wide execution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Every stage runs its tasks one after another (default)
    #[default]
    Sequential,
    /// Multi-task stages run their tasks concurrently
    Parallel,
}

impl ExecutionMode {
    /// Get human-readable name for the mode
    pub fn name(&self) -> &str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }

    /// Discipline of a stage holding `task_count` tasks under this mode.
    ///
    /// Single-task stages are always sequential.
    pub fn discipline_for(&self, task_count: usize) -> Discipline {
        match self {
            Self::Parallel if task_count > 1 => Discipline::Concurrent,
            _ => Discipline::Sequential,
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(ExecutionMode::Sequential),
            "parallel" => Ok(ExecutionMode::Parallel),
            _ => Err(anyhow::anyhow!(
                "Invalid execution mode: {} (expected `sequential` or `parallel`)",
                s
            )),
        }
    }
}

/// Pipeline lifecycle
///
/// `NotStarted → Running → Completed | Failed`. A pipeline runs at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Built, not yet run
    #[default]
    NotStarted,
    /// Executing stage `index`
    Running { index: usize, stage: String },
    /// Every stage completed
    Completed,
    /// Stage `index` failed
    Failed { index: usize, stage: String },
}

impl PipelineStatus {
    /// Check if the pipeline is running
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running { index, stage } => write!(f, "running stage {} ({})", index + 1, stage),
            Self::Completed => write!(f, "completed"),
            Self::Failed { index, stage } => write!(f, "failed at stage {} ({})", index + 1, stage),
        }
    }
}
