//! Stage - an ordered group of tasks run under one discipline
//!
//! A stage never touches the store. It reads a snapshot and hands back a
//! [`StageOutcome`] whose delta the pipeline merges.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::orchestration::error::{OrchestrationError, OrchestrationResult};
use crate::orchestration::runtime::PipelineRuntime;
use crate::orchestration::state::{Overlay, Snapshot, StateDelta};
use crate::orchestration::task::{Task, TaskOutput};

/// How the tasks of a stage are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    /// Declared order; later tasks see earlier outputs
    Sequential,
    /// All tasks at once against the same snapshot
    Concurrent,
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Concurrent => write!(f, "concurrent"),
        }
    }
}

/// Everything a successful stage produced
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: String,
    pub discipline: Discipline,
    /// Writes in task declaration order
    pub delta: StateDelta,
    /// Per-task outputs in declaration order
    pub outputs: Vec<TaskOutput>,
    pub elapsed: Duration,
}

/// A named group of tasks
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    tasks: Vec<Arc<Task>>,
    discipline: Discipline,
}

impl Stage {
    pub fn new(name: impl Into<String>, tasks: Vec<Arc<Task>>, discipline: Discipline) -> Self {
        Self {
            name: name.into(),
            tasks,
            discipline,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[Arc<Task>] {
        &self.tasks
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Run every task against `snapshot`.
    pub async fn run(
        &self,
        snapshot: &Snapshot,
        runtime: &Arc<PipelineRuntime>,
    ) -> OrchestrationResult<StageOutcome> {
        let started = Instant::now();
        let (delta, outputs) = match self.discipline {
            Discipline::Sequential => self.run_sequential(snapshot, runtime).await?,
            Discipline::Concurrent => self.run_concurrent(snapshot, runtime).await?,
        };

        Ok(StageOutcome {
            stage: self.name.clone(),
            discipline: self.discipline,
            delta,
            outputs,
            elapsed: started.elapsed(),
        })
    }

    /// First failure stops the stage and is returned unchanged.
    async fn run_sequential(
        &self,
        snapshot: &Snapshot,
        runtime: &PipelineRuntime,
    ) -> OrchestrationResult<(StateDelta, Vec<TaskOutput>)> {
        let mut delta = StateDelta::new();
        let mut outputs = Vec::with_capacity(self.tasks.len());

        for task in &self.tasks {
            let prompt = task.resolve(&Overlay::new(snapshot, &delta))?;
            debug!(stage = %self.name, task = %task.name(), "task started");
            let output = task.execute(prompt, runtime).await?;
            task.commit(&mut delta, &output);
            outputs.push(output);
        }

        Ok((delta, outputs))
    }

    /// Spawns every task, waits for all of them, and fails if any failed.
    async fn run_concurrent(
        &self,
        snapshot: &Snapshot,
        runtime: &Arc<PipelineRuntime>,
    ) -> OrchestrationResult<(StateDelta, Vec<TaskOutput>)> {
        let handles: Vec<_> = self
            .tasks
            .iter()
            .map(|task| {
                let task = Arc::clone(task);
                let snapshot = snapshot.clone();
                let runtime = Arc::clone(runtime);
                debug!(stage = %self.name, task = %task.name(), "task spawned");
                tokio::spawn(async move { task.run(&snapshot, &runtime).await })
            })
            .collect();

        let results = join_all(handles).await;

        let mut outputs = Vec::with_capacity(self.tasks.len());
        let mut errors = Vec::new();
        for (task, joined) in self.tasks.iter().zip(results) {
            match joined {
                Ok(Ok(output)) => outputs.push(output),
                Ok(Err(error)) => errors.push(error),
                Err(join_error) => errors.push(OrchestrationError::task_execution(
                    task.name(),
                    format!("task aborted: {}", join_error),
                )),
            }
        }

        if !errors.is_empty() {
            warn!(stage = %self.name, failed = errors.len(), "concurrent stage failed, discarding results");
            return Err(OrchestrationError::StageAggregate {
                stage: self.name.clone(),
                errors,
            });
        }

        let mut delta = StateDelta::new();
        for (task, output) in self.tasks.iter().zip(&outputs) {
            task.commit(&mut delta, output);
        }
        Ok((delta, outputs))
    }
}
