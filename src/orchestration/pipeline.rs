//! Pipeline - ordered stages over one shared state store
//!
//! Build with [`PipelineBuilder`]; structural mistakes (duplicate names,
//! clashing output keys, unknown tools, unproducible references) are caught
//! at build time. A built pipeline runs exactly once.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::orchestration::error::{OrchestrationError, OrchestrationResult};
use crate::orchestration::runtime::PipelineRuntime;
use crate::orchestration::stage::{Discipline, Stage, StageOutcome};
use crate::orchestration::state::{StateMap, StateStore, StateWrite};
use crate::orchestration::task::Task;
use crate::orchestration::tools::ToolCallRecord;
use crate::orchestration::workflow::{ExecutionMode, PipelineStatus};

/// Reserved key holding the run's topic
pub const TOPIC_KEY: &str = "topic";

/// Writer recorded for values seeded by the pipeline itself
pub const PIPELINE_WRITER: &str = "pipeline";

/// Declarative pipeline definition
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    mode: ExecutionMode,
    stages: Vec<(String, Vec<Task>)>,
    validate_references: bool,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: ExecutionMode::default(),
            stages: Vec::new(),
            validate_references: true,
        }
    }

    /// Set the run-wide execution mode
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append a stage
    pub fn stage(mut self, name: impl Into<String>, tasks: Vec<Task>) -> Self {
        self.stages.push((name.into(), tasks));
        self
    }

    /// Append a single-task stage named after the task
    pub fn task(self, task: Task) -> Self {
        let name = task.name().to_string();
        self.stage(name, vec![task])
    }

    /// Check at build time that every `{key}` can be produced before its task runs
    pub fn validate_references(mut self, enabled: bool) -> Self {
        self.validate_references = enabled;
        self
    }

    /// Validate the definition and bind it to `runtime`.
    pub fn build(self, runtime: PipelineRuntime) -> OrchestrationResult<Pipeline> {
        if self.stages.is_empty() {
            return Err(config_error(format!("pipeline `{}` has no stages", self.name)));
        }

        let mut task_names: HashSet<&str> = HashSet::new();
        let mut available: HashSet<&str> = HashSet::from([TOPIC_KEY]);

        for (stage_name, tasks) in &self.stages {
            if tasks.is_empty() {
                return Err(config_error(format!("stage `{}` has no tasks", stage_name)));
            }
            let discipline = self.mode.discipline_for(tasks.len());

            let mut stage_keys: HashSet<&str> = HashSet::new();
            for task in tasks {
                if !task_names.insert(task.name()) {
                    return Err(config_error(format!("duplicate task name `{}`", task.name())));
                }
                // Same-stage writers would race in parallel mode, so this holds in both modes.
                if !stage_keys.insert(task.output_key()) {
                    return Err(config_error(format!(
                        "stage `{}` has more than one task writing `{}`",
                        stage_name,
                        task.output_key()
                    )));
                }
                for tool in task.tools() {
                    if !runtime.tools().contains(tool) {
                        return Err(config_error(format!(
                            "task `{}` binds unknown tool `{}`",
                            task.name(),
                            tool
                        )));
                    }
                }
                if self.validate_references {
                    if let Some(key) = task.references().into_iter().find(|k| !available.contains(k)) {
                        return Err(config_error(format!(
                            "task `{}` references `{}`, which no earlier task produces",
                            task.name(),
                            key
                        )));
                    }
                }
                if discipline == Discipline::Sequential {
                    available.insert(task.output_key());
                }
            }
            available.extend(stage_keys);
        }

        let mode = self.mode;
        let stages = self
            .stages
            .into_iter()
            .map(|(name, tasks)| {
                let discipline = mode.discipline_for(tasks.len());
                Stage::new(name, tasks.into_iter().map(Arc::new).collect(), discipline)
            })
            .collect();

        Ok(Pipeline {
            name: self.name,
            mode,
            session_id: uuid::Uuid::new_v4().to_string(),
            stages,
            runtime: Arc::new(runtime),
            status: RwLock::new(PipelineStatus::NotStarted),
        })
    }
}

fn config_error(message: String) -> OrchestrationError {
    OrchestrationError::Configuration(message)
}

/// Per-task entry of a run report
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub name: String,
    pub output_key: String,
    pub degraded: bool,
    pub requests: u32,
    pub tool_calls: Vec<ToolCallRecord>,
    pub elapsed: Duration,
}

/// Per-stage entry of a run report
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub name: String,
    pub discipline: Discipline,
    pub tasks: Vec<TaskSummary>,
    pub elapsed: Duration,
}

impl From<StageOutcome> for StageSummary {
    fn from(outcome: StageOutcome) -> Self {
        Self {
            name: outcome.stage,
            discipline: outcome.discipline,
            tasks: outcome
                .outputs
                .into_iter()
                .map(|o| TaskSummary {
                    name: o.task,
                    output_key: o.output_key,
                    degraded: o.degraded,
                    requests: o.requests,
                    tool_calls: o.tool_calls,
                    elapsed: o.elapsed,
                })
                .collect(),
            elapsed: outcome.elapsed,
        }
    }
}

/// Final state and per-stage account of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pipeline: String,
    pub session_id: String,
    pub mode: ExecutionMode,
    pub state: StateMap,
    pub journal: Vec<StateWrite>,
    pub stages: Vec<StageSummary>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Output keys whose structured value was stored as raw text
    pub fn degraded_outputs(&self) -> Vec<&str> {
        self.stages
            .iter()
            .flat_map(|s| s.tasks.iter())
            .filter(|t| t.degraded)
            .map(|t| t.output_key.as_str())
            .collect()
    }

    pub fn tool_call_count(&self) -> usize {
        self.stages
            .iter()
            .flat_map(|s| s.tasks.iter())
            .map(|t| t.tool_calls.len())
            .sum()
    }
}

/// A validated, runnable pipeline
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    mode: ExecutionMode,
    session_id: String,
    stages: Vec<Stage>,
    runtime: Arc<PipelineRuntime>,
    status: RwLock<PipelineStatus>,
}

impl Pipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Current status
    pub async fn status(&self) -> PipelineStatus {
        self.status.read().await.clone()
    }

    async fn set_status(&self, status: PipelineStatus) {
        *self.status.write().await = status;
    }

    /// Run every stage in order, seeding the store with `topic`.
    ///
    /// Fails fast: the first failing stage stops the run and its error is
    /// returned wrapped in `StageFailed`. A pipeline cannot be run twice.
    pub async fn run(&self, topic: &str) -> OrchestrationResult<RunReport> {
        {
            let mut status = self.status.write().await;
            if *status != PipelineStatus::NotStarted {
                let reason = if status.is_running() {
                    "is already running"
                } else {
                    "has already been run"
                };
                return Err(OrchestrationError::InvalidState(format!(
                    "pipeline `{}` {} (status: {})",
                    self.name, reason, status
                )));
            }
            *status = PipelineStatus::Running {
                index: 0,
                stage: self.stages[0].name().to_string(),
            };
        }

        let started = Instant::now();
        let runtime = &self.runtime;
        info!(pipeline = %self.name, session = %self.session_id, mode = %self.mode, stages = self.stages.len(), "run started");
        runtime.log(|l| l.log_run_start(&self.session_id, topic, self.mode.name()));

        let mut store = StateStore::new(self.session_id.as_str());
        let seed = store.set(TOPIC_KEY, json!(topic), PIPELINE_WRITER).clone();
        runtime.log(|l| l.log_state_write(seed.seq, &seed.key, &seed.writer));

        let mut summaries = Vec::with_capacity(self.stages.len());
        for (index, stage) in self.stages.iter().enumerate() {
            self.set_status(PipelineStatus::Running {
                index,
                stage: stage.name().to_string(),
            })
            .await;
            info!(stage = %stage.name(), index, discipline = %stage.discipline(), "stage started");
            runtime.log(|l| {
                l.log_stage_start(index, stage.name(), &stage.discipline().to_string(), &stage.task_names())
            });

            let snapshot = store.snapshot();
            let outcome = match stage.run(&snapshot, runtime).await {
                Ok(outcome) => outcome,
                Err(failure) => {
                    self.set_status(PipelineStatus::Failed {
                        index,
                        stage: stage.name().to_string(),
                    })
                    .await;
                    error!(stage = %stage.name(), error = %failure, "stage failed");
                    let context: HashMap<String, Value> = HashMap::from([
                        ("stage".to_string(), json!(stage.name())),
                        ("task".to_string(), json!(failure.task_name())),
                        ("session".to_string(), json!(self.session_id)),
                    ]);
                    runtime.log(|l| l.log_error(&failure.to_string(), Some(&context)));
                    runtime.log(|l| l.log_completion(&format!("failed at stage `{}`", stage.name())));
                    return Err(OrchestrationError::StageFailed {
                        stage: stage.name().to_string(),
                        source: Box::new(failure),
                    });
                }
            };

            let StageOutcome {
                stage: stage_name,
                discipline,
                delta,
                outputs,
                elapsed,
            } = outcome;
            let keys: Vec<String> = delta.keys().into_iter().map(str::to_string).collect();
            for write in store.merge(delta) {
                runtime.log(|l| l.log_state_write(write.seq, &write.key, &write.writer));
            }
            let key_refs: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
            runtime.log(|l| l.log_stage_complete(&stage_name, &key_refs, elapsed.as_millis()));
            info!(stage = %stage_name, keys = ?key_refs, elapsed_ms = elapsed.as_millis() as u64, "stage completed");

            summaries.push(StageSummary::from(StageOutcome {
                stage: stage_name,
                discipline,
                delta: Default::default(),
                outputs,
                elapsed,
            }));
        }

        self.set_status(PipelineStatus::Completed).await;
        runtime.log(|l| l.log_completion("all stages completed"));
        info!(pipeline = %self.name, elapsed_ms = started.elapsed().as_millis() as u64, "run completed");

        let journal = store.journal().to_vec();
        Ok(RunReport {
            pipeline: self.name.clone(),
            session_id: self.session_id.clone(),
            mode: self.mode,
            state: store.into_values(),
            journal,
            stages: summaries,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::OfflineProvider;
    use crate::tools::{FnTool, ToolDefinition, ToolRegistry};

    fn runtime() -> PipelineRuntime {
        let mut tools = ToolRegistry::new();
        tools
            .register(Arc::new(FnTool::new(
                ToolDefinition::new("lookup", "Lookup", json!({"type": "object"})),
                |_| Ok(json!([])),
            )))
            .unwrap();
        PipelineRuntime::new(Arc::new(OfflineProvider::default()), tools)
    }

    fn build_err(builder: PipelineBuilder) -> String {
        match builder.build(runtime()) {
            Err(OrchestrationError::Configuration(message)) => message,
            other => panic!("expected configuration error, got {:?}", other.map(|p| p.name().to_string())),
        }
    }

    #[test]
    fn test_empty_pipeline_and_stage_rejected() {
        assert!(build_err(PipelineBuilder::new("p")).contains("no stages"));
        assert!(build_err(PipelineBuilder::new("p").stage("empty", vec![])).contains("no tasks"));
    }

    #[test]
    fn test_duplicate_output_key_rejected_in_both_modes() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let builder = PipelineBuilder::new("p").mode(mode).stage(
                "mining",
                vec![
                    Task::new("a", "{topic}", "results"),
                    Task::new("b", "{topic}", "results"),
                ],
            );
            assert!(build_err(builder).contains("more than one task writing `results`"));
        }
    }

    #[test]
    fn test_duplicate_task_name_and_unknown_tool_rejected() {
        let dup = PipelineBuilder::new("p")
            .task(Task::new("a", "{topic}", "x"))
            .task(Task::new("a", "{topic}", "y"));
        assert!(build_err(dup).contains("duplicate task name `a`"));

        let tool = PipelineBuilder::new("p").task(Task::new("a", "{topic}", "x").with_tools(["missing"]));
        assert!(build_err(tool).contains("unknown tool `missing`"));

        let ok = PipelineBuilder::new("p").task(Task::new("a", "{topic}", "x").with_tools(["lookup"]));
        assert!(ok.build(runtime()).is_ok());
    }

    #[test]
    fn test_reference_validation_depends_on_discipline() {
        let stage = |mode| {
            PipelineBuilder::new("p").mode(mode).stage(
                "pair",
                vec![Task::new("a", "{topic}", "x"), Task::new("b", "uses {x}", "y")],
            )
        };
        assert!(stage(ExecutionMode::Sequential).build(runtime()).is_ok());
        assert!(build_err(stage(ExecutionMode::Parallel)).contains("references `x`"));

        let later = PipelineBuilder::new("p").task(Task::new("a", "{unknown}", "x"));
        assert!(build_err(later.clone()).contains("references `unknown`"));
        assert!(later.validate_references(false).build(runtime()).is_ok());
    }

    #[test]
    fn test_disciplines_follow_mode() {
        let pipeline = PipelineBuilder::new("p")
            .mode(ExecutionMode::Parallel)
            .task(Task::new("solo", "{topic}", "s"))
            .stage(
                "fan",
                vec![Task::new("a", "{s}", "a"), Task::new("b", "{s}", "b")],
            )
            .build(runtime())
            .unwrap();
        assert_eq!(pipeline.stages()[0].discipline(), Discipline::Sequential);
        assert_eq!(pipeline.stages()[1].discipline(), Discipline::Concurrent);
        assert_eq!(pipeline.stages()[0].name(), "solo");
        assert_eq!(pipeline.session_id().len(), 36);
    }

    #[tokio::test]
    async fn test_run_seeds_topic_and_rejects_rerun() {
        let pipeline = PipelineBuilder::new("p")
            .task(Task::new("q", "Queries for {topic}", "queries"))
            .build(runtime())
            .unwrap();
        assert_eq!(pipeline.status().await, PipelineStatus::NotStarted);

        let report = pipeline.run("graph learning").await.unwrap();
        assert_eq!(report.get("topic"), Some(&json!("graph learning")));
        assert!(report.get("queries").is_some());
        assert_eq!(report.journal[0].writer, PIPELINE_WRITER);
        assert_eq!(report.journal[1].writer, "q");
        assert_eq!(report.stages.len(), 1);
        assert_eq!(pipeline.status().await, PipelineStatus::Completed);

        let rerun = pipeline.run("again").await;
        assert!(matches!(rerun, Err(OrchestrationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_runtime_missing_context_fails_stage() {
        let pipeline = PipelineBuilder::new("p")
            .task(Task::new("w", "Draft from {gaps}", "draft"))
            .validate_references(false)
            .build(runtime())
            .unwrap();
        let err = pipeline.run("t").await.unwrap_err();
        match &err {
            OrchestrationError::StageFailed { stage, source } => {
                assert_eq!(stage, "w");
                assert!(matches!(**source, OrchestrationError::MissingContext { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            pipeline.status().await,
            PipelineStatus::Failed {
                index: 0,
                stage: "w".to_string()
            }
        );
    }
}
