//! Orchestration - staged multi-agent pipelines over shared state
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s. Each stage holds one or
//! more [`Task`]s: an LLM agent with a prompt template, bound tools and an
//! output key in the shared [`StateStore`]. Stages run one after another;
//! tasks inside a multi-task stage run sequentially or concurrently
//! depending on the run's [`ExecutionMode`].
//!
//! Concurrent tasks read a frozen [`Snapshot`] of the state taken when the
//! stage starts and their writes are merged once every sibling finished, so
//! sibling outputs are never visible to each other.
//!
//! ```ignore
//! use lrk::orchestration::{research_pipeline, ExecutionMode, PipelineRuntime};
//!
//! let pipeline = research_pipeline(ExecutionMode::Parallel).build(runtime)?;
//! let report = pipeline.run("Agents for Scientific Discovery").await?;
//! println!("{}", report.get("final_report").unwrap());
//! ```

pub mod error;
pub mod pipeline;
pub mod report;
pub mod research;
pub mod runtime;
pub mod stage;
pub mod state;
pub mod task;
pub mod template;
pub mod tools;
pub mod workflow;

pub use error::{OrchestrationError, OrchestrationResult};
pub use pipeline::{Pipeline, PipelineBuilder, RunReport, StageSummary, TaskSummary, TOPIC_KEY};
pub use report::{report_filename, ResearchReport};
pub use research::{keys, research_pipeline};
pub use runtime::{PipelineRuntime, RuntimeSettings};
pub use stage::{Discipline, Stage, StageOutcome};
pub use state::{Overlay, Snapshot, StateDelta, StateMap, StateStore, StateView, StateWrite};
pub use task::{MalformedOutputPolicy, OutputFormat, Task, TaskOutput};
pub use template::PromptTemplate;
pub use tools::{ToolCallRecord, ToolCoordinator};
pub use workflow::{ExecutionMode, PipelineStatus};
