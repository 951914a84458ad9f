//! Literature Review Kit (LRK) - staged multi-agent literature reviews
//!
//! LRK runs a pipeline of LLM agents over a shared state store: query
//! formulation, literature mining, quality control, knowledge graph
//! extraction, gap and innovation analysis, hypothesis generation, writing
//! and evaluation. The same pipeline runs sequentially or with multi-task
//! stages fanned out concurrently.
//!
//! - **`config`** - TOML configuration and environment loading
//! - **`observability`** - Markdown run log
//! - **`provider`** - LLM provider abstraction (HTTP and offline)
//! - **`tools`** - Search, citation, forensics, reproducibility and ontology tools
//! - **`orchestration`** - State store, tasks, stages, pipelines, research workflow
//! - **`cli`** - The `lrk` command-line interface
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! lrk = { version = "0.3", default-features = false, features = ["orchestration"] }
//! ```
//!
//! # Example: a two-stage pipeline
//!
//! ```ignore
//! use lrk::orchestration::{ExecutionMode, PipelineBuilder, PipelineRuntime, Task};
//! use lrk::provider::OfflineProvider;
//! use lrk::tools::ToolRegistry;
//! use std::sync::Arc;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let runtime = PipelineRuntime::new(Arc::new(OfflineProvider::default()), ToolRegistry::new());
//!     let pipeline = PipelineBuilder::new("summary")
//!         .mode(ExecutionMode::Parallel)
//!         .task(Task::new("queries", "Search queries for {topic}", "queries"))
//!         .task(Task::new("summary", "Summarize {topic} using {queries}", "summary"))
//!         .build(runtime)?;
//!
//!     let report = pipeline.run("graph neural networks").await?;
//!     println!("{}", report.get("summary").unwrap());
//!     Ok(())
//! }
//! ```
//!
//! # Example: the research workflow
//!
//! ```ignore
//! use lrk::orchestration::{research_pipeline, ExecutionMode, PipelineRuntime, ResearchReport};
//! use lrk::provider::OfflineProvider;
//! use lrk::tools::{research_tools, SearchSettings};
//! use std::sync::Arc;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let tools = research_tools(&SearchSettings::default())?;
//!     let runtime = PipelineRuntime::new(Arc::new(OfflineProvider::default()), tools);
//!     let report = research_pipeline(ExecutionMode::Parallel)
//!         .build(runtime)?
//!         .run("Agents for Scientific Discovery")
//!         .await?;
//!     ResearchReport::from_state(&report.state)?.write_to(std::path::Path::new("."))?;
//!     Ok(())
//! }
//! ```

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Run logging (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// LLM Provider abstraction (enabled with the `provider` feature)
#[cfg(feature = "provider")]
pub mod provider;

/// Research tools (enabled with the `tools` feature)
#[cfg(feature = "tools")]
pub mod tools;

/// Pipeline orchestration (enabled with the `orchestration` feature)
#[cfg(feature = "orchestration")]
pub mod orchestration;

/// Command-line interface (enabled with the `cli` feature)
#[cfg(feature = "cli")]
pub mod cli;

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "config")]
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    #[cfg(feature = "observability")]
    pub use crate::observability::Logger;

    #[cfg(feature = "provider")]
    pub use crate::provider::{GenerateConfig, GenerateResponse, LlmProvider, Message, ProviderFactory, ToolInvocation};

    #[cfg(feature = "tools")]
    pub use crate::tools::{research_tools, SearchSettings, Tool, ToolDefinition, ToolError, ToolRegistry};

    #[cfg(feature = "orchestration")]
    pub use crate::orchestration::{
        research_pipeline, ExecutionMode, OrchestrationError, Pipeline, PipelineBuilder, PipelineRuntime,
        ResearchReport, RunReport, StateStore, Task,
    };
}
