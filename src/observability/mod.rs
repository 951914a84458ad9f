//! Observability utilities for research runs.
//!
//! A markdown run log records every stage, task prompt, LLM response, tool
//! call and state write of a pipeline run.
//!
//! # Example
//!
//! ```no_run
//! use lrk::observability::Logger;
//!
//! let logger = Logger::new(None, Some("DEBUG")).unwrap();
//! logger.log_run_start("session-1", "protein folding", "sequential").unwrap();
//! logger.log_completion("All stages finished").unwrap();
//! ```

pub mod logger;

// Re-export main types for convenience
pub use logger::Logger;
