//! CLI feature - the `lrk` command-line interface
//!
//! - `lrk run` executes the research workflow and saves the markdown report
//! - `lrk config` prints the effective configuration
//!
//! The binary in `src/bin/lrk.rs` only calls [`run_cli`].

pub mod commands;
pub mod error;
pub mod runner;
pub mod utils;

pub use error::{CliError, CliResult};
pub use runner::{build_cli, run_cli, run_with_matches};
pub use utils::*;
