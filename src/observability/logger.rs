//! Markdown run log for research pipelines.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Logger for pipeline runs, task interactions and tool calls.
///
/// Creates a markdown-formatted log file per run. Concurrent stages share one
/// logger through an `Arc`, so appends are serialized internally.
#[derive(Debug)]
pub struct Logger {
    log_file: PathBuf,
    log_level: String,
    write_lock: Mutex<()>,
}

impl Logger {
    /// Initialize logger.
    ///
    /// # Arguments
    /// * `log_file` - Path to log file. If None, creates a timestamped file in temp directory.
    /// * `log_level` - Logging level (defaults to "INFO").
    pub fn new(log_file: Option<&Path>, log_level: Option<&str>) -> Result<Self> {
        let log_file = match log_file {
            Some(p) => p.to_path_buf(),
            None => {
                let mut dir = std::env::temp_dir();
                dir.push("lrk-logs");
                std::fs::create_dir_all(&dir).with_context(|| {
                    format!("Failed to create log directory: {}", dir.display())
                })?;
                let filename = format!(
                    "run_{}_{}.md",
                    Utc::now().timestamp_millis(),
                    std::process::id()
                );
                dir.join(filename)
            }
        };

        let log_level = log_level.unwrap_or("INFO").to_uppercase();

        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let logger = Self {
            log_file,
            log_level,
            write_lock: Mutex::new(()),
        };

        if !logger.log_file.exists() {
            logger.initialize_log_file()?;
        }

        Ok(logger)
    }

    /// Initialize the log file with header.
    fn initialize_log_file(&self) -> Result<()> {
        let mut file = File::create(&self.log_file)
            .with_context(|| format!("Failed to create log file: {}", self.log_file.display()))?;

        let now: DateTime<Utc> = Utc::now();

        writeln!(file, "# Research Run Log\n")?;
        writeln!(file, "Log started: {}\n", now.to_rfc3339())?;
        writeln!(file, "---\n")?;

        Ok(())
    }

    /// Append content to log file.
    fn append_to_log(&self, content: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Log writer lock poisoned"))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file: {}", self.log_file.display()))?;

        file.write_all(content.as_bytes())
            .with_context(|| "Failed to write to log file")?;

        Ok(())
    }

    fn is_debug(&self) -> bool {
        self.log_level == "DEBUG"
            || std::env::var("RUST_LOG")
                .map(|level| level.to_lowercase().contains("debug"))
                .unwrap_or(false)
    }

    /// Log the start of a pipeline run.
    ///
    /// # Arguments
    /// * `session_id` - Run-scoped session identifier.
    /// * `topic` - Research topic seeding the run.
    /// * `mode` - Execution mode (sequential, parallel).
    pub fn log_run_start(&self, session_id: &str, topic: &str, mode: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "## Run Started - {}\n\n**Session:** {}\n**Topic:** {}\n**Mode:** {}\n\n",
            now.to_rfc3339(),
            session_id,
            topic,
            mode
        );

        self.append_to_log(&content)?;
        println!("INFO: Research run {} started in {} mode", session_id, mode);
        Ok(())
    }

    /// Log the start of a stage.
    pub fn log_stage_start(
        &self,
        index: usize,
        stage: &str,
        discipline: &str,
        tasks: &[&str],
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "## Stage {} `{}` - {}\n\n**Discipline:** {}\n**Tasks:** {}\n\n",
            index + 1,
            stage,
            now.to_rfc3339(),
            discipline,
            tasks.join(", ")
        );

        self.append_to_log(&content)?;
        println!("INFO: Stage {} `{}` ({})", index + 1, stage, discipline);
        Ok(())
    }

    /// Log stage completion with the keys it produced.
    pub fn log_stage_complete(&self, stage: &str, keys: &[&str], elapsed_ms: u128) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Stage Completed `{}` - {}\n\n**Keys:** {}\n**Elapsed:** {} ms\n\n",
            stage,
            now.to_rfc3339(),
            keys.join(", "),
            elapsed_ms
        );

        self.append_to_log(&content)?;
        Ok(())
    }

    /// Log a resolved task prompt. The full prompt is only written at DEBUG level.
    pub fn log_task_prompt(&self, task: &str, prompt: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = if self.is_debug() {
            format!(
                "### Task Prompt `{}` - {}\n\n```\n{}\n```\n\n",
                task,
                now.to_rfc3339(),
                prompt
            )
        } else {
            format!(
                "### Task Prompt `{}` - {}\n\n**Length:** {} chars\n\n",
                task,
                now.to_rfc3339(),
                prompt.chars().count()
            )
        };

        self.append_to_log(&content)
    }

    /// Log LLM response for a task.
    ///
    /// # Arguments
    /// * `task` - Task the response belongs to.
    /// * `response` - LLM response.
    /// * `model` - Model name used.
    pub fn log_llm_response(&self, task: &str, response: &str, model: Option<&str>) -> Result<()> {
        if response.trim().is_empty() {
            println!("DEBUG: Skipping log entry for empty LLM response");
            return Ok(());
        }

        let model = model.unwrap_or("unknown");
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### LLM Response `{}` - {}\n\n**Model:** {}\n\n**Response:**\n```\n{}\n```\n\n",
            task,
            now.to_rfc3339(),
            model,
            response
        );

        self.append_to_log(&content)?;
        println!("INFO: LLM response logged for {}", task);
        Ok(())
    }

    /// Log tool execution attributed to a task.
    ///
    /// # Arguments
    /// * `task` - Task that triggered the call.
    /// * `tool_name` - Name of the tool executed.
    /// * `tool_args` - Arguments passed to the tool.
    /// * `result` - Tool execution result.
    /// * `success` - Whether the tool execution was successful.
    pub fn log_tool_execution(
        &self,
        task: &str,
        tool_name: &str,
        tool_args: &str,
        result: &str,
        success: bool,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let status = if success { "Result" } else { "Error" };

        let content = format!(
            "### Tool Execution - {}\n\n**Task:** {}\n**Tool:** {}\n**Args:** {}\n**{}:** {}\n\n",
            now.to_rfc3339(),
            task,
            tool_name,
            tool_args,
            status,
            result
        );

        self.append_to_log(&content)
    }

    /// Log a structured output that was stored as raw text.
    pub fn log_degraded_output(&self, task: &str, key: &str, reason: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Degraded Output - {}\n\n**Task:** {}\n**Key:** {}\n**Reason:** {}\n\n",
            now.to_rfc3339(),
            task,
            key,
            reason
        );

        self.append_to_log(&content)?;
        println!("WARN: {} output stored as text under `{}`: {}", task, key, reason);
        Ok(())
    }

    /// Log a write into the shared state.
    pub fn log_state_write(&self, seq: u64, key: &str, writer: &str) -> Result<()> {
        let content = format!("- write #{} `{}` by {}\n", seq, key, writer);
        self.append_to_log(&content)
    }

    /// Log error with context.
    ///
    /// # Arguments
    /// * `error` - Error message.
    /// * `context` - Additional context information.
    pub fn log_error(
        &self,
        error: &str,
        context: Option<&HashMap<String, serde_json::Value>>,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "### Error - {}\n\n**Error:** {}\n\n",
            now.to_rfc3339(),
            error
        );

        if let Some(ctx) = context {
            content.push_str(&format!(
                "**Context:** {}\n\n",
                serde_json::to_string_pretty(ctx).unwrap_or_default()
            ));
        }

        self.append_to_log(&content)?;
        eprintln!("ERROR: {}", error);
        Ok(())
    }

    /// Log run completion.
    ///
    /// # Arguments
    /// * `reason` - Reason for completion.
    pub fn log_completion(&self, reason: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "## Run Completed - {}\n\n**Reason:** {}\n\n---\n\n",
            now.to_rfc3339(),
            reason
        );

        self.append_to_log(&content)?;
        println!("INFO: Run completed: {}", reason);
        Ok(())
    }

    /// Log info message.
    pub fn info(&self, message: &str) {
        println!("INFO: {}", message);
    }

    /// Log error message.
    pub fn error(&self, message: &str) {
        eprintln!("ERROR: {}", message);
    }

    /// Get the log file path.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Get the log level.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}
