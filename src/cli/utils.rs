//! Shared utility functions for CLI commands

use std::io::BufRead;
use std::time::Duration;

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use crate::orchestration::{OrchestrationError, RunReport};

/// Install the `tracing` subscriber.
///
/// `RUST_LOG` wins; otherwise the configured level (`INFO`, `DEBUG`, ...) is
/// applied to this crate and everything else stays at `warn`.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,lrk={}", log_level.to_lowercase())));
    // A second initialization (tests, embedding) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Read a topic from the first line of `reader`; a blank line means none
pub fn read_topic<R: BufRead>(reader: R) -> std::io::Result<Option<String>> {
    // Only the first line counts: an empty answer accepts the default.
    match reader.lines().next() {
        Some(line) => {
            let line = line?;
            let trimmed = line.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        None => Ok(None),
    }
}

/// Display a user-friendly error message with suggestions
pub fn display_error_with_suggestions<E: std::fmt::Display>(error: &E, context: &str, app_name: Option<&str>) {
    let app = app_name.unwrap_or("lrk");

    eprintln!("{} {}", "❌ Error:".red().bold(), context);
    eprintln!("   {}", error.to_string().red());

    let error_str = error.to_string().to_lowercase();
    if error_str.contains("api key") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Set GOOGLE_API_KEY (or LLM_API_KEY) in the environment or a .env file");
        eprintln!("   • Run '{} run --dry-run' to try the workflow offline", app);
    } else if error_str.contains("permission denied") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Check file permissions");
        eprintln!("   • Choose another directory with '--output-dir'");
    } else if error_str.contains("toml") || error_str.contains("config") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Run '{} config' to see the effective configuration", app);
        eprintln!("   • Check the file passed with '--config'");
    } else if error_str.contains("connection") || error_str.contains("network") || error_str.contains("http") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Check your internet connection");
        eprintln!("   • Verify the [llm] base_url and the search endpoints are reachable");
        eprintln!("   • Raise execution.request_interval_seconds if the provider rate-limits");
    }
}

/// Report a failed run: the failing stage, each failing task and its cause
pub fn print_pipeline_failure(error: &OrchestrationError) {
    let stage = error.stage_name().unwrap_or("<none>");
    eprintln!("{} stage `{}` failed", "❌ Pipeline failed:".red().bold(), stage);
    for task_error in error.task_errors() {
        match task_error.task_name() {
            Some(task) => eprintln!("   • {}: {}", task.bold(), task_error.to_string().red()),
            None => eprintln!("   • {}", task_error.to_string().red()),
        }
    }
    display_error_with_suggestions(error, "The research workflow did not complete", Some("lrk"));
}

/// Per-stage summary of a completed run
pub fn stage_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Stage", "Discipline", "Tasks", "Outputs", "Tool calls", "Time"]);

    for (index, stage) in report.stages.iter().enumerate() {
        let tasks: Vec<&str> = stage.tasks.iter().map(|t| t.name.as_str()).collect();
        let outputs: Vec<String> = stage
            .tasks
            .iter()
            .map(|t| {
                if t.degraded {
                    format!("{} (raw)", t.output_key)
                } else {
                    t.output_key.clone()
                }
            })
            .collect();
        let tool_calls: usize = stage.tasks.iter().map(|t| t.tool_calls.len()).sum();
        let degraded = stage.tasks.iter().any(|t| t.degraded);

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&stage.name),
            Cell::new(stage.discipline),
            Cell::new(tasks.join(", ")),
            Cell::new(outputs.join(", ")).fg(if degraded { Color::Yellow } else { Color::Green }),
            Cell::new(tool_calls),
            Cell::new(format_duration(stage.elapsed)),
        ]);
    }
    table
}

/// Print [`stage_table`] with a one-line total
pub fn print_stage_table(report: &RunReport) {
    println!("{}", stage_table(report));
    println!(
        "{} {} stages, {} tool calls in {}",
        "Σ".bold(),
        report.stages.len(),
        report.tool_call_count(),
        format_duration(report.elapsed)
    );
}

/// `850ms`, `12.3s` or `2m 05s`
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Truncate text with ellipsis if it exceeds max length
pub fn truncate_with_ellipsis(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::{Discipline, ExecutionMode, StageSummary, TaskSummary};
    use std::io::Cursor;

    #[test]
    fn test_read_topic() {
        assert_eq!(
            read_topic(Cursor::new("  Graph Neural Networks \n")).unwrap(),
            Some("Graph Neural Networks".to_string())
        );
        assert_eq!(read_topic(Cursor::new("\nignored\n")).unwrap(), None);
        assert_eq!(read_topic(Cursor::new("")).unwrap(), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("a longer sentence", 10), "a longe...");
    }

    #[test]
    fn test_stage_table_lists_stages() {
        let report = RunReport {
            pipeline: "research_workflow".to_string(),
            session_id: "s".to_string(),
            mode: ExecutionMode::Parallel,
            state: Default::default(),
            journal: Vec::new(),
            stages: vec![StageSummary {
                name: "literature_mining".to_string(),
                discipline: Discipline::Concurrent,
                tasks: vec![
                    TaskSummary {
                        name: "arxiv_mining".to_string(),
                        output_key: "arxiv_results".to_string(),
                        degraded: false,
                        requests: 2,
                        tool_calls: Vec::new(),
                        elapsed: Duration::from_millis(10),
                    },
                    TaskSummary {
                        name: "web_mining".to_string(),
                        output_key: "web_results".to_string(),
                        degraded: true,
                        requests: 1,
                        tool_calls: Vec::new(),
                        elapsed: Duration::from_millis(5),
                    },
                ],
                elapsed: Duration::from_millis(12),
            }],
            elapsed: Duration::from_millis(12),
        };

        let rendered = stage_table(&report).to_string();
        assert!(rendered.contains("literature_mining"));
        assert!(rendered.contains("arxiv_mining, web_mining"));
        assert!(rendered.contains("web_results (raw)"));
    }
}
