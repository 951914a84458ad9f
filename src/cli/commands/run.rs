//! Run command - execute the research workflow
//!
//! Loads configuration and environment, builds the provider, tool registry
//! and pipeline, runs it on the topic and saves the markdown report.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use colored::*;

use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{init_tracing, print_pipeline_failure, print_stage_table, read_topic};
use crate::config::{ConfigurationLoader, EnvironmentLoader};
use crate::observability::Logger;
use crate::orchestration::{research_pipeline, ExecutionMode, PipelineRuntime, ResearchReport, RuntimeSettings};
use crate::provider::ProviderFactory;
use crate::tools::{research_tools, SearchSettings};

/// Topic used when none is given on the command line or stdin
pub const DEFAULT_TOPIC: &str = "Agents for Scientific Discovery";

/// Options for a research run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub topic: Option<String>,
    pub mode: Option<String>,
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
}

/// Execute a research run and return the path of the saved report
pub async fn execute_run(options: RunOptions) -> CliResult<PathBuf> {
    let env = EnvironmentLoader::new(options.env_file.as_deref());
    let mut loader = ConfigurationLoader::new(options.config_path.as_deref())
        .map_err(|e| CliError::ConfigError(format!("{:#}", e)))?;
    loader.apply_environment(&env);
    if let Some(mode) = &options.mode {
        loader.config.execution.mode = mode.clone();
    }
    let config = loader.config;

    let mode: ExecutionMode = config
        .execution
        .mode
        .parse()
        .map_err(|e: anyhow::Error| CliError::ConfigError(e.to_string()))?;

    init_tracing(&config.logging.log_level);

    if !options.dry_run {
        for warning in env.warnings(&config.llm.api_key_env) {
            eprintln!("{} {}", "⚠️".yellow(), warning.yellow());
        }
    }

    let topic = match options.topic {
        Some(topic) if !topic.trim().is_empty() => topic.trim().to_string(),
        _ => prompt_topic()?,
    };

    let log_file = (!config.logging.log_file.is_empty()).then(|| PathBuf::from(&config.logging.log_file));
    let logger = Arc::new(Logger::new(log_file.as_deref(), Some(config.logging.log_level.as_str()))?);

    let provider = ProviderFactory::create(&config, &env, options.dry_run)
        .map_err(|e| CliError::ProviderError(format!("{:#}", e)))?;
    let settings = RuntimeSettings::from_configuration(&config)?;
    let search = SearchSettings::from_config(&config.search, config.execution.timeout_seconds);
    let tools = research_tools(&search).map_err(|e| CliError::ConfigError(e.to_string()))?;

    let runtime = PipelineRuntime::new(provider, tools)
        .with_settings(settings)
        .with_logger(Arc::clone(&logger));
    let pipeline = research_pipeline(mode).build(runtime)?;

    println!(
        "{} {} ({} mode, model {}, session {})",
        "🔬 Researching:".cyan().bold(),
        topic,
        mode,
        config.llm.model,
        pipeline.session_id()
    );
    if options.dry_run {
        println!("{}", "   dry run: using the offline provider".dimmed());
    }

    let report = match pipeline.run(&topic).await {
        Ok(report) => report,
        Err(err) => {
            print_pipeline_failure(&err);
            eprintln!("   Run log: {}", logger.log_file().display());
            return Err(err.into());
        }
    };

    print_stage_table(&report);
    for key in report.degraded_outputs() {
        eprintln!(
            "{} `{}` was not valid JSON and was stored as raw text",
            "⚠️".yellow(),
            key
        );
    }

    let output_dir = options
        .output_dir
        .unwrap_or_else(|| config.output.resolved_directory());
    let path = ResearchReport::from_state(&report.state)?.write_to(&output_dir)?;
    println!("{} {}", "✅ Report saved to".green().bold(), path.display());
    println!("   Run log: {}", logger.log_file().display());
    Ok(path)
}

fn prompt_topic() -> CliResult<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        print!("Enter research topic [{}]: ", DEFAULT_TOPIC);
        std::io::stdout().flush()?;
    }
    let topic = read_topic(stdin.lock())?;
    Ok(topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string()))
}
