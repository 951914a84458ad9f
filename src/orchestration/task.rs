//! Task - one agent invocation
//!
//! A task renders its instruction template against the state it is given,
//! runs the provider/tool loop, and produces a single value for its output
//! key. Tasks are immutable once built and shared as `Arc<Task>`.

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::orchestration::error::{OrchestrationError, OrchestrationResult};
use crate::orchestration::runtime::PipelineRuntime;
use crate::orchestration::state::{StateDelta, StateView};
use crate::orchestration::template::{stringify, PromptTemplate};
use crate::orchestration::tools::{ToolCallRecord, ToolCoordinator};
use crate::provider::{GenerateResponse, Message, ToolInvocation};

/// Shape of a task's final answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Stored verbatim as a JSON string
    #[default]
    Text,
    /// Parsed as JSON; Markdown code fences are stripped first
    Json,
}

/// What to do when a `Json` task answers with something that does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedOutputPolicy {
    /// Store the raw text and mark the output degraded
    #[default]
    Warn,
    /// Fail the task
    Fail,
}

impl std::fmt::Display for MalformedOutputPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for MalformedOutputPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            _ => Err(anyhow::anyhow!(
                "Invalid malformed output policy: {} (expected `warn` or `fail`)",
                s
            )),
        }
    }
}

/// Result of one task execution, not yet committed to state
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub task: String,
    pub output_key: String,
    pub value: Value,
    /// Structured output could not be parsed and was stored as text
    pub degraded: bool,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Provider requests made
    pub requests: u32,
    pub elapsed: Duration,
}

/// A named agent invocation writing one state key
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    instruction: PromptTemplate,
    tools: Vec<String>,
    output_key: String,
    format: OutputFormat,
}

impl Task {
    /// Create a text task.
    ///
    /// # Arguments
    /// * `name` - Unique task name, used for attribution
    /// * `instruction` - Template with `{key}` placeholders
    /// * `output_key` - State key the answer is written to
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: PromptTemplate::parse(instruction),
            tools: Vec::new(),
            output_key: output_key.into(),
            format: OutputFormat::Text,
        }
    }

    /// Bind tools by name
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Set the output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Shorthand for `with_format(OutputFormat::Json)`
    pub fn json(self) -> Self {
        self.with_format(OutputFormat::Json)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn instruction(&self) -> &PromptTemplate {
        &self.instruction
    }

    /// State keys the instruction reads
    pub fn references(&self) -> Vec<&str> {
        self.instruction.placeholders()
    }

    /// Render the instruction against `view`.
    ///
    /// Fails with `MissingContext` before anything is sent to the provider.
    pub fn resolve<V: StateView + ?Sized>(&self, view: &V) -> OrchestrationResult<String> {
        self.instruction
            .render(view)
            .map_err(|missing| OrchestrationError::MissingContext {
                task: self.name.clone(),
                key: missing.key,
            })
    }

    /// Resolve against `view`, then execute.
    pub async fn run<V: StateView + ?Sized>(
        &self,
        view: &V,
        runtime: &PipelineRuntime,
    ) -> OrchestrationResult<TaskOutput> {
        let prompt = self.resolve(view)?;
        self.execute(prompt, runtime).await
    }

    /// Run the provider/tool loop for an already resolved prompt.
    ///
    /// At most once: provider and tool failures are returned, never retried.
    pub async fn execute(&self, prompt: String, runtime: &PipelineRuntime) -> OrchestrationResult<TaskOutput> {
        let started = Instant::now();
        let settings = runtime.settings();
        let model = runtime.model_name();
        runtime.log(|l| l.log_task_prompt(&self.name, &prompt));

        let schemas = runtime
            .tools()
            .openai_tools(&self.tools)
            .map_err(|e| OrchestrationError::ToolInvocation {
                task: self.name.clone(),
                tool: tool_error_name(&e),
                message: e.to_string(),
            })?;
        let config = settings.generate_config(schemas);

        let mut messages = vec![Message::user(prompt)];
        let mut coordinator = ToolCoordinator::new(self.name.as_str());
        let mut tool_rounds = 0u32;
        let mut requests = 0u32;

        loop {
            if !settings.request_interval.is_zero() {
                tokio::time::sleep(settings.request_interval).await;
            }

            requests += 1;
            debug!(task = %self.name, request = requests, "requesting generation");
            let response = runtime
                .provider()
                .generate(&messages, &config)
                .await
                .map_err(|e| OrchestrationError::task_execution(&self.name, format!("{:#}", e)))?;

            match response {
                GenerateResponse::Content(text) => {
                    runtime.log(|l| l.log_llm_response(&self.name, &text, Some(model.as_str())));
                    let (value, degraded) = self.interpret(text, runtime)?;
                    info!(
                        task = %self.name,
                        key = %self.output_key,
                        requests,
                        tool_calls = coordinator.invocation_count(),
                        degraded,
                        "task completed"
                    );
                    return Ok(TaskOutput {
                        task: self.name.clone(),
                        output_key: self.output_key.clone(),
                        value,
                        degraded,
                        tool_calls: coordinator.into_history(),
                        requests,
                        elapsed: started.elapsed(),
                    });
                }
                GenerateResponse::ToolCalls(calls) => {
                    if calls.is_empty() {
                        return Err(OrchestrationError::task_execution(
                            &self.name,
                            "provider returned an empty tool call batch",
                        ));
                    }
                    if tool_rounds >= settings.max_tool_rounds {
                        return Err(OrchestrationError::task_execution(
                            &self.name,
                            format!(
                                "exceeded the tool-round budget of {} without a final answer",
                                settings.max_tool_rounds
                            ),
                        ));
                    }
                    tool_rounds += 1;

                    let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
                    debug!(task = %self.name, round = tool_rounds, tools = ?names, "executing tool calls");

                    messages.push(Message::assistant("", calls.clone()));
                    for call in calls {
                        let result = self.invoke_tool(&call, runtime, &mut coordinator).await?;
                        messages.push(Message::tool(call.id, call.name, result));
                    }
                }
            }
        }
    }

    async fn invoke_tool(
        &self,
        call: &ToolInvocation,
        runtime: &PipelineRuntime,
        coordinator: &mut ToolCoordinator,
    ) -> OrchestrationResult<String> {
        let args_text = call.arguments.to_string();

        let outcome = if !self.tools.iter().any(|t| t == &call.name) {
            Err(format!("tool `{}` is not bound to this task", call.name))
        } else {
            match runtime.tools().get(&call.name) {
                Some(tool) => tool.call(call.arguments.clone()).await.map_err(|e| e.to_string()),
                None => Err(format!("tool `{}` is not registered", call.name)),
            }
        };

        match outcome {
            Ok(value) => {
                let text = stringify(&value);
                runtime.log(|l| l.log_tool_execution(&self.name, &call.name, &args_text, &text, true));
                coordinator.record(&call.name, &call.id, call.arguments.clone(), text.clone(), true);
                Ok(text)
            }
            Err(message) => {
                warn!(task = %self.name, tool = %call.name, error = %message, "tool call failed");
                runtime.log(|l| l.log_tool_execution(&self.name, &call.name, &args_text, &message, false));
                coordinator.record(&call.name, &call.id, call.arguments.clone(), message.clone(), false);
                Err(OrchestrationError::ToolInvocation {
                    task: self.name.clone(),
                    tool: call.name.clone(),
                    message,
                })
            }
        }
    }

    fn interpret(&self, text: String, runtime: &PipelineRuntime) -> OrchestrationResult<(Value, bool)> {
        if self.format == OutputFormat::Text {
            return Ok((Value::String(text), false));
        }

        match parse_structured(&text) {
            Ok(value) => Ok((value, false)),
            Err(e) => match runtime.settings().malformed_output {
                MalformedOutputPolicy::Warn => {
                    warn!(task = %self.name, key = %self.output_key, error = %e, "storing malformed JSON output as text");
                    runtime.log(|l| l.log_degraded_output(&self.name, &self.output_key, &e.to_string()));
                    Ok((Value::String(text), true))
                }
                MalformedOutputPolicy::Fail => Err(OrchestrationError::task_execution(
                    &self.name,
                    format!("malformed JSON output: {}", e),
                )),
            },
        }
    }

    /// Stage `output` for the task's output key, attributed to this task.
    pub fn commit(&self, delta: &mut StateDelta, output: &TaskOutput) {
        delta.push(self.output_key.as_str(), self.name.as_str(), output.value.clone());
    }
}

fn tool_error_name(error: &crate::tools::ToolError) -> String {
    use crate::tools::ToolError;
    match error {
        ToolError::NotFound { name }
        | ToolError::DuplicateName { name }
        | ToolError::InvalidArguments { name, .. }
        | ToolError::ExecutionFailed { name, .. } => name.clone(),
    }
}

/// Remove a surrounding Markdown code fence (with optional language tag).
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model answer as JSON, tolerating a Markdown code fence.
pub fn parse_structured(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_code_fence(text))
}
