//! Tool trait, definitions and the registry Tasks bind against.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::tools::ToolError;

/// Name, description and JSON-Schema parameters of a tool.
///
/// # Example
///
/// ```
/// use lrk::tools::ToolDefinition;
/// use serde_json::json;
///
/// let def = ToolDefinition::new(
///     "canonicalize_problem",
///     "Map domain jargon onto an abstract problem class",
///     json!({
///         "type": "object",
///         "properties": {"problem_description": {"type": "string"}},
///         "required": ["problem_description"]
///     }),
/// );
/// assert_eq!(def.to_openai_function()["function"]["name"], "canonicalize_problem");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
	/// Unique name used for lookup and by the model when calling.
	pub name: String,
	/// Human-readable description for LLM consumption.
	pub description: String,
	/// JSON Schema of the accepted arguments.
	pub parameters: Value,
}

impl ToolDefinition {
	/// Create a definition.
	pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
		Self {
			name: name.into(),
			description: description.into(),
			parameters,
		}
	}

	/// OpenAI function-calling schema for this tool.
	pub fn to_openai_function(&self) -> Value {
		json!({
			"type": "function",
			"function": {
				"name": self.name,
				"description": self.description,
				"parameters": self.parameters,
			}
		})
	}
}

/// A callable capability a Task may be bound to.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
	/// Definition advertised to the model.
	fn definition(&self) -> &ToolDefinition;

	/// Run the tool with already-decoded JSON arguments.
	async fn call(&self, arguments: Value) -> Result<Value, ToolError>;

	/// Tool name, shorthand for `definition().name`.
	fn name(&self) -> &str {
		&self.definition().name
	}
}

type ToolFn = dyn Fn(&Value) -> Result<Value, ToolError> + Send + Sync;

/// Adapts a synchronous, side-effect free function into a [`Tool`].
///
/// # Example
///
/// ```
/// use lrk::tools::{FnTool, Tool, ToolDefinition};
/// use serde_json::json;
///
/// let echo = FnTool::new(
///     ToolDefinition::new("echo", "Echo arguments", json!({"type": "object"})),
///     |args| Ok(args.clone()),
/// );
/// assert_eq!(echo.name(), "echo");
/// ```
pub struct FnTool {
	definition: ToolDefinition,
	func: Box<ToolFn>,
}

impl FnTool {
	/// Wrap `func` under `definition`.
	pub fn new<F>(definition: ToolDefinition, func: F) -> Self
	where
		F: Fn(&Value) -> Result<Value, ToolError> + Send + Sync + 'static,
	{
		Self {
			definition,
			func: Box::new(func),
		}
	}
}

impl fmt::Debug for FnTool {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnTool")
			.field("definition", &self.definition)
			.finish_non_exhaustive()
	}
}

#[async_trait::async_trait]
impl Tool for FnTool {
	fn definition(&self) -> &ToolDefinition {
		&self.definition
	}

	async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
		(self.func)(&arguments)
	}
}

/// Named collection of tools.
///
/// Cloning is cheap; tools are shared behind `Arc`.
#[derive(Clone, Default)]
pub struct ToolRegistry {
	tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a tool. Fails if the name is already taken.
	pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
		let name = tool.name().to_string();
		if self.tools.contains_key(&name) {
			return Err(ToolError::duplicate_name(name));
		}
		self.tools.insert(name, tool);
		Ok(())
	}

	/// Look up a tool by name.
	pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
		self.tools.get(name).cloned()
	}

	/// Check if a tool exists.
	pub fn contains(&self, name: &str) -> bool {
		self.tools.contains_key(name)
	}

	/// Registered names, sorted.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
		names.sort_unstable();
		names
	}

	/// Number of registered tools.
	pub fn len(&self) -> usize {
		self.tools.len()
	}

	/// Check if the registry is empty.
	pub fn is_empty(&self) -> bool {
		self.tools.is_empty()
	}

	/// A registry holding only `names`. Every name must exist.
	pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<ToolRegistry, ToolError> {
		let mut subset = ToolRegistry::new();
		for name in names {
			let name = name.as_ref();
			let tool = self.get(name).ok_or_else(|| ToolError::not_found(name))?;
			subset.tools.insert(name.to_string(), tool);
		}
		Ok(subset)
	}

	/// OpenAI function schemas for `names`, in the order given.
	pub fn openai_tools<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Value>, ToolError> {
		names
			.iter()
			.map(|name| {
				let name = name.as_ref();
				self.tools
					.get(name)
					.map(|tool| tool.definition().to_openai_function())
					.ok_or_else(|| ToolError::not_found(name))
			})
			.collect()
	}
}

impl fmt::Debug for ToolRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ToolRegistry")
			.field("tools", &self.names())
			.finish()
	}
}

/// Required string argument `field` of tool `tool`.
pub(crate) fn required_str<'a>(tool: &str, args: &'a Value, field: &str) -> Result<&'a str, ToolError> {
	args.get(field)
		.and_then(Value::as_str)
		.ok_or_else(|| ToolError::invalid_arguments(tool, format!("`{}` must be a string", field)))
}

/// Required array argument `field` of tool `tool`.
pub(crate) fn required_array<'a>(
	tool: &str,
	args: &'a Value,
	field: &str,
) -> Result<&'a Vec<Value>, ToolError> {
	args.get(field)
		.and_then(Value::as_array)
		.ok_or_else(|| ToolError::invalid_arguments(tool, format!("`{}` must be an array", field)))
}

/// Required numeric argument `field` of tool `tool`.
pub(crate) fn required_f64(tool: &str, args: &Value, field: &str) -> Result<f64, ToolError> {
	args.get(field)
		.and_then(Value::as_f64)
		.ok_or_else(|| ToolError::invalid_arguments(tool, format!("`{}` must be a number", field)))
}
