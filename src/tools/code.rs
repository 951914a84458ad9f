//! Code extraction and dependency sanity checks for reproducibility audits.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::tools::registry::{required_array, required_str};
use crate::tools::{FnTool, ToolDefinition, ToolError};

pub const EXTRACT_CODE_BLOCKS: &str = "extract_code_blocks";
pub const VALIDATE_PYTHON_ENV: &str = "validate_python_env";

fn code_block_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| Regex::new(r"(?s)```(?:python)?(.*?)```").expect("static regex"))
}

/// Bodies of fenced code blocks (plain or `python`), trimmed.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
	code_block_pattern()
		.captures_iter(text)
		.filter_map(|caps| caps.get(1))
		.map(|m| m.as_str().trim().to_string())
		.collect()
}

/// Outcome of a dependency check.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvCheck {
	Compatible(String),
	Conflict(String),
}

impl EnvCheck {
	pub fn is_valid(&self) -> bool {
		matches!(self, Self::Compatible(_))
	}

	pub fn to_json(&self) -> Value {
		match self {
			Self::Compatible(message) => json!({"valid": true, "message": message}),
			Self::Conflict(error) => json!({"valid": false, "error": error}),
		}
	}
}

/// Heuristic compatibility check of a dependency list.
pub fn validate_python_env<S: AsRef<str>>(dependencies: &[S]) -> EnvCheck {
	let joined = dependencies
		.iter()
		.map(|d| d.as_ref().to_lowercase())
		.collect::<Vec<_>>()
		.join(" ");

	if joined.contains("tensorflow") && joined.contains("pytorch") {
		return EnvCheck::Conflict("Potential conflict: TensorFlow and PyTorch in same environment.".to_string());
	}
	if joined.contains("numpy") && joined.contains("pandas") {
		return EnvCheck::Compatible("Standard data stack detected.".to_string());
	}
	EnvCheck::Compatible("Dependencies appear compatible.".to_string())
}

pub fn extract_code_blocks_tool() -> FnTool {
	FnTool::new(
		ToolDefinition::new(
			EXTRACT_CODE_BLOCKS,
			"Extract Markdown code blocks (``` or ```python) from text.",
			json!({
				"type": "object",
				"properties": {"text": {"type": "string"}},
				"required": ["text"]
			}),
		),
		|args| {
			let text = required_str(EXTRACT_CODE_BLOCKS, args, "text")?;
			Ok(json!(extract_code_blocks(text)))
		},
	)
}

pub fn validate_python_env_tool() -> FnTool {
	FnTool::new(
		ToolDefinition::new(
			VALIDATE_PYTHON_ENV,
			"Check a list of Python dependencies for known conflicts.",
			json!({
				"type": "object",
				"properties": {
					"dependencies": {"type": "array", "items": {"type": "string"}}
				},
				"required": ["dependencies"]
			}),
		),
		|args| {
			let dependencies = required_array(VALIDATE_PYTHON_ENV, args, "dependencies")?
				.iter()
				.map(|d| {
					d.as_str().map(str::to_string).ok_or_else(|| {
						ToolError::invalid_arguments(VALIDATE_PYTHON_ENV, "dependencies must be strings")
					})
				})
				.collect::<Result<Vec<_>, _>>()?;
			Ok(validate_python_env(&dependencies).to_json())
		},
	)
}
