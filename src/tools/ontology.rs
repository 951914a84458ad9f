//! Cross-domain problem canonicalization.

use serde_json::json;

use crate::tools::registry::required_str;
use crate::tools::{FnTool, ToolDefinition};

pub const CANONICALIZE_PROBLEM: &str = "canonicalize_problem";

/// Domain phrase to abstract problem class. First match wins.
const CANONICAL_FORMS: &[(&str, &str)] = &[
	("protein folding", "3D structural optimization in continuous space"),
	("traffic flow", "Fluid dynamics optimization on a graph"),
	("market prediction", "Time-series forecasting with non-stationary distributions"),
	("gene editing", "Sequence pattern matching and substitution"),
	("climate modeling", "Partial differential equation solving on a sphere"),
];

/// Map domain jargon in `description` onto an abstract problem statement.
pub fn canonicalize_problem(description: &str) -> String {
	let lower = description.to_lowercase();
	CANONICAL_FORMS
		.iter()
		.find(|(phrase, _)| lower.contains(phrase))
		.map(|(_, canonical)| canonical.to_string())
		.unwrap_or_else(|| format!("Abstract optimization problem based on: {}", description))
}

pub fn canonicalize_problem_tool() -> FnTool {
	FnTool::new(
		ToolDefinition::new(
			CANONICALIZE_PROBLEM,
			"Convert domain-specific jargon into an abstract mathematical problem statement.",
			json!({
				"type": "object",
				"properties": {"problem_description": {"type": "string"}},
				"required": ["problem_description"]
			}),
		),
		|args| {
			let description = required_str(CANONICALIZE_PROBLEM, args, "problem_description")?;
			Ok(json!(canonicalize_problem(description)))
		},
	)
}
