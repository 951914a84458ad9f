//! Tools Tasks can be bound to.
//!
//! Pure analysis tools (citations, forensics, code, ontology) are
//! deterministic and side-effect free. The search tools call public HTTP
//! APIs. [`research_tools`] registers the full set.

pub mod citation;
pub mod code;
pub mod error;
pub mod forensics;
pub mod ontology;
pub mod registry;
pub mod search;

use std::sync::Arc;

pub use error::ToolError;
pub use registry::{FnTool, Tool, ToolDefinition, ToolRegistry};
pub use search::{ArxivSearchTool, SearchSettings, WebSearchTool};

/// Registry with every research tool: the seven pure tools plus arXiv and web search.
pub fn research_tools(settings: &SearchSettings) -> Result<ToolRegistry, ToolError> {
	let mut registry = ToolRegistry::new();
	registry.register(Arc::new(citation::fetch_citation_metadata_tool()))?;
	registry.register(Arc::new(citation::detect_temporal_anomaly_tool()))?;
	registry.register(Arc::new(forensics::check_benfords_law_tool()))?;
	registry.register(Arc::new(forensics::check_p_value_consistency_tool()))?;
	registry.register(Arc::new(code::extract_code_blocks_tool()))?;
	registry.register(Arc::new(code::validate_python_env_tool()))?;
	registry.register(Arc::new(ontology::canonicalize_problem_tool()))?;
	registry.register(Arc::new(ArxivSearchTool::new(settings)?))?;
	registry.register(Arc::new(WebSearchTool::new(settings)?))?;
	Ok(registry)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_research_tools_registers_all() {
		let registry = research_tools(&SearchSettings::default()).unwrap();
		assert_eq!(registry.len(), 9);
		for name in [
			citation::FETCH_CITATION_METADATA,
			citation::DETECT_TEMPORAL_ANOMALY,
			forensics::CHECK_BENFORDS_LAW,
			forensics::CHECK_P_VALUE_CONSISTENCY,
			code::EXTRACT_CODE_BLOCKS,
			code::VALIDATE_PYTHON_ENV,
			ontology::CANONICALIZE_PROBLEM,
			search::ARXIV_SEARCH,
			search::WEB_SEARCH,
		] {
			assert!(registry.contains(name), "missing {}", name);
		}
	}
}
