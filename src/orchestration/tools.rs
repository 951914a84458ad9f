//! Tool invocation records attributed to tasks

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tool call made on behalf of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Task that requested the call
    pub task: String,
    /// Name of the tool that was executed
    pub tool: String,
    /// Provider-assigned call id
    pub call_id: String,
    /// Arguments as decoded JSON
    pub arguments: Value,
    /// Tool output, or the error text on failure
    pub result: String,
    /// Whether tool execution succeeded
    pub success: bool,
}

/// Tool coordinator
///
/// Tracks the tool calls of a single task execution.
#[derive(Debug, Default)]
pub struct ToolCoordinator {
    task: String,
    execution_history: Vec<ToolCallRecord>,
}

impl ToolCoordinator {
    /// Create a coordinator for `task`
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            execution_history: Vec::new(),
        }
    }

    /// Record a tool invocation
    pub fn record(
        &mut self,
        tool: &str,
        call_id: &str,
        arguments: Value,
        result: impl Into<String>,
        success: bool,
    ) -> &ToolCallRecord {
        self.execution_history.push(ToolCallRecord {
            task: self.task.clone(),
            tool: tool.to_string(),
            call_id: call_id.to_string(),
            arguments,
            result: result.into(),
            success,
        });
        &self.execution_history[self.execution_history.len() - 1]
    }

    /// Get total number of tool invocations
    pub fn invocation_count(&self) -> usize {
        self.execution_history.len()
    }

    /// Get execution history
    pub fn execution_history(&self) -> &[ToolCallRecord] {
        &self.execution_history
    }

    /// Get failed executions
    pub fn failed_executions(&self) -> Vec<&ToolCallRecord> {
        self.execution_history.iter().filter(|r| !r.success).collect()
    }

    /// Consume the coordinator, returning its history
    pub fn into_history(self) -> Vec<ToolCallRecord> {
        self.execution_history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_coordinator() {
        let mut coordinator = ToolCoordinator::new("citation_auditor");
        assert_eq!(coordinator.invocation_count(), 0);

        let record = coordinator.record(
            "fetch_citation_metadata",
            "call_1",
            json!({"paper_id": "current_paper"}),
            "[]",
            true,
        );
        assert_eq!(record.task, "citation_auditor");

        coordinator.record("web_search", "call_2", json!({}), "not bound", false);

        assert_eq!(coordinator.invocation_count(), 2);
        assert_eq!(coordinator.failed_executions().len(), 1);
        assert_eq!(coordinator.into_history()[1].tool, "web_search");
    }
}
