//! End-to-end test of the research workflow with a scripted provider
//!
//! The search tools are replaced by canned registry entries so the run never
//! touches the network; every other tool is the real implementation.

use anyhow::Result;
use async_trait::async_trait;
use lrk::orchestration::{
    keys, report_filename, research_pipeline, ExecutionMode, MalformedOutputPolicy, PipelineRuntime,
    ResearchReport, RuntimeSettings,
};
use lrk::provider::{GenerateConfig, GenerateResponse, LlmProvider, Message, MessageRole, ToolInvocation};
use lrk::tools::search::{ARXIV_SEARCH, WEB_SEARCH};
use lrk::tools::{citation, code, forensics, ontology, FnTool, ToolDefinition, ToolRegistry};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Calls every bound tool once, then answers. Structured prompts get JSON,
/// except the failure analyst, which answers in prose.
struct ResearchProvider {
    requests: Mutex<Vec<String>>,
}

impl ResearchProvider {
    fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }
}

fn canned_arguments(tool: &str) -> Value {
    match tool {
        "fetch_citation_metadata" => json!({"paper_id": "current_paper"}),
        "detect_temporal_anomaly" => json!({
            "paper_date": "2023-10-01",
            "citations": [
                {"title": "From the future", "paper_id": "cit_x", "publication_date": "2024-01-15"},
                {"title": "From the past", "paper_id": "cit_y", "publication_date": "2020-05-01"}
            ]
        }),
        "check_benfords_law" => json!({"numbers": [12, 150, 1800, 23, 310, 19, 1100, 42, 17, 260]}),
        "check_p_value_consistency" => json!({"stat": 2.1, "p_value": 0.036}),
        "extract_code_blocks" => json!({"text": "Setup:\n```python\nimport torch\n```"}),
        "validate_python_env" => json!({"dependencies": ["numpy", "pandas", "scikit-learn"]}),
        "canonicalize_problem" => json!({"problem_description": "protein folding energy landscape"}),
        _ => json!({"query": "agents for scientific discovery"}),
    }
}

#[async_trait]
impl LlmProvider for ResearchProvider {
    async fn generate(&self, messages: &[Message], config: &GenerateConfig) -> Result<GenerateResponse> {
        let prompt = messages[0].content.clone();
        self.requests.lock().unwrap().push(prompt.clone());

        let answered_tools = messages.iter().any(|m| m.role == MessageRole::Tool);
        let bound: Vec<&str> = config
            .tools
            .iter()
            .filter_map(|t| t.pointer("/function/name").and_then(Value::as_str))
            .collect();

        if !bound.is_empty() && !answered_tools {
            let calls = bound
                .iter()
                .enumerate()
                .map(|(i, name)| ToolInvocation::new(format!("call_{}", i), *name, canned_arguments(name)))
                .collect();
            return Ok(GenerateResponse::ToolCalls(calls));
        }

        let heading = prompt.lines().next().unwrap_or_default().to_string();
        if prompt.contains("failure analyst") {
            return Ok(GenerateResponse::Content("No dead ends were found.".to_string()));
        }
        if prompt.contains("Return only a JSON object") {
            let tool_results: Vec<&str> = messages
                .iter()
                .filter(|m| m.role == MessageRole::Tool)
                .map(|m| m.content.as_str())
                .collect();
            let body = json!({"role": heading, "tool_results": tool_results});
            return Ok(GenerateResponse::Content(format!("```json\n{}\n```", body)));
        }
        Ok(GenerateResponse::Content(format!("[{}]", heading)))
    }

    fn provider_name(&self) -> &str {
        "research-script"
    }

    fn default_model(&self) -> String {
        "research-model".to_string()
    }
}

fn offline_tools() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(citation::fetch_citation_metadata_tool())).unwrap();
    tools.register(Arc::new(citation::detect_temporal_anomaly_tool())).unwrap();
    tools.register(Arc::new(forensics::check_benfords_law_tool())).unwrap();
    tools.register(Arc::new(forensics::check_p_value_consistency_tool())).unwrap();
    tools.register(Arc::new(code::extract_code_blocks_tool())).unwrap();
    tools.register(Arc::new(code::validate_python_env_tool())).unwrap();
    tools.register(Arc::new(ontology::canonicalize_problem_tool())).unwrap();
    for name in [ARXIV_SEARCH, WEB_SEARCH] {
        tools
            .register(Arc::new(FnTool::new(
                ToolDefinition::new(name, "Canned search", json!({"type": "object"})),
                |args| Ok(json!([{"title": format!("Result for {}", args["query"].as_str().unwrap_or(""))}])),
            )))
            .unwrap();
    }
    tools
}

fn runtime(provider: Arc<ResearchProvider>, policy: MalformedOutputPolicy) -> PipelineRuntime {
    let settings = RuntimeSettings {
        malformed_output: policy,
        ..RuntimeSettings::default()
    };
    PipelineRuntime::new(provider, offline_tools()).with_settings(settings)
}

#[tokio::test]
async fn test_research_workflow_in_both_modes() {
    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let provider = Arc::new(ResearchProvider::new());
        let pipeline = research_pipeline(mode)
            .build(runtime(provider.clone(), MalformedOutputPolicy::Warn))
            .unwrap();
        let report = pipeline.run("Agents for Scientific Discovery").await.unwrap();

        assert_eq!(report.stages.len(), 9);
        for key in [
            keys::TOPIC,
            keys::QUERIES,
            keys::ARXIV_RESULTS,
            keys::WEB_RESULTS,
            keys::CITATION_AUDIT,
            keys::FRAUD_ANALYSIS,
            keys::REPRODUCIBILITY_REPORT,
            keys::KNOWLEDGE_GRAPH,
            keys::GAPS,
            keys::INNOVATION_BRIDGE,
            keys::NEGATIVE_RESULTS,
            keys::HYPOTHESES,
            keys::DRAFT,
            keys::FINAL_REPORT,
        ] {
            assert!(report.get(key).is_some(), "{:?} run is missing `{}`", mode, key);
        }

        // Nine tool bindings, each called once.
        assert_eq!(report.tool_call_count(), 9);

        // Structured outputs are stored as JSON values.
        let audit = report.get(keys::CITATION_AUDIT).unwrap();
        assert!(audit.is_object());
        let audit_results = audit["tool_results"].as_array().unwrap();
        assert_eq!(audit_results.len(), 2);
        assert!(audit_results[1].as_str().unwrap().contains("cit_x"));
        assert!(!audit_results[1].as_str().unwrap().contains("cit_y"));

        // The prose answer to a JSON prompt is kept as text under Warn.
        assert_eq!(report.degraded_outputs(), vec![keys::NEGATIVE_RESULTS]);
        assert_eq!(
            report.get(keys::NEGATIVE_RESULTS),
            Some(&json!("No dead ends were found."))
        );

        // The topic flows into the first prompt and upstream outputs into later ones.
        let requests = provider.requests.lock().unwrap();
        assert!(requests
            .iter()
            .any(|p| p.contains("Research topic: Agents for Scientific Discovery")));
        assert!(requests
            .iter()
            .any(|p| p.starts_with("You are a scientific writer.") && p.contains("[You are a creative scientist.]")));
    }
}

#[tokio::test]
async fn test_fail_policy_stops_at_malformed_json() {
    let provider = Arc::new(ResearchProvider::new());
    let pipeline = research_pipeline(ExecutionMode::Parallel)
        .build(runtime(provider, MalformedOutputPolicy::Fail))
        .unwrap();

    let err = pipeline.run("Agents for Scientific Discovery").await.unwrap_err();
    assert_eq!(err.stage_name(), Some("innovation_stage"));
    let failed: Vec<&str> = err.task_errors().iter().filter_map(|e| e.task_name()).collect();
    assert_eq!(failed, vec!["negative_results_analyst"]);
}

#[tokio::test]
async fn test_report_is_written_from_final_state() {
    let provider = Arc::new(ResearchProvider::new());
    let report = research_pipeline(ExecutionMode::Parallel)
        .build(runtime(provider, MalformedOutputPolicy::Warn))
        .unwrap()
        .run("Graph Neural Networks")
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let research = ResearchReport::from_state(&report.state).unwrap();
    let path = research.write_to(dir.path()).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        report_filename("Graph Neural Networks")
    );

    let markdown = std::fs::read_to_string(&path).unwrap();
    assert!(markdown.starts_with("# Research Topic: Graph Neural Networks\n\n[You are a scientific writer.]"));
    assert!(markdown.contains("## Hypotheses\n[You are a creative scientist.]"));
    assert!(markdown.contains("## Identified Gaps\n[You are a senior researcher.]"));
    assert!(markdown.contains("## Evaluation\n[You are a research review board.]"));
}
