//! The nine-stage literature review workflow.
//!
//! Query formulation, literature mining, quality control, knowledge graph
//! extraction, gap analysis, innovation analysis, hypothesis generation,
//! writing and evaluation. Multi-task stages fan out in parallel mode.

use crate::orchestration::pipeline::PipelineBuilder;
use crate::orchestration::task::Task;
use crate::orchestration::workflow::ExecutionMode;
use crate::tools::citation::{DETECT_TEMPORAL_ANOMALY, FETCH_CITATION_METADATA};
use crate::tools::code::{EXTRACT_CODE_BLOCKS, VALIDATE_PYTHON_ENV};
use crate::tools::forensics::{CHECK_BENFORDS_LAW, CHECK_P_VALUE_CONSISTENCY};
use crate::tools::ontology::CANONICALIZE_PROBLEM;
use crate::tools::search::{ARXIV_SEARCH, WEB_SEARCH};

/// State keys written and read by the workflow
pub mod keys {
    pub const TOPIC: &str = crate::orchestration::pipeline::TOPIC_KEY;
    pub const QUERIES: &str = "queries";
    pub const ARXIV_RESULTS: &str = "arxiv_results";
    pub const WEB_RESULTS: &str = "web_results";
    pub const CITATION_AUDIT: &str = "citation_audit";
    pub const FRAUD_ANALYSIS: &str = "fraud_analysis";
    pub const REPRODUCIBILITY_REPORT: &str = "reproducibility_report";
    pub const KNOWLEDGE_GRAPH: &str = "knowledge_graph";
    pub const GAPS: &str = "gaps";
    pub const INNOVATION_BRIDGE: &str = "innovation_bridge";
    pub const NEGATIVE_RESULTS: &str = "negative_results";
    pub const HYPOTHESES: &str = "hypotheses";
    pub const DRAFT: &str = "draft";
    pub const FINAL_REPORT: &str = "final_report";
}

/// Stage names, in run order
pub mod stages {
    pub const QUERY_FORMULATION: &str = "query_formulation";
    pub const LITERATURE_MINING: &str = "literature_mining";
    pub const QUALITY_CONTROL: &str = "quality_control_stage";
    pub const KNOWLEDGE_GRAPH: &str = "knowledge_graph";
    pub const GAP_ANALYSIS: &str = "gap_analysis";
    pub const INNOVATION: &str = "innovation_stage";
    pub const HYPOTHESIS_GENERATION: &str = "hypothesis_generation";
    pub const WRITING: &str = "writing";
    pub const EVALUATION: &str = "evaluation";

    pub const ALL: [&str; 9] = [
        QUERY_FORMULATION,
        LITERATURE_MINING,
        QUALITY_CONTROL,
        KNOWLEDGE_GRAPH,
        GAP_ANALYSIS,
        INNOVATION,
        HYPOTHESIS_GENERATION,
        WRITING,
        EVALUATION,
    ];
}

/// Name of the pipeline built by [`research_pipeline`]
pub const RESEARCH_PIPELINE: &str = "research_workflow";

/// Publication date assumed for the audited paper
pub const AUDIT_PAPER_DATE: &str = "2023-10-01";

/// Paper id handed to the citation tools
pub const AUDIT_PAPER_ID: &str = "current_paper";

const QUERY_FORMULATION_PROMPT: &str = "\
You are a research expert.
Research topic: {topic}

Generate 3 specific, academic search queries for this topic.
Focus on recent reviews, key methodologies and core concepts.
Return the queries as a comma-separated list.";

const ARXIV_MINING_PROMPT: &str = "\
You are a specialist in academic paper mining.
The research queries are: {queries}

For each query, call the `arxiv_search` tool to find relevant papers.
Summarize the key findings, methods and abstracts of the papers you find.
Return a consolidated summary of the arXiv papers.";

const WEB_MINING_PROMPT: &str = "\
You are a specialist in web research.
The research queries are: {queries}

For each query, call the `web_search` tool to find relevant articles, blog posts or accessible explanations.
Return a consolidated summary of the web resources.";

fn citation_audit_prompt() -> String {
    format!(
        "\
You are a citation integrity specialist auditing the literature on {{topic}}.

1. Call `fetch_citation_metadata` with paper_id '{paper_id}'.
2. Call `detect_temporal_anomaly` with paper_date '{paper_date}' and the citations you fetched.
3. Compute a citation integrity score (0-100) from the share of valid citations.

Return only a JSON object with the keys `score` (integer 0-100), \
`flagged_citations` (list of suspicious citations) and `audit_report` (short analysis).",
        paper_id = AUDIT_PAPER_ID,
        paper_date = AUDIT_PAPER_DATE,
    )
}

const FRAUD_DETECTION_PROMPT: &str = "\
You are a forensic data scientist.
Literature under review:
{arxiv_results}

1. Extract numerical data (sample sizes, counts, reported statistics) from the text.
2. Call `check_benfords_law` on the raw numbers to detect fabrication.
3. Call `check_p_value_consistency` wherever a test statistic and its p-value are reported together.
4. Flag suspicious patterns such as p-values clustering just below 0.05.

Return only a JSON object with the keys `FraudRiskScore` (integer 0-100), \
`red_flags` (list of findings) and `forensic_analysis` (detailed report).";

const REPRODUCIBILITY_PROMPT: &str = "\
You are a research engineer reconstructing a runnable environment.
Literature under review:
{arxiv_results}

1. Extract hyperparameters (batch size, learning rate, ...) and library dependencies.
2. Call `validate_python_env` to check dependency compatibility.
3. Call `extract_code_blocks` if code snippets are present.
4. Otherwise reconstruct likely Python code for the core algorithm from the methodology.
5. Assign a reproducibility confidence score (0-100).

Return only a JSON object with the keys `environment_config` (object of hyperparameters and dependencies), \
`pseudo_code` (string) and `confidence_score` (integer 0-100).";

const KNOWLEDGE_GRAPH_PROMPT: &str = "\
You are a knowledge graph specialist.

ArXiv findings:
{arxiv_results}

Web findings:
{web_results}

Extract key concepts, authors and findings.
Return only a JSON object with the keys `entities` (list of strings) \
and `relationships` (list of strings describing connections).";

const GAP_ANALYSIS_PROMPT: &str = "\
You are a senior researcher.

Knowledge graph:
{knowledge_graph}

Literature context:
{arxiv_results}

Identify 3 major research gaps, contradictions or underexplored areas.
Return them as a list.";

const DOMAIN_BRIDGE_PROMPT: &str = "\
You are a lateral innovation expert.
Research topic: {topic}
Known gaps:
{gaps}

1. Canonicalize the core problem with `canonicalize_problem`.
2. Look for solution patterns in unrelated fields (for biology, look at physics or finance).
3. Explain how a foreign solution could transfer to this problem.

Return only a JSON object with the keys `source_domain` (string), \
`target_solutions` (list of strings) and `transfer_feasibility_score` (integer 0-100).";

const NEGATIVE_RESULTS_PROMPT: &str = "\
You are a failure analyst.

ArXiv findings:
{arxiv_results}

Web findings:
{web_results}

Scan for language indicating failure ('failed to converge', 'no significant improvement', \
'contrary to hypothesis'). For each dead end, state the hypothesis that failed and why \
(data issue, theoretical flaw, computational limit, ...).

Return only a JSON object with the key `falsified_hypotheses`: a list of objects \
with the keys `hypothesis`, `reason` and `source`.";

const HYPOTHESIS_PROMPT: &str = "\
You are a creative scientist.

Identified gaps:
{gaps}

Cross-domain insights:
{innovation_bridge}

Known dead ends:
{negative_results}

Propose 3 novel research hypotheses with experimental designs.
Be specific about methodology and avoid the known dead ends.";

const WRITING_PROMPT: &str = "\
You are a scientific writer.
Write a comprehensive literature review section on {topic}, incorporating:

1. Findings from the literature:
{arxiv_results}

2. Identified gaps:
{gaps}

3. Proposed hypotheses:
{hypotheses}

4. Quality control audits:
Citation audit: {citation_audit}
Fraud analysis: {fraud_analysis}
Reproducibility: {reproducibility_report}

5. Innovation insights:
{innovation_bridge}

Cite sources where possible, referring to the findings above. Format in Markdown.";

const EVALUATION_PROMPT: &str = "\
You are a research review board.

Draft:
{draft}

Hypotheses:
{hypotheses}

Rate the work on:
- Novelty (1-10)
- Feasibility (1-10)
- Clarity (1-10)
- Integrity (average of the citation, fraud and reproducibility audits)
- Cross-domain potential

Finish with a brief critique.";

/// Build the research workflow under `mode`.
///
/// Every task binds only the tools it needs; the runtime's registry must hold
/// them (see [`crate::tools::research_tools`]).
pub fn research_pipeline(mode: ExecutionMode) -> PipelineBuilder {
    PipelineBuilder::new(RESEARCH_PIPELINE)
        .mode(mode)
        .stage(
            stages::QUERY_FORMULATION,
            vec![Task::new("query_formulation", QUERY_FORMULATION_PROMPT, keys::QUERIES)],
        )
        .stage(
            stages::LITERATURE_MINING,
            vec![
                Task::new("arxiv_mining", ARXIV_MINING_PROMPT, keys::ARXIV_RESULTS).with_tools([ARXIV_SEARCH]),
                Task::new("web_mining", WEB_MINING_PROMPT, keys::WEB_RESULTS).with_tools([WEB_SEARCH]),
            ],
        )
        .stage(
            stages::QUALITY_CONTROL,
            vec![
                Task::new("citation_auditor", citation_audit_prompt(), keys::CITATION_AUDIT)
                    .with_tools([FETCH_CITATION_METADATA, DETECT_TEMPORAL_ANOMALY])
                    .json(),
                Task::new("fraud_detector", FRAUD_DETECTION_PROMPT, keys::FRAUD_ANALYSIS)
                    .with_tools([CHECK_BENFORDS_LAW, CHECK_P_VALUE_CONSISTENCY])
                    .json(),
                Task::new("reproducibility_auditor", REPRODUCIBILITY_PROMPT, keys::REPRODUCIBILITY_REPORT)
                    .with_tools([EXTRACT_CODE_BLOCKS, VALIDATE_PYTHON_ENV])
                    .json(),
            ],
        )
        .stage(
            stages::KNOWLEDGE_GRAPH,
            vec![Task::new("knowledge_graph", KNOWLEDGE_GRAPH_PROMPT, keys::KNOWLEDGE_GRAPH).json()],
        )
        .stage(
            stages::GAP_ANALYSIS,
            vec![Task::new("gap_analysis", GAP_ANALYSIS_PROMPT, keys::GAPS)],
        )
        .stage(
            stages::INNOVATION,
            vec![
                Task::new("domain_bridge", DOMAIN_BRIDGE_PROMPT, keys::INNOVATION_BRIDGE)
                    .with_tools([CANONICALIZE_PROBLEM])
                    .json(),
                Task::new("negative_results_analyst", NEGATIVE_RESULTS_PROMPT, keys::NEGATIVE_RESULTS).json(),
            ],
        )
        .stage(
            stages::HYPOTHESIS_GENERATION,
            vec![Task::new("hypothesis_generation", HYPOTHESIS_PROMPT, keys::HYPOTHESES)],
        )
        .stage(
            stages::WRITING,
            vec![Task::new("writing", WRITING_PROMPT, keys::DRAFT)],
        )
        .stage(
            stages::EVALUATION,
            vec![Task::new("evaluation", EVALUATION_PROMPT, keys::FINAL_REPORT)],
        )
}
