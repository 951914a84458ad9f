//! Markdown report assembled from a finished research run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::orchestration::research::keys;
use crate::orchestration::state::StateMap;
use crate::orchestration::template::stringify;

/// Sections of the saved research report
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchReport {
    pub topic: String,
    pub draft: String,
    pub hypotheses: String,
    pub gaps: String,
    pub evaluation: Option<String>,
}

impl ResearchReport {
    /// Pull the report sections out of a final state.
    ///
    /// Fails when the state holds no `draft`; the error lists the keys that are present.
    pub fn from_state(state: &StateMap) -> Result<Self> {
        let Some(draft) = state.get(keys::DRAFT) else {
            let mut available: Vec<&str> = state.keys().map(String::as_str).collect();
            available.sort_unstable();
            anyhow::bail!(
                "No draft found in state. State keys: [{}]",
                available.join(", ")
            );
        };

        let text = |key: &str| state.get(key).map(stringify).unwrap_or_default();

        Ok(Self {
            topic: text(keys::TOPIC),
            draft: stringify(draft),
            hypotheses: text(keys::HYPOTHESES),
            gaps: text(keys::GAPS),
            evaluation: state
                .get(keys::FINAL_REPORT)
                .map(stringify)
                .filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Research Topic: {}\n\n", self.topic);
        out.push_str(&self.draft);
        out.push_str("\n\n## Hypotheses\n");
        out.push_str(&self.hypotheses);
        out.push_str("\n\n## Identified Gaps\n");
        out.push_str(&self.gaps);
        if let Some(evaluation) = &self.evaluation {
            out.push_str("\n\n## Evaluation\n");
            out.push_str(evaluation);
        }
        out.push('\n');
        out
    }

    /// Write the markdown into `dir` under [`report_filename`], creating `dir` if needed.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let path = dir.join(report_filename(&self.topic));
        std::fs::write(&path, self.to_markdown())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(path)
    }
}

/// `research_output_<topic>.md`, with whitespace and path separators replaced by `_`
pub fn report_filename(topic: &str) -> String {
    let sanitized: String = topic
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || matches!(c, '/' | '\\' | ':') {
                '_'
            } else {
                c
            }
        })
        .collect();
    let sanitized = if sanitized.is_empty() { "untitled".to_string() } else { sanitized };
    format!("research_output_{}.md", sanitized)
}
