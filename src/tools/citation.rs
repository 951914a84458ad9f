//! Citation metadata lookup and temporal anomaly detection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::tools::registry::{required_array, required_str};
use crate::tools::{FnTool, ToolDefinition, ToolError};

pub const FETCH_CITATION_METADATA: &str = "fetch_citation_metadata";
pub const DETECT_TEMPORAL_ANOMALY: &str = "detect_temporal_anomaly";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One cited work.
///
/// Only `publication_date` matters to the anomaly check; every other field a
/// caller sends is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub title: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub paper_id: String,
	/// `YYYY-MM-DD`, may be absent for undated references
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub publication_date: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Citation {
	fn dated(title: &str, paper_id: &str, date: &str) -> Self {
		Self {
			title: title.to_string(),
			paper_id: paper_id.to_string(),
			publication_date: Some(date.to_string()),
			extra: Map::new(),
		}
	}
}

/// Citation list of `paper_id`.
///
/// Backed by a fixed catalogue; two entries post-date 2023 on purpose so the
/// auditor has something to find.
pub fn fetch_citation_metadata(_paper_id: &str) -> Vec<Citation> {
	vec![
		Citation::dated("Foundations of Multi-Agent Systems", "cit_001", "2022-01-15"),
		Citation::dated("Advanced Graph Neural Networks", "cit_002", "2023-05-20"),
		Citation::dated("Future of AI: 2025 Outlook", "cit_003", "2025-11-10"),
		Citation::dated("Quantum Computing in 2024", "cit_004", "2024-02-28"),
		Citation::dated("Legacy Algorithms", "cit_005", "2020-08-01"),
	]
}

/// Citations published strictly after `paper_date`.
///
/// Undated citations are skipped. Any unparsable date is an error.
pub fn detect_temporal_anomaly(paper_date: &str, citations: &[Citation]) -> Result<Vec<Citation>, ToolError> {
	let paper_date = parse_date(paper_date)?;

	let mut anomalies = Vec::new();
	for citation in citations {
		let Some(date) = citation.publication_date.as_deref() else {
			continue;
		};
		if parse_date(date)? > paper_date {
			anomalies.push(citation.clone());
		}
	}
	Ok(anomalies)
}

fn parse_date(value: &str) -> Result<NaiveDate, ToolError> {
	NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
		ToolError::invalid_arguments(
			DETECT_TEMPORAL_ANOMALY,
			format!("cannot parse date `{}` as YYYY-MM-DD: {}", value, e),
		)
	})
}

pub fn fetch_citation_metadata_tool() -> FnTool {
	FnTool::new(
		ToolDefinition::new(
			FETCH_CITATION_METADATA,
			"Fetch the citation list of a paper, including each citation's publication date.",
			json!({
				"type": "object",
				"properties": {
					"paper_id": {"type": "string", "description": "Identifier of the citing paper"}
				},
				"required": ["paper_id"]
			}),
		),
		|args| {
			let paper_id = required_str(FETCH_CITATION_METADATA, args, "paper_id")?;
			to_value(FETCH_CITATION_METADATA, &fetch_citation_metadata(paper_id))
		},
	)
}

pub fn detect_temporal_anomaly_tool() -> FnTool {
	FnTool::new(
		ToolDefinition::new(
			DETECT_TEMPORAL_ANOMALY,
			"Detect citations that were published after the citing paper (YYYY-MM-DD dates).",
			json!({
				"type": "object",
				"properties": {
					"paper_date": {"type": "string", "description": "Publication date of the citing paper"},
					"citations": {
						"type": "array",
						"items": {
							"type": "object",
							"properties": {
								"title": {"type": "string"},
								"paper_id": {"type": "string"},
								"publication_date": {"type": "string"}
							}
						}
					}
				},
				"required": ["paper_date", "citations"]
			}),
		),
		|args| {
			let paper_date = required_str(DETECT_TEMPORAL_ANOMALY, args, "paper_date")?;
			let citations: Vec<Citation> =
				serde_json::from_value(Value::Array(required_array(DETECT_TEMPORAL_ANOMALY, args, "citations")?.clone()))
					.map_err(|e| ToolError::invalid_arguments(DETECT_TEMPORAL_ANOMALY, e.to_string()))?;
			to_value(DETECT_TEMPORAL_ANOMALY, &detect_temporal_anomaly(paper_date, &citations)?)
		},
	)
}

fn to_value<T: Serialize>(tool: &str, value: &T) -> Result<Value, ToolError> {
	serde_json::to_value(value).map_err(|e| ToolError::execution_failed(tool, e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tools::Tool;

	#[test]
	fn test_catalogue_anomalies_for_2023_paper() {
		let citations = fetch_citation_metadata("current_paper");
		assert_eq!(citations.len(), 5);

		let anomalies = detect_temporal_anomaly("2023-10-01", &citations).unwrap();
		let ids: Vec<&str> = anomalies.iter().map(|c| c.paper_id.as_str()).collect();
		assert_eq!(ids, vec!["cit_003", "cit_004"]);
	}

	#[test]
	fn test_single_future_citation() {
		let citations = vec![
			Citation::dated("Old", "a", "2021-03-03"),
			Citation::dated("Future", "b", "2024-01-01"),
		];
		let anomalies = detect_temporal_anomaly("2023-06-30", &citations).unwrap();
		assert_eq!(anomalies.len(), 1);
		assert_eq!(anomalies[0].title, "Future");
	}

	#[test]
	fn test_same_day_is_not_anomalous_and_undated_is_skipped() {
		let citations = vec![
			Citation::dated("Same day", "a", "2023-10-01"),
			Citation {
				title: "Undated".to_string(),
				paper_id: "b".to_string(),
				publication_date: None,
				..Citation::default()
			},
		];
		assert!(detect_temporal_anomaly("2023-10-01", &citations).unwrap().is_empty());
	}

	#[test]
	fn test_invalid_dates_are_errors() {
		assert!(detect_temporal_anomaly("10/01/2023", &[]).is_err());
		let citations = vec![Citation::dated("Bad", "a", "2023-13-45")];
		assert!(matches!(
			detect_temporal_anomaly("2023-10-01", &citations),
			Err(ToolError::InvalidArguments { .. })
		));
	}

	#[tokio::test]
	async fn test_tools_round_trip_through_json() {
		let fetched = fetch_citation_metadata_tool()
			.call(json!({"paper_id": "current_paper"}))
			.await
			.unwrap();
		let anomalies = detect_temporal_anomaly_tool()
			.call(json!({"paper_date": "2023-10-01", "citations": fetched}))
			.await
			.unwrap();
		assert_eq!(anomalies.as_array().unwrap().len(), 2);
		assert_eq!(anomalies[0]["publication_date"], "2025-11-10");
	}

	#[tokio::test]
	async fn test_citations_with_only_a_date_are_accepted() {
		let anomalies = detect_temporal_anomaly_tool()
			.call(json!({
				"paper_date": "2023-10-01",
				"citations": [
					{"publication_date": "2022-01-15"},
					{"publication_date": "2025-11-10"}
				]
			}))
			.await
			.unwrap();
		assert_eq!(anomalies, json!([{"publication_date": "2025-11-10"}]));
	}

	#[tokio::test]
	async fn test_unknown_citation_fields_are_returned_verbatim() {
		let anomalies = detect_temporal_anomaly_tool()
			.call(json!({
				"paper_date": "2023-10-01",
				"citations": [
					{"doi": "10.1000/old", "publication_date": "2021-01-01"},
					{"doi": "10.1000/new", "authors": ["Ng", "Li"], "publication_date": "2024-02-28"}
				]
			}))
			.await
			.unwrap();
		assert_eq!(
			anomalies,
			json!([{"doi": "10.1000/new", "authors": ["Ng", "Li"], "publication_date": "2024-02-28"}])
		);
	}
}
