//! Literature and web search tools.
//!
//! Both tools talk to public HTTP APIs; the response parsing is kept in pure
//! functions so it can be tested without the network.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::tools::registry::required_str;
use crate::tools::{Tool, ToolDefinition, ToolError};

pub const ARXIV_SEARCH: &str = "arxiv_search";
pub const WEB_SEARCH: &str = "web_search";

/// Endpoints and limits shared by the search tools.
#[derive(Debug, Clone)]
pub struct SearchSettings {
	pub max_results: u32,
	pub arxiv_url: String,
	pub web_url: String,
	/// Characters kept from each abstract
	pub doc_chars_max: usize,
	pub timeout_seconds: u64,
}

impl Default for SearchSettings {
	fn default() -> Self {
		Self {
			max_results: 5,
			arxiv_url: "https://export.arxiv.org/api/query".to_string(),
			web_url: "https://api.duckduckgo.com/".to_string(),
			doc_chars_max: 2000,
			timeout_seconds: 30,
		}
	}
}

#[cfg(feature = "config")]
impl SearchSettings {
	/// Settings from the `[search]` section plus the run-wide request timeout.
	pub fn from_config(search: &crate::config::SearchConfig, timeout_seconds: u64) -> Self {
		Self {
			max_results: search.max_results,
			arxiv_url: search.arxiv_url.clone(),
			web_url: search.web_url.clone(),
			doc_chars_max: search.doc_chars_max,
			timeout_seconds,
		}
	}
}

fn http_client(tool: &str, timeout_seconds: u64) -> Result<reqwest::Client, ToolError> {
	reqwest::Client::builder()
		.timeout(Duration::from_secs(timeout_seconds))
		.user_agent(concat!("lrk/", env!("CARGO_PKG_VERSION")))
		.build()
		.map_err(|e| ToolError::execution_failed(tool, format!("cannot build HTTP client: {}", e)))
}

async fn fetch_text(tool: &str, request: reqwest::RequestBuilder) -> Result<String, ToolError> {
	let response = request
		.send()
		.await
		.map_err(|e| ToolError::execution_failed(tool, e.to_string()))?;
	let status = response.status();
	if !status.is_success() {
		return Err(ToolError::execution_failed(tool, format!("HTTP {}", status)));
	}
	response
		.text()
		.await
		.map_err(|e| ToolError::execution_failed(tool, e.to_string()))
}

fn query_schema(description: &str) -> Value {
	json!({
		"type": "object",
		"properties": {
			"query": {"type": "string", "description": description}
		},
		"required": ["query"]
	})
}

/// One arXiv paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
	pub title: String,
	pub authors: Vec<String>,
	/// `YYYY-MM-DD`
	pub published: String,
	pub summary: String,
	pub url: String,
}

fn entry_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| Regex::new(r"(?s)<entry>(.*?)</entry>").expect("static regex"))
}

fn author_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").expect("static regex"))
}

fn element_text(entry: &str, tag: &str) -> Option<String> {
	let open = format!("<{}", tag);
	let close = format!("</{}>", tag);
	let start = entry.find(&open)?;
	let body_start = start + entry[start..].find('>')? + 1;
	let body_end = body_start + entry[body_start..].find(&close)?;
	Some(collapse_whitespace(&unescape_xml(&entry[body_start..body_end])))
}

fn unescape_xml(text: &str) -> String {
	text.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&apos;", "'")
		.replace("&#39;", "'")
		.replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
	if text.chars().count() <= max {
		text.to_string()
	} else {
		text.chars().take(max).collect()
	}
}

/// Parse an arXiv Atom feed into at most `max_results` papers.
pub fn parse_arxiv_feed(feed: &str, max_results: usize, doc_chars_max: usize) -> Vec<Paper> {
	entry_pattern()
		.captures_iter(feed)
		.filter_map(|caps| caps.get(1))
		.map(|m| m.as_str())
		.take(max_results)
		.map(|entry| Paper {
			title: element_text(entry, "title").unwrap_or_default(),
			authors: author_pattern()
				.captures_iter(entry)
				.filter_map(|caps| caps.get(1))
				.map(|m| collapse_whitespace(&unescape_xml(m.as_str())))
				.collect(),
			published: element_text(entry, "published")
				.map(|p| p.chars().take(10).collect())
				.unwrap_or_default(),
			summary: truncate_chars(&element_text(entry, "summary").unwrap_or_default(), doc_chars_max),
			url: element_text(entry, "id").unwrap_or_default(),
		})
		.collect()
}

/// Searches arXiv through its public Atom API.
pub struct ArxivSearchTool {
	definition: ToolDefinition,
	client: reqwest::Client,
	settings: SearchSettings,
}

impl ArxivSearchTool {
	pub fn new(settings: &SearchSettings) -> Result<Self, ToolError> {
		Ok(Self {
			definition: ToolDefinition::new(
				ARXIV_SEARCH,
				"Search arXiv for scientific papers. Returns titles, authors, dates and abstracts.",
				query_schema("arXiv search query"),
			),
			client: http_client(ARXIV_SEARCH, settings.timeout_seconds)?,
			settings: settings.clone(),
		})
	}
}

#[async_trait::async_trait]
impl Tool for ArxivSearchTool {
	fn definition(&self) -> &ToolDefinition {
		&self.definition
	}

	async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
		let query = required_str(ARXIV_SEARCH, &arguments, "query")?;
		let url = format!(
			"{}?search_query=all:{}&start=0&max_results={}",
			self.settings.arxiv_url,
			urlencoding::encode(query),
			self.settings.max_results
		);

		let feed = fetch_text(ARXIV_SEARCH, self.client.get(&url)).await?;
		let papers = parse_arxiv_feed(
			&feed,
			self.settings.max_results as usize,
			self.settings.doc_chars_max,
		);
		serde_json::to_value(papers).map_err(|e| ToolError::execution_failed(ARXIV_SEARCH, e.to_string()))
	}
}

/// One web search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebHit {
	pub title: String,
	pub snippet: String,
	pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
	#[serde(default)]
	heading: String,
	#[serde(default)]
	abstract_text: String,
	#[serde(default, rename = "AbstractURL")]
	abstract_url: String,
	#[serde(default)]
	results: Vec<RelatedTopic>,
	#[serde(default)]
	related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
	Hit {
		#[serde(rename = "Text")]
		text: String,
		#[serde(rename = "FirstURL", default)]
		first_url: String,
	},
	Group {
		#[serde(rename = "Topics")]
		topics: Vec<RelatedTopic>,
	},
}

fn flatten_topics(topics: &[RelatedTopic], hits: &mut Vec<WebHit>) {
	for topic in topics {
		match topic {
			RelatedTopic::Hit { text, first_url } => {
				let title = text.split(" - ").next().unwrap_or(text.as_str()).to_string();
				hits.push(WebHit {
					title,
					snippet: text.clone(),
					url: first_url.clone(),
				});
			}
			RelatedTopic::Group { topics } => flatten_topics(topics, hits),
		}
	}
}

/// Parse a DuckDuckGo instant-answer response into at most `max_results` hits.
pub fn parse_instant_answer(body: &str, max_results: usize) -> Result<Vec<WebHit>, ToolError> {
	let answer: InstantAnswer = serde_json::from_str(body)
		.map_err(|e| ToolError::execution_failed(WEB_SEARCH, format!("unexpected response: {}", e)))?;

	let mut hits = Vec::new();
	if !answer.abstract_text.is_empty() {
		hits.push(WebHit {
			title: answer.heading.clone(),
			snippet: answer.abstract_text.clone(),
			url: answer.abstract_url.clone(),
		});
	}
	flatten_topics(&answer.results, &mut hits);
	flatten_topics(&answer.related_topics, &mut hits);
	hits.retain(|hit| !hit.snippet.is_empty());
	hits.truncate(max_results);
	Ok(hits)
}

/// General web search through the DuckDuckGo instant-answer API.
pub struct WebSearchTool {
	definition: ToolDefinition,
	client: reqwest::Client,
	settings: SearchSettings,
}

impl WebSearchTool {
	pub fn new(settings: &SearchSettings) -> Result<Self, ToolError> {
		Ok(Self {
			definition: ToolDefinition::new(
				WEB_SEARCH,
				"Search the web for general scientific information, blog posts and recent developments.",
				query_schema("Web search query"),
			),
			client: http_client(WEB_SEARCH, settings.timeout_seconds)?,
			settings: settings.clone(),
		})
	}
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
	fn definition(&self) -> &ToolDefinition {
		&self.definition
	}

	async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
		let query = required_str(WEB_SEARCH, &arguments, "query")?;
		let request = self.client.get(&self.settings.web_url).query(&[
			("q", query),
			("format", "json"),
			("no_html", "1"),
			("skip_disambig", "1"),
		]);

		let body = fetch_text(WEB_SEARCH, request).await?;
		let hits = parse_instant_answer(&body, self.settings.max_results as usize)?;
		serde_json::to_value(hits).map_err(|e| ToolError::execution_failed(WEB_SEARCH, e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:agents</title>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <published>2024-01-02T10:00:00Z</published>
    <title>Agents for
      Scientific Discovery</title>
    <summary>  We study LLM agents &amp; tools
      for science.</summary>
    <author><name>Ada Lovelace</name></author>
    <author>
      <name>Alan Turing</name>
    </author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2402.00002v2</id>
    <published>2024-02-03T10:00:00Z</published>
    <title>Second Paper</title>
    <summary>Short.</summary>
    <author><name>Grace Hopper</name></author>
  </entry>
</feed>"#;

	#[test]
	fn test_parse_arxiv_feed() {
		let papers = parse_arxiv_feed(FEED, 5, 2000);
		assert_eq!(papers.len(), 2);
		assert_eq!(papers[0].title, "Agents for Scientific Discovery");
		assert_eq!(papers[0].summary, "We study LLM agents & tools for science.");
		assert_eq!(papers[0].authors, vec!["Ada Lovelace", "Alan Turing"]);
		assert_eq!(papers[0].published, "2024-01-02");
		assert_eq!(papers[0].url, "http://arxiv.org/abs/2401.00001v1");
	}

	#[test]
	fn test_parse_arxiv_feed_limits() {
		let papers = parse_arxiv_feed(FEED, 1, 6);
		assert_eq!(papers.len(), 1);
		assert_eq!(papers[0].summary, "We stu");
		assert!(parse_arxiv_feed("<feed></feed>", 5, 100).is_empty());
	}

	#[test]
	fn test_parse_instant_answer() {
		let body = r#"{
			"Heading": "Multi-agent system",
			"AbstractText": "A multi-agent system is a computerized system...",
			"AbstractURL": "https://en.wikipedia.org/wiki/Multi-agent_system",
			"Results": [],
			"RelatedTopics": [
				{"Text": "Agent-based model - A class of computational models", "FirstURL": "https://duckduckgo.com/Agent-based_model"},
				{"Name": "See also", "Topics": [
					{"Text": "Swarm intelligence - Collective behavior", "FirstURL": "https://duckduckgo.com/Swarm_intelligence"}
				]}
			]
		}"#;
		let hits = parse_instant_answer(body, 5).unwrap();
		assert_eq!(hits.len(), 3);
		assert_eq!(hits[0].title, "Multi-agent system");
		assert_eq!(hits[1].title, "Agent-based model");
		assert_eq!(hits[2].url, "https://duckduckgo.com/Swarm_intelligence");

		assert_eq!(parse_instant_answer(body, 2).unwrap().len(), 2);
	}

	#[test]
	fn test_parse_instant_answer_empty_and_invalid() {
		assert!(parse_instant_answer(r#"{"AbstractText": "", "RelatedTopics": []}"#, 5)
			.unwrap()
			.is_empty());
		assert!(parse_instant_answer("<html>", 5).is_err());
	}

	#[test]
	fn test_search_tool_definitions() {
		let settings = SearchSettings::default();
		let arxiv = ArxivSearchTool::new(&settings).unwrap();
		let web = WebSearchTool::new(&settings).unwrap();
		assert_eq!(arxiv.name(), ARXIV_SEARCH);
		assert_eq!(web.definition().parameters["required"][0], "query");
	}
}
