//! Instruction templates with `{key}` placeholders.
//!
//! Placeholders name state keys: an identifier (`[A-Za-z_][A-Za-z0-9_.-]*`)
//! between single braces. `{{` and `}}` produce literal braces. Any other
//! brace, such as an inline JSON example, is copied as-is.

use serde_json::Value;
use thiserror::Error;

use crate::orchestration::state::StateView;

/// A placeholder had no value in the state it was rendered against.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing state key `{key}`")]
pub struct MissingKey {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed instruction template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

impl PromptTemplate {
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let chars: Vec<char> = source.chars().collect();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    literal.push('{');
                    i += 2;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    literal.push('}');
                    i += 2;
                }
                '{' => match placeholder_at(&chars, i + 1) {
                    Some((name, end)) => {
                        if !literal.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut literal)));
                        }
                        segments.push(Segment::Placeholder(name));
                        i = end + 1;
                    }
                    None => {
                        literal.push('{');
                        i += 1;
                    }
                },
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { source, segments }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Referenced keys in first-use order, without duplicates.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(key) = segment {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Substitute every placeholder from `view`.
    pub fn render<V: StateView + ?Sized>(&self, view: &V) -> Result<String, MissingKey> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(key) => {
                    let value = view.lookup(key).ok_or_else(|| MissingKey { key: key.clone() })?;
                    out.push_str(&stringify(value));
                }
            }
        }
        Ok(out)
    }
}

/// Identifier starting at `start` and closed by `}`: returns it and the index of the `}`.
fn placeholder_at(chars: &[char], start: usize) -> Option<(String, usize)> {
    let first = *chars.get(start)?;
    if !is_ident_start(first) {
        return None;
    }
    let mut end = start + 1;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    if chars.get(end) != Some(&'}') {
        return None;
    }
    Some((chars[start..end].iter().collect(), end))
}

/// Text form of a state value: strings verbatim, anything else as pretty JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
