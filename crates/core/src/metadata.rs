//! Comment metadata extraction.
//!
//! Doc comments carry structured annotations next to prose:
//!
//! ```text
//! Greet creates a Greeting for one or more people.
//! META(featured): true
//! example: ["Mat", "David"]
//! ```
//!
//! [`extract`] splits such a comment into a [`Metadata`] map and the
//! remaining human-readable description. Extraction never fails: lines that
//! look like annotations but cannot be parsed stay in the description and are
//! reported as warnings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const META_PREFIX: &str = "META(";
const EXAMPLE_PREFIX: &str = "example:";

/// Well-known key for example payloads.
pub const EXAMPLE_KEY: &str = "example";

/// Typed value of one annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// `true` or `false`.
    Bool(bool),
    /// An integer or float, kept as written.
    Number(serde_json::Number),
    /// A quoted JSON string, or any text that is not JSON.
    String(String),
    /// A JSON array of strings.
    StringList(Vec<String>),
    /// Any other JSON payload (objects, mixed arrays, null).
    Literal(Value),
}

impl AnnotationValue {
    /// Decode a raw annotation value.
    ///
    /// Tries, in order: boolean, number, quoted string, JSON payload (a list
    /// of strings becomes [`AnnotationValue::StringList`]), and finally keeps
    /// the trimmed text verbatim.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "true" => return AnnotationValue::Bool(true),
            "false" => return AnnotationValue::Bool(false),
            _ => {}
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Number(n)) => AnnotationValue::Number(n),
            Ok(Value::String(s)) => AnnotationValue::String(s),
            Ok(Value::Bool(b)) => AnnotationValue::Bool(b),
            Ok(Value::Array(items)) if items.iter().all(Value::is_string) => {
                AnnotationValue::StringList(
                    items
                        .into_iter()
                        .filter_map(|v| match v {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                )
            }
            Ok(other) => AnnotationValue::Literal(other),
            Err(_) => AnnotationValue::String(raw.to_string()),
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::String(value.to_string())
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Number(value.into())
    }
}

/// Ordered annotation map for one attachment point.
///
/// Keys compare case-insensitively. A key keeps the position and spelling of
/// its first occurrence; its value is the last one written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(IndexMap<String, AnnotationValue>);

impl Metadata {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the value it replaced.
    pub fn insert(&mut self, key: &str, value: AnnotationValue) -> Option<AnnotationValue> {
        match self.position(key) {
            Some(index) => self
                .0
                .get_index_mut(index)
                .map(|(_, slot)| std::mem::replace(slot, value)),
            None => {
                self.0.insert(key.to_string(), value);
                None
            }
        }
    }

    /// Value stored under `key`, ignoring case.
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.position(key)
            .and_then(|index| self.0.get_index(index))
            .map(|(_, value)| value)
    }

    /// True when `key` is present and set to boolean `true`.
    pub fn is_flag_set(&self, key: &str) -> bool {
        self.get(key).and_then(AnnotationValue::as_bool) == Some(true)
    }

    /// Entries in first-seen key order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, AnnotationValue> {
        self.0.iter()
    }

    /// Keys in first-seen order, spelled as first written.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no annotation was found.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.0.keys().position(|k| k.eq_ignore_ascii_case(key))
    }
}

/// A non-fatal problem found while extracting metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationWarning {
    /// 1-based line within the comment.
    pub line: usize,
    /// What was wrong with the line.
    pub message: String,
}

/// Result of [`extract`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedComment {
    /// Prose lines joined by newlines, with leading and trailing blank
    /// lines removed.
    pub description: String,
    /// Annotations in first-seen order.
    pub metadata: Metadata,
    /// Malformed lines and redefined keys.
    pub warnings: Vec<AnnotationWarning>,
}

#[derive(Debug)]
enum CommentLine<'a> {
    Text(&'a str),
    Annotation { key: &'a str, value: &'a str },
    Malformed { text: &'a str, reason: String },
}

/// How a comment marks its lines, decided once per comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentStyle {
    /// `//` or `///` line comments, or text with the markers already removed.
    Line,
    /// A `/* ... */` block whose continuation lines may start with `*`.
    Block,
}

impl CommentStyle {
    fn of(comment: &str) -> Self {
        if comment.trim_start().starts_with("/*") {
            CommentStyle::Block
        } else {
            CommentStyle::Line
        }
    }
}

/// Split a doc comment into metadata and residual description.
pub fn extract(comment: &str) -> ExtractedComment {
    let style = CommentStyle::of(comment);
    let mut extracted = ExtractedComment::default();
    let mut description: Vec<&str> = Vec::new();

    for (index, raw_line) in comment.lines().enumerate() {
        let line_no = index + 1;
        match parse_line(strip_comment_marker(raw_line, style)) {
            CommentLine::Text(text) => description.push(text),
            CommentLine::Annotation { key, value } => {
                let value = AnnotationValue::parse(value);
                if extracted.metadata.insert(key, value).is_some() {
                    extracted.warnings.push(AnnotationWarning {
                        line: line_no,
                        message: format!("metadata key '{key}' redefined, keeping the later value"),
                    });
                }
            }
            CommentLine::Malformed { text, reason } => {
                extracted.warnings.push(AnnotationWarning {
                    line: line_no,
                    message: format!("malformed annotation '{}': {reason}", text.trim()),
                });
                description.push(text);
            }
        }
    }

    extracted.description = join_description(&description);
    extracted
}

// `body` is the line without its comment marker; prose keeps its indentation.
fn parse_line(body: &str) -> CommentLine<'_> {
    let text = body.trim();

    if let Some(rest) = text.strip_prefix(META_PREFIX) {
        return match parse_meta(rest) {
            Ok((key, value)) => CommentLine::Annotation { key, value },
            Err(reason) => CommentLine::Malformed { text: body, reason },
        };
    }

    if let Some(value) = text.strip_prefix(EXAMPLE_PREFIX) {
        let value = value.trim();
        if value.is_empty() {
            return CommentLine::Malformed {
                text: body,
                reason: "missing value".to_string(),
            };
        }
        return CommentLine::Annotation {
            key: EXAMPLE_KEY,
            value,
        };
    }

    CommentLine::Text(body)
}

// `rest` is everything after `META(`.
fn parse_meta(rest: &str) -> Result<(&str, &str), String> {
    let close = rest.find(')').ok_or_else(|| "missing ')'".to_string())?;

    let key = rest[..close].trim();
    if key.is_empty() {
        return Err("empty key".to_string());
    }
    if key.contains(char::is_whitespace) || key.contains('(') {
        return Err(format!("invalid key '{key}'"));
    }

    let value = rest[close + 1..]
        .trim_start()
        .strip_prefix(':')
        .ok_or_else(|| "missing ':' after key".to_string())?
        .trim();
    if value.is_empty() {
        return Err("missing value".to_string());
    }

    Ok((key, value))
}

/// Remove the comment syntax from one line.
///
/// `//` and `///` count as markers only when followed by a space or the end of
/// the line. Inside a block comment, `/*`, `/**`, a closing `*/` and a single
/// leading `*` followed by a space are markers too. Everything else, including
/// `#` and `**`, is prose and is returned untouched apart from trailing
/// whitespace.
fn strip_comment_marker(line: &str, style: CommentStyle) -> &str {
    let lead = line.trim_start();
    let body = match style {
        CommentStyle::Line => ["///", "//"]
            .iter()
            .find_map(|marker| after_marker(lead, marker)),
        CommentStyle::Block => {
            let lead = lead.strip_suffix("*/").unwrap_or(lead);
            ["/**", "/*"]
                .iter()
                .find_map(|marker| lead.strip_prefix(marker))
                .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
                .or_else(|| after_marker(lead, "*"))
                .or(Some(lead).filter(|l| l.trim().is_empty()))
        }
    };
    body.unwrap_or(line).trim_end()
}

// `marker` at the start of `lead`, followed by a space or nothing.
fn after_marker<'a>(lead: &'a str, marker: &str) -> Option<&'a str> {
    let rest = lead.strip_prefix(marker)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ')
    }
}

fn join_description(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_forms() {
        assert_eq!(AnnotationValue::parse("true"), AnnotationValue::Bool(true));
        assert_eq!(AnnotationValue::parse(" false "), AnnotationValue::Bool(false));
        assert_eq!(AnnotationValue::parse("3"), AnnotationValue::from(3_i64));
        assert_eq!(
            AnnotationValue::parse("\"Hello there\""),
            AnnotationValue::from("Hello there")
        );
        assert_eq!(
            AnnotationValue::parse(r#"["Mat", "David"]"#),
            AnnotationValue::StringList(vec!["Mat".into(), "David".into()])
        );
        assert_eq!(
            AnnotationValue::parse("just some words"),
            AnnotationValue::from("just some words")
        );
    }

    #[test]
    fn test_parse_value_generic_literal() {
        let value = AnnotationValue::parse(r#"{"page": 2}"#);
        assert_eq!(value, AnnotationValue::Literal(serde_json::json!({"page": 2})));

        let mixed = AnnotationValue::parse(r#"[1, "two"]"#);
        assert!(matches!(mixed, AnnotationValue::Literal(_)));
    }

    #[test]
    fn test_extract_strips_annotations_from_description() {
        let comment = "GreeterService is a polite API.\nYou will love it.\nMETA(strapline): \"A lovely greeter service\"";
        let extracted = extract(comment);

        assert_eq!(
            extracted.description,
            "GreeterService is a polite API.\nYou will love it."
        );
        assert_eq!(
            extracted.metadata.get("strapline"),
            Some(&AnnotationValue::from("A lovely greeter service"))
        );
        assert!(extracted.warnings.is_empty());
    }

    #[test]
    fn test_extract_bare_example() {
        let extracted = extract("Text is the message.\nexample: \"Hello there\"");
        assert_eq!(extracted.description, "Text is the message.");
        assert_eq!(
            extracted.metadata.get(EXAMPLE_KEY),
            Some(&AnnotationValue::from("Hello there"))
        );
    }

    #[test]
    fn test_duplicate_key_last_write_wins_with_one_warning() {
        let extracted = extract("META(featured): true\nMETA(featured): false");
        assert_eq!(
            extracted.metadata.get("featured"),
            Some(&AnnotationValue::Bool(false))
        );
        assert_eq!(extracted.metadata.len(), 1);
        assert_eq!(extracted.warnings.len(), 1);
        assert_eq!(extracted.warnings[0].line, 2);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let extracted = extract("META(Featured): true\nMETA(FEATURED): false");
        assert_eq!(extracted.metadata.keys().collect::<Vec<_>>(), vec!["Featured"]);
        assert!(!extracted.metadata.is_flag_set("featured"));
        assert_eq!(extracted.warnings.len(), 1);
    }

    #[test]
    fn test_malformed_lines_stay_in_description() {
        let extracted = extract("Summary.\nMETA(broken: true\nMETA(): 1\nMETA(key) true");
        assert!(extracted.metadata.is_empty());
        assert_eq!(extracted.warnings.len(), 3);
        assert_eq!(
            extracted.description,
            "Summary.\nMETA(broken: true\nMETA(): 1\nMETA(key) true"
        );
    }

    #[test]
    fn test_comment_markers_and_blank_edges() {
        let extracted = extract("//\n// Page describes which page.\n// META(min): 1\n//");
        assert_eq!(extracted.description, "Page describes which page.");
        assert_eq!(extracted.metadata.get("min"), Some(&AnnotationValue::from(1_i64)));
    }

    #[test]
    fn test_metadata_preserves_insertion_order() {
        let extracted = extract("META(b): 1\nMETA(a): 2\nexample: 3");
        let keys: Vec<_> = extracted.metadata.keys().collect();
        assert_eq!(keys, vec!["b", "a", "example"]);
    }

    #[test]
    fn test_metadata_serializes_as_ordered_object() {
        let extracted = extract("META(featured): true\nexample: [\"a\"]\nMETA(times): 3");
        let json = serde_json::to_string(&extracted.metadata).unwrap();
        assert_eq!(json, r#"{"featured":true,"example":["a"],"times":3}"#);
    }

    #[test]
    fn test_markdown_prose_is_left_alone() {
        let extracted = extract("Greets people.\n**Note**: rate limited.\n* one\n#1 priority");
        assert_eq!(
            extracted.description,
            "Greets people.\n**Note**: rate limited.\n* one\n#1 priority"
        );
        assert!(extracted.metadata.is_empty());
        assert!(extracted.warnings.is_empty());
    }

    #[test]
    fn test_description_keeps_indentation() {
        let extracted = extract("// Usage:\n//     greet(\"Mat\")\n// META(featured): true");
        assert_eq!(extracted.description, "Usage:\n    greet(\"Mat\")");
        assert!(extracted.metadata.is_flag_set("featured"));
    }

    #[test]
    fn test_block_comment_markers() {
        let extracted = extract("/**\n * Greets people.\n * **Loudly**.\n * META(featured): true\n */");
        assert_eq!(extracted.description, "Greets people.\n**Loudly**.");
        assert!(extracted.metadata.is_flag_set("featured"));
    }

    #[test]
    fn test_slashes_without_space_are_prose() {
        let extracted = extract("See //cdn.example.com for assets.\n//cdn.example.com");
        assert_eq!(
            extracted.description,
            "See //cdn.example.com for assets.\n//cdn.example.com"
        );
    }
}
