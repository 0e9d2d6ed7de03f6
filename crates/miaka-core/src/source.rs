//! Source positions and head comments for mapping keys
//!
//! `serde_yaml` drops comments and line numbers, so this module scans the
//! raw text of a block-style document once and records, for every mapping
//! key, the line it sits on and the comment lines directly above it.
//!
//! Keys are addressed by their structural path: mapping keys and sequence
//! indices from the document root.
//!
//! ```text
//! # Service settings        <- comments of [service]
//! service:                  <- line 2
//!   ports:
//!     # Public port         <- comments of [service, ports, 0, name]
//!     - name: http
//! ```
//!
//! Limitations: keys inside flow collections (`{a: 1}`) are not located and
//! a blank line detaches the comments above it.

use std::collections::HashMap;
use std::fmt;

/// One step in a structural path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{}", key),
            Self::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Where a key was found and what was written above it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// 1-based line number of the key
    pub line: usize,
    /// Raw comment lines directly above the key, in order
    pub comments: Vec<String>,
}

/// Positions and head comments of every key in a document
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    entries: HashMap<Vec<PathSegment>, SourceEntry>,
}

impl SourceMap {
    /// Scan a block-style YAML document
    pub fn scan(text: &str) -> Self {
        let mut scanner = Scanner::default();
        for (index, line) in text.lines().enumerate() {
            scanner.scan_line(index + 1, line);
        }
        Self {
            entries: scanner.entries,
        }
    }

    pub fn get(&self, path: &[PathSegment]) -> Option<&SourceEntry> {
        self.entries.get(path)
    }

    /// Line number of the key at `path`
    pub fn line(&self, path: &[PathSegment]) -> Option<usize> {
        self.get(path).map(|entry| entry.line)
    }

    /// Head comment lines of the key at `path`
    pub fn comments(&self, path: &[PathSegment]) -> &[String] {
        self.get(path)
            .map(|entry| entry.comments.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// LINE SCANNER
// =============================================================================

struct Frame {
    indent: usize,
    segment: PathSegment,
}

#[derive(Default)]
struct Scanner {
    entries: HashMap<Vec<PathSegment>, SourceEntry>,
    stack: Vec<Frame>,
    pending: Vec<String>,
    /// Indent of the node owning an open block scalar
    block_scalar: Option<usize>,
}

impl Scanner {
    fn scan_line(&mut self, number: usize, raw: &str) {
        let content = raw.trim_start_matches(' ');
        let indent = raw.len() - content.len();
        let content = content.trim_end();

        if let Some(owner) = self.block_scalar {
            if content.is_empty() || indent > owner {
                return;
            }
            self.block_scalar = None;
        }

        if content.is_empty() {
            self.pending.clear();
            return;
        }
        if content.starts_with('#') {
            self.pending.push(content.to_string());
            return;
        }
        if indent == 0 && is_document_marker(content) {
            self.stack.clear();
            self.pending.clear();
            return;
        }

        let mut column = indent;
        let mut rest = content;
        while let Some(after) = strip_sequence_dash(rest) {
            self.enter_item(column);
            let trimmed = after.trim_start_matches(' ');
            if is_block_scalar(trimmed) {
                self.block_scalar = Some(column);
            }
            column += rest.len() - trimmed.len();
            rest = trimmed;
        }

        // A bare `-` keeps pending comments for the item's first key
        if rest.starts_with('#') {
            self.pending.push(rest.to_string());
            return;
        }
        if rest.is_empty() {
            return;
        }

        let Some((key, value)) = split_key(rest) else {
            self.pending.clear();
            return;
        };

        while self.stack.last().is_some_and(|top| top.indent >= column) {
            self.stack.pop();
        }

        let mut path: Vec<PathSegment> = self.stack.iter().map(|f| f.segment.clone()).collect();
        path.push(PathSegment::Key(key.clone()));
        let comments = std::mem::take(&mut self.pending);
        self.entries.entry(path).or_insert(SourceEntry {
            line: number,
            comments,
        });

        self.stack.push(Frame {
            indent: column,
            segment: PathSegment::Key(key),
        });

        if is_block_scalar(value) {
            self.block_scalar = Some(column);
        }
    }

    /// A `- ` at `column` starts the next item of the sequence there
    fn enter_item(&mut self, column: usize) {
        while self.stack.last().is_some_and(|top| top.indent > column) {
            self.stack.pop();
        }

        let index = match self.stack.last() {
            Some(Frame {
                indent,
                segment: PathSegment::Index(previous),
            }) if *indent == column => {
                let next = previous + 1;
                self.stack.pop();
                next
            }
            _ => 0,
        };

        self.stack.push(Frame {
            indent: column,
            segment: PathSegment::Index(index),
        });
    }
}

fn is_document_marker(content: &str) -> bool {
    content.starts_with("---") || content.starts_with("...") || content.starts_with('%')
}

/// `- item` or a lone `-`; returns what follows the dash
fn strip_sequence_dash(content: &str) -> Option<&str> {
    if content == "-" {
        return Some("");
    }
    content.strip_prefix("- ")
}

/// `|`, `>-`, `|2+` and friends, possibly after an anchor or tag
fn is_block_scalar(value: &str) -> bool {
    value
        .split_whitespace()
        .find(|token| !token.starts_with('&') && !token.starts_with('!'))
        .is_some_and(|token| {
            let mut chars = token.chars();
            matches!(chars.next(), Some('|' | '>'))
                && chars.all(|c| c == '+' || c == '-' || c.is_ascii_digit())
        })
}

/// Split `key: value` into the key and the raw value text
fn split_key(content: &str) -> Option<(String, &str)> {
    let first = content.chars().next()?;

    if first == '"' || first == '\'' {
        let (key, consumed) = parse_quoted(content, first)?;
        let value = content[consumed..].trim_start_matches(' ').strip_prefix(':')?;
        if !value.is_empty() && !value.starts_with([' ', '\t']) {
            return None;
        }
        return Some((key, value.trim()));
    }

    if matches!(first, '{' | '[' | '?' | '|' | '>' | '%' | '@' | '`') {
        return None;
    }

    let mut previous = ' ';
    for (index, c) in content.char_indices() {
        if c == '#' && previous.is_whitespace() {
            return None;
        }
        if c == ':' {
            let value = &content[index + 1..];
            if value.is_empty() || value.starts_with([' ', '\t']) {
                let key = content[..index].trim_end();
                return (!key.is_empty()).then(|| (key.to_string(), value.trim()));
            }
        }
        previous = c;
    }
    None
}

/// Parse a quoted key; returns the unquoted text and the byte length consumed
fn parse_quoted(content: &str, quote: char) -> Option<(String, usize)> {
    let mut key = String::new();
    let mut chars = content.char_indices().skip(1).peekable();

    while let Some((index, c)) = chars.next() {
        match c {
            '\\' if quote == '"' => {
                let (_, escaped) = chars.next()?;
                key.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            '\'' if quote == '\'' => {
                if chars.peek().is_some_and(|(_, next)| *next == '\'') {
                    chars.next();
                    key.push('\'');
                } else {
                    return Some((key, index + 1));
                }
            }
            '"' if quote == '"' => return Some((key, index + 1)),
            other => key.push(other),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<PathSegment> {
        segments
            .iter()
            .map(|s| match s.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::key(*s),
            })
            .collect()
    }

    #[test]
    fn test_nested_keys_and_lines() {
        let map = SourceMap::scan(
            r#"apiVersion: ex.com/v1
kind: Demo
service:
  port: 8080
  config:
    timeout: 30
"#,
        );

        assert_eq!(map.line(&path(&["kind"])), Some(2));
        assert_eq!(map.line(&path(&["service", "port"])), Some(4));
        assert_eq!(map.line(&path(&["service", "config", "timeout"])), Some(6));
        assert_eq!(map.line(&path(&["port"])), None);
    }

    #[test]
    fn test_head_comments() {
        let map = SourceMap::scan(
            r#"# Detached by the blank line

# Number of replicas
#   +kubebuilder:validation:Minimum=1
replicas: 3
image:
  # Image tag
  tag: latest # trailing comments are ignored
  pullPolicy: Always
"#,
        );

        assert_eq!(
            map.comments(&path(&["replicas"])),
            ["# Number of replicas", "#   +kubebuilder:validation:Minimum=1"]
        );
        assert_eq!(map.comments(&path(&["image", "tag"])), ["# Image tag"]);
        assert!(map.comments(&path(&["image", "pullPolicy"])).is_empty());
        assert!(map.comments(&path(&["image"])).is_empty());
    }

    #[test]
    fn test_sequence_items() {
        let map = SourceMap::scan(
            r#"items:
  # First name
  - name: a
    type: X
  - name: b
    extra: 1
ports:
- 80
- port: 81
  # Protocol
  protocol: TCP
"#,
        );

        assert_eq!(map.comments(&path(&["items", "0", "name"])), ["# First name"]);
        assert_eq!(map.line(&path(&["items", "0", "type"])), Some(4));
        assert_eq!(map.line(&path(&["items", "1", "name"])), Some(5));
        assert_eq!(map.line(&path(&["items", "1", "extra"])), Some(6));
        assert_eq!(map.line(&path(&["ports"])), Some(7));
        assert_eq!(map.line(&path(&["ports", "1", "port"])), Some(9));
        assert_eq!(map.comments(&path(&["ports", "1", "protocol"])), ["# Protocol"]);
    }

    #[test]
    fn test_nested_sequences() {
        let map = SourceMap::scan(
            r#"matrix:
  - - name: a
  - - name: b
    - name: c
"#,
        );

        assert_eq!(map.line(&path(&["matrix", "0", "0", "name"])), Some(2));
        assert_eq!(map.line(&path(&["matrix", "1", "0", "name"])), Some(3));
        assert_eq!(map.line(&path(&["matrix", "1", "1", "name"])), Some(4));
    }

    #[test]
    fn test_block_scalars_are_skipped() {
        let map = SourceMap::scan(
            r#"script: |
  not: a key
  # not a comment
after: 1
folded: >-
  text: here
"#,
        );

        assert_eq!(map.line(&path(&["after"])), Some(4));
        assert!(map.get(&path(&["script", "not"])).is_none());
        assert!(map.get(&path(&["not"])).is_none());
        assert!(map.comments(&path(&["after"])).is_empty());
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_quoted_keys_and_urls() {
        let map = SourceMap::scan(
            r#""app.kubernetes.io/name": demo
'it''s': yes
endpoint: http://example.com:8080
"#,
        );

        assert_eq!(map.line(&path(&["app.kubernetes.io/name"])), Some(1));
        assert_eq!(map.line(&path(&["it's"])), Some(2));
        assert_eq!(map.line(&path(&["endpoint"])), Some(3));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_document_marker_resets() {
        let map = SourceMap::scan("---\n# Kind\nkind: Demo\n");
        assert_eq!(map.comments(&path(&["kind"])), ["# Kind"]);
        assert_eq!(map.line(&path(&["kind"])), Some(3));
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("a: b"), Some(("a".to_string(), "b")));
        assert_eq!(split_key("a:"), Some(("a".to_string(), "")));
        assert_eq!(split_key("a:b"), None);
        assert_eq!(split_key("value # a: b"), None);
        assert_eq!(split_key("{a: 1}"), None);
    }
}
