//! Comment and marker extraction
//!
//! Head comments above a values.yaml key carry three kinds of lines:
//!
//! - a type hint, `+<tool>:type:<expr>`, overriding inference
//! - validation markers, any other line starting with `+`, passed through
//!   verbatim (e.g. `+kubebuilder:validation:Minimum=1`)
//! - documentation, everything else
//!
//! ```yaml
//! # Number of replicas to run.
//! # +kubebuilder:validation:Minimum=1
//! replicas: 3
//!
//! # +miaka:type:string
//! extraArgs: []
//! ```

use tracing::warn;

/// Default marker tool name
pub const DEFAULT_MARKER_TOOL: &str = "miaka";

/// Classified contents of one comment block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentBlock {
    /// Documentation lines, markers removed
    pub documentation: Vec<String>,
    /// Type hint expression, if any
    pub type_hint: Option<String>,
    /// Pass-through markers, verbatim
    pub markers: Vec<String>,
    /// Every non-empty line after stripping, used to compare blocks
    pub lines: Vec<String>,
}

impl CommentBlock {
    /// Returns true if the block had no content at all
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Splits raw comment lines into documentation, type hint, and markers
#[derive(Debug, Clone)]
pub struct MarkerExtractor {
    tool: String,
}

impl Default for MarkerExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_TOOL)
    }
}

impl MarkerExtractor {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// The marker tool name this extractor recognizes
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Classify the lines of a head comment
    pub fn extract<S: AsRef<str>>(&self, raw_lines: &[S]) -> CommentBlock {
        let mut block = CommentBlock::default();

        for raw in raw_lines {
            let line = strip_comment_leader(raw.as_ref());
            if line.is_empty() {
                continue;
            }
            block.lines.push(line.to_string());

            if let Some(hint) = self.parse_type_hint(line) {
                match &block.type_hint {
                    None => block.type_hint = Some(hint.to_string()),
                    Some(first) => {
                        warn!(first = %first, ignored = %hint, "multiple type hints, keeping the first");
                    }
                }
                continue;
            }

            if line.starts_with('+') {
                block.markers.push(line.to_string());
            } else {
                block.documentation.push(line.to_string());
            }
        }

        block
    }

    /// First type hint in a head comment, without classifying the rest
    pub fn type_hint<S: AsRef<str>>(&self, raw_lines: &[S]) -> Option<String> {
        raw_lines
            .iter()
            .find_map(|raw| self.parse_type_hint(strip_comment_leader(raw.as_ref())))
            .map(str::to_string)
    }

    /// Match `+<tool>:type:<expr>` and return the trimmed expression
    fn parse_type_hint<'a>(&self, line: &'a str) -> Option<&'a str> {
        let expr = line
            .strip_prefix('+')?
            .strip_prefix(self.tool.as_str())?
            .strip_prefix(":type:")?
            .trim();
        (!expr.is_empty()).then_some(expr)
    }
}

/// Remove every leading `#` and surrounding whitespace
fn strip_comment_leader(line: &str) -> &str {
    line.trim().trim_start_matches('#').trim()
}
