//! Unknown-type validation
//!
//! A CRD needs a structural schema, so every field must end up with a
//! concrete type. This pass collects every field (or list element) that
//! inference could not type and reports them together.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use serde::Serialize;
use std::fmt;

use crate::error::Result;
use crate::model::Schema;
use crate::types::{FieldType, TypeRef};

/// Which part of a field lacks a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownPosition {
    /// The field itself (e.g. `value: ~`)
    Field,
    /// The element type of a list (e.g. `items: []`)
    ListElement,
}

impl fmt::Display for UnknownPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::ListElement => write!(f, "list element"),
        }
    }
}

/// One field whose type could not be inferred
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownTypeEntry {
    pub struct_name: String,
    pub field_name: String,
    pub source_key: String,
    pub path: String,
    pub line: Option<usize>,
    pub position: UnknownPosition,
}

/// Every field of a schema that still has an unknown type
#[derive(Debug)]
pub struct UnknownTypeReport {
    entries: Vec<UnknownTypeEntry>,
    marker_tool: String,
    source: Option<NamedSource<String>>,
    labels: Vec<(String, SourceSpan)>,
}

impl UnknownTypeReport {
    pub fn new(entries: Vec<UnknownTypeEntry>, marker_tool: impl Into<String>) -> Self {
        Self {
            entries,
            marker_tool: marker_tool.into(),
            source: None,
            labels: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[UnknownTypeEntry] {
        &self.entries
    }

    pub fn marker_tool(&self) -> &str {
        &self.marker_tool
    }

    /// Attach the document text so each entry is labelled in place
    pub fn with_source(mut self, name: impl AsRef<str>, text: impl Into<String>) -> Self {
        let text = text.into();
        self.labels = self
            .entries
            .iter()
            .filter_map(|entry| {
                let span = calculate_span(&text, entry.line?)?;
                let label = match entry.position {
                    UnknownPosition::Field => format!("type of '{}' is unknown", entry.source_key),
                    UnknownPosition::ListElement => {
                        format!("element type of '{}' is unknown", entry.source_key)
                    }
                };
                Some((label, span))
            })
            .collect();
        self.source = Some(NamedSource::new(name, text));
        self
    }
}

impl fmt::Display for UnknownTypeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot infer the type of {} field{}",
            self.entries.len(),
            if self.entries.len() == 1 { "" } else { "s" }
        )?;
        for entry in &self.entries {
            write!(f, "\n  - {} ({} of {}", entry.path, entry.position, entry.struct_name)?;
            if let Some(line) = entry.line {
                write!(f, ", line {}", line)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for UnknownTypeReport {}

impl Diagnostic for UnknownTypeReport {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("miaka::schema::unknown_type"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!(
            "add a type hint comment above each field, e.g. `# +{tool}:type:string` or `# +{tool}:type:[]string`",
            tool = self.marker_tool
        )))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source.as_ref().map(|s| s as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Box::new(self.labels.iter().map(|(label, span)| {
            LabeledSpan::new_with_span(Some(label.clone()), *span)
        })))
    }
}

/// Collect every field whose type, or list element type, is unknown
pub fn find_unknown_types(schema: &Schema) -> Vec<UnknownTypeEntry> {
    schema
        .fields()
        .filter_map(|(owner, field)| {
            let position = match &field.field_type {
                FieldType::Single(TypeRef::Unknown) => UnknownPosition::Field,
                FieldType::List(TypeRef::Unknown) => UnknownPosition::ListElement,
                _ => return None,
            };
            Some(UnknownTypeEntry {
                struct_name: owner.name.clone(),
                field_name: field.name.clone(),
                source_key: field.source_key.clone(),
                path: field.source_path.clone(),
                line: field.source_line,
                position,
            })
        })
        .collect()
}

/// Fail with an [`UnknownTypeReport`] if any field has an unknown type
pub fn validate_schema(schema: &Schema, marker_tool: &str) -> Result<()> {
    let entries = find_unknown_types(schema);
    if entries.is_empty() {
        return Ok(());
    }
    Err(UnknownTypeReport::new(entries, marker_tool).into())
}

/// Span of a line's content, leading indentation excluded
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (index, line) in source.split('\n').enumerate() {
        if index + 1 == line_num {
            let content = line.trim_start();
            let indent = line.len() - content.len();
            let content = content.trim_end();
            return Some(SourceSpan::new((offset + indent).into(), content.len().into()));
        }
        offset += line.len() + 1;
    }

    None
}
