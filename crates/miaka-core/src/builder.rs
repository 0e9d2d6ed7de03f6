//! Schema tree builder
//!
//! Walks a parsed values document and produces a flat [`Schema`]:
//!
//! ```text
//! values.yaml ──► serde_yaml::Value ─┐
//!      │                             ├─► Walk ──► Schema { structs: [Root, ...] }
//!      └──────► SourceMap ───────────┘
//!               (lines, head comments)
//! ```
//!
//! Every nested mapping becomes a struct, list items that are mappings are
//! merged into one struct, and scalars are typed by inference or by a type
//! hint in the key's head comment. Structs created deeper in the walk are
//! returned to the caller and appended after their parent.
//!
//! Struct names are settled in two passes. A census over the document finds
//! derived names that several structs would share, and the walk then gives
//! each of those a parent prefix.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::api_version::GroupVersion;
use crate::comments::{CommentBlock, MarkerExtractor};
use crate::error::{Result, SchemaError};
use crate::inference::{infer_scalar, unwrap_tagged, value_kind};
use crate::model::{Field, Schema, StructDef};
use crate::naming::{NameRegistry, StructNamer, normalize_identifier};
use crate::options::BuildOptions;
use crate::source::{PathSegment, SourceMap};
use crate::types::{FieldType, TypeRef};

/// Top-level keys that describe the resource rather than its fields
const RESERVED_KEYS: [&str; 3] = ["apiVersion", "kind", "metadata"];

/// Builds a [`Schema`] from a values document
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    options: BuildOptions,
}

impl SchemaBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Parse and walk a YAML document
    pub fn build(&self, document: &str) -> Result<Schema> {
        let value: Value = serde_yaml::from_str(document)?;
        let sources = SourceMap::scan(document);
        self.build_value(&value, &sources)
    }

    /// Walk an already parsed document
    ///
    /// `sources` supplies line numbers and comments; an empty map yields a
    /// schema without documentation or hints.
    pub fn build_value(&self, value: &Value, sources: &SourceMap) -> Result<Schema> {
        let Value::Mapping(root) = unwrap_tagged(value) else {
            return Err(SchemaError::RootNotMapping {
                found: value_kind(value),
            });
        };

        let api_group_version = match root.get("apiVersion").map(unwrap_tagged) {
            None | Some(Value::Null) => GroupVersion::default(),
            Some(Value::String(s)) => GroupVersion::parse(s)?,
            Some(other) => {
                return Err(SchemaError::InvalidApiVersion {
                    value: render_scalar(other).unwrap_or_else(|| value_kind(other).to_string()),
                    reason: "must be a string".to_string(),
                });
            }
        };

        let kind = match root.get("kind").map(unwrap_tagged) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(SchemaError::MissingKind),
        };

        let root_path = NodePath::root(&kind);
        let mut walk = Walk::new(&self.options, sources);
        walk.names = NameRegistry::with_shared(walk.shared_names(root, &root_path));
        walk.names.reserve(&kind);

        let (kind_block, _) = walk.comments_at(&root_path.key("kind"));

        let mut fields = Vec::new();
        let mut nested = Vec::new();
        for (key, value) in root {
            let key = scalar_key(key, &root_path)?;
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let (field, mut structs) = walk.resolve_key(&key, value, &root_path)?;
            fields.push(field);
            nested.append(&mut structs);
        }

        let mut structs = vec![StructDef {
            name: kind.clone(),
            documentation: kind_block.documentation,
            fields,
        }];
        structs.append(&mut nested);

        debug!(kind = %kind, structs = structs.len(), "schema built");

        Ok(Schema {
            api_group_version,
            resource_kind: kind,
            structs,
        })
    }
}

// =============================================================================
// PATHS
// =============================================================================

/// Position of a node during the walk
///
/// `segments` addresses the node in the [`SourceMap`]; `keys` is the dotted
/// path used in diagnostics, starting with the kind and without list indices.
#[derive(Debug, Clone)]
struct NodePath {
    segments: Vec<PathSegment>,
    keys: Vec<String>,
}

impl NodePath {
    fn root(kind: &str) -> Self {
        Self {
            segments: Vec::new(),
            keys: vec![kind.to_string()],
        }
    }

    fn key(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::key(key));
        next.keys.push(key.to_string());
        next
    }

    fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    fn dotted(&self) -> String {
        self.keys.join(".")
    }

    /// The key above the current one, or the kind for root fields
    fn parent_key(&self) -> &str {
        let len = self.keys.len();
        if len >= 2 {
            &self.keys[len - 2]
        } else {
            &self.keys[0]
        }
    }
}

// =============================================================================
// WALK
// =============================================================================

/// State of one `build` call
struct Walk<'a> {
    sources: &'a SourceMap,
    extractor: MarkerExtractor,
    namer: StructNamer,
    names: NameRegistry,
}

type Resolved = (Field, Vec<StructDef>);

/// A field collected while merging list items
struct MergedField {
    field: Field,
    comments: Vec<String>,
}

impl<'a> Walk<'a> {
    fn new(options: &BuildOptions, sources: &'a SourceMap) -> Self {
        Self {
            sources,
            extractor: MarkerExtractor::new(options.marker_tool.clone()),
            namer: StructNamer::new(options),
            names: NameRegistry::new(),
        }
    }

    fn comments_at(&self, path: &NodePath) -> (CommentBlock, Option<usize>) {
        let block = self.extractor.extract(self.sources.comments(&path.segments));
        (block, self.sources.line(&path.segments))
    }

    /// Derived struct names that more than one struct in `root` would get
    fn shared_names(&self, root: &Mapping, root_path: &NodePath) -> HashSet<String> {
        let mut counts = HashMap::new();
        for (key, value) in root {
            let Some(key) = render_scalar(key) else {
                continue;
            };
            if !RESERVED_KEYS.contains(&key.as_str()) {
                self.count_struct_names(&key, value, &root_path.key(&key), &mut counts);
            }
        }

        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name)
            .collect()
    }

    /// Count the struct names the walk would derive below `path`
    ///
    /// Mirrors the walk: hinted empty mappings make no struct, and keys of
    /// merged list items are only followed on first occurrence.
    fn count_struct_names(
        &self,
        key: &str,
        value: &Value,
        path: &NodePath,
        counts: &mut HashMap<String, usize>,
    ) {
        match unwrap_tagged(value) {
            Value::Mapping(map) => {
                let comments = self.sources.comments(&path.segments);
                if map.is_empty() && self.extractor.type_hint(comments).is_some() {
                    return;
                }
                *counts.entry(self.namer.derive_struct_name(key)).or_default() += 1;
                for (child_key, child_value) in map {
                    if let Some(child_key) = render_scalar(child_key) {
                        let child_path = path.key(&child_key);
                        self.count_struct_names(&child_key, child_value, &child_path, counts);
                    }
                }
            }
            Value::Sequence(items) => {
                if !matches!(items.first().map(unwrap_tagged), Some(Value::Mapping(_))) {
                    return;
                }
                *counts.entry(self.namer.derive_struct_name(key)).or_default() += 1;

                let mut seen = HashSet::new();
                for (index, item) in items.iter().enumerate() {
                    let Value::Mapping(map) = unwrap_tagged(item) else {
                        continue;
                    };
                    let item_path = path.index(index);
                    for (child_key, child_value) in map {
                        let Some(child_key) = render_scalar(child_key) else {
                            continue;
                        };
                        if seen.insert(child_key.clone()) {
                            let child_path = item_path.key(&child_key);
                            self.count_struct_names(&child_key, child_value, &child_path, counts);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Resolve the value under `key` in the mapping at `parent`
    fn resolve_key(&mut self, key: &str, value: &Value, parent: &NodePath) -> Result<Resolved> {
        let path = parent.key(key);
        let (block, line) = self.comments_at(&path);
        self.resolve_field(key, value, &path, block, line)
    }

    fn resolve_field(
        &mut self,
        key: &str,
        value: &Value,
        path: &NodePath,
        block: CommentBlock,
        line: Option<usize>,
    ) -> Result<Resolved> {
        let (field_type, structs) = match unwrap_tagged(value) {
            Value::Mapping(map) => self.resolve_mapping(key, map, path, &block)?,
            Value::Sequence(items) => self.resolve_sequence(key, items, path, &block)?,
            scalar => {
                let field_type = match &block.type_hint {
                    Some(hint) => FieldType::from_hint(hint),
                    None => FieldType::Single(infer_scalar(scalar)),
                };
                (field_type, Vec::new())
            }
        };

        let field = Field {
            name: normalize_identifier(key),
            source_key: key.to_string(),
            field_type,
            documentation: block.documentation,
            markers: block.markers,
            source_path: path.dotted(),
            source_line: line,
        };
        Ok((field, structs))
    }

    fn resolve_mapping(
        &mut self,
        key: &str,
        map: &Mapping,
        path: &NodePath,
        block: &CommentBlock,
    ) -> Result<(FieldType, Vec<StructDef>)> {
        if let Some(hint) = &block.type_hint {
            if map.is_empty() {
                return Ok((FieldType::from_hint(hint), Vec::new()));
            }
            warn!(path = %path.dotted(), hint = %hint, "type hint ignored on a non-empty mapping");
        }

        let name = self.names.unique_struct_name(&self.namer, key, path.parent_key());

        let mut fields = Vec::with_capacity(map.len());
        let mut nested = Vec::new();
        for (child_key, child_value) in map {
            let child_key = scalar_key(child_key, path)?;
            let (field, mut structs) = self.resolve_key(&child_key, child_value, path)?;
            fields.push(field);
            nested.append(&mut structs);
        }

        let mut structs = vec![StructDef {
            name: name.clone(),
            documentation: block.documentation.clone(),
            fields,
        }];
        structs.append(&mut nested);

        Ok((FieldType::Single(TypeRef::Struct(name)), structs))
    }

    fn resolve_sequence(
        &mut self,
        key: &str,
        items: &[Value],
        path: &NodePath,
        block: &CommentBlock,
    ) -> Result<(FieldType, Vec<StructDef>)> {
        let hint = block.type_hint.as_deref();

        let Some(first) = items.first() else {
            let field_type = hint
                .map(FieldType::from_sequence_hint)
                .unwrap_or(FieldType::List(TypeRef::Unknown));
            return Ok((field_type, Vec::new()));
        };

        match unwrap_tagged(first) {
            Value::Mapping(_) => {
                if let Some(hint) = hint {
                    warn!(path = %path.dotted(), hint = %hint, "type hint ignored on a list of mappings");
                }
                let name = self.names.unique_struct_name(&self.namer, key, path.parent_key());
                let (fields, nested) = self.merge_list_items(items, path)?;

                let mut structs = vec![StructDef {
                    name: name.clone(),
                    documentation: block.documentation.clone(),
                    fields,
                }];
                structs.extend(nested);

                Ok((FieldType::List(TypeRef::Struct(name)), structs))
            }
            Value::Sequence(_) => {
                let field_type = hint
                    .map(FieldType::from_sequence_hint)
                    .unwrap_or(FieldType::List(TypeRef::Unknown));
                Ok((field_type, Vec::new()))
            }
            scalar => {
                let element = infer_scalar(scalar);
                let field_type = match hint {
                    Some(hint) if element.is_unknown() => FieldType::from_sequence_hint(hint),
                    Some(hint) => {
                        warn!(path = %path.dotted(), hint = %hint, "type hint ignored, element type inferred from the first item");
                        FieldType::List(element)
                    }
                    None => FieldType::List(element),
                };
                Ok((field_type, Vec::new()))
            }
        }
    }

    /// Merge mapping items of a list into the fields of one struct
    ///
    /// Keys are resolved on first occurrence only. A later occurrence may
    /// document a field that was undocumented so far, but two different
    /// non-empty comment blocks for the same key are a conflict.
    fn merge_list_items(
        &mut self,
        items: &[Value],
        path: &NodePath,
    ) -> Result<(Vec<Field>, Vec<StructDef>)> {
        let mut merged: IndexMap<String, MergedField> = IndexMap::new();
        let mut structs = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let Value::Mapping(map) = unwrap_tagged(item) else {
                warn!(
                    path = %path.dotted(),
                    index,
                    found = value_kind(item),
                    "skipping list item that is not a mapping"
                );
                continue;
            };
            let item_path = path.index(index);

            for (key, value) in map {
                let key = scalar_key(key, &item_path)?;
                let child = item_path.key(&key);
                let (block, line) = self.comments_at(&child);

                if let Some(existing) = merged.get_mut(&key) {
                    if block.is_empty() {
                        continue;
                    }
                    if existing.comments.is_empty() {
                        existing.field.documentation = block.documentation;
                        existing.field.markers = block.markers;
                        existing.comments = block.lines;
                    } else if existing.comments != block.lines {
                        return Err(SchemaError::ListMergeConflict {
                            field: key,
                            path: child.dotted(),
                            first: existing.comments.join("\n"),
                            second: block.lines.join("\n"),
                            line,
                        });
                    }
                    continue;
                }

                let comments = block.lines.clone();
                let (field, mut nested) = self.resolve_field(&key, value, &child, block, line)?;
                structs.append(&mut nested);
                merged.insert(key, MergedField { field, comments });
            }
        }

        let fields = merged.into_values().map(|m| m.field).collect();
        Ok((fields, structs))
    }
}

/// Mapping keys must be scalars; numbers and booleans are stringified
fn scalar_key(key: &Value, path: &NodePath) -> Result<String> {
    render_scalar(key).ok_or_else(|| SchemaError::InvalidKey {
        path: path.dotted(),
    })
}

fn render_scalar(value: &Value) -> Option<String> {
    match unwrap_tagged(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}
