//! Inferred schema model
//!
//! A [`Schema`] is a flat list of named structs. The root struct is named
//! after the resource kind and comes first; nested structs follow in the
//! order the walk created them.

use serde::Serialize;

use crate::api_version::GroupVersion;
use crate::types::{FieldType, TypeRef};

/// One member of a struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Normalized identifier
    pub name: String,
    /// Original YAML key
    pub source_key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,
    /// Dotted path from the root struct, e.g. `Demo.service.port`
    pub source_path: String,
    /// 1-based line of the key, when it could be located
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<usize>,
}

impl Field {
    /// Element type, only for list fields
    pub fn element_type(&self) -> Option<&TypeRef> {
        self.field_type.element_type()
    }

    /// Returns true if the field or its list element has no type
    pub fn is_unknown(&self) -> bool {
        self.field_type.base().is_unknown()
    }
}

/// A named struct built from a mapping or from merged list items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDef {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<String>,
    pub fields: Vec<Field>,
}

impl StructDef {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look a field up by its original YAML key
    pub fn field_by_key(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.source_key == key)
    }
}

/// The inferred schema of one values document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub api_group_version: GroupVersion,
    pub resource_kind: String,
    pub structs: Vec<StructDef>,
}

impl Schema {
    /// The struct named after the resource kind
    pub fn root(&self) -> Option<&StructDef> {
        self.find_struct(&self.resource_kind)
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Every field of every struct, with its owning struct
    pub fn fields(&self) -> impl Iterator<Item = (&StructDef, &Field)> {
        self.structs
            .iter()
            .flat_map(|s| s.fields.iter().map(move |f| (s, f)))
    }
}
