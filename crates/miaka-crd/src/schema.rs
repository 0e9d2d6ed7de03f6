//! Comparison model for CRDs
//!
//! A trimmed view of a CustomResourceDefinition that keeps only what matters
//! when deciding whether a regenerated CRD is safe to ship over the previous
//! one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSchema {
    /// Full CRD name (e.g., "webapps.example.com")
    pub name: String,
    pub group: String,
    pub scope: CrdScope,
    pub names: CrdNames,
    pub versions: Vec<CrdVersionSchema>,
}

impl CrdSchema {
    pub fn storage_version(&self) -> Option<&CrdVersionSchema> {
        self.versions.iter().find(|v| v.storage)
    }

    pub fn version(&self, name: &str) -> Option<&CrdVersionSchema> {
        self.versions.iter().find(|v| v.name == name)
    }
}

/// Whether resources are namespaced or cluster-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CrdScope {
    #[default]
    Namespaced,
    Cluster,
}

impl CrdScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Namespaced => "Namespaced",
            Self::Cluster => "Cluster",
        }
    }
}

impl std::str::FromStr for CrdScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "namespaced" => Ok(Self::Namespaced),
            "cluster" => Ok(Self::Cluster),
            other => Err(format!(
                "unknown scope '{}', expected Namespaced or Cluster",
                other
            )),
        }
    }
}

impl std::fmt::Display for CrdScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    pub kind: String,
    pub plural: String,
    pub singular: Option<String>,
    pub short_names: Vec<String>,
    pub list_kind: Option<String>,
    pub categories: Vec<String>,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersionSchema {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    /// Root of `schema.openAPIV3Schema`
    pub schema: Option<SchemaProperty>,
}

/// Schema for a single property
///
/// Objects keep their properties in a sorted map so comparisons are stable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProperty {
    pub type_: PropertyType,
    pub description: Option<String>,
    pub default: Option<serde_json::Value>,
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub enum_values: Option<Vec<serde_json::Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub nullable: bool,
    pub properties: BTreeMap<String, SchemaProperty>,
    pub required: Vec<String>,
    pub items: Option<Box<SchemaProperty>>,
    pub additional_properties: Option<AdditionalProperties>,
    pub preserve_unknown: bool,
}

impl SchemaProperty {
    pub fn of_type(type_: PropertyType) -> Self {
        Self {
            type_,
            ..Default::default()
        }
    }

    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            type_: PropertyType::Object,
            properties,
            ..Default::default()
        }
    }

    pub fn array(items: SchemaProperty) -> Self {
        Self {
            type_: PropertyType::Array,
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Get a nested property by dot-separated path
    pub fn get_nested(&self, path: &str) -> Option<&SchemaProperty> {
        let mut current = self;
        for part in path.split('.') {
            current = current.properties.get(part)?;
        }
        Some(current)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// Property type in an OpenAPI v3 schema
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    #[default]
    Object,
    /// `x-kubernetes-int-or-string`
    IntOrString,
    /// No type, `x-kubernetes-preserve-unknown-fields`
    Any,
    Unknown(String),
}

impl PropertyType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether every value valid for `self` stays valid under `other`
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unknown(_), _) | (_, Self::Unknown(_)) => false,
            (a, b) if a == b => true,
            (Self::Integer, Self::Number) => true,
            (Self::Integer | Self::String, Self::IntOrString) => true,
            (_, Self::Any) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::IntOrString => write!(f, "int-or-string"),
            Self::Any => write!(f, "any"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// `additionalProperties` of an object
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    #[default]
    Allowed,
    Denied,
    Schema(Box<SchemaProperty>),
}
