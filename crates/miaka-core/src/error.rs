//! Schema inference error types

use miette::Diagnostic;
use thiserror::Error;

use crate::validate::UnknownTypeReport;

/// Errors raised while building or validating a schema
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    #[error("Invalid YAML: {0}")]
    #[diagnostic(code(miaka::schema::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Document root must be a mapping, found {found}")]
    #[diagnostic(
        code(miaka::schema::root),
        help("values.yaml must be a mapping with top-level keys such as `apiVersion` and `kind`")
    )]
    RootNotMapping { found: &'static str },

    #[error("Invalid apiVersion '{value}': {reason}")]
    #[diagnostic(code(miaka::schema::api_version))]
    InvalidApiVersion { value: String, reason: String },

    #[error("Missing resource kind")]
    #[diagnostic(
        code(miaka::schema::kind),
        help("add a top-level `kind: <Name>` entry, it names the resource and its root struct")
    )]
    MissingKind,

    #[error("Unsupported key at {path}: mapping keys must be scalars")]
    #[diagnostic(code(miaka::schema::key))]
    InvalidKey { path: String },

    #[error(
        "Conflicting comments for '{field}' across list items at {path}: \"{first}\" vs \"{second}\""
    )]
    #[diagnostic(
        code(miaka::schema::list_merge),
        help("list items are merged into one struct, so a field may only be documented one way; keep the comment on one item or make them identical")
    )]
    ListMergeConflict {
        field: String,
        path: String,
        first: String,
        second: String,
        line: Option<usize>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    UnknownTypes(#[from] UnknownTypeReport),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
