//! CRD error types

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while generating, translating, parsing or validating CRDs
#[derive(Error, Debug, Diagnostic)]
pub enum CrdError {
    #[error("No API group for kind '{kind}'")]
    #[diagnostic(
        code(miaka::crd::group),
        help("set `apiVersion: <group>/<version>` in values.yaml or `crd.group` in miaka.yaml")
    )]
    MissingGroup { kind: String },

    #[error("No API version for kind '{kind}'")]
    #[diagnostic(
        code(miaka::crd::version),
        help("set `apiVersion: <group>/<version>` in values.yaml or `crd.version` in miaka.yaml")
    )]
    MissingVersion { kind: String },

    #[error("Schema has no root struct named '{kind}'")]
    #[diagnostic(code(miaka::crd::root))]
    MissingRootStruct { kind: String },

    #[error("Field {path} has an unknown type")]
    #[diagnostic(code(miaka::crd::unknown_type), help("add a type hint comment above the field"))]
    UnknownType { path: String },

    #[error("Cannot resolve type '{name}' of field {path}")]
    #[diagnostic(
        code(miaka::crd::unresolved_type),
        help("use a scalar type, []T, map[string]T, a struct name, or one of IntOrString, Quantity, Time, Duration, JSON, RawExtension")
    )]
    UnresolvedType { name: String, path: String },

    #[error("Struct '{name}' refers to itself")]
    #[diagnostic(code(miaka::crd::recursive_type))]
    RecursiveType { name: String },

    #[error("Invalid marker '{marker}' on {path}: {reason}")]
    #[diagnostic(code(miaka::crd::marker))]
    InvalidMarker {
        marker: String,
        path: String,
        reason: String,
    },

    #[error("CRD has no version '{version}'")]
    #[diagnostic(code(miaka::crd::version_not_found))]
    VersionNotFound { version: String },

    #[error("CRD version '{version}' has no openAPIV3Schema")]
    #[diagnostic(code(miaka::crd::missing_schema))]
    MissingSchema { version: String },

    #[error("Invalid CRD: {0}")]
    #[diagnostic(code(miaka::crd::invalid))]
    InvalidCrd(String),

    #[error("Invalid JSON Schema: {message}")]
    #[diagnostic(code(miaka::crd::json_schema))]
    InvalidJsonSchema { message: String },

    #[error("YAML error: {0}")]
    #[diagnostic(code(miaka::crd::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(miaka::crd::json))]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrdError>;
