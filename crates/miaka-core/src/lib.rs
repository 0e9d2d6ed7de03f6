//! Schema inference for Helm values files
//!
//! Turns a values.yaml that declares `apiVersion` and `kind` into a typed
//! [`Schema`]: named structs for nested mappings, merged structs for lists of
//! mappings, scalar types inferred from example values, and documentation
//! and markers taken from head comments.
//!
//! ```rust
//! use miaka_core::{BuildOptions, FieldType, TypeRef, infer_schema};
//!
//! let yaml = r#"
//! apiVersion: example.com/v1
//! kind: Demo
//! ## Number of replicas
//! replicas: 3
//! ## +miaka:type:string
//! extraArgs: []
//! "#;
//!
//! let schema = infer_schema("values.yaml", yaml, &BuildOptions::default()).unwrap();
//! let root = schema.root().unwrap();
//! assert_eq!(root.fields[0].documentation, vec!["Number of replicas"]);
//! assert_eq!(root.fields[1].field_type, FieldType::List(TypeRef::String));
//! ```

pub mod api_version;
pub mod builder;
pub mod comments;
pub mod error;
pub mod inference;
pub mod model;
pub mod naming;
pub mod options;
pub mod source;
pub mod types;
pub mod validate;

pub use api_version::GroupVersion;
pub use builder::SchemaBuilder;
pub use comments::{CommentBlock, MarkerExtractor};
pub use error::{Result, SchemaError};
pub use inference::infer_scalar;
pub use model::{Field, Schema, StructDef};
pub use options::BuildOptions;
pub use source::{PathSegment, SourceMap};
pub use types::{FieldType, TypeRef};
pub use validate::{
    UnknownPosition, UnknownTypeEntry, UnknownTypeReport, find_unknown_types, validate_schema,
};

/// Build a schema and reject it if any field type is unknown
///
/// `name` labels the document in diagnostics.
pub fn infer_schema(name: &str, document: &str, options: &BuildOptions) -> Result<Schema> {
    let schema = SchemaBuilder::new(options.clone()).build(document)?;

    let entries = find_unknown_types(&schema);
    if !entries.is_empty() {
        let report =
            UnknownTypeReport::new(entries, options.marker_tool.clone()).with_source(name, document);
        return Err(report.into());
    }

    Ok(schema)
}
