//! CRD and JSON Schema generation for miaka
//!
//! Takes an inferred [`miaka_core::Schema`] and produces:
//!
//! - a `CustomResourceDefinition` ([`CrdGenerator`]), with kubebuilder-style
//!   markers applied to the generated properties
//! - a draft-07 JSON Schema for Helm's `values.schema.json`
//!   ([`JsonSchemaTranslator`])
//!
//! It can also validate instances against either output ([`InstanceValidator`])
//! and compare a regenerated CRD against the previous one ([`CrdAnalyzer`],
//! [`CompatibilityPolicy`]).
//!
//! ```rust
//! use miaka_core::SchemaBuilder;
//! use miaka_crd::{CrdGenerator, CrdOptions, InstanceValidator, JsonSchemaTranslator};
//!
//! let schema = SchemaBuilder::default()
//!     .build("apiVersion: example.com/v1\nkind: Demo\nreplicas: 3\n")
//!     .unwrap();
//!
//! let crd = CrdGenerator::new(CrdOptions::default()).generate(&schema).unwrap();
//! assert_eq!(crd.metadata.name.as_deref(), Some("demos.example.com"));
//!
//! let json_schema = JsonSchemaTranslator::default().translate(&crd, None).unwrap();
//! let validator = InstanceValidator::new(&json_schema).unwrap();
//! assert!(!validator.validate(&serde_json::json!({"replicas": "three"})).is_valid());
//! ```

pub mod analyzer;
pub mod error;
pub mod generator;
pub mod json_schema;
pub mod markers;
pub mod options;
pub mod parser;
pub mod policy;
pub mod schema;
pub mod validator;

pub use analyzer::{ChangeKind, ChangeSeverity, CrdAnalysis, CrdAnalyzer, CrdChange};
pub use error::{CrdError, Result};
pub use generator::CrdGenerator;
pub use json_schema::JsonSchemaTranslator;
pub use markers::{Marker, Requirement};
pub use options::CrdOptions;
pub use parser::CrdParser;
pub use policy::{CompatibilityDecision, CompatibilityPolicy, CompatibilityStrategy};
pub use schema::{CrdSchema, CrdScope, PropertyType, SchemaProperty};
pub use validator::{InstanceValidator, ValidationIssue, ValidationResult};

pub use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

/// Compare a freshly generated CRD with the previous one, if any
pub fn analyze_generated(
    previous: Option<&CrdSchema>,
    generated: &CustomResourceDefinition,
) -> Result<CrdAnalysis> {
    let new = CrdParser::from_crd(generated)?;
    Ok(CrdAnalyzer::analyze(previous, &new))
}
