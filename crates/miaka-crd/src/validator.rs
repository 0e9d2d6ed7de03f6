//! Instance validation against generated schemas

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CrdError, Result};
use crate::json_schema::JsonSchemaTranslator;

/// One validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value, `(root)` for the document
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A compiled JSON Schema
pub struct InstanceValidator {
    validator: jsonschema::Validator,
}

impl InstanceValidator {
    pub fn new(schema: &Value) -> Result<Self> {
        let validator =
            jsonschema::validator_for(schema).map_err(|e| CrdError::InvalidJsonSchema {
                message: e.to_string(),
            })?;
        Ok(Self { validator })
    }

    /// Validate against the storage version of a CRD
    ///
    /// Objects are left open so that fields the CRD prunes are not reported.
    pub fn from_crd(crd: &CustomResourceDefinition) -> Result<Self> {
        let schema = JsonSchemaTranslator::new(false).translate(crd, None)?;
        Self::new(&schema)
    }

    pub fn validate(&self, instance: &Value) -> ValidationResult {
        if self.validator.is_valid(instance) {
            return ValidationResult::default();
        }

        let errors = self
            .validator
            .iter_errors(instance)
            .map(|e| {
                let path = e.instance_path.to_string();
                ValidationIssue {
                    path: if path.is_empty() {
                        "(root)".to_string()
                    } else {
                        path
                    },
                    message: e.to_string().replace('"', "'"),
                }
            })
            .collect();

        ValidationResult { errors }
    }
}
