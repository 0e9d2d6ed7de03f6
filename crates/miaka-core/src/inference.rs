//! Scalar type inference
//!
//! Maps a single YAML value onto the semantic type used in the schema.
//!
//! # Example
//!
//! ```rust
//! use miaka_core::{TypeRef, infer_scalar};
//!
//! let value: serde_yaml::Value = serde_yaml::from_str("8080").unwrap();
//! assert_eq!(infer_scalar(&value), TypeRef::Integer);
//!
//! let value: serde_yaml::Value = serde_yaml::from_str("3.0").unwrap();
//! assert_eq!(infer_scalar(&value), TypeRef::Integer);
//! ```

use serde_yaml::Value;

use crate::types::TypeRef;

/// Infer the type of a scalar value
///
/// Numbers with no fractional part are integers, other numbers (including
/// NaN and infinities) are floats. Null and collections infer as unknown.
pub fn infer_scalar(value: &Value) -> TypeRef {
    match unwrap_tagged(value) {
        Value::Bool(_) => TypeRef::Boolean,
        Value::String(_) => TypeRef::String,
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return TypeRef::Integer;
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => TypeRef::Integer,
                _ => TypeRef::Float,
            }
        }
        Value::Null | Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            TypeRef::Unknown
        }
    }
}

/// Look through YAML tags (`!!str 5`, `!custom {}`) to the tagged value
pub(crate) fn unwrap_tagged(value: &Value) -> &Value {
    let mut current = value;
    while let Value::Tagged(tagged) = current {
        current = &tagged.value;
    }
    current
}

/// Short name of a value's kind, for error messages
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match unwrap_tagged(value) {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
