//! Type descriptors for inferred fields
//!
//! A field is either a single value ([`FieldType::Single`]) or a list of
//! values ([`FieldType::List`]). The element type of a list is only reachable
//! through the `List` variant, so a scalar field can never carry one.

use serde::{Serialize, Serializer};
use std::fmt;

// =============================================================================
// TYPE REFERENCES
// =============================================================================

/// The type of a single value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Integer,
    Float,
    String,
    Boolean,
    /// Reference to a struct built from a nested mapping
    Struct(String),
    /// `map[string]<value>` from a type hint
    Map(Box<FieldType>),
    /// List element that is itself a list, from a hint such as `[][]string`
    List(Box<TypeRef>),
    /// Any other hinted type, kept verbatim (e.g. `intstr.IntOrString`)
    Named(String),
    /// No example value and no hint
    Unknown,
}

impl TypeRef {
    /// Parse a hint expression that denotes a single value
    ///
    /// Scalar aliases map onto the built-in variants, `map[string]T` becomes
    /// [`TypeRef::Map`], `[]T` becomes [`TypeRef::List`], everything else is
    /// kept as [`TypeRef::Named`].
    pub fn from_hint(expr: &str) -> Self {
        let expr = expr.trim();

        if let Some(element) = expr.strip_prefix("[]") {
            return Self::List(Box::new(Self::from_hint(element)));
        }

        if let Some(value) = expr.strip_prefix("map[string]") {
            return Self::Map(Box::new(FieldType::from_hint(value)));
        }

        match expr {
            "int" | "int8" | "int16" | "int32" | "int64" | "integer" | "uint" | "uint8"
            | "uint16" | "uint32" | "uint64" => Self::Integer,
            "float" | "float32" | "float64" | "number" | "double" => Self::Float,
            "bool" | "boolean" => Self::Boolean,
            "string" | "str" => Self::String,
            other => Self::Named(other.to_string()),
        }
    }

    /// Returns true if no type could be determined
    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Name of the referenced struct, if any
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Struct(name) => write!(f, "{}", name),
            Self::Map(value) => write!(f, "map[string]{}", value),
            Self::List(element) => write!(f, "[]{}", element),
            Self::Named(name) => write!(f, "{}", name),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// =============================================================================
// FIELD TYPES
// =============================================================================

/// The full type of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Single(TypeRef),
    List(TypeRef),
}

impl FieldType {
    /// Parse a type hint; a `[]` prefix denotes a list
    pub fn from_hint(expr: &str) -> Self {
        let expr = expr.trim();
        match expr.strip_prefix("[]") {
            Some(element) => Self::List(TypeRef::from_hint(element)),
            None => Self::Single(TypeRef::from_hint(expr)),
        }
    }

    /// Parse a hint attached to a sequence value
    ///
    /// `[]T` is taken as the whole list type, a bare `T` as the element type.
    /// A bare hint naming a type that is itself meant as the field type is
    /// therefore still wrapped in a list. `[][]T` is a list whose elements
    /// are [`TypeRef::List`].
    pub fn from_sequence_hint(expr: &str) -> Self {
        match Self::from_hint(expr) {
            Self::List(element) | Self::Single(element) => Self::List(element),
        }
    }

    /// Element type, only for lists
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            Self::List(element) => Some(element),
            Self::Single(_) => None,
        }
    }

    /// The single value type, or the element type for lists
    pub fn base(&self) -> &TypeRef {
        match self {
            Self::Single(ty) | Self::List(ty) => ty,
        }
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ty) => write!(f, "{}", ty),
            Self::List(element) => write!(f, "[]{}", element),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
