//! Kubebuilder-style validation markers
//!
//! Markers come from field head comments (`# +kubebuilder:validation:Minimum=1`)
//! and are applied to the OpenAPI property generated for that field. For list
//! fields, constraints on values land on `items` while item-count constraints
//! stay on the array itself.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    JSON, JSONSchemaProps, JSONSchemaPropsOrArray,
};
use miaka_core::Field;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{CrdError, Result};

static MARKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+(?:kubebuilder:(?:validation:|pruning:)?)?([A-Za-z]+)(?::?=(.*))?$")
        .expect("valid marker pattern")
});

/// Whether a field must be present in instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requirement {
    #[default]
    Optional,
    Required,
}

/// A recognized marker with its parsed argument
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    Minimum(f64),
    Maximum(f64),
    ExclusiveMinimum(bool),
    ExclusiveMaximum(bool),
    MultipleOf(f64),
    MinLength(i64),
    MaxLength(i64),
    Pattern(String),
    Format(String),
    Enum(Vec<Value>),
    IntOrString,
    MinItems(i64),
    MaxItems(i64),
    UniqueItems(bool),
    MinProperties(i64),
    MaxProperties(i64),
    Default(Value),
    Nullable,
    PreserveUnknownFields,
    ListType(String),
    ListMapKey(String),
    Require(Requirement),
}

impl Marker {
    /// Parse one marker line
    ///
    /// Returns `Ok(None)` for markers this generator does not know about and
    /// `Err` with a reason when a known marker has a malformed argument.
    ///
    /// ```rust
    /// use miaka_crd::markers::Marker;
    ///
    /// assert_eq!(
    ///     Marker::parse("+kubebuilder:validation:Minimum=1").unwrap(),
    ///     Some(Marker::Minimum(1.0))
    /// );
    /// assert_eq!(Marker::parse("+kubebuilder:object:root=true").unwrap(), None);
    /// ```
    pub fn parse(raw: &str) -> std::result::Result<Option<Self>, String> {
        let Some(caps) = MARKER_PATTERN.captures(raw.trim()) else {
            return Ok(None);
        };

        let name = caps[1].to_ascii_lowercase();
        let arg = caps.get(2).map(|m| m.as_str().trim());
        let required = || arg.filter(|a| !a.is_empty()).ok_or("missing value");

        let marker = match name.as_str() {
            "minimum" => Self::Minimum(number(required()?)?),
            "maximum" => Self::Maximum(number(required()?)?),
            "multipleof" => Self::MultipleOf(number(required()?)?),
            "exclusiveminimum" => Self::ExclusiveMinimum(flag(arg)?),
            "exclusivemaximum" => Self::ExclusiveMaximum(flag(arg)?),
            "minlength" => Self::MinLength(count(required()?)?),
            "maxlength" => Self::MaxLength(count(required()?)?),
            "minitems" => Self::MinItems(count(required()?)?),
            "maxitems" => Self::MaxItems(count(required()?)?),
            "minproperties" => Self::MinProperties(count(required()?)?),
            "maxproperties" => Self::MaxProperties(count(required()?)?),
            "uniqueitems" => Self::UniqueItems(flag(arg)?),
            "pattern" => Self::Pattern(unquote(required()?).to_string()),
            "format" => Self::Format(unquote(required()?).to_string()),
            "enum" => Self::Enum(
                required()?
                    .split(';')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(scalar)
                    .collect(),
            ),
            "xintorstring" => Self::IntOrString,
            "default" => Self::Default(document(required()?)?),
            "nullable" => Self::Nullable,
            "preserveunknownfields" => Self::PreserveUnknownFields,
            "listtype" => match required()? {
                t @ ("atomic" | "set" | "map") => Self::ListType(t.to_string()),
                other => return Err(format!("unknown list type '{}'", other)),
            },
            "listmapkey" => Self::ListMapKey(required()?.to_string()),
            "required" => Self::Require(Requirement::Required),
            "optional" => Self::Require(Requirement::Optional),
            _ => return Ok(None),
        };

        Ok(Some(marker))
    }

    /// Constraints on values rather than on the field as a whole
    fn targets_value(&self) -> bool {
        matches!(
            self,
            Self::Minimum(_)
                | Self::Maximum(_)
                | Self::ExclusiveMinimum(_)
                | Self::ExclusiveMaximum(_)
                | Self::MultipleOf(_)
                | Self::MinLength(_)
                | Self::MaxLength(_)
                | Self::Pattern(_)
                | Self::Format(_)
                | Self::Enum(_)
                | Self::IntOrString
        )
    }

    fn requires_list(&self) -> bool {
        matches!(
            self,
            Self::MinItems(_)
                | Self::MaxItems(_)
                | Self::UniqueItems(_)
                | Self::ListType(_)
                | Self::ListMapKey(_)
        )
    }

    fn apply(&self, props: &mut JSONSchemaProps) {
        match self {
            Self::Minimum(v) => props.minimum = Some(*v),
            Self::Maximum(v) => props.maximum = Some(*v),
            Self::ExclusiveMinimum(v) => props.exclusive_minimum = Some(*v),
            Self::ExclusiveMaximum(v) => props.exclusive_maximum = Some(*v),
            Self::MultipleOf(v) => props.multiple_of = Some(*v),
            Self::MinLength(v) => props.min_length = Some(*v),
            Self::MaxLength(v) => props.max_length = Some(*v),
            Self::Pattern(p) => props.pattern = Some(p.clone()),
            Self::Format(f) => props.format = Some(f.clone()),
            Self::Enum(values) => {
                props.enum_ = Some(values.iter().cloned().map(JSON).collect());
            }
            Self::IntOrString => *props = int_or_string(props.description.take()),
            Self::MinItems(v) => props.min_items = Some(*v),
            Self::MaxItems(v) => props.max_items = Some(*v),
            Self::UniqueItems(v) => props.unique_items = Some(*v),
            Self::MinProperties(v) => props.min_properties = Some(*v),
            Self::MaxProperties(v) => props.max_properties = Some(*v),
            Self::Default(v) => props.default = Some(JSON(v.clone())),
            Self::Nullable => props.nullable = Some(true),
            Self::PreserveUnknownFields => {
                props.x_kubernetes_preserve_unknown_fields = Some(true);
            }
            Self::ListType(t) => props.x_kubernetes_list_type = Some(t.clone()),
            Self::ListMapKey(key) => props
                .x_kubernetes_list_map_keys
                .get_or_insert_with(Vec::new)
                .push(key.clone()),
            Self::Require(_) => {}
        }
    }
}

/// Property accepting an integer or a string
pub fn int_or_string(description: Option<String>) -> JSONSchemaProps {
    let typed = |t: &str| JSONSchemaProps {
        type_: Some(t.to_string()),
        ..Default::default()
    };

    JSONSchemaProps {
        description,
        any_of: Some(vec![typed("integer"), typed("string")]),
        x_kubernetes_int_or_string: Some(true),
        ..Default::default()
    }
}

/// Apply the markers of `field` to its generated property
///
/// Returns whether the field ends up required; the last of `+required` and
/// `+optional` wins.
pub fn apply_markers(field: &Field, props: &mut JSONSchemaProps) -> Result<Requirement> {
    let is_list = field.field_type.is_list();
    let mut markers = Vec::new();

    for raw in &field.markers {
        let invalid = |reason: String| CrdError::InvalidMarker {
            marker: raw.clone(),
            path: field.source_path.clone(),
            reason,
        };

        match Marker::parse(raw).map_err(invalid)? {
            Some(marker) if marker.requires_list() && !is_list => {
                return Err(invalid("applies to list fields only".to_string()));
            }
            Some(marker) => markers.push(marker),
            None => debug!(marker = %raw, path = %field.source_path, "Skipping unrecognized marker"),
        }
    }

    let mut items = if is_list { props.items.take() } else { None };
    {
        let target = match items.as_mut() {
            Some(JSONSchemaPropsOrArray::Schema(element)) => element.as_mut(),
            _ => &mut *props,
        };
        // int-or-string replaces the property, so it goes before the
        // markers that refine it
        let (replacing, refining): (Vec<_>, Vec<_>) = markers
            .iter()
            .filter(|m| m.targets_value())
            .partition(|m| matches!(m, Marker::IntOrString));
        for marker in replacing.into_iter().chain(refining) {
            marker.apply(target);
        }
    }
    if items.is_some() {
        props.items = items;
    }

    let mut requirement = Requirement::default();
    for marker in markers.iter().filter(|m| !m.targets_value()) {
        match marker {
            Marker::Require(r) => requirement = *r,
            other => other.apply(props),
        }
    }

    Ok(requirement)
}

fn number(arg: &str) -> std::result::Result<f64, String> {
    arg.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("'{}' is not a number", arg))
}

fn count(arg: &str) -> std::result::Result<i64, String> {
    arg.parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| format!("'{}' is not a non-negative integer", arg))
}

fn flag(arg: Option<&str>) -> std::result::Result<bool, String> {
    match arg {
        None | Some("") | Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(format!("'{}' is not a boolean", other)),
    }
}

fn unquote(arg: &str) -> &str {
    ['`', '"', '\'']
        .iter()
        .find_map(|q| arg.strip_prefix(*q).and_then(|rest| rest.strip_suffix(*q)))
        .unwrap_or(arg)
}

/// Enum entries: YAML scalars, anything else kept as text
fn scalar(arg: &str) -> Value {
    match serde_yaml::from_str::<Value>(arg) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => value,
        _ => Value::String(unquote(arg).to_string()),
    }
}

fn document(arg: &str) -> std::result::Result<Value, String> {
    serde_yaml::from_str::<Value>(arg).map_err(|e| format!("invalid default: {}", e))
}
