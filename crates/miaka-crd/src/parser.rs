//! CRD manifest parser
//!
//! Reads a CustomResourceDefinition (YAML text, a JSON value, or a typed
//! k8s-openapi object) into a [`CrdSchema`] for comparison.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde_json::Value;

use crate::error::{CrdError, Result};
use crate::schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdScope, CrdVersionSchema, PropertyType,
    SchemaProperty,
};

pub struct CrdParser;

impl CrdParser {
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::parse_value(&value)
    }

    /// Parse a generated CRD
    pub fn from_crd(crd: &CustomResourceDefinition) -> Result<CrdSchema> {
        let value = serde_json::to_value(crd)?;
        Self::parse_value(&value)
    }

    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CrdError::InvalidCrd("missing 'kind'".to_string()))?;

        if kind != "CustomResourceDefinition" {
            return Err(CrdError::InvalidCrd(format!(
                "expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let name = required_str(value, &["metadata", "name"])?;
        let spec = value
            .get("spec")
            .ok_or_else(|| CrdError::InvalidCrd("missing 'spec'".to_string()))?;
        let group = required_str(spec, &["group"])?;

        let scope = match spec.get("scope").and_then(Value::as_str) {
            Some("Cluster") => CrdScope::Cluster,
            _ => CrdScope::Namespaced,
        };

        let names = Self::parse_names(spec.get("names"))?;

        let versions = spec
            .get("versions")
            .and_then(Value::as_array)
            .ok_or_else(|| CrdError::InvalidCrd("missing 'spec.versions'".to_string()))?
            .iter()
            .map(Self::parse_version)
            .collect::<Result<Vec<_>>>()?;

        Ok(CrdSchema {
            name,
            group,
            scope,
            names,
            versions,
        })
    }

    fn parse_names(names: Option<&Value>) -> Result<CrdNames> {
        let names =
            names.ok_or_else(|| CrdError::InvalidCrd("missing 'spec.names'".to_string()))?;

        Ok(CrdNames {
            kind: required_str(names, &["kind"])?,
            plural: required_str(names, &["plural"])?,
            singular: optional_str(names, "singular"),
            short_names: string_list(names.get("shortNames")),
            list_kind: optional_str(names, "listKind"),
            categories: string_list(names.get("categories")),
        })
    }

    fn parse_version(version: &Value) -> Result<CrdVersionSchema> {
        Ok(CrdVersionSchema {
            name: required_str(version, &["name"])?,
            served: version
                .get("served")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            storage: version
                .get("storage")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            schema: version
                .get("schema")
                .and_then(|s| s.get("openAPIV3Schema"))
                .map(Self::parse_property),
        })
    }

    /// Parse one property and everything below it
    pub fn parse_property(prop: &Value) -> SchemaProperty {
        let flag = |key: &str| prop.get(key).and_then(Value::as_bool).unwrap_or(false);

        let preserve_unknown = flag("x-kubernetes-preserve-unknown-fields");
        let type_ = match prop.get("type").and_then(Value::as_str) {
            _ if flag("x-kubernetes-int-or-string") => PropertyType::IntOrString,
            Some(t) => PropertyType::parse(t),
            None if preserve_unknown => PropertyType::Any,
            None => PropertyType::default(),
        };

        // OpenAPI v3 uses boolean exclusivity; JSON Schema uses the bound itself
        let (minimum, exclusive_minimum) =
            bound(prop.get("minimum"), prop.get("exclusiveMinimum"));
        let (maximum, exclusive_maximum) =
            bound(prop.get("maximum"), prop.get("exclusiveMaximum"));

        let additional_properties = prop.get("additionalProperties").map(|v| match v {
            Value::Bool(true) => AdditionalProperties::Allowed,
            Value::Bool(false) => AdditionalProperties::Denied,
            schema => AdditionalProperties::Schema(Box::new(Self::parse_property(schema))),
        });

        SchemaProperty {
            type_,
            description: optional_str(prop, "description"),
            default: prop.get("default").cloned(),
            format: optional_str(prop, "format"),
            pattern: optional_str(prop, "pattern"),
            enum_values: prop.get("enum").and_then(Value::as_array).cloned(),
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
            multiple_of: prop.get("multipleOf").and_then(Value::as_f64),
            min_length: prop.get("minLength").and_then(Value::as_u64),
            max_length: prop.get("maxLength").and_then(Value::as_u64),
            min_items: prop.get("minItems").and_then(Value::as_u64),
            max_items: prop.get("maxItems").and_then(Value::as_u64),
            unique_items: flag("uniqueItems"),
            min_properties: prop.get("minProperties").and_then(Value::as_u64),
            max_properties: prop.get("maxProperties").and_then(Value::as_u64),
            nullable: flag("nullable"),
            properties: prop
                .get("properties")
                .and_then(Value::as_object)
                .map(|obj| {
                    obj.iter()
                        .map(|(k, v)| (k.clone(), Self::parse_property(v)))
                        .collect()
                })
                .unwrap_or_default(),
            required: string_list(prop.get("required")),
            items: prop
                .get("items")
                .map(|v| Box::new(Self::parse_property(v))),
            additional_properties,
            preserve_unknown,
        }
    }
}

fn bound(limit: Option<&Value>, exclusive: Option<&Value>) -> (Option<f64>, bool) {
    match exclusive {
        Some(Value::Number(n)) => (n.as_f64(), true),
        Some(Value::Bool(b)) => (limit.and_then(Value::as_f64), *b),
        _ => (limit.and_then(Value::as_f64), false),
    }
}

fn required_str(value: &Value, path: &[&str]) -> Result<String> {
    path.iter()
        .try_fold(value, |node, key| node.get(key))
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| CrdError::InvalidCrd(format!("missing '{}'", path.join("."))))
}

fn optional_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: webapps.example.com
spec:
  group: example.com
  scope: Namespaced
  names:
    kind: WebApp
    plural: webapps
    singular: webapp
    listKind: WebAppList
    shortNames: [wa]
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            replicaCount:
              type: integer
              minimum: 1
              maximum: 10
              exclusiveMaximum: true
            port:
              x-kubernetes-int-or-string: true
              anyOf:
                - type: integer
                - type: string
            extra:
              x-kubernetes-preserve-unknown-fields: true
            labels:
              type: object
              additionalProperties:
                type: string
            image:
              type: object
              required: [repository]
              properties:
                repository:
                  type: string
                  pattern: "^[a-z/]+$"
                pullPolicy:
                  type: string
                  enum: [Always, IfNotPresent]
"#;

    #[test]
    fn test_parse_crd() {
        let crd = CrdParser::parse(SAMPLE_CRD).unwrap();

        assert_eq!(crd.name, "webapps.example.com");
        assert_eq!(crd.group, "example.com");
        assert_eq!(crd.scope, CrdScope::Namespaced);
        assert_eq!(crd.names.kind, "WebApp");
        assert_eq!(crd.names.short_names, vec!["wa"]);
        assert_eq!(crd.names.list_kind.as_deref(), Some("WebAppList"));
        assert_eq!(crd.storage_version().unwrap().name, "v1");
    }

    #[test]
    fn test_parse_properties() {
        let crd = CrdParser::parse(SAMPLE_CRD).unwrap();
        let root = crd.version("v1").unwrap().schema.as_ref().unwrap();

        let replicas = &root.properties["replicaCount"];
        assert_eq!(replicas.type_, PropertyType::Integer);
        assert_eq!(replicas.minimum, Some(1.0));
        assert_eq!(replicas.maximum, Some(10.0));
        assert!(replicas.exclusive_maximum);
        assert!(!replicas.exclusive_minimum);

        assert_eq!(root.properties["port"].type_, PropertyType::IntOrString);
        assert_eq!(root.properties["extra"].type_, PropertyType::Any);

        let labels = &root.properties["labels"];
        assert!(matches!(
            labels.additional_properties,
            Some(AdditionalProperties::Schema(ref s)) if s.type_ == PropertyType::String
        ));

        let image = &root.properties["image"];
        assert!(image.is_required("repository"));
        assert_eq!(
            image.get_nested("pullPolicy").unwrap().enum_values.as_ref().unwrap().len(),
            2
        );
    }

    #[test]
    fn test_json_schema_style_bounds() {
        let prop = CrdParser::parse_property(&serde_json::json!({
            "type": "number",
            "exclusiveMinimum": 0
        }));

        assert_eq!(prop.minimum, Some(0.0));
        assert!(prop.exclusive_minimum);
    }

    #[test]
    fn test_rejects_other_kinds() {
        let err = CrdParser::parse("apiVersion: v1\nkind: ConfigMap\n").unwrap_err();
        assert!(err.to_string().contains("ConfigMap"));

        let err = CrdParser::parse("kind: CustomResourceDefinition\nmetadata: {}\n").unwrap_err();
        assert!(err.to_string().contains("metadata.name"));
    }
}
