//! OpenAPI v3 to JSON Schema translation
//!
//! Helm validates `values.yaml` against `values.schema.json`, a plain JSON
//! Schema document. The CRD's structural schema is close to that but uses
//! OpenAPI flavored keywords (`nullable`, boolean `exclusiveMinimum`,
//! `x-kubernetes-*` extensions) that need rewriting.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde_json::{Map, Value, json};

use crate::error::{CrdError, Result};

pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Translates a CRD version's schema into a draft-07 JSON Schema
#[derive(Debug, Clone, Copy)]
pub struct JsonSchemaTranslator {
    /// Close objects that declare properties
    strict: bool,
}

impl Default for JsonSchemaTranslator {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl JsonSchemaTranslator {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Translate `version`, or the storage version when `None`
    pub fn translate(&self, crd: &CustomResourceDefinition, version: Option<&str>) -> Result<Value> {
        let versions = &crd.spec.versions;
        let chosen = match version {
            Some(name) => versions.iter().find(|v| v.name == name),
            None => versions.iter().find(|v| v.storage).or(versions.first()),
        }
        .ok_or_else(|| CrdError::VersionNotFound {
            version: version.unwrap_or("<storage>").to_string(),
        })?;

        let open_api = chosen
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .ok_or_else(|| CrdError::MissingSchema {
                version: chosen.name.clone(),
            })?;

        let mut document = self.convert(serde_json::to_value(open_api)?);
        if let Value::Object(map) = &mut document {
            let mut header = Map::new();
            header.insert("$schema".to_string(), json!(DRAFT_07));
            header.insert("title".to_string(), json!(crd.spec.names.kind));
            header.append(map);
            *map = header;
        }

        Ok(document)
    }

    /// Rewrite one OpenAPI node and everything below it
    pub fn convert(&self, node: Value) -> Value {
        let Value::Object(mut map) = node else {
            return node;
        };

        let flag = |map: &mut Map<String, Value>, key: &str| {
            map.remove(key).and_then(|v| v.as_bool()).unwrap_or(false)
        };
        let nullable = flag(&mut map, "nullable");
        let int_or_string = flag(&mut map, "x-kubernetes-int-or-string");
        let preserve_unknown = flag(&mut map, "x-kubernetes-preserve-unknown-fields");
        map.retain(|key, _| !key.starts_with("x-kubernetes-"));

        if int_or_string {
            map.remove("type");
            map.insert(
                "anyOf".to_string(),
                json!([{"type": "integer"}, {"type": "string"}]),
            );
        }

        for (bound, exclusive) in [("minimum", "exclusiveMinimum"), ("maximum", "exclusiveMaximum")] {
            match map.remove(exclusive) {
                Some(Value::Bool(true)) => {
                    if let Some(limit) = map.remove(bound) {
                        map.insert(exclusive.to_string(), limit);
                    }
                }
                Some(Value::Number(limit)) => {
                    map.insert(exclusive.to_string(), Value::Number(limit));
                }
                _ => {}
            }
        }

        if let Some(Value::Object(properties)) = map.get_mut("properties") {
            for value in properties.values_mut() {
                *value = self.convert(value.take());
            }
        }
        for key in ["items", "additionalProperties", "not"] {
            if let Some(value) = map.get_mut(key) {
                if value.is_object() {
                    *value = self.convert(value.take());
                }
            }
        }
        for key in ["anyOf", "allOf", "oneOf"] {
            if let Some(Value::Array(branches)) = map.get_mut(key) {
                for branch in branches.iter_mut() {
                    *branch = self.convert(branch.take());
                }
            }
        }

        let declares_properties = map
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|p| !p.is_empty());
        if self.strict
            && declares_properties
            && !preserve_unknown
            && !map.contains_key("additionalProperties")
        {
            map.insert("additionalProperties".to_string(), Value::Bool(false));
        }

        if nullable {
            allow_null(&mut map);
        }

        Value::Object(map)
    }
}

fn allow_null(map: &mut Map<String, Value>) {
    if let Some(Value::Array(branches)) = map.get_mut("anyOf") {
        branches.push(json!({"type": "null"}));
        return;
    }

    match map.remove("type") {
        Some(Value::String(t)) => {
            map.insert("type".to_string(), json!([t, "null"]));
        }
        Some(other) => {
            map.insert("type".to_string(), other);
        }
        // Untyped nodes already accept null
        None => {}
    }

    if let Some(Value::Array(values)) = map.get_mut("enum") {
        if !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
    }
}
