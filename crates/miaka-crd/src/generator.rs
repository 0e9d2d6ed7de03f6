//! CustomResourceDefinition generation
//!
//! Maps an inferred [`Schema`] onto a `apiextensions.k8s.io/v1` CRD with a
//! single served storage version. The root struct's fields become top-level
//! properties of the resource, next to `apiVersion`, `kind` and `metadata`.

use std::collections::BTreeMap;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionNames, CustomResourceDefinitionSpec,
    CustomResourceDefinitionVersion, CustomResourceValidation, JSONSchemaProps,
    JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use miaka_core::{FieldType, Schema, StructDef, TypeRef};
use tracing::{debug, info};

use crate::error::{CrdError, Result};
use crate::markers::{Requirement, apply_markers, int_or_string};
use crate::options::{CrdOptions, pluralize};

/// Generates CRDs from inferred schemas
#[derive(Debug, Clone, Default)]
pub struct CrdGenerator {
    options: CrdOptions,
}

impl CrdGenerator {
    pub fn new(options: CrdOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CrdOptions {
        &self.options
    }

    /// Group and version, preferring the values document over the options
    pub fn group_version(&self, schema: &Schema) -> Result<(String, String)> {
        let pick = |from_schema: &str, configured: &Option<String>| {
            Some(from_schema.trim())
                .filter(|s| !s.is_empty())
                .or_else(|| configured.as_deref().map(str::trim).filter(|s| !s.is_empty()))
                .map(String::from)
        };

        let gv = &schema.api_group_version;
        let group = pick(&gv.group, &self.options.group).ok_or_else(|| CrdError::MissingGroup {
            kind: schema.resource_kind.clone(),
        })?;
        let version =
            pick(&gv.version, &self.options.version).ok_or_else(|| CrdError::MissingVersion {
                kind: schema.resource_kind.clone(),
            })?;

        Ok((group, version))
    }

    pub fn names(&self, kind: &str) -> CustomResourceDefinitionNames {
        let singular = self
            .options
            .singular
            .clone()
            .unwrap_or_else(|| kind.to_lowercase());
        let plural = self
            .options
            .plural
            .clone()
            .unwrap_or_else(|| pluralize(&kind.to_lowercase()));

        CustomResourceDefinitionNames {
            kind: kind.to_string(),
            list_kind: Some(format!("{}List", kind)),
            plural,
            singular: Some(singular),
            short_names: non_empty(&self.options.short_names),
            categories: non_empty(&self.options.categories),
        }
    }

    /// `<plural>.<group>`, the CRD's object name
    pub fn crd_name(&self, schema: &Schema) -> Result<String> {
        let (group, _) = self.group_version(schema)?;
        Ok(format!("{}.{}", self.names(&schema.resource_kind).plural, group))
    }

    pub fn generate(&self, schema: &Schema) -> Result<CustomResourceDefinition> {
        let (group, version) = self.group_version(schema)?;
        let names = self.names(&schema.resource_kind);
        let name = format!("{}.{}", names.plural, group);

        let root = schema.root().ok_or_else(|| CrdError::MissingRootStruct {
            kind: schema.resource_kind.clone(),
        })?;

        let mut open_api = Resolver::new(schema).struct_props(root)?;
        open_api.x_kubernetes_preserve_unknown_fields = None;
        let properties = open_api.properties.get_or_insert_with(BTreeMap::new);
        properties.insert(
            "apiVersion".to_string(),
            described("string", "APIVersion defines the versioned schema of this representation of an object."),
        );
        properties.insert(
            "kind".to_string(),
            described("string", "Kind is a string value representing the REST resource this object represents."),
        );
        properties.insert("metadata".to_string(), typed("object"));
        if !root.documentation.is_empty() {
            open_api.description = Some(root.documentation.join("\n"));
        }

        info!(crd = %name, version = %version, fields = root.fields.len(), "Generated CRD");

        Ok(CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some(name),
                ..Default::default()
            },
            spec: CustomResourceDefinitionSpec {
                group,
                names,
                scope: self.options.scope.to_string(),
                versions: vec![CustomResourceDefinitionVersion {
                    name: version,
                    served: true,
                    storage: true,
                    schema: Some(CustomResourceValidation {
                        open_api_v3_schema: Some(open_api),
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            },
            status: None,
        })
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn typed(type_: &str) -> JSONSchemaProps {
    JSONSchemaProps {
        type_: Some(type_.to_string()),
        ..Default::default()
    }
}

fn described(type_: &str, description: &str) -> JSONSchemaProps {
    JSONSchemaProps {
        description: Some(description.to_string()),
        ..typed(type_)
    }
}

fn array(items: JSONSchemaProps) -> JSONSchemaProps {
    JSONSchemaProps {
        items: Some(JSONSchemaPropsOrArray::Schema(Box::new(items))),
        ..typed("array")
    }
}

fn preserve_unknown(type_: Option<&str>) -> JSONSchemaProps {
    JSONSchemaProps {
        type_: type_.map(String::from),
        x_kubernetes_preserve_unknown_fields: Some(true),
        ..Default::default()
    }
}

/// Turns struct references into nested object schemas
struct Resolver<'s> {
    schema: &'s Schema,
    /// Structs currently being expanded, to catch cycles
    visiting: Vec<String>,
}

impl<'s> Resolver<'s> {
    fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            visiting: Vec::new(),
        }
    }

    fn struct_props(&mut self, def: &'s StructDef) -> Result<JSONSchemaProps> {
        if self.visiting.iter().any(|name| *name == def.name) {
            return Err(CrdError::RecursiveType {
                name: def.name.clone(),
            });
        }

        // An empty mapping in values.yaml is a placeholder for free-form content
        if def.fields.is_empty() {
            return Ok(preserve_unknown(Some("object")));
        }

        self.visiting.push(def.name.clone());

        let mut properties = BTreeMap::new();
        let mut required = Vec::new();

        for field in &def.fields {
            let mut props = self.field_props(&field.field_type, &field.source_path)?;
            if !field.documentation.is_empty() {
                props.description = Some(field.documentation.join("\n"));
            }
            if apply_markers(field, &mut props)? == Requirement::Required {
                required.push(field.source_key.clone());
            }
            properties.insert(field.source_key.clone(), props);
        }

        self.visiting.pop();

        Ok(JSONSchemaProps {
            properties: Some(properties),
            required: non_empty(&required),
            ..typed("object")
        })
    }

    fn field_props(&mut self, field_type: &FieldType, path: &str) -> Result<JSONSchemaProps> {
        match field_type {
            FieldType::Single(ty) => self.type_props(ty, path),
            FieldType::List(element) => Ok(array(self.type_props(element, path)?)),
        }
    }

    fn type_props(&mut self, ty: &TypeRef, path: &str) -> Result<JSONSchemaProps> {
        match ty {
            TypeRef::Integer => Ok(JSONSchemaProps {
                format: Some("int64".to_string()),
                ..typed("integer")
            }),
            TypeRef::Float => Ok(typed("number")),
            TypeRef::String => Ok(typed("string")),
            TypeRef::Boolean => Ok(typed("boolean")),
            TypeRef::Struct(name) => self.struct_by_name(name, path),
            TypeRef::Map(value) => Ok(JSONSchemaProps {
                additional_properties: Some(JSONSchemaPropsOrBool::Schema(Box::new(
                    self.field_props(value, path)?,
                ))),
                ..typed("object")
            }),
            TypeRef::List(element) => Ok(array(self.type_props(element, path)?)),
            TypeRef::Named(name) => self.named_props(name, path),
            TypeRef::Unknown => Err(CrdError::UnknownType {
                path: path.to_string(),
            }),
        }
    }

    fn struct_by_name(&mut self, name: &str, path: &str) -> Result<JSONSchemaProps> {
        let schema = self.schema;
        let def = schema
            .find_struct(name)
            .ok_or_else(|| CrdError::UnresolvedType {
                name: name.to_string(),
                path: path.to_string(),
            })?;
        self.struct_props(def)
    }

    /// Hinted types that are not built-in scalars
    fn named_props(&mut self, name: &str, path: &str) -> Result<JSONSchemaProps> {
        if self.schema.find_struct(name).is_some() {
            return self.struct_by_name(name, path);
        }

        let base = name.rsplit('.').next().unwrap_or(name);
        let props = match base.to_ascii_lowercase().as_str() {
            "intorstring" | "quantity" => int_or_string(None),
            "time" | "datetime" | "date-time" => JSONSchemaProps {
                format: Some("date-time".to_string()),
                ..typed("string")
            },
            "duration" => typed("string"),
            "any" | "interface{}" | "json" => preserve_unknown(None),
            "rawextension" | "object" => preserve_unknown(Some("object")),
            _ => {
                return Err(CrdError::UnresolvedType {
                    name: name.to_string(),
                    path: path.to_string(),
                });
            }
        };

        debug!(hint = %name, path = %path, "Resolved named type");
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CrdScope;
    use miaka_core::SchemaBuilder;

    fn schema(yaml: &str) -> Schema {
        SchemaBuilder::default().build(yaml).unwrap()
    }

    fn generate(yaml: &str) -> CustomResourceDefinition {
        CrdGenerator::default().generate(&schema(yaml)).unwrap()
    }

    fn root_props(crd: &CustomResourceDefinition) -> &BTreeMap<String, JSONSchemaProps> {
        crd.spec.versions[0]
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .and_then(|s| s.properties.as_ref())
            .unwrap()
    }

    #[test]
    fn test_names_and_metadata() {
        let crd = generate("apiVersion: example.com/v1alpha1\nkind: Policy\nenabled: true\n");

        assert_eq!(crd.metadata.name.as_deref(), Some("policies.example.com"));
        assert_eq!(crd.spec.group, "example.com");
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.names.kind, "Policy");
        assert_eq!(crd.spec.names.plural, "policies");
        assert_eq!(crd.spec.names.singular.as_deref(), Some("policy"));
        assert_eq!(crd.spec.names.list_kind.as_deref(), Some("PolicyList"));
        assert_eq!(crd.spec.versions.len(), 1);
        assert_eq!(crd.spec.versions[0].name, "v1alpha1");
        assert!(crd.spec.versions[0].served && crd.spec.versions[0].storage);
    }

    #[test]
    fn test_options_fill_in_group_and_version() {
        let options = CrdOptions {
            group: Some("charts.example.com".to_string()),
            version: Some("v1".to_string()),
            plural: Some("webapplications".to_string()),
            scope: CrdScope::Cluster,
            short_names: vec!["wa".to_string()],
            ..Default::default()
        };

        let crd = CrdGenerator::new(options)
            .generate(&schema("kind: WebApp\nport: 80\n"))
            .unwrap();

        assert_eq!(crd.metadata.name.as_deref(), Some("webapplications.charts.example.com"));
        assert_eq!(crd.spec.scope, "Cluster");
        assert_eq!(crd.spec.names.short_names, Some(vec!["wa".to_string()]));
        assert_eq!(crd.spec.versions[0].name, "v1");
    }

    #[test]
    fn test_missing_group() {
        let err = CrdGenerator::default()
            .generate(&schema("apiVersion: v1\nkind: Demo\n"))
            .unwrap_err();
        assert!(matches!(err, CrdError::MissingGroup { ref kind } if kind == "Demo"));

        let err = CrdGenerator::default()
            .generate(&schema("kind: Demo\n"))
            .unwrap_err();
        assert!(matches!(err, CrdError::MissingGroup { .. }));
    }

    #[test]
    fn test_field_mapping() {
        let crd = generate(
            r#"
apiVersion: example.com/v1
kind: Demo
# Number of replicas
replicas: 3
ratio: 0.5
name: demo
debug: false
image:
  repository: nginx
# +miaka:type:string
args: []
# +miaka:type:map[string]string
labels: {}
resources: {}
"#,
        );
        let props = root_props(&crd);

        assert_eq!(props["replicas"].type_.as_deref(), Some("integer"));
        assert_eq!(props["replicas"].format.as_deref(), Some("int64"));
        assert_eq!(props["replicas"].description.as_deref(), Some("Number of replicas"));
        assert_eq!(props["ratio"].type_.as_deref(), Some("number"));
        assert_eq!(props["name"].type_.as_deref(), Some("string"));
        assert_eq!(props["debug"].type_.as_deref(), Some("boolean"));

        let image = &props["image"];
        assert_eq!(image.type_.as_deref(), Some("object"));
        assert!(image.properties.as_ref().unwrap().contains_key("repository"));

        assert_eq!(props["args"].type_.as_deref(), Some("array"));
        assert!(matches!(
            props["args"].items,
            Some(JSONSchemaPropsOrArray::Schema(ref s)) if s.type_.as_deref() == Some("string")
        ));

        assert!(matches!(
            props["labels"].additional_properties,
            Some(JSONSchemaPropsOrBool::Schema(ref s)) if s.type_.as_deref() == Some("string")
        ));
        assert_eq!(
            props["resources"].x_kubernetes_preserve_unknown_fields,
            Some(true)
        );

        for builtin in ["apiVersion", "kind", "metadata"] {
            assert!(props.contains_key(builtin));
        }
    }

    #[test]
    fn test_named_types() {
        let crd = generate(
            r#"
apiVersion: example.com/v1
kind: Demo
# +miaka:type:intstr.IntOrString
port: 8080
# +miaka:type:metav1.Time
since: ~
# +miaka:type:runtime.RawExtension
extra: ~
# +miaka:type:[][]string
matrix: [[a]]
"#,
        );
        let props = root_props(&crd);

        assert_eq!(props["port"].x_kubernetes_int_or_string, Some(true));
        assert_eq!(props["port"].type_, None);
        assert_eq!(props["since"].format.as_deref(), Some("date-time"));
        assert_eq!(props["extra"].x_kubernetes_preserve_unknown_fields, Some(true));

        let Some(JSONSchemaPropsOrArray::Schema(rows)) = &props["matrix"].items else {
            panic!("matrix items missing");
        };
        assert_eq!(rows.type_.as_deref(), Some("array"));
        let Some(JSONSchemaPropsOrArray::Schema(cells)) = &rows.items else {
            panic!("matrix row items missing");
        };
        assert_eq!(cells.type_.as_deref(), Some("string"));
    }

    #[test]
    fn test_unresolved_named_type() {
        let err = CrdGenerator::default()
            .generate(&schema(
                "apiVersion: example.com/v1\nkind: Demo\n# +miaka:type:Widget\nthing: ~\n",
            ))
            .unwrap_err();

        assert!(matches!(
            err,
            CrdError::UnresolvedType { ref name, ref path } if name == "Widget" && path == "Demo.thing"
        ));
    }

    #[test]
    fn test_recursive_struct_reference() {
        let err = CrdGenerator::default()
            .generate(&schema(
                r#"
apiVersion: example.com/v1
kind: Demo
node:
  value: 1
  # +miaka:type:NodeSpec
  child: ~
"#,
            ))
            .unwrap_err();

        assert!(matches!(err, CrdError::RecursiveType { ref name } if name == "NodeSpec"));
    }

    #[test]
    fn test_required_markers() {
        let crd = generate(
            r#"
apiVersion: example.com/v1
kind: Demo
# +kubebuilder:validation:Required
host: localhost
port: 80
"#,
        );
        let root = crd.spec.versions[0]
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .unwrap();

        assert_eq!(root.required, Some(vec!["host".to_string()]));
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = CrdGenerator::default()
            .generate(&schema("apiVersion: example.com/v1\nkind: Demo\nitems: []\n"))
            .unwrap_err();

        assert!(matches!(err, CrdError::UnknownType { ref path } if path == "Demo.items"));
    }
}
