//! End-to-end schema inference tests

use miaka_core::{
    BuildOptions, FieldType, SchemaBuilder, SchemaError, TypeRef, UnknownPosition,
    find_unknown_types, infer_schema, validate_schema,
};

fn build(yaml: &str) -> miaka_core::Schema {
    SchemaBuilder::default().build(yaml).unwrap()
}

mod scenarios {
    use super::*;

    #[test]
    fn test_root_fields_and_group_version() {
        let schema = build("{apiVersion: ex.com/v1, kind: Demo, port: 8080, enabled: true}");

        assert_eq!(schema.api_group_version.version, "v1");
        assert_eq!(schema.api_group_version.group, "ex.com");

        let root = schema.root().unwrap();
        assert_eq!(root.name, "Demo");
        assert_eq!(root.fields.len(), 2);
        assert_eq!(root.fields[0].name, "Port");
        assert_eq!(root.fields[0].field_type, FieldType::Single(TypeRef::Integer));
        assert_eq!(root.fields[1].name, "Enabled");
        assert_eq!(root.fields[1].field_type, FieldType::Single(TypeRef::Boolean));
    }

    #[test]
    fn test_empty_list_without_hint_is_reported() {
        let schema = build("kind: Demo\nitems: []\n");

        let entries = find_unknown_types(&schema);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source_key, "items");
        assert_eq!(entries[0].position, UnknownPosition::ListElement);
        assert_eq!(entries[0].path, "Demo.items");
        assert_eq!(entries[0].line, Some(2));

        assert!(matches!(
            validate_schema(&schema, "miaka"),
            Err(SchemaError::UnknownTypes(_))
        ));
    }

    #[test]
    fn test_empty_list_with_hint() {
        let schema = build("kind: Demo\n# +miaka:type:string\nitems: []\n");

        let items = &schema.root().unwrap().fields[0];
        assert_eq!(items.field_type, FieldType::List(TypeRef::String));
        assert_eq!(items.element_type(), Some(&TypeRef::String));
        assert!(items.documentation.is_empty());
        assert!(validate_schema(&schema, "miaka").is_ok());
    }

    #[test]
    fn test_list_items_are_merged() {
        let schema = build(
            r#"
kind: Demo
items:
  - name: a
    type: X
  - name: b
    type: Y
    extra: 1
"#,
        );

        let root = schema.root().unwrap();
        assert_eq!(
            root.fields[0].field_type,
            FieldType::List(TypeRef::Struct("ItemsSpec".to_string()))
        );

        let items = schema.find_struct("ItemsSpec").unwrap();
        let names: Vec<_> = items.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Type", "Extra"]);
        assert_eq!(items.fields[2].field_type, FieldType::Single(TypeRef::Integer));
    }

    #[test]
    fn test_colliding_struct_names_are_disambiguated() {
        let schema = build(
            r#"
kind: Demo
service:
  config:
    port: 80
database:
  config:
    url: postgres://db
"#,
        );

        let service = schema.find_struct("ServiceSpec").unwrap();
        let database = schema.find_struct("DatabaseSpec").unwrap();
        let service_config = service.field("Config").unwrap().field_type.base().clone();
        let database_config = database.field("Config").unwrap().field_type.base().clone();

        assert_eq!(service_config.struct_name(), Some("ServiceConfig"));
        assert_eq!(database_config.struct_name(), Some("DatabaseConfig"));
        assert!(schema.find_struct("Config").is_none());
    }

    #[test]
    fn test_colliding_struct_names_get_parent_prefix() {
        let schema = build(
            r#"
kind: Demo
config:
  debug: false
service:
  config:
    port: 80
database:
  config:
    url: postgres://db
"#,
        );

        assert!(schema.find_struct("Config").is_none());
        assert!(schema.find_struct("DemoConfig").is_some());
        assert!(schema.find_struct("ServiceConfig").is_some());
        assert!(schema.find_struct("DatabaseConfig").is_some());
        assert_eq!(
            schema.find_struct("ServiceConfig").unwrap().fields[0].source_path,
            "Demo.service.config.port"
        );
    }

    #[test]
    fn test_lone_config_keeps_bare_name() {
        let schema = build("kind: Demo\nconfig:\n  debug: false\n");
        assert!(schema.find_struct("Config").is_some());
    }

    #[test]
    fn test_malformed_api_version() {
        let err = SchemaBuilder::default()
            .build("apiVersion: a/b/c\nkind: Demo\n")
            .unwrap_err();

        assert!(matches!(err, SchemaError::InvalidApiVersion { ref value, .. } if value == "a/b/c"));
        assert!(err.to_string().contains("a/b/c"));
    }
}

mod documentation {
    use super::*;

    #[test]
    fn test_helm_style_values() {
        let schema = build(
            r#"
apiVersion: charts.example.com/v1alpha1
# A web application
kind: WebApp

# Number of replicas
# +kubebuilder:validation:Minimum=1
replicaCount: 1

image:
  # Image repository
  repository: nginx
  # Overrides the chart appVersion
  # +miaka:type:string
  tag: ""
  pullPolicy: IfNotPresent

# +miaka:type:string
imagePullSecrets: []

service:
  type: ClusterIP
  port: 80

resources: {}
"#,
        );

        let root = schema.root().unwrap();
        assert_eq!(root.documentation, vec!["A web application"]);

        let replicas = root.field_by_key("replicaCount").unwrap();
        assert_eq!(replicas.documentation, vec!["Number of replicas"]);
        assert_eq!(replicas.markers, vec!["+kubebuilder:validation:Minimum=1"]);
        assert_eq!(replicas.source_line, Some(8));

        let image = schema.find_struct("ImageSpec").unwrap();
        let tag = image.field_by_key("tag").unwrap();
        assert_eq!(tag.documentation, vec!["Overrides the chart appVersion"]);
        assert_eq!(tag.field_type, FieldType::Single(TypeRef::String));
        assert!(tag.markers.is_empty());

        let secrets = root.field_by_key("imagePullSecrets").unwrap();
        assert_eq!(secrets.field_type, FieldType::List(TypeRef::String));

        assert!(schema.find_struct("ResourcesSpec").unwrap().fields.is_empty());
        assert!(validate_schema(&schema, "miaka").is_ok());
    }

    #[test]
    fn test_documentation_never_contains_markers() {
        let schema = build(
            r#"
kind: Demo
# +kubebuilder:validation:Enum=a;b
# +miaka:type:string
# Mode of operation
mode: ~
"#,
        );

        for (_, field) in schema.fields() {
            assert!(field.documentation.iter().all(|line| !line.starts_with('+')));
            assert!(field.markers.iter().all(|m| !field.documentation.contains(m)));
        }
    }
}

mod infer {
    use super::*;

    #[test]
    fn test_infer_schema_reports_with_source() {
        let err = infer_schema(
            "values.yaml",
            "kind: Demo\nitems: []\nvalue: ~\n",
            &BuildOptions::default(),
        )
        .unwrap_err();

        let SchemaError::UnknownTypes(report) = err else {
            panic!("expected unknown type report");
        };
        assert_eq!(report.entries().len(), 2);
        assert_eq!(report.marker_tool(), "miaka");
        assert_eq!(report.entries()[1].position, UnknownPosition::Field);
    }

    #[test]
    fn test_builds_are_deterministic() {
        let yaml = r#"
kind: Demo
a:
  config: {x: 1}
b:
  config: {y: 2}
list:
  - {k: 1}
  - {k: 2, j: true}
"#;
        let first = serde_json::to_string(&build(yaml)).unwrap();
        let second = serde_json::to_string(&build(yaml)).unwrap();
        assert_eq!(first, second);
    }
}
