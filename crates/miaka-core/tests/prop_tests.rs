//! Property tests for inference and naming

use std::collections::HashSet;

use miaka_core::naming::{NameRegistry, StructNamer, normalize_identifier};
use miaka_core::{BuildOptions, SchemaBuilder, SourceMap, TypeRef, infer_scalar};
use proptest::prelude::*;
use serde_yaml::{Mapping, Value};

/// Small key alphabet so nested names collide often
fn key() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["config", "spec", "service", "db", "item", "tls", "x"])
        .prop_map(String::from)
}

fn values() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        any::<bool>().prop_map(Value::Bool),
        "[a-z]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec((key(), inner.clone()), 0..5).prop_map(|entries| {
                let mut map = Mapping::new();
                for (k, v) in entries {
                    map.insert(Value::String(k), v);
                }
                Value::Mapping(map)
            }),
            prop::collection::vec(inner, 1..4).prop_map(Value::Sequence),
        ]
    })
}

fn document() -> impl Strategy<Value = Value> {
    prop::collection::vec((key(), values()), 0..6).prop_map(|entries| {
        let mut map = Mapping::new();
        map.insert("kind".into(), "Demo".into());
        for (k, v) in entries {
            map.insert(Value::String(k), v);
        }
        Value::Mapping(map)
    })
}

proptest! {
    #[test]
    fn prop_integers_infer_integer(n in any::<i64>()) {
        prop_assert_eq!(infer_scalar(&Value::Number(n.into())), TypeRef::Integer);
    }

    #[test]
    fn prop_fractional_floats_infer_float(f in any::<f64>().prop_filter("fractional", |f| f.fract() != 0.0)) {
        prop_assert_eq!(infer_scalar(&Value::Number(f.into())), TypeRef::Float);
    }

    #[test]
    fn prop_strings_infer_string(s in ".*") {
        prop_assert_eq!(infer_scalar(&Value::String(s)), TypeRef::String);
    }

    #[test]
    fn prop_normalized_identifiers_are_valid(key in ".*") {
        let ident = normalize_identifier(&key);
        prop_assert!(!ident.is_empty());
        prop_assert!(ident.chars().all(char::is_alphanumeric));
        prop_assert!(!ident.starts_with(|c: char| c.is_ascii_digit()));
    }

    #[test]
    fn prop_unique_struct_names(requests in prop::collection::vec((key(), key()), 0..40)) {
        let namer = StructNamer::new(&BuildOptions::default());
        let mut registry = NameRegistry::new();
        let mut seen = HashSet::new();

        for (key, parent) in requests {
            let name = registry.unique_struct_name(&namer, &key, &parent);
            prop_assert!(seen.insert(name));
        }
    }

    #[test]
    fn prop_built_schemas_have_unique_struct_names(doc in document()) {
        let schema = SchemaBuilder::default()
            .build_value(&doc, &SourceMap::default())
            .unwrap();

        let mut names = HashSet::new();
        for def in &schema.structs {
            prop_assert!(names.insert(def.name.as_str()), "duplicate struct {}", def.name);
        }
        prop_assert_eq!(schema.structs[0].name.as_str(), "Demo");

        for (_, field) in schema.fields() {
            if let Some(target) = field.field_type.base().struct_name() {
                prop_assert!(schema.find_struct(target).is_some());
            }
            prop_assert_eq!(field.element_type().is_some(), field.field_type.is_list());
        }
    }

    #[test]
    fn prop_builds_are_deterministic(doc in document()) {
        let builder = SchemaBuilder::default();
        let first = builder.build_value(&doc, &SourceMap::default()).unwrap();
        let second = builder.build_value(&doc, &SourceMap::default()).unwrap();
        prop_assert_eq!(first, second);
    }
}
