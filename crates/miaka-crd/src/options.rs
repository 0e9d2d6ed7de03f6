//! CRD generation options

use serde::{Deserialize, Serialize};

use crate::schema::CrdScope;

/// Naming and output settings for generated CRDs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdOptions {
    /// API group used when `apiVersion` has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// API version used when `apiVersion` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Plural resource name (default: lowercase kind, pluralized)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,

    /// Singular resource name (default: lowercase kind)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular: Option<String>,

    #[serde(default)]
    pub scope: CrdScope,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// Close objects with declared properties in the JSON Schema
    #[serde(default = "default_strict_json_schema")]
    pub strict_json_schema: bool,
}

fn default_strict_json_schema() -> bool {
    true
}

impl Default for CrdOptions {
    fn default() -> Self {
        Self {
            group: None,
            version: None,
            plural: None,
            singular: None,
            scope: CrdScope::default(),
            short_names: Vec::new(),
            categories: Vec::new(),
            strict_json_schema: default_strict_json_schema(),
        }
    }
}

/// Pluralize a lowercase kind the way most CRDs do
///
/// ```rust
/// use miaka_crd::options::pluralize;
///
/// assert_eq!(pluralize("webapp"), "webapps");
/// assert_eq!(pluralize("policy"), "policies");
/// assert_eq!(pluralize("gateway"), "gateways");
/// assert_eq!(pluralize("ingress"), "ingresses");
/// ```
pub fn pluralize(singular: &str) -> String {
    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| singular.ends_with(suffix))
    {
        return format!("{}es", singular);
    }

    if let Some(stem) = singular.strip_suffix('y') {
        let consonant = stem
            .chars()
            .last()
            .is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
        if consonant {
            return format!("{}ies", stem);
        }
    }

    format!("{}s", singular)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_yaml() {
        let options: CrdOptions = serde_yaml::from_str(
            r#"
group: example.com
scope: Cluster
shortNames: [wa]
"#,
        )
        .unwrap();

        assert_eq!(options.group.as_deref(), Some("example.com"));
        assert_eq!(options.scope, CrdScope::Cluster);
        assert_eq!(options.short_names, vec!["wa"]);
        assert!(options.strict_json_schema);
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("mesh"), "meshes");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("y"), "ys");
    }
}
