//! CRD change analyzer
//!
//! Compares a previously generated CRD with a new one and classifies every
//! difference by how it affects resources that already exist in a cluster.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{AdditionalProperties, CrdNames, CrdSchema, CrdVersionSchema, SchemaProperty};

/// Result of comparing two CRDs
#[derive(Debug, Clone)]
pub struct CrdAnalysis {
    pub crd_name: String,
    pub changes: Vec<CrdChange>,
    /// No previous CRD existed
    pub is_new: bool,
}

impl CrdAnalysis {
    pub fn new_crd(name: String) -> Self {
        Self {
            crd_name: name,
            changes: vec![],
            is_new: true,
        }
    }

    pub fn has_dangerous_changes(&self) -> bool {
        self.max_severity() == ChangeSeverity::Dangerous
    }

    pub fn has_warnings(&self) -> bool {
        self.changes_with(ChangeSeverity::Warning).next().is_some()
    }

    pub fn max_severity(&self) -> ChangeSeverity {
        self.changes
            .iter()
            .map(CrdChange::severity)
            .max()
            .unwrap_or(ChangeSeverity::Safe)
    }

    /// Counts as (safe, warning, dangerous)
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        (
            self.changes_with(ChangeSeverity::Safe).count(),
            self.changes_with(ChangeSeverity::Warning).count(),
            self.changes_with(ChangeSeverity::Dangerous).count(),
        )
    }

    pub fn changes_with(&self, severity: ChangeSeverity) -> impl Iterator<Item = &CrdChange> {
        self.changes.iter().filter(move |c| c.severity() == severity)
    }
}

/// A single detected change
#[derive(Debug, Clone)]
pub struct CrdChange {
    pub kind: ChangeKind,
    /// Location in the CRD, e.g. `spec.versions[v1].schema.properties.image`
    pub path: String,
    pub message: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl CrdChange {
    pub fn severity(&self) -> ChangeSeverity {
        self.kind.severity()
    }

    pub fn icon(&self) -> &'static str {
        match self.severity() {
            ChangeSeverity::Safe => "✓",
            ChangeSeverity::Warning => "⚠",
            ChangeSeverity::Dangerous => "✗",
        }
    }

    /// `+` for additions, `-` for removals, `~` otherwise
    pub fn prefix(&self) -> &'static str {
        match (&self.old_value, &self.new_value) {
            (None, Some(_)) => "+",
            (Some(_), None) => "-",
            _ => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    // Safe
    AddOptionalField,
    AddVersion,
    AddShortName,
    AddCategory,
    RelaxValidation,
    /// Integer to number, or to int-or-string
    WidenFieldType,
    UpdateDescription,
    AddDefault,

    // Warning
    TightenValidation,
    ChangeDefault,
    AddRequiredField,
    MakeRequired,
    AddEnumValues,
    RemoveShortName,
    /// Unknown fields are pruned from now on
    StopPreservingUnknown,

    // Dangerous
    RemoveVersion,
    RemoveField,
    RemoveRequiredField,
    ChangeFieldType,
    ChangeScope,
    ChangeGroup,
    ChangeKindName,
    RemoveEnumValue,
    ChangeStorageVersion,
}

impl ChangeKind {
    pub fn severity(self) -> ChangeSeverity {
        match self {
            Self::AddOptionalField
            | Self::AddVersion
            | Self::AddShortName
            | Self::AddCategory
            | Self::RelaxValidation
            | Self::WidenFieldType
            | Self::UpdateDescription
            | Self::AddDefault => ChangeSeverity::Safe,

            Self::TightenValidation
            | Self::ChangeDefault
            | Self::AddRequiredField
            | Self::MakeRequired
            | Self::AddEnumValues
            | Self::RemoveShortName
            | Self::StopPreservingUnknown => ChangeSeverity::Warning,

            Self::RemoveVersion
            | Self::RemoveField
            | Self::RemoveRequiredField
            | Self::ChangeFieldType
            | Self::ChangeScope
            | Self::ChangeGroup
            | Self::ChangeKindName
            | Self::RemoveEnumValue
            | Self::ChangeStorageVersion => ChangeSeverity::Dangerous,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AddOptionalField => "optional field added",
            Self::AddVersion => "API version added",
            Self::AddShortName => "short name added",
            Self::AddCategory => "category added",
            Self::RelaxValidation => "validation relaxed",
            Self::WidenFieldType => "field type widened",
            Self::UpdateDescription => "description updated",
            Self::AddDefault => "default value added",
            Self::TightenValidation => "validation tightened",
            Self::ChangeDefault => "default value changed",
            Self::AddRequiredField => "required field added",
            Self::MakeRequired => "field now required",
            Self::AddEnumValues => "enum values added",
            Self::RemoveShortName => "short name removed",
            Self::StopPreservingUnknown => "unknown fields now pruned",
            Self::RemoveVersion => "API version removed",
            Self::RemoveField => "field removed",
            Self::RemoveRequiredField => "required field removed",
            Self::ChangeFieldType => "field type changed",
            Self::ChangeScope => "scope changed",
            Self::ChangeGroup => "group changed",
            Self::ChangeKindName => "kind name changed",
            Self::RemoveEnumValue => "enum value removed",
            Self::ChangeStorageVersion => "storage version changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeSeverity {
    Safe = 0,
    Warning = 1,
    Dangerous = 2,
}

impl std::fmt::Display for ChangeSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Warning => write!(f, "warning"),
            Self::Dangerous => write!(f, "dangerous"),
        }
    }
}

/// Which way a bound moves when it gets stricter
#[derive(Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

pub struct CrdAnalyzer;

impl CrdAnalyzer {
    /// Compare two CRDs; `old` is `None` for a first generation
    pub fn analyze(old: Option<&CrdSchema>, new: &CrdSchema) -> CrdAnalysis {
        let Some(old) = old else {
            return CrdAnalysis::new_crd(new.name.clone());
        };

        let mut changes = Changes::default();

        changes.compare_identity(old, new);
        changes.compare_names(&old.names, &new.names);
        changes.compare_versions(old, new);

        CrdAnalysis {
            crd_name: new.name.clone(),
            changes: changes.0,
            is_new: false,
        }
    }
}

#[derive(Default)]
struct Changes(Vec<CrdChange>);

impl Changes {
    fn push(
        &mut self,
        kind: ChangeKind,
        path: impl Into<String>,
        message: String,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.0.push(CrdChange {
            kind,
            path: path.into(),
            message,
            old_value,
            new_value,
        });
    }

    fn compare_identity(&mut self, old: &CrdSchema, new: &CrdSchema) {
        if old.group != new.group {
            self.push(
                ChangeKind::ChangeGroup,
                "spec.group",
                format!("API group changed from '{}' to '{}'", old.group, new.group),
                Some(old.group.clone()),
                Some(new.group.clone()),
            );
        }

        if old.scope != new.scope {
            self.push(
                ChangeKind::ChangeScope,
                "spec.scope",
                format!("Scope changed from {} to {}", old.scope, new.scope),
                Some(old.scope.to_string()),
                Some(new.scope.to_string()),
            );
        }
    }

    fn compare_names(&mut self, old: &CrdNames, new: &CrdNames) {
        if old.kind != new.kind {
            self.push(
                ChangeKind::ChangeKindName,
                "spec.names.kind",
                format!("Kind changed from '{}' to '{}'", old.kind, new.kind),
                Some(old.kind.clone()),
                Some(new.kind.clone()),
            );
        }

        let old_shorts: BTreeSet<_> = old.short_names.iter().collect();
        let new_shorts: BTreeSet<_> = new.short_names.iter().collect();

        for name in new_shorts.difference(&old_shorts) {
            self.push(
                ChangeKind::AddShortName,
                "spec.names.shortNames",
                format!("Short name '{}' added", name),
                None,
                Some((*name).clone()),
            );
        }
        for name in old_shorts.difference(&new_shorts) {
            self.push(
                ChangeKind::RemoveShortName,
                "spec.names.shortNames",
                format!("Short name '{}' removed", name),
                Some((*name).clone()),
                None,
            );
        }

        let old_cats: BTreeSet<_> = old.categories.iter().collect();
        for cat in new.categories.iter().filter(|c| !old_cats.contains(c)) {
            self.push(
                ChangeKind::AddCategory,
                "spec.names.categories",
                format!("Category '{}' added", cat),
                None,
                Some(cat.clone()),
            );
        }
    }

    fn compare_versions(&mut self, old: &CrdSchema, new: &CrdSchema) {
        for version in &old.versions {
            if new.version(&version.name).is_none() {
                self.push(
                    ChangeKind::RemoveVersion,
                    format!("spec.versions[{}]", version.name),
                    format!("API version '{}' removed", version.name),
                    Some(version.name.clone()),
                    None,
                );
            }
        }

        for version in &new.versions {
            match old.version(&version.name) {
                Some(previous) => self.compare_version(previous, version),
                None => self.push(
                    ChangeKind::AddVersion,
                    format!("spec.versions[{}]", version.name),
                    format!("API version '{}' added", version.name),
                    None,
                    Some(version.name.clone()),
                ),
            }
        }

        let old_storage = old.storage_version().map(|v| &v.name);
        let new_storage = new.storage_version().map(|v| &v.name);

        if old_storage != new_storage {
            self.push(
                ChangeKind::ChangeStorageVersion,
                "spec.versions[].storage",
                format!(
                    "Storage version changed from '{}' to '{}'",
                    old_storage.map(String::as_str).unwrap_or("none"),
                    new_storage.map(String::as_str).unwrap_or("none")
                ),
                old_storage.cloned(),
                new_storage.cloned(),
            );
        }
    }

    fn compare_version(&mut self, old: &CrdVersionSchema, new: &CrdVersionSchema) {
        if let (Some(old_schema), Some(new_schema)) = (&old.schema, &new.schema) {
            let path = format!("spec.versions[{}].schema", new.name);
            self.compare_object(old_schema, new_schema, "", &path);
        }
    }

    /// Compare the properties and required lists of two objects
    fn compare_object(
        &mut self,
        old: &SchemaProperty,
        new: &SchemaProperty,
        field: &str,
        path: &str,
    ) {
        let joined = |name: &str| {
            if field.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", field, name)
            }
        };

        for (name, prop) in removed(&old.properties, &new.properties) {
            let (kind, note) = if old.is_required(name) {
                (ChangeKind::RemoveRequiredField, " (was required)")
            } else {
                (ChangeKind::RemoveField, "")
            };
            self.push(
                kind,
                format!("{}.properties.{}", path, name),
                format!("Field '{}' removed{}", joined(name), note),
                Some(prop.type_.to_string()),
                None,
            );
        }

        for (name, prop) in removed(&new.properties, &old.properties) {
            let required = new.is_required(name);
            let kind = if required {
                ChangeKind::AddRequiredField
            } else {
                ChangeKind::AddOptionalField
            };
            self.push(
                kind,
                format!("{}.properties.{}", path, name),
                format!(
                    "Field '{}' added ({}, {})",
                    joined(name),
                    prop.type_,
                    if required { "required" } else { "optional" }
                ),
                None,
                Some(prop.type_.to_string()),
            );
        }

        for (name, old_prop) in &old.properties {
            if let Some(new_prop) = new.properties.get(name) {
                self.compare_property(
                    old_prop,
                    new_prop,
                    &joined(name),
                    &format!("{}.properties.{}", path, name),
                );
            }
        }

        for name in &new.required {
            if old.properties.contains_key(name) && !old.is_required(name) {
                self.push(
                    ChangeKind::MakeRequired,
                    format!("{}.required", path),
                    format!("Field '{}' is now required", joined(name)),
                    Some("optional".to_string()),
                    Some("required".to_string()),
                );
            }
        }
    }

    fn compare_property(
        &mut self,
        old: &SchemaProperty,
        new: &SchemaProperty,
        field: &str,
        path: &str,
    ) {
        if old.type_ != new.type_ {
            let kind = if old.type_.is_compatible_with(&new.type_) {
                ChangeKind::WidenFieldType
            } else {
                ChangeKind::ChangeFieldType
            };
            self.push(
                kind,
                format!("{}.type", path),
                format!(
                    "Field '{}' type changed from {} to {}",
                    field, old.type_, new.type_
                ),
                Some(old.type_.to_string()),
                Some(new.type_.to_string()),
            );
        }

        match (&old.default, &new.default) {
            (None, Some(v)) => self.push(
                ChangeKind::AddDefault,
                format!("{}.default", path),
                format!("Field '{}' default value added: {}", field, v),
                None,
                Some(v.to_string()),
            ),
            (Some(old_v), Some(new_v)) if old_v != new_v => self.push(
                ChangeKind::ChangeDefault,
                format!("{}.default", path),
                format!("Field '{}' default changed", field),
                Some(old_v.to_string()),
                Some(new_v.to_string()),
            ),
            _ => {}
        }

        if old.description != new.description && new.description.is_some() {
            self.push(
                ChangeKind::UpdateDescription,
                format!("{}.description", path),
                format!("Field '{}' description updated", field),
                old.description.clone(),
                new.description.clone(),
            );
        }

        self.compare_validation(old, new, field, path);
        self.compare_enums(old, new, field, path);

        if old.preserve_unknown && !new.preserve_unknown {
            self.push(
                ChangeKind::StopPreservingUnknown,
                format!("{}.x-kubernetes-preserve-unknown-fields", path),
                format!("Field '{}' no longer preserves unknown fields", field),
                Some("true".to_string()),
                None,
            );
        }

        self.compare_object(old, new, field, path);

        if let (Some(old_items), Some(new_items)) = (&old.items, &new.items) {
            self.compare_property(
                old_items,
                new_items,
                &format!("{}[]", field),
                &format!("{}.items", path),
            );
        }

        if let (
            Some(AdditionalProperties::Schema(old_values)),
            Some(AdditionalProperties::Schema(new_values)),
        ) = (&old.additional_properties, &new.additional_properties)
        {
            self.compare_property(
                old_values,
                new_values,
                &format!("{}{{}}", field),
                &format!("{}.additionalProperties", path),
            );
        }
    }

    fn compare_validation(
        &mut self,
        old: &SchemaProperty,
        new: &SchemaProperty,
        field: &str,
        path: &str,
    ) {
        self.compare_text(field, path, "pattern", &old.pattern, &new.pattern);
        self.compare_text(field, path, "format", &old.format, &new.format);

        self.compare_bound(field, path, "minimum", old.minimum, new.minimum, Bound::Lower);
        self.compare_bound(field, path, "maximum", old.maximum, new.maximum, Bound::Upper);
        self.compare_flag(
            field,
            path,
            "exclusiveMinimum",
            old.exclusive_minimum,
            new.exclusive_minimum,
        );
        self.compare_flag(
            field,
            path,
            "exclusiveMaximum",
            old.exclusive_maximum,
            new.exclusive_maximum,
        );

        let lengths = [
            ("minLength", old.min_length, new.min_length, Bound::Lower),
            ("maxLength", old.max_length, new.max_length, Bound::Upper),
            ("minItems", old.min_items, new.min_items, Bound::Lower),
            ("maxItems", old.max_items, new.max_items, Bound::Upper),
            ("minProperties", old.min_properties, new.min_properties, Bound::Lower),
            ("maxProperties", old.max_properties, new.max_properties, Bound::Upper),
        ];
        for (label, old_v, new_v, direction) in lengths {
            let as_f64 = |v: Option<u64>| v.map(|n| n as f64);
            self.compare_bound(field, path, label, as_f64(old_v), as_f64(new_v), direction);
        }

        self.compare_flag(field, path, "uniqueItems", old.unique_items, new.unique_items);

        // Dropping `nullable` rejects values that used to pass
        self.compare_flag(field, path, "nullable", !old.nullable, !new.nullable);

        if old.multiple_of != new.multiple_of {
            let kind = if new.multiple_of.is_some() {
                ChangeKind::TightenValidation
            } else {
                ChangeKind::RelaxValidation
            };
            self.push(
                kind,
                format!("{}.multipleOf", path),
                format!("Field '{}' multipleOf changed", field),
                old.multiple_of.map(|v| v.to_string()),
                new.multiple_of.map(|v| v.to_string()),
            );
        }
    }

    /// Any new or changed value tightens; removal relaxes
    fn compare_text(
        &mut self,
        field: &str,
        path: &str,
        label: &str,
        old: &Option<String>,
        new: &Option<String>,
    ) {
        let (kind, message) = match (old, new) {
            (None, Some(v)) => (
                ChangeKind::TightenValidation,
                format!("Field '{}' {} constraint added: {}", field, label, v),
            ),
            (Some(_), None) => (
                ChangeKind::RelaxValidation,
                format!("Field '{}' {} constraint removed", field, label),
            ),
            (Some(a), Some(b)) if a != b => (
                ChangeKind::TightenValidation,
                format!("Field '{}' {} changed", field, label),
            ),
            _ => return,
        };
        self.push(
            kind,
            format!("{}.{}", path, label),
            message,
            old.clone(),
            new.clone(),
        );
    }

    fn compare_bound(
        &mut self,
        field: &str,
        path: &str,
        label: &str,
        old: Option<f64>,
        new: Option<f64>,
        direction: Bound,
    ) {
        let (kind, message) = match (old, new) {
            (None, Some(v)) => (
                ChangeKind::TightenValidation,
                format!("Field '{}' {} constraint added ({})", field, label, v),
            ),
            (Some(v), None) => (
                ChangeKind::RelaxValidation,
                format!("Field '{}' {} constraint removed (was {})", field, label, v),
            ),
            (Some(a), Some(b)) if (a - b).abs() > f64::EPSILON => {
                let tighter = match direction {
                    Bound::Lower => b > a,
                    Bound::Upper => b < a,
                };
                let kind = if tighter {
                    ChangeKind::TightenValidation
                } else {
                    ChangeKind::RelaxValidation
                };
                (
                    kind,
                    format!("Field '{}' {} changed ({} → {})", field, label, a, b),
                )
            }
            _ => return,
        };
        self.push(
            kind,
            format!("{}.{}", path, label),
            message,
            old.map(|v| v.to_string()),
            new.map(|v| v.to_string()),
        );
    }

    /// Turning a restricting flag on tightens, turning it off relaxes
    fn compare_flag(&mut self, field: &str, path: &str, label: &str, old: bool, new: bool) {
        let (kind, verb) = match (old, new) {
            (false, true) => (ChangeKind::TightenValidation, "added"),
            (true, false) => (ChangeKind::RelaxValidation, "removed"),
            _ => return,
        };
        self.push(
            kind,
            format!("{}.{}", path, label),
            format!("Field '{}' {} constraint {}", field, label, verb),
            Some(old.to_string()),
            Some(new.to_string()),
        );
    }

    fn compare_enums(&mut self, old: &SchemaProperty, new: &SchemaProperty, field: &str, path: &str) {
        let path = format!("{}.enum", path);

        match (&old.enum_values, &new.enum_values) {
            (None, Some(values)) => self.push(
                ChangeKind::TightenValidation,
                path,
                format!(
                    "Field '{}' restricted to {} value(s)",
                    field,
                    values.len()
                ),
                None,
                Some(render_values(values.iter())),
            ),
            (Some(_), None) => self.push(
                ChangeKind::RelaxValidation,
                path,
                format!("Field '{}' enum constraint removed", field),
                None,
                None,
            ),
            (Some(old_values), Some(new_values)) => {
                let old_set: BTreeSet<String> = old_values.iter().map(|v| v.to_string()).collect();
                let new_set: BTreeSet<String> = new_values.iter().map(|v| v.to_string()).collect();

                let dropped: Vec<_> = old_set.difference(&new_set).cloned().collect();
                let added: Vec<_> = new_set.difference(&old_set).cloned().collect();

                if !dropped.is_empty() {
                    self.push(
                        ChangeKind::RemoveEnumValue,
                        path.clone(),
                        format!(
                            "Field '{}' enum values removed: {}",
                            field,
                            dropped.join(", ")
                        ),
                        Some(dropped.join(", ")),
                        None,
                    );
                }
                if !added.is_empty() {
                    self.push(
                        ChangeKind::AddEnumValues,
                        path,
                        format!("Field '{}' enum values added: {}", field, added.join(", ")),
                        None,
                        Some(added.join(", ")),
                    );
                }
            }
            (None, None) => {}
        }
    }
}

/// Entries of `left` whose key is missing from `right`
fn removed<'a>(
    left: &'a BTreeMap<String, SchemaProperty>,
    right: &'a BTreeMap<String, SchemaProperty>,
) -> impl Iterator<Item = (&'a String, &'a SchemaProperty)> {
    left.iter().filter(|(name, _)| !right.contains_key(*name))
}

fn render_values<'a>(values: impl Iterator<Item = &'a serde_json::Value>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CrdParser;

    fn crd(version: &str, properties: &str) -> CrdSchema {
        let yaml = format!(
            r#"
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
  versions:
    - name: {version}
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
{properties}
"#
        );
        CrdParser::parse(&yaml).unwrap()
    }

    fn kinds(analysis: &CrdAnalysis) -> Vec<ChangeKind> {
        analysis.changes.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_new_crd() {
        let new = crd("v1", "            port: {type: integer}");
        let analysis = CrdAnalyzer::analyze(None, &new);

        assert!(analysis.is_new);
        assert!(analysis.changes.is_empty());
        assert_eq!(analysis.max_severity(), ChangeSeverity::Safe);
    }

    #[test]
    fn test_identical_crds() {
        let a = crd("v1", "            port: {type: integer, minimum: 1}");
        let analysis = CrdAnalyzer::analyze(Some(&a), &a.clone());

        assert!(analysis.changes.is_empty());
    }

    #[test]
    fn test_added_optional_field() {
        let old = crd("v1", "            port: {type: integer}");
        let new = crd(
            "v1",
            "            port: {type: integer}\n            host: {type: string}",
        );

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        assert_eq!(kinds(&analysis), vec![ChangeKind::AddOptionalField]);
        assert_eq!(analysis.changes[0].prefix(), "+");
        assert_eq!(
            analysis.changes[0].path,
            "spec.versions[v1].schema.properties.host"
        );
    }

    #[test]
    fn test_removed_field_is_dangerous() {
        let old = crd(
            "v1",
            "            port: {type: integer}\n            host: {type: string}",
        );
        let new = crd("v1", "            port: {type: integer}");

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        assert_eq!(kinds(&analysis), vec![ChangeKind::RemoveField]);
        assert!(analysis.has_dangerous_changes());
    }

    #[test]
    fn test_type_changes() {
        let old = crd(
            "v1",
            "            port: {type: integer}\n            ratio: {type: integer}\n            name: {type: string}",
        );
        let new = crd(
            "v1",
            "            port: {x-kubernetes-int-or-string: true}\n            ratio: {type: number}\n            name: {type: boolean}",
        );

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        let (safe, warn, danger) = analysis.count_by_severity();

        assert_eq!((safe, warn, danger), (2, 0, 1));
        let dangerous: Vec<_> = analysis.changes_with(ChangeSeverity::Dangerous).collect();
        assert!(dangerous[0].message.contains("'name'"));
    }

    #[test]
    fn test_bounds() {
        let old = crd(
            "v1",
            "            replicas: {type: integer, minimum: 1, maximum: 10}",
        );
        let new = crd(
            "v1",
            "            replicas: {type: integer, minimum: 2, maximum: 20}",
        );

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        assert_eq!(
            kinds(&analysis),
            vec![ChangeKind::TightenValidation, ChangeKind::RelaxValidation]
        );
        assert_eq!(
            analysis.changes[0].message,
            "Field 'replicas' minimum changed (1 → 2)"
        );
    }

    #[test]
    fn test_enum_changes() {
        let old = crd(
            "v1",
            "            policy: {type: string, enum: [Always, Never]}",
        );
        let new = crd(
            "v1",
            "            policy: {type: string, enum: [Always, IfNotPresent]}",
        );

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        assert_eq!(
            kinds(&analysis),
            vec![ChangeKind::RemoveEnumValue, ChangeKind::AddEnumValues]
        );
        assert!(analysis.changes[1].message.contains("IfNotPresent"));
    }

    #[test]
    fn test_enum_values_added_only() {
        let old = crd("v1", "            policy: {type: string, enum: [Always]}");
        let new = crd(
            "v1",
            "            policy: {type: string, enum: [Always, Never]}",
        );

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        assert_eq!(kinds(&analysis), vec![ChangeKind::AddEnumValues]);
        assert_eq!(analysis.max_severity(), ChangeSeverity::Warning);
    }

    #[test]
    fn test_nested_and_list_fields() {
        let old = crd(
            "v1",
            r#"            image:
              type: object
              properties:
                tag: {type: string}
            ports:
              type: array
              items:
                type: object
                properties:
                  name: {type: string}"#,
        );
        let new = crd(
            "v1",
            r#"            image:
              type: object
              required: [tag]
              properties:
                tag: {type: string}
            ports:
              type: array
              items:
                type: object
                properties:
                  name: {type: string, maxLength: 15}"#,
        );

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        let messages: Vec<_> = analysis.changes.iter().map(|c| c.message.as_str()).collect();

        assert!(messages.contains(&"Field 'image.tag' is now required"));
        assert!(messages.contains(&"Field 'ports[].name' maxLength constraint added (15)"));
        assert!(analysis.has_warnings());
    }

    #[test]
    fn test_version_changes() {
        let old = crd("v1alpha1", "            port: {type: integer}");
        let new = crd("v1", "            port: {type: integer}");

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        assert_eq!(
            kinds(&analysis),
            vec![
                ChangeKind::RemoveVersion,
                ChangeKind::AddVersion,
                ChangeKind::ChangeStorageVersion
            ]
        );
    }

    #[test]
    fn test_identity_changes() {
        let old = crd("v1", "            port: {type: integer}");
        let mut new = old.clone();
        new.group = "other.io".to_string();
        new.scope = crate::schema::CrdScope::Cluster;
        new.names.short_names = vec!["wa".to_string()];

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        assert_eq!(
            kinds(&analysis),
            vec![
                ChangeKind::ChangeGroup,
                ChangeKind::ChangeScope,
                ChangeKind::AddShortName
            ]
        );
    }

    #[test]
    fn test_default_and_nullable() {
        let old = crd(
            "v1",
            "            tag: {type: string, nullable: true}\n            pull: {type: string, default: Always}",
        );
        let new = crd(
            "v1",
            "            tag: {type: string, default: latest}\n            pull: {type: string, default: Never}",
        );

        let analysis = CrdAnalyzer::analyze(Some(&old), &new);
        assert_eq!(
            kinds(&analysis),
            vec![
                ChangeKind::ChangeDefault,
                ChangeKind::AddDefault,
                ChangeKind::TightenValidation
            ]
        );
    }
}
