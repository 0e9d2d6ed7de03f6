//! Project configuration (`miaka.yaml`)
//!
//! The file is optional and lives next to `values.yaml`:
//!
//! ```yaml
//! build:
//!   structSuffix: Spec
//! crd:
//!   group: charts.example.com
//!   scope: Cluster
//!   shortNames: [wa]
//! compatibility: strict
//! output:
//!   crd: crds/webapp.yaml
//!   jsonSchema: values.schema.json
//! ```
//!
//! Relative output paths are resolved against the chart directory.

use miaka_core::BuildOptions;
use miaka_crd::{CompatibilityPolicy, CrdOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

pub const CONFIG_FILE: &str = "miaka.yaml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub build: BuildOptions,

    #[serde(default)]
    pub crd: CrdOptions,

    #[serde(default)]
    pub compatibility: CompatibilityPolicy,

    #[serde(default)]
    pub output: OutputPaths,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputPaths {
    pub crd: Option<PathBuf>,
    pub json_schema: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load `miaka.yaml` from `chart_dir`, or defaults when there is none
    pub fn load(chart_dir: &Path) -> Result<Self> {
        let path = chart_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|e| CliError::io_at(&path, e))?;
        Self::from_yaml(&text).map_err(|e| CliError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to a mapping
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Where the CRD is written: `<chart>/crds/<crd name>.yaml` unless configured
    pub fn crd_path(&self, chart_dir: &Path, crd_name: &str) -> PathBuf {
        match &self.output.crd {
            Some(path) => chart_dir.join(path),
            None => chart_dir.join("crds").join(format!("{crd_name}.yaml")),
        }
    }

    /// Where the JSON Schema is written: `<chart>/values.schema.json` unless configured
    pub fn json_schema_path(&self, chart_dir: &Path) -> PathBuf {
        match &self.output.json_schema {
            Some(path) => chart_dir.join(path),
            None => chart_dir.join("values.schema.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miaka_crd::CrdScope;

    #[test]
    fn test_full_config() {
        let config = ProjectConfig::from_yaml(
            r#"
build:
  structSuffix: Config
crd:
  group: charts.example.com
  scope: Cluster
  shortNames: [wa]
  strictJsonSchema: false
compatibility: strict
output:
  crd: out/webapp.yaml
  jsonSchema: schema/values.json
"#,
        )
        .unwrap();

        assert_eq!(config.build.struct_suffix, "Config");
        assert_eq!(config.build.marker_tool, "miaka");
        assert_eq!(config.crd.group.as_deref(), Some("charts.example.com"));
        assert_eq!(config.crd.scope, CrdScope::Cluster);
        assert_eq!(config.crd.short_names, vec!["wa"]);
        assert!(!config.crd.strict_json_schema);
        assert_eq!(config.compatibility, CompatibilityPolicy::Strict);

        let chart = Path::new("charts/webapp");
        assert_eq!(
            config.crd_path(chart, "webapps.charts.example.com"),
            Path::new("charts/webapp/out/webapp.yaml")
        );
        assert_eq!(
            config.json_schema_path(chart),
            Path::new("charts/webapp/schema/values.json")
        );
    }

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::from_yaml("").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.compatibility, CompatibilityPolicy::Safe);
        assert!(config.crd.strict_json_schema);

        let chart = Path::new("chart");
        assert_eq!(
            config.crd_path(chart, "demos.example.com"),
            Path::new("chart/crds/demos.example.com.yaml")
        );
        assert_eq!(
            config.json_schema_path(chart),
            Path::new("chart/values.schema.json")
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(ProjectConfig::from_yaml("outputs:\n  crd: x.yaml\n").is_err());
    }

    #[test]
    fn test_load_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            ProjectConfig::load(dir.path()).unwrap(),
            ProjectConfig::default()
        );

        std::fs::write(dir.path().join(CONFIG_FILE), "compatibility: reckless\n").unwrap();
        let err = ProjectConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
