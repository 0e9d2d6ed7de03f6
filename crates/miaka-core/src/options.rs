//! Build options

use serde::{Deserialize, Serialize};

use crate::comments::DEFAULT_MARKER_TOOL;

/// Options controlling schema inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    /// Tool name in type hint markers (`+<tool>:type:<expr>`)
    #[serde(default = "default_marker_tool")]
    pub marker_tool: String,

    /// Suffix appended to derived struct names
    #[serde(default = "default_struct_suffix")]
    pub struct_suffix: String,

    /// Names ending with any of these are not suffixed
    #[serde(default = "default_known_suffixes")]
    pub known_suffixes: Vec<String>,
}

fn default_marker_tool() -> String {
    DEFAULT_MARKER_TOOL.to_string()
}

fn default_struct_suffix() -> String {
    "Spec".to_string()
}

fn default_known_suffixes() -> Vec<String> {
    ["Spec", "Config", "Configuration", "Settings", "Options", "Parameters"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            marker_tool: default_marker_tool(),
            struct_suffix: default_struct_suffix(),
            known_suffixes: default_known_suffixes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_use_defaults() {
        let options: BuildOptions = serde_yaml::from_str("markerTool: acme").unwrap();
        assert_eq!(options.marker_tool, "acme");
        assert_eq!(options.struct_suffix, "Spec");
        assert!(options.known_suffixes.contains(&"Settings".to_string()));
    }
}
