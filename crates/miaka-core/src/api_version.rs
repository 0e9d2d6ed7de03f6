//! `apiVersion` parsing

use serde::Serialize;
use std::fmt;

use crate::error::{Result, SchemaError};

/// API group and version of a resource
///
/// Both are empty when the document declares no `apiVersion`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Parse `group/version` or a bare `version`
    ///
    /// ```rust
    /// use miaka_core::GroupVersion;
    ///
    /// let gv = GroupVersion::parse("apps.example.com/v1beta1").unwrap();
    /// assert_eq!(gv.group, "apps.example.com");
    /// assert_eq!(gv.version, "v1beta1");
    ///
    /// assert_eq!(GroupVersion::parse("v1").unwrap().group, "");
    /// assert!(GroupVersion::parse("a/b/c").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self> {
        if value.is_empty() || value == "/" {
            return Ok(Self::default());
        }

        let parts: Vec<&str> = value.split('/').collect();
        match parts.as_slice() {
            [version] => Ok(Self::new("", *version)),
            [group, version] => Ok(Self::new(*group, *version)),
            _ => Err(SchemaError::InvalidApiVersion {
                value: value.to_string(),
                reason: "expected 'group/version' or 'version'".to_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.version.is_empty()
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}
