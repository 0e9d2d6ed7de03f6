//! Identifier normalization and struct naming
//!
//! Every nested mapping becomes a named struct. Names are derived from the
//! key and suffixed when needed. A derived name that more than one struct
//! would get is prefixed with the parent key for all of them, so `config`
//! under `service` and under `database` become `ServiceConfig` and
//! `DatabaseConfig`. A counter is the last resort.

use std::collections::HashSet;
use tracing::debug;

use crate::options::BuildOptions;

/// Turn a YAML key into a PascalCase identifier
///
/// Splits on `_ - . / :`, drops any other non-alphanumeric character,
/// upper-cases the first letter of each segment and concatenates.
///
/// ```rust
/// use miaka_core::naming::normalize_identifier;
///
/// assert_eq!(normalize_identifier("image_pull-policy"), "ImagePullPolicy");
/// assert_eq!(normalize_identifier("serviceConfig"), "ServiceConfig");
/// assert_eq!(normalize_identifier("app.kubernetes.io/name"), "AppKubernetesIoName");
/// ```
pub fn normalize_identifier(key: &str) -> String {
    let mut out = String::with_capacity(key.len());

    for segment in key.split(['_', '-', '.', '/', ':']) {
        let mut chars = segment.chars().filter(|c| c.is_alphanumeric());
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars);
        }
    }

    if out.is_empty() {
        return "Field".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'X');
    }
    out
}

/// Derives struct names from keys
#[derive(Debug, Clone)]
pub struct StructNamer {
    suffix: String,
    known_suffixes: Vec<String>,
}

impl StructNamer {
    pub fn new(options: &BuildOptions) -> Self {
        Self {
            suffix: options.struct_suffix.clone(),
            known_suffixes: options.known_suffixes.clone(),
        }
    }

    /// Normalized name plus the suffix, unless it already ends with a known one
    ///
    /// `service` becomes `ServiceSpec`, `serviceConfig` stays `ServiceConfig`.
    pub fn derive_struct_name(&self, key: &str) -> String {
        let name = normalize_identifier(key);
        let has_suffix = self
            .known_suffixes
            .iter()
            .chain(std::iter::once(&self.suffix))
            .any(|suffix| !suffix.is_empty() && name.ends_with(suffix.as_str()));

        if has_suffix {
            name
        } else {
            format!("{}{}", name, self.suffix)
        }
    }
}

/// Struct names already taken during one build
#[derive(Debug, Default)]
pub struct NameRegistry {
    reserved: HashSet<String>,
    /// Derived names wanted by more than one struct
    shared: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that never hands out a name from `shared` unprefixed
    pub fn with_shared(shared: HashSet<String>) -> Self {
        Self {
            reserved: HashSet::new(),
            shared,
        }
    }

    /// Reserve a name; returns false if it was already taken
    pub fn reserve(&mut self, name: &str) -> bool {
        self.reserved.insert(name.to_string())
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Pick and reserve a unique struct name for `key`
    ///
    /// Tries the derived name unless it is shared, then the parent key
    /// prefixed to it, then the prefixed name with a counter starting at 2.
    pub fn unique_struct_name(&mut self, namer: &StructNamer, key: &str, parent: &str) -> String {
        let candidate = namer.derive_struct_name(key);
        if !self.shared.contains(&candidate) && self.reserve(&candidate) {
            return candidate;
        }

        let prefixed = format!("{}{}", normalize_identifier(parent), candidate);
        if self.reserve(&prefixed) {
            debug!(key, taken = %candidate, name = %prefixed, "struct name collision resolved with parent prefix");
            return prefixed;
        }

        let mut counter = 2usize;
        loop {
            let numbered = format!("{}{}", prefixed, counter);
            if self.reserve(&numbered) {
                debug!(key, name = %numbered, "struct name collision resolved with counter");
                return numbered;
            }
            counter += 1;
        }
    }
}
