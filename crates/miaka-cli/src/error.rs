//! CLI error types with exit code handling
//!
//! Library errors pass through unchanged so their diagnostics (source
//! labels, help text) reach the terminal. Everything else maps onto one of
//! the codes in [`exit_codes`](crate::exit_codes).

use miaka_core::SchemaError;
use miaka_crd::CrdError;
use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// values.yaml could not be turned into a schema
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    /// CRD generation, parsing or translation failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Crd(#[from] CrdError),

    /// An instance does not match its schema
    #[error("Validation failed: {message}")]
    #[diagnostic(code(miaka::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The compatibility policy rejected the regenerated CRD
    #[error("Refusing to replace the existing CRD: {reason}")]
    #[diagnostic(
        code(miaka::cli::breaking_change),
        help("review the changes above, then rerun with --yes or --policy force to write anyway")
    )]
    BreakingChange { reason: String },

    /// miaka.yaml could not be read
    #[error("Invalid project file {path}: {message}")]
    #[diagnostic(
        code(miaka::cli::config),
        help("keys are build, crd, compatibility and output")
    )]
    Config { path: String, message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(miaka::cli::io))]
    Io { message: String },

    /// Invalid arguments that clap cannot catch on its own
    #[error("{message}")]
    #[diagnostic(code(miaka::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(miaka::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Schema(_) | CliError::Crd(_) => exit_codes::SCHEMA_ERROR,
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::BreakingChange { .. } => exit_codes::BREAKING_CHANGE,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Config { .. } | CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }

    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an IO error that names the file involved
    pub fn io_at(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::from(SchemaError::MissingKind).exit_code(),
            exit_codes::SCHEMA_ERROR
        );
        assert_eq!(
            CliError::from(CrdError::InvalidCrd("x".into())).exit_code(),
            exit_codes::SCHEMA_ERROR
        );
        assert_eq!(
            CliError::validation_with_help("bad", "fix it").exit_code(),
            exit_codes::VALIDATION_ERROR
        );
        assert_eq!(
            CliError::BreakingChange {
                reason: "1 dangerous change(s) detected".into(),
            }
            .exit_code(),
            exit_codes::BREAKING_CHANGE
        );
        assert_eq!(
            CliError::from(std::io::Error::other("boom")).exit_code(),
            exit_codes::IO_ERROR
        );
        assert_eq!(CliError::usage("bad flag").exit_code(), exit_codes::USAGE_ERROR);
        assert_eq!(CliError::other("oops").exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_io_error_names_the_file() {
        let err = CliError::io_at(
            Path::new("charts/demo/values.yaml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "IO error: charts/demo/values.yaml: No such file or directory"
        );
    }

    #[test]
    fn test_schema_diagnostics_pass_through() {
        let err = CliError::from(SchemaError::MissingKind);
        assert_eq!(err.to_string(), "Missing resource kind");
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("miaka::schema::kind")
        );
    }
}
