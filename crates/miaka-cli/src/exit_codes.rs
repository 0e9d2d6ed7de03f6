//! Process exit codes
//!
//! Scripts and CI jobs branch on these, so each failure class gets its own
//! code. Usage errors use 64 from sysexits.h.

pub const SUCCESS: i32 = 0;

/// Anything without a more specific code, including a bad miaka.yaml
pub const ERROR: i32 = 1;

/// A values file does not match its schema or CRD
pub const VALIDATION_ERROR: i32 = 2;

/// values.yaml could not be turned into a schema, CRD or JSON Schema
pub const SCHEMA_ERROR: i32 = 3;

/// The compatibility policy rejected a regenerated CRD
pub const BREAKING_CHANGE: i32 = 4;

/// A file could not be read or written
pub const IO_ERROR: i32 = 5;

pub const USAGE_ERROR: i32 = 64;
