//! Error types for codriver-mapper
//!
//! Only configuration-contract violations are errors. Data-quality problems
//! and missing resources are recorded in a [`crate::diagnostics::DiagnosticLog`]
//! and never abort a run.

use thiserror::Error;

/// Fatal errors: the configuration itself is broken
#[derive(Debug, Error)]
pub enum MapperError {
    /// A value violates a constructor contract (e.g. a range from a non-numeric token)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A remap, override or static entry has the wrong shape or type
    #[error("Invalid mapping config for '{identifier}': {reason}")]
    InvalidMappingConfig { identifier: String, reason: String },

    /// The compound prefix note did not resolve to exactly one source note
    #[error("Prefix note '{identifier}' resolved to {found} notes (expected exactly 1)")]
    PrefixUnresolved { identifier: String, found: usize },

    /// A configured package has no catalog
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// codriver-common error
    #[error("Common error: {0}")]
    Common(#[from] codriver_common::Error),
}

/// Convenience Result type using MapperError
pub type Result<T> = std::result::Result<T, MapperError>;

impl MapperError {
    /// Shorthand for an [`MapperError::InvalidMappingConfig`]
    pub fn mapping_config(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        MapperError::InvalidMappingConfig {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }
}
