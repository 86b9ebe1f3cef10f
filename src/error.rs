//! Error types for safe-env operations.
//!
//! This module defines [`SafeEnvError`], the error type used throughout the
//! substitution engine and the resolver loader, and a [`Result`] alias.
//!
//! # Error Handling Strategy
//!
//! - Use `SafeEnvError` for domain errors that need distinct handling
//! - Use `anyhow::Error` (via `SafeEnvError::Other`) for unexpected errors
//! - Every error is wrapped once more by [`crate::loader::LoaderError`]
//!   before it reaches the host build tool

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for safe-env operations.
#[derive(Debug, Error)]
pub enum SafeEnvError {
    /// No precedence source supplied a value and the filter kept the reference.
    #[error(
        "Environment variable \"{name}\" is missing!\n\n\
         Loader tries to replace \"process.env.{name}\" with the real value. Unfortunately, no value was provided.\n\
         To resolve this issue, you can do one of the following:\n  \
         - provide the value manually in your terminal: \"{name}=<value> <your_command>\"\n  \
         - use a custom environment resolver (env_resolver in .safe-env.yml)\n  \
         - remove \"process.env.{name}\" if it is not strictly necessary\n"
    )]
    MissingVariable { name: String },

    /// The resolver file is neither a mapping document nor an executable.
    #[error(
        "Invalid environment resolver at {path}: {reason}. \
         Expected a mapping (.json, .yml, .yaml, .env) or an executable that prints a mapping"
    )]
    InvalidResolverExport { path: PathBuf, reason: String },

    /// The resolver function failed to run or returned an error.
    #[error("Environment resolver {resolver} failed: {message}")]
    ResolverExecutionFailure { resolver: String, message: String },

    /// A pending nested value inside the resolver mapping failed.
    #[error("Failed to resolve nested value \"{key}\": {message}")]
    NestedValueFailure { key: String, message: String },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SafeEnvError {
    /// Shorthand for [`SafeEnvError::MissingVariable`].
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }
}

/// Result type alias for safe-env operations.
pub type Result<T> = std::result::Result<T, SafeEnvError>;
