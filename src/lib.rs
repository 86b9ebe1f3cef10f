//! safe-env - Build-time substitution of `process.env` references.
//!
//! safe-env rewrites every `process.env.NAME` reference in a source file to
//! a literal value, taken from the live process environment, an optional
//! resolver file, or configured defaults. A reference with no value fails
//! the whole file instead of leaking `undefined` into a build.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - `.safe-env.yml` loading
//! - [`error`] - Error types and result aliases
//! - [`loader`] - The per-file build hook and dependency reporting
//! - [`resolver`] - External environment loading
//! - [`substitute`] - Comment stripping, scanning, resolution and encoding
//! - [`value`] - Values bound to variable names
//!
//! # Example
//!
//! ```
//! use safe_env::substitute::{substitute_env, EnvSources, Filter};
//! use std::collections::HashMap;
//!
//! let live = HashMap::from([("PORT".to_string(), "8080".to_string())]);
//! let sources = EnvSources::with_live(live);
//! let out = substitute_env("listen(process.env.PORT)", &sources, &Filter::default()).unwrap();
//! assert_eq!(out, "listen(8080)");
//! ```
//!
//! For resolver files and the CLI, see the integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod substitute;
pub mod value;

pub use error::{Result, SafeEnvError};
pub use loader::{Loader, LoaderError, LoaderOptions};
