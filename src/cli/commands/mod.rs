//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`safe-env transform`, `safe-env env`)
//! - Shared config loading through [`CommandEnv`]

pub mod completions;
pub mod dispatcher;
pub mod env;
pub mod transform;

pub use dispatcher::{Command, CommandDispatcher, CommandEnv, CommandResult};
