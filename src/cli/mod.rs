//! Command-line interface for safe-env.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CompletionsArgs, EnvArgs, LoaderArgs, TransformArgs};
pub use commands::{Command, CommandDispatcher, CommandEnv, CommandResult};
