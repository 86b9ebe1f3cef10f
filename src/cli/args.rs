//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use crate::config::SafeEnvConfig;
use crate::value::EnvValue;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// safe-env - Replace process.env references with literal values.
#[derive(Debug, Parser)]
#[command(name = "safe-env")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides .safe-env.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory the resolver search starts from (defaults to current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub context: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Substitute environment references in source files
    Transform(TransformArgs),

    /// Print the loaded resolver environment as JSON
    Env(EnvArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Flags that extend or override `.safe-env.yml`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LoaderArgs {
    /// Resolver file name, searched upward from the context directory
    #[arg(long, value_name = "FILE")]
    pub resolver: Option<PathBuf>,

    /// Default value, lowest precedence (repeatable)
    #[arg(long = "default", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub defaults: Vec<(String, String)>,

    /// Variable name that is never substituted (repeatable)
    #[arg(long, value_name = "NAME")]
    pub ignore: Vec<String>,

    /// Value that suppresses substitution (repeatable)
    #[arg(long, value_name = "VALUE")]
    pub ignore_value: Vec<String>,

    /// Argument handed to resolver functions (repeatable)
    #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub args: Vec<(String, String)>,
}

impl LoaderArgs {
    /// The config described by these flags alone.
    pub fn to_config(&self) -> SafeEnvConfig {
        SafeEnvConfig {
            env_resolver: self.resolver.clone(),
            defaults: self
                .defaults
                .iter()
                .map(|(k, v)| (k.clone(), EnvValue::from(v.as_str())))
                .collect(),
            ignore: self.ignore.clone(),
            ignore_values: self.ignore_value.clone(),
            args: self.args.iter().cloned().collect(),
        }
    }
}

/// Arguments for the `transform` command.
#[derive(Debug, Clone, clap::Args)]
pub struct TransformArgs {
    /// Source files to transform
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write the result to FILE instead of stdout (single input only)
    #[arg(short, long, value_name = "FILE", conflicts_with = "in_place")]
    pub output: Option<PathBuf>,

    /// Overwrite each input file with its result
    #[arg(long)]
    pub in_place: bool,

    /// List dependency files on stderr
    #[arg(long)]
    pub print_deps: bool,

    #[command(flatten)]
    pub loader: LoaderArgs,
}

/// Arguments for the `env` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EnvArgs {
    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub loader: LoaderArgs,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{s}`")),
    }
}
