//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::cli::args::{Cli, Commands, LoaderArgs};
use crate::config::{load_config, SafeEnvConfig};
use crate::error::Result;

/// Trait for command implementations.
#[async_trait]
pub trait Command {
    /// Execute the command, writing its primary output to `out`.
    async fn execute(&self, out: &mut (dyn Write + Send)) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Where a command runs: the context directory and an explicit config file.
#[derive(Debug, Clone)]
pub struct CommandEnv {
    pub context_root: PathBuf,
    pub config_path: Option<PathBuf>,
}

impl CommandEnv {
    /// Load `.safe-env.yml` and layer the command-line flags on top.
    pub fn config(&self, overrides: &LoaderArgs) -> Result<SafeEnvConfig> {
        let mut config = load_config(self.config_path.as_deref(), &self.context_root)?;
        config.merge(overrides.to_config());
        tracing::debug!("Effective config: {:?}", config);
        Ok(config)
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    env: CommandEnv,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given context directory.
    pub fn new(context_root: PathBuf, config_path: Option<PathBuf>) -> Self {
        Self {
            env: CommandEnv {
                context_root,
                config_path,
            },
        }
    }

    /// Get the context directory.
    pub fn context_root(&self) -> &Path {
        &self.env.context_root
    }

    /// Dispatch and execute a command.
    pub async fn dispatch(&self, cli: &Cli, out: &mut (dyn Write + Send)) -> Result<CommandResult> {
        match &cli.command {
            Commands::Transform(args) => {
                let cmd = super::transform::TransformCommand::new(self.env.clone(), args.clone());
                cmd.execute(out).await
            }
            Commands::Env(args) => {
                let cmd = super::env::EnvCommand::new(self.env.clone(), args.clone());
                cmd.execute(out).await
            }
            Commands::Completions(args) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(out).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn dispatcher_creation() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("/test"), None);
        assert_eq!(dispatcher.context_root(), Path::new("/test"));
    }

    #[test]
    fn flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".safe-env.yml"),
            "env_resolver: a.yml\nignore: [A]\n",
        )
        .unwrap();
        let env = CommandEnv {
            context_root: temp.path().to_path_buf(),
            config_path: None,
        };
        let overrides = LoaderArgs {
            resolver: Some(PathBuf::from("b.yml")),
            ignore: vec!["B".to_string()],
            ..Default::default()
        };

        let config = env.config(&overrides).unwrap();
        assert_eq!(config.env_resolver, Some(PathBuf::from("b.yml")));
        assert_eq!(config.ignore, vec!["A", "B"]);
    }
}
