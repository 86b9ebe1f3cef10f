//! Env command implementation.
//!
//! The `safe-env env` command prints the resolver environment as JSON.

use std::io::Write;

use async_trait::async_trait;

use crate::cli::args::EnvArgs;
use crate::error::{Result, SafeEnvError};
use crate::loader::Loader;

use super::dispatcher::{Command, CommandEnv, CommandResult};

/// The env command implementation.
pub struct EnvCommand {
    env: CommandEnv,
    args: EnvArgs,
}

impl EnvCommand {
    /// Create a new env command.
    pub fn new(env: CommandEnv, args: EnvArgs) -> Self {
        Self { env, args }
    }
}

#[async_trait]
impl Command for EnvCommand {
    async fn execute(&self, out: &mut (dyn Write + Send)) -> Result<CommandResult> {
        let config = self.env.config(&self.args.loader)?;
        let loader = Loader::new(config.into_options());

        let values = match loader.load_env(&self.env.context_root).await {
            Ok(values) => values,
            Err(e) => {
                eprintln!("{e}");
                return Ok(CommandResult::failure(1));
            }
        };

        let rendered = match self.args.pretty {
            true => serde_json::to_string_pretty(&values),
            false => serde_json::to_string(&values),
        };
        let json = rendered.map_err(|e| SafeEnvError::Other(e.into()))?;
        writeln!(out, "{json}")?;

        Ok(CommandResult::success())
    }
}
