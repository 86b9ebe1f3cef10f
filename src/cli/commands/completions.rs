//! Shell completions generation.
//!
//! The `safe-env completions` command generates shell completion scripts.

use std::io::Write;

use async_trait::async_trait;
use clap::CommandFactory;

use crate::cli::args::{Cli, CompletionsArgs};

use super::dispatcher::{Command, CommandResult};

/// The completions command implementation.
pub struct CompletionsCommand {
    args: CompletionsArgs,
}

impl CompletionsCommand {
    /// Create a new completions command.
    pub fn new(args: CompletionsArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for CompletionsCommand {
    async fn execute(&self, out: &mut (dyn Write + Send)) -> crate::error::Result<CommandResult> {
        let mut cmd = Cli::command();
        clap_complete::generate(self.args.shell, &mut cmd, "safe-env", out);
        Ok(CommandResult::success())
    }
}
