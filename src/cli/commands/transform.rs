//! Transform command implementation.
//!
//! The `safe-env transform` command runs the loader over source files.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;

use crate::cli::args::TransformArgs;
use crate::error::{Result, SafeEnvError};
use crate::loader::{BuildContext, Loader};

use super::dispatcher::{Command, CommandEnv, CommandResult};

/// The transform command implementation.
pub struct TransformCommand {
    env: CommandEnv,
    args: TransformArgs,
}

impl TransformCommand {
    /// Create a new transform command.
    pub fn new(env: CommandEnv, args: TransformArgs) -> Self {
        Self { env, args }
    }

    async fn emit(&self, file: &Path, transformed: &str, out: &mut (dyn Write + Send)) -> Result<()> {
        if self.args.in_place {
            tokio::fs::write(file, transformed).await?;
        } else if let Some(output) = &self.args.output {
            tokio::fs::write(output, transformed).await?;
        } else {
            out.write_all(transformed.as_bytes())?;
        }
        Ok(())
    }
}

#[async_trait]
impl Command for TransformCommand {
    async fn execute(&self, out: &mut (dyn Write + Send)) -> Result<CommandResult> {
        if self.args.output.is_some() && self.args.files.len() > 1 {
            return Err(SafeEnvError::Other(anyhow::anyhow!(
                "--output accepts a single input file, got {}",
                self.args.files.len()
            )));
        }

        let config = self.env.config(&self.args.loader)?;
        let loader = Loader::new(config.into_options());
        let mut failed = 0;

        for file in &self.args.files {
            let source = tokio::fs::read_to_string(file).await.map_err(|e| {
                SafeEnvError::Other(anyhow::Error::new(e).context(format!("reading {}", file.display())))
            })?;
            let mut ctx = BuildContext::new(file, &self.env.context_root);

            match loader.transform(&source, &mut ctx).await {
                Ok(transformed) => self.emit(file, &transformed, out).await?,
                Err(e) => {
                    failed += 1;
                    eprintln!("{}: {}", file.display(), e);
                }
            }

            if self.args.print_deps {
                for dependency in ctx.dependencies() {
                    eprintln!("{}", dependency.display());
                }
            }
        }

        if failed > 0 {
            tracing::debug!("{} of {} files failed", failed, self.args.files.len());
            return Ok(CommandResult::failure(1));
        }
        Ok(CommandResult::success())
    }
}
