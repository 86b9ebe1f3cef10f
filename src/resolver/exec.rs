//! Process execution for resolvers.
//!
//! Two things run external processes: executable resolver files (the
//! "function" export shape) and `$exec` pending values inside a document.

use super::export::{ResolveEnv, ResolverContext};
use super::search::parent_dir;
use super::tree::EnvTree;
use crate::error::{Result, SafeEnvError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// An executable resolver file.
///
/// The process runs in the resolver's directory. It receives the context
/// object as JSON on stdin (`{"args": {...}}`) and each argument again as
/// `--key=value`, and must print a JSON or YAML mapping on stdout.
#[derive(Debug, Clone)]
pub struct ExecResolver {
    path: PathBuf,
}

impl ExecResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn failure(&self, message: impl Into<String>) -> SafeEnvError {
        SafeEnvError::ResolverExecutionFailure {
            resolver: self.path.display().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl ResolveEnv for ExecResolver {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn resolve(&self, context: &ResolverContext) -> Result<EnvTree> {
        let base_dir = parent_dir(&self.path);
        let input = serde_json::to_vec(context).map_err(|e| self.failure(e.to_string()))?;

        tracing::debug!("Running resolver {}", self.path.display());
        let mut child = Command::new(&self.path)
            .args(context.argv())
            .current_dir(&base_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(format!("could not start: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A resolver that ignores stdin may exit before reading it.
            if let Err(e) = stdin.write_all(&input).await {
                tracing::debug!("resolver closed stdin early: {}", e);
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.failure(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!(
                "exited with code {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let document: serde_yaml::Value = serde_yaml::from_str(&stdout)
            .map_err(|e| self.failure(format!("output is not JSON or YAML: {e}")))?;

        match document {
            serde_yaml::Value::Mapping(map) => Ok(EnvTree::from_document(map, &base_dir)),
            other => Err(SafeEnvError::InvalidResolverExport {
                path: self.path.clone(),
                reason: format!("resolver printed {}, not a mapping", describe(&other)),
            }),
        }
    }
}

/// Run a shell command and return its trimmed stdout.
pub async fn run_shell(command: &str, cwd: &Path) -> Result<String> {
    let output = Command::new(detect_shell())
        .arg(shell_flag())
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(SafeEnvError::ResolverExecutionFailure {
            resolver: command.to_string(),
            message: format!(
                "exited with code {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Human description of a YAML node kind, for error messages.
pub(crate) fn describe(value: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// Builds must not depend on the user's interactive shell profile.
fn detect_shell() -> String {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        "/bin/sh".to_string()
    }
}

fn shell_flag() -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-c"
    }
}
