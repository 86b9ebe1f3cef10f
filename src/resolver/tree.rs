//! Environment trees with pending values, and their deep resolution.
//!
//! A resolver produces an [`EnvTree`]: a mapping whose entries are plain
//! values, values that are still being computed, or nested mappings. Before
//! the substitution engine sees it, [`deep_resolve`] drives every pending
//! value concurrently and joins them all-or-nothing.
//!
//! # Pending values in documents
//!
//! A single-key mapping with one of these keys is a pending value:
//!
//! ```yaml
//! GIT_SHA: { $exec: "git rev-parse --short HEAD" }   # trimmed stdout
//! VERSION: { $file: "VERSION" }                       # trimmed contents
//! ```
//!
//! `$file` paths are relative to the resolver file and become dependency files.

use super::exec::run_shell;
use crate::error::{Result, SafeEnvError};
use crate::value::{yaml_key, EnvMap, EnvValue};
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Key marking a value computed by a shell command.
pub const EXEC_KEY: &str = "$exec";

/// Key marking a value read from a file.
pub const FILE_KEY: &str = "$file";

/// A value that settles later.
pub type PendingValue = BoxFuture<'static, Result<EnvValue>>;

/// One entry of an [`EnvTree`].
pub enum EnvNode {
    /// Already known.
    Leaf(EnvValue),
    /// Still being computed.
    Pending(PendingValue),
    /// Nested mapping, resolved recursively.
    Map(EnvTree),
}

impl fmt::Debug for EnvNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
            Self::Map(tree) => f.debug_tuple("Map").field(tree).finish(),
        }
    }
}

/// A mapping of names to [`EnvNode`]s plus the files it was built from.
#[derive(Debug, Default)]
pub struct EnvTree {
    entries: BTreeMap<String, EnvNode>,
    files: Vec<PathBuf>,
}

impl EnvTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a known value.
    pub fn leaf(mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Self {
        self.entries.insert(key.into(), EnvNode::Leaf(value.into()));
        self
    }

    /// Insert a value that is still being computed.
    pub fn pending<F>(mut self, key: impl Into<String>, future: F) -> Self
    where
        F: std::future::Future<Output = Result<EnvValue>> + Send + 'static,
    {
        self.entries
            .insert(key.into(), EnvNode::Pending(future.boxed()));
        self
    }

    /// Insert a nested mapping.
    pub fn nested(mut self, key: impl Into<String>, tree: EnvTree) -> Self {
        self.files.extend(tree.files.iter().cloned());
        self.entries.insert(key.into(), EnvNode::Map(tree));
        self
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files read while building this tree, including nested trees.
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.files
    }

    /// Build a tree from a parsed resolver document.
    ///
    /// `base_dir` anchors relative `$file` paths and is the working directory
    /// of `$exec` commands.
    pub fn from_document(document: serde_yaml::Mapping, base_dir: &Path) -> Self {
        let mut tree = Self::new();
        for (key, value) in document {
            let Some(key) = yaml_key(&key) else {
                tracing::debug!("skipping non-scalar resolver key");
                continue;
            };
            tree = match value {
                serde_yaml::Value::Mapping(map) => match pending_directive(&map) {
                    Some(Directive::Exec(command)) => {
                        let cwd = base_dir.to_path_buf();
                        tree.pending(key, async move {
                            run_shell(&command, &cwd).await.map(EnvValue::String)
                        })
                    }
                    Some(Directive::File(relative)) => {
                        let path = base_dir.join(relative);
                        tree.files.push(path.clone());
                        tree.pending(key, async move {
                            let content = tokio::fs::read_to_string(&path).await?;
                            Ok(EnvValue::String(content.trim().to_string()))
                        })
                    }
                    None => tree.nested(key, Self::from_document(map, base_dir)),
                },
                other => tree.leaf(key, EnvValue::from(other)),
            };
        }
        tree
    }
}

enum Directive {
    Exec(String),
    File(String),
}

fn pending_directive(map: &serde_yaml::Mapping) -> Option<Directive> {
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    let value = value.as_str()?.to_string();
    match key.as_str()? {
        EXEC_KEY => Some(Directive::Exec(value)),
        FILE_KEY => Some(Directive::File(value)),
        _ => None,
    }
}

/// Resolve every pending value in `tree`, concurrently.
///
/// Nested mappings become [`EnvValue::Map`]. If any pending value fails the
/// whole resolution fails with [`SafeEnvError::NestedValueFailure`] naming the
/// dotted key path.
pub async fn deep_resolve(tree: EnvTree) -> Result<EnvMap> {
    resolve_entries(tree.entries, String::new()).await
}

fn resolve_entries(
    entries: BTreeMap<String, EnvNode>,
    prefix: String,
) -> BoxFuture<'static, Result<EnvMap>> {
    async move {
        let settled = try_join_all(entries.into_iter().map(|(key, node)| {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            async move {
                let value = match node {
                    EnvNode::Leaf(value) => value,
                    EnvNode::Pending(pending) => pending.await.map_err(|e| nested_failure(path, e))?,
                    EnvNode::Map(tree) => EnvValue::Map(resolve_entries(tree.entries, path).await?),
                };
                Ok::<_, SafeEnvError>((key, value))
            }
        }))
        .await?;

        Ok(settled.into_iter().collect())
    }
    .boxed()
}

fn nested_failure(key: String, error: SafeEnvError) -> SafeEnvError {
    match error {
        SafeEnvError::NestedValueFailure { .. } => error,
        other => SafeEnvError::NestedValueFailure {
            key,
            message: other.to_string(),
        },
    }
}
