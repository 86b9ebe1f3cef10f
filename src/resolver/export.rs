//! Resolver exports and the module cache that loads them.
//!
//! A resolver file is classified once per load into a [`ResolverExport`]:
//!
//! | File                         | Export              |
//! |------------------------------|---------------------|
//! | `*.json`, `*.yml`, `*.yaml`  | `Mapping` document  |
//! | `*.env`, `.env`              | `Mapping` of strings|
//! | any other executable file    | `Function`          |
//! | anything else                | `Invalid`           |

use super::env_file::EnvFileParser;
use super::exec::{describe, ExecResolver};
use super::tree::EnvTree;
use crate::error::{Result, SafeEnvError};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The object handed to function resolvers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolverContext {
    /// Parsed command-line arguments of the build.
    pub args: BTreeMap<String, String>,
}

impl ResolverContext {
    pub fn new(args: BTreeMap<String, String>) -> Self {
        Self { args }
    }

    /// Add one argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// The arguments rendered as `--key=value`, in key order.
    pub fn argv(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|(key, value)| format!("--{key}={value}"))
            .collect()
    }
}

/// A resolver function: given the context, produce an environment tree.
///
/// Executable resolver files implement this via [`ExecResolver`]; library
/// hosts can pass their own implementation directly.
#[async_trait]
pub trait ResolveEnv: Send + Sync {
    /// Name used in error messages.
    fn name(&self) -> String;

    /// Produce the environment.
    async fn resolve(&self, context: &ResolverContext) -> Result<EnvTree>;
}

/// What a resolver file exports.
#[derive(Clone)]
pub enum ResolverExport {
    /// A plain mapping document.
    Mapping(serde_yaml::Mapping),
    /// A function to call with the resolver context.
    Function(Arc<dyn ResolveEnv>),
    /// Neither; `reason` explains why.
    Invalid { reason: String },
}

impl fmt::Debug for ResolverExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mapping(map) => f.debug_tuple("Mapping").field(&map.len()).finish(),
            Self::Function(func) => f.debug_tuple("Function").field(&func.name()).finish(),
            Self::Invalid { reason } => f.debug_struct("Invalid").field("reason", reason).finish(),
        }
    }
}

impl ResolverExport {
    /// Classify the file at `path`.
    ///
    /// Only I/O failures are errors; every shape problem is [`Self::Invalid`].
    pub async fn classify(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let is_dotenv = extension.as_deref() == Some("env")
            || path.file_name().is_some_and(|name| name == ".env");

        if is_dotenv {
            let content = tokio::fs::read_to_string(path).await?;
            let vars = EnvFileParser::parse(&content);
            let map = vars
                .into_iter()
                .map(|(k, v)| (serde_yaml::Value::String(k), serde_yaml::Value::String(v)))
                .collect();
            return Ok(Self::Mapping(map));
        }

        match extension.as_deref() {
            Some("json") => {
                let content = tokio::fs::read_to_string(path).await?;
                Ok(match serde_json::from_str::<serde_yaml::Value>(&content) {
                    Ok(document) => Self::from_document(document),
                    Err(e) => Self::Invalid {
                        reason: format!("not valid JSON: {e}"),
                    },
                })
            }
            Some("yml" | "yaml") => {
                let content = tokio::fs::read_to_string(path).await?;
                Ok(match serde_yaml::from_str::<serde_yaml::Value>(&content) {
                    Ok(document) => Self::from_document(document),
                    Err(e) => Self::Invalid {
                        reason: format!("not valid YAML: {e}"),
                    },
                })
            }
            _ => {
                if is_executable(path).await? {
                    Ok(Self::Function(Arc::new(ExecResolver::new(path))))
                } else {
                    Ok(Self::Invalid {
                        reason: "file is neither a mapping document nor executable".to_string(),
                    })
                }
            }
        }
    }

    fn from_document(document: serde_yaml::Value) -> Self {
        match document {
            serde_yaml::Value::Mapping(map) => Self::Mapping(map),
            other => Self::Invalid {
                reason: format!("document root is {}, not a mapping", describe(&other)),
            },
        }
    }
}

#[cfg(unix)]
async fn is_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path).await?;
    Ok(metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
async fn is_executable(path: &Path) -> Result<bool> {
    let metadata = tokio::fs::metadata(path).await?;
    let runnable = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "exe" | "bat" | "cmd"));
    Ok(metadata.is_file() && runnable)
}

/// Loads resolver exports and caches them by path.
///
/// [`load`](Self::load) returns the cached export when there is one;
/// [`reload`](Self::reload) drops it first so the file is read again.
#[derive(Debug, Default)]
pub struct ResolverModules {
    cache: Mutex<HashMap<PathBuf, ResolverExport>>,
}

impl ResolverModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the export for `path`, using the cache when possible.
    pub async fn load(&self, path: &Path) -> Result<ResolverExport> {
        let mut cache = self.cache.lock().await;
        if let Some(export) = cache.get(path) {
            return Ok(export.clone());
        }

        let export = ResolverExport::classify(path).await?;
        tracing::debug!("Loaded resolver {}: {:?}", path.display(), export);
        cache.insert(path.to_path_buf(), export.clone());
        Ok(export)
    }

    /// Forget the cached export for `path` and load it again.
    pub async fn reload(&self, path: &Path) -> Result<ResolverExport> {
        self.invalidate(path).await;
        self.load(path).await
    }

    /// Forget the cached export for `path`.
    pub async fn invalidate(&self, path: &Path) {
        self.cache.lock().await.remove(path);
    }
}

/// Convert an arbitrary error from a host-supplied resolver into the
/// resolver-execution kind, leaving domain errors alone.
pub(crate) fn execution_failure(resolver: &dyn ResolveEnv, error: SafeEnvError) -> SafeEnvError {
    match error {
        SafeEnvError::InvalidResolverExport { .. }
        | SafeEnvError::ResolverExecutionFailure { .. }
        | SafeEnvError::NestedValueFailure { .. } => error,
        other => SafeEnvError::ResolverExecutionFailure {
            resolver: resolver.name(),
            message: other.to_string(),
        },
    }
}
