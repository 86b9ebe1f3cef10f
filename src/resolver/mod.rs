//! External environment loading.
//!
//! The loader turns an optional resolver into a fully resolved [`EnvMap`]
//! and the list of files it consulted:
//!
//! ```text
//! no resolver configured ─────────────────────────────► empty map
//! resolver file ─► search upward ─► not found ────────► empty map
//!                                 └► found ─► load ─► resolve nested ─► map
//! resolver function ──────────────────► call ─► resolve nested ─► map
//! ```
//!
//! - Upward search in [`search`]
//! - Export classification and the module cache in [`export`]
//! - Executable resolvers and `$exec` values in [`exec`]
//! - Trees of pending values in [`tree`]
//! - `.env` documents in [`env_file`]

pub mod env_file;
pub mod exec;
pub mod export;
pub mod search;
pub mod tree;

pub use env_file::EnvFileParser;
pub use exec::{run_shell, ExecResolver};
pub use export::{ResolveEnv, ResolverContext, ResolverExport, ResolverModules};
pub use search::find_upward;
pub use tree::{deep_resolve, EnvNode, EnvTree, PendingValue, EXEC_KEY, FILE_KEY};

use crate::error::{Result, SafeEnvError};
use crate::value::EnvMap;
use export::execution_failure;
use search::parent_dir;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the loaded environment comes from.
#[derive(Clone)]
pub enum ResolverRef {
    /// A file name searched upward from the context directory.
    File(PathBuf),
    /// An in-process resolver function.
    Custom(Arc<dyn ResolveEnv>),
}

impl ResolverRef {
    pub fn file(name: impl Into<PathBuf>) -> Self {
        Self::File(name.into())
    }

    pub fn custom(resolver: impl ResolveEnv + 'static) -> Self {
        Self::Custom(Arc::new(resolver))
    }
}

impl fmt::Debug for ResolverRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Custom(resolver) => f.debug_tuple("Custom").field(&resolver.name()).finish(),
        }
    }
}

/// Outcome of one environment load.
///
/// `files` is filled in as far as the load got, so it is meaningful even
/// when `values` is an error.
#[derive(Debug)]
pub struct EnvLoad {
    /// Resolver file and any files its values were read from, in order.
    pub files: Vec<PathBuf>,
    /// The fully resolved environment.
    pub values: Result<EnvMap>,
}

/// Loads the external environment for a build.
#[derive(Debug, Default)]
pub struct EnvLoader {
    modules: ResolverModules,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the environment described by `resolver`.
    ///
    /// A resolver file is reloaded on every call so edits are picked up.
    pub async fn load(
        &self,
        resolver: Option<&ResolverRef>,
        context_root: &Path,
        context: &ResolverContext,
    ) -> EnvLoad {
        let mut files = Vec::new();
        let values = self
            .load_into(resolver, context_root, context, &mut files)
            .await;
        dedup_in_order(&mut files);
        EnvLoad { files, values }
    }

    async fn load_into(
        &self,
        resolver: Option<&ResolverRef>,
        context_root: &Path,
        context: &ResolverContext,
        files: &mut Vec<PathBuf>,
    ) -> Result<EnvMap> {
        let Some(resolver) = resolver else {
            tracing::debug!("No environment resolver configured");
            return Ok(EnvMap::new());
        };

        let tree = match resolver {
            ResolverRef::Custom(custom) => custom
                .resolve(context)
                .await
                .map_err(|e| execution_failure(custom.as_ref(), e))?,
            ResolverRef::File(name) => {
                let Some(path) = find_upward(context_root, name).await? else {
                    tracing::debug!(
                        "Resolver {} not found above {}",
                        name.display(),
                        context_root.display()
                    );
                    return Ok(EnvMap::new());
                };
                tracing::info!("Using environment resolver {}", path.display());
                files.push(path.clone());

                match self.modules.reload(&path).await? {
                    ResolverExport::Mapping(document) => {
                        EnvTree::from_document(document, &parent_dir(&path))
                    }
                    ResolverExport::Function(function) => function
                        .resolve(context)
                        .await
                        .map_err(|e| execution_failure(function.as_ref(), e))?,
                    ResolverExport::Invalid { reason } => {
                        return Err(SafeEnvError::InvalidResolverExport { path, reason });
                    }
                }
            }
        };

        files.extend(tree.dependencies().iter().cloned());
        deep_resolve(tree).await
    }
}

fn dedup_in_order(files: &mut Vec<PathBuf>) {
    let mut seen = std::collections::HashSet::new();
    files.retain(|path| seen.insert(path.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::EnvValue;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct StaticResolver;

    #[async_trait]
    impl ResolveEnv for StaticResolver {
        fn name(&self) -> String {
            "static".to_string()
        }

        async fn resolve(&self, context: &ResolverContext) -> Result<EnvTree> {
            let mode = context.args.get("mode").cloned().unwrap_or_default();
            Ok(EnvTree::new()
                .leaf("MODE", mode)
                .pending("LATE", async { Ok(EnvValue::Number(1.0)) }))
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl ResolveEnv for FailingResolver {
        fn name(&self) -> String {
            "failing".to_string()
        }

        async fn resolve(&self, _context: &ResolverContext) -> Result<EnvTree> {
            Err(SafeEnvError::Other(anyhow::anyhow!("rejected")))
        }
    }

    #[tokio::test]
    async fn no_resolver_is_empty_map() {
        let temp = TempDir::new().unwrap();
        let load = EnvLoader::new()
            .load(None, temp.path(), &ResolverContext::default())
            .await;
        assert!(load.values.unwrap().is_empty());
        assert!(load.files.is_empty());
    }

    #[tokio::test]
    async fn missing_resolver_file_is_empty_map() {
        let temp = TempDir::new().unwrap();
        let resolver = ResolverRef::file("safe-env-missing-resolver.yml");
        let load = EnvLoader::new()
            .load(Some(&resolver), temp.path(), &ResolverContext::default())
            .await;
        assert!(load.values.unwrap().is_empty());
        assert!(load.files.is_empty());
    }

    #[tokio::test]
    async fn mapping_resolver_is_loaded_with_dependencies() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(temp.path().join("VERSION"), "2.0.0\n").unwrap();
        fs::write(
            temp.path().join("env.yml"),
            "API_URL: https://example.com\nVERSION: { $file: VERSION }\n",
        )
        .unwrap();

        let resolver = ResolverRef::file("env.yml");
        let load = EnvLoader::new()
            .load(Some(&resolver), &src, &ResolverContext::default())
            .await;

        assert_eq!(
            load.files,
            vec![temp.path().join("env.yml"), temp.path().join("VERSION")]
        );
        let values = load.values.unwrap();
        assert_eq!(values["API_URL"], EnvValue::from("https://example.com"));
        assert_eq!(values["VERSION"], EnvValue::from("2.0.0"));
    }

    #[tokio::test]
    async fn resolver_edits_are_picked_up_between_loads() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("env.yml");
        fs::write(&path, "A: one\n").unwrap();
        let loader = EnvLoader::new();
        let resolver = ResolverRef::file("env.yml");
        let context = ResolverContext::default();

        let first = loader.load(Some(&resolver), temp.path(), &context).await;
        assert_eq!(first.values.unwrap()["A"], EnvValue::from("one"));

        fs::write(&path, "A: two\n").unwrap();
        let second = loader.load(Some(&resolver), temp.path(), &context).await;
        assert_eq!(second.values.unwrap()["A"], EnvValue::from("two"));
    }

    #[tokio::test]
    async fn invalid_export_keeps_resolver_as_dependency() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("env.yml"), "just a string\n").unwrap();

        let resolver = ResolverRef::file("env.yml");
        let load = EnvLoader::new()
            .load(Some(&resolver), temp.path(), &ResolverContext::default())
            .await;

        assert_eq!(load.files, vec![temp.path().join("env.yml")]);
        let err = load.values.unwrap_err();
        assert!(matches!(err, SafeEnvError::InvalidResolverExport { .. }));
        assert!(err.to_string().contains("env.yml"));
    }

    #[tokio::test]
    async fn custom_resolver_receives_context() {
        let temp = TempDir::new().unwrap();
        let resolver = ResolverRef::custom(StaticResolver);
        let context = ResolverContext::default().arg("mode", "production");

        let load = EnvLoader::new()
            .load(Some(&resolver), temp.path(), &context)
            .await;
        let values = load.values.unwrap();
        assert_eq!(values["MODE"], EnvValue::from("production"));
        assert_eq!(values["LATE"], EnvValue::Number(1.0));
    }

    #[tokio::test]
    async fn custom_resolver_errors_are_execution_failures() {
        let temp = TempDir::new().unwrap();
        let resolver = ResolverRef::custom(FailingResolver);

        let load = EnvLoader::new()
            .load(Some(&resolver), temp.path(), &ResolverContext::default())
            .await;
        match load.values.unwrap_err() {
            SafeEnvError::ResolverExecutionFailure { resolver, message } => {
                assert_eq!(resolver, "failing");
                assert!(message.contains("rejected"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut files = vec![
            PathBuf::from("a"),
            PathBuf::from("b"),
            PathBuf::from("a"),
        ];
        dedup_in_order(&mut files);
        assert_eq!(files, vec![PathBuf::from("a"), PathBuf::from("b")]);
    }
}
