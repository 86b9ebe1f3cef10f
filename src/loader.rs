//! The build-tool hook.
//!
//! A host build tool calls [`Loader::transform`] once per source file. The
//! loader loads the external environment, substitutes references, and tells
//! the host which files the result depends on, whether or not the transform
//! succeeded.
//!
//! # Example
//!
//! ```
//! use safe_env::loader::{BuildContext, Loader, LoaderOptions};
//! use safe_env::value::{EnvMap, EnvValue};
//! use std::collections::HashMap;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let options = LoaderOptions {
//!     defaults: EnvMap::from([("API_URL".to_string(), EnvValue::from("https://example.com"))]),
//!     ..Default::default()
//! };
//! let loader = Loader::new(options).with_live_env(HashMap::new());
//! let mut ctx = BuildContext::new("src/app.js", ".");
//!
//! let out = loader.transform("fetch(process.env.API_URL)", &mut ctx).await.unwrap();
//! assert_eq!(out, r#"fetch("https://example.com")"#);
//! assert!(ctx.is_cacheable());
//! # });
//! ```

use crate::error::SafeEnvError;
use crate::resolver::{EnvLoader, ResolverContext, ResolverRef};
use crate::substitute::{substitute_env, EnvSources, Filter};
use crate::value::EnvMap;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Prefix of every error reported to the host.
pub const ERROR_MARKER: &str = "[SAFE-ENVIRONMENT-LOADER]";

/// What the host build tool provides for one transform.
pub trait LoaderContext: Send {
    /// The file being transformed.
    fn resource_path(&self) -> &Path;

    /// Directory the resolver search starts from.
    fn context_root(&self) -> &Path;

    /// Register a file whose change must re-run this transform.
    fn add_dependency(&mut self, path: &Path);

    /// Tell the host whether the result may be cached.
    fn cacheable(&mut self, _cacheable: bool) {}
}

/// Options recognised by the loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Lowest-precedence values.
    pub defaults: EnvMap,
    /// Suppresses substitution per name/value.
    pub filter: Filter,
    /// Where the external environment comes from.
    pub env_resolver: Option<ResolverRef>,
    /// Command-line arguments handed to resolver functions.
    pub args: BTreeMap<String, String>,
}

/// A failed transform, as reported to the host.
#[derive(Debug, Error)]
#[error("{marker} {source}", marker = ERROR_MARKER)]
pub struct LoaderError {
    #[source]
    source: SafeEnvError,
    dependencies: Vec<PathBuf>,
}

impl LoaderError {
    /// The underlying error.
    pub fn kind(&self) -> &SafeEnvError {
        &self.source
    }

    /// Dependency files reported alongside the failure.
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.dependencies
    }
}

/// Last known dependency files per resource, for reporting after failures.
#[derive(Debug, Clone, Default)]
pub struct DependencyCache {
    entries: Arc<Mutex<HashMap<PathBuf, Vec<PathBuf>>>>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `files` as the dependencies of `resource`.
    pub fn record(&self, resource: &Path, files: &[PathBuf]) {
        self.entries()
            .insert(resource.to_path_buf(), files.to_vec());
    }

    /// The last recorded dependencies of `resource`.
    pub fn last_known(&self, resource: &Path) -> Vec<PathBuf> {
        self.entries().get(resource).cloned().unwrap_or_default()
    }

    /// Entries are plain data, so a panic in another holder leaves them usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<PathBuf>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Dependency cache lock was poisoned; recovering entries");
            PoisonError::into_inner(poisoned)
        })
    }
}

/// The loader. Keep one per build process so the dependency cache survives
/// between files.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    options: LoaderOptions,
    env_loader: Arc<EnvLoader>,
    dependencies: DependencyCache,
    live_env: Option<HashMap<String, String>>,
}

impl Loader {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Use a fixed live environment instead of the process environment.
    pub fn with_live_env(mut self, live_env: HashMap<String, String>) -> Self {
        self.live_env = Some(live_env);
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// The process-wide dependency cache.
    pub fn dependency_cache(&self) -> &DependencyCache {
        &self.dependencies
    }

    fn live_sources(&self) -> EnvSources<'_> {
        match &self.live_env {
            Some(live) => EnvSources::with_live(live.clone()),
            None => EnvSources::from_process(),
        }
    }

    /// Load only the external environment, as seen from `context_root`.
    pub async fn load_env(&self, context_root: &Path) -> Result<EnvMap, LoaderError> {
        let context = ResolverContext::new(self.options.args.clone());
        let load = self
            .env_loader
            .load(self.options.env_resolver.as_ref(), context_root, &context)
            .await;
        load.values.map_err(|source| LoaderError {
            source,
            dependencies: load.files,
        })
    }

    /// Transform one source file.
    ///
    /// On failure nothing is substituted; the error carries the marker prefix
    /// and the dependencies already reported to `ctx`.
    pub async fn transform(
        &self,
        source: &str,
        ctx: &mut dyn LoaderContext,
    ) -> Result<String, LoaderError> {
        ctx.cacheable(true);
        let resource = ctx.resource_path().to_path_buf();
        let context = ResolverContext::new(self.options.args.clone());

        let load = self
            .env_loader
            .load(self.options.env_resolver.as_ref(), ctx.context_root(), &context)
            .await;

        let dependencies = if load.values.is_err() && load.files.is_empty() {
            let last_known = self.dependencies.last_known(&resource);
            tracing::warn!(
                "Environment load failed for {}; reporting {} last known dependencies",
                resource.display(),
                last_known.len()
            );
            last_known
        } else {
            self.dependencies.record(&resource, &load.files);
            load.files
        };
        for dependency in &dependencies {
            ctx.add_dependency(dependency);
        }

        let result = load.values.and_then(|loaded| {
            let sources = self
                .live_sources()
                .loaded(&loaded)
                .defaults(&self.options.defaults);
            substitute_env(source, &sources, &self.options.filter)
        });

        result.map_err(|source| {
            tracing::debug!("Transform of {} failed: {}", resource.display(), source);
            LoaderError {
                source,
                dependencies,
            }
        })
    }
}

/// A [`LoaderContext`] that records what the loader reports.
#[derive(Debug, Clone)]
pub struct BuildContext {
    resource_path: PathBuf,
    context_root: PathBuf,
    dependencies: Vec<PathBuf>,
    cacheable: bool,
}

impl BuildContext {
    pub fn new(resource_path: impl Into<PathBuf>, context_root: impl Into<PathBuf>) -> Self {
        Self {
            resource_path: resource_path.into(),
            context_root: context_root.into(),
            dependencies: Vec::new(),
            cacheable: false,
        }
    }

    /// Dependencies registered so far, without duplicates.
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.dependencies
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }
}

impl LoaderContext for BuildContext {
    fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    fn context_root(&self) -> &Path {
        &self.context_root
    }

    fn add_dependency(&mut self, path: &Path) {
        if !self.dependencies.iter().any(|known| known == path) {
            self.dependencies.push(path.to_path_buf());
        }
    }

    fn cacheable(&mut self, cacheable: bool) {
        self.cacheable = cacheable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{EnvTree, ResolveEnv};
    use crate::value::EnvValue;
    use std::fs;
    use tempfile::TempDir;

    fn live(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn loader_with(options: LoaderOptions, env: &[(&str, &str)]) -> Loader {
        Loader::new(options).with_live_env(live(env))
    }

    const SOURCE: &str = r#"
  const var1 = process.env.VAR1;
  const var2 = process.env.VAR2;
  // const var3 = process.env.VAR3;
  const var4 = process.env.VAR4;
  /*
    const var5 = process.env.VAR5;
    const var6 = process.env.VAR6;
  */
  const var7 = process.env.VAR7;"#;

    #[tokio::test]
    async fn replaces_outside_comments() {
        let loader = loader_with(
            LoaderOptions::default(),
            &[("VAR1", "abc1"), ("VAR2", "abc2"), ("VAR4", "abc4"), ("VAR7", "abc7")],
        );
        let mut ctx = BuildContext::new("src/index.js", ".");

        let out = loader.transform(SOURCE, &mut ctx).await.unwrap();
        assert_eq!(
            out,
            r#"
  const var1 = "abc1";
  const var2 = "abc2";
  // const var3 = process.env.VAR3;
  const var4 = "abc4";
  /*
    const var5 = process.env.VAR5;
    const var6 = process.env.VAR6;
  */
  const var7 = "abc7";"#
        );
    }

    #[tokio::test]
    async fn missing_variable_error_has_marker() {
        let loader = loader_with(
            LoaderOptions::default(),
            &[("VAR1", "abc1"), ("VAR2", "abc2"), ("VAR4", "abc4")],
        );
        let mut ctx = BuildContext::new("src/index.js", ".");

        let err = loader.transform(SOURCE, &mut ctx).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with(ERROR_MARKER));
        assert!(msg.starts_with("[SAFE-ENVIRONMENT-LOADER] Environment variable \"VAR7\" is missing!"));
        assert!(matches!(err.kind(), SafeEnvError::MissingVariable { .. }));
    }

    #[tokio::test]
    async fn marks_result_cacheable() {
        let loader = loader_with(LoaderOptions::default(), &[]);
        let mut ctx = BuildContext::new("a.js", ".");
        loader.transform("1 + 1", &mut ctx).await.unwrap();
        assert!(ctx.is_cacheable());
    }

    #[tokio::test]
    async fn reports_resolver_file_as_dependency() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("env.yml"), "API: loaded\n").unwrap();
        let options = LoaderOptions {
            env_resolver: Some(ResolverRef::file("env.yml")),
            ..Default::default()
        };
        let loader = loader_with(options, &[]);
        let mut ctx = BuildContext::new(temp.path().join("a.js"), temp.path());

        let out = loader.transform("x(process.env.API)", &mut ctx).await.unwrap();
        assert_eq!(out, r#"x("loaded")"#);
        assert_eq!(ctx.dependencies(), &[temp.path().join("env.yml")]);
    }

    #[tokio::test]
    async fn live_env_beats_resolver_and_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("env.yml"), "API: loaded\nOTHER: loaded\n").unwrap();
        let options = LoaderOptions {
            env_resolver: Some(ResolverRef::file("env.yml")),
            defaults: EnvMap::from([
                ("API".to_string(), EnvValue::from("default")),
                ("LAST".to_string(), EnvValue::from("default")),
            ]),
            ..Default::default()
        };
        let loader = loader_with(options, &[("API", "live")]);
        let mut ctx = BuildContext::new(temp.path().join("a.js"), temp.path());

        let out = loader
            .transform("[process.env.API, process.env.OTHER, process.env.LAST]", &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, r#"["live", "loaded", "default"]"#);
    }

    #[tokio::test]
    async fn missing_variable_still_reports_dependencies() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("env.yml"), "OTHER: x\n").unwrap();
        let options = LoaderOptions {
            env_resolver: Some(ResolverRef::file("env.yml")),
            ..Default::default()
        };
        let loader = loader_with(options, &[]);
        let mut ctx = BuildContext::new(temp.path().join("a.js"), temp.path());

        let err = loader.transform("process.env.NOPE", &mut ctx).await.unwrap_err();
        assert_eq!(err.dependencies(), &[temp.path().join("env.yml")]);
        assert_eq!(ctx.dependencies(), &[temp.path().join("env.yml")]);
    }

    struct RejectingResolver;

    #[async_trait::async_trait]
    impl ResolveEnv for RejectingResolver {
        fn name(&self) -> String {
            "rejecting".to_string()
        }

        async fn resolve(&self, _context: &ResolverContext) -> crate::error::Result<EnvTree> {
            Err(SafeEnvError::Other(anyhow::anyhow!("backend unavailable")))
        }
    }

    #[tokio::test]
    async fn falls_back_to_last_known_dependencies() {
        let temp = TempDir::new().unwrap();
        let resource = temp.path().join("a.js");
        let options = LoaderOptions {
            env_resolver: Some(ResolverRef::custom(RejectingResolver)),
            ..Default::default()
        };
        let loader = loader_with(options, &[]);
        loader
            .dependency_cache()
            .record(&resource, &[temp.path().join("env.sh")]);
        let mut ctx = BuildContext::new(&resource, temp.path());

        let err = loader.transform("1", &mut ctx).await.unwrap_err();
        assert!(matches!(err.kind(), SafeEnvError::ResolverExecutionFailure { .. }));
        assert_eq!(err.dependencies(), &[temp.path().join("env.sh")]);
        assert_eq!(ctx.dependencies(), &[temp.path().join("env.sh")]);
    }

    #[tokio::test]
    async fn success_replaces_cached_dependencies() {
        let temp = TempDir::new().unwrap();
        let resource = temp.path().join("a.js");
        let loader = loader_with(LoaderOptions::default(), &[]);
        loader
            .dependency_cache()
            .record(&resource, &[temp.path().join("stale.yml")]);
        let mut ctx = BuildContext::new(&resource, temp.path());

        loader.transform("1", &mut ctx).await.unwrap();
        assert!(loader.dependency_cache().last_known(&resource).is_empty());
    }

    #[tokio::test]
    async fn missing_resolver_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let options = LoaderOptions {
            env_resolver: Some(ResolverRef::file("safe-env-absent-resolver.yml")),
            defaults: EnvMap::from([("CUSTOM_VAR".to_string(), EnvValue::from("custom"))]),
            ..Default::default()
        };
        let loader = loader_with(options, &[]);
        let mut ctx = BuildContext::new(temp.path().join("a.js"), temp.path());

        let out = loader
            .transform("x(process.env.CUSTOM_VAR)", &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, r#"x("custom")"#);
        assert!(ctx.dependencies().is_empty());
    }

    #[tokio::test]
    async fn missing_resolver_file_without_default_is_missing_variable() {
        let temp = TempDir::new().unwrap();
        let options = LoaderOptions {
            env_resolver: Some(ResolverRef::file("safe-env-absent-resolver.yml")),
            ..Default::default()
        };
        let loader = loader_with(options, &[]);
        let mut ctx = BuildContext::new(temp.path().join("a.js"), temp.path());

        let err = loader
            .transform("x(process.env.CUSTOM_VAR)", &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            SafeEnvError::MissingVariable { name } if name == "CUSTOM_VAR"
        ));
        assert!(err.dependencies().is_empty());
    }

    #[test]
    fn dependency_cache_survives_poisoned_lock() {
        let cache = DependencyCache::new();
        let resource = Path::new("a.js");
        cache.record(resource, &[PathBuf::from("env.yml")]);

        let shared = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.entries.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(cache.entries.is_poisoned());

        assert_eq!(cache.last_known(resource), vec![PathBuf::from("env.yml")]);
        cache.record(resource, &[PathBuf::from("other.yml")]);
        assert_eq!(cache.last_known(resource), vec![PathBuf::from("other.yml")]);
    }

    #[test]
    fn dependency_cache_overwrites_per_resource() {
        let cache = DependencyCache::new();
        let resource = Path::new("a.js");
        cache.record(resource, &[PathBuf::from("one")]);
        cache.record(resource, &[PathBuf::from("two")]);
        assert_eq!(cache.last_known(resource), vec![PathBuf::from("two")]);
        assert!(cache.last_known(Path::new("b.js")).is_empty());
    }

    #[test]
    fn build_context_dedups_dependencies() {
        let mut ctx = BuildContext::new("a.js", ".");
        ctx.add_dependency(Path::new("env.yml"));
        ctx.add_dependency(Path::new("env.yml"));
        assert_eq!(ctx.dependencies().len(), 1);
    }
}
