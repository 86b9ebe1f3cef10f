//! Value resolution across precedence sources.

use crate::value::{EnvMap, EnvValue};
use std::collections::HashMap;

/// The sources a variable can be resolved from.
///
/// Variables are resolved in priority order:
/// 1. Live process environment (highest priority)
/// 2. Environment loaded from the resolver file
/// 3. Configured defaults (lowest priority)
///
/// Each source is checked by key presence, so a defined `false`, `0` or
/// empty string stops the search.
#[derive(Debug, Default, Clone)]
pub struct EnvSources<'a> {
    /// Snapshot of the process environment.
    pub live: HashMap<String, String>,

    /// Fully resolved resolver environment.
    pub loaded: Option<&'a EnvMap>,

    /// Static defaults from configuration.
    pub defaults: Option<&'a EnvMap>,
}

impl<'a> EnvSources<'a> {
    /// Sources backed by the current process environment.
    pub fn from_process() -> Self {
        Self::with_live(std::env::vars().collect())
    }

    /// Sources backed by an explicit live environment.
    pub fn with_live(live: HashMap<String, String>) -> Self {
        Self {
            live,
            ..Default::default()
        }
    }

    /// Attach the loaded resolver environment.
    pub fn loaded(mut self, loaded: &'a EnvMap) -> Self {
        self.loaded = Some(loaded);
        self
    }

    /// Attach the configured defaults.
    pub fn defaults(mut self, defaults: &'a EnvMap) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Resolve a variable name to its value.
    ///
    /// Resolution order: live > loaded > defaults
    pub fn resolve(&self, name: &str) -> Option<EnvValue> {
        if let Some(value) = self.live.get(name) {
            return Some(EnvValue::String(value.clone()));
        }
        self.loaded
            .and_then(|loaded| loaded.get(name))
            .or_else(|| self.defaults.and_then(|defaults| defaults.get(name)))
            .cloned()
    }
}
