//! Configuration schema for `.safe-env.yml`.

use crate::loader::LoaderOptions;
use crate::resolver::ResolverRef;
use crate::substitute::Filter;
use crate::value::EnvMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafeEnvConfig {
    /// Resolver file name, searched upward from the context directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_resolver: Option<PathBuf>,

    /// Lowest-precedence values
    #[serde(skip_serializing_if = "EnvMap::is_empty")]
    pub defaults: EnvMap,

    /// Names that are never substituted
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,

    /// String values that suppress substitution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore_values: Vec<String>,

    /// Arguments handed to resolver functions
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, String>,
}

impl SafeEnvConfig {
    /// Layer `other` on top of this config.
    ///
    /// Scalars in `other` win, maps are merged key by key, lists are appended.
    pub fn merge(&mut self, other: SafeEnvConfig) {
        if other.env_resolver.is_some() {
            self.env_resolver = other.env_resolver;
        }
        self.defaults.extend(other.defaults);
        self.args.extend(other.args);
        for name in other.ignore {
            if !self.ignore.contains(&name) {
                self.ignore.push(name);
            }
        }
        for value in other.ignore_values {
            if !self.ignore_values.contains(&value) {
                self.ignore_values.push(value);
            }
        }
    }

    pub fn filter(&self) -> Filter {
        Filter::ignoring(self.ignore.iter().cloned(), self.ignore_values.iter().cloned())
    }

    pub fn into_options(self) -> LoaderOptions {
        let filter = self.filter();
        LoaderOptions {
            defaults: self.defaults,
            filter,
            env_resolver: self.env_resolver.map(ResolverRef::File),
            args: self.args,
        }
    }
}
