//! Substitution filters.

use crate::value::EnvValue;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type Predicate = dyn Fn(&str, Option<&EnvValue>) -> bool + Send + Sync;

/// Decides whether a reference is substituted.
///
/// The predicate receives the variable name and its resolved value (`None`
/// when no source defines it). Returning `false` leaves the reference in the
/// output untouched and suppresses the missing-variable error.
#[derive(Clone)]
pub struct Filter(Arc<Predicate>);

impl Filter {
    /// Wrap an arbitrary predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str, Option<&EnvValue>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// A filter that rejects the given names and the given string values.
    ///
    /// # Example
    ///
    /// ```
    /// use safe_env::substitute::Filter;
    /// use safe_env::value::EnvValue;
    ///
    /// let filter = Filter::ignoring(["IGNORE_NAME"], ["ignore-me"]);
    /// assert!(!filter.allows("IGNORE_NAME", None));
    /// assert!(!filter.allows("VAR1", Some(&EnvValue::from("ignore-me"))));
    /// assert!(filter.allows("VAR1", Some(&EnvValue::from("abc"))));
    /// ```
    pub fn ignoring<N, V>(names: N, values: V) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        let values: HashSet<String> = values.into_iter().map(Into::into).collect();
        if names.is_empty() && values.is_empty() {
            return Self::default();
        }

        Self::new(move |name, value| {
            if names.contains(name) {
                return false;
            }
            !value
                .and_then(EnvValue::as_str)
                .is_some_and(|v| values.contains(v))
        })
    }

    /// Evaluate the filter.
    pub fn allows(&self, name: &str, value: Option<&EnvValue>) -> bool {
        (self.0)(name, value)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new(|_, _| true)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter(..)")
    }
}
