//! Rewriting references in the original source.

use super::comments::{comment_spans, in_spans, strip_comments};
use super::filter::Filter;
use super::literal::encode;
use super::resolve::EnvSources;
use super::scanner::scan;
use crate::error::{SafeEnvError, Result};
use std::collections::HashMap;

/// What happens to every occurrence of one raw reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// The filter rejected the reference; keep the original text.
    Keep,
    /// Replace with this literal text.
    Literal(String),
}

/// Decide the replacement for a single reference.
///
/// The filter runs before the missing-value check, so a filtered reference
/// never fails. Empty strings count as missing.
pub fn decide(name: &str, sources: &EnvSources<'_>, filter: &Filter) -> Result<Replacement> {
    let value = sources.resolve(name);

    if !filter.allows(name, value.as_ref()) {
        return Ok(Replacement::Keep);
    }

    match value {
        Some(value) if !value.is_empty_string() => Ok(Replacement::Literal(encode(&value))),
        _ => Err(SafeEnvError::missing(name)),
    }
}

/// Substitute every `process.env.NAME` reference outside comments.
///
/// Candidates come from the comment-stripped view, in order of appearance.
/// Each distinct raw token is decided once and every occurrence of it outside
/// comments gets the same replacement. Either every candidate resolves or
/// nothing is returned.
///
/// # Example
///
/// ```
/// use safe_env::substitute::{substitute_env, EnvSources, Filter};
/// use std::collections::HashMap;
///
/// let sources = EnvSources::with_live(HashMap::from([("VAR1".into(), "abc1".into())]));
/// let out = substitute_env("const v = process.env.VAR1;", &sources, &Filter::default()).unwrap();
/// assert_eq!(out, r#"const v = "abc1";"#);
/// ```
pub fn substitute_env(source: &str, sources: &EnvSources<'_>, filter: &Filter) -> Result<String> {
    let stripped = strip_comments(source);

    let mut decisions: HashMap<&str, Replacement> = HashMap::new();
    for reference in scan(&stripped) {
        if decisions.contains_key(reference.raw) {
            continue;
        }
        let replacement = decide(reference.name, sources, filter)?;
        tracing::debug!("{} -> {:?}", reference.raw, replacement);
        decisions.insert(reference.raw, replacement);
    }

    if decisions.is_empty() {
        return Ok(source.to_string());
    }

    let spans = comment_spans(source);
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for reference in scan(source) {
        if in_spans(&spans, reference.span.start) {
            continue;
        }
        if let Some(Replacement::Literal(text)) = decisions.get(reference.raw) {
            output.push_str(&source[cursor..reference.span.start]);
            output.push_str(text);
            cursor = reference.span.end;
        }
    }
    output.push_str(&source[cursor..]);

    Ok(output)
}
