//! `process.env.NAME` reference scanning.

use regex::{CaptureMatches, Regex};
use std::ops::Range;
use std::sync::LazyLock;

/// The reference that is always left to the bundler.
pub const RESERVED_REFERENCE: &str = "process.env.NODE_ENV";

static REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)process\.env\.([a-z0-9_]+)").expect("REFERENCE_REGEX must compile")
});

/// A located `process.env.NAME` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef<'a> {
    /// The matched text, e.g. `process.env.API_URL`.
    pub raw: &'a str,
    /// The bare variable name, e.g. `API_URL`.
    pub name: &'a str,
    /// Byte range of `raw` in the scanned text.
    pub span: Range<usize>,
}

impl VariableRef<'_> {
    /// Whether this is the reserved `process.env.NODE_ENV` reference.
    pub fn is_reserved(&self) -> bool {
        self.raw == RESERVED_REFERENCE
    }
}

/// Lazy left-to-right iterator over references in a text.
///
/// Duplicates are yielded every time they appear; the reserved reference is
/// skipped.
pub struct References<'a> {
    matches: CaptureMatches<'static, 'a>,
}

impl<'a> Iterator for References<'a> {
    type Item = VariableRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for caps in self.matches.by_ref() {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let reference = VariableRef {
                raw: whole.as_str(),
                name: name.as_str(),
                span: whole.range(),
            };
            if !reference.is_reserved() {
                return Some(reference);
            }
        }
        None
    }
}

/// Scan `text` for variable references.
pub fn scan(text: &str) -> References<'_> {
    References {
        matches: REFERENCE_REGEX.captures_iter(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<&str> {
        scan(text).map(|r| r.name).collect()
    }

    #[test]
    fn finds_references_in_order() {
        let text = "a(process.env.B); c(process.env.A_1);";
        assert_eq!(names(text), vec!["B", "A_1"]);
    }

    #[test]
    fn keeps_duplicates() {
        assert_eq!(
            names("process.env.X + process.env.X"),
            vec!["X", "X"]
        );
    }

    #[test]
    fn skips_reserved_reference() {
        assert_eq!(
            names("if (process.env.NODE_ENV) use(process.env.API)"),
            vec!["API"]
        );
    }

    #[test]
    fn reserved_check_is_exact() {
        assert_eq!(names("process.env.NODE_ENV_EXTRA"), vec!["NODE_ENV_EXTRA"]);
    }

    #[test]
    fn matches_case_insensitively() {
        let refs: Vec<_> = scan("Process.Env.myVar").collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].raw, "Process.Env.myVar");
        assert_eq!(refs[0].name, "myVar");
    }

    #[test]
    fn name_stops_at_non_word_character() {
        let refs: Vec<_> = scan("x = process.env.HOST.trim()").collect();
        assert_eq!(refs[0].raw, "process.env.HOST");
        assert_eq!(refs[0].span, 4..20);
    }

    #[test]
    fn bracket_access_is_not_a_reference() {
        assert!(names("process.env['HOST']").is_empty());
    }
}
