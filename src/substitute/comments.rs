//! Heuristic comment detection.
//!
//! This is not a lexer. Block comments (`/* ... */`, across lines) and line
//! comments (`// ...`) are found with a single regular expression. A `//`
//! directly after `:` is never a line comment, so `"https://host/path"`
//! survives.

use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

// Group 1 is the character before `//`; it is not part of the comment.
static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)/\*(?s:.*?)\*/|(^|[^:])//.*$").expect("COMMENT_REGEX must compile")
});

/// Byte ranges of every comment in `source`, in order.
pub fn comment_spans(source: &str) -> Vec<Range<usize>> {
    COMMENT_REGEX
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let start = caps.get(1).map_or(whole.start(), |prefix| prefix.end());
            Some(start..whole.end())
        })
        .collect()
}

/// Remove comments from `source`.
///
/// The result is only used to decide which references are candidates; it is
/// never returned to the host.
pub fn strip_comments(source: &str) -> Cow<'_, str> {
    let spans = comment_spans(source);
    if spans.is_empty() {
        return Cow::Borrowed(source);
    }

    let mut stripped = String::with_capacity(source.len());
    let mut cursor = 0;
    for span in spans {
        stripped.push_str(&source[cursor..span.start]);
        cursor = span.end;
    }
    stripped.push_str(&source[cursor..]);
    Cow::Owned(stripped)
}

/// Whether `offset` falls inside any of the (sorted) `spans`.
pub(crate) fn in_spans(spans: &[Range<usize>], offset: usize) -> bool {
    let idx = spans.partition_point(|span| span.end <= offset);
    spans.get(idx).is_some_and(|span| span.contains(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_comment() {
        assert_eq!(strip_comments("a = 1; // note\nb = 2;"), "a = 1; \nb = 2;");
    }

    #[test]
    fn strips_line_comment_at_line_start() {
        assert_eq!(strip_comments("// first\nx"), "\nx");
    }

    #[test]
    fn strips_multiline_block_comment() {
        let source = "a\n/*\n  hidden\n*/\nb";
        assert_eq!(strip_comments(source), "a\n\nb");
    }

    #[test]
    fn keeps_url_after_colon() {
        let source = r#"const url = "https://example.com/api";"#;
        assert_eq!(strip_comments(source), source);
    }

    #[test]
    fn borrows_when_nothing_to_strip() {
        assert!(matches!(strip_comments("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn line_comment_inside_block_is_part_of_block() {
        assert_eq!(strip_comments("x /* a // b */ y"), "x  y");
    }

    #[test]
    fn spans_exclude_prefix_character() {
        let source = "x;// c";
        let spans = comment_spans(source);
        assert_eq!(spans, vec![2..6]);
        assert_eq!(&source[spans[0].clone()], "// c");
    }

    #[test]
    fn in_spans_checks_bounds() {
        let spans = vec![2..5, 10..12];
        assert!(!in_spans(&spans, 1));
        assert!(in_spans(&spans, 2));
        assert!(in_spans(&spans, 4));
        assert!(!in_spans(&spans, 5));
        assert!(in_spans(&spans, 11));
        assert!(!in_spans(&spans, 12));
    }
}
