//! `.env` resolver files.
//!
//! A dotenv file is the simplest resolver: a flat mapping of strings in the
//! standard `KEY=value` format.

use std::collections::BTreeMap;

/// Parses `.env` content into a map of variables.
///
/// # Supported Formats
///
/// - Simple: `KEY=value`
/// - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
/// - Exported: `export KEY=value`
/// - Empty: `KEY=`
/// - Comments: `# This is a comment`
/// - Values with equals signs: `URL=https://example.com?foo=bar`
///
/// # Example
///
/// ```
/// use safe_env::resolver::EnvFileParser;
///
/// let vars = EnvFileParser::parse("API_URL=https://example.com\nexport DEBUG=\"true\"\n");
/// assert_eq!(vars.get("API_URL").map(String::as_str), Some("https://example.com"));
/// assert_eq!(vars.get("DEBUG").map(String::as_str), Some("true"));
/// ```
pub struct EnvFileParser;

impl EnvFileParser {
    /// Parse dotenv content. Lines that are not assignments are skipped.
    pub fn parse(content: &str) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match Self::parse_line(line) {
                Some((key, value)) => {
                    vars.insert(key, value);
                }
                None => tracing::warn!("Ignoring malformed .env line {}", index + 1),
            }
        }

        vars
    }

    fn parse_line(line: &str) -> Option<(String, String)> {
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return None;
        }

        Some((key.to_string(), Self::unquote(value.trim())))
    }

    fn unquote(value: &str) -> String {
        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if quoted {
            value[1..value.len() - 1].to_string()
        } else {
            value.to_string()
        }
    }
}
