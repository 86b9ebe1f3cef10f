//! Conversion of resolved values into source literals.
//!
//! # Rules
//!
//! Applied in order:
//! 1. Non-string values pass through as their literal form
//! 2. `"null"` (any case) becomes `null`
//! 3. `"undefined"` (any case) becomes `undefined`
//! 4. A decimal numeric string becomes an unquoted number
//! 5. Anything else becomes a double-quoted string
//!
//! Empty strings are rejected before encoding; see [`super::apply`].

use crate::value::EnvValue;
use regex::Regex;
use std::sync::LazyLock;

/// Decimal numbers only: no hex, no `Infinity`, no surrounding whitespace.
static NUMERIC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("NUMERIC_REGEX must compile")
});

/// Encode a resolved value as source text.
pub fn encode(value: &EnvValue) -> String {
    match value {
        EnvValue::String(s) => encode_str(s),
        other => render(other),
    }
}

/// Encode a raw string value.
pub fn encode_str(value: &str) -> String {
    if value.eq_ignore_ascii_case("null") {
        return "null".to_string();
    }
    if value.eq_ignore_ascii_case("undefined") {
        return "undefined".to_string();
    }
    if let Some(number) = parse_number(value) {
        return format_number(number);
    }
    quote(value)
}

/// Parse `value` if the whole string is a finite decimal number.
pub fn parse_number(value: &str) -> Option<f64> {
    if !NUMERIC_REGEX.is_match(value) {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_number(number: f64) -> String {
    // Rust's `Display` for f64 is the shortest string that parses back to it.
    number.to_string()
}

/// JSON string form, with the line separators JSON allows but older JS parsers reject.
fn quote(value: &str) -> String {
    escape_line_separators(serde_json::Value::from(value).to_string())
}

fn escape_line_separators(json: String) -> String {
    if !json.contains(|c: char| c == '\u{2028}' || c == '\u{2029}') {
        return json;
    }
    json.replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Literal form of a non-string value.
fn render(value: &EnvValue) -> String {
    if let Some(json) = to_json(value) {
        return escape_line_separators(json.to_string());
    }
    let mut out = String::new();
    render_into(&mut out, value);
    out
}

/// The JSON form of `value`, or `None` if it holds `undefined`, NaN or an infinity.
fn to_json(value: &EnvValue) -> Option<serde_json::Value> {
    use serde_json::Value;

    Some(match value {
        EnvValue::Undefined => return None,
        EnvValue::Null => Value::Null,
        EnvValue::Bool(b) => Value::Bool(*b),
        EnvValue::Number(n) => json_number(*n)?,
        EnvValue::String(s) => Value::String(s.clone()),
        EnvValue::List(items) => Value::Array(items.iter().map(to_json).collect::<Option<_>>()?),
        EnvValue::Map(map) => Value::Object(
            map.iter()
                .map(|(key, item)| Some((key.clone(), to_json(item)?)))
                .collect::<Option<_>>()?,
        ),
    })
}

fn json_number(n: f64) -> Option<serde_json::Value> {
    // Integral values print without a trailing `.0`.
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Some(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(serde_json::Value::Number)
}

/// Fallback for values JSON cannot express.
fn render_into(out: &mut String, value: &EnvValue) {
    match value {
        EnvValue::Undefined => out.push_str("undefined"),
        EnvValue::Number(n) if n.is_nan() => out.push_str("NaN"),
        EnvValue::Number(n) if n.is_infinite() => {
            out.push_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
        }
        EnvValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                render_into(out, item);
            }
            out.push(']');
        }
        EnvValue::Map(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&quote(key));
                out.push(':');
                render_into(out, item);
            }
            out.push('}');
        }
        other => out.push_str(&render(other)),
    }
}
