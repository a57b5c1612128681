//! JSON pretty-printing for structured log messages.

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

/// A `{...}` object with at most one level of nested objects.
static EMBEDDED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("embedded object regex pattern is valid")
});

/// Pretty-print `text` if it is a JSON object or array.
pub fn pretty(text: &str, indent: &str) -> Option<String> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    let value: Value = serde_json::from_str(text).ok()?;

    let mut out = Vec::with_capacity(text.len() * 2);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    value.serialize(&mut serializer).ok()?;
    String::from_utf8(out).ok()
}

/// Pretty-print the whole message, or each embedded object that parses.
pub fn prettify<'a>(text: &'a str, indent: &str) -> Cow<'a, str> {
    if let Some(whole) = pretty(text, indent) {
        return Cow::Owned(whole);
    }
    EMBEDDED_OBJECT.replace_all(text, |caps: &Captures| {
        let candidate = &caps[0];
        pretty(candidate, indent).unwrap_or_else(|| candidate.to_string())
    })
}
