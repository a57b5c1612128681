//! Compiled search patterns backed by the ripgrep regex matcher.

use crate::error::{Result, RltailError};
use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};

/// Search configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_insensitive: bool,
    /// Treat the query as a regular expression instead of a literal.
    pub regex_mode: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            regex_mode: false,
        }
    }
}

/// A query compiled once and reused for matching and highlighting.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    query: String,
    matcher: RegexMatcher,
}

impl SearchPattern {
    pub fn compile(query: &str, options: &SearchOptions) -> Result<Self> {
        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(options.case_insensitive)
            .fixed_strings(!options.regex_mode)
            .build(query)
            .map_err(|e| RltailError::invalid_pattern(query, e.to_string()))?;
        Ok(Self {
            query: query.to_string(),
            matcher,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text.as_bytes()).unwrap_or(false)
    }

    /// Byte ranges of every non-empty match in `text`.
    pub fn find_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let _ = self.matcher.find_iter(text.as_bytes(), |m| {
            if m.end() > m.start() {
                spans.push((m.start(), m.end()));
            }
            true
        });
        spans
    }
}
