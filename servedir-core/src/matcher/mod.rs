//! Source patterns shared by rewrites, redirects, headers and the listing
//! and clean-URL toggles.
//!
//! A pattern is tried two ways: a capture regex (yielding `:name` bindings)
//! and a shell glob. Either one matching is a match.

mod compile;
mod template;

use std::fmt;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::compile::CaptureRegex;
use crate::path::{collapse_slashes, ensure_leading_slash, resolve_url_path};

pub use template::{is_absolute_url, render_destination};

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("unbalanced group in pattern '{pattern}'")]
    UnbalancedGroup { pattern: String },

    #[error("pattern '{pattern}' does not compile: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Ordered `(name, value)` bindings produced by a capture match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub bindings: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourcePattern {
    raw: String,
    normalized: String,
    capture: CaptureRegex,
    glob: Option<Pattern>,
}

impl SourcePattern {
    pub fn new(raw: impl Into<String>) -> Result<Self, PatternError> {
        let raw = raw.into();
        let normalized = normalize_pattern(&raw);
        let capture = CaptureRegex::compile(&normalized)?;
        let glob = Pattern::new(&normalized).ok();

        Ok(Self {
            raw,
            normalized,
            capture,
            glob,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Tests `path` against this pattern.
    ///
    /// With `allow_captures` the capture regex runs first and its bindings are
    /// returned; the glob test is always the fallback and binds nothing.
    pub fn matches(&self, path: &str, allow_captures: bool) -> Option<MatchResult> {
        let path = resolve_url_path(path);

        if allow_captures && let Some(bindings) = self.capture.captures(&path) {
            return Some(MatchResult { bindings });
        }

        self.glob
            .as_ref()
            .filter(|glob| glob.matches_with(&path, GLOB_OPTIONS))
            .map(|_| MatchResult::default())
    }

    #[cfg(test)]
    pub(crate) fn is_match(&self, path: &str) -> bool {
        self.matches(path, true).is_some()
    }
}

impl TryFrom<String> for SourcePattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SourcePattern::new(value)
    }
}

impl From<SourcePattern> for String {
    fn from(pattern: SourcePattern) -> Self {
        pattern.raw
    }
}

impl fmt::Display for SourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for SourcePattern {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

/// Absolute, single-slash form with no trailing slash. A leading `!` stays
/// in front of the slash and is otherwise left alone.
fn normalize_pattern(raw: &str) -> String {
    let (negation, body) = match raw.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", raw),
    };

    let mut normalized = collapse_slashes(&ensure_leading_slash(body));
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    format!("{negation}{normalized}")
}
