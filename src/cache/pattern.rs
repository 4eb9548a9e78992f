//! Glob key patterns used for invalidation.

use regex::Regex;

/// A compiled `*`-wildcard pattern.
///
/// `*` matches any run of characters (including none); every other character
/// matches itself. Patterns are anchored at both ends, so `builds:*` does not
/// match `old-builds:1`.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Self {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{body}$")).expect("escaped glob is a valid regex");
        Self {
            source: pattern.to_string(),
            regex,
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}
