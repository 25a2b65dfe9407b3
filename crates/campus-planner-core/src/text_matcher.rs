use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::Task;

static TAG_QUERY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    RegexBuilder::new(r"^@tag:([A-Za-z0-9_]+)$")
        .case_insensitive(true)
        .build()
        .ok()
});

/// Matcher for the task list search box.
///
/// `@tag:<word>` restricts the search to tags. Anything else is tried as a
/// case-insensitive regular expression over title, tag and description, and
/// falls back to a plain substring search when the expression does not compile.
#[derive(Debug, Clone)]
pub enum TextMatcher {
    /// Tag contains the word (lowercased).
    Tag(String),
    /// Case-insensitive regular expression.
    Pattern(Regex),
    /// Case-insensitive substring (lowercased).
    Substring(String),
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(word) = TAG_QUERY
            .as_ref()
            .and_then(|re| re.captures(trimmed))
            .and_then(|caps| caps.get(1))
        {
            return Some(Self::Tag(word.as_str().to_lowercase()));
        }

        Some(
            RegexBuilder::new(trimmed)
                .case_insensitive(true)
                .build()
                .map_or_else(|_| Self::Substring(trimmed.to_lowercase()), Self::Pattern),
        )
    }

    /// Determine whether the task satisfies the query.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::Tag(word) => task.tag.to_lowercase().contains(word.as_str()),
            Self::Pattern(re) => re.is_match(&task.search_text()),
            Self::Substring(needle) => task.search_text().to_lowercase().contains(needle.as_str()),
        }
    }
}
