// src/crawl/filter.rs
// =============================================================================
// Decides what happens to a discovered URL:
//
//   excluded            -> dropped, never requested
//   checkable only      -> requested once, its links are NOT followed
//   checkable+followable-> requested, and if it is HTML its links are crawled
//
// Rules are evaluated against the full normalized URL string, in this order:
// 1. Exclude rules (substring, prefix, suffix). Any match vetoes everything.
// 2. Onsite check: only URLs under the seed URL are followed.
// 3. Include rule: when configured, a followed URL must contain at least one
//    of the include substrings.
//
// Exclude always beats include when both match.
// =============================================================================

use url::Url;

use crate::config::FilterRules;

#[derive(Debug, Clone)]
pub struct FilterChain {
    rules: FilterRules,
    site_root: String,
}

impl FilterChain {
    /// `seed` marks what counts as "onsite": anything starting with it.
    pub fn new(rules: FilterRules, seed: &Url) -> Self {
        Self {
            rules,
            site_root: seed.as_str().to_string(),
        }
    }

    /// Whether the URL may be requested at all.
    pub fn should_check(&self, url: &Url) -> bool {
        !self.is_excluded(url.as_str())
    }

    /// Whether links found on this URL may be crawled.
    pub fn should_follow(&self, url: &Url) -> bool {
        let url = url.as_str();
        if self.is_excluded(url) {
            return false;
        }
        if !self.is_onsite(url) {
            return false;
        }
        self.rules.include_contained.is_empty()
            || self
                .rules
                .include_contained
                .iter()
                .any(|needle| url.contains(needle.as_str()))
    }

    pub fn is_onsite(&self, url: &str) -> bool {
        url.starts_with(&self.site_root)
    }

    fn is_excluded(&self, url: &str) -> bool {
        self.rules
            .exclude_contained
            .iter()
            .any(|needle| url.contains(needle.as_str()))
            || self
                .rules
                .exclude_prefix
                .iter()
                .any(|prefix| url.starts_with(prefix.as_str()))
            || self
                .rules
                .exclude_suffix
                .iter()
                .any(|suffix| url.ends_with(suffix.as_str()))
    }
}
