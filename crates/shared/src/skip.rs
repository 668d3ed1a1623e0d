use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::api::API_BASE_PATH;

/// A rule that sends a request straight to the network, bypassing both
/// cache partitions.
///
/// Every rule is a substring test against the full request URL. The variant
/// only records what the pattern is meant to catch so logs and config read
/// sensibly; `Extension(".php")` also matches `/x.php?page=2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "pattern", rename_all = "snake_case")]
pub enum SkipRule {
    PathSegment(String),
    Extension(String),
    Scheme(String),
    Contains(String),
}

impl SkipRule {
    pub fn pattern(&self) -> &str {
        use SkipRule::*;
        match self {
            PathSegment(p) | Extension(p) | Scheme(p) | Contains(p) => p,
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        url.contains(self.pattern())
    }
}

impl Display for SkipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SkipRule::*;
        match self {
            PathSegment(p) => write!(f, "path segment {p:?}"),
            Extension(p) => write!(f, "extension {p:?}"),
            Scheme(p) => write!(f, "scheme {p:?}"),
            Contains(p) => write!(f, "substring {p:?}"),
        }
    }
}

/// Ordered skip rules, evaluated first to last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipRules(Vec<SkipRule>);

impl SkipRules {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, rule: SkipRule) -> Self {
        self.0.push(rule);
        self
    }

    /// The first rule matching `url`, if any
    pub fn first_match(&self, url: &str) -> Option<&SkipRule> {
        self.0.iter().find(|rule| rule.matches(url))
    }

    pub fn skips(&self, url: &str) -> bool {
        self.first_match(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SkipRules {
    fn default() -> Self {
        use SkipRule::*;
        Self::empty()
            .with(PathSegment(API_BASE_PATH.to_string()))
            .with(PathSegment("/admin/".to_string()))
            .with(Extension(".php".to_string()))
            .with(Scheme("chrome-extension:".to_string()))
            .with(Contains("analytics".to_string()))
            .with(Contains("gtag".to_string()))
    }
}

impl FromIterator<SkipRule> for SkipRules {
    fn from_iter<T: IntoIterator<Item = SkipRule>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_skip_each_pattern() {
        let rules = SkipRules::default();
        for url in [
            "https://app.test/api/users",
            "https://app.test/admin/settings",
            "https://app.test/index.php",
            "https://app.test/legacy/page.php?id=4",
            "chrome-extension://abcdef/content.js",
            "https://cdn.test/analytics.js",
            "https://www.googletagmanager.com/gtag/js?id=G-1",
        ] {
            assert!(rules.skips(url), "{url} should bypass the cache");
        }
    }

    #[test]
    fn default_rules_keep_shell_assets() {
        let rules = SkipRules::default();
        for url in [
            "https://app.test/",
            "https://app.test/index.html",
            "https://app.test/style.css",
            "https://app.test/apis.html",
            "https://app.test/administrator.png",
        ] {
            assert!(!rules.skips(url), "{url} should be cacheable");
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = SkipRules::default();
        let rule = rules.first_match("https://app.test/api/analytics").unwrap();
        assert_eq!(rule, &SkipRule::PathSegment("/api/".to_string()));
    }

    #[test]
    fn rules_deserialize_from_tagged_json() {
        let rules: SkipRules = serde_json::from_str(
            r#"[{"rule": "extension", "pattern": ".asp"}, {"rule": "contains", "pattern": "beacon"}]"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules.skips("https://app.test/default.asp"));
        assert!(rules.skips("https://app.test/beacon/ping"));
        assert!(!rules.skips("https://app.test/api/users"));
    }
}
