//! Path rule matching.
//!
//! # Responsibilities
//! - Match script execution under content/includes trees (forbidden)
//! - Match sensitive file extensions anywhere (private)
//!
//! # Design Decisions
//! - Rules see the normalized URL path, relative to the app root
//! - Matching is case-sensitive, like the filesystem below it
//! - No regex: prefix and suffix checks only

/// Trait for matching a normalized URL path against a rule.
pub trait PathRule: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this rule.
    fn matches(&self, url_path: &str) -> bool;
}

/// Matches paths inside one of several directories that end in a suffix.
#[derive(Debug, Clone)]
pub struct ScriptUnderDirRule {
    dirs: Vec<String>,
    suffix: String,
}

impl ScriptUnderDirRule {
    /// `dirs` are top-level directory names such as `wp-content`.
    pub fn new<I, S>(dirs: I, suffix: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dirs: dirs
                .into_iter()
                .map(|d| format!("/{}/", d.into().trim_matches('/')))
                .collect(),
            suffix: suffix.into(),
        }
    }
}

impl PathRule for ScriptUnderDirRule {
    fn matches(&self, url_path: &str) -> bool {
        url_path.ends_with(&self.suffix)
            && self.dirs.iter().any(|dir| url_path.starts_with(dir.as_str()))
    }
}

/// Matches paths ending in any of a fixed set of suffixes.
#[derive(Debug, Clone)]
pub struct SuffixRule {
    suffixes: Vec<String>,
}

impl SuffixRule {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl PathRule for SuffixRule {
    fn matches(&self, url_path: &str) -> bool {
        self.suffixes.iter().any(|s| url_path.ends_with(s.as_str()))
    }
}

/// Scripts are never executed from user content or framework internals.
pub fn forbidden_rule() -> ScriptUnderDirRule {
    ScriptUnderDirRule::new(["wp-content", "wp-includes"], ".php")
}

/// Credentials, config, certificates and style sources.
pub fn private_rule() -> SuffixRule {
    SuffixRule::new([".crt", ".ini", ".htaccess", ".json", ".scss"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_rule() {
        let rule = forbidden_rule();
        assert!(rule.matches("/wp-content/plugins/x/evil.php"));
        assert!(rule.matches("/wp-includes/version.php"));
        assert!(!rule.matches("/wp-content/uploads/a.png"));
        assert!(!rule.matches("/wp-admin/index.php"));
        assert!(!rule.matches("/index.php"));
        // Directory name must match exactly, not as a prefix.
        assert!(!rule.matches("/wp-contents/x.php"));
    }

    #[test]
    fn test_private_rule() {
        let rule = private_rule();
        for path in ["/config.json", "/php.ini", "/.htaccess", "/a/b/site.crt", "/theme/style.scss"] {
            assert!(rule.matches(path), "{path} should be private");
        }
        assert!(!rule.matches("/style.css"));
        assert!(!rule.matches("/json"));
    }
}
