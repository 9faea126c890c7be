use crate::domain::version::Version;
use crate::error::{ReleaseGateError, Result};
use regex::Regex;

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pattern: String,
    matcher: Regex,
}

impl TagPattern {
    /// Create a tag pattern; it must contain exactly one `{version}` placeholder
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.matches("{version}").count() != 1 {
            return Err(ReleaseGateError::tag(format!(
                "Pattern '{}' must contain exactly one {{version}} placeholder",
                pattern
            )));
        }

        let escaped = regex::escape(&pattern);
        let regex_pattern = escaped.replace(
            r"\{version\}",
            r"(\d+\.\d+\.\d+(?:-[0-9A-Za-z-]+\.\d+)?)",
        );
        let matcher = Regex::new(&format!("^{}$", regex_pattern))
            .map_err(|e| ReleaseGateError::tag(format!("Invalid pattern '{}': {}", pattern, e)))?;

        Ok(TagPattern { pattern, matcher })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version="1.2.3" -> "v1.2.3"
    pub fn format(&self, version: &Version) -> String {
        self.pattern.replace("{version}", &version.to_string())
    }

    /// Extract the version from a tag that follows this pattern
    pub fn parse(&self, tag: &str) -> Option<Version> {
        self.matcher
            .captures(tag)
            .and_then(|captures| captures.get(1))
            .and_then(|m| Version::parse(m.as_str()).ok())
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.parse(tag).is_some()
    }
}
