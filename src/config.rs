use crate::domain::{BranchTopology, CommitType, PreRelease, ReleaseLevel, TagPattern, Version};
use crate::error::{ReleaseGateError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Represents the complete configuration for release-gate.
///
/// Holds the two static tables the engine consumes (commit-message policy and
/// release rules) plus the optional shell hooks run around publishing.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub lint: LintConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub hooks: HooksConfig,
}

/// Returns the default closed vocabulary of commit types.
fn default_commit_types() -> Vec<CommitType> {
    CommitType::ALL.to_vec()
}

fn default_scopes() -> Vec<String> {
    vec!["lib/hkt_macro".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_header_max_length() -> usize {
    100
}

/// Shape of the commits this tool generates itself.
fn default_ignore_pattern() -> String {
    r"^release: \d+\.\d+\.\d+(-rc\.\d+)?\.".to_string()
}

/// Commit-message policy checked by the classifier.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LintConfig {
    /// Allowed commit types
    #[serde(default = "default_commit_types")]
    pub types: Vec<CommitType>,

    /// Allowed scopes. An empty list permits no scope at all.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Set to false to accept any scope
    #[serde(default = "default_true")]
    pub enforce_scopes: bool,

    #[serde(default = "default_header_max_length")]
    pub header_max_length: usize,

    /// Headers matching this pattern skip every rule
    #[serde(default = "default_ignore_pattern")]
    pub ignore_pattern: String,

    /// Skip merge, revert and fixup commits generated by git
    #[serde(default = "default_true")]
    pub ignore_git_generated: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        LintConfig {
            types: default_commit_types(),
            scopes: default_scopes(),
            enforce_scopes: true,
            header_max_length: default_header_max_length(),
            ignore_pattern: default_ignore_pattern(),
            ignore_git_generated: true,
        }
    }
}

/// How a commit type takes part in a release.
///
/// `release` feeds the bump resolver; `section`/`hidden` only decide where the
/// commit shows up in the release notes.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TypeRule {
    #[serde(rename = "type")]
    pub commit_type: CommitType,

    #[serde(default)]
    pub release: ReleaseLevel,

    #[serde(default)]
    pub section: Option<String>,

    /// Shortcode put in front of the section heading when rendering
    #[serde(default)]
    pub emoji: Option<String>,

    #[serde(default)]
    pub hidden: bool,
}

impl TypeRule {
    fn visible(
        commit_type: CommitType,
        release: ReleaseLevel,
        section: &str,
        emoji: &str,
    ) -> Self {
        TypeRule {
            commit_type,
            release,
            section: Some(section.to_string()),
            emoji: Some(emoji.to_string()),
            hidden: false,
        }
    }

    fn hidden(commit_type: CommitType) -> Self {
        TypeRule {
            commit_type,
            release: ReleaseLevel::None,
            section: None,
            emoji: None,
            hidden: true,
        }
    }
}

/// Returns the default rule table. Its order is the order of the notes sections.
fn default_rules() -> Vec<TypeRule> {
    use CommitType::*;
    use ReleaseLevel::{Minor, Patch};

    vec![
        TypeRule::visible(Chore, ReleaseLevel::None, "CHORE", ":water_buffalo:"),
        TypeRule::visible(Update, Patch, "UPDATES", ":water_buffalo:"),
        TypeRule::visible(
            Ci,
            ReleaseLevel::None,
            "CONTINUOUS INTEGRATION",
            ":vertical_traffic_light:",
        ),
        TypeRule::visible(Doc, ReleaseLevel::None, "DOCUMENTATION", ":books:"),
        TypeRule::visible(Feat, Minor, "FEATURE", ":sparkles:"),
        TypeRule::visible(Fix, Patch, "FIX", ":bug:"),
        TypeRule::visible(Refactor, Minor, "REFACTOR", ":wrench:"),
        TypeRule::visible(Security, Minor, "SECURITY", ":shield:"),
        TypeRule::visible(Test, ReleaseLevel::None, "TEST", ":dart:"),
        TypeRule::hidden(NoRelease),
        TypeRule::hidden(Release),
        TypeRule::hidden(Wip),
    ]
}

fn default_tag_format() -> String {
    "v{version}".to_string()
}

fn default_initial_version() -> String {
    "1.0.0".to_string()
}

fn default_changelog_file() -> String {
    "CHANGELOG.md".to_string()
}

fn default_assets() -> Vec<String> {
    vec![
        "CHANGELOG.md".to_string(),
        "README.md".to_string(),
        "doc/**".to_string(),
        "Cargo.toml".to_string(),
        "Cargo.lock".to_string(),
    ]
}

fn default_message() -> String {
    "release: {version}.\n\n{notes}".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Release rules, branch topology and the release commit.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_rules")]
    pub rules: Vec<TypeRule>,

    #[serde(default)]
    pub branches: BranchTopology,

    #[serde(default = "default_tag_format")]
    pub tag_format: String,

    /// Version of the first release when no release tag exists
    #[serde(default = "default_initial_version")]
    pub initial_version: String,

    #[serde(default = "default_changelog_file")]
    pub changelog_file: String,

    /// Paths (git pathspecs) committed with the release
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// Release commit message; `{version}` and `{notes}` are substituted
    #[serde(default = "default_message")]
    pub message: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    /// Refuse to plan a release while any commit since the last one is rejected
    #[serde(default)]
    pub block_on_rejected: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            rules: default_rules(),
            branches: BranchTopology::default(),
            tag_format: default_tag_format(),
            initial_version: default_initial_version(),
            changelog_file: default_changelog_file(),
            assets: default_assets(),
            message: default_message(),
            remote: default_remote(),
            block_on_rejected: false,
        }
    }
}

impl ReleaseConfig {
    /// Rule for a commit type, if the table has one
    pub fn rule_for(&self, commit_type: CommitType) -> Option<&TypeRule> {
        self.rules.iter().find(|rule| rule.commit_type == commit_type)
    }

    /// Render the release commit message
    pub fn render_message(&self, version: &Version, notes: &str) -> String {
        self.message
            .replace("{version}", &version.to_string())
            .replace("{notes}", notes)
    }

    pub fn tag_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(&self.tag_format)
    }

    pub fn initial_version(&self) -> Result<Version> {
        Version::parse(&self.initial_version)
    }
}

/// Shell commands run around publishing. `{version}` is substituted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct HooksConfig {
    #[serde(default)]
    pub verify_conditions: Option<String>,

    #[serde(default)]
    pub prepare: Option<String>,

    #[serde(default)]
    pub publish: Option<String>,
}

impl Config {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the tables are consistent with each other.
    ///
    /// Runs once at startup; any error here aborts before a commit is looked at.
    pub fn validate(&self) -> Result<()> {
        let lint = &self.lint;
        let release = &self.release;

        let mut vocabulary = HashSet::new();
        for commit_type in &lint.types {
            if !vocabulary.insert(*commit_type) {
                return Err(ReleaseGateError::config(format!(
                    "Commit type '{}' is listed twice in lint.types",
                    commit_type
                )));
            }
        }

        if lint.header_max_length == 0 {
            return Err(ReleaseGateError::config(
                "lint.header_max_length must be greater than zero",
            ));
        }

        let ignore = Regex::new(&lint.ignore_pattern).map_err(|e| {
            ReleaseGateError::config(format!("Invalid lint.ignore_pattern: {}", e))
        })?;

        let mut ruled = HashSet::new();
        for rule in &release.rules {
            if !ruled.insert(rule.commit_type) {
                return Err(ReleaseGateError::config(format!(
                    "Release rule for '{}' is defined more than once",
                    rule.commit_type
                )));
            }
            if !vocabulary.contains(&rule.commit_type) {
                return Err(ReleaseGateError::config(format!(
                    "Release rule references '{}' which is not in lint.types",
                    rule.commit_type
                )));
            }
            let has_section = rule
                .section
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            if !rule.hidden && !has_section {
                return Err(ReleaseGateError::config(format!(
                    "Release rule for '{}' is visible but has no section title",
                    rule.commit_type
                )));
            }
        }

        if let Some(missing) = lint.types.iter().find(|t| !ruled.contains(*t)) {
            return Err(ReleaseGateError::config(format!(
                "Commit type '{}' has no release rule",
                missing
            )));
        }

        let branches = &release.branches;
        if branches.release.is_empty() || branches.prerelease.is_empty() {
            return Err(ReleaseGateError::config("Branch names must not be empty"));
        }
        if branches.release == branches.prerelease {
            return Err(ReleaseGateError::config(format!(
                "Release and prerelease branch are both '{}'",
                branches.release
            )));
        }
        if branches.channel.is_empty() {
            return Err(ReleaseGateError::config(
                "Prerelease channel must not be empty",
            ));
        }
        PreRelease::validate_identifier(&branches.prerelease_id)
            .map_err(|e| ReleaseGateError::config(e.to_string()))?;

        release
            .tag_pattern()
            .map_err(|e| ReleaseGateError::config(e.to_string()))?;

        let initial = release
            .initial_version()
            .map_err(|e| ReleaseGateError::config(format!("Invalid initial_version: {}", e)))?;
        if initial.is_prerelease() {
            return Err(ReleaseGateError::config(
                "initial_version must not be a prerelease",
            ));
        }

        // The release commit must pass our own linter through the ignore pattern.
        let samples = [
            Version::new(1, 0, 0),
            Version::new(1, 0, 0).with_prerelease(PreRelease::first(&branches.prerelease_id)),
        ];
        for sample in &samples {
            let message = release.render_message(sample, "");
            let header = message.lines().next().unwrap_or_default();
            if !ignore.is_match(header) {
                return Err(ReleaseGateError::config(format!(
                    "Release message header '{}' does not match lint.ignore_pattern",
                    header
                )));
            }
        }

        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `releasegate.toml` in current directory
/// 3. `.releasegate.toml` in user config directory
/// 4. Default configuration if no file found
///
/// The result is always validated.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        debug!(path, "loading configuration");
        fs::read_to_string(path)?
    } else if Path::new("./releasegate.toml").exists() {
        debug!("loading ./releasegate.toml");
        fs::read_to_string("./releasegate.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".releasegate.toml");
        if config_path.exists() {
            debug!(path = %config_path.display(), "loading user configuration");
            fs::read_to_string(config_path)?
        } else {
            return default_validated();
        }
    } else {
        return default_validated();
    };

    Config::from_toml_str(&config_str)
}

fn default_validated() -> Result<Config> {
    debug!("no configuration file found, using defaults");
    let config = Config::default();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_rules_cover_vocabulary_once() {
        let config = ReleaseConfig::default();
        for commit_type in CommitType::ALL {
            assert_eq!(
                config
                    .rules
                    .iter()
                    .filter(|r| r.commit_type == commit_type)
                    .count(),
                1,
                "expected exactly one rule for {}",
                commit_type
            );
        }
    }

    #[test]
    fn test_default_release_levels() {
        let config = ReleaseConfig::default();
        let level = |t| config.rule_for(t).map(|r| r.release);
        assert_eq!(level(CommitType::Feat), Some(ReleaseLevel::Minor));
        assert_eq!(level(CommitType::Refactor), Some(ReleaseLevel::Minor));
        assert_eq!(level(CommitType::Security), Some(ReleaseLevel::Minor));
        assert_eq!(level(CommitType::Fix), Some(ReleaseLevel::Patch));
        assert_eq!(level(CommitType::Update), Some(ReleaseLevel::Patch));
        assert_eq!(level(CommitType::Chore), Some(ReleaseLevel::None));
        assert_eq!(level(CommitType::Wip), Some(ReleaseLevel::None));
    }

    #[test]
    fn test_render_message() {
        let config = ReleaseConfig::default();
        let message = config.render_message(&Version::new(1, 2, 0), "## notes");
        assert_eq!(message, "release: 1.2.0.\n\n## notes");
    }

    #[test]
    fn test_rule_for_unknown_type_in_vocabulary_fails() {
        let mut config = Config::default();
        config.lint.types.retain(|t| *t != CommitType::Wip);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'wip' which is not in lint.types"));
    }

    #[test]
    fn test_missing_rule_fails() {
        let mut config = Config::default();
        config.release.rules.retain(|r| r.commit_type != CommitType::Fix);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'fix' has no release rule"));
    }

    #[test]
    fn test_duplicate_rule_fails() {
        let mut config = Config::default();
        let duplicate = config.release.rules[0].clone();
        config.release.rules.push(duplicate);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_visible_rule_without_section_fails() {
        let mut config = Config::default();
        config.release.rules[0].section = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no section title"));
    }

    #[test]
    fn test_same_branch_names_fail() {
        let mut config = Config::default();
        config.release.branches.prerelease = "release".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_message_must_satisfy_ignore_pattern() {
        let mut config = Config::default();
        config.release.message = "chore(release): {version}".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("does not match lint.ignore_pattern"));
    }

    #[test]
    fn test_invalid_ignore_pattern_fails() {
        let mut config = Config::default();
        config.lint.ignore_pattern = "(".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prerelease_initial_version_fails() {
        let mut config = Config::default();
        config.release.initial_version = "1.0.0-rc.1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
[lint]
scopes = []
header_max_length = 72
"#,
        )
        .unwrap();
        assert!(config.lint.scopes.is_empty());
        assert!(config.lint.enforce_scopes);
        assert_eq!(config.lint.header_max_length, 72);
        assert_eq!(config.release, ReleaseConfig::default());
    }

    #[test]
    fn test_unknown_type_in_toml_is_rejected() {
        let result = Config::from_toml_str(
            r#"
[lint]
types = ["feat", "perf"]
"#,
        );
        assert!(matches!(result, Err(ReleaseGateError::Toml(_))));
    }
}
