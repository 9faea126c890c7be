use crate::config::LintConfig;
use crate::domain::{CommitParser, CommitRecord, CommitType};
use crate::error::{ReleaseGateError, Result};
use crate::lint::{Rule, ValidationVerdict, Violation};
use regex::Regex;
use tracing::debug;

/// Headers git writes on its own (merges, reverts, autosquash markers)
const GIT_GENERATED_PATTERN: &str = r#"^(Merge (pull request|branch|remote-tracking branch|tag) |Merge .+ into |Revert ".*"|(fixup|squash|amend)! |Automatic merge |Auto-merged .+ into )"#;

/// Validates parsed commits against the commit-message policy
pub struct Classifier<'a> {
    config: &'a LintConfig,
    parser: CommitParser,
    bypass: Regex,
    git_generated: Option<Regex>,
}

impl<'a> Classifier<'a> {
    /// Create a classifier, compiling every pattern up front
    pub fn new(config: &'a LintConfig) -> Result<Self> {
        let bypass = Regex::new(&config.ignore_pattern).map_err(|e| {
            ReleaseGateError::config(format!("Invalid lint.ignore_pattern: {}", e))
        })?;
        let git_generated = if config.ignore_git_generated {
            Some(Regex::new(GIT_GENERATED_PATTERN).map_err(|e| {
                ReleaseGateError::commit(format!("Invalid git-generated pattern: {}", e))
            })?)
        } else {
            None
        };

        Ok(Classifier {
            config,
            parser: CommitParser::new()?,
            bypass,
            git_generated,
        })
    }

    /// Parse a raw message with this classifier's compiled parser
    pub fn parse(&self, message: &str) -> CommitRecord {
        self.parser.parse(message)
    }

    /// Whether the commit skips every rule.
    ///
    /// Release commits produced by this tool must never be rejected by it, so
    /// the ignore pattern is checked before any rule. New generated-commit
    /// shapes belong in the pattern, not in the rules.
    pub fn is_bypassed(&self, commit: &CommitRecord) -> bool {
        let header = commit.header();
        self.bypass.is_match(&header)
            || self
                .git_generated
                .as_ref()
                .map(|re| re.is_match(&header))
                .unwrap_or(false)
    }

    /// Check a commit against every rule. Violations accumulate; nothing short-circuits.
    pub fn classify(&self, commit: &CommitRecord) -> ValidationVerdict {
        if self.is_bypassed(commit) {
            debug!(header = %commit.header(), "commit bypasses lint rules");
            return ValidationVerdict::bypassed();
        }

        let mut violations = Vec::new();
        self.check_type(commit, &mut violations);
        self.check_scope(commit, &mut violations);
        check_subject(commit, &mut violations);
        check_body(commit, &mut violations);
        check_footer(commit, &mut violations);
        self.check_header_length(commit, &mut violations);

        ValidationVerdict::from_violations(violations)
    }

    fn check_type(&self, commit: &CommitRecord, violations: &mut Vec<Violation>) {
        let written = commit.r#type.as_str();
        if written.is_empty() {
            violations.push(Violation::new(
                Rule::TypeEmpty,
                "header must start with 'type: ' or 'type(scope): '",
            ));
            return;
        }

        if written != written.to_lowercase() {
            violations.push(Violation::new(
                Rule::TypeCase,
                format!("type '{}' must be lower-case", written),
            ));
        }

        let allowed = written
            .parse::<CommitType>()
            .map(|t| self.config.types.contains(&t))
            .unwrap_or(false);
        if !allowed {
            let vocabulary: Vec<&str> = self.config.types.iter().map(|t| t.as_str()).collect();
            violations.push(Violation::new(
                Rule::TypeEnum,
                format!(
                    "type '{}' is not one of [{}]",
                    written,
                    vocabulary.join(", ")
                ),
            ));
        }
    }

    fn check_scope(&self, commit: &CommitRecord, violations: &mut Vec<Violation>) {
        if !self.config.enforce_scopes {
            return;
        }
        if let Some(scope) = commit.scope() {
            if !self.config.scopes.iter().any(|allowed| allowed == scope) {
                let message = if self.config.scopes.is_empty() {
                    format!("scope '{}' is not allowed, no scopes are configured", scope)
                } else {
                    format!(
                        "scope '{}' is not one of [{}]",
                        scope,
                        self.config.scopes.join(", ")
                    )
                };
                violations.push(Violation::new(Rule::ScopeEnum, message));
            }
        }
    }

    fn check_header_length(&self, commit: &CommitRecord, violations: &mut Vec<Violation>) {
        let length = commit.header().chars().count();
        if length > self.config.header_max_length {
            violations.push(Violation::new(
                Rule::HeaderMaxLength,
                format!(
                    "header is {} characters, the maximum is {}",
                    length, self.config.header_max_length
                ),
            ));
        }
    }
}

fn check_subject(commit: &CommitRecord, violations: &mut Vec<Violation>) {
    let subject = commit.subject.trim();
    if subject.is_empty() {
        violations.push(Violation::new(Rule::SubjectEmpty, "subject may not be empty"));
        return;
    }
    if !is_sentence_case(subject) {
        violations.push(Violation::new(
            Rule::SubjectCase,
            "subject must start with an upper-case letter",
        ));
    }
    if !ends_with_full_stop(subject) {
        violations.push(Violation::new(
            Rule::SubjectFullStop,
            "subject must end with '.'",
        ));
    }
}

fn check_body(commit: &CommitRecord, violations: &mut Vec<Violation>) {
    let Some(body) = commit.body.as_deref() else {
        return;
    };
    if commit.layout.body_leading_blanks != 1 {
        violations.push(Violation::new(
            Rule::BodyLeadingBlank,
            format!(
                "body must be separated from the header by one blank line, found {}",
                commit.layout.body_leading_blanks
            ),
        ));
    }
    if !is_sentence_case(body) {
        violations.push(Violation::new(
            Rule::BodyCase,
            "body must start with an upper-case letter",
        ));
    }
    if !ends_with_full_stop(body) {
        violations.push(Violation::new(Rule::BodyFullStop, "body must end with '.'"));
    }
}

fn check_footer(commit: &CommitRecord, violations: &mut Vec<Violation>) {
    if commit.footer.is_some() && commit.layout.footer_leading_blanks != 1 {
        violations.push(Violation::new(
            Rule::FooterLeadingBlank,
            format!(
                "footer must be separated from the text above by one blank line, found {}",
                commit.layout.footer_leading_blanks
            ),
        ));
    }
}

/// First alphabetic character is not lower-case; the rest is free.
fn is_sentence_case(text: &str) -> bool {
    text.chars()
        .find(|c| c.is_alphabetic())
        .map(|c| !c.is_lowercase())
        .unwrap_or(true)
}

fn ends_with_full_stop(text: &str) -> bool {
    text.trim_end().ends_with('.')
}
