//! Commit-message policy: rule identifiers, verdicts and batch linting

pub mod classifier;

pub use classifier::Classifier;

use crate::domain::CommitRecord;
use std::fmt;
use tracing::info;

/// Identifier of a single commit-message rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    TypeEmpty,
    TypeEnum,
    TypeCase,
    ScopeEnum,
    SubjectEmpty,
    SubjectCase,
    SubjectFullStop,
    BodyLeadingBlank,
    BodyCase,
    BodyFullStop,
    FooterLeadingBlank,
    HeaderMaxLength,
}

impl Rule {
    pub fn id(&self) -> &'static str {
        match self {
            Rule::TypeEmpty => "type-empty",
            Rule::TypeEnum => "type-enum",
            Rule::TypeCase => "type-case",
            Rule::ScopeEnum => "scope-enum",
            Rule::SubjectEmpty => "subject-empty",
            Rule::SubjectCase => "subject-case",
            Rule::SubjectFullStop => "subject-full-stop",
            Rule::BodyLeadingBlank => "body-leading-blank",
            Rule::BodyCase => "body-case",
            Rule::BodyFullStop => "body-full-stop",
            Rule::FooterLeadingBlank => "footer-leading-blank",
            Rule::HeaderMaxLength => "header-max-length",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A broken rule with a human-readable explanation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Violation {
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.rule)
    }
}

/// Outcome of classifying one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub accepted: bool,
    /// Broken rules in evaluation order
    pub violations: Vec<Violation>,
    /// Accepted through the ignore pattern without evaluating rules
    pub bypassed: bool,
}

impl ValidationVerdict {
    pub fn bypassed() -> Self {
        ValidationVerdict {
            accepted: true,
            violations: Vec::new(),
            bypassed: true,
        }
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        ValidationVerdict {
            accepted: violations.is_empty(),
            violations,
            bypassed: false,
        }
    }

    /// Rule identifiers in evaluation order
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.rule.id()).collect()
    }
}

/// A commit together with its label (hash or source) and verdict
#[derive(Debug, Clone)]
pub struct LintedCommit {
    pub label: String,
    pub message: String,
    pub record: CommitRecord,
    pub verdict: ValidationVerdict,
}

/// Verdicts for a whole batch, in input order
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub commits: Vec<LintedCommit>,
}

impl LintReport {
    /// True only when every commit in the batch was accepted
    pub fn passed(&self) -> bool {
        self.commits.iter().all(|c| c.verdict.accepted)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &LintedCommit> {
        self.commits.iter().filter(|c| !c.verdict.accepted)
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected().count()
    }

    /// Accepted records in their original order
    pub fn accepted_records(&self) -> Vec<CommitRecord> {
        self.commits
            .iter()
            .filter(|c| c.verdict.accepted)
            .map(|c| c.record.clone())
            .collect()
    }
}

/// Parse and classify a batch of `(label, raw message)` pairs.
///
/// Every commit is classified; a rejection never stops the batch.
pub fn lint_batch<I>(classifier: &Classifier<'_>, messages: I) -> LintReport
where
    I: IntoIterator<Item = (String, String)>,
{
    let commits: Vec<LintedCommit> = messages
        .into_iter()
        .map(|(label, message)| {
            let record = classifier.parse(&message);
            let verdict = classifier.classify(&record);
            LintedCommit {
                label,
                message,
                record,
                verdict,
            }
        })
        .collect();

    let report = LintReport { commits };
    info!(
        total = report.commits.len(),
        rejected = report.rejected_count(),
        "linted commit batch"
    );
    report
}
