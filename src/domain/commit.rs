use crate::error::{ReleaseGateError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HEADER_PATTERN: &str = r"^([A-Za-z][A-Za-z-]*)(?:\(([^)]*)\))?(!)?:(?: (.*))?$";
const FOOTER_TOKEN_PATTERN: &str =
    r"^(?:(?P<breaking>BREAKING[ -]CHANGE): |[A-Za-z][\w-]*(?P<sep>: | #))";

/// The closed vocabulary of commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitType {
    Chore,
    Ci,
    Doc,
    Feat,
    Fix,
    NoRelease,
    Refactor,
    Release,
    Security,
    Test,
    Update,
    Wip,
}

impl CommitType {
    pub const ALL: [CommitType; 12] = [
        CommitType::Chore,
        CommitType::Ci,
        CommitType::Doc,
        CommitType::Feat,
        CommitType::Fix,
        CommitType::NoRelease,
        CommitType::Refactor,
        CommitType::Release,
        CommitType::Security,
        CommitType::Test,
        CommitType::Update,
        CommitType::Wip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Chore => "chore",
            CommitType::Ci => "ci",
            CommitType::Doc => "doc",
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::NoRelease => "no-release",
            CommitType::Refactor => "refactor",
            CommitType::Release => "release",
            CommitType::Security => "security",
            CommitType::Test => "test",
            CommitType::Update => "update",
            CommitType::Wip => "wip",
        }
    }
}

impl FromStr for CommitType {
    type Err = ReleaseGateError;

    /// Exact, case-sensitive lookup. `Fix` is not `fix`.
    fn from_str(s: &str) -> Result<Self> {
        CommitType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ReleaseGateError::commit(format!("Unknown commit type: '{}'", s)))
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of blank lines found before the body and footer blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub body_leading_blanks: usize,
    pub footer_leading_blanks: usize,
}

impl Default for BlockLayout {
    fn default() -> Self {
        BlockLayout {
            body_leading_blanks: 1,
            footer_leading_blanks: 1,
        }
    }
}

/// A commit message split into its conventional parts.
///
/// `type` is kept exactly as written so that case and vocabulary can be
/// validated; use [`CommitRecord::commit_type`] for the typed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub r#type: String,
    pub scope: Option<String>,
    pub subject: String,
    pub body: Option<String>,
    pub footer: Option<String>,
    pub breaking: bool,
    pub layout: BlockLayout,
    /// First line exactly as written; `None` for records built in code
    pub raw_header: Option<String>,
}

impl CommitRecord {
    pub fn new(r#type: impl Into<String>, subject: impl Into<String>) -> Self {
        CommitRecord {
            r#type: r#type.into(),
            scope: None,
            subject: subject.into(),
            body: None,
            footer: None,
            breaking: false,
            layout: BlockLayout::default(),
            raw_header: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn with_breaking(mut self, breaking: bool) -> Self {
        self.breaking = breaking;
        self
    }

    pub fn with_layout(mut self, layout: BlockLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The typed commit type, if the written type is in the vocabulary.
    pub fn commit_type(&self) -> Option<CommitType> {
        self.r#type.parse().ok()
    }

    /// Scope, treating `type(): subject` the same as no scope.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref().filter(|s| !s.is_empty())
    }

    /// The header as written, or rebuilt in `type(scope): subject` shape for
    /// records built in code.
    pub fn header(&self) -> String {
        if let Some(raw) = &self.raw_header {
            return raw.clone();
        }
        match (self.r#type.is_empty(), self.scope()) {
            (true, _) => self.subject.clone(),
            (false, Some(scope)) => format!("{}({}): {}", self.r#type, scope, self.subject),
            (false, None) => format!("{}: {}", self.r#type, self.subject),
        }
    }

    /// Text describing the breaking change, taken from the footer when present.
    pub fn breaking_note(&self) -> Option<&str> {
        if !self.breaking {
            return None;
        }
        let from_footer = self.footer.as_deref().and_then(|footer| {
            footer.lines().find_map(|line| {
                line.strip_prefix("BREAKING CHANGE:")
                    .or_else(|| line.strip_prefix("BREAKING-CHANGE:"))
                    .map(str::trim)
            })
        });
        Some(from_footer.unwrap_or(&self.subject))
    }

    /// Parse a raw commit message with a freshly compiled [`CommitParser`].
    ///
    /// Batches should build one parser and reuse it.
    pub fn parse(message: &str) -> Result<Self> {
        Ok(CommitParser::new()?.parse(message))
    }
}

/// Splits raw messages into [`CommitRecord`]s.
///
/// Supports headers of the form:
/// - type(scope)!: subject
/// - type(scope): subject
/// - type!: subject
/// - type: subject
///
/// A header that does not follow the convention (a missing space after the
/// colon included) yields an empty type and the whole header as subject, so
/// the classifier can still report it.
#[derive(Debug, Clone)]
pub struct CommitParser {
    header: Regex,
    footer_token: Regex,
}

impl CommitParser {
    pub fn new() -> Result<Self> {
        let header = Regex::new(HEADER_PATTERN)
            .map_err(|e| ReleaseGateError::commit(format!("Invalid header pattern: {}", e)))?;
        let footer_token = Regex::new(FOOTER_TOKEN_PATTERN)
            .map_err(|e| ReleaseGateError::commit(format!("Invalid footer pattern: {}", e)))?;
        Ok(CommitParser {
            header,
            footer_token,
        })
    }

    pub fn parse(&self, message: &str) -> CommitRecord {
        let lines: Vec<&str> = message.lines().map(str::trim_end).collect();

        let header = lines.first().copied().unwrap_or_default();
        let rest = lines.get(1..).unwrap_or_default();

        let mut record = match self.header.captures(header) {
            Some(captures) => CommitRecord {
                r#type: captures
                    .get(1)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                scope: captures.get(2).map(|m| m.as_str().to_string()),
                subject: captures
                    .get(4)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                body: None,
                footer: None,
                breaking: captures.get(3).is_some(),
                layout: BlockLayout::default(),
                raw_header: None,
            },
            None => CommitRecord::new("", header),
        };
        record.raw_header = Some(header.to_string());

        let footer_start = self.footer_start(rest);
        let (body_lines, footer_lines) = rest.split_at(footer_start.unwrap_or(rest.len()));

        record.body = join_block(body_lines);
        record.footer = join_block(footer_lines);
        record.layout = BlockLayout {
            body_leading_blanks: leading_blanks(body_lines),
            footer_leading_blanks: trailing_blanks(body_lines),
        };

        let breaking_footer = record.footer.as_deref().is_some_and(|footer| {
            footer
                .lines()
                .any(|line| line.starts_with("BREAKING CHANGE:") || line.starts_with("BREAKING-CHANGE:"))
        });
        if breaking_footer {
            record.breaking = true;
        }

        record
    }

    /// Index in `rest` where the footer starts, if there is one.
    ///
    /// Only the last paragraph can be the footer, and only when its first
    /// line is a trailer. A paragraph with no body above it must open with a
    /// breaking-change note or an issue reference (`Closes #12`); a lone
    /// `token: value` line there is body text.
    fn footer_start(&self, rest: &[&str]) -> Option<usize> {
        let start = (0..rest.len())
            .rev()
            .find(|&i| !rest[i].trim().is_empty() && (i == 0 || rest[i - 1].trim().is_empty()))?;
        let captures = self.footer_token.captures(rest[start])?;

        let has_body = rest[..start].iter().any(|line| !line.trim().is_empty());
        let is_reference = captures.name("sep").is_some_and(|m| m.as_str() == " #");
        if has_body || captures.name("breaking").is_some() || is_reference {
            Some(start)
        } else {
            None
        }
    }
}

/// Drop the `#` comment lines git leaves in a message file being edited.
pub fn strip_git_comments(message: &str) -> String {
    message
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_blanks(lines: &[&str]) -> usize {
    lines.iter().take_while(|line| line.trim().is_empty()).count()
}

fn trailing_blanks(lines: &[&str]) -> usize {
    lines
        .iter()
        .rev()
        .take_while(|line| line.trim().is_empty())
        .count()
}

fn join_block(lines: &[&str]) -> Option<String> {
    let start = leading_blanks(lines);
    if start == lines.len() {
        return None;
    }
    let end = lines.len() - trailing_blanks(lines);
    Some(lines[start..end].join("\n"))
}
