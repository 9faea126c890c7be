use crate::domain::{CommitRecord, Version};
use crate::error::Result;
use crate::release::ReleaseNotes;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::debug;

const CHANGELOG_TITLE: &str = "# Changelog";

/// Render the markdown fragment for one release.
///
/// ```text
/// ## 1.3.0 (2026-10-18)
///
/// ### :sparkles: FEATURE
///
/// * **api:** Add search.
/// ```
pub fn render(notes: &ReleaseNotes, version: &Version, date: NaiveDate) -> String {
    let mut out = format!("## {} ({})\n", version, date.format("%Y-%m-%d"));

    for section in &notes.sections {
        out.push_str(&format!("\n### {}\n\n", section.heading()));
        for commit in &section.commits {
            out.push_str(&entry(commit, &commit.subject));
        }
    }

    let breaking: Vec<&CommitRecord> = notes.breaking().collect();
    if !breaking.is_empty() {
        out.push_str("\n### BREAKING CHANGES\n\n");
        for commit in breaking {
            let note = commit.breaking_note().unwrap_or(&commit.subject);
            out.push_str(&entry(commit, note));
        }
    }

    out
}

fn entry(commit: &CommitRecord, text: &str) -> String {
    match commit.scope() {
        Some(scope) => format!("* **{}:** {}\n", scope, text),
        None => format!("* {}\n", text),
    }
}

/// Insert `fragment` at the top of the changelog, below its title.
///
/// The file is created when missing.
pub fn prepend_to_file(path: &Path, fragment: &str) -> Result<()> {
    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let rest = existing
        .strip_prefix(CHANGELOG_TITLE)
        .map(|s| s.trim_start_matches('\n'))
        .unwrap_or(&existing);

    let mut content = format!("{}\n\n{}", CHANGELOG_TITLE, fragment.trim_end());
    if !rest.trim().is_empty() {
        content.push_str("\n\n");
        content.push_str(rest.trim_end());
    }
    content.push('\n');

    fs::write(path, content)?;
    debug!(path = %path.display(), "updated changelog");
    Ok(())
}
