use crate::config::ReleaseConfig;
use crate::domain::CommitRecord;

/// One titled group of commits in the release notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesSection {
    pub title: String,
    pub emoji: Option<String>,
    /// Commits in chronological order
    pub commits: Vec<CommitRecord>,
}

impl NotesSection {
    /// Heading text, with the emoji shortcode in front when configured
    pub fn heading(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.title),
            None => self.title.clone(),
        }
    }
}

/// Sections in rule-table order; empty sections are never present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseNotes {
    pub sections: Vec<NotesSection>,
    /// Every breaking commit of the batch, hidden types included
    pub breaking: Vec<CommitRecord>,
}

impl ReleaseNotes {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.breaking.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&NotesSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }

    /// Breaking commits in chronological order
    pub fn breaking(&self) -> impl Iterator<Item = &CommitRecord> {
        self.breaking.iter()
    }
}

/// Group accepted commits into release-note sections.
///
/// Hidden types and types without a section title get no section even
/// though they still count towards the bump level. A breaking commit is
/// always listed under the breaking changes, whatever its type.
pub fn compose_notes(commits: &[CommitRecord], config: &ReleaseConfig) -> ReleaseNotes {
    let mut sections: Vec<NotesSection> = Vec::new();

    // Section order follows the first appearance of each title in the rule table.
    for rule in &config.rules {
        if rule.hidden {
            continue;
        }
        let Some(title) = rule.section.as_deref() else {
            continue;
        };
        if !sections.iter().any(|s| s.title == title) {
            sections.push(NotesSection {
                title: title.to_string(),
                emoji: rule.emoji.clone(),
                commits: Vec::new(),
            });
        }
    }

    for commit in commits {
        let rule = commit.commit_type().and_then(|t| config.rule_for(t));
        let Some(rule) = rule.filter(|r| !r.hidden) else {
            continue;
        };
        let Some(title) = rule.section.as_deref() else {
            continue;
        };
        if let Some(section) = sections.iter_mut().find(|s| s.title == title) {
            section.commits.push(commit.clone());
        }
    }

    sections.retain(|s| !s.commits.is_empty());
    let breaking = commits.iter().filter(|c| c.breaking).cloned().collect();
    ReleaseNotes { sections, breaking }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeRule;
    use crate::domain::{CommitType, ReleaseLevel};
    use crate::release::bump::resolve_bump;

    #[test]
    fn test_single_fix() {
        let commit = CommitRecord::new("fix", "Fix crash on empty input.");
        let notes = compose_notes(&[commit.clone()], &ReleaseConfig::default());
        assert_eq!(notes.titles(), vec!["FIX"]);
        assert_eq!(notes.get("FIX").unwrap().commits, vec![commit]);
    }

    #[test]
    fn test_sections_follow_rule_order_not_commit_order() {
        let commits = vec![
            CommitRecord::new("fix", "First fix."),
            CommitRecord::new("feat", "A feature."),
            CommitRecord::new("chore", "Chore."),
            CommitRecord::new("fix", "Second fix."),
        ];
        let notes = compose_notes(&commits, &ReleaseConfig::default());
        assert_eq!(notes.titles(), vec!["CHORE", "FEATURE", "FIX"]);

        let fixes: Vec<&str> = notes
            .get("FIX")
            .unwrap()
            .commits
            .iter()
            .map(|c| c.subject.as_str())
            .collect();
        assert_eq!(fixes, vec!["First fix.", "Second fix."]);
    }

    #[test]
    fn test_hidden_types_still_bump() {
        let config = ReleaseConfig::default();
        let commits = vec![CommitRecord::new("wip", "Half done.")];
        assert!(compose_notes(&commits, &config).is_empty());

        let breaking = vec![CommitRecord::new("wip", "Half done.").with_breaking(true)];
        assert_eq!(resolve_bump(&breaking, &config), ReleaseLevel::Major);
    }

    #[test]
    fn test_hidden_breaking_commit_is_still_noted() {
        let commit = CommitRecord::new("wip", "Drop the legacy API.").with_breaking(true);
        let notes = compose_notes(&[commit.clone()], &ReleaseConfig::default());
        assert!(notes.sections.is_empty());
        assert!(!notes.is_empty());
        assert_eq!(notes.breaking().collect::<Vec<_>>(), vec![&commit]);
    }

    #[test]
    fn test_chore_visible_by_default_and_hideable() {
        let commits = vec![CommitRecord::new("chore", "Bump dependency.")];
        let notes = compose_notes(&commits, &ReleaseConfig::default());
        assert_eq!(notes.titles(), vec!["CHORE"]);

        let mut config = ReleaseConfig::default();
        for rule in config.rules.iter_mut() {
            if rule.commit_type == CommitType::Chore {
                rule.hidden = true;
            }
        }
        assert!(compose_notes(&commits, &config).is_empty());
    }

    #[test]
    fn test_types_can_share_a_section() {
        let config = ReleaseConfig {
            rules: vec![
                TypeRule {
                    commit_type: CommitType::Fix,
                    release: ReleaseLevel::Patch,
                    section: Some("CHANGES".to_string()),
                    emoji: None,
                    hidden: false,
                },
                TypeRule {
                    commit_type: CommitType::Feat,
                    release: ReleaseLevel::Minor,
                    section: Some("CHANGES".to_string()),
                    emoji: None,
                    hidden: false,
                },
            ],
            ..ReleaseConfig::default()
        };
        let commits = vec![
            CommitRecord::new("feat", "Feature."),
            CommitRecord::new("fix", "Fix."),
        ];
        let notes = compose_notes(&commits, &config);
        assert_eq!(notes.titles(), vec!["CHANGES"]);
        assert_eq!(notes.get("CHANGES").unwrap().commits.len(), 2);
    }

    #[test]
    fn test_unknown_types_are_left_out() {
        let notes = compose_notes(
            &[CommitRecord::new("perf", "Speed.")],
            &ReleaseConfig::default(),
        );
        assert!(notes.is_empty());
    }

    #[test]
    fn test_heading_and_breaking() {
        let commits = vec![
            CommitRecord::new("feat", "Change API shape.").with_breaking(true),
            CommitRecord::new("fix", "Fix."),
        ];
        let notes = compose_notes(&commits, &ReleaseConfig::default());
        assert_eq!(notes.sections[0].heading(), ":sparkles: FEATURE");
        let breaking: Vec<&str> = notes.breaking().map(|c| c.subject.as_str()).collect();
        assert_eq!(breaking, vec!["Change API shape."]);
    }
}
