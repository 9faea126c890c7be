use crate::config::ReleaseConfig;
use crate::domain::{CommitRecord, ReleaseLevel};
use tracing::debug;

/// Level a single commit contributes.
///
/// Breaking commits contribute `Major` whatever their type. Types without a
/// rule contribute `None`; the classifier rejects them before they get here.
pub fn commit_level(commit: &CommitRecord, config: &ReleaseConfig) -> ReleaseLevel {
    if commit.breaking {
        return ReleaseLevel::Major;
    }
    commit
        .commit_type()
        .and_then(|t| config.rule_for(t))
        .map(|rule| rule.release)
        .unwrap_or(ReleaseLevel::None)
}

/// Resolve the bump level of a batch of accepted commits.
///
/// The maximum level over the batch; an empty batch is `None`, which means no
/// release may fire.
pub fn resolve_bump(commits: &[CommitRecord], config: &ReleaseConfig) -> ReleaseLevel {
    let level = commits
        .iter()
        .map(|commit| commit_level(commit, config))
        .max()
        .unwrap_or(ReleaseLevel::None);

    debug!(commits = commits.len(), %level, "resolved release level");
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeRule;
    use crate::domain::CommitType;
    use proptest::prelude::*;

    fn commit(r#type: &str) -> CommitRecord {
        CommitRecord::new(r#type, "Do something.")
    }

    #[test]
    fn test_empty_batch_is_none() {
        assert_eq!(
            resolve_bump(&[], &ReleaseConfig::default()),
            ReleaseLevel::None
        );
    }

    #[test]
    fn test_single_fix_is_patch() {
        let config = ReleaseConfig::default();
        let commits = vec![CommitRecord::new("fix", "Fix crash on empty input.")];
        assert_eq!(resolve_bump(&commits, &config), ReleaseLevel::Patch);
    }

    #[test]
    fn test_breaking_feat_is_major() {
        let config = ReleaseConfig::default();
        let commits = vec![CommitRecord::new("feat", "Change API shape.").with_breaking(true)];
        assert_eq!(resolve_bump(&commits, &config), ReleaseLevel::Major);
    }

    #[test]
    fn test_breaking_chore_is_major() {
        let config = ReleaseConfig::default();
        let commits = vec![commit("fix"), commit("chore").with_breaking(true)];
        assert_eq!(resolve_bump(&commits, &config), ReleaseLevel::Major);
    }

    #[test]
    fn test_chore_is_none() {
        let config = ReleaseConfig::default();
        let commits = vec![CommitRecord::new("chore", "Bump dependency.")];
        assert_eq!(resolve_bump(&commits, &config), ReleaseLevel::None);
    }

    #[test]
    fn test_security_and_refactor_are_minor() {
        let config = ReleaseConfig::default();
        assert_eq!(
            resolve_bump(&[commit("fix"), commit("security")], &config),
            ReleaseLevel::Minor
        );
        assert_eq!(
            resolve_bump(&[commit("refactor")], &config),
            ReleaseLevel::Minor
        );
        assert_eq!(
            resolve_bump(&[commit("update"), commit("test")], &config),
            ReleaseLevel::Patch
        );
    }

    #[test]
    fn test_unknown_type_contributes_nothing() {
        let config = ReleaseConfig::default();
        assert_eq!(
            resolve_bump(&[commit("perf"), commit("")], &config),
            ReleaseLevel::None
        );
    }

    #[test]
    fn test_custom_rule_table() {
        let config = ReleaseConfig {
            rules: vec![TypeRule {
                commit_type: CommitType::Chore,
                release: ReleaseLevel::Patch,
                section: None,
                emoji: None,
                hidden: true,
            }],
            ..ReleaseConfig::default()
        };
        assert_eq!(
            resolve_bump(&[commit("chore")], &config),
            ReleaseLevel::Patch
        );
        assert_eq!(resolve_bump(&[commit("feat")], &config), ReleaseLevel::None);
    }

    fn any_commit() -> impl Strategy<Value = CommitRecord> {
        let types: Vec<&'static str> = CommitType::ALL
            .iter()
            .map(|t| t.as_str())
            .chain(["perf", "Fix", ""])
            .collect();
        (prop::sample::select(types), any::<bool>())
            .prop_map(|(t, breaking)| commit(t).with_breaking(breaking))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn adding_a_commit_never_lowers_the_level(
            batch in prop::collection::vec(any_commit(), 0..12),
            extra in any_commit(),
        ) {
            let config = ReleaseConfig::default();
            let before = resolve_bump(&batch, &config);
            let mut extended = batch.clone();
            extended.push(extra);
            prop_assert!(resolve_bump(&extended, &config) >= before);
        }

        #[test]
        fn any_breaking_commit_forces_major(
            batch in prop::collection::vec(any_commit(), 0..12),
            position in 0usize..12,
        ) {
            let config = ReleaseConfig::default();
            let mut batch = batch;
            let index = position.min(batch.len());
            batch.insert(index, commit("doc").with_breaking(true));
            prop_assert_eq!(resolve_bump(&batch, &config), ReleaseLevel::Major);
        }

        #[test]
        fn order_does_not_matter(batch in prop::collection::vec(any_commit(), 0..12)) {
            let config = ReleaseConfig::default();
            let mut reversed = batch.clone();
            reversed.reverse();
            prop_assert_eq!(resolve_bump(&batch, &config), resolve_bump(&reversed, &config));
        }
    }
}
