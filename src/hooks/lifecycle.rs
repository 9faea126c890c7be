use crate::release::ReleasePlan;
use std::collections::HashMap;

/// Points in the release run where a user command may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    /// Before anything is changed; a failure aborts the release
    VerifyConditions,
    /// After the changelog is written, before the release commit
    Prepare,
    /// After the tag is created and pushed
    Publish,
}

impl HookType {
    /// Get the hook name as a string
    pub fn name(&self) -> &'static str {
        match self {
            HookType::VerifyConditions => "verify-conditions",
            HookType::Prepare => "prepare",
            HookType::Publish => "publish",
        }
    }
}

/// Context information passed to a hook
#[derive(Debug, Clone)]
pub struct HookContext {
    pub hook_type: HookType,
    /// Branch the release is cut from
    pub branch: String,
    pub version: String,
    pub tag: String,
    /// Distribution channel, absent for stable releases
    pub channel: Option<String>,
    pub remote: String,
    /// Bump level (patch, minor, major)
    pub level: String,
}

impl HookContext {
    pub fn for_plan(hook_type: HookType, plan: &ReleasePlan, remote: &str) -> Self {
        HookContext {
            hook_type,
            branch: plan.branch.clone(),
            version: plan.version.to_string(),
            tag: plan.tag.clone(),
            channel: plan.channel.clone(),
            remote: remote.to_string(),
            level: plan.level.to_string(),
        }
    }

    /// Convert context to environment variables for the hook command
    ///
    /// Maps context fields to RELEASE_GATE_* environment variables
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();

        env.insert("RELEASE_GATE_HOOK".to_string(), self.hook_type.name().to_string());
        env.insert("RELEASE_GATE_BRANCH".to_string(), self.branch.clone());
        env.insert("RELEASE_GATE_VERSION".to_string(), self.version.clone());
        env.insert("RELEASE_GATE_TAG".to_string(), self.tag.clone());
        env.insert("RELEASE_GATE_REMOTE".to_string(), self.remote.clone());
        env.insert("RELEASE_GATE_LEVEL".to_string(), self.level.clone());

        if let Some(ref channel) = self.channel {
            env.insert("RELEASE_GATE_CHANNEL".to_string(), channel.clone());
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(channel: Option<&str>) -> HookContext {
        HookContext {
            hook_type: HookType::Prepare,
            branch: "release-candidate".to_string(),
            version: "1.3.0-rc.1".to_string(),
            tag: "v1.3.0-rc.1".to_string(),
            channel: channel.map(str::to_string),
            remote: "origin".to_string(),
            level: "minor".to_string(),
        }
    }

    #[test]
    fn test_hook_names() {
        assert_eq!(HookType::VerifyConditions.name(), "verify-conditions");
        assert_eq!(HookType::Prepare.name(), "prepare");
        assert_eq!(HookType::Publish.name(), "publish");
    }

    #[test]
    fn test_hook_context_to_env_vars_all_fields() {
        let env = context(Some("release-candidate")).to_env_vars();
        assert_eq!(env.get("RELEASE_GATE_HOOK"), Some(&"prepare".to_string()));
        assert_eq!(
            env.get("RELEASE_GATE_VERSION"),
            Some(&"1.3.0-rc.1".to_string())
        );
        assert_eq!(env.get("RELEASE_GATE_TAG"), Some(&"v1.3.0-rc.1".to_string()));
        assert_eq!(env.get("RELEASE_GATE_LEVEL"), Some(&"minor".to_string()));
        assert_eq!(
            env.get("RELEASE_GATE_CHANNEL"),
            Some(&"release-candidate".to_string())
        );
    }

    #[test]
    fn test_stable_release_has_no_channel_var() {
        let env = context(None).to_env_vars();
        assert_eq!(env.len(), 6);
        assert!(env.get("RELEASE_GATE_CHANNEL").is_none());
    }
}
