use crate::domain::prerelease::PreRelease;
use crate::error::{ReleaseGateError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Semantic-version component a batch of commits asks to increase.
///
/// Ordered `None < Patch < Minor < Major`, so the level of a batch is the
/// maximum over its commits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseLevel {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl ReleaseLevel {
    /// Whether this level fires a release at all
    pub fn is_release(&self) -> bool {
        *self != ReleaseLevel::None
    }
}

impl fmt::Display for ReleaseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseLevel::None => "none",
            ReleaseLevel::Patch => "patch",
            ReleaseLevel::Minor => "minor",
            ReleaseLevel::Major => "major",
        };
        f.write_str(name)
    }
}

/// Semantic version representation with an optional pre-release suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<PreRelease>,
}

impl Version {
    /// Create a new stable version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Parse a version string (e.g., "v1.2.3" or "1.2.3-rc.2")
    pub fn parse(input: &str) -> Result<Self> {
        let clean = input.trim_start_matches('v').trim_start_matches('V');
        let (core, pre) = match clean.split_once('-') {
            Some((core, pre)) => (core, Some(PreRelease::parse(pre)?)),
            None => (clean, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(ReleaseGateError::version(format!(
                "Invalid version format: '{}' - expected X.Y.Z",
                input
            )));
        }

        let component = |name: &str, value: &str| {
            value.parse::<u64>().map_err(|_| {
                ReleaseGateError::version(format!("Invalid {} version: {}", name, value))
            })
        };

        Ok(Version {
            major: component("major", parts[0])?,
            minor: component("minor", parts[1])?,
            patch: component("patch", parts[2])?,
            pre,
        })
    }

    /// The `major.minor.patch` part without any pre-release suffix
    pub fn base(&self) -> Version {
        Version::new(self.major, self.minor, self.patch)
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    pub fn with_prerelease(mut self, pre: PreRelease) -> Self {
        self.pre = Some(pre);
        self
    }

    /// Bump the stable base of this version by `level`.
    ///
    /// The result never carries a pre-release suffix. `None` keeps the base.
    pub fn bump(&self, level: ReleaseLevel) -> Self {
        match level {
            ReleaseLevel::None => self.base(),
            ReleaseLevel::Major => Version::new(self.major + 1, 0, 0),
            ReleaseLevel::Minor => Version::new(self.major, self.minor + 1, 0),
            ReleaseLevel::Patch => Version::new(self.major, self.minor, self.patch + 1),
        }
    }

    fn to_semver(&self) -> semver::Version {
        let mut version = semver::Version::new(self.major, self.minor, self.patch);
        if let Some(pre) = &self.pre {
            version.pre =
                semver::Prerelease::new(&pre.to_string()).unwrap_or(semver::Prerelease::EMPTY);
        }
        version
    }
}

impl Ord for Version {
    /// Semver precedence: `1.3.0-rc.1 < 1.3.0-rc.2 < 1.3.0`
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_semver().cmp(&other.to_semver())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}
