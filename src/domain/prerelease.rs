//! Pre-release suffixes such as `rc.3`
//!
//! A release cut from the prerelease branch always carries an identifier and
//! an iteration number, starting at 1.

use crate::error::{ReleaseGateError, Result};
use std::fmt;

/// Pre-release suffix with its iteration number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreRelease {
    /// The pre-release identifier, `rc` unless configured otherwise
    pub identifier: String,
    /// Iteration within one release cycle
    pub iteration: u64,
}

impl PreRelease {
    pub fn new(identifier: impl Into<String>, iteration: u64) -> Self {
        PreRelease {
            identifier: identifier.into(),
            iteration,
        }
    }

    /// First iteration for an identifier
    pub fn first(identifier: impl Into<String>) -> Self {
        PreRelease::new(identifier, 1)
    }

    /// Check that an identifier is usable inside a version string
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.is_empty() {
            return Err(ReleaseGateError::version("Empty pre-release identifier"));
        }
        if !identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ReleaseGateError::version(format!(
                "Invalid pre-release identifier: '{}'",
                identifier
            )));
        }
        Ok(())
    }

    /// Parse a suffix like "rc.2"
    pub fn parse(s: &str) -> Result<Self> {
        let (identifier, iteration) = s.split_once('.').ok_or_else(|| {
            ReleaseGateError::version(format!(
                "Pre-release '{}' must have the form <id>.<n>",
                s
            ))
        })?;

        Self::validate_identifier(identifier)?;

        let iteration = iteration.parse::<u64>().map_err(|_| {
            ReleaseGateError::version(format!("Invalid iteration number: '{}'", iteration))
        })?;

        Ok(PreRelease::new(identifier, iteration))
    }

    /// The next iteration of the same identifier
    pub fn increment_iteration(&self) -> Self {
        PreRelease::new(self.identifier.clone(), self.iteration + 1)
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.identifier, self.iteration)
    }
}
