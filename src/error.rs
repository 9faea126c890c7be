use thiserror::Error;

/// Unified error type for release-gate operations
#[derive(Error, Debug)]
pub enum ReleaseGateError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid commit: {0}")]
    Commit(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Hook failed: {0}")]
    Hook(String),

    #[error("Branch synchronization failed: {0}")]
    Sync(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in release-gate
pub type Result<T> = std::result::Result<T, ReleaseGateError>;

impl ReleaseGateError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseGateError::Config(msg.into())
    }

    pub fn commit(msg: impl Into<String>) -> Self {
        ReleaseGateError::Commit(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseGateError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ReleaseGateError::Tag(msg.into())
    }

    pub fn branch(msg: impl Into<String>) -> Self {
        ReleaseGateError::Branch(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseGateError::Remote(msg.into())
    }

    pub fn hook(msg: impl Into<String>) -> Self {
        ReleaseGateError::Hook(msg.into())
    }

    /// Create a synchronization (backmerge) error with context
    pub fn sync(msg: impl Into<String>) -> Self {
        ReleaseGateError::Sync(msg.into())
    }

    /// Whether the error happened after a release was already published.
    ///
    /// Such errors are reported as follow-up work rather than as a failed run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReleaseGateError::Sync(_))
    }
}
