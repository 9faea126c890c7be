//! Domain logic - pure types independent of git operations

pub mod branch;
pub mod commit;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use branch::{BranchRole, BranchTopology, SyncRequest};
pub use commit::{strip_git_comments, BlockLayout, CommitParser, CommitRecord, CommitType};
pub use prerelease::PreRelease;
pub use tag::TagPattern;
pub use version::{ReleaseLevel, Version};
