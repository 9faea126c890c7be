//! Release hooks
//!
//! User commands configured under `[hooks]` run at fixed points of a release:
//! - verify-conditions: before anything changes
//! - prepare: after the changelog is written, before the release commit
//! - publish: after the tag is pushed

pub mod executor;
pub mod lifecycle;

pub use executor::HookExecutor;
pub use lifecycle::{HookContext, HookType};
