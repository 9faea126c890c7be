pub mod boundary;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod hooks;
pub mod lint;
pub mod release;
pub mod ui;

pub use error::{ReleaseGateError, Result};
