use crate::error::{ReleaseGateError, Result};
use crate::hooks::HookContext;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Runs configured hook commands through `sh -c`
pub struct HookExecutor;

impl HookExecutor {
    /// Execute a hook command with the given context
    ///
    /// `{version}` in the command is replaced by the release version and the
    /// context is exported as environment variables. The command runs in
    /// `workdir`. Any non-zero exit code is a failure.
    pub fn execute(command: &str, context: &HookContext, workdir: &Path) -> Result<()> {
        let command = command.trim();
        if command.is_empty() {
            return Err(ReleaseGateError::hook(format!(
                "Empty command for hook '{}'",
                context.hook_type.name()
            )));
        }

        let rendered = command.replace("{version}", &context.version);
        debug!(hook = context.hook_type.name(), command = %rendered, "running hook");

        let output = Command::new("sh")
            .arg("-c")
            .arg(&rendered)
            .current_dir(workdir)
            .envs(context.to_env_vars())
            .output()
            .map_err(|e| {
                ReleaseGateError::hook(format!(
                    "Failed to run hook '{}': {}",
                    context.hook_type.name(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(ReleaseGateError::hook(format!(
                "Hook '{}' failed with exit code {}\nStdout: {}\nStderr: {}",
                context.hook_type.name(),
                output.status.code().unwrap_or(-1),
                stdout.trim_end(),
                stderr.trim_end()
            )));
        }

        Ok(())
    }

    /// Run `command` when configured; `None` is a no-op
    pub fn run_optional(command: Option<&str>, context: &HookContext, workdir: &Path) -> Result<()> {
        match command {
            Some(command) => Self::execute(command, context, workdir),
            None => Ok(()),
        }
    }
}
