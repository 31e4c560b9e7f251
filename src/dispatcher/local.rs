use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::DispatchConfig;
use crate::execution::{DispatchOutcome, DispatchedScript, ScriptDispatcher};

/// Runs dispatched scripts on the local node with a shell
pub struct LocalScriptDispatcher {
    working_dir: PathBuf,
    config: DispatchConfig,
}

impl LocalScriptDispatcher {
    pub fn new(working_dir: impl Into<PathBuf>, config: DispatchConfig) -> Self {
        Self {
            working_dir: working_dir.into(),
            config,
        }
    }

    /// Check a node filter against the local node name
    ///
    /// Filters are comma-separated node names.
    fn targets_local_node(&self, filter: Option<&str>) -> bool {
        match filter {
            None => true,
            Some(filter) => filter
                .split(',')
                .map(str::trim)
                .any(|node| node == self.config.local_node),
        }
    }

    fn build_command(&self, script: &dyn DispatchedScript) -> Result<Command> {
        let mut command = Command::new(&self.config.shell);

        if let Some(content) = script.script() {
            // $0 is the shell name so args land in $1..
            command.arg("-c").arg(content).arg(&self.config.shell);
        } else if let Some(path) = script.server_script_path() {
            command.arg(path);
        } else {
            bail!("Dispatched script has neither inline content nor a script path");
        }

        command
            .args(script.args())
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        Ok(command)
    }

    /// Truncate output if it exceeds the maximum size
    fn truncate_output(output: String, max_bytes: usize) -> String {
        if output.len() <= max_bytes {
            return output;
        }

        // Don't cut in the middle of a UTF-8 character
        let mut safe_end = max_bytes;
        while !output.is_char_boundary(safe_end) {
            safe_end -= 1;
        }

        let mut result = output[..safe_end].to_string();
        result.push_str(&format!(
            "\n[OUTPUT TRUNCATED: {} bytes omitted, limit is {} bytes]",
            output.len() - safe_end,
            max_bytes
        ));
        result
    }
}

#[async_trait]
impl ScriptDispatcher for LocalScriptDispatcher {
    async fn dispatch(&self, script: &dyn DispatchedScript) -> Result<DispatchOutcome> {
        if !self.targets_local_node(script.node_filter()) {
            bail!(
                "Node filter '{}' does not match local node '{}'",
                script.node_filter().unwrap_or_default(),
                self.config.local_node
            );
        }

        let mut command = self.build_command(script)?;
        let timeout_secs = self.config.script_timeout_secs;

        tracing::debug!(
            "Running script locally with {}s timeout (project: {})",
            timeout_secs,
            script.project().unwrap_or(&self.config.project)
        );

        let child = command.spawn().context("Failed to spawn script")?;
        let output = match tokio::time::timeout(
            tokio::time::Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(output) => output.context("Failed to wait for script")?,
            Err(_) => {
                tracing::warn!("Script timed out after {}s and was killed", timeout_secs);
                bail!("Script exceeded the timeout of {} seconds", timeout_secs);
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        // Killed by a signal when there is no exit code
        let exit_code = output.status.code().unwrap_or(-1);

        Ok(DispatchOutcome {
            exit_code,
            output: Self::truncate_output(combined, self.config.max_output_bytes),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::execution::ScriptDescriptor;
    use tempfile::TempDir;

    fn dispatcher(dir: &TempDir) -> LocalScriptDispatcher {
        LocalScriptDispatcher::new(dir.path(), DispatchConfig::default())
    }

    #[tokio::test]
    async fn test_inline_script_with_args() -> Result<()> {
        let dir = TempDir::new()?;
        let script = ScriptDescriptor::inline("echo \"hello $1\"").add_arg("world");

        let outcome = dispatcher(&dir).dispatch(&script).await?;

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.output, "hello world\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_script_file_runs_in_working_dir() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("marker.txt"), "present")?;
        let script_path = dir.path().join("check.sh");
        std::fs::write(&script_path, "cat marker.txt\nexit 4\n")?;

        let outcome = dispatcher(&dir)
            .dispatch(&ScriptDescriptor::from_file(&script_path))
            .await?;

        assert_eq!(outcome.exit_code, 4);
        assert_eq!(outcome.output, "present");
        Ok(())
    }

    #[tokio::test]
    async fn test_stderr_is_captured() -> Result<()> {
        let dir = TempDir::new()?;
        let outcome = dispatcher(&dir)
            .dispatch(&ScriptDescriptor::inline("echo oops >&2; exit 1"))
            .await?;

        assert_eq!(outcome.exit_code, 1);
        assert!(outcome.output.contains("oops"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_empty_descriptor() -> Result<()> {
        let dir = TempDir::new()?;
        let err = dispatcher(&dir)
            .dispatch(&ScriptDescriptor::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("neither inline content nor a script path"));
        Ok(())
    }

    #[tokio::test]
    async fn test_node_filter() -> Result<()> {
        let dir = TempDir::new()?;
        let dispatcher = dispatcher(&dir);

        let local = ScriptDescriptor::inline("true").with_node_filter("web01, localhost");
        assert_eq!(dispatcher.dispatch(&local).await?.exit_code, 0);

        let remote = ScriptDescriptor::inline("true").with_node_filter("web01");
        let err = dispatcher.dispatch(&remote).await.unwrap_err();
        assert!(err.to_string().contains("does not match local node"));
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout() -> Result<()> {
        let dir = TempDir::new()?;
        let config = DispatchConfig {
            script_timeout_secs: 1,
            ..DispatchConfig::default()
        };
        let dispatcher = LocalScriptDispatcher::new(dir.path(), config);

        let err = dispatcher
            .dispatch(&ScriptDescriptor::inline("sleep 5"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("timeout of 1 seconds"));
        Ok(())
    }

    #[test]
    fn test_truncate_output() {
        let output = "héllo world".to_string();
        let truncated = LocalScriptDispatcher::truncate_output(output, 2);
        assert!(truncated.starts_with("h\n[OUTPUT TRUNCATED"));

        let short = LocalScriptDispatcher::truncate_output("ok".to_string(), 10);
        assert_eq!(short, "ok");
    }
}
