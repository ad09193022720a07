use crate::error::{AnnotationError, AnnotationResult};
use crate::utils::cancellation::CancellationToken;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A single run of an external predictor.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Name used in error messages
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, program: impl Into<PathBuf>, working_dir: &Path) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.to_path_buf(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

fn stop(child: &mut Child, tool: &str) -> AnnotationResult<()> {
    // kill fails if the process already exited, which is fine
    let _ = child.kill();
    child.wait().map_err(|e| AnnotationError::ToolIo {
        tool: tool.to_string(),
        source: e,
    })?;
    Ok(())
}

/// Runs the tool to completion. Output streams are discarded; only a zero
/// exit status counts as success.
pub fn invoke(invocation: &ToolInvocation, cancel: &CancellationToken) -> AnnotationResult<()> {
    let tool = invocation.tool.as_str();
    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| AnnotationError::ToolIo {
            tool: tool.to_string(),
            source: e,
        })?;

    let started = Instant::now();
    loop {
        let status = child.try_wait().map_err(|e| AnnotationError::ToolIo {
            tool: tool.to_string(),
            source: e,
        })?;

        if let Some(status) = status {
            if status.success() {
                return Ok(());
            }
            return Err(AnnotationError::ExternalToolFailure {
                tool: tool.to_string(),
                status,
            });
        }

        if cancel.is_cancelled() {
            stop(&mut child, tool)?;
            return Err(AnnotationError::Cancelled {
                tool: tool.to_string(),
            });
        }

        if let Some(timeout) = invocation.timeout {
            if started.elapsed() >= timeout {
                stop(&mut child, tool)?;
                return Err(AnnotationError::ToolTimeout {
                    tool: tool.to_string(),
                    timeout,
                });
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Checks that a predictor exists and is a regular file.
pub fn check_tool(name: &str, path: &Path) -> AnnotationResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AnnotationError::Argument(format!(
            "{} not found at {}. Please install it and pass its path",
            name,
            path.display()
        )))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str, dir: &Path) -> ToolInvocation {
        ToolInvocation::new("sh", "sh", dir).arg("-c").arg(script)
    }

    #[test]
    fn test_zero_exit_succeeds_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        invoke(&shell("echo noise; touch marker", dir.path()), &CancellationToken::new()).unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_non_zero_exit_is_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = invoke(&shell("exit 3", dir.path()), &CancellationToken::new()).unwrap_err();
        match err {
            AnnotationError::ExternalToolFailure { tool, status } => {
                assert_eq!(tool, "sh");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = ToolInvocation::new("porter", dir.path().join("missing"), dir.path());
        let err = invoke(&invocation, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, AnnotationError::ToolIo { .. }));
    }

    #[test]
    fn test_timeout_kills_hung_tool() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = shell("sleep 30", dir.path()).timeout(Some(Duration::from_millis(200)));

        let started = Instant::now();
        let err = invoke(&invocation, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, AnnotationError::ToolTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_cancelled_token_stops_tool() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = invoke(&shell("sleep 30", dir.path()), &cancel).unwrap_err();
        assert!(matches!(err, AnnotationError::Cancelled { .. }));
    }

    #[test]
    fn test_check_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("Porter5.py");
        assert!(check_tool("Porter", &tool).is_err());

        std::fs::write(&tool, "").unwrap();
        assert!(check_tool("Porter", &tool).is_ok());
        assert!(check_tool("Porter", dir.path()).is_err());
    }
}
