// assetprep/src/converter/command.rs
//! Blocking execution of external converter processes with a wall-clock
//! timeout.

use crate::core::{AssetError, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Output captured from a finished process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    /// Lossy UTF-8.
    pub stdout: String,
    /// Lossy UTF-8.
    pub stderr: String,
}

/// Builder for a single external tool invocation.
///
/// ```no_run
/// use assetprep::ToolCommand;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// let output = ToolCommand::new(PathBuf::from("python3"))
///     .arg("scripts/spice_to_svg.py")
///     .args(["assets/a.cir", "assets/a.cir.svg"])
///     .timeout(Duration::from_secs(60))
///     .execute()?;
/// println!("{}", output.stdout);
/// # Ok::<(), assetprep::AssetError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Runs the process to completion, capturing stdout and stderr.
    ///
    /// Spawn failures, non-zero exit codes and timeouts all come back as
    /// [`AssetError::Tool`]. A non-zero exit carries the trimmed stderr as
    /// its message; a timed-out child is killed and reaped first.
    pub fn execute(&self) -> Result<ToolOutput> {
        let tool = self.program_name();
        log::debug!("Running: {}", self.command_line());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AssetError::Tool {
                tool: tool.clone(),
                message: format!("failed to spawn: {e}"),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.wait_with_deadline(&mut child) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AssetError::Tool {
                    tool,
                    message: format!("timed out after {:?}", self.timeout),
                });
            }
            Err(e) => {
                let _ = child.kill();
                return Err(AssetError::Tool {
                    tool,
                    message: format!("I/O error waiting for process: {e}"),
                });
            }
        };

        let output = ToolOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        };

        if !output.status.success() {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                format!("exited with status {}", output.status)
            } else {
                stderr.to_string()
            };
            return Err(AssetError::Tool { tool, message });
        }

        Ok(output)
    }

    /// `Ok(None)` once the deadline passes with the child still running.
    fn wait_with_deadline(&self, child: &mut Child) -> std::io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }
}

// Pipes are read on their own threads so a chatty child cannot block on a
// full pipe buffer while we poll for its exit.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn execute_captures_stdout() {
        let output = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo hello"])
            .execute()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_reports_stderr() {
        let err = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo broken netlist >&2; exit 3"])
            .execute()
            .unwrap_err();
        match err {
            AssetError::Tool { tool, message } => {
                assert_eq!(tool, "sh");
                assert_eq!(message, "broken netlist");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn execute_nonexistent_tool() {
        let result = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345")).execute();
        let err = result.unwrap_err().to_string();
        assert!(err.contains("failed to spawn"), "unexpected error: {err}");
    }

    #[test]
    fn timeout_fires() {
        let started = Instant::now();
        let result = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute();
        let err = result.unwrap_err().to_string();
        assert!(err.contains("timed out"), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
