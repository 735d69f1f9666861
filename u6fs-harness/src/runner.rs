//! Process execution with merged output capture.
//!
//! One runner executes everything the harness touches: the executable
//! under test (foreground or background), the unmount tool, and fixture
//! copies. Standard error always shares the standard-output pipe so the
//! captured text interleaves exactly as a terminal would have shown it.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::errors::FatalError;
use crate::replay::ReplayLog;

/// One command to execute: executable path plus ordered arguments.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandInvocation {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Base name of the executable, the way an operator would type it.
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Result of a completed command: exit code and the merged output stream.
/// Read-only once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub output: String,
    pub duration: Duration,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn output_contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }
}

/// Handle to a background-launched process. The drain thread keeps
/// collecting the merged output until the child exits; nothing about the
/// output is trustworthy until the handle is waited on.
#[derive(Debug)]
pub struct ProcessHandle {
    name: String,
    args: Vec<String>,
    child: Child,
    drain: JoinHandle<String>,
    started_at: Instant,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Non-blocking liveness probe.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

/// Translate an exit status into the code a shell would report: the plain
/// code when there is one, `128 + signal` for signal deaths on Unix.
fn shell_exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Executes commands for one harness instance. Owns the replay log so
/// every invocation is recorded before it starts.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    env: HashMap<String, String>,
    log: ReplayLog,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(env: HashMap<String, String>) -> Self {
        Self {
            env,
            log: ReplayLog::new(),
        }
    }

    pub fn log(&self) -> &ReplayLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ReplayLog {
        &mut self.log
    }

    /// Run a command to completion, capturing stderr interleaved into
    /// stdout. Launch failure is fatal, never an expectation matter.
    pub fn run(&mut self, invocation: &CommandInvocation) -> Result<CommandResult, FatalError> {
        let handle = self.launch(invocation)?;
        self.wait(handle)
    }

    /// Launch a command without blocking. No checks are performed on the
    /// process; the caller owns eventual termination via [`Self::wait`].
    pub fn run_background(
        &mut self,
        invocation: &CommandInvocation,
    ) -> Result<ProcessHandle, FatalError> {
        let handle = self.launch(invocation)?;
        debug!(program = %handle.name, pid = handle.pid(), "background process launched");
        Ok(handle)
    }

    /// Block until a background-launched process terminates and return its
    /// result.
    pub fn wait(&mut self, handle: ProcessHandle) -> Result<CommandResult, FatalError> {
        let ProcessHandle {
            name,
            args,
            mut child,
            drain,
            started_at,
        } = handle;

        let status = child.wait().map_err(FatalError::Io)?;
        let output = drain.join().unwrap_or_default();
        let duration = started_at.elapsed();
        let exit_code = shell_exit_code(status);

        if exit_code != 0 {
            warn!(program = %name, exit_code, "command finished with non-zero exit");
        } else {
            debug!(program = %name, duration_ms = duration.as_millis() as u64, "command finished");
        }

        let result = CommandResult {
            exit_code,
            output,
            duration,
        };
        self.log
            .record_result(&name, &args, result.exit_code, result.duration);
        Ok(result)
    }

    /// Record the invocation, then spawn it with one shared pipe behind
    /// both output streams.
    fn launch(&mut self, invocation: &CommandInvocation) -> Result<ProcessHandle, FatalError> {
        let name = invocation.display_name();
        self.log.record(&name, invocation.args());

        let (reader, writer) = std::io::pipe().map_err(FatalError::Io)?;
        let writer_for_stderr = writer.try_clone().map_err(FatalError::Io)?;

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(writer_for_stderr);
        for (key, value) in &self.env {
            command.env(key, value);
        }

        debug!(program = %name, args = ?invocation.args(), "executing");
        let started_at = Instant::now();
        let child = command.spawn().map_err(|source| FatalError::ProcessStart {
            program: invocation.program().display().to_string(),
            source,
        })?;
        // The Command keeps the parent-side pipe halves; they must be gone
        // before the drain thread can see EOF.
        drop(command);

        let drain = thread::spawn(move || {
            let mut reader = reader;
            let mut buffer = Vec::new();
            let _ = reader.read_to_end(&mut buffer);
            String::from_utf8_lossy(&buffer).into_owned()
        });

        Ok(ProcessHandle {
            name,
            args: invocation.args().to_vec(),
            child,
            drain,
            started_at,
        })
    }
}
