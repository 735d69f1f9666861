//! The harness façade.
//!
//! [`TestHarness`] ties the pieces together for one test session: a
//! process runner with its replay log, the exit-code catalog, and at most
//! one background mount. The surrounding test-execution engine drives it
//! through the [`TestLifecycle`] hooks and the `run`/`start_fuse`/
//! `stop_fuse` operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::commands::Subcommand;
use crate::config::HarnessConfig;
use crate::crash;
use crate::errors::{ExitCodeCatalog, FatalError, HarnessResult};
use crate::expect::Expectation;
use crate::mount::MountSession;
use crate::replay::ReplayLog;
use crate::runner::{CommandInvocation, CommandResult, ProcessHandle, ProcessRunner};

/// Outcome the test-execution engine reports at test end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Pass,
    Fail,
}

/// Lifecycle hooks the surrounding test engine calls explicitly. The
/// harness holds no dependency on how the engine discovers them.
pub trait TestLifecycle {
    /// Called when a test case starts.
    fn on_test_start(&mut self);

    /// Called when a test case ends with its final status.
    fn on_test_end(&mut self, status: TestStatus);
}

/// One end-to-end test session around the executable under test.
pub struct TestHarness {
    config: HarnessConfig,
    catalog: ExitCodeCatalog,
    runner: ProcessRunner,
    mount: MountSession,
}

impl TestHarness {
    pub fn new(config: HarnessConfig, catalog: ExitCodeCatalog) -> Self {
        let runner = ProcessRunner::with_env(config.env_vars.clone());
        Self {
            config,
            catalog,
            runner,
            mount: MountSession::new(),
        }
    }

    /// Harness with default config and the stock u6fs catalog.
    pub fn default_for_tool(executable: impl Into<PathBuf>) -> Self {
        let config = HarnessConfig {
            executable: executable.into(),
            ..HarnessConfig::default()
        };
        Self::new(config, ExitCodeCatalog::u6fs_default())
    }

    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ExitCodeCatalog {
        &self.catalog
    }

    /// The replay log for the current test case.
    pub fn replay(&self) -> &ReplayLog {
        self.runner.log()
    }

    /// Run the executable under test with the given arguments, screen the
    /// result for crashes, then validate it against the expectation.
    pub fn run<I, S>(&mut self, args: I, expectation: &Expectation) -> HarnessResult<CommandResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = CommandInvocation::new(&self.config.executable, args);
        let result = self.runner.run(&invocation)?;
        crash::screen(&result)?;
        expectation.check(&result, &self.catalog)?;
        Ok(result)
    }

    /// Launch the executable under test in the background. No checks are
    /// performed; the caller is responsible for eventual termination and
    /// must not rely on output correctness before [`Self::wait`].
    pub fn run_background<I, S>(&mut self, args: I) -> HarnessResult<ProcessHandle>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = CommandInvocation::new(&self.config.executable, args);
        Ok(self.runner.run_background(&invocation)?)
    }

    /// Wait for a background-launched process and return its result.
    pub fn wait(&mut self, handle: ProcessHandle) -> HarnessResult<CommandResult> {
        Ok(self.runner.wait(handle)?)
    }

    /// Run one subcommand from the table against `image`.
    pub fn run_subcommand(
        &mut self,
        image: &Path,
        subcommand: &Subcommand,
        expectation: &Expectation,
    ) -> HarnessResult<CommandResult> {
        self.run(subcommand.to_args(image), expectation)
    }

    /// Mount `image` at `mount_point` in the background. Idempotent:
    /// a live session at the same path is torn down first.
    pub fn start_fuse(&mut self, image: &Path, mount_point: &Path) -> HarnessResult<()> {
        self.mount
            .start(&mut self.runner, &self.config, image, mount_point)
    }

    /// Unmount and reap the background mount, returning its final result
    /// if a session was active.
    pub fn stop_fuse(
        &mut self,
        mount_point: &Path,
        strict: bool,
    ) -> HarnessResult<Option<CommandResult>> {
        self.mount
            .stop(&mut self.runner, &self.config, mount_point, strict)
    }

    /// True while a background mount process is tracked.
    pub fn mount_active(&self) -> bool {
        self.mount.is_active()
    }

    /// Copy a disk image to a dump file with plain `cp`. A failed copy
    /// means the fixture could not be prepared: fatal, not a test failure.
    pub fn create_dump(&mut self, image: &Path, dump: &Path) -> HarnessResult<()> {
        let invocation = CommandInvocation::new(
            "cp",
            [image.display().to_string(), dump.display().to_string()],
        );
        let result = self.runner.run(&invocation)?;
        if !result.success() {
            return Err(FatalError::DumpCopy {
                dest: dump.to_path_buf(),
                exit_code: result.exit_code,
            }
            .into());
        }
        Ok(())
    }

    /// Write the session's command records as a JSON artifact.
    pub fn write_command_records(&self, path: &Path) -> std::io::Result<()> {
        self.runner.log().write_records_json(path)
    }
}

impl TestLifecycle for TestHarness {
    fn on_test_start(&mut self) {
        self.runner.log_mut().reset();
    }

    fn on_test_end(&mut self, status: TestStatus) {
        if status == TestStatus::Fail {
            info!("test case failed, dumping replay instructions");
            self.runner.log().print_instructions();
        }
    }
}

/// Builder for a [`TestHarness`] with custom configuration.
pub struct TestHarnessBuilder {
    config: HarnessConfig,
    catalog: Option<ExitCodeCatalog>,
}

impl TestHarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
            catalog: None,
        }
    }

    /// Path to the executable under test.
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.executable = path.into();
        self
    }

    /// Unmount tool invoked as `<tool> -u <mountpoint>`.
    pub fn unmount_tool(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.unmount_tool = path.into();
        self
    }

    /// Pause after a background mount launch.
    pub fn settle_interval(mut self, interval: Duration) -> Self {
        self.config.settle_interval = interval;
        self
    }

    /// Add an environment variable for every spawned process.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config
            .env_vars
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Replace the whole environment map.
    pub fn env_vars(mut self, env_vars: HashMap<String, String>) -> Self {
        self.config.env_vars = env_vars;
        self
    }

    /// Exit-code catalog; defaults to the stock u6fs catalog.
    pub fn catalog(mut self, catalog: ExitCodeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> TestHarness {
        let catalog = self
            .catalog
            .unwrap_or_else(ExitCodeCatalog::u6fs_default);
        TestHarness::new(self.config, catalog)
    }
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}
