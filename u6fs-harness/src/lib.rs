//! End-to-end test-orchestration harness for the `u6fs` filesystem tool.
//!
//! Drives the executable under test through complete scenarios: invoke it
//! with arguments, capture its output with stderr merged in, screen for
//! crashes, validate against multi-field expectations, and manage one
//! background FUSE mount per session. Every externally visible invocation
//! is recorded in shell-reproducible form so a failing test case can be
//! replayed by hand.
//!
//! # Quick tour
//!
//! ```ignore
//! use u6fs_harness::{Expectation, TestHarness, TestLifecycle, TestStatus};
//!
//! let mut harness = TestHarness::builder()
//!     .executable("./u6fs")
//!     .build();
//!
//! harness.on_test_start();
//! harness.run(
//!     ["disk.img", "sb"],
//!     &Expectation::new().exit_code("OK").pattern(r"^superblock"),
//! )?;
//! harness.on_test_end(TestStatus::Pass);
//! # Ok::<(), u6fs_harness::HarnessError>(())
//! ```
//!
//! Failures come in two classes: [`FatalError`] means the harness or the
//! environment is broken (launch failure, crash signature, broken
//! fixture) and aborts the test step; [`ExpectationError`] is an ordinary
//! wrong answer from the tool, reported with expected-vs-actual detail
//! for every failing field.

pub mod commands;
pub mod config;
pub mod crash;
pub mod errors;
pub mod expect;
pub mod harness;
pub mod mount;
pub mod replay;
pub mod runner;
pub mod testing;

pub use commands::Subcommand;
pub use config::{ConfigError, HarnessConfig};
pub use errors::{
    CatalogError, ExitCodeCatalog, ExpectationError, ExpectationField, FatalError, HarnessError,
    HarnessResult, Mismatch,
};
pub use expect::Expectation;
pub use harness::{TestHarness, TestHarnessBuilder, TestLifecycle, TestStatus};
pub use mount::MountSession;
pub use replay::{CommandRecord, ReplayLog};
pub use runner::{CommandInvocation, CommandResult, ProcessHandle, ProcessRunner};
