//! Post-run crash screening.
//!
//! Two rules, both fatal: they mean the environment or the tool's memory
//! safety is broken, not that the tool answered wrong. Any other non-zero
//! exit code is a perfectly normal candidate for expectation comparison —
//! plenty of correct behaviors under test are supposed to exit non-zero.

use std::sync::LazyLock;

use memchr::memmem;
use regex::Regex;

use crate::errors::FatalError;
use crate::runner::CommandResult;

/// Shell convention for "the command could not be executed at all".
pub const EXEC_FAILURE_EXIT_CODE: i32 = 127;

/// What the dynamic loader prints when a required shared library is not on
/// the search path.
pub const SHARED_LIBRARY_MARKER: &str = "error while loading shared libraries";

/// Signature line emitted by the address sanitizer on abnormal
/// termination, e.g. `==12345== ERROR: heap-buffer-overflow`.
static SANITIZER_CRASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"==\d+==\s*ERROR:").expect("sanitizer signature regex is valid"));

/// Inspect a completed result for signs of abnormal termination.
pub fn screen(result: &CommandResult) -> Result<(), FatalError> {
    if result.exit_code == EXEC_FAILURE_EXIT_CODE
        && memmem::find(result.output.as_bytes(), SHARED_LIBRARY_MARKER.as_bytes()).is_some()
    {
        return Err(FatalError::SharedLibraryLoad {
            output: result.output.clone(),
        });
    }

    if result.exit_code != 0 && SANITIZER_CRASH_RE.is_match(&result.output) {
        return Err(FatalError::SanitizerCrash {
            output: result.output.clone(),
        });
    }

    Ok(())
}
