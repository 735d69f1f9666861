//! Error taxonomy for the harness.
//!
//! Failures split into two classes with distinct display prefixes so an
//! operator can tell "the harness or environment is broken" apart from
//! "the tool under test produced the wrong answer":
//!
//! | Class              | Meaning                                   | Recovery |
//! |--------------------|-------------------------------------------|----------|
//! | [`FatalError`]     | launch failure, crash, broken fixture     | none — abort the test step |
//! | [`ExpectationError`] | declared expectation did not hold       | test marked failed, harness state intact |

pub mod catalog;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use catalog::{CatalogError, ExitCodeCatalog};

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fatal harness errors. These abort the current test step immediately and
/// are never subject to expectation comparison.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The child process could not be started at all (binary missing,
    /// permission denied, ...).
    #[error("failed to launch {program}: {source}")]
    ProcessStart {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The dynamic loader refused to start the executable.
    #[error("missing LD_LIBRARY_PATH export, the loader could not find a shared library:\n{output}")]
    SharedLibraryLoad { output: String },

    /// Memory-safety instrumentation reported abnormal termination.
    #[error("sanitizer detected a crash, full output follows:\n{output}")]
    SanitizerCrash { output: String },

    /// Strict unmount saw a non-zero return code.
    #[error("{tool} exited with {exit_code} instead of 0")]
    Unmount { tool: String, exit_code: i32 },

    /// The fixture copy for a disk-image dump failed.
    #[error("could not create dump file {dest} (cp exited with {exit_code})")]
    DumpCopy { dest: PathBuf, exit_code: i32 },

    /// An expected-output file could not be read.
    #[error("could not read expected-output file {path}: {source}")]
    ExpectedFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An expectation pattern failed to compile.
    #[error("invalid expectation pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identifies which expectation field produced a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationField {
    ExitCode,
    Output,
    OutputFile,
    Pattern,
}

impl fmt::Display for ExpectationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExpectationField::ExitCode => "exit code",
            ExpectationField::Output => "output",
            ExpectationField::OutputFile => "output file",
            ExpectationField::Pattern => "pattern",
        };
        write!(f, "{s}")
    }
}

/// One failed expectation field with expected-vs-actual detail.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Mismatch {
    pub field: ExpectationField,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {:?}, got {:?}",
            self.field, self.expected, self.actual
        )
    }
}

/// A normal test failure: one or more declared expectation fields did not
/// hold. Every failing field is reported; checks never short-circuit each
/// other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationError {
    pub mismatches: Vec<Mismatch>,
}

impl fmt::Display for ExpectationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) mismatched", self.mismatches.len())?;
        for mismatch in &self.mismatches {
            write!(f, "\n  {mismatch}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExpectationError {}

/// Top-level harness error: either fatal or a plain expectation failure.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("harness fault: {0}")]
    Fatal(#[from] FatalError),

    #[error("expectation failed: {0}")]
    Expectation(#[from] ExpectationError),
}

impl HarnessError {
    /// True for failures that mean the harness or environment is broken,
    /// as opposed to the tool under test answering wrong.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarnessError::Fatal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_and_expectation_prefixes_differ() {
        let fatal: HarnessError = FatalError::Unmount {
            tool: "fusermount".to_string(),
            exit_code: 1,
        }
        .into();
        let mismatch: HarnessError = ExpectationError {
            mismatches: vec![Mismatch {
                field: ExpectationField::ExitCode,
                expected: "0".to_string(),
                actual: "2".to_string(),
            }],
        }
        .into();

        assert!(fatal.is_fatal());
        assert!(!mismatch.is_fatal());
        assert!(fatal.to_string().starts_with("harness fault:"));
        assert!(mismatch.to_string().starts_with("expectation failed:"));
    }

    #[test]
    fn test_expectation_error_lists_every_mismatch() {
        let err = ExpectationError {
            mismatches: vec![
                Mismatch {
                    field: ExpectationField::Output,
                    expected: "a".to_string(),
                    actual: "b".to_string(),
                },
                Mismatch {
                    field: ExpectationField::Pattern,
                    expected: "^x$".to_string(),
                    actual: "y".to_string(),
                },
            ],
        };

        let rendered = err.to_string();
        assert!(rendered.contains("2 field(s) mismatched"));
        assert!(rendered.contains("output: expected \"a\", got \"b\""));
        assert!(rendered.contains("pattern:"));
    }
}
