//! Multi-field expectation validation.
//!
//! An [`Expectation`] carries up to four independent checks: symbolic exit
//! code, literal output, expected-output file, and regex pattern. Every
//! declared field is evaluated unconditionally so one call reports all the
//! mismatches at once.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::errors::{
    ExitCodeCatalog, ExpectationError, ExpectationField, FatalError, HarnessError, Mismatch,
};
use crate::runner::CommandResult;

/// Declared expectations for one invocation. An absent field means "no
/// check"; all four may be present at once. Constructed per invocation and
/// never persisted.
#[derive(Debug, Clone, Default)]
pub struct Expectation {
    exit_code: Option<String>,
    output: Option<String>,
    output_file: Option<PathBuf>,
    pattern: Option<String>,
}

impl Expectation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect the exit code the catalog resolves this symbolic name to.
    pub fn exit_code(mut self, name: impl Into<String>) -> Self {
        self.exit_code = Some(name.into());
        self
    }

    /// Expect this exact output, surrounding whitespace ignored on both
    /// sides of the comparison.
    pub fn output(mut self, expected: impl Into<String>) -> Self {
        self.output = Some(expected.into());
        self
    }

    /// Expect the output stored in this file, same trimming rule.
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Expect the raw output to contain a match for this pattern. The
    /// match may land anywhere unless the pattern itself anchors with
    /// `^...$`.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// True when no field is declared; `check` then trivially passes.
    pub fn is_empty(&self) -> bool {
        self.exit_code.is_none()
            && self.output.is_none()
            && self.output_file.is_none()
            && self.pattern.is_none()
    }

    /// Validate a result against every declared field.
    pub fn check(
        &self,
        result: &CommandResult,
        catalog: &ExitCodeCatalog,
    ) -> Result<(), HarnessError> {
        let mut mismatches = Vec::new();

        if let Some(name) = &self.exit_code {
            match catalog.compare_exit_code(result, name) {
                Ok(None) => {}
                Ok(Some(mismatch)) => mismatches.push(mismatch),
                Err(source) => return Err(FatalError::from(source).into()),
            }
        }

        if let Some(expected) = &self.output {
            push_trimmed_mismatch(
                &mut mismatches,
                ExpectationField::Output,
                expected,
                &result.output,
            );
        }

        if let Some(path) = &self.output_file {
            let expected = read_expected_file(path)?;
            push_trimmed_mismatch(
                &mut mismatches,
                ExpectationField::OutputFile,
                &expected,
                &result.output,
            );
        }

        if let Some(pattern) = &self.pattern {
            let re = Regex::new(pattern).map_err(|source| FatalError::BadPattern {
                pattern: pattern.clone(),
                source,
            })?;
            if !re.is_match(&result.output) {
                mismatches.push(Mismatch {
                    field: ExpectationField::Pattern,
                    expected: pattern.clone(),
                    actual: result.output.clone(),
                });
            }
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(ExpectationError { mismatches }.into())
        }
    }
}

/// Trim both sides and compare; internal whitespace stays significant.
fn push_trimmed_mismatch(
    mismatches: &mut Vec<Mismatch>,
    field: ExpectationField,
    expected: &str,
    actual: &str,
) {
    let expected = expected.trim();
    let actual = actual.trim();
    if expected != actual {
        mismatches.push(Mismatch {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
}

fn read_expected_file(path: &Path) -> Result<String, FatalError> {
    std::fs::read_to_string(path).map_err(|source| FatalError::ExpectedFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn catalog() -> ExitCodeCatalog {
        ExitCodeCatalog::from_definitions(["OK", "INVALID_ARGS"], [0, 2]).unwrap()
    }

    fn result(exit_code: i32, output: &str) -> CommandResult {
        CommandResult {
            exit_code,
            output: output.to_string(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_empty_expectation_always_passes() {
        let expectation = Expectation::new();
        assert!(expectation.is_empty());
        expectation.check(&result(42, "anything"), &catalog()).unwrap();
    }

    #[test]
    fn test_exit_code_comparison_ignores_output() {
        Expectation::new()
            .exit_code("INVALID_ARGS")
            .check(&result(2, "whatever the tool printed"), &catalog())
            .unwrap();
    }

    #[test]
    fn test_output_comparison_trims_edges_only() {
        let catalog = catalog();
        Expectation::new()
            .output("a\nb")
            .check(&result(0, "a\nb \n"), &catalog)
            .unwrap();

        let err = Expectation::new()
            .output("a b")
            .check(&result(0, "a  b"), &catalog)
            .unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_file_comparison_trims_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("expected.txt");
        std::fs::write(&reference, "superblock: ok\n").unwrap();

        Expectation::new()
            .output_file(&reference)
            .check(&result(0, "  superblock: ok"), &catalog())
            .unwrap();
    }

    #[test]
    fn test_missing_expected_file_is_fatal() {
        let err = Expectation::new()
            .output_file("/nonexistent/expected.txt")
            .check(&result(0, ""), &catalog())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_pattern_matches_anywhere_in_raw_output() {
        let catalog = catalog();
        Expectation::new()
            .pattern(r"inode\s+\d+")
            .check(&result(0, "listing:\ninode 3 (dir)\n"), &catalog)
            .unwrap();

        // Anchors still bind to the whole text when the author asks.
        let err = Expectation::new()
            .pattern(r"^inode 3$")
            .check(&result(0, "listing:\ninode 3 (dir)\n"), &catalog)
            .unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invalid_pattern_is_fatal() {
        let err = Expectation::new()
            .pattern("([unclosed")
            .check(&result(0, ""), &catalog())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_all_fields_checked_no_short_circuit() {
        let err = Expectation::new()
            .exit_code("OK")
            .output("expected text")
            .pattern("expected-pattern")
            .check(&result(2, "actual text"), &catalog())
            .unwrap_err();

        match err {
            HarnessError::Expectation(e) => {
                let fields: Vec<_> = e.mismatches.iter().map(|m| m.field).collect();
                assert_eq!(
                    fields,
                    vec![
                        ExpectationField::ExitCode,
                        ExpectationField::Output,
                        ExpectationField::Pattern,
                    ]
                );
            }
            other => panic!("expected accumulated mismatches, got {other}"),
        }
    }

    #[test]
    fn test_unknown_symbolic_name_is_fatal() {
        let err = Expectation::new()
            .exit_code("ERR_NOT_IN_CATALOG")
            .check(&result(0, ""), &catalog())
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
