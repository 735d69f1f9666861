//! Exit-code catalog for the executable under test.
//!
//! `u6fs` reports failures through a catalog of symbolic error names, each
//! mapped to the numeric code the process exits with. Test cases talk in
//! symbolic names; this module resolves them to the integers that actually
//! come back from the operating system.
//!
//! The catalog is a lookup service only. It is constructed from an
//! enum/array definition pair that has already been extracted from the
//! tool's sources — two parallel sequences, symbolic names and numeric
//! codes. Parsing those sources is someone else's job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{ExpectationField, Mismatch};
use crate::runner::CommandResult;

/// Errors raised by catalog construction or lookup. All of them mean the
/// test suite itself is misconfigured, so they surface as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog definition mismatch: {names} names for {codes} codes")]
    DefinitionLengthMismatch { names: usize, codes: usize },

    #[error("duplicate error name in catalog: {0}")]
    DuplicateName(String),

    #[error("unknown error name: {0}")]
    UnknownName(String),
}

/// Symbolic error name → numeric process exit code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitCodeCatalog {
    codes: HashMap<String, i32>,
}

impl ExitCodeCatalog {
    /// Build a catalog from an enum/array definition pair: the symbolic
    /// names and their numeric codes, in matching order.
    pub fn from_definitions<N>(
        names: impl IntoIterator<Item = N>,
        codes: impl IntoIterator<Item = i32>,
    ) -> Result<Self, CatalogError>
    where
        N: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let codes: Vec<i32> = codes.into_iter().collect();
        if names.len() != codes.len() {
            return Err(CatalogError::DefinitionLengthMismatch {
                names: names.len(),
                codes: codes.len(),
            });
        }

        let mut table = HashMap::with_capacity(names.len());
        for (name, code) in names.into_iter().zip(codes) {
            if table.insert(name.clone(), code).is_some() {
                return Err(CatalogError::DuplicateName(name));
            }
        }
        Ok(Self { codes: table })
    }

    /// The catalog for the stock `u6fs` tool.
    ///
    /// Numeric values follow the tool's error enum ordering; `OK` is an
    /// alias for `ERR_NONE` so test cases can state the success case
    /// without the `ERR_` spelling.
    pub fn u6fs_default() -> Self {
        let names = [
            "ERR_NONE",
            "ERR_NOMEM",
            "ERR_IO",
            "ERR_BAD_BOOT_SECTOR",
            "ERR_UNALLOCATED_INODE",
            "ERR_BAD_PARAMETER",
            "ERR_OFFSET_OUT_OF_RANGE",
            "ERR_FILENAME_TOO_LONG",
            "ERR_INVALID_DIRECTORY_INODE",
            "ERR_FILENAME_ALREADY_EXISTS",
            "ERR_BITMAP_FULL",
            "ERR_FILE_TOO_LARGE",
            "ERR_NO_SUCH_FILE",
            "ERR_INVALID_COMMAND",
        ];
        let codes = 0..names.len() as i32;

        let mut catalog = Self::from_definitions(names, codes)
            .expect("static u6fs definitions are well formed");
        catalog.codes.insert("OK".to_string(), 0);
        catalog
    }

    /// Resolve a symbolic name to its numeric exit code.
    pub fn resolve(&self, name: &str) -> Result<i32, CatalogError> {
        self.codes
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::UnknownName(name.to_string()))
    }

    /// Compare a command result's exit code against a symbolic name.
    ///
    /// `Ok(None)` means the codes match; `Ok(Some(_))` carries the
    /// expected-vs-actual detail for the validator to accumulate.
    pub fn compare_exit_code(
        &self,
        result: &CommandResult,
        name: &str,
    ) -> Result<Option<Mismatch>, CatalogError> {
        let expected = self.resolve(name)?;
        if result.exit_code == expected {
            Ok(None)
        } else {
            Ok(Some(Mismatch {
                field: ExpectationField::ExitCode,
                expected: format!("{name} ({expected})"),
                actual: result.exit_code.to_string(),
            }))
        }
    }

    /// Number of symbolic names in the catalog.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
