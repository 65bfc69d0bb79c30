#![forbid(unsafe_code)]

//! Asynchronous field validation contract.
//!
//! The editor only ever asks "are these fields valid?" and expects either
//! success or a list of per-field errors. How the answer is computed (form
//! rules, remote checks) belongs to the caller.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::path::CollectionPath;

/// One failed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location of the offending field.
    pub path: CollectionPath,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(path: CollectionPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validates a set of field paths.
pub trait Validator {
    /// Resolve with `Ok(())` when every field passes, or with the failures.
    fn validate(
        &self,
        paths: &[CollectionPath],
    ) -> impl Future<Output = Result<(), Vec<FieldError>>>;
}

/// Validator that accepts everything. Useful for groups without required fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    async fn validate(&self, _paths: &[CollectionPath]) -> Result<(), Vec<FieldError>> {
        Ok(())
    }
}

/// Synchronous validator over a closure, resolved immediately.
///
/// The closure returns the error message for a path, or `None` if it passes.
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&CollectionPath) -> Option<String>,
{
    #[must_use]
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").finish_non_exhaustive()
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&CollectionPath) -> Option<String>,
{
    async fn validate(&self, paths: &[CollectionPath]) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = paths
            .iter()
            .filter_map(|p| (self.check)(p).map(|msg| FieldError::new(p.clone(), msg)))
            .collect();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
