use thiserror::Error;

use crate::path::CollectionPath;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("path does not resolve: {path}")]
    Unresolved { path: CollectionPath },

    #[error("index {index} out of bounds at {path} (length {length})")]
    IndexOutOfBounds {
        path: CollectionPath,
        index: usize,
        length: usize,
    },

    #[error("segment type mismatch at {path}: expected {expected}")]
    TypeMismatch {
        path: CollectionPath,
        expected: &'static str,
    },

    #[error("cannot replace the form root")]
    RootWrite,
}

impl StoreError {
    #[must_use]
    pub fn unresolved(path: &CollectionPath) -> Self {
        Self::Unresolved { path: path.clone() }
    }

    /// The path the error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&CollectionPath> {
        match self {
            Self::Unresolved { path }
            | Self::IndexOutOfBounds { path, .. }
            | Self::TypeMismatch { path, .. } => Some(path),
            Self::RootWrite => None,
        }
    }
}
