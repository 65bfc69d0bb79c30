use fitform_core::{CollectionPath, FieldError, StoreError};
use thiserror::Error;

pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Panel lifecycle failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("panel {index} is a system panel (first {system_count} are protected)")]
    Protected { index: usize, system_count: usize },

    #[error("panel index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("an add is already pending for group {group}")]
    AddInFlight { group: String },

    #[error("add ticket is no longer current")]
    StaleTicket,

    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("path does not resolve to a panel array: {path}")]
    Unresolved { path: CollectionPath },

    #[error("panel {name} is not a group panel")]
    NotAGroup { name: String },

    #[error("no panel named {name}")]
    UnknownPanel { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PanelError {
    /// Field failures, for a validation error.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Top-level editor error.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Panel(#[from] PanelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
