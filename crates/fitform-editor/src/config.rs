#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! All fields have defaults, so an empty document is a valid configuration.
//!
//! ```toml
//! [drag]
//! click_threshold = 5.0
//!
//! [ingest]
//! disable_duplicate = true
//! batch_window_ms = 10
//! default_target = { rule = "path", path = ["exerciseList"] }
//!
//! [panels]
//! open_mode = "accordion"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::drag::DragConfig;
use crate::error::ConfigError;
use crate::ingest::{DefaultTarget, IngestConfig};
use crate::panel::OpenMode;

/// Longest accepted coalescing window.
pub const MAX_BATCH_WINDOW_MS: u64 = 1_000;

/// Panel header settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub open_mode: OpenMode,
}

/// Complete editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub drag: DragConfig,
    pub ingest: IngestConfig,
    pub panels: PanelConfig,
}

impl EditorConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check every value is within range.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let threshold = self.drag.click_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            errors.push(format!(
                "drag.click_threshold must be finite and > 0, got {threshold}"
            ));
        }

        if self.ingest.batch_window_ms > MAX_BATCH_WINDOW_MS {
            errors.push(format!(
                "ingest.batch_window_ms must be <= {MAX_BATCH_WINDOW_MS}, got {}",
                self.ingest.batch_window_ms
            ));
        }

        if matches!(&self.ingest.default_target, DefaultTarget::Path(path) if path.is_empty()) {
            errors.push("ingest.default_target path must not be empty".into());
        }

        errors
    }

    /// Return `self` if [`validate`](Self::validate) finds nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitform_core::{CollectionPath, cpath};

    #[test]
    fn empty_document_gives_defaults() {
        let config = EditorConfig::from_toml_str("").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.drag.click_threshold, 5.0);
        assert_eq!(config.ingest.batch_window_ms, 10);
        assert_eq!(config.ingest.default_target, DefaultTarget::LastPanel);
        assert_eq!(config.panels.open_mode, OpenMode::Multi);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn toml_overrides() {
        let config = EditorConfig::from_toml_str(
            r#"
            [drag]
            click_threshold = 8.0

            [ingest]
            disable_duplicate = true
            default_target = { rule = "path", path = ["exerciseList"] }

            [panels]
            open_mode = "accordion"
            "#,
        )
        .unwrap();
        assert_eq!(config.drag.click_threshold, 8.0);
        assert!(config.ingest.disable_duplicate);
        assert_eq!(config.ingest.batch_window_ms, 10);
        assert_eq!(
            config.ingest.default_target,
            DefaultTarget::Path(cpath!["exerciseList"])
        );
        assert_eq!(config.panels.open_mode, OpenMode::Accordion);
    }

    #[test]
    fn json_reject_rule() {
        let config =
            EditorConfig::from_json_str(r#"{"ingest": {"default_target": {"rule": "reject"}}}"#)
                .unwrap();
        assert_eq!(config.ingest.default_target, DefaultTarget::Reject);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            EditorConfig::from_toml_str("[drag\n"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            EditorConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            EditorConfig::from_toml_file("/nonexistent/fitform.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn validate_catches_bad_threshold() {
        let mut config = EditorConfig::default();
        config.drag.click_threshold = 0.0;
        assert!(config.validate().iter().any(|e| e.contains("click_threshold")));
        config.drag.click_threshold = f64::NAN;
        assert!(config.validate().iter().any(|e| e.contains("click_threshold")));
    }

    #[test]
    fn validate_catches_long_window_and_empty_path() {
        let mut config = EditorConfig::default();
        config.ingest.batch_window_ms = MAX_BATCH_WINDOW_MS + 1;
        config.ingest.default_target = DefaultTarget::Path(CollectionPath::root());
        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            config.validated(),
            Err(ConfigError::Invalid(e)) if e.len() == 2
        ));
    }
}
