#![forbid(unsafe_code)]

//! Logging bootstrap.
//!
//! Every module logs through `tracing` with a `fitform.<module>` target. The
//! library never installs a subscriber on its own; binaries and test harnesses
//! call [`init_json_logging`] (feature `tracing-json`) or bring their own.

/// Log targets used across the workspace.
pub mod targets {
    pub const COLLECTION: &str = "fitform.collection";
    pub const EXPANSION: &str = "fitform.expansion";
    pub const INGEST: &str = "fitform.ingest";
    pub const DRAG: &str = "fitform.drag";
    pub const REPLACE: &str = "fitform.replace";
    pub const PANEL: &str = "fitform.panel";
    pub const SESSION: &str = "fitform.session";
}

/// Environment variable consulted for the filter directive.
pub const LOG_ENV: &str = "FITFORM_LOG";

/// Install a global JSON subscriber filtered by [`LOG_ENV`] (default `info`).
///
/// Returns an error if a global subscriber is already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
}
