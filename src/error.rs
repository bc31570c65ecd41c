use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("failed to serialize page snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

/// Failures reported by a notification platform.
///
/// The widget never surfaces these to its callers: they are logged and the
/// message falls back to the on-page path.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{0} not supported by this platform")]
    Unsupported(&'static str),
    #[error("delivery worker registration failed: {0}")]
    WorkerRegistration(String),
    #[error("notification backend failed: {0}")]
    Backend(String),
}

impl Error {
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
