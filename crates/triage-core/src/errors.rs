use std::fmt;

/// Configuration loading/validation failure.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Failure of the external classification strategy. The resolver matches
/// on this instead of letting it propagate; every variant triggers the
/// same fallback to the rule engine.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unparseable response: {0}")]
    UnparseableResponse(String),
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}
