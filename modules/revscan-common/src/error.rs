use thiserror::Error;

#[derive(Error, Debug)]
pub enum RevscanError {
    #[error("Invalid Amazon URL or ASIN: {0}")]
    InvalidIdentifier(String),

    #[error("Review source unavailable for {domain}: {message}")]
    SourceUnavailable { domain: String, message: String },

    #[error("Failed to persist analysis results: {0}")]
    Persistence(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl RevscanError {
    /// Whether this error was caused by the caller's input rather than by
    /// the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RevscanError::InvalidIdentifier(_))
    }
}
