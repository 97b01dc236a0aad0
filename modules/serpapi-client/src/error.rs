use thiserror::Error;

pub type Result<T> = std::result::Result<T, SerpApiError>;

#[derive(Debug, Error)]
pub enum SerpApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Search failed: {0}")]
    Search(String),
}

impl From<reqwest::Error> for SerpApiError {
    fn from(err: reqwest::Error) -> Self {
        SerpApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SerpApiError {
    fn from(err: serde_json::Error) -> Self {
        SerpApiError::Parse(err.to_string())
    }
}
