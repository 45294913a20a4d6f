use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComicError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Timeout error: {0}")]
    TimeoutError(String),
}

impl ComicError {
    /// The bare message without the category prefix, as passed back to callers
    /// in `detail` bodies.
    pub fn detail(&self) -> &str {
        match self {
            ComicError::ConfigError(msg)
            | ComicError::ValidationError(msg)
            | ComicError::ProviderError(msg)
            | ComicError::ParseError(msg)
            | ComicError::NetworkError(msg)
            | ComicError::TimeoutError(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for ComicError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ComicError::TimeoutError(e.to_string())
        } else if e.is_decode() {
            ComicError::ParseError(e.to_string())
        } else {
            ComicError::NetworkError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ComicError {
    fn from(e: serde_json::Error) -> Self {
        ComicError::ParseError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ComicError>;
