use serde::{Deserialize, Serialize};

/// `{ "error": ... }` body returned by the story, comic and history routes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// `{ "detail": ... }` body carrying an upstream error through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailBody {
    pub detail: String,
}

impl DetailBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Display state for anything that is fetched once and then shown.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum ViewState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> ViewState<T> {
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => ViewState::Ready(value),
            Err(e) => ViewState::Failed(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }
}
