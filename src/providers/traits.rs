use crate::{error::Result, models::PredictionJob};
use async_trait::async_trait;

/// A chat-completion endpoint that answers in JSON mode.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Returns the raw text of the first choice, or `None` when the model
    /// produced no content.
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str)
        -> Result<Option<String>>;
}

/// An asynchronous image-prediction endpoint.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn create_prediction(&self, prompt: &str) -> Result<PredictionJob>;

    async fn get_prediction(&self, id: &str) -> Result<PredictionJob>;
}
