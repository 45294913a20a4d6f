pub mod image_client;
pub mod story_client;
pub mod traits;

use crate::{
    config::Config,
    error::Result,
    models::{PredictionJob, StoryResponse},
    storage::{HistoryRecorder, HistoryStore, RemoteHistoryStore},
};
use reqwest::Client;
use std::sync::Arc;

pub use image_client::{wait_for_completion, ReplicateImageClient, WaitOptions};
pub use story_client::{OpenAiStoryClient, StoryGenerator};
pub use traits::{ImageBackend, StoryBackend};

/// Every upstream collaborator, built once at startup and shared by handlers
/// and the pipeline.
#[derive(Clone)]
pub struct ComicClient {
    story: StoryGenerator,
    images: Arc<dyn ImageBackend>,
    recorder: HistoryRecorder,
    wait: WaitOptions,
}

impl ComicClient {
    /// Builds the reqwest-backed clients. Fails with `ConfigError` when a
    /// credential is missing, before any request is sent.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let http = Client::builder().timeout(config.http_timeout).build()?;

        let story_backend = OpenAiStoryClient::new(http.clone(), &config.openai)?;
        let image_backend = ReplicateImageClient::new(http.clone(), &config.replicate)?;
        let history_store = RemoteHistoryStore::new(http, &config.history);

        log::info!("Upstream clients initialized");

        Ok(Self::with_backends(
            Arc::new(story_backend),
            Arc::new(image_backend),
            Arc::new(history_store),
            config,
        ))
    }

    pub fn with_backends(
        story: Arc<dyn StoryBackend>,
        images: Arc<dyn ImageBackend>,
        history: Arc<dyn HistoryStore>,
        config: &Config,
    ) -> Self {
        Self {
            story: StoryGenerator::new(story, config.story.clone()),
            images,
            recorder: HistoryRecorder::new(history),
            wait: WaitOptions::from(&config.replicate),
        }
    }

    pub fn story(&self) -> &StoryGenerator {
        &self.story
    }

    pub fn images(&self) -> &Arc<dyn ImageBackend> {
        &self.images
    }

    pub fn recorder(&self) -> &HistoryRecorder {
        &self.recorder
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        self.recorder.store()
    }

    pub async fn generate_story(&self, prompt: &str) -> Result<StoryResponse> {
        self.story.generate(prompt).await
    }

    /// Submits one prediction, waits for it and returns its output URLs. A
    /// successful batch is handed to the history recorder without waiting.
    pub async fn generate_images(&self, prompt: &str) -> Result<Vec<String>> {
        let job = self.images.create_prediction(prompt).await?;
        let outcome = wait_for_completion(self.images.as_ref(), job, &self.wait).await?;
        let output = image_client::into_output(outcome, self.wait.timeout)?;

        log::info!("Prediction produced {} images", output.len());
        self.recorder.spawn_batch(prompt.to_string(), output.clone());

        Ok(output)
    }

    /// Current state of a prediction, without waiting.
    pub async fn prediction_status(&self, id: &str) -> Result<PredictionJob> {
        self.images.get_prediction(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{OpenAiConfig, ReplicateConfig},
        error::ComicError,
        models::PredictionStatus,
        testing::{test_client, FakeHistoryStore, FakeImageBackend, FakeStoryBackend},
    };
    use std::time::Duration;

    #[test]
    fn test_missing_credentials_fail_before_network() {
        let config = Config::new().with_openai(OpenAiConfig::new().with_api_key("sk-test"));
        let err = ComicClient::from_config(&config).err().unwrap();
        assert!(matches!(err, ComicError::ConfigError(_)));
    }

    #[test]
    fn test_builds_with_credentials() {
        let config = Config::new()
            .with_openai(OpenAiConfig::new().with_api_key("sk-test"))
            .with_replicate(ReplicateConfig::new().with_api_token("r8_test"));
        assert!(ComicClient::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_generate_images_records_history() {
        let history = Arc::new(FakeHistoryStore::new());
        let client = test_client(
            FakeStoryBackend::replying(None),
            FakeImageBackend::new().with_polls_before_done(1),
            history.clone(),
        );

        let output = client.generate_images("delts paints").await.unwrap();
        assert_eq!(output.len(), 4);

        // recording runs detached; give it a moment to land
        for _ in 0..50 {
            if history.records().len() == 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(history.records().len(), 4);
        assert!(history.records().iter().all(|r| r.prompt == "delts paints"));
    }

    #[tokio::test]
    async fn test_failed_prediction_is_not_recorded() {
        let history = Arc::new(FakeHistoryStore::new());
        let client = test_client(
            FakeStoryBackend::replying(None),
            FakeImageBackend::new().failing_on("cursed", "NSFW content detected"),
            history.clone(),
        );

        let err = client.generate_images("cursed panel").await.unwrap_err();
        assert_eq!(err.detail(), "NSFW content detected");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(history.records().is_empty());
    }

    #[tokio::test]
    async fn test_status_check_is_repeatable() {
        let backend = FakeImageBackend::new();
        let client = test_client(
            FakeStoryBackend::replying(None),
            backend,
            Arc::new(FakeHistoryStore::new()),
        );
        let job = client.images().create_prediction("delts").await.unwrap();

        let first = client.prediction_status(&job.id).await.unwrap();
        let second = client.prediction_status(&job.id).await.unwrap();
        assert_eq!(first.status, PredictionStatus::Succeeded);
        assert_eq!(first, second);
    }
}
