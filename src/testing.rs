//! In-memory stand-ins for the upstream services, shared by unit tests.

use crate::{
    config::{Config, OpenAiConfig, ReplicateConfig},
    error::{ComicError, Result},
    models::{GenerationRecord, PredictionJob, PredictionStatus},
    providers::{ComicClient, ImageBackend, StoryBackend},
    storage::HistoryStore,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(feature = "server")]
pub mod stub;

pub struct FakeStoryBackend {
    reply: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeStoryBackend {
    pub fn replying(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(String::from),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A well-formed script with `panels` entries.
    pub fn script(panels: usize) -> String {
        let comics: Vec<_> = (0..panels)
            .map(|i| {
                json!({
                    "prompt": format!("delts panel {}, cartoonish style, warm colors", i),
                    "caption": format!("Andy, scene {}", i),
                })
            })
            .collect();
        json!({ "comics": comics }).to_string()
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoryBackend for FakeStoryBackend {
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        Ok(self.reply.clone())
    }
}

struct FakeJob {
    prompt: String,
    polls: usize,
}

/// Jobs start as `starting` and succeed after `polls_before_done` status
/// checks with four deterministic URLs each.
pub struct FakeImageBackend {
    jobs: Mutex<HashMap<String, FakeJob>>,
    next_id: AtomicUsize,
    get_calls: AtomicUsize,
    polls_before_done: usize,
    failures: Vec<(String, String)>,
    delays: Vec<(String, Duration)>,
}

impl FakeImageBackend {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            polls_before_done: 0,
            failures: Vec::new(),
            delays: Vec::new(),
        }
    }

    pub fn with_polls_before_done(mut self, polls: usize) -> Self {
        self.polls_before_done = polls;
        self
    }

    /// Jobs whose prompt contains `fragment` fail with `error`.
    pub fn failing_on(mut self, fragment: &str, error: &str) -> Self {
        self.failures.push((fragment.to_string(), error.to_string()));
        self
    }

    /// Job creation for prompts containing `fragment` takes `delay`.
    pub fn delaying(mut self, fragment: &str, delay: Duration) -> Self {
        self.delays.push((fragment.to_string(), delay));
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.next_id.load(Ordering::SeqCst)
    }

    pub fn output_for(id: &str) -> Vec<String> {
        (0..4)
            .map(|i| format!("https://replicate.delivery/{}/out-{}.png", id, i))
            .collect()
    }

    fn failure_for(&self, prompt: &str) -> Option<&str> {
        self.failures
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, error)| error.as_str())
    }
}

#[async_trait]
impl ImageBackend for FakeImageBackend {
    async fn create_prediction(&self, prompt: &str) -> Result<PredictionJob> {
        if let Some((_, delay)) = self
            .delays
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
        {
            tokio::time::sleep(*delay).await;
        }

        let id = format!("pred-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.jobs.lock().unwrap().insert(
            id.clone(),
            FakeJob {
                prompt: prompt.to_string(),
                polls: 0,
            },
        );
        Ok(PredictionJob::new(id, PredictionStatus::Starting))
    }

    async fn get_prediction(&self, id: &str) -> Result<PredictionJob> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| ComicError::ProviderError(format!("prediction {} not found", id)))?;
        job.polls = job.polls.saturating_add(1);

        if let Some(error) = self.failure_for(&job.prompt) {
            return Ok(PredictionJob::new(id, PredictionStatus::Failed).with_error(error));
        }
        if job.polls >= self.polls_before_done {
            Ok(PredictionJob::new(id, PredictionStatus::Succeeded).with_output(Self::output_for(id)))
        } else {
            Ok(PredictionJob::new(id, PredictionStatus::Processing))
        }
    }
}

pub struct FakeHistoryStore {
    records: Mutex<Vec<GenerationRecord>>,
    failing_urls: Vec<String>,
    unavailable: bool,
}

impl FakeHistoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failing_urls: Vec::new(),
            unavailable: false,
        }
    }

    pub fn with_records(records: Vec<GenerationRecord>) -> Self {
        let store = Self::new();
        *store.records.lock().unwrap() = records;
        store
    }

    pub fn failing_on(mut self, urls: &[&str]) -> Self {
        self.failing_urls = urls.iter().map(|u| u.to_string()).collect();
        self
    }

    /// Every call fails as if the store answered with a 503.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn records(&self) -> Vec<GenerationRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryStore for FakeHistoryStore {
    async fn append(&self, record: GenerationRecord) -> Result<()> {
        if self.unavailable || self.failing_urls.contains(&record.image_url) {
            return Err(ComicError::ProviderError(
                "history store returned 503 Service Unavailable".into(),
            ));
        }
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<GenerationRecord>> {
        if self.unavailable {
            return Err(ComicError::ProviderError(
                "Failed to fetch history: 503 Service Unavailable".into(),
            ));
        }
        Ok(self.records())
    }
}

pub fn test_config() -> Config {
    Config::new()
        .with_openai(OpenAiConfig::new().with_api_key("sk-test"))
        .with_replicate(
            ReplicateConfig::new()
                .with_api_token("r8_test")
                .with_polling(Duration::from_millis(2), Duration::from_secs(2)),
        )
}

pub fn test_client(
    story: FakeStoryBackend,
    images: FakeImageBackend,
    history: Arc<FakeHistoryStore>,
) -> ComicClient {
    ComicClient::with_backends(Arc::new(story), Arc::new(images), history, &test_config())
}
