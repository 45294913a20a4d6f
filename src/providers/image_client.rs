use crate::{
    config::ReplicateConfig,
    error::{ComicError, Result},
    models::{PredictionInput, PredictionJob, PredictionRequest, PredictionStatus, WaitOutcome},
    providers::traits::ImageBackend,
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::{Duration, Instant};

pub const STYLE_SUFFIX: &str = ", comic book style, detailed, vibrant colors";
pub const NEGATIVE_PROMPT: &str = "low quality, bad anatomy, worst quality, low resolution";
pub const NUM_OUTPUTS: u32 = 4;
pub const GUIDANCE_SCALE: f32 = 7.5;
pub const NUM_INFERENCE_STEPS: u32 = 50;

impl PredictionInput {
    /// The fixed generation settings applied to every panel prompt.
    pub fn for_prompt(prompt: &str) -> Self {
        PredictionInput {
            prompt: format!("{}{}", prompt, STYLE_SUFFIX),
            negative_prompt: NEGATIVE_PROMPT.to_string(),
            num_outputs: NUM_OUTPUTS,
            guidance_scale: GUIDANCE_SCALE,
            num_inference_steps: NUM_INFERENCE_STEPS,
        }
    }
}

/// Replicate predictions API.
#[derive(Clone)]
pub struct ReplicateImageClient {
    client: Client,
    base_url: String,
    api_token: String,
    model_version: String,
}

impl ReplicateImageClient {
    pub fn new(client: Client, config: &ReplicateConfig) -> Result<Self> {
        let api_token = config.api_token.clone().ok_or_else(|| {
            ComicError::ConfigError(
                "The REPLICATE_API_TOKEN environment variable is not set.".into(),
            )
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token,
            model_version: config.model_version.clone(),
        })
    }

    async fn read_job(&self, response: reqwest::Response, action: &str) -> Result<PredictionJob> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Replicate {} failed with {}: {}", action, status, error_text);
            return Err(ComicError::ProviderError(format!(
                "Replicate {} returned {}: {}",
                action, status, error_text
            )));
        }
        Ok(response.json().await?)
    }

    /// `{base}/predictions/{id}` with the id escaped as a single path segment.
    fn prediction_url(&self, id: &str) -> Result<Url> {
        if id.is_empty() || id.chars().all(|c| c == '.') {
            return Err(ComicError::ValidationError(format!(
                "Invalid prediction ID: {:?}",
                id
            )));
        }

        let mut url = Url::parse(&format!("{}/predictions", self.base_url)).map_err(|e| {
            ComicError::ConfigError(format!("Invalid Replicate base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ComicError::ConfigError(format!(
                    "Replicate base URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl ImageBackend for ReplicateImageClient {
    async fn create_prediction(&self, prompt: &str) -> Result<PredictionJob> {
        let payload = PredictionRequest {
            version: self.model_version.clone(),
            input: PredictionInput::for_prompt(prompt),
        };

        log::info!("Creating prediction with version: {}", self.model_version);

        let response = self
            .client
            .post(format!("{}/predictions", self.base_url))
            .header("Authorization", format!("Token {}", self.api_token))
            .json(&payload)
            .send()
            .await?;

        let job = self.read_job(response, "prediction create").await?;
        log::debug!("Prediction {} created ({})", job.id, job.status.as_str());
        Ok(job)
    }

    async fn get_prediction(&self, id: &str) -> Result<PredictionJob> {
        let url = self.prediction_url(id)?;
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Token {}", self.api_token))
            .send()
            .await?;

        self.read_job(response, "prediction get").await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl WaitOptions {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    /// The instant after which waiting gives up, counted from `start`.
    pub fn deadline_from(&self, start: Instant) -> Result<Instant> {
        if self.poll_interval.is_zero() {
            return Err(ComicError::ConfigError(
                "prediction poll interval must be greater than zero".into(),
            ));
        }
        start.checked_add(self.timeout).ok_or_else(|| {
            ComicError::ConfigError(format!(
                "prediction timeout of {}s is out of range",
                self.timeout.as_secs()
            ))
        })
    }
}

impl From<&ReplicateConfig> for WaitOptions {
    fn from(config: &ReplicateConfig) -> Self {
        WaitOptions::new(config.poll_interval, config.timeout)
    }
}

/// Polls `job` until it reaches a terminal status or `options.timeout` passes.
/// The sleep before each poll never overshoots the deadline.
pub async fn wait_for_completion(
    backend: &dyn ImageBackend,
    mut job: PredictionJob,
    options: &WaitOptions,
) -> Result<WaitOutcome> {
    let deadline = options.deadline_from(Instant::now())?;

    while !job.status.is_terminal() {
        let now = Instant::now();
        if now >= deadline {
            log::warn!(
                "Prediction {} still {} after {:?}",
                job.id,
                job.status.as_str(),
                options.timeout
            );
            return Ok(WaitOutcome::TimedOut(job));
        }

        tokio::time::sleep(options.poll_interval.min(deadline - now)).await;
        job = backend.get_prediction(&job.id).await?;
        log::trace!("Prediction {} is {}", job.id, job.status.as_str());
    }

    Ok(WaitOutcome::Finished(job))
}

/// Converts a finished wait into the job's output URLs.
pub fn into_output(outcome: WaitOutcome, timeout: Duration) -> Result<Vec<String>> {
    let job = match outcome {
        WaitOutcome::Finished(job) => job,
        WaitOutcome::TimedOut(job) => {
            return Err(ComicError::TimeoutError(format!(
                "prediction {} did not finish within {}s",
                job.id,
                timeout.as_secs()
            )))
        }
    };

    if let Some(error) = job.error {
        return Err(ComicError::ProviderError(error));
    }

    match job.status {
        PredictionStatus::Succeeded => Ok(job.output.unwrap_or_default()),
        other => Err(ComicError::ProviderError(format!(
            "prediction {} {}",
            job.id,
            other.as_str()
        ))),
    }
}
