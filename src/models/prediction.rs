use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle state of a prediction. Statuses this crate does not know are kept
/// verbatim in `Other` so they survive a status check unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl PredictionStatus {
    /// Only `starting` and `processing` are worth polling again. An unknown
    /// status ends the wait and is reported as a provider failure.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            PredictionStatus::Starting | PredictionStatus::Processing
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for PredictionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "starting" => PredictionStatus::Starting,
            "processing" => PredictionStatus::Processing,
            "succeeded" => PredictionStatus::Succeeded,
            "failed" => PredictionStatus::Failed,
            "canceled" => PredictionStatus::Canceled,
            _ => PredictionStatus::Other(raw),
        }
    }
}

impl From<PredictionStatus> for String {
    fn from(status: PredictionStatus) -> Self {
        match status {
            PredictionStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// One image prediction as reported by the provider. Fields this crate does not
/// interpret are kept in `extra` so status checks can pass them through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionJob {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PredictionJob {
    pub fn new(id: impl Into<String>, status: PredictionStatus) -> Self {
        Self {
            id: id.into(),
            status,
            output: None,
            error: None,
            extra: Map::new(),
        }
    }

    pub fn with_output(mut self, output: Vec<String>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: PredictionInput,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionInput {
    pub prompt: String,
    pub negative_prompt: String,
    pub num_outputs: u32,
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
}

/// Result of waiting on a prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Finished(PredictionJob),
    /// The deadline passed first; holds the last state observed.
    TimedOut(PredictionJob),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageResponse {
    pub output: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub id: Option<String>,
}
