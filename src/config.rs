use crate::error::{ComicError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://models.inference.ai.azure.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_REPLICATE_BASE_URL: &str = "https://api.replicate.com/v1";
pub const DEFAULT_MODEL_VERSION: &str =
    "8beff3369e81422112d93b89ca01426147de542cd4684c244b673b105188fe5f";
pub const DEFAULT_HISTORY_URL: &str = "https://sundai-backend-1095860743608.us-east4.run.app";
/// Upper bound on how long one prediction may be waited for.
pub const MAX_PREDICTION_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub model_version: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub base_url: String,
}

/// Shape of the comic script the chat model is asked for.
#[derive(Debug, Clone)]
pub struct StoryConfig {
    pub panel_count: usize,
    pub subject: String,
    pub persona: String,
    pub prompt_suffix: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: Option<u16>,
    pub http_timeout: Duration,
    pub openai: OpenAiConfig,
    pub replicate: ReplicateConfig,
    pub history: HistoryConfig,
    pub story: StoryConfig,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        OpenAiConfig {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }
}

impl OpenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        OpenAiConfig {
            api_key: non_empty_var("OPENAI_API_KEY"),
            base_url: non_empty_var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: non_empty_var("OPENAI_MODEL").unwrap_or(defaults.model),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        ReplicateConfig {
            api_token: None,
            base_url: DEFAULT_REPLICATE_BASE_URL.to_string(),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            poll_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(300),
        }
    }
}

impl ReplicateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let poll_interval = env::var("REPLICATE_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);
        let timeout = env::var("REPLICATE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        ReplicateConfig {
            api_token: non_empty_var("REPLICATE_API_TOKEN"),
            base_url: non_empty_var("REPLICATE_BASE_URL").unwrap_or(defaults.base_url),
            model_version: non_empty_var("REPLICATE_MODEL_VERSION")
                .unwrap_or(defaults.model_version),
            poll_interval,
            timeout,
        }
    }

    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_polling(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.timeout = timeout;
        self
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            base_url: DEFAULT_HISTORY_URL.to_string(),
        }
    }
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        HistoryConfig {
            base_url: non_empty_var("HISTORY_API_URL")
                .unwrap_or_else(|| DEFAULT_HISTORY_URL.to_string()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for StoryConfig {
    fn default() -> Self {
        StoryConfig {
            panel_count: 3,
            subject: "delts".to_string(),
            persona: "Andy".to_string(),
            prompt_suffix: "cartoonish style, warm colors".to_string(),
        }
    }
}

impl StoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        StoryConfig {
            panel_count: env::var("COMIC_PANEL_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|count| *count > 0)
                .unwrap_or(defaults.panel_count),
            subject: non_empty_var("COMIC_SUBJECT").unwrap_or(defaults.subject),
            persona: non_empty_var("COMIC_PERSONA").unwrap_or(defaults.persona),
            prompt_suffix: defaults.prompt_suffix,
        }
    }

    pub fn with_panel_count(mut self, panel_count: usize) -> Self {
        self.panel_count = panel_count;
        self
    }

    pub fn with_characters(mut self, subject: impl Into<String>, persona: impl Into<String>) -> Self {
        self.subject = subject.into();
        self.persona = persona.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: None,
            http_timeout: Duration::from_secs(120),
            openai: OpenAiConfig::default(),
            replicate: ReplicateConfig::default(),
            history: HistoryConfig::default(),
            story: StoryConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every section from the environment and checks that both
    /// provider credentials are present.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let http_timeout = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(120));

        let config = Config {
            host: non_empty_var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            http_timeout,
            openai: OpenAiConfig::from_env(),
            replicate: ReplicateConfig::from_env(),
            history: HistoryConfig::from_env(),
            story: StoryConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.replicate.api_token.is_none() {
            return Err(ComicError::ConfigError(
                "The REPLICATE_API_TOKEN environment variable is not set.".into(),
            ));
        }
        if self.openai.api_key.is_none() {
            return Err(ComicError::ConfigError(
                "The OPENAI_API_KEY environment variable is not set.".into(),
            ));
        }
        if self.replicate.poll_interval.is_zero() {
            return Err(ComicError::ConfigError(
                "REPLICATE_POLL_INTERVAL_MS must be greater than zero".into(),
            ));
        }
        if self.replicate.timeout.is_zero() || self.replicate.timeout > MAX_PREDICTION_TIMEOUT {
            return Err(ComicError::ConfigError(format!(
                "REPLICATE_TIMEOUT_SECS must be between 1 and {}",
                MAX_PREDICTION_TIMEOUT.as_secs()
            )));
        }
        if self.story.panel_count == 0 {
            return Err(ComicError::ConfigError(
                "Panel count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(8080)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_openai(mut self, config: OpenAiConfig) -> Self {
        self.openai = config;
        self
    }

    pub fn with_replicate(mut self, config: ReplicateConfig) -> Self {
        self.replicate = config;
        self
    }

    pub fn with_history(mut self, config: HistoryConfig) -> Self {
        self.history = config;
        self
    }

    pub fn with_story(mut self, config: StoryConfig) -> Self {
        self.story = config;
        self
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Keeps the first four characters of a secret for log output.
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}…", visible)
}
