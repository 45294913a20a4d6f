use crate::{
    config::{OpenAiConfig, StoryConfig},
    error::{ComicError, Result},
    models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat, StoryResponse},
    providers::traits::StoryBackend,
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Talks to an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiStoryClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiStoryClient {
    pub fn new(client: Client, config: &OpenAiConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ComicError::ConfigError("The OPENAI_API_KEY environment variable is not set.".into())
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl StoryBackend for OpenAiStoryClient {
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Option<String>> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            response_format: ResponseFormat::json_object(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        log::info!("Requesting comic script from model: {}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Chat completion failed with {}: {}", status, error_text);
            return Err(ComicError::ProviderError(format!(
                "chat completion returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        Ok(completion.into_content())
    }
}

/// Turns a story idea into a fixed-shape comic script.
#[derive(Clone)]
pub struct StoryGenerator {
    backend: Arc<dyn StoryBackend>,
    config: StoryConfig,
}

impl StoryGenerator {
    pub fn new(backend: Arc<dyn StoryBackend>, config: StoryConfig) -> Self {
        Self { backend, config }
    }

    pub fn system_prompt(&self) -> String {
        let config = &self.config;
        format!(
            "Create a {count}-panel comic story about {subject}' adventure. For each panel, provide:\n\
             1. An image generation prompt that includes '{subject}' and ends with '{suffix}'\n\
             2. A caption that refers to the person as '{persona}'\n\
             \n\
             Format the output as JSON with this structure:\n\
             {{\n  \"comics\": [\n    {{\n      \"prompt\": \"Image generation prompt here\",\n      \"caption\": \"Caption text here\"\n    }}\n  ]\n}}\n\
             Return exactly {count} entries in \"comics\".",
            count = config.panel_count,
            subject = config.subject,
            suffix = config.prompt_suffix,
            persona = config.persona,
        )
    }

    /// One completion call, no retry. Empty or malformed replies and replies
    /// with the wrong number of panels are `ParseError`s.
    pub async fn generate(&self, prompt: &str) -> Result<StoryResponse> {
        let content = self
            .backend
            .complete_json(&self.system_prompt(), prompt)
            .await?
            .ok_or_else(|| ComicError::ParseError("No content in model response".into()))?;

        let story: StoryResponse = serde_json::from_str(&content).map_err(|e| {
            log::debug!("Unparseable story content: {}", content);
            ComicError::ParseError(format!("model response is not a comic script: {}", e))
        })?;

        if story.comics.len() != self.config.panel_count {
            return Err(ComicError::ParseError(format!(
                "expected {} panels, model returned {}",
                self.config.panel_count,
                story.comics.len()
            )));
        }

        log::debug!("Story generated with {} panels", story.comics.len());
        Ok(story)
    }
}
