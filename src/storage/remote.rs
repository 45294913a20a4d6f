use crate::{
    config::HistoryConfig,
    error::{ComicError, Result},
    models::GenerationRecord,
    storage::traits::HistoryStore,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// `POST /generations` appends, `GET /generations` lists everything.
pub struct RemoteHistoryStore {
    client: Client,
    base_url: String,
}

impl RemoteHistoryStore {
    pub fn new(client: Client, config: &HistoryConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn generations_url(&self) -> String {
        format!("{}/generations", self.base_url)
    }
}

#[async_trait]
impl HistoryStore for RemoteHistoryStore {
    async fn append(&self, record: GenerationRecord) -> Result<()> {
        let payload = json!({
            "prompt": record.prompt,
            "image_url": record.image_url,
        });

        let response = self
            .client
            .post(self.generations_url())
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Err(ComicError::ProviderError(format!(
                "history store returned {}: {}",
                status, error_text
            )))
        }
    }

    async fn list(&self) -> Result<Vec<GenerationRecord>> {
        let response = self.client.get(self.generations_url()).send().await?;

        if !response.status().is_success() {
            return Err(ComicError::ProviderError(format!(
                "Failed to fetch history: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
