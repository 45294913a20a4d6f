use crate::{error::Result, models::GenerationRecord};
use async_trait::async_trait;

/// The remote generations store. Append-only from this crate's side.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: GenerationRecord) -> Result<()>;

    async fn list(&self) -> Result<Vec<GenerationRecord>>;
}
