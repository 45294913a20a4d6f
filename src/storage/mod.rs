pub mod remote;
pub mod traits;

use crate::models::{BatchReport, GenerationRecord};
use futures::future::join_all;
use std::sync::Arc;

pub use remote::RemoteHistoryStore;
pub use traits::HistoryStore;

/// Best-effort, at-most-once writer of generation history. A batch is written
/// concurrently with no ordering or atomicity; failures are logged, never
/// retried and never returned.
#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn HistoryStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    pub async fn record_batch(&self, prompt: &str, image_urls: &[String]) -> BatchReport {
        let writes = image_urls.iter().map(|url| {
            let record = GenerationRecord::new(prompt, url.as_str());
            async move {
                let result = self.store.append(record).await;
                if let Err(e) = &result {
                    log::error!("Failed to record generation {}: {}", url, e);
                }
                result
            }
        });

        let mut report = BatchReport::default();
        for result in join_all(writes).await {
            match result {
                Ok(()) => report.written += 1,
                Err(_) => report.failed += 1,
            }
        }

        if report.failed > 0 {
            log::warn!(
                "History batch partially written: {}/{} records",
                report.written,
                report.total()
            );
        } else {
            log::debug!("History batch written: {} records", report.written);
        }
        report
    }

    /// Writes the batch on a detached task so the caller never waits on it.
    pub fn spawn_batch(&self, prompt: String, image_urls: Vec<String>) -> tokio::task::JoinHandle<BatchReport> {
        let recorder = self.clone();
        tokio::spawn(async move { recorder.record_batch(&prompt, &image_urls).await })
    }
}
