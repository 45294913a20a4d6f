use crate::{
    models::{GalleryItem, ViewState},
    storage::HistoryStore,
};
use std::sync::Arc;

/// Gallery of earlier generations. Reads the whole store once per activation;
/// there is no paging, filtering or caching.
pub struct HistoryViewer {
    store: Arc<dyn HistoryStore>,
    state: ViewState<Vec<GalleryItem>>,
}

impl HistoryViewer {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            store,
            state: ViewState::Loading,
        }
    }

    pub fn state(&self) -> &ViewState<Vec<GalleryItem>> {
        &self.state
    }

    pub async fn activate(&mut self) -> &ViewState<Vec<GalleryItem>> {
        self.state = match self.store.list().await {
            Ok(records) => {
                log::debug!("Loaded {} history records", records.len());
                ViewState::Ready(records.into_iter().map(GalleryItem::from).collect())
            }
            Err(e) => {
                log::error!("Failed to load history: {}", e);
                ViewState::Failed(e.to_string())
            }
        };
        &self.state
    }

    pub fn into_state(self) -> ViewState<Vec<GalleryItem>> {
        self.state
    }
}
