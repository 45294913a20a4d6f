use crate::{
    error::{ComicError, Result},
    logger,
    models::{ComicStrip, ViewState},
    providers::ComicClient,
};
use futures::future::try_join_all;
use std::sync::Arc;

/// Story → per-panel images → paired strip.
///
/// Image jobs for all panels run concurrently and are joined all-or-nothing:
/// the first failure fails the whole strip and nothing partial is returned.
/// Jobs already submitted keep running upstream.
#[derive(Clone)]
pub struct ComicPipeline {
    client: Arc<ComicClient>,
}

impl ComicPipeline {
    pub fn new(client: Arc<ComicClient>) -> Self {
        Self { client }
    }

    pub async fn run(&self, prompt: &str) -> Result<ComicStrip> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ComicError::ValidationError(
                "Prompt must not be empty".into(),
            ));
        }

        let _timer = logger::timer("comic pipeline");

        let story = self.client.generate_story(prompt).await?;
        log::info!("Story ready, rendering {} panels", story.comics.len());

        let batches = try_join_all(
            story
                .comics
                .iter()
                .map(|panel| self.client.generate_images(&panel.prompt)),
        )
        .await?;

        let images: Vec<String> = batches.into_iter().flatten().collect();
        Ok(ComicStrip::assemble(story, images))
    }

    /// Same as [`run`](Self::run), folded into the state a page would show.
    pub async fn run_to_view(&self, prompt: &str) -> ViewState<ComicStrip> {
        let state = ViewState::from_result(self.run(prompt).await);
        if let Some(message) = state.error() {
            log::error!("Comic generation failed: {}", message);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_client, FakeHistoryStore, FakeImageBackend, FakeStoryBackend};
    use std::time::Duration;

    fn pipeline(images: FakeImageBackend) -> ComicPipeline {
        ComicPipeline::new(Arc::new(test_client(
            FakeStoryBackend::replying(Some(&FakeStoryBackend::script(3))),
            images,
            Arc::new(FakeHistoryStore::new()),
        )))
    }

    #[tokio::test]
    async fn test_three_panels_twelve_images() {
        let strip = pipeline(FakeImageBackend::new())
            .run("a robot learns to paint")
            .await
            .unwrap();

        assert_eq!(strip.panels.len(), 3);
        assert_eq!(strip.images.len(), 12);
        for (i, panel) in strip.panels.iter().enumerate() {
            assert_eq!(panel.caption, format!("Andy, scene {}", i));
            assert_eq!(panel.image_url.as_ref(), Some(&strip.images[i]));
        }
    }

    #[tokio::test]
    async fn test_panel_order_survives_uneven_latency() {
        // panel 0 is the slowest to submit, so it gets the last prediction id
        let images = FakeImageBackend::new().delaying("panel 0", Duration::from_millis(40));
        let strip = pipeline(images).run("a robot learns to paint").await.unwrap();

        assert_eq!(strip.images.len(), 12);
        assert_eq!(&strip.images[..4], FakeImageBackend::output_for("pred-2").as_slice());
        assert_eq!(&strip.images[4..8], FakeImageBackend::output_for("pred-0").as_slice());
        assert_eq!(&strip.images[8..], FakeImageBackend::output_for("pred-1").as_slice());
    }

    #[tokio::test]
    async fn test_one_failed_panel_fails_the_strip() {
        let images = FakeImageBackend::new().failing_on("panel 1", "NSFW content detected");
        let err = pipeline(images).run("a robot learns to paint").await.unwrap_err();
        assert!(matches!(err, ComicError::ProviderError(_)));
    }

    #[tokio::test]
    async fn test_failure_view_has_no_panels() {
        let images = FakeImageBackend::new().failing_on("panel 2", "NSFW content detected");
        let view = pipeline(images).run_to_view("a robot learns to paint").await;
        assert!(view.ready().is_none());
        assert_eq!(view.error(), Some("Provider error: NSFW content detected"));
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_before_any_call() {
        let story = Arc::new(FakeStoryBackend::replying(Some(&FakeStoryBackend::script(3))));
        let client = crate::providers::ComicClient::with_backends(
            story.clone(),
            Arc::new(FakeImageBackend::new()),
            Arc::new(FakeHistoryStore::new()),
            &crate::testing::test_config(),
        );
        let err = ComicPipeline::new(Arc::new(client)).run("   ").await.unwrap_err();

        assert!(matches!(err, ComicError::ValidationError(_)));
        assert!(story.calls().is_empty());
    }

    #[tokio::test]
    async fn test_story_failure_stops_before_images() {
        let images = Arc::new(FakeImageBackend::new());
        let client = crate::providers::ComicClient::with_backends(
            Arc::new(FakeStoryBackend::replying(Some("not json"))),
            images.clone(),
            Arc::new(FakeHistoryStore::new()),
            &crate::testing::test_config(),
        );
        let err = ComicPipeline::new(Arc::new(client))
            .run("a robot learns to paint")
            .await
            .unwrap_err();

        assert!(matches!(err, ComicError::ParseError(_)));
        assert_eq!(images.created(), 0);
    }
}
