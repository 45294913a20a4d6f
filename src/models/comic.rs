use super::story::StoryResponse;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderedPanel {
    pub prompt: String,
    pub caption: String,
    pub image_url: Option<String>,
}

/// Panels of one story paired with the flattened images of every panel job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComicStrip {
    pub panels: Vec<RenderedPanel>,
    pub images: Vec<String>,
}

impl ComicStrip {
    /// Pairs `story.comics[i]` with `images[i]`. Images past the panel count are
    /// kept in `images` but not shown.
    pub fn assemble(story: StoryResponse, images: Vec<String>) -> Self {
        let panels = story
            .comics
            .into_iter()
            .enumerate()
            .map(|(index, panel)| RenderedPanel {
                prompt: panel.prompt,
                caption: panel.caption,
                image_url: images.get(index).cloned(),
            })
            .collect();

        ComicStrip { panels, images }
    }

    pub fn is_complete(&self) -> bool {
        self.panels.iter().all(|panel| panel.image_url.is_some())
    }
}
