//! Comic generation service.
//!
//! A story idea goes to an OpenAI-compatible chat model, which writes a short
//! comic script. Each panel prompt is rendered through Replicate, and the
//! results are paired back with the captions. Generated images are written to
//! a remote history store on a best-effort basis.

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use config::{Config, HistoryConfig, OpenAiConfig, ReplicateConfig, StoryConfig};
pub use error::{ComicError, Result};
pub use models::{
    ComicPanel, ComicStrip, GalleryItem, GenerationRecord, PredictionJob, PredictionStatus,
    StoryRequest, StoryResponse, ViewState, WaitOutcome,
};
pub use pipeline::ComicPipeline;
pub use providers::{
    ComicClient, ImageBackend, OpenAiStoryClient, ReplicateImageClient, StoryBackend,
    StoryGenerator, WaitOptions,
};
pub use storage::{HistoryRecorder, HistoryStore, RemoteHistoryStore};
pub use viewer::HistoryViewer;
