pub mod comic;
pub mod common;
pub mod history;
pub mod prediction;
pub mod story;

pub use comic::*;
pub use common::*;
pub use history::*;
pub use prediction::*;
pub use story::*;
