//! Latest-wins syntax highlighting
//!
//! - [`EditGeneration`] / [`GenerationTicket`]: per-surface submission counter
//! - [`HighlightPipeline`]: per-surface driver that computes and applies spans

mod generation;
mod pipeline;

pub use generation::{EditGeneration, GenerationTicket};
pub use pipeline::{HIGHLIGHTING, HighlightError, HighlightHandle, HighlightPipeline};
