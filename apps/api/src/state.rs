use std::sync::Arc;

use crate::config::Config;
use crate::extract::TextExtractor;
use crate::layout::GlyphMeasurer;
use crate::render::Renderer;
use crate::tagging::PosTagger;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Collaborators are trait objects so tests can swap in fixed implementations.
/// Nothing here is mutated by a layout run; each run builds its own grid.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub extractor: Arc<dyn TextExtractor>,
    /// Loaded once at startup (dictionary load is expensive).
    pub tagger: Arc<dyn PosTagger>,
    /// Must measure with the same font the renderer draws with.
    pub measurer: Arc<dyn GlyphMeasurer>,
    pub renderer: Arc<dyn Renderer>,
}
