use std::sync::Arc;

use crate::config::Config;
use crate::images::synthesizer::ImageGenerator;
use crate::layout::TextMeasurer;
use crate::templates::TemplateLibrary;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub templates: Arc<TemplateLibrary>,
    /// Pluggable text measurer. Default: the static character-width table.
    pub measurer: Arc<dyn TextMeasurer>,
    /// Image-generation capability; a disabled stand-in when unconfigured.
    pub image_generator: Arc<dyn ImageGenerator>,
}
