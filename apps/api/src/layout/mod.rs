// Text layout: measurement capability, font fitting, and markup binding.
// All synchronous and blocking-free — the only async in the engine lives in
// the image synthesizer.

pub mod binder;
pub mod fitter;
pub mod measure;

// Re-export the public API consumed by the engine modules.
pub use binder::{bind_text, extract_font_info, BindRequest};
pub use fitter::{fitted_font_size, FitRequest, MIN_FONT_SIZE};
pub use measure::{CharTableMeasurer, TextMeasurer};
