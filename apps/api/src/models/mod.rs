// Data model shared by the engine, the template library, and the handlers.

pub mod blocks;
pub mod slides;
