//! The synthesis engine: block normalization, template selection, and the
//! assembly pipeline that binds content into slides.

pub mod assembler;
pub mod handlers;
pub mod normalizer;
pub mod selector;

pub use assembler::{assemble, synthesize, AssembleInput, AssembleOutput, AssemblerContext};
