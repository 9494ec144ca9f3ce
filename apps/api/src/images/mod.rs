pub mod allocator;
pub mod synthesizer;

pub use allocator::{crop_to_cover, fill_image_slot, ImagePool};
pub use synthesizer::{
    schedule, DisabledImageGenerator, GeneratedImage, HttpImageGenerator, ImageGenerator,
    PendingImage, PLACEHOLDER_SRC,
};
