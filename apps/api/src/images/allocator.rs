//! Image allocation — assigns pooled images to image slots.
//!
//! The pool is a single mutable resource threaded through one synthesis
//! pass: a chosen item is removed so no two slots share it while the pool
//! remains non-empty. An empty pool is not an error — the slot is returned
//! unchanged.

use rand::Rng;

use crate::models::blocks::ImagePoolItem;
use crate::models::slides::{CropRange, ImageClip, TemplateSlot, DEFAULT_CLIP_SHAPE};

// ────────────────────────────────────────────────────────────────────────────
// Aspect classification
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aspect {
    Square,
    Wide,
    Tall,
}

fn classify(width: f64, height: f64) -> Aspect {
    if (width - height).abs() < 1e-9 {
        Aspect::Square
    } else if width > height {
        Aspect::Wide
    } else {
        Aspect::Tall
    }
}

/// Pool-side compatibility with a slot aspect class. Tall slots also accept
/// square images; wide and square slots match strictly.
fn matches_aspect(item: &ImagePoolItem, aspect: Aspect) -> bool {
    match aspect {
        Aspect::Square => classify(item.width, item.height) == Aspect::Square,
        Aspect::Wide => item.width > item.height,
        Aspect::Tall => item.width <= item.height,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// The pool
// ────────────────────────────────────────────────────────────────────────────

/// The consumable image pool for one synthesis pass.
#[derive(Debug, Clone, Default)]
pub struct ImagePool {
    items: Vec<ImagePoolItem>,
}

impl ImagePool {
    pub fn new(items: Vec<ImagePoolItem>) -> Self {
        ImagePool { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Picks a pool image for the slot: aspect-matching subset when one
    /// exists, the whole pool otherwise; uniform random among candidates.
    /// The chosen item is removed from the pool.
    pub fn take_for(&mut self, slot: &TemplateSlot, rng: &mut impl Rng) -> Option<ImagePoolItem> {
        if self.items.is_empty() {
            return None;
        }
        let aspect = classify(slot.width, slot.height);
        let candidates: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| matches_aspect(item, aspect))
            .map(|(i, _)| i)
            .collect();

        let index = if candidates.is_empty() {
            rng.random_range(0..self.items.len())
        } else {
            candidates[rng.random_range(0..candidates.len())]
        };
        Some(self.items.remove(index))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Crop computation
// ────────────────────────────────────────────────────────────────────────────

/// Computes the crop rectangle (percentage space) that makes the image cover
/// the slot box without distortion: symmetric horizontal margins when the
/// image is relatively wider than the slot, symmetric vertical margins when
/// relatively taller.
pub fn crop_to_cover(slot: &TemplateSlot, image: &ImagePoolItem) -> CropRange {
    let slot_ratio = slot.width / slot.height;
    if image.width / image.height >= slot_ratio {
        let scale = image.height / slot.height;
        let scaled_width = image.width / scale;
        let diff = (scaled_width - slot.width) / 2.0 / scaled_width * 100.0;
        [[diff, 0.0], [100.0 - diff, 100.0]]
    } else {
        let scale = image.width / slot.width;
        let scaled_height = image.height / scale;
        let diff = (scaled_height - slot.height) / 2.0 / scaled_height * 100.0;
        [[0.0, diff], [100.0, 100.0 - diff]]
    }
}

/// Binds a pool image to an image slot, or returns the slot unchanged when
/// the pool is empty. The crop shape is carried over from the slot's
/// pre-existing clip, defaulting to a plain rectangle.
pub fn fill_image_slot(
    slot: &TemplateSlot,
    pool: &mut ImagePool,
    rng: &mut impl Rng,
) -> TemplateSlot {
    let Some(image) = pool.take_for(slot, rng) else {
        return slot.clone();
    };

    let range = crop_to_cover(slot, &image);
    let shape = slot
        .clip
        .as_ref()
        .map(|c| c.shape.clone())
        .unwrap_or_else(|| DEFAULT_CLIP_SHAPE.to_string());

    let mut bound = slot.clone();
    bound.src = Some(image.src);
    bound.clip = Some(ImageClip { range, shape });
    bound
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slides::{SlotKind, SlotRole};
    use uuid::Uuid;

    fn image_slot(width: f64, height: f64) -> TemplateSlot {
        TemplateSlot {
            id: Uuid::new_v4(),
            kind: SlotKind::Image,
            role: Some(SlotRole::Illustration),
            left: 0.0,
            top: 0.0,
            width,
            height,
            rotate: 0.0,
            markup: None,
            src: None,
            clip: None,
            line_height: None,
        }
    }

    fn pool_item(id: &str, width: f64, height: f64) -> ImagePoolItem {
        ImagePoolItem {
            id: id.to_string(),
            src: format!("https://img.test/{id}.png"),
            width,
            height,
        }
    }

    #[test]
    fn test_empty_pool_returns_slot_unchanged() {
        let slot = image_slot(300.0, 200.0);
        let mut pool = ImagePool::default();
        let out = fill_image_slot(&slot, &mut pool, &mut rand::rng());
        assert!(out.src.is_none());
        assert!(out.clip.is_none());
    }

    #[test]
    fn test_wide_slot_prefers_wide_images() {
        let slot = image_slot(400.0, 100.0);
        let mut pool = ImagePool::new(vec![
            pool_item("tall", 100.0, 400.0),
            pool_item("wide", 800.0, 200.0),
        ]);
        let taken = pool.take_for(&slot, &mut rand::rng()).unwrap();
        assert_eq!(taken.id, "wide");
    }

    #[test]
    fn test_no_aspect_match_uses_full_pool() {
        let slot = image_slot(400.0, 100.0); // wide
        let mut pool = ImagePool::new(vec![pool_item("tall", 100.0, 400.0)]);
        let taken = pool.take_for(&slot, &mut rand::rng());
        assert!(taken.is_some(), "full pool used when no class matches");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_allocation_removes_item_from_pool() {
        let slot = image_slot(200.0, 200.0);
        let mut pool = ImagePool::new(vec![
            pool_item("a", 500.0, 500.0),
            pool_item("b", 500.0, 500.0),
        ]);
        let mut rng = rand::rng();
        let first = pool.take_for(&slot, &mut rng).unwrap();
        let second = pool.take_for(&slot, &mut rng).unwrap();
        assert_ne!(first.id, second.id, "no two slots share one pool item");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_crop_bounds_hold_for_extreme_ratios() {
        let cases = [
            (400.0, 100.0, 100.0, 400.0),
            (100.0, 400.0, 400.0, 100.0),
            (200.0, 200.0, 1920.0, 1080.0),
            (1000.0, 10.0, 10.0, 1000.0),
            (333.0, 777.0, 777.0, 333.0),
        ];
        for (sw, sh, iw, ih) in cases {
            let slot = image_slot(sw, sh);
            let image = pool_item("x", iw, ih);
            let range = crop_to_cover(&slot, &image);
            for point in range {
                for coord in point {
                    assert!(
                        (0.0..=100.0).contains(&coord),
                        "crop coord {coord} out of [0,100] for slot {sw}x{sh} image {iw}x{ih}"
                    );
                }
            }
            assert!(range[0][0] <= range[1][0]);
            assert!(range[0][1] <= range[1][1]);
        }
    }

    #[test]
    fn test_matching_ratio_yields_full_frame_crop() {
        let slot = image_slot(400.0, 200.0);
        let image = pool_item("x", 800.0, 400.0);
        let range = crop_to_cover(&slot, &image);
        assert_eq!(range, [[0.0, 0.0], [100.0, 100.0]]);
    }

    #[test]
    fn test_clip_shape_inherited_from_slot() {
        let mut slot = image_slot(200.0, 200.0);
        slot.clip = Some(ImageClip {
            range: [[0.0, 0.0], [100.0, 100.0]],
            shape: "ellipse".to_string(),
        });
        let mut pool = ImagePool::new(vec![pool_item("a", 400.0, 400.0)]);
        let out = fill_image_slot(&slot, &mut pool, &mut rand::rng());
        assert_eq!(out.clip.unwrap().shape, "ellipse");
    }

    #[test]
    fn test_clip_shape_defaults_to_rect() {
        let slot = image_slot(200.0, 200.0);
        let mut pool = ImagePool::new(vec![pool_item("a", 400.0, 400.0)]);
        let out = fill_image_slot(&slot, &mut pool, &mut rand::rng());
        assert_eq!(out.clip.unwrap().shape, DEFAULT_CLIP_SHAPE);
    }
}
