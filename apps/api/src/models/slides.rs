//! Slide-side data model: templates, slots, generated slides, and the deck.
//!
//! Templates are immutable and owned by the template library. A generated
//! slide is a concrete copy of a template with content bound into its slots
//! and a fresh identity, owned by the deck thereafter.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Kinds and roles
// ────────────────────────────────────────────────────────────────────────────

/// The layout family a template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Cover,
    Contents,
    Content,
    Transition,
    End,
}

/// The element kind of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Text,
    Shape,
    Image,
}

/// Semantic purpose of a slot within its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotRole {
    Title,
    Subtitle,
    Header,
    Footer,
    Item,
    ItemTitle,
    ItemNumber,
    Content,
    Html,
    Background,
    /// A generic content image slot, fillable from the image pool.
    Illustration,
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry, crop, background
// ────────────────────────────────────────────────────────────────────────────

/// Crop rectangle in percentage space: `[[x1, y1], [x2, y2]]`, each axis 0–100.
pub type CropRange = [[f64; 2]; 2];

/// Crop applied to an image slot. `shape` is inherited from the template
/// slot's pre-existing clip, defaulting to a plain rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageClip {
    pub range: CropRange,
    pub shape: String,
}

pub const DEFAULT_CLIP_SHAPE: &str = "rect";

/// Slide or template background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideBackground {
    #[serde(rename = "type")]
    pub kind: String, // "solid" | "image" | "gradient"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<String>,
}

/// Logical slide canvas size in layout units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: f64,
    pub height: f64,
}

impl Default for SlideSize {
    fn default() -> Self {
        SlideSize {
            width: 1000.0,
            height: 562.5,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Template and slots
// ────────────────────────────────────────────────────────────────────────────

/// One placeholder within a template.
///
/// Text and shape slots carry `markup`: styled inline-markup fragments with
/// font-size/family/color/alignment directives the binder must preserve.
/// Image slots carry `src` and an optional `clip`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSlot {
    pub id: Uuid,
    pub kind: SlotKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<SlotRole>,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ImageClip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
}

impl TemplateSlot {
    /// True for slots the binder can pour text into.
    pub fn is_text_like(&self) -> bool {
        matches!(self.kind, SlotKind::Text | SlotKind::Shape)
    }

    /// True when this slot is a text/shape slot tagged with `role`.
    pub fn has_role(&self, role: SlotRole) -> bool {
        self.is_text_like() && self.role == Some(role)
    }

    /// True for image slots designated for substitution (role-tagged).
    pub fn is_fillable_image(&self) -> bool {
        self.kind == SlotKind::Image && self.role.is_some()
    }

    /// Stable reading-order key used to assign the Nth item to the Nth slot.
    pub fn reading_order(&self) -> f64 {
        self.left + self.top * 2.0
    }
}

/// A reusable slide layout: a kind tag plus an ordered set of typed slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub kind: SlideKind,
    #[serde(default)]
    pub size: SlideSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<SlideBackground>,
    pub slots: Vec<TemplateSlot>,
}

impl Template {
    /// Count of text/shape slots carrying the given role.
    pub fn role_count(&self, role: SlotRole) -> usize {
        self.slots.iter().filter(|s| s.has_role(role)).count()
    }

    pub fn has_slot_with_role(&self, role: SlotRole) -> bool {
        self.slots.iter().any(|s| s.has_role(role))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generated slides and the deck
// ────────────────────────────────────────────────────────────────────────────

/// A concrete slide produced by the assembler: the chosen template's
/// background and size, bound elements, and a fresh identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSlide {
    pub id: Uuid,
    pub kind: SlideKind,
    #[serde(default)]
    pub size: SlideSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<SlideBackground>,
    pub elements: Vec<TemplateSlot>,
}

impl GeneratedSlide {
    /// Builds a slide from a template with the given bound elements.
    pub fn from_template(template: &Template, elements: Vec<TemplateSlot>) -> Self {
        GeneratedSlide {
            id: Uuid::new_v4(),
            kind: template.kind,
            size: template.size,
            background: template.background.clone(),
            elements,
        }
    }
}

/// The ordered slide list owned by the caller for the duration of a
/// synthesis pass. Mutated once at the end of assembly, plus the deferred
/// propagation mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    pub slides: Vec<GeneratedSlide>,
    pub active_index: usize,
}

impl Deck {
    /// Installs a generated sequence: replaces the slide list when the deck
    /// is empty, otherwise splices the sequence in after the active slide.
    pub fn insert_generated(&mut self, slides: Vec<GeneratedSlide>) {
        if slides.is_empty() {
            return;
        }
        if self.slides.is_empty() {
            self.slides = slides;
            self.active_index = 0;
        } else {
            let at = (self.active_index + 1).min(self.slides.len());
            let count = slides.len();
            self.slides.splice(at..at, slides);
            self.active_index = at + count - 1;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text_slot(role: SlotRole, left: f64, top: f64) -> TemplateSlot {
        TemplateSlot {
            id: Uuid::new_v4(),
            kind: SlotKind::Text,
            role: Some(role),
            left,
            top,
            width: 300.0,
            height: 60.0,
            rotate: 0.0,
            markup: Some("<p style=\"font-size: 24px;\">placeholder</p>".to_string()),
            src: None,
            clip: None,
            line_height: None,
        }
    }

    fn slide(kind: SlideKind) -> GeneratedSlide {
        GeneratedSlide {
            id: Uuid::new_v4(),
            kind,
            size: SlideSize::default(),
            background: None,
            elements: vec![],
        }
    }

    #[test]
    fn test_role_count_ignores_other_roles() {
        let template = Template {
            id: Uuid::new_v4(),
            kind: SlideKind::Content,
            size: SlideSize::default(),
            background: None,
            slots: vec![
                text_slot(SlotRole::Item, 0.0, 0.0),
                text_slot(SlotRole::Item, 350.0, 0.0),
                text_slot(SlotRole::Title, 0.0, 100.0),
            ],
        };
        assert_eq!(template.role_count(SlotRole::Item), 2);
        assert_eq!(template.role_count(SlotRole::Title), 1);
        assert_eq!(template.role_count(SlotRole::Footer), 0);
    }

    #[test]
    fn test_image_slot_never_matches_text_role() {
        let slot = TemplateSlot {
            id: Uuid::new_v4(),
            kind: SlotKind::Image,
            role: Some(SlotRole::Background),
            left: 0.0,
            top: 0.0,
            width: 100.0,
            height: 100.0,
            rotate: 0.0,
            markup: None,
            src: Some("bg.png".to_string()),
            clip: None,
            line_height: None,
        };
        assert!(!slot.has_role(SlotRole::Background));
        assert!(slot.is_fillable_image());
    }

    #[test]
    fn test_reading_order_prefers_rows_over_columns() {
        // Same column, lower row must sort after higher row even when the
        // lower slot is further left.
        let upper_right = text_slot(SlotRole::Item, 500.0, 100.0);
        let lower_left = text_slot(SlotRole::Item, 0.0, 400.0);
        assert!(upper_right.reading_order() < lower_left.reading_order());
    }

    #[test]
    fn test_insert_into_empty_deck_replaces() {
        let mut deck = Deck::default();
        deck.insert_generated(vec![slide(SlideKind::Cover), slide(SlideKind::End)]);
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(deck.active_index, 0);
    }

    #[test]
    fn test_insert_into_nonempty_deck_splices_after_active() {
        let mut deck = Deck {
            slides: vec![slide(SlideKind::Cover), slide(SlideKind::End)],
            active_index: 0,
        };
        let existing_end = deck.slides[1].id;
        deck.insert_generated(vec![slide(SlideKind::Content)]);
        assert_eq!(deck.slides.len(), 3);
        assert_eq!(deck.slides[1].kind, SlideKind::Content);
        assert_eq!(deck.slides[2].id, existing_end);
        assert_eq!(deck.active_index, 1);
    }

    #[test]
    fn test_insert_empty_sequence_is_noop() {
        let mut deck = Deck {
            slides: vec![slide(SlideKind::Cover)],
            active_index: 0,
        };
        deck.insert_generated(vec![]);
        assert_eq!(deck.slides.len(), 1);
        assert_eq!(deck.active_index, 0);
    }

    #[test]
    fn test_template_json_round_trip() {
        let template = Template {
            id: Uuid::new_v4(),
            kind: SlideKind::Cover,
            size: SlideSize::default(),
            background: None,
            slots: vec![text_slot(SlotRole::Title, 0.0, 0.0)],
        };
        let json = serde_json::to_string(&template).unwrap();
        assert!(json.contains("\"cover\""), "kind serializes lowercase");
        assert!(json.contains("\"title\""), "role serializes camelCase");
        let recovered: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.kind, SlideKind::Cover);
        assert_eq!(recovered.slots.len(), 1);
    }
}
