//! Template library — the fixed set of graphic layouts content is bound to.
//!
//! Loaded from a JSON file when `TEMPLATES_PATH` is set, otherwise the
//! builtin set below is used. The engine requires at least one template per
//! slide kind; a library missing a kind is a fatal configuration error
//! surfaced at startup, not at synthesis time.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::slides::{
    SlideBackground, SlideKind, SlideSize, SlotKind, SlotRole, Template, TemplateSlot,
};

const REQUIRED_KINDS: [SlideKind; 5] = [
    SlideKind::Cover,
    SlideKind::Contents,
    SlideKind::Content,
    SlideKind::Transition,
    SlideKind::End,
];

#[derive(Debug, Deserialize)]
struct TemplateFile {
    templates: Vec<Template>,
}

pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<Template>) -> Result<Self, AppError> {
        let library = TemplateLibrary { templates };
        for kind in REQUIRED_KINDS {
            if library.of_kind(kind).is_empty() {
                return Err(AppError::Validation(format!(
                    "template library has no {kind:?} template"
                )));
            }
        }
        Ok(library)
    }

    /// Loads a library from a JSON file of the form `{"templates": [...]}`.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading template file {}", path.display()))?;
        let file: TemplateFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing template file {}", path.display()))?;
        Self::new(file.templates)
    }

    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    pub fn of_kind(&self, kind: SlideKind) -> Vec<&Template> {
        self.templates.iter().filter(|t| t.kind == kind).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builtin set
// ────────────────────────────────────────────────────────────────────────────

fn styled(font_size: u32, extra: &str, text: &str) -> String {
    if extra.is_empty() {
        format!("<p style=\"font-size: {font_size}px;\">{text}</p>")
    } else {
        format!("<p style=\"font-size: {font_size}px; {extra}\">{text}</p>")
    }
}

fn text_slot(
    role: SlotRole,
    (left, top, width, height): (f64, f64, f64, f64),
    markup: String,
) -> TemplateSlot {
    TemplateSlot {
        id: Uuid::new_v4(),
        kind: SlotKind::Text,
        role: Some(role),
        left,
        top,
        width,
        height,
        rotate: 0.0,
        markup: Some(markup),
        src: None,
        clip: None,
        line_height: None,
    }
}

fn image_slot(role: SlotRole, (left, top, width, height): (f64, f64, f64, f64)) -> TemplateSlot {
    TemplateSlot {
        id: Uuid::new_v4(),
        kind: SlotKind::Image,
        role: Some(role),
        left,
        top,
        width,
        height,
        rotate: 0.0,
        markup: None,
        src: None,
        clip: None,
        line_height: None,
    }
}

fn template(kind: SlideKind, background: &str, slots: Vec<TemplateSlot>) -> Template {
    Template {
        id: Uuid::new_v4(),
        kind,
        size: SlideSize::default(),
        background: Some(SlideBackground {
            kind: "solid".to_string(),
            color: Some(background.to_string()),
            image: None,
            gradient: None,
        }),
        slots,
    }
}

/// A grid of `count` item groups, each an itemNumber + itemTitle + item
/// column, laid out left to right across the canvas.
fn item_grid(count: usize) -> Vec<TemplateSlot> {
    let gap = 24.0;
    let width = (1000.0 - gap * (count as f64 + 1.0)) / count as f64;
    let mut slots = Vec::with_capacity(count * 3);
    for i in 0..count {
        let left = gap + (width + gap) * i as f64;
        slots.push(text_slot(
            SlotRole::ItemNumber,
            (left, 140.0, 60.0, 48.0),
            styled(32, "color: #5b9bd5; font-weight: 700;", "01"),
        ));
        slots.push(text_slot(
            SlotRole::ItemTitle,
            (left, 200.0, width, 50.0),
            styled(22, "font-weight: 700;", "Item title"),
        ));
        slots.push(text_slot(
            SlotRole::Item,
            (left, 260.0, width, 220.0),
            styled(16, "color: #41464b;", "Item body text"),
        ));
    }
    slots
}

/// The builtin template set: several `content` layouts at different item
/// capacities plus one layout per remaining kind.
pub fn builtin_library() -> TemplateLibrary {
    let mut templates = vec![
        template(
            SlideKind::Cover,
            "#1d2d44",
            vec![
                image_slot(SlotRole::Background, (0.0, 0.0, 1000.0, 562.5)),
                text_slot(
                    SlotRole::Title,
                    (100.0, 200.0, 800.0, 90.0),
                    styled(54, "color: #ffffff; font-weight: 700; text-align: center;", "Presentation title"),
                ),
                text_slot(
                    SlotRole::Subtitle,
                    (200.0, 320.0, 600.0, 50.0),
                    styled(24, "color: #d7dde4; text-align: center;", "Subtitle"),
                ),
            ],
        ),
        template(SlideKind::Contents, "#f5f6f8", {
            let mut slots = vec![text_slot(
                SlotRole::Title,
                (60.0, 50.0, 400.0, 70.0),
                styled(40, "font-weight: 700;", "Contents"),
            )];
            for i in 0..6 {
                let row = i % 3;
                let col = i / 3;
                slots.push(text_slot(
                    SlotRole::Item,
                    (80.0 + col as f64 * 460.0, 170.0 + row as f64 * 110.0, 400.0, 50.0),
                    styled(20, "", "Section"),
                ));
            }
            slots
        }),
        template(
            SlideKind::Transition,
            "#2b3a55",
            vec![
                text_slot(
                    SlotRole::Title,
                    (100.0, 210.0, 800.0, 80.0),
                    styled(44, "color: #ffffff; font-weight: 700; text-align: center;", "Section"),
                ),
                text_slot(
                    SlotRole::Subtitle,
                    (200.0, 310.0, 600.0, 50.0),
                    styled(20, "color: #c9d2df; text-align: center;", "Section intro"),
                ),
            ],
        ),
        template(
            SlideKind::End,
            "#1d2d44",
            vec![
                text_slot(
                    SlotRole::Content,
                    (150.0, 230.0, 700.0, 80.0),
                    styled(48, "color: #ffffff; font-weight: 700; text-align: center;", "Thank you"),
                ),
                text_slot(
                    SlotRole::Title,
                    (250.0, 340.0, 500.0, 40.0),
                    styled(18, "color: #c9d2df; text-align: center;", "Closing line"),
                ),
            ],
        ),
        // Plain-paragraph content layout, preferred for single-item blocks.
        template(
            SlideKind::Content,
            "#ffffff",
            vec![
                text_slot(
                    SlotRole::Title,
                    (60.0, 50.0, 600.0, 70.0),
                    styled(36, "font-weight: 700;", "Slide title"),
                ),
                text_slot(
                    SlotRole::Content,
                    (60.0, 160.0, 880.0, 340.0),
                    styled(18, "color: #41464b;", "Body paragraph"),
                ),
            ],
        ),
        // Verbatim rich-markup layout.
        template(
            SlideKind::Content,
            "#ffffff",
            vec![
                text_slot(
                    SlotRole::Title,
                    (60.0, 50.0, 600.0, 70.0),
                    styled(36, "font-weight: 700;", "Slide title"),
                ),
                text_slot(
                    SlotRole::Html,
                    (60.0, 160.0, 880.0, 340.0),
                    styled(16, "", "Rich content"),
                ),
            ],
        ),
    ];

    for count in [2usize, 3, 4] {
        let mut slots = vec![text_slot(
            SlotRole::Title,
            (60.0, 40.0, 600.0, 70.0),
            styled(36, "font-weight: 700;", "Slide title"),
        )];
        slots.extend(item_grid(count));
        templates.push(template(SlideKind::Content, "#ffffff", slots));
    }

    // Header/footer variant for framed content blocks.
    let mut framed = vec![
        text_slot(
            SlotRole::Header,
            (60.0, 30.0, 880.0, 40.0),
            styled(16, "color: #6c757d;", "Header"),
        ),
        text_slot(
            SlotRole::Footer,
            (60.0, 500.0, 880.0, 36.0),
            styled(14, "color: #6c757d;", "Footer"),
        ),
        text_slot(
            SlotRole::Title,
            (60.0, 90.0, 600.0, 60.0),
            styled(32, "font-weight: 700;", "Slide title"),
        ),
    ];
    framed.extend(
        item_grid(3)
            .into_iter()
            .map(|mut s| {
                s.top += 20.0;
                s
            }),
    );
    templates.push(template(SlideKind::Content, "#ffffff", framed));

    // Illustrated content layout: two items beside a pool-filled image.
    let mut illustrated = vec![
        text_slot(
            SlotRole::Title,
            (60.0, 40.0, 600.0, 70.0),
            styled(36, "font-weight: 700;", "Slide title"),
        ),
        image_slot(SlotRole::Illustration, (620.0, 150.0, 320.0, 340.0)),
    ];
    for top in [160.0f64, 330.0] {
        illustrated.push(text_slot(
            SlotRole::ItemTitle,
            (60.0, top, 500.0, 46.0),
            styled(22, "font-weight: 700;", "Item title"),
        ));
        illustrated.push(text_slot(
            SlotRole::Item,
            (60.0, top + 54.0, 500.0, 100.0),
            styled(16, "color: #41464b;", "Item body text"),
        ));
    }
    templates.push(template(SlideKind::Content, "#ffffff", illustrated));

    TemplateLibrary::new(templates).expect("builtin library covers every slide kind")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
