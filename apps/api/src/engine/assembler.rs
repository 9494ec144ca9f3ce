//! Layout assembly — the per-block pipeline that turns content blocks into
//! generated slides and installs them into the deck.
//!
//! For each block, in input order: normalize (split oversized item lists),
//! select a template, bind text into slots, allocate pool images, and
//! schedule background generation where requested. The deck is mutated once
//! at the end, then the deferred cover-image propagation runs with a bounded
//! wait.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::errors::AppError;
use crate::images::allocator::{fill_image_slot, ImagePool};
use crate::images::synthesizer::{self, ImageGenerator, PendingImage, PLACEHOLDER_SRC};
use crate::layout::{bind_text, BindRequest, TextMeasurer};
use crate::models::blocks::{ContentBlock, ContentItem, ImagePoolItem};
use crate::models::slides::{Deck, GeneratedSlide, SlideKind, SlotRole, Template, TemplateSlot};
use crate::templates::TemplateLibrary;

use super::normalizer::normalize;
use super::selector::{choose, filter_header_footer, select_by_count};

// Line budgets per slot role. Item bodies get a longer budget when the slide
// holds a single item.
const TITLE_LINES: u32 = 1;
const SUBTITLE_LINES: u32 = 3;
const ITEM_TITLE_LINES: u32 = 1;
const ITEM_LINES: u32 = 4;
const SINGLE_ITEM_LINES: u32 = 6;
const CONTENT_LINES: u32 = 6;
const HEADER_LINES: u32 = 4;
const FOOTER_LINES: u32 = 2;
const END_CONTENT_LINES: u32 = 8;
const END_TITLE_LINES: u32 = 2;
const TOC_ITEM_LINES: u32 = 1;

/// Inputs for one synthesis pass.
pub struct AssembleInput {
    pub blocks: Vec<ContentBlock>,
    pub images: Vec<ImagePoolItem>,
}

/// The assembled sequence, the handle of a scheduled cover-image generation
/// when one was requested, and whatever is left of the image pool (the
/// generation-failure fallback draws from it).
pub struct AssembleOutput {
    pub slides: Vec<GeneratedSlide>,
    pub pending: Option<PendingImage>,
    pub pool: ImagePool,
}

/// Everything the assembler borrows from the application for one pass.
pub struct AssemblerContext<'a> {
    pub library: &'a TemplateLibrary,
    pub measurer: &'a dyn TextMeasurer,
    pub generator: Arc<dyn ImageGenerator>,
}

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Runs the synchronous pipeline over all blocks. The only deferred effect
/// is the scheduled image generation carried in the output.
pub fn assemble(
    ctx: &AssemblerContext<'_>,
    input: AssembleInput,
    rng: &mut impl Rng,
) -> Result<AssembleOutput, AppError> {
    let mut pool = ImagePool::new(input.images);
    let mut slides = Vec::new();
    let mut pending = None;

    for block in input.blocks {
        for fragment in normalize(block) {
            let slide = match fragment {
                ContentBlock::Cover {
                    title,
                    text,
                    html,
                    generate_background,
                } => {
                    let (slide, scheduled) = assemble_cover(
                        ctx,
                        title.as_deref(),
                        text.as_deref(),
                        html.as_deref(),
                        generate_background.as_deref(),
                        &mut pool,
                        rng,
                    )?;
                    if scheduled.is_some() {
                        pending = scheduled;
                    }
                    slide
                }
                ContentBlock::Contents { items, offset } => {
                    assemble_contents(ctx, &items, offset, rng)?
                }
                ContentBlock::Content {
                    title,
                    header,
                    footer,
                    html,
                    content,
                    items,
                    offset,
                } => assemble_content(
                    ctx,
                    ContentFragment {
                        title: title.as_deref(),
                        header: header.as_deref(),
                        footer: footer.as_deref(),
                        html,
                        content: content.as_deref(),
                        items: &items,
                        offset,
                    },
                    &mut pool,
                    rng,
                )?,
                ContentBlock::Transition { title, text } => {
                    assemble_transition(ctx, title.as_deref(), text.as_deref(), rng)?
                }
                ContentBlock::End { title, content } => {
                    assemble_end(ctx, title.as_deref(), content.as_deref(), &mut pool, rng)?
                }
            };
            slides.push(slide);
        }
    }

    debug!("Assembled {} slide(s)", slides.len());
    Ok(AssembleOutput {
        slides,
        pending,
        pool,
    })
}

/// Full synthesis: assemble, install into the deck, then wait (bounded) for
/// the scheduled cover image and propagate it.
pub async fn synthesize(
    ctx: &AssemblerContext<'_>,
    deck: &mut Deck,
    input: AssembleInput,
    max_image_wait: Duration,
    rng: &mut impl Rng,
) -> Result<(), AppError> {
    let output = assemble(ctx, input, rng)?;
    let mut pool = output.pool;
    deck.insert_generated(output.slides);

    if let Some(pending) = output.pending {
        synthesizer::propagate(deck, &pending, &mut pool, rng, max_image_wait).await;
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Per-kind assembly
// ────────────────────────────────────────────────────────────────────────────

fn pick_template<'a>(
    candidates: Vec<&'a Template>,
    kind: SlideKind,
    rng: &mut impl Rng,
) -> Result<&'a Template, AppError> {
    choose(&candidates, rng)
        .ok_or_else(|| AppError::Validation(format!("no {kind:?} template available")))
}

fn assemble_cover(
    ctx: &AssemblerContext<'_>,
    title: Option<&str>,
    text: Option<&str>,
    html: Option<&str>,
    generate_background: Option<&str>,
    pool: &mut ImagePool,
    rng: &mut impl Rng,
) -> Result<(GeneratedSlide, Option<PendingImage>), AppError> {
    let template = pick_template(ctx.library.of_kind(SlideKind::Cover), SlideKind::Cover, rng)?;
    let body = html.or(text);
    let mut generation_slot = None;

    let elements = template
        .slots
        .iter()
        .map(|slot| {
            if slot.has_role(SlotRole::Title) {
                if let Some(title) = title {
                    return bind_text(slot, &BindRequest::plain(title, TITLE_LINES), ctx.measurer);
                }
            }
            if slot.has_role(SlotRole::Subtitle) || slot.has_role(SlotRole::Content) {
                if let Some(body) = body {
                    return bind_text(
                        slot,
                        &BindRequest::plain(body, SUBTITLE_LINES),
                        ctx.measurer,
                    );
                }
            }
            if slot.is_fillable_image() {
                if generate_background.is_some() && slot.role == Some(SlotRole::Background) {
                    let mut placeholder = slot.clone();
                    placeholder.src = Some(PLACEHOLDER_SRC.to_string());
                    generation_slot = Some(placeholder.id);
                    return placeholder;
                }
                return fill_image_slot(slot, pool, rng);
            }
            slot.clone()
        })
        .collect();

    let slide = GeneratedSlide::from_template(template, elements);
    let pending = match (generate_background, generation_slot) {
        (Some(prompt), Some(slot_id)) => Some(synthesizer::schedule(
            ctx.generator.clone(),
            prompt.to_string(),
            slide.id,
            slot_id,
        )),
        _ => None,
    };
    Ok((slide, pending))
}

fn assemble_contents(
    ctx: &AssemblerContext<'_>,
    items: &[String],
    offset: usize,
    rng: &mut impl Rng,
) -> Result<GeneratedSlide, AppError> {
    let candidates = select_by_count(
        &ctx.library.of_kind(SlideKind::Contents),
        SlotRole::Item,
        items.len(),
    );
    let template = pick_template(candidates, SlideKind::Contents, rng)?;

    let mut elements: Vec<TemplateSlot> = template.slots.clone();
    let longest = longest_str(items.iter().map(String::as_str));
    bind_ordered(
        &mut elements,
        SlotRole::Item,
        items.len(),
        |i, slot| {
            bind_text(
                slot,
                &BindRequest::with_longest(&items[i], longest, TOC_ITEM_LINES),
                ctx.measurer,
            )
        },
    );
    bind_ordinals(&mut elements, items.len(), offset, ctx.measurer);

    Ok(GeneratedSlide::from_template(template, elements))
}

/// Borrowed view of one `content` fragment.
struct ContentFragment<'a> {
    title: Option<&'a str>,
    header: Option<&'a str>,
    footer: Option<&'a str>,
    html: bool,
    content: Option<&'a str>,
    items: &'a [ContentItem],
    offset: usize,
}

fn assemble_content(
    ctx: &AssemblerContext<'_>,
    fragment: ContentFragment<'_>,
    pool: &mut ImagePool,
    rng: &mut impl Rng,
) -> Result<GeneratedSlide, AppError> {
    let kind_list = ctx.library.of_kind(SlideKind::Content);

    // Rich single-payload blocks bind against the html/content role instead
    // of the item grid.
    if fragment.items.is_empty() {
        if let Some(payload) = fragment.content {
            let role = if fragment.html {
                SlotRole::Html
            } else {
                SlotRole::Content
            };
            let candidates = select_by_count(&kind_list, role, 1);
            let template = pick_template(candidates, SlideKind::Content, rng)?;
            let elements = template
                .slots
                .iter()
                .map(|slot| {
                    if slot.has_role(role) || (role == SlotRole::Html && slot.has_role(SlotRole::Content)) {
                        bind_text(slot, &BindRequest::plain(payload, CONTENT_LINES), ctx.measurer)
                    } else if slot.has_role(SlotRole::Title) {
                        match fragment.title {
                            Some(t) => {
                                bind_text(slot, &BindRequest::plain(t, TITLE_LINES), ctx.measurer)
                            }
                            None => slot.clone(),
                        }
                    } else if slot.is_fillable_image() {
                        fill_image_slot(slot, pool, rng)
                    } else {
                        slot.clone()
                    }
                })
                .collect();
            return Ok(GeneratedSlide::from_template(template, elements));
        }
    }

    let filtered = filter_header_footer(
        &kind_list,
        fragment.header.is_some(),
        fragment.footer.is_some(),
    );
    let candidates = select_by_count(&filtered, SlotRole::Item, fragment.items.len());
    let template = pick_template(candidates, SlideKind::Content, rng)?;

    let single = fragment.items.len() == 1;
    let item_lines = if single { SINGLE_ITEM_LINES } else { ITEM_LINES };

    let mut elements: Vec<TemplateSlot> = template
        .slots
        .iter()
        .map(|slot| {
            if slot.has_role(SlotRole::Title) {
                let title = fragment.title.or_else(|| {
                    single
                        .then(|| fragment.items[0].title.as_deref())
                        .flatten()
                });
                if let Some(title) = title {
                    return bind_text(slot, &BindRequest::plain(title, TITLE_LINES), ctx.measurer);
                }
            }
            // A single-item block may land on a plain-paragraph layout with
            // no item slots; its body goes into the content slot instead.
            if single && slot.has_role(SlotRole::Content) {
                if let Some(text) = fragment.items[0].text.as_deref() {
                    return bind_text(
                        slot,
                        &BindRequest::plain(text, SINGLE_ITEM_LINES),
                        ctx.measurer,
                    );
                }
            }
            if slot.has_role(SlotRole::Header) {
                if let Some(header) = fragment.header.or(fragment.title) {
                    return bind_text(
                        slot,
                        &BindRequest::plain(header, HEADER_LINES),
                        ctx.measurer,
                    );
                }
            }
            if slot.has_role(SlotRole::Footer) {
                if let Some(footer) = fragment.footer {
                    return bind_text(
                        slot,
                        &BindRequest::plain(footer, FOOTER_LINES),
                        ctx.measurer,
                    );
                }
            }
            if slot.is_fillable_image() {
                return fill_image_slot(slot, pool, rng);
            }
            slot.clone()
        })
        .collect();

    let longest_title = longest_str(
        fragment
            .items
            .iter()
            .filter_map(|i| i.title.as_deref()),
    );
    let longest_text = longest_str(fragment.items.iter().filter_map(|i| i.text.as_deref()));

    bind_ordered(
        &mut elements,
        SlotRole::ItemTitle,
        fragment.items.len(),
        |i, slot| match fragment.items[i].title.as_deref() {
            Some(title) => bind_text(
                slot,
                &BindRequest::with_longest(title, longest_title, ITEM_TITLE_LINES),
                ctx.measurer,
            ),
            None => slot.clone(),
        },
    );
    bind_ordered(
        &mut elements,
        SlotRole::Item,
        fragment.items.len(),
        |i, slot| match fragment.items[i].text.as_deref() {
            Some(text) => bind_text(
                slot,
                &BindRequest::with_longest(text, longest_text, item_lines),
                ctx.measurer,
            ),
            None => slot.clone(),
        },
    );
    bind_ordinals(&mut elements, fragment.items.len(), fragment.offset, ctx.measurer);

    Ok(GeneratedSlide::from_template(template, elements))
}

fn assemble_transition(
    ctx: &AssemblerContext<'_>,
    title: Option<&str>,
    text: Option<&str>,
    rng: &mut impl Rng,
) -> Result<GeneratedSlide, AppError> {
    let template = pick_template(
        ctx.library.of_kind(SlideKind::Transition),
        SlideKind::Transition,
        rng,
    )?;
    let elements = template
        .slots
        .iter()
        .map(|slot| {
            if slot.has_role(SlotRole::Title) {
                if let Some(title) = title {
                    return bind_text(slot, &BindRequest::plain(title, TITLE_LINES), ctx.measurer);
                }
            }
            if slot.has_role(SlotRole::Subtitle) || slot.has_role(SlotRole::Content) {
                if let Some(text) = text {
                    return bind_text(
                        slot,
                        &BindRequest::plain(text, SUBTITLE_LINES),
                        ctx.measurer,
                    );
                }
            }
            slot.clone()
        })
        .collect();
    Ok(GeneratedSlide::from_template(template, elements))
}

fn assemble_end(
    ctx: &AssemblerContext<'_>,
    title: Option<&str>,
    content: Option<&str>,
    pool: &mut ImagePool,
    rng: &mut impl Rng,
) -> Result<GeneratedSlide, AppError> {
    let template = pick_template(ctx.library.of_kind(SlideKind::End), SlideKind::End, rng)?;
    let elements = template
        .slots
        .iter()
        .map(|slot| {
            if slot.has_role(SlotRole::Content) {
                if let Some(content) = content {
                    return bind_text(
                        slot,
                        &BindRequest::plain(content, END_CONTENT_LINES),
                        ctx.measurer,
                    );
                }
            }
            if slot.has_role(SlotRole::Title) {
                if let Some(title) = title {
                    return bind_text(
                        slot,
                        &BindRequest::plain(title, END_TITLE_LINES),
                        ctx.measurer,
                    );
                }
            }
            if slot.is_fillable_image() {
                return fill_image_slot(slot, pool, rng);
            }
            slot.clone()
        })
        .collect();
    Ok(GeneratedSlide::from_template(template, elements))
}

// ────────────────────────────────────────────────────────────────────────────
// Slot-group helpers
// ────────────────────────────────────────────────────────────────────────────

fn longest_str<'a>(candidates: impl Iterator<Item = &'a str>) -> &'a str {
    candidates.max_by_key(|s| s.chars().count()).unwrap_or("")
}

/// Indices of the slots carrying `role`, sorted by reading order. This is
/// the deterministic item-to-slot assignment: the Nth item lands in the Nth
/// slot of the reading sequence.
fn ordered_role_indices(elements: &[TemplateSlot], role: SlotRole) -> Vec<usize> {
    let mut indices: Vec<usize> = elements
        .iter()
        .enumerate()
        .filter(|(_, s)| s.has_role(role))
        .map(|(i, _)| i)
        .collect();
    indices.sort_by(|&a, &b| {
        elements[a]
            .reading_order()
            .partial_cmp(&elements[b].reading_order())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Rebinds up to `count` slots of `role` in reading order. Slots beyond
/// `count` keep their placeholder content.
fn bind_ordered(
    elements: &mut [TemplateSlot],
    role: SlotRole,
    count: usize,
    mut bind: impl FnMut(usize, &TemplateSlot) -> TemplateSlot,
) {
    for (i, slot_index) in ordered_role_indices(elements, role)
        .into_iter()
        .take(count)
        .enumerate()
    {
        elements[slot_index] = bind(i, &elements[slot_index]);
    }
}

/// Binds `itemNumber` slots to their one-based ordinal, shifted by the
/// fragment's offset and zero-padded to two digits.
fn bind_ordinals(
    elements: &mut [TemplateSlot],
    count: usize,
    offset: usize,
    measurer: &dyn TextMeasurer,
) {
    bind_ordered(elements, SlotRole::ItemNumber, count, |i, slot| {
        let ordinal = (offset + i + 1).to_string();
        bind_text(slot, &BindRequest::ordinal(&ordinal), measurer)
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
