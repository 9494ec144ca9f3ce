//! Content binding — pours plain or rich text into a slot's styled markup.
//!
//! Slot markup is an opaque styled fragment: inline-markup elements carrying
//! font-size/family/color/alignment directives in `style` attributes. The
//! binder must inject content and the fitted font size while preserving every
//! other directive. It never interprets the content itself.
//!
//! Three bind modes, decided per slot:
//! - `VerbatimReplace` — verbatim-markup roles (`Html`): content replaces the
//!   slot's inner markup wholesale.
//! - `StructuralMerge` — incoming text carries its own tags: the slot's outer
//!   element (and its style) is kept, the incoming structure becomes its
//!   inner markup, and font-size stamping resolves between the two.
//! - `PlainReplace` — plain text replaces the first text node; all remaining
//!   text nodes are cleared so no stale placeholder text survives.

use std::sync::OnceLock;

use regex::Regex;

use crate::layout::fitter::{fitted_font_size, FitRequest};
use crate::layout::measure::TextMeasurer;
use crate::models::slides::{SlotRole, TemplateSlot};

/// Fixed horizontal padding inside a text box, per side.
const TEXT_PADDING: f64 = 10.0;

/// Font size below which the line height is tightened.
const TIGHT_LINE_HEIGHT_BELOW: u32 = 15;
const TIGHT_LINE_HEIGHT: f32 = 1.2;

pub const DEFAULT_FONT_SIZE: u32 = 16;
pub const DEFAULT_FONT_FAMILY: &str = "Microsoft Yahei";

// ────────────────────────────────────────────────────────────────────────────
// Bind request
// ────────────────────────────────────────────────────────────────────────────

/// How content is merged into the slot markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    PlainReplace,
    StructuralMerge,
    VerbatimReplace,
}

/// One binding operation against a single slot.
#[derive(Debug, Clone)]
pub struct BindRequest<'a> {
    pub text: &'a str,
    pub max_lines: u32,
    /// When several sibling slots must share one visual size, the longest
    /// sibling text is measured instead of `text`.
    pub longest_sibling: Option<&'a str>,
    /// Zero-pad a one-character ordinal when the slot holds a two-character
    /// placeholder (`"01"`-style numbering slots).
    pub digit_padding: bool,
}

impl<'a> BindRequest<'a> {
    pub fn plain(text: &'a str, max_lines: u32) -> Self {
        BindRequest {
            text,
            max_lines,
            longest_sibling: None,
            digit_padding: false,
        }
    }

    pub fn with_longest(text: &'a str, longest: &'a str, max_lines: u32) -> Self {
        BindRequest {
            text,
            max_lines,
            longest_sibling: Some(longest),
            digit_padding: false,
        }
    }

    pub fn ordinal(text: &'a str) -> Self {
        BindRequest {
            text,
            max_lines: 1,
            longest_sibling: None,
            digit_padding: true,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Binds `request.text` into `slot`, returning a new slot whose markup has
/// the content substituted and every font-size directive rewritten to the
/// fitted size. The input slot is untouched.
pub fn bind_text(
    slot: &TemplateSlot,
    request: &BindRequest<'_>,
    measurer: &dyn TextMeasurer,
) -> TemplateSlot {
    let markup = slot.markup.as_deref().unwrap_or("<p></p>");
    let font = extract_font_info(markup);

    let usable_width = slot.width - TEXT_PADDING * 2.0 - 10.0;
    let reference = request.longest_sibling.unwrap_or(request.text);
    let fitted = fitted_font_size(
        &FitRequest {
            text: reference,
            font_size: font.font_size,
            font_family: &font.font_family,
            width: usable_width,
            max_lines: request.max_lines,
        },
        measurer,
    );

    let mode = resolve_mode(slot, request.text);
    let substituted = match mode {
        BindMode::VerbatimReplace => replace_inner(markup, request.text),
        BindMode::StructuralMerge => merge_structural(markup, request.text, fitted),
        BindMode::PlainReplace => replace_text_nodes(markup, request.text, request.digit_padding),
    };

    let finished = rewrite_font_sizes(&substituted, fitted);

    let mut bound = slot.clone();
    bound.markup = Some(finished);
    if fitted < TIGHT_LINE_HEIGHT_BELOW {
        bound.line_height = Some(TIGHT_LINE_HEIGHT);
    }
    bound
}

/// Decides the bind mode for a slot/content pair.
pub fn resolve_mode(slot: &TemplateSlot, text: &str) -> BindMode {
    if slot.role == Some(SlotRole::Html) {
        BindMode::VerbatimReplace
    } else if contains_markup_tags(text) {
        BindMode::StructuralMerge
    } else {
        BindMode::PlainReplace
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font info extraction
// ────────────────────────────────────────────────────────────────────────────

/// Font size and family pulled from a markup fragment's style directives.
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    pub font_size: u32,
    pub font_family: String,
}

fn font_size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)font-size:\s*([\d.]+)\s*px").expect("valid regex"))
}

fn font_family_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)font-family:\s*['"]?([^'";<>]+?)['"]?\s*(?:;|"|$)"#)
            .expect("valid regex")
    })
}

/// Extracts the first font-size/font-family directives from `markup`,
/// falling back to the engine defaults.
pub fn extract_font_info(markup: &str) -> FontInfo {
    let font_size = font_size_re()
        .captures(markup)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|v| v.round() as u32)
        .unwrap_or(DEFAULT_FONT_SIZE);
    let font_family = font_family_re()
        .captures(markup)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string());
    FontInfo {
        font_size,
        font_family,
    }
}

/// True when the string carries any markup tag.
pub fn contains_markup_tags(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
        .is_match(text)
}

// ────────────────────────────────────────────────────────────────────────────
// Markup token scanner
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Tag(String),
    Text(String),
}

/// Splits markup into tag and text tokens. No nesting model — text nodes are
/// exactly the runs between tags, which is all the binder needs.
fn tokenize(markup: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = markup.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            if !text.is_empty() {
                tokens.push(Token::Text(std::mem::take(&mut text)));
            }
            let mut tag = String::from('<');
            for t in chars.by_ref() {
                tag.push(t);
                if t == '>' {
                    break;
                }
            }
            tokens.push(Token::Tag(tag));
        } else {
            text.push(c);
        }
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

fn untokenize(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| match t {
            Token::Tag(s) | Token::Text(s) => s.as_str(),
        })
        .collect()
}

/// Replaces the first non-whitespace text node with `text` and clears every
/// later one, so re-binding never leaves duplicate placeholder fragments.
fn replace_text_nodes(markup: &str, text: &str, digit_padding: bool) -> String {
    let mut tokens = tokenize(markup);
    let mut replaced = false;

    for token in tokens.iter_mut() {
        if let Token::Text(existing) = token {
            if existing.trim().is_empty() {
                continue;
            }
            if !replaced {
                let padded = if digit_padding
                    && existing.trim().chars().count() == 2
                    && text.chars().count() == 1
                {
                    format!("0{text}")
                } else {
                    text.to_string()
                };
                *existing = padded;
                replaced = true;
            } else {
                existing.clear();
            }
        }
    }

    if !replaced {
        // Markup with no text node at all: inject into the outer element,
        // or degrade to the bare text.
        return replace_inner(markup, text);
    }
    untokenize(&tokens)
}

// ────────────────────────────────────────────────────────────────────────────
// Outer-element surgery
// ────────────────────────────────────────────────────────────────────────────

fn outer_element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*<([a-zA-Z][\w-]*)([^>]*)>(.*)</([a-zA-Z][\w-]*)>\s*$")
            .expect("valid regex")
    })
}

/// Splits markup into `(tag, attrs, inner)` when it is a single well-formed
/// outer element.
fn split_outer(markup: &str) -> Option<(String, String, String)> {
    let caps = outer_element_re().captures(markup)?;
    if !caps[1].eq_ignore_ascii_case(&caps[4]) {
        return None;
    }
    Some((
        caps[1].to_string(),
        caps[2].to_string(),
        caps[3].to_string(),
    ))
}

/// Replaces the inner markup of the slot's outer element wholesale, keeping
/// the outer element and its style. Degrades to the content itself when the
/// markup has no outer element.
fn replace_inner(markup: &str, content: &str) -> String {
    match split_outer(markup) {
        Some((tag, attrs, _)) => format!("<{tag}{attrs}>{content}</{tag}>"),
        None => content.to_string(),
    }
}

fn style_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"style\s*=\s*"([^"]*)""#).expect("valid regex"))
}

/// Appends a declaration to the element's style attribute, adding the
/// attribute when missing.
fn append_style(tag: &str, attrs: &str, declaration: &str) -> String {
    if let Some(caps) = style_attr_re().captures(attrs) {
        let style = caps[1].trim_end().trim_end_matches(';');
        let updated = if style.is_empty() {
            declaration.to_string()
        } else {
            format!("{style}; {declaration}")
        };
        let new_attrs = style_attr_re().replace(attrs, regex::NoExpand(&format!("style=\"{updated}\"")));
        format!("<{tag}{new_attrs}>")
    } else {
        format!("<{tag}{attrs} style=\"{declaration}\">")
    }
}

/// Merges rich incoming markup with the slot's styled outer element.
///
/// The incoming structure becomes the inner markup. Font-size resolution: an
/// explicit size on an inner node wins and is mirrored onto the outer
/// element when it lacks one; otherwise the fitted size is stamped onto the
/// outer element when it lacks one. Unresolvable markup degrades to a plain
/// text-node replacement carrying the full content.
fn merge_structural(markup: &str, content: &str, fitted: u32) -> String {
    let Some((tag, attrs, _)) = split_outer(markup) else {
        return replace_text_nodes(markup, content, false);
    };

    let outer_has_size = style_attr_re()
        .captures(&attrs)
        .map(|c| c[1].to_lowercase().contains("font-size"))
        .unwrap_or(false);

    let open = if outer_has_size {
        format!("<{tag}{attrs}>")
    } else if let Some(caps) = font_size_re().captures(content) {
        // Inner font size wins; mirror it onto the outer element.
        let inner_size = caps[1].to_string();
        append_style(&tag, &attrs, &format!("font-size: {inner_size}px"))
    } else {
        append_style(&tag, &attrs, &format!("font-size: {fitted}px"))
    };

    format!("{open}{content}</{tag}>")
}

/// Rewrites every font-size directive to the fitted size, adding one when
/// the markup never declared any.
fn rewrite_font_sizes(markup: &str, fitted: u32) -> String {
    if font_size_re().is_match(markup) {
        font_size_re()
            .replace_all(markup, regex::NoExpand(&format!("font-size: {fitted}px")))
            .into_owned()
    } else if let Some((tag, attrs, inner)) = split_outer(markup) {
        let open = append_style(&tag, &attrs, &format!("font-size: {fitted}px"));
        format!("{open}{inner}</{tag}>")
    } else {
        markup.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slides::SlotKind;
    use uuid::Uuid;

    struct HalfEmMeasurer;

    impl TextMeasurer for HalfEmMeasurer {
        fn measure(&self, text: &str, font_size: f64, _font_family: &str) -> f64 {
            text.chars().count() as f64 * font_size * 0.5
        }
    }

    fn slot_with_markup(markup: &str, role: SlotRole) -> TemplateSlot {
        TemplateSlot {
            id: Uuid::new_v4(),
            kind: SlotKind::Text,
            role: Some(role),
            left: 0.0,
            top: 0.0,
            width: 400.0,
            height: 80.0,
            rotate: 0.0,
            markup: Some(markup.to_string()),
            src: None,
            clip: None,
            line_height: Some(1.5),
        }
    }

    // ── font info ───────────────────────────────────────────────────────────

    #[test]
    fn test_extract_font_info_from_style() {
        let info = extract_font_info(
            "<p style=\"font-size: 24px; font-family: 'PingFang SC'; color: #333;\">x</p>",
        );
        assert_eq!(info.font_size, 24);
        assert_eq!(info.font_family, "PingFang SC");
    }

    #[test]
    fn test_extract_font_info_defaults() {
        let info = extract_font_info("<p>plain</p>");
        assert_eq!(info.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(info.font_family, DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn test_extract_font_info_fractional_size_rounds() {
        let info = extract_font_info("<p style=\"font-size: 17.6px\">x</p>");
        assert_eq!(info.font_size, 18);
    }

    // ── mode resolution ─────────────────────────────────────────────────────

    #[test]
    fn test_html_role_forces_verbatim() {
        let slot = slot_with_markup("<p>x</p>", SlotRole::Html);
        assert_eq!(
            resolve_mode(&slot, "<div><b>rich</b></div>"),
            BindMode::VerbatimReplace
        );
        assert_eq!(resolve_mode(&slot, "plain"), BindMode::VerbatimReplace);
    }

    #[test]
    fn test_rich_text_resolves_to_structural_merge() {
        let slot = slot_with_markup("<p>x</p>", SlotRole::Content);
        assert_eq!(
            resolve_mode(&slot, "some <b>bold</b> text"),
            BindMode::StructuralMerge
        );
        assert_eq!(resolve_mode(&slot, "plain text"), BindMode::PlainReplace);
    }

    // ── plain replacement ───────────────────────────────────────────────────

    #[test]
    fn test_plain_replace_keeps_slot_style() {
        let slot = slot_with_markup(
            "<p style=\"font-size: 20px; color: #102030; text-align: center;\">old</p>",
            SlotRole::Title,
        );
        let bound = bind_text(&slot, &BindRequest::plain("New title", 1), &HalfEmMeasurer);
        let markup = bound.markup.unwrap();
        assert!(markup.contains("New title"));
        assert!(!markup.contains("old"));
        assert!(markup.contains("color: #102030"), "color preserved: {markup}");
        assert!(markup.contains("text-align: center"));
    }

    #[test]
    fn test_plain_replace_clears_extra_text_nodes() {
        let markup = "<p><span>first</span><span>second</span></p>";
        let out = replace_text_nodes(markup, "only", false);
        assert!(out.contains("only"));
        assert!(!out.contains("first"));
        assert!(!out.contains("second"));
    }

    #[test]
    fn test_digit_padding_applies_to_two_char_placeholder() {
        let out = replace_text_nodes("<p>01</p>", "4", true);
        assert!(out.contains("04"), "got {out}");
    }

    #[test]
    fn test_digit_padding_skipped_for_two_char_value() {
        let out = replace_text_nodes("<p>01</p>", "12", true);
        assert!(out.contains(">12<"), "got {out}");
    }

    // ── structural merge ────────────────────────────────────────────────────

    #[test]
    fn test_structural_merge_keeps_outer_style_and_injects_structure() {
        let slot = slot_with_markup(
            "<p style=\"color: red; text-align: left;\">placeholder</p>",
            SlotRole::Content,
        );
        let bound = bind_text(
            &slot,
            &BindRequest::plain("<strong>hot</strong> take", 6),
            &HalfEmMeasurer,
        );
        let markup = bound.markup.unwrap();
        assert!(markup.contains("<strong>hot</strong> take"));
        assert!(markup.contains("color: red"));
        assert!(markup.starts_with("<p"), "outer element kept: {markup}");
        assert!(!markup.contains("placeholder"));
    }

    #[test]
    fn test_structural_merge_inner_font_size_wins() {
        let merged = merge_structural(
            "<p style=\"color: blue\">x</p>",
            "<span style=\"font-size: 30px\">big</span>",
            18,
        );
        // The outer element mirrors the inner 30px, and the global rewrite
        // is what finally harmonizes sizes — here we only check the stamp.
        assert!(merged.contains("font-size: 30px"), "got {merged}");
    }

    #[test]
    fn test_structural_merge_without_outer_falls_back_to_plain() {
        let merged = merge_structural("no tags at all", "<b>x</b>", 18);
        assert!(merged.contains("<b>x</b>"));
    }

    // ── verbatim ────────────────────────────────────────────────────────────

    #[test]
    fn test_verbatim_replaces_inner_wholesale() {
        let slot = slot_with_markup(
            "<div style=\"font-size: 14px\"><p>old</p><p>stale</p></div>",
            SlotRole::Html,
        );
        let bound = bind_text(
            &slot,
            &BindRequest::plain("<ul><li>a</li></ul>", 8),
            &HalfEmMeasurer,
        );
        let markup = bound.markup.unwrap();
        assert!(markup.contains("<ul><li>a</li></ul>"));
        assert!(!markup.contains("old"));
        assert!(!markup.contains("stale"));
    }

    // ── font-size rewriting ─────────────────────────────────────────────────

    #[test]
    fn test_all_font_sizes_rewritten_to_fitted() {
        let out = rewrite_font_sizes(
            "<p style=\"font-size: 24px\"><span style=\"font-size: 30px\">x</span></p>",
            12,
        );
        assert_eq!(out.matches("font-size: 12px").count(), 2);
        assert!(!out.contains("24px"));
        assert!(!out.contains("30px"));
    }

    #[test]
    fn test_font_size_added_when_absent() {
        let out = rewrite_font_sizes("<p style=\"color: red\">x</p>", 16);
        assert!(out.contains("font-size: 16px"), "got {out}");
        assert!(out.contains("color: red"));
    }

    #[test]
    fn test_fitted_size_within_slot_bounds() {
        let slot = slot_with_markup("<p style=\"font-size: 28px\">x</p>", SlotRole::Item);
        let long = "m".repeat(300);
        let bound = bind_text(&slot, &BindRequest::plain(&long, 1), &HalfEmMeasurer);
        let info = extract_font_info(bound.markup.as_deref().unwrap());
        assert!(info.font_size >= 10 && info.font_size <= 28);
    }

    #[test]
    fn test_small_fitted_size_tightens_line_height() {
        let slot = slot_with_markup("<p style=\"font-size: 28px\">x</p>", SlotRole::Item);
        let long = "m".repeat(500);
        let bound = bind_text(&slot, &BindRequest::plain(&long, 1), &HalfEmMeasurer);
        assert_eq!(bound.line_height, Some(1.2));
    }

    #[test]
    fn test_rebinding_is_idempotent() {
        let slot = slot_with_markup(
            "<p style=\"font-size: 20px; color: #123456;\">old</p>",
            SlotRole::Title,
        );
        let once = bind_text(&slot, &BindRequest::plain("Stable", 1), &HalfEmMeasurer);
        let twice = bind_text(&once, &BindRequest::plain("Stable", 1), &HalfEmMeasurer);
        assert_eq!(once.markup, twice.markup, "no accumulating directives");
    }

    #[test]
    fn test_longest_sibling_drives_size_not_content() {
        let slot = slot_with_markup("<p style=\"font-size: 28px\">x</p>", SlotRole::Item);
        let long = "m".repeat(200);
        let bound = bind_text(
            &slot,
            &BindRequest::with_longest("short", &long, 1),
            &HalfEmMeasurer,
        );
        let info = extract_font_info(bound.markup.as_deref().unwrap());
        assert!(
            info.font_size < 28,
            "short text must shrink to its longest sibling's size"
        );
        assert!(bound.markup.unwrap().contains("short"));
    }
}
