//! Text fitting — computes the largest font size that keeps a text within a
//! slot's line budget.
//!
//! Greedy best-effort shrink, not a proof of fit: when even the floor size
//! overflows, the floor is returned and callers tolerate minor overflow.

use crate::layout::measure::TextMeasurer;

/// Lower bound for any fitted font size.
pub const MIN_FONT_SIZE: u32 = 10;

/// Sizes at or below this shrink in steps of 1; above it, steps of 2.
const FINE_STEP_THRESHOLD: u32 = 22;

/// Parameters for one fit computation.
///
/// `text` is the reference string measured against the box — when fitting a
/// group of sibling slots to a common size, callers pass the longest sibling
/// here so the whole group shares one visual size.
#[derive(Debug, Clone)]
pub struct FitRequest<'a> {
    pub text: &'a str,
    pub font_size: u32,
    pub font_family: &'a str,
    /// Usable box width: slot width minus fixed horizontal padding.
    pub width: f64,
    pub max_lines: u32,
}

/// Returns the largest size in `[MIN_FONT_SIZE, request.font_size]` whose
/// implied line count fits `max_lines`, or `MIN_FONT_SIZE` when none does.
///
/// The implied line count is `ceil(measured_width / width)` — a coarse model
/// that ignores word-break positions on purpose.
pub fn fitted_font_size(request: &FitRequest<'_>, measurer: &dyn TextMeasurer) -> u32 {
    if request.width <= 0.0 || request.text.is_empty() {
        return request.font_size.max(MIN_FONT_SIZE);
    }

    let mut size = request.font_size.max(MIN_FONT_SIZE);

    while size >= MIN_FONT_SIZE {
        let text_width = measurer.measure(request.text, size as f64, request.font_family);
        let lines = (text_width / request.width).ceil() as u32;

        if lines <= request.max_lines {
            return size;
        }

        let step = if size <= FINE_STEP_THRESHOLD { 1 } else { 2 };
        if size - MIN_FONT_SIZE < step {
            break;
        }
        size -= step;
    }

    MIN_FONT_SIZE
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
