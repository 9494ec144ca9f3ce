//! Text measurement capability.
//!
//! The original layout surface measures rendered text against a live canvas;
//! here the capability is a trait so any font-metrics provider works, as long
//! as it returns consistent widths for a given (text, size, family) triple.
//! Tests inject a deterministic stub.
//!
//! The default implementation uses a static character-width table in em
//! units. This is an intentional approximation: the fitter only needs a
//! monotone, consistent width estimate to pick a font size, and the fitter's
//! floor size absorbs residual error. Non-ASCII codepoints are treated as
//! fullwidth (1 em), which is the right call for the CJK-heavy content this
//! engine typically binds.

use std::collections::HashMap;

// ────────────────────────────────────────────────────────────────────────────
// Capability trait
// ────────────────────────────────────────────────────────────────────────────

/// Returns the rendered width, in layout px, of `text` at `font_size` px in
/// the given font family.
pub trait TextMeasurer: Send + Sync {
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> f64;
}

// ────────────────────────────────────────────────────────────────────────────
// Static-table implementation
// ────────────────────────────────────────────────────────────────────────────

/// Width of ASCII character `(i + 32)` in em units, covering 0x20 (space)
/// through 0x7E (~), for a generic humanist sans-serif at weight 400.
#[rustfmt::skip]
static ASCII_WIDTHS: [f64; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
    // 0     1     2     3     4     5     6     7     8     9
    0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
    // :     ;     <     =     >     ?     @
    0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
    // A     B     C     D     E     F     G     H     I     J     K     L     M
    0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
    // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
    0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
    // [     \     ]     ^     _     `
    0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
    // a     b     c     d     e     f     g     h     i     j     k     l     m
    0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
    // n     o     p     q     r     s     t     u     v     w     x     y     z
    0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
    // {     |     }     ~
    0.33, 0.26, 0.33, 0.59,
];

/// Width used for every codepoint above 0x7E (fullwidth/CJK assumption).
const FULLWIDTH_EM: f64 = 1.0;

/// Table-backed measurer with per-family width factors.
///
/// A factor of 1.0 is the generic sans table above; condensed families sit
/// below 1.0 and wide serifs above it. Unknown families use 1.0.
pub struct CharTableMeasurer {
    family_factors: HashMap<String, f64>,
}

impl CharTableMeasurer {
    pub fn new() -> Self {
        let family_factors = HashMap::from([
            ("Microsoft Yahei".to_string(), 1.0),
            ("PingFang SC".to_string(), 1.0),
            ("Arial".to_string(), 0.98),
            ("Georgia".to_string(), 1.05),
            ("Oswald".to_string(), 0.68),
        ]);
        CharTableMeasurer { family_factors }
    }

    fn family_factor(&self, family: &str) -> f64 {
        self.family_factors.get(family).copied().unwrap_or(1.0)
    }

    /// Sums per-character em widths for a string.
    fn measure_em(&self, text: &str) -> f64 {
        text.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    ASCII_WIDTHS[code - 32]
                } else {
                    FULLWIDTH_EM
                }
            })
            .sum()
    }
}

impl Default for CharTableMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer for CharTableMeasurer {
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> f64 {
        self.measure_em(text) * font_size * self.family_factor(font_family)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
