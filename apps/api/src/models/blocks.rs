//! Content-side data model: the typed blocks produced by the upstream
//! content generator, and the consumable image pool.
//!
//! The wire format, prompt construction, and streaming behavior of the
//! generator are out of scope — only the discriminated union below is the
//! contract with this engine.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Content blocks
// ────────────────────────────────────────────────────────────────────────────

/// One `{title, text}` entry of a content block's item list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One unit of generated content destined for one or more slides.
///
/// `offset` marks a block that is the Nth fragment of a split larger block:
/// it equals the count of items already emitted for the logical block and
/// drives `itemNumber` slot numbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentBlock {
    Cover {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        text: Option<String>,
        /// Rich-markup variant of the cover body, bound verbatim when present.
        #[serde(default)]
        html: Option<String>,
        /// Prompt for external background-image generation, when requested.
        #[serde(default)]
        generate_background: Option<String>,
    },
    Contents {
        #[serde(default)]
        items: Vec<String>,
        #[serde(default)]
        offset: usize,
    },
    Content {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        header: Option<String>,
        #[serde(default)]
        footer: Option<String>,
        /// True when `content` carries verbatim rich markup for an html slot.
        #[serde(default)]
        html: bool,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        items: Vec<ContentItem>,
        #[serde(default)]
        offset: usize,
    },
    Transition {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        text: Option<String>,
    },
    End {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Image pool
// ────────────────────────────────────────────────────────────────────────────

/// A pooled image resource available for allocation to image slots.
/// Consumable: once allocated it is removed from the pool for the rest of
/// the synthesis pass (unless the pool runs dry, in which case reuse is
/// permitted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePoolItem {
    pub id: String,
    pub src: String,
    pub width: f64,
    pub height: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
