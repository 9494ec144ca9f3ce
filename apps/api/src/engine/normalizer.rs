//! Block normalization — splits oversized item lists across several blocks.
//!
//! Templates are drawn for specific item counts, so the split is bucketed
//! rather than even: each tier names the slice sizes that map onto designed
//! layouts. Fragments after the first carry a cumulative `offset` so ordinal
//! numbering stays continuous across the split.

use crate::models::blocks::ContentBlock;

/// Slice sizes for a `content` block with `count` items, or `None` when the
/// count passes through unsplit.
///
/// Tiers: 5-6 split off 3; 7-8 split off 4; 9-10 slice as 3/3/rest; above 10
/// slice as 4/4/rest.
fn content_tier(count: usize) -> Option<Vec<usize>> {
    match count {
        5..=6 => Some(vec![3, count - 3]),
        7..=8 => Some(vec![4, count - 4]),
        9..=10 => Some(vec![3, 3, count - 6]),
        c if c > 10 => Some(vec![4, 4, count - 8]),
        _ => None,
    }
}

/// Slice sizes for a `contents` (table-of-contents) block. These run longer
/// than content tiers because the entries are short one-liners.
fn contents_tier(count: usize) -> Option<Vec<usize>> {
    match count {
        7 => Some(vec![5, 2]),
        8..=12 => Some(vec![6, count - 6]),
        13 => Some(vec![6, 5, 2]),
        c if c > 13 => Some(vec![6, 6, count - 12]),
        _ => None,
    }
}

/// Cuts `items` into the given slice sizes, pairing each fragment with the
/// cumulative count of items emitted before it.
fn slice_with_offsets<T: Clone>(items: &[T], sizes: &[usize]) -> Vec<(Vec<T>, usize)> {
    let mut fragments = Vec::with_capacity(sizes.len());
    let mut cursor = 0usize;
    for &size in sizes {
        let end = (cursor + size).min(items.len());
        fragments.push((items[cursor..end].to_vec(), cursor));
        cursor = end;
    }
    fragments
}

/// Expands one block into one or more blocks whose item counts fit template
/// capacity tiers. Blocks without an item list, and counts below every tier,
/// pass through unchanged. Never fails: malformed shapes degrade to no split.
pub fn normalize(block: ContentBlock) -> Vec<ContentBlock> {
    match block {
        ContentBlock::Content {
            title,
            header,
            footer,
            html,
            content,
            items,
            offset,
        } => {
            let Some(sizes) = content_tier(items.len()) else {
                return vec![ContentBlock::Content {
                    title,
                    header,
                    footer,
                    html,
                    content,
                    items,
                    offset,
                }];
            };
            slice_with_offsets(&items, &sizes)
                .into_iter()
                .map(|(fragment, cut_offset)| ContentBlock::Content {
                    title: title.clone(),
                    header: header.clone(),
                    footer: footer.clone(),
                    html,
                    content: content.clone(),
                    items: fragment,
                    offset: offset + cut_offset,
                })
                .collect()
        }
        ContentBlock::Contents { items, offset } => {
            let Some(sizes) = contents_tier(items.len()) else {
                return vec![ContentBlock::Contents { items, offset }];
            };
            slice_with_offsets(&items, &sizes)
                .into_iter()
                .map(|(fragment, cut_offset)| ContentBlock::Contents {
                    items: fragment,
                    offset: offset + cut_offset,
                })
                .collect()
        }
        other => vec![other],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
