//! Template selection — ranks a kind-filtered template list against a
//! block's shape and returns every equally-ranked candidate.
//!
//! The caller picks uniformly at random among the returned set, which gives
//! visual variety across otherwise-identical blocks. Selection never fails
//! on a non-empty input list: every criterion degrades through a fallback
//! before giving up.

use rand::Rng;

use crate::models::slides::{SlotRole, Template};

/// Filters `content` templates by header/footer presence, matching the
/// block's own pattern exactly (has-header-only, has-footer-only, has-both,
/// has-neither). An empty result falls back to the unfiltered list.
pub fn filter_header_footer<'a>(
    templates: &[&'a Template],
    has_header: bool,
    has_footer: bool,
) -> Vec<&'a Template> {
    let matched: Vec<&Template> = templates
        .iter()
        .copied()
        .filter(|t| {
            t.has_slot_with_role(SlotRole::Header) == has_header
                && t.has_slot_with_role(SlotRole::Footer) == has_footer
        })
        .collect();
    if matched.is_empty() {
        templates.to_vec()
    } else {
        matched
    }
}

/// Selects the best-count candidates for `n` slots of `role`.
///
/// For `n == 1`, a "plain paragraph" layout (no slots of the target role,
/// exactly one title and one content slot) is preferred when one exists.
/// Otherwise the winning count is the minimal count `>= n`, falling back to
/// the maximal available count when no template reaches `n`. All templates
/// sharing the winning count are returned.
pub fn select_by_count<'a>(
    templates: &[&'a Template],
    role: SlotRole,
    n: usize,
) -> Vec<&'a Template> {
    if templates.is_empty() {
        return Vec::new();
    }

    if n == 1 {
        let plain: Vec<&Template> = templates
            .iter()
            .copied()
            .filter(|t| {
                t.role_count(role) == 0
                    && t.role_count(SlotRole::Title) == 1
                    && t.role_count(SlotRole::Content) == 1
            })
            .collect();
        if !plain.is_empty() {
            return plain;
        }
    }

    let winning = templates
        .iter()
        .map(|t| t.role_count(role))
        .filter(|&count| count >= n)
        .min()
        .or_else(|| templates.iter().map(|t| t.role_count(role)).max());

    let Some(winning) = winning else {
        return Vec::new();
    };

    templates
        .iter()
        .copied()
        .filter(|t| t.role_count(role) == winning)
        .collect()
}

/// Uniform random choice among equally-ranked candidates.
pub fn choose<'a>(candidates: &[&'a Template], rng: &mut impl Rng) -> Option<&'a Template> {
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slides::{SlideKind, SlideSize, SlotKind, TemplateSlot};
    use uuid::Uuid;

    fn text_slot(role: SlotRole) -> TemplateSlot {
        TemplateSlot {
            id: Uuid::new_v4(),
            kind: SlotKind::Text,
            role: Some(role),
            left: 0.0,
            top: 0.0,
            width: 300.0,
            height: 60.0,
            rotate: 0.0,
            markup: Some("<p style=\"font-size: 18px;\">x</p>".to_string()),
            src: None,
            clip: None,
            line_height: None,
        }
    }

    fn template(roles: &[SlotRole]) -> Template {
        Template {
            id: Uuid::new_v4(),
            kind: SlideKind::Content,
            size: SlideSize::default(),
            background: None,
            slots: roles.iter().map(|&r| text_slot(r)).collect(),
        }
    }

    fn items(count: usize) -> Template {
        template(&vec![SlotRole::Item; count])
    }

    #[test]
    fn test_minimal_count_at_or_above_n_wins() {
        let t2 = items(2);
        let t4 = items(4);
        let t6 = items(6);
        let all = [&t2, &t4, &t6];
        let picked = select_by_count(&all, SlotRole::Item, 3);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, t4.id, "closest count >= n must win");
    }

    #[test]
    fn test_falls_back_to_max_when_all_below_n() {
        let t2 = items(2);
        let t3 = items(3);
        let all = [&t2, &t3];
        let picked = select_by_count(&all, SlotRole::Item, 5);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, t3.id);
    }

    #[test]
    fn test_all_tied_candidates_returned() {
        let a = items(4);
        let b = items(4);
        let c = items(2);
        let all = [&a, &b, &c];
        let picked = select_by_count(&all, SlotRole::Item, 4);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_single_item_prefers_plain_paragraph_layout() {
        let with_items = items(1);
        let plain = template(&[SlotRole::Title, SlotRole::Content]);
        let all = [&with_items, &plain];
        let picked = select_by_count(&all, SlotRole::Item, 1);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, plain.id);
    }

    #[test]
    fn test_single_item_without_plain_layout_uses_counts() {
        let one = items(1);
        let three = items(3);
        let all = [&one, &three];
        let picked = select_by_count(&all, SlotRole::Item, 1);
        assert_eq!(picked[0].id, one.id);
    }

    #[test]
    fn test_header_footer_pattern_matched_exactly() {
        let neither = items(2);
        let header_only = template(&[SlotRole::Header, SlotRole::Item, SlotRole::Item]);
        let both = template(&[
            SlotRole::Header,
            SlotRole::Footer,
            SlotRole::Item,
            SlotRole::Item,
        ]);
        let all = [&neither, &header_only, &both];

        let picked = filter_header_footer(&all, true, false);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, header_only.id);

        let picked = filter_header_footer(&all, true, true);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, both.id);
    }

    #[test]
    fn test_header_footer_miss_falls_back_to_full_list() {
        let neither = items(2);
        let all = [&neither];
        let picked = filter_header_footer(&all, true, true);
        assert_eq!(picked.len(), 1, "no pattern match keeps the full list");
    }

    #[test]
    fn test_adding_worse_candidates_keeps_exact_winner() {
        let exact = items(4);
        let small_a = items(1);
        let small_b = items(2);

        let base = [&exact];
        let extended = [&exact, &small_a, &small_b];
        let from_base = select_by_count(&base, SlotRole::Item, 4);
        let from_extended = select_by_count(&extended, SlotRole::Item, 4);
        assert_eq!(from_base[0].id, exact.id);
        assert_eq!(
            from_extended[0].id, exact.id,
            "candidates below n must never displace an exact match"
        );
    }

    #[test]
    fn test_choose_empty_returns_none() {
        let picked: Option<&Template> = choose(&[], &mut rand::rng());
        assert!(picked.is_none());
    }
}
