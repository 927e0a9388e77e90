//! Tiering and pagination over a ranked result set.
//!
//! The first `free_count` offers are always visible; the tail is visible
//! only on the paid tier. Pagination windows operate over the visible
//! portion for the user's tier.

/// Free/paid split and page sizing.
#[derive(Debug, Clone, Copy)]
pub struct TierPolicy {
    pub free_count: usize,
    pub page_size: usize,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            free_count: 3,
            page_size: 5,
        }
    }
}

/// One paged window over the tier-visible range.
///
/// An out-of-range page is an empty window with `has_more = false`; callers
/// tell that apart from "no results at all" via `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageView {
    /// First visible offer index of this page (inclusive).
    pub start: usize,
    /// End of this page (exclusive). Equal to `start` for an empty page.
    pub end: usize,
    /// Whether the visible range extends past this page.
    pub has_more: bool,
    /// Offers visible at this tier.
    pub visible_count: usize,
    /// Offers hidden behind the paid gate.
    pub gated_count: usize,
    /// Total offers in the ranked set, regardless of tier.
    pub total: usize,
}

impl PageView {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

impl TierPolicy {
    /// How many offers this tier may see out of `total`.
    pub fn visible_count(&self, total: usize, is_paid: bool) -> usize {
        if is_paid {
            total
        } else {
            total.min(self.free_count)
        }
    }

    /// The window for page `page` (zero-based), clipped to the visible range.
    pub fn page(&self, total: usize, is_paid: bool, page: usize) -> PageView {
        let visible = self.visible_count(total, is_paid);
        let start = page.saturating_mul(self.page_size).min(visible);
        let end = page
            .saturating_add(1)
            .saturating_mul(self.page_size)
            .min(visible);
        PageView {
            start,
            end,
            has_more: end < visible,
            visible_count: visible,
            gated_count: total - visible,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TierPolicy {
        TierPolicy {
            free_count: 3,
            page_size: 5,
        }
    }

    #[test]
    fn free_tier_sees_only_the_head() {
        // 10 ranked offers, unpaid: 3 visible, 7 gated.
        let view = policy().page(10, false, 0);
        assert_eq!(view.visible_count, 3);
        assert_eq!(view.gated_count, 7);
        assert_eq!((view.start, view.end), (0, 3));
        assert!(!view.has_more);
    }

    #[test]
    fn paid_tier_sees_everything() {
        let view = policy().page(10, true, 0);
        assert_eq!(view.visible_count, 10);
        assert_eq!(view.gated_count, 0);
        assert_eq!((view.start, view.end), (0, 5));
        assert!(view.has_more);
    }

    #[test]
    fn pages_partition_the_visible_range() {
        // 12 visible offers, 3 pages of 5/5/2.
        let p = policy();
        let page0 = p.page(12, true, 0);
        let page1 = p.page(12, true, 1);
        let page2 = p.page(12, true, 2);

        assert_eq!((page0.start, page0.end, page0.has_more), (0, 5, true));
        assert_eq!((page1.start, page1.end, page1.has_more), (5, 10, true));
        assert_eq!((page2.start, page2.end, page2.has_more), (10, 12, false));
    }

    #[test]
    fn partition_has_no_gap_or_overlap() {
        let p = policy();
        for total in 0..40 {
            let mut covered = 0;
            let mut page = 0;
            loop {
                let view = p.page(total, true, page);
                assert_eq!(view.start, covered, "gap/overlap at total={total}");
                covered = view.end;
                if !view.has_more {
                    break;
                }
                page += 1;
            }
            assert_eq!(covered, total);
        }
    }

    #[test]
    fn has_more_matches_arithmetic() {
        let p = policy();
        for total in 0..30 {
            for page in 0..8 {
                let view = p.page(total, true, page);
                let expected = page * p.page_size + p.page_size < view.visible_count;
                assert_eq!(view.has_more, expected, "total={total} page={page}");
            }
        }
    }

    #[test]
    fn out_of_range_page_is_empty_but_distinguishable() {
        let beyond = policy().page(4, true, 7);
        assert!(beyond.is_empty());
        assert!(!beyond.has_more);
        assert_eq!(beyond.total, 4); // set was not empty, page was out of range

        let nothing = policy().page(0, true, 0);
        assert!(nothing.is_empty());
        assert_eq!(nothing.total, 0); // genuinely no results
    }

    #[test]
    fn gated_count_never_leaks_on_paid_tier() {
        for total in 0..20 {
            assert_eq!(policy().page(total, true, 0).gated_count, 0);
        }
    }

    #[test]
    fn fewer_offers_than_free_count() {
        let view = policy().page(2, false, 0);
        assert_eq!(view.visible_count, 2);
        assert_eq!(view.gated_count, 0);
        assert_eq!((view.start, view.end), (0, 2));
    }
}
