// Pagination over the filtered asset view

/// Number of rows per page in the asset list
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page window of a filtered list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Requested page after clamping, 1-based
    pub current_page: usize,
    /// Always at least 1, even for an empty list
    pub total_pages: usize,
    /// 1-based inclusive bounds for "showing X-Y of Z"; both 0 when empty
    pub start_index: usize,
    pub end_index: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Page controls only render when there is somewhere to go
    pub fn shows_controls(&self) -> bool {
        self.total_pages > 1
    }
}

/// Number of pages needed for `len` items, never less than 1
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Clamp a requested page into `[1, total_pages]`
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slice out one page. Out-of-range requests clamp instead of failing.
pub fn paginate<T: Clone>(filtered: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = filtered.len();
    let total_pages = total_pages(total_items, page_size);
    let current_page = clamp_page(page, total_pages);

    let start = (current_page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let items = filtered[start..end].to_vec();

    let (start_index, end_index) = if total_items == 0 { (0, 0) } else { (start + 1, end) };

    Page {
        items,
        current_page,
        total_pages,
        start_index,
        end_index,
        total_items,
    }
}

/// Entry in the numbered page control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Page(usize),
    Ellipsis,
}

/// Numbered buttons for the page control
///
/// Page 1 and the last page are always shown, as is every page within one
/// of the current page. Page 2 and the second-to-last page turn into an
/// ellipsis when hidden; every other hidden page is dropped, so there is at
/// most one ellipsis on each side of the current page.
pub fn page_buttons(current_page: usize, total_pages: usize) -> Vec<PageButton> {
    let total_pages = total_pages.max(1);
    let current_page = clamp_page(current_page, total_pages);

    let mut buttons = Vec::new();
    for page in 1..=total_pages {
        let near_current = page.abs_diff(current_page) <= 1;
        let first_or_last = page == 1 || page == total_pages;

        if near_current || first_or_last {
            buttons.push(PageButton::Page(page));
        } else if page == 2 || page == total_pages - 1 {
            buttons.push(PageButton::Ellipsis);
        }
    }
    buttons
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageButton::{Ellipsis, Page as P};

    fn numbers(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
        // Zero page size is treated as 1
        assert_eq!(total_pages(3, 0), 3);
    }

    #[test]
    fn test_request_past_the_end_clamps_to_last_page() {
        let records = numbers(25);
        let page = paginate(&records, 4, 10);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!((page.start_index, page.end_index), (21, 25));
        assert!(page.has_prev());
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_zero_clamps_to_first_page() {
        let records = numbers(25);
        let page = paginate(&records, 0, 10);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.items, numbers(10));
        assert!(!page.has_prev());
        assert!(page.has_next());
    }

    #[test]
    fn test_empty_list() {
        let records: Vec<usize> = Vec::new();
        let page = paginate(&records, 3, 10);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert_eq!((page.start_index, page.end_index), (0, 0));
        assert!(!page.shows_controls());
    }

    #[test]
    fn test_pages_reconstruct_the_list() {
        for len in [0, 1, 9, 10, 11, 25, 30, 31] {
            for size in [1, 3, 10] {
                let records = numbers(len);
                let total = total_pages(len, size);
                let mut rebuilt = Vec::new();
                for n in 1..=total {
                    let page = paginate(&records, n, size);
                    assert!(page.current_page >= 1 && page.current_page <= page.total_pages);
                    rebuilt.extend(page.items);
                }
                assert_eq!(rebuilt, records, "len={len} size={size}");
            }
        }
    }

    #[test]
    fn test_buttons_single_page() {
        assert_eq!(page_buttons(1, 1), vec![P(1)]);
    }

    #[test]
    fn test_buttons_small_range_has_no_ellipsis() {
        assert_eq!(page_buttons(2, 3), vec![P(1), P(2), P(3)]);
    }

    #[test]
    fn test_buttons_at_start() {
        assert_eq!(page_buttons(1, 10), vec![P(1), P(2), Ellipsis, P(10)]);
    }

    #[test]
    fn test_buttons_in_middle() {
        assert_eq!(
            page_buttons(5, 10),
            vec![P(1), Ellipsis, P(4), P(5), P(6), Ellipsis, P(10)]
        );
    }

    #[test]
    fn test_buttons_at_end() {
        assert_eq!(page_buttons(10, 10), vec![P(1), Ellipsis, P(9), P(10)]);
    }

    #[test]
    fn test_buttons_single_hidden_page_becomes_ellipsis() {
        // Page 3 of 4 is hidden and is the second-to-last page
        assert_eq!(page_buttons(1, 4), vec![P(1), P(2), Ellipsis, P(4)]);
    }

    #[test]
    fn test_buttons_near_edge_no_left_ellipsis() {
        assert_eq!(page_buttons(3, 10), vec![P(1), P(2), P(3), P(4), Ellipsis, P(10)]);
    }

    #[test]
    fn test_buttons_at_most_one_ellipsis_per_side() {
        for total in 1..=15 {
            for current in 1..=total {
                let buttons = page_buttons(current, total);
                let pos = buttons.iter().position(|b| *b == P(current)).unwrap();
                let left = buttons[..pos].iter().filter(|b| **b == Ellipsis).count();
                let right = buttons[pos..].iter().filter(|b| **b == Ellipsis).count();
                assert!(left <= 1 && right <= 1, "current={current} total={total}");
                assert_eq!(buttons.first(), Some(&P(1)));
                assert_eq!(buttons.last(), Some(&P(total)));
            }
        }
    }
}
