//! Page windows over a remote collection

/// One request window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Page number (0-indexed)
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Page {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Iterator over the pages covering `[0, total)`
#[derive(Debug, Clone)]
pub struct Pages {
    total: usize,
    page_size: usize,
    next_index: usize,
}

impl Iterator for Pages {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        let start = self.next_index * self.page_size;
        if start >= self.total {
            return None;
        }
        let end = (start + self.page_size).min(self.total);
        let page = Page {
            index: self.next_index,
            start,
            end,
        };
        self.next_index += 1;
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total.saturating_sub(self.next_index * self.page_size);
        let n = remaining.div_ceil(self.page_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Pages {}

/// Pages of `page_size` items covering `[0, total)`, the last one possibly short
///
/// A zero page size is treated as one.
///
/// # Examples
/// ```
/// use krc_remote::sync::pages;
///
/// let windows: Vec<_> = pages(45, 20).map(|p| (p.start, p.end)).collect();
/// assert_eq!(windows, vec![(0, 20), (20, 40), (40, 45)]);
/// ```
pub fn pages(total: usize, page_size: usize) -> Pages {
    Pages {
        total,
        page_size: page_size.max(1),
        next_index: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_with_short_tail() {
        let all: Vec<Page> = pages(45, 20).collect();
        assert_eq!(
            all,
            vec![
                Page { index: 0, start: 0, end: 20 },
                Page { index: 1, start: 20, end: 40 },
                Page { index: 2, start: 40, end: 45 },
            ]
        );
    }

    #[test]
    fn test_pages_exact_boundary() {
        let all: Vec<Page> = pages(40, 20).collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].end, 40);
    }

    #[test]
    fn test_pages_smaller_than_one_page() {
        let all: Vec<Page> = pages(3, 20).collect();
        assert_eq!(all, vec![Page { index: 0, start: 0, end: 3 }]);
    }

    #[test]
    fn test_pages_empty_collection() {
        assert_eq!(pages(0, 20).count(), 0);
    }

    #[test]
    fn test_pages_cover_every_item_once() {
        for total in 0..=130 {
            for size in [1, 7, 20, 25, 64] {
                let mut covered = vec![0u8; total];
                for page in pages(total, size) {
                    assert!(!page.is_empty());
                    assert!(page.len() <= size);
                    for slot in &mut covered[page.start..page.end] {
                        *slot += 1;
                    }
                }
                assert!(covered.iter().all(|&c| c == 1), "total={} size={}", total, size);
                assert_eq!(pages(total, size).len(), total.div_ceil(size));
            }
        }
    }

    #[test]
    fn test_zero_page_size_treated_as_one() {
        assert_eq!(pages(3, 0).count(), 3);
    }
}
