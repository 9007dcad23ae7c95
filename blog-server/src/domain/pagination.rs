use serde::Serialize;

pub const POSTS_PER_PAGE: i64 = 10;

/// Splits `total` ordered items into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(total: i64, per_page: i64) -> Self {
        Self {
            total: total.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Always at least one page, even for an empty result set.
    pub fn num_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    /// Turns the raw `?page=` value into a valid page number. Missing or
    /// non-numeric values give the first page; out-of-range numbers clamp to
    /// the nearest existing page.
    pub fn resolve(&self, raw: Option<&str>) -> i64 {
        raw.and_then(|value| value.trim().parse::<i64>().ok())
            .map(|number| number.clamp(1, self.num_pages()))
            .unwrap_or(1)
    }

    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> i64 {
        (self.number - 1).max(1)
    }

    pub fn next_page_number(&self) -> i64 {
        (self.number + 1).min(self.num_pages)
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_five_items_make_three_pages() {
        let items: Vec<i64> = (0..25).collect();
        let paginator = Paginator::new(items.len() as i64, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 3);

        let sizes: Vec<usize> = (1..=paginator.num_pages())
            .map(|number| {
                items
                    .iter()
                    .skip(paginator.offset(number) as usize)
                    .take(paginator.limit() as usize)
                    .count()
            })
            .collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let paginator = Paginator::new(0, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.resolve(Some("4")), 1);
    }

    #[test]
    fn resolve_clamps_and_defaults() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        assert_eq!(paginator.resolve(None), 1);
        assert_eq!(paginator.resolve(Some("2")), 2);
        assert_eq!(paginator.resolve(Some("last")), 1);
        assert_eq!(paginator.resolve(Some("99")), 3);
        assert_eq!(paginator.resolve(Some("0")), 1);
        assert_eq!(paginator.resolve(Some("-3")), 1);
    }

    #[test]
    fn page_navigation() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        let first = paginator.page(1, vec![(); 10]);
        assert!(!first.has_previous());
        assert!(first.has_next());
        assert_eq!(first.next_page_number(), 2);

        let last = paginator.page(3, vec![(); 5]);
        assert!(last.has_previous());
        assert!(!last.has_next());
        assert_eq!(last.previous_page_number(), 2);
        assert!(last.has_other_pages());
    }
}
