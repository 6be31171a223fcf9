//! Paged query results.
//!
//! A [`Page`] is what the count-and-fetch find returns: the documents of one
//! window plus the total number of documents matching the filter.

use serde::{Deserialize, Serialize};

use crate::query::Query;

/// A single page of results.
///
/// # Example
///
/// ```ignore
/// use mongolayer::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["item1".to_string()])
///     .with_count(100)
///     .with_next_offset(Some(1))
///     .build();
///
/// assert_eq!(page.items.len(), 1);
/// assert_eq!(page.count, 100);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Total number of documents matching the filter.
    pub count: u64,
    /// Offset of the following page, if any documents remain.
    pub next_offset: Option<usize>,
    /// Offset of the preceding page, if this is not the first one.
    pub previous_offset: Option<usize>,
}

impl<T> Page<T> {
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Builds the page fetched by `query` out of `count` matching documents.
    ///
    /// Without a limit (or with a limit of zero, which the server reads the
    /// same way) the page is everything after the offset, so there is never a
    /// next page and the previous page starts at zero.
    pub fn from_query(items: Vec<T>, count: u64, query: &Query) -> Self {
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.filter(|&limit| limit > 0);

        let next_offset = limit.and_then(|limit| {
            let next = offset.saturating_add(limit);
            ((next as u64) < count).then_some(next)
        });
        let previous_offset = (offset > 0)
            .then(|| offset.saturating_sub(limit.unwrap_or(offset)));

        Page::builder(items)
            .with_count(count)
            .with_next_offset(next_offset)
            .with_previous_offset(previous_offset)
            .build()
    }

    pub fn has_next(&self) -> bool {
        self.next_offset.is_some()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            next_offset: None,
            previous_offset: None,
        }
    }
}

/// Builder for [`Page`].
pub struct PageBuilder<T> {
    items: Vec<T>,
    count: u64,
    next_offset: Option<usize>,
    previous_offset: Option<usize>,
}

impl<T> PageBuilder<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            count: 0,
            next_offset: None,
            previous_offset: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_next_offset(mut self, next_offset: Option<usize>) -> Self {
        self.next_offset = next_offset;
        self
    }

    pub fn with_previous_offset(mut self, previous_offset: Option<usize>) -> Self {
        self.previous_offset = previous_offset;
        self
    }

    pub fn build(self) -> Page<T> {
        Page {
            items: self.items,
            count: self.count,
            next_offset: self.next_offset,
            previous_offset: self.previous_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let query = Query::builder().limit(10).build();
        let page = Page::from_query(vec![1; 10], 25, &query);

        assert_eq!(page.count, 25);
        assert_eq!(page.next_offset, Some(10));
        assert_eq!(page.previous_offset, None);
        assert!(page.has_next());
    }

    #[test]
    fn test_zero_limit_means_no_limit() {
        let query = Query::builder().limit(0).offset(10).build();
        let page = Page::from_query(vec![1; 15], 25, &query);

        assert_eq!(page.next_offset, None);
        assert_eq!(page.previous_offset, Some(0));
        assert!(!page.has_next());
    }

    #[test]
    fn test_middle_and_last_page() {
        let query = Query::builder().limit(10).offset(10).build();
        let page = Page::from_query(vec![1; 10], 25, &query);
        assert_eq!(page.next_offset, Some(20));
        assert_eq!(page.previous_offset, Some(0));

        let query = Query::builder().limit(10).offset(20).build();
        let page = Page::from_query(vec![1; 5], 25, &query);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.previous_offset, Some(10));
    }

    #[test]
    fn test_unlimited_page_has_no_next() {
        let query = Query::builder().offset(3).build();
        let page = Page::from_query(vec![1, 2], 5, &query);

        assert_eq!(page.next_offset, None);
        assert_eq!(page.previous_offset, Some(0));
    }

    #[test]
    fn test_offset_shorter_than_limit() {
        let query = Query::builder().limit(10).offset(4).build();
        let page = Page::from_query(Vec::<i32>::new(), 30, &query);

        assert_eq!(page.previous_offset, Some(0));
        assert_eq!(page.next_offset, Some(14));
    }
}
