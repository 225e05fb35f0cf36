//! Pagination result types.
//!
//! A listing returns a [`Page`]: one window of items plus the total match count, the number
//! of pages and navigation [`PageLinks`] produced by
//! [`QueryCriteria::links`](crate::querystring::QueryCriteria::links).

use serde::{Deserialize, Serialize};

/// Navigation links for a paginated listing.
///
/// A link is `None` when following it would leave the result range: there is no `previous`
/// or `first` on the first window, and no `next` or `last` once the window reaches the end.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// A single page of results.
///
/// # Example
///
/// ```ignore
/// use bookshelf::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["item1".to_string()])
///     .with_total(100)
///     .with_total_pages(10)
///     .build();
///
/// assert_eq!(page.items.len(), 1);
/// assert_eq!(page.total, 100);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Total count of matching items across all pages.
    pub total: usize,
    /// Number of pages of the current size needed to cover `total`.
    pub total_pages: usize,
    /// Navigation links.
    pub links: PageLinks,
}

impl<T> Page<T> {
    /// Creates a new builder for constructing a page.
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Converts every item, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            total_pages: self.total_pages,
            links: self.links,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            total_pages: 0,
            links: PageLinks::default(),
        }
    }
}

/// Builder for constructing [`Page`] instances with fluent API.
pub struct PageBuilder<T> {
    items: Vec<T>,
    total: usize,
    total_pages: usize,
    links: PageLinks,
}

impl<T> PageBuilder<T> {
    /// Creates a new builder with the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            total: 0,
            total_pages: 0,
            links: PageLinks::default(),
        }
    }

    /// Sets the total count of items across all pages.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    /// Sets the number of pages.
    pub fn with_total_pages(mut self, total_pages: usize) -> Self {
        self.total_pages = total_pages;
        self
    }

    /// Sets the navigation links.
    pub fn with_links(mut self, links: PageLinks) -> Self {
        self.links = links;
        self
    }

    /// Builds and returns the final [`Page`] instance.
    pub fn build(self) -> Page<T> {
        Page {
            items: self.items,
            total: self.total,
            total_pages: self.total_pages,
            links: self.links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_omit_missing_entries_when_serialized() {
        let links = PageLinks {
            next: Some("http://localhost/books?skip=10&limit=10".to_string()),
            ..PageLinks::default()
        };

        let json = serde_json::to_value(&links).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "next": "http://localhost/books?skip=10&limit=10" })
        );
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::builder(vec![1, 2, 3])
            .with_total(30)
            .with_total_pages(10)
            .build()
            .map(|n| n * 2);

        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.total, 30);
        assert_eq!(page.total_pages, 10);
    }
}
