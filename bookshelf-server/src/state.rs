//! Application state shared across handlers.

use std::sync::Arc;

use bookshelf::{backend::StoreBackend, querystring::QueryTranslator, store::DocumentStore};
use bookshelf_catalog::models::{Author, Book, User};

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; gives access to the document store, the configuration and
/// one query translator per listing.
pub struct AppState<B: StoreBackend> {
    inner: Arc<AppStateInner<B>>,
}

struct AppStateInner<B: StoreBackend> {
    config: ServerConfig,
    store: DocumentStore<B>,
    book_queries: QueryTranslator,
    author_queries: QueryTranslator,
    user_queries: QueryTranslator,
}

impl<B: StoreBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<B: StoreBackend> AppState<B> {
    pub fn new(config: ServerConfig, store: DocumentStore<B>) -> Self {
        let translator = |fields: &[&str]| {
            QueryTranslator::new()
                .with_allowed_fields(fields.iter().copied())
                .with_unknown_fields(config.unknown_filters)
                .with_default_limit(config.default_limit)
                .with_max_limit(config.max_limit)
        };

        let book_queries = translator(Book::FILTERABLE_FIELDS);
        let author_queries = translator(Author::FILTERABLE_FIELDS);
        let user_queries = translator(User::FILTERABLE_FIELDS);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                book_queries,
                author_queries,
                user_queries,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &DocumentStore<B> {
        &self.inner.store
    }

    #[must_use]
    pub fn book_queries(&self) -> &QueryTranslator {
        &self.inner.book_queries
    }

    #[must_use]
    pub fn author_queries(&self) -> &QueryTranslator {
        &self.inner.author_queries
    }

    #[must_use]
    pub fn user_queries(&self) -> &QueryTranslator {
        &self.inner.user_queries
    }

    /// Absolute URL of `path` under the configured base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.config.base_url)
    }
}
