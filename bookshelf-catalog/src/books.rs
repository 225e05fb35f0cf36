//! Book listing and management.

use std::collections::{HashMap, HashSet};

use bookshelf::{
    backend::StoreBackend,
    page::Page,
    querystring::QueryCriteria,
    store::DocumentStore,
};
use bson::Uuid;
use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use crate::{
    error::{CatalogError, CatalogResult},
    models::{Author, AuthorSummary, Book, BookView, NewBook, ProjectedBook, Validate},
    patch::Patch,
};

const IMMUTABLE_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

pub struct BookService<'a, B: StoreBackend> {
    store: &'a DocumentStore<B>,
}

impl<'a, B: StoreBackend> BookService<'a, B> {
    pub fn new(store: &'a DocumentStore<B>) -> Self {
        Self { store }
    }

    /// Returns one window of the books matching `criteria`, with author references
    /// replaced by summaries.
    ///
    /// The total is counted with the same filter before the window is fetched; the two reads
    /// are not atomic.
    #[instrument(skip(self, criteria), fields(skip = criteria.skip, limit = criteria.limit))]
    pub async fn list(
        &self,
        criteria: &QueryCriteria,
        base_url: &str,
    ) -> CatalogResult<Page<BookView>> {
        let books = self.store.typed_collection::<Book>().untyped();

        let total = books.count(criteria.filter.clone()).await?;
        let window = books
            .query(criteria.to_query())
            .await?
            .into_iter()
            .map(bson::de::deserialize_from_bson::<ProjectedBook>)
            .collect::<Result<Vec<_>, _>>()?;

        let author_ids = window
            .iter()
            .filter_map(|book| book.authors.as_deref())
            .flatten()
            .copied()
            .collect::<HashSet<_>>();
        let authors = self.author_summaries(author_ids).await?;

        tracing::debug!(total, returned = window.len(), "listed books");

        Ok(Page::builder(window)
            .with_total(total)
            .with_total_pages(criteria.total_pages(total))
            .with_links(criteria.links(base_url, total))
            .build()
            .map(|book| book.resolve(&authors)))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> CatalogResult<BookView> {
        let book = self.find(id).await?;
        self.view(book).await
    }

    /// Stores a new book and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if the book is invalid or references an author
    /// that does not exist.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: NewBook) -> CatalogResult<Uuid> {
        let book = Book::new(input, Utc::now());
        book.validate()?;
        self.ensure_authors_exist(&book.authors).await?;

        let id = book.id;
        self.store.typed_collection::<Book>().insert(vec![book]).await?;

        tracing::info!(%id, "book created");
        Ok(id)
    }

    /// Applies a partial update. `id` and the timestamps cannot be patched.
    #[instrument(skip(self, body))]
    pub async fn update(&self, id: Uuid, body: Value) -> CatalogResult<BookView> {
        let current = self.find(id).await?;

        let mut patch = Patch::parse(body, IMMUTABLE_FIELDS)?;
        patch.set("updatedAt", Utc::now())?;

        let merged = patch.apply(&current)?;
        if patch.contains("authors") {
            self.ensure_authors_exist(&merged.authors).await?;
        }

        let updated = self
            .store
            .typed_collection::<Book>()
            .set_fields(id, patch.changed_fields(&merged)?)
            .await?
            .ok_or_else(|| CatalogError::not_found("Book", id))?;

        self.view(updated).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        let removed = self.store.typed_collection::<Book>().delete(vec![id]).await?;

        if removed == 0 {
            return Err(CatalogError::not_found("Book", id));
        }

        tracing::info!(%id, "book deleted");
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CatalogResult<Book> {
        self.store
            .typed_collection::<Book>()
            .get_one(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Book", id))
    }

    async fn view(&self, book: Book) -> CatalogResult<BookView> {
        let authors = self
            .author_summaries(book.authors.iter().copied().collect())
            .await?;
        Ok(ProjectedBook::from(book).resolve(&authors))
    }

    /// Fetches the summaries of all referenced authors in one batch.
    async fn author_summaries(
        &self,
        ids: HashSet<Uuid>,
    ) -> CatalogResult<HashMap<Uuid, AuthorSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .store
            .typed_collection::<Author>()
            .get(ids.into_iter().collect())
            .await?
            .into_iter()
            .map(|author| (author.id, AuthorSummary::from(author)))
            .collect())
    }

    async fn ensure_authors_exist(&self, ids: &[Uuid]) -> CatalogResult<()> {
        let found = self.author_summaries(ids.iter().copied().collect()).await?;

        match ids.iter().find(|id| !found.contains_key(id)) {
            Some(missing) => Err(CatalogError::validation(format!(
                "author {missing} does not exist"
            ))),
            None => Ok(()),
        }
    }
}
