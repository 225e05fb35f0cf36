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
    models::{Author, NewAuthor, Validate},
    patch::Patch,
};

const IMMUTABLE_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

pub struct AuthorService<'a, B: StoreBackend> {
    store: &'a DocumentStore<B>,
}

impl<'a, B: StoreBackend> AuthorService<'a, B> {
    pub fn new(store: &'a DocumentStore<B>) -> Self {
        Self { store }
    }

    /// Lists authors. Field projections are not applied; authors are always returned whole.
    #[instrument(skip(self, criteria), fields(skip = criteria.skip, limit = criteria.limit))]
    pub async fn list(
        &self,
        criteria: &QueryCriteria,
        base_url: &str,
    ) -> CatalogResult<Page<Author>> {
        let authors = self.store.typed_collection::<Author>();

        let mut query = criteria.to_query();
        query.projection = None;

        let total = authors.count(criteria.filter.clone()).await?;
        let window = authors.query(query).await?;

        Ok(Page::builder(window)
            .with_total(total)
            .with_total_pages(criteria.total_pages(total))
            .with_links(criteria.links(base_url, total))
            .build())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> CatalogResult<Author> {
        self.store
            .typed_collection::<Author>()
            .get_one(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Author", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewAuthor) -> CatalogResult<Uuid> {
        let author = Author::new(input, Utc::now());
        author.validate()?;

        let id = author.id;
        self.store.typed_collection::<Author>().insert(vec![author]).await?;

        tracing::info!(%id, "author created");
        Ok(id)
    }

    #[instrument(skip(self, body))]
    pub async fn update(&self, id: Uuid, body: Value) -> CatalogResult<Author> {
        let current = self.get(id).await?;

        let mut patch = Patch::parse(body, IMMUTABLE_FIELDS)?;
        patch.set("updatedAt", Utc::now())?;
        let merged = patch.apply(&current)?;

        self.store
            .typed_collection::<Author>()
            .set_fields(id, patch.changed_fields(&merged)?)
            .await?
            .ok_or_else(|| CatalogError::not_found("Author", id))
    }

    /// Deletes an author. Books keep their reference; it is dropped when the book is read.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        let removed = self.store.typed_collection::<Author>().delete(vec![id]).await?;

        if removed == 0 {
            return Err(CatalogError::not_found("Author", id));
        }

        tracing::info!(%id, "author deleted");
        Ok(())
    }
}
