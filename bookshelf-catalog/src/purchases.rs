//! Purchase history.
//!
//! Records are embedded in their user's document and every change goes through one of the
//! store's atomic array operations, so concurrent purchases by the same user never lose a
//! record.

use bookshelf::{
    backend::{ArrayElementUpdate, StoreBackend},
    query::ElementMatch,
    store::DocumentStore,
};
use bson::Uuid;
use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use crate::{
    error::{CatalogError, CatalogResult},
    models::{Book, PurchaseRecord, User},
    patch::Patch,
};

const HISTORY_FIELD: &str = "purchaseHistory";
const RECORD: &str = "Purchase record";

pub struct PurchaseService<'a, B: StoreBackend> {
    store: &'a DocumentStore<B>,
}

impl<'a, B: StoreBackend> PurchaseService<'a, B> {
    pub fn new(store: &'a DocumentStore<B>) -> Self {
        Self { store }
    }

    /// Records a purchase of `book_id` by `user_id` and returns the updated user.
    ///
    /// The record is a snapshot of the book with its own id; later changes to the book do
    /// not affect it.
    #[instrument(skip(self))]
    pub async fn purchase(&self, user_id: Uuid, book_id: Uuid) -> CatalogResult<User> {
        let book = self
            .store
            .typed_collection::<Book>()
            .get_one(book_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Book", book_id))?;

        let record = PurchaseRecord::snapshot(&book, Utc::now());
        let record_id = record.id;

        let user = self
            .store
            .typed_collection::<User>()
            .push_to_array(user_id, HISTORY_FIELD, bson::ser::serialize_to_bson(&record)?)
            .await?
            .ok_or_else(|| CatalogError::not_found("User", user_id))?;

        tracing::info!(%record_id, "purchase recorded");
        Ok(user)
    }

    /// Returns the user's records, oldest first.
    #[instrument(skip(self))]
    pub async fn list_history(&self, user_id: Uuid) -> CatalogResult<Vec<PurchaseRecord>> {
        Ok(self.user(user_id).await?.purchase_history)
    }

    #[instrument(skip(self))]
    pub async fn get_history_item(
        &self,
        user_id: Uuid,
        record_id: Uuid,
    ) -> CatalogResult<PurchaseRecord> {
        self.user(user_id)
            .await?
            .history_item(record_id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(RECORD, record_id))
    }

    /// Merges `body` over one record and returns the updated user. The record id cannot be
    /// changed; fields missing from `body` keep their values.
    #[instrument(skip(self, body))]
    pub async fn update_history_item(
        &self,
        user_id: Uuid,
        record_id: Uuid,
        body: Value,
    ) -> CatalogResult<User> {
        let current = self.get_history_item(user_id, record_id).await?;

        let patch = Patch::parse(body, &["id"])?;
        let merged = patch.apply(&current)?;

        let outcome = self
            .store
            .typed_collection::<User>()
            .set_in_array(
                user_id,
                HISTORY_FIELD,
                ElementMatch::by_id(record_id),
                patch.changed_fields(&merged)?,
            )
            .await?;

        match outcome {
            ArrayElementUpdate::Updated(user) => Ok(user),
            ArrayElementUpdate::DocumentMissing => Err(CatalogError::not_found("User", user_id)),
            ArrayElementUpdate::ElementMissing => Err(CatalogError::not_found(RECORD, record_id)),
        }
    }

    /// Removes one record and returns the updated user. Removing a record that is not there
    /// leaves the history unchanged.
    #[instrument(skip(self))]
    pub async fn remove_history_item(&self, user_id: Uuid, record_id: Uuid) -> CatalogResult<User> {
        self.store
            .typed_collection::<User>()
            .pull_from_array(user_id, HISTORY_FIELD, ElementMatch::by_id(record_id))
            .await?
            .ok_or_else(|| CatalogError::not_found("User", user_id))
    }

    async fn user(&self, user_id: Uuid) -> CatalogResult<User> {
        self.store
            .typed_collection::<User>()
            .get_one(user_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("User", user_id))
    }
}
