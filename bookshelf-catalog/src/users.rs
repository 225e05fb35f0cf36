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
    models::{NewUser, User, Validate},
    patch::Patch,
};

/// Purchase history is only changed through [`PurchaseService`](crate::purchases::PurchaseService).
const IMMUTABLE_FIELDS: &[&str] = &["id", "purchaseHistory", "createdAt", "updatedAt"];

pub struct UserService<'a, B: StoreBackend> {
    store: &'a DocumentStore<B>,
}

impl<'a, B: StoreBackend> UserService<'a, B> {
    pub fn new(store: &'a DocumentStore<B>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, criteria), fields(skip = criteria.skip, limit = criteria.limit))]
    pub async fn list(
        &self,
        criteria: &QueryCriteria,
        base_url: &str,
    ) -> CatalogResult<Page<User>> {
        let users = self.store.typed_collection::<User>();

        let mut query = criteria.to_query();
        query.projection = None;

        let total = users.count(criteria.filter.clone()).await?;
        let window = users.query(query).await?;

        Ok(Page::builder(window)
            .with_total(total)
            .with_total_pages(criteria.total_pages(total))
            .with_links(criteria.links(base_url, total))
            .build())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> CatalogResult<User> {
        self.store
            .typed_collection::<User>()
            .get_one(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("User", id))
    }

    /// Registers a user with an empty purchase history.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewUser) -> CatalogResult<Uuid> {
        let user = User::new(input, Utc::now());
        user.validate()?;

        let id = user.id;
        self.store.typed_collection::<User>().insert(vec![user]).await?;

        tracing::info!(%id, "user created");
        Ok(id)
    }

    #[instrument(skip(self, body))]
    pub async fn update(&self, id: Uuid, body: Value) -> CatalogResult<User> {
        let current = self.get(id).await?;

        let mut patch = Patch::parse(body, IMMUTABLE_FIELDS)?;
        patch.set("updatedAt", Utc::now())?;
        let merged = patch.apply(&current)?;

        self.store
            .typed_collection::<User>()
            .set_fields(id, patch.changed_fields(&merged)?)
            .await?
            .ok_or_else(|| CatalogError::not_found("User", id))
    }

    /// Deletes a user together with their purchase history.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        let removed = self.store.typed_collection::<User>().delete(vec![id]).await?;

        if removed == 0 {
            return Err(CatalogError::not_found("User", id));
        }

        tracing::info!(%id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{new_user, store};

    #[tokio::test]
    async fn test_create_starts_with_empty_history() {
        let store = store();
        let users = UserService::new(&store);

        let id = users.create(new_user("Paul")).await.unwrap();
        let user = users.get(id).await.unwrap();

        assert_eq!(user.email, "paul@arrakis.example");
        assert!(user.purchase_history.is_empty());
    }

    #[tokio::test]
    async fn test_update_ignores_history_and_identity() {
        let store = store();
        let users = UserService::new(&store);
        let id = users.create(new_user("Paul")).await.unwrap();

        let updated = users
            .update(
                id,
                json!({
                    "id": Uuid::new().to_string(),
                    "purchaseHistory": [{ "title": "forged" }],
                    "dateOfBirth": "1965-13-45",
                    "email": "muaddib@arrakis.example",
                }),
            )
            .await;
        assert!(matches!(updated, Err(CatalogError::Validation(_))));

        let updated = users
            .update(
                id,
                json!({
                    "id": Uuid::new().to_string(),
                    "purchaseHistory": [{ "title": "forged" }],
                    "dateOfBirth": "1965-08-01",
                    "email": "muaddib@arrakis.example",
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.id, id);
        assert!(updated.purchase_history.is_empty());
        assert_eq!(updated.email, "muaddib@arrakis.example");
        assert_eq!(updated.date_of_birth.map(|d| d.to_string()).as_deref(), Some("1965-08-01"));
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let store = store();
        let users = UserService::new(&store);

        let mut input = new_user("Paul");
        input.email = "paul".to_string();

        assert!(matches!(users.create(input).await, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_not_found() {
        let store = store();

        let result = UserService::new(&store).delete(Uuid::new()).await;
        assert!(matches!(result, Err(CatalogError::NotFound { entity: "User", .. })));
    }
}
