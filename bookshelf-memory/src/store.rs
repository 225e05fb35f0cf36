//! In-memory storage implementation for document stores.
//!
//! Documents are kept as BSON values in insertion-ordered maps behind an async-aware
//! read-write lock. Every single-document update runs under one write guard.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{Bson, Uuid};
use mea::rwlock::RwLock;

use bookshelf_core::{
    backend::{ArrayElementUpdate, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{ElementMatch, Expr, Query},
};

use crate::evaluator::{DocumentEvaluator, compare_documents, project};

/// Documents of one collection keyed by the string form of their ID, in insertion order.
type CollectionMap = bson::Document;
type StoreMap = std::collections::HashMap<String, CollectionMap>;

/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait to provide a fully functional
/// document store that operates entirely in memory using async-aware read-write locks.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries scan all documents in a collection (no indexing). Unsorted queries return
/// documents in insertion order.
///
/// # Example
///
/// ```ignore
/// use bookshelf_memory::InMemoryStore;
/// use bookshelf::backend::StoreBackend;
/// use bson::{Uuid, Bson, doc};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     let id = Uuid::new();
///     let doc = Bson::Document(doc! { "id": id, "firstName": "Frank" });
///     store.insert_documents(vec![(id, doc)], "authors").await?;
///
///     let docs = store.get_documents(vec![id], "authors").await?;
///     assert_eq!(docs.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (document_id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }
}

fn as_document_mut<'a>(
    doc: &'a mut Bson,
    id: &str,
    collection: &str,
) -> DocumentStoreResult<&'a mut bson::Document> {
    doc.as_document_mut().ok_or_else(|| {
        DocumentStoreError::InvalidDocument(format!(
            "stored value {id} in collection {collection} is not a document"
        ))
    })
}

fn array_mut<'a>(
    doc: &'a mut bson::Document,
    field: &str,
) -> DocumentStoreResult<Option<&'a mut Vec<Bson>>> {
    match doc.get_mut(field) {
        None => Ok(None),
        Some(Bson::Array(items)) => Ok(Some(items)),
        Some(other) => Err(DocumentStoreError::InvalidDocument(format!(
            "field {field} holds {:?}, expected an array",
            other.element_type()
        ))),
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        // Check the whole batch first so a conflict leaves the collection untouched.
        for (id, doc) in &documents {
            let key = id.to_string();

            if collection_map.contains_key(&key) {
                return Err(DocumentStoreError::DocumentAlreadyExists(key, collection.to_string()));
            }
            if !matches!(doc, Bson::Document(_)) {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "document {key} is not a map"
                )));
            }
        }

        for (id, doc) in documents {
            collection_map.insert(id.to_string(), doc);
        }

        Ok(())
    }

    async fn delete_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<usize> {
        let mut store = self.store.write().await;
        let Some(collection_map) = store.get_mut(collection) else {
            return Ok(0);
        };

        Ok(ids
            .into_iter()
            .filter(|id| collection_map.remove(id.to_string()).is_some())
            .count())
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        Ok(ids
            .into_iter()
            .filter_map(|id| collection_map.get(id.to_string()).cloned())
            .collect())
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut documents = match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(
                collection_map.values(),
                filter,
            )?,
            None => collection_map.values().cloned().collect(),
        };

        if !query.sort.is_empty() {
            // Stable, so ties keep insertion order.
            documents.sort_by(|a, b| compare_documents(a, b, &query.sort));
        }

        let window = documents
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX));

        Ok(match &query.projection {
            Some(projection) => window.map(|doc| project(doc, projection)).collect(),
            None => window.collect(),
        })
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<usize> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(0);
        };

        match filter {
            Some(filter) => {
                let mut count = 0;

                for doc in collection_map.values() {
                    if DocumentEvaluator::new(doc).evaluate(&filter)? {
                        count += 1;
                    }
                }

                Ok(count)
            }
            None => Ok(collection_map.len()),
        }
    }

    async fn set_fields(
        &self,
        id: Uuid,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>> {
        let mut store = self.store.write().await;
        let key = id.to_string();
        let Some(doc) = store
            .get_mut(collection)
            .and_then(|c| c.get_mut(&key))
        else {
            return Ok(None);
        };

        let map = as_document_mut(doc, &key, collection)?;
        for (field, value) in fields {
            map.insert(field, value);
        }

        Ok(Some(doc.clone()))
    }

    async fn push_to_array(
        &self,
        id: Uuid,
        field: &str,
        element: Bson,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>> {
        let mut store = self.store.write().await;
        let key = id.to_string();
        let Some(doc) = store
            .get_mut(collection)
            .and_then(|c| c.get_mut(&key))
        else {
            return Ok(None);
        };

        let map = as_document_mut(doc, &key, collection)?;
        match array_mut(map, field)? {
            Some(items) => items.push(element),
            None => {
                map.insert(field, Bson::Array(vec![element]));
            }
        }

        Ok(Some(doc.clone()))
    }

    async fn pull_from_array(
        &self,
        id: Uuid,
        field: &str,
        matcher: ElementMatch,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>> {
        let mut store = self.store.write().await;
        let key = id.to_string();
        let Some(doc) = store
            .get_mut(collection)
            .and_then(|c| c.get_mut(&key))
        else {
            return Ok(None);
        };

        let map = as_document_mut(doc, &key, collection)?;
        if let Some(items) = array_mut(map, field)? {
            let expr = matcher.to_expr();
            let mut pulled = Vec::with_capacity(items.len());

            for item in items.iter() {
                pulled.push(
                    matches!(item, Bson::Document(_))
                        && DocumentEvaluator::new(item).evaluate(&expr)?,
                );
            }

            let mut pulled = pulled.into_iter();
            items.retain(|_| !pulled.next().unwrap_or(false));
        }

        Ok(Some(doc.clone()))
    }

    async fn set_in_array(
        &self,
        id: Uuid,
        field: &str,
        matcher: ElementMatch,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<ArrayElementUpdate> {
        let mut store = self.store.write().await;
        let key = id.to_string();
        let Some(doc) = store
            .get_mut(collection)
            .and_then(|c| c.get_mut(&key))
        else {
            return Ok(ArrayElementUpdate::DocumentMissing);
        };

        let map = as_document_mut(doc, &key, collection)?;
        let Some(items) = array_mut(map, field)? else {
            return Ok(ArrayElementUpdate::ElementMissing);
        };

        let expr = matcher.to_expr();
        let mut target = None;

        for (index, item) in items.iter().enumerate() {
            if matches!(item, Bson::Document(_)) && DocumentEvaluator::new(item).evaluate(&expr)? {
                target = Some(index);
                break;
            }
        }

        let Some(element) = target
            .and_then(|index| items.get_mut(index))
            .and_then(Bson::as_document_mut)
        else {
            return Ok(ArrayElementUpdate::ElementMissing);
        };

        for (name, value) in fields {
            element.insert(name, value);
        }

        Ok(ArrayElementUpdate::Updated(doc.clone()))
    }

    async fn add_index(
        &self,
        _collection: &str,
        _field: &str,
        _unique: bool,
    ) -> DocumentStoreResult<()> {
        // No indexing in memory
        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use bookshelf_memory::InMemoryStore;
/// use bookshelf::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use bookshelf_core::{
        document::Document,
        query::{Filter, Projection, SortDirection},
        store::DocumentStore,
    };
    use bson::doc;
    use serde::{Deserialize, Serialize};

    use super::*;

    const BOOKS: &str = "books";

    async fn seeded() -> (InMemoryStore, Vec<Uuid>) {
        let store = InMemoryStore::new();
        let rows = [
            ("Dune", "fantasy", 12.5),
            ("It", "horror", 9.0),
            ("Emma", "romance", 4.0),
            ("Carrie", "horror", 7.5),
            ("SPQR", "history", 15.0),
        ];
        let mut ids = Vec::new();
        let mut documents = Vec::new();

        for (title, category, price) in rows {
            let id = Uuid::new();
            ids.push(id);
            documents.push((
                id,
                Bson::Document(doc! { "id": id, "title": title, "category": category, "price": price }),
            ));
        }

        store.insert_documents(documents, BOOKS).await.unwrap();
        (store, ids)
    }

    fn titles(docs: &[Bson]) -> Vec<&str> {
        docs.iter()
            .map(|d| d.as_document().unwrap().get_str("title").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates_without_partial_writes() {
        let (store, ids) = seeded().await;
        let fresh = Uuid::new();

        let result = store
            .insert_documents(
                vec![
                    (fresh, Bson::Document(doc! { "id": fresh })),
                    (ids[0], Bson::Document(doc! { "id": ids[0] })),
                ],
                BOOKS,
            )
            .await;

        assert!(matches!(result, Err(DocumentStoreError::DocumentAlreadyExists(_, _))));
        assert!(store.get_documents(vec![fresh], BOOKS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_counts_only_existing() {
        let (store, ids) = seeded().await;

        let removed = store
            .delete_documents(vec![ids[0], Uuid::new()], BOOKS)
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.count_documents(None, BOOKS).await.unwrap(), 4);
        assert_eq!(store.delete_documents(vec![ids[0]], "missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_windows() {
        let (store, _) = seeded().await;

        let query = Query::builder()
            .filter(Filter::gte("price", 7))
            .sort("category", SortDirection::Asc)
            .sort("price", SortDirection::Desc)
            .offset(1)
            .limit(2)
            .build();

        let docs = store.query_documents(query, BOOKS).await.unwrap();
        // fantasy(Dune) < history(SPQR) < horror(It 9.0, Carrie 7.5)
        assert_eq!(titles(&docs), vec!["SPQR", "It"]);
    }

    #[tokio::test]
    async fn test_unsorted_query_keeps_insertion_order() {
        let (store, _) = seeded().await;

        let docs = store.query_documents(Query::new(), BOOKS).await.unwrap();
        assert_eq!(titles(&docs), vec!["Dune", "It", "Emma", "Carrie", "SPQR"]);
    }

    #[tokio::test]
    async fn test_projection_keeps_identity() {
        let (store, _) = seeded().await;

        let query = Query::builder()
            .projection(Projection::Include(vec!["title".to_string()]))
            .limit(1)
            .build();

        let docs = store.query_documents(query, BOOKS).await.unwrap();
        let doc = docs[0].as_document().unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["id", "title"]);
    }

    #[tokio::test]
    async fn test_count_ignores_window() {
        let (store, _) = seeded().await;

        let count = store
            .count_documents(Some(Filter::eq("category", "horror")), BOOKS)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(store.count_documents(None, "missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_fields_merges_top_level() {
        let (store, ids) = seeded().await;

        let updated = store
            .set_fields(ids[0], doc! { "price": 9.99 }, BOOKS)
            .await
            .unwrap()
            .unwrap();

        let doc = updated.as_document().unwrap();
        assert_eq!(doc.get_f64("price").unwrap(), 9.99);
        assert_eq!(doc.get_str("title").unwrap(), "Dune");
        assert!(store.set_fields(Uuid::new(), doc! {}, BOOKS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_array_operations() {
        let store = InMemoryStore::new();
        let user = Uuid::new();
        let (first, second) = (Uuid::new(), Uuid::new());

        store
            .insert_documents(vec![(user, Bson::Document(doc! { "id": user }))], "users")
            .await
            .unwrap();

        for (record, title) in [(first, "Dune"), (second, "Emma")] {
            store
                .push_to_array(
                    user,
                    "purchaseHistory",
                    Bson::Document(doc! { "id": record, "title": title, "price": 10.0 }),
                    "users",
                )
                .await
                .unwrap()
                .unwrap();
        }

        let updated = store
            .set_in_array(user, "purchaseHistory", ElementMatch::by_id(second), doc! { "price": 9.99 }, "users")
            .await
            .unwrap();
        let ArrayElementUpdate::Updated(doc) = updated else {
            panic!("expected an update");
        };
        let history = doc.as_document().unwrap().get_array("purchaseHistory").unwrap();
        let record = history[1].as_document().unwrap();
        assert_eq!(record.get_f64("price").unwrap(), 9.99);
        assert_eq!(record.get_str("title").unwrap(), "Emma");
        assert_eq!(history[0].as_document().unwrap().get_f64("price").unwrap(), 10.0);

        let missing = store
            .set_in_array(user, "purchaseHistory", ElementMatch::by_id(Uuid::new()), doc! {}, "users")
            .await
            .unwrap();
        assert_eq!(missing, ArrayElementUpdate::ElementMissing);

        let absent = store
            .set_in_array(Uuid::new(), "purchaseHistory", ElementMatch::by_id(first), doc! {}, "users")
            .await
            .unwrap();
        assert_eq!(absent, ArrayElementUpdate::DocumentMissing);

        for _ in 0..2 {
            let pulled = store
                .pull_from_array(user, "purchaseHistory", ElementMatch::by_id(first), "users")
                .await
                .unwrap()
                .unwrap();
            let history = pulled.as_document().unwrap().get_array("purchaseHistory").unwrap();
            assert_eq!(history.len(), 1);
        }

        assert!(store
            .pull_from_array(Uuid::new(), "purchaseHistory", ElementMatch::by_id(first), "users")
            .await
            .unwrap()
            .is_none());
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Shelf {
        id: Uuid,
        owners: Vec<Uuid>,
        #[serde(default)]
        slots: Vec<Slot>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Slot {
        id: Uuid,
        label: String,
    }

    impl Document for Shelf {
        fn id(&self) -> &Uuid {
            &self.id
        }

        fn collection_name() -> &'static str {
            "shelves"
        }
    }

    #[tokio::test]
    async fn test_typed_documents_match_on_ids() {
        let store = DocumentStore::new(InMemoryStore::new());
        let shelves = store.typed_collection::<Shelf>();
        let owner = Uuid::new();
        let shelf = Shelf { id: Uuid::new(), owners: vec![Uuid::new(), owner], slots: vec![] };
        let other = Shelf { id: Uuid::new(), owners: vec![Uuid::new()], slots: vec![] };
        shelves.insert(vec![shelf.clone(), other]).await.unwrap();

        assert_eq!(shelves.count(Some(Filter::eq("id", shelf.id))).await.unwrap(), 1);
        assert_eq!(shelves.count(Some(Filter::eq("owners", owner))).await.unwrap(), 1);

        let found = shelves
            .query(Query::builder().filter(Filter::eq("owners", owner)).build())
            .await
            .unwrap();
        assert_eq!(found, vec![shelf.clone()]);

        let slot = Slot { id: Uuid::new(), label: "bottom".to_string() };
        shelves
            .push_to_array(shelf.id, "slots", bson::ser::serialize_to_bson(&slot).unwrap())
            .await
            .unwrap()
            .unwrap();

        let updated = shelves
            .set_in_array(shelf.id, "slots", ElementMatch::by_id(slot.id), doc! { "label": "top" })
            .await
            .unwrap();
        let ArrayElementUpdate::Updated(updated) = updated else {
            panic!("expected the slot to be updated");
        };
        assert_eq!(updated.slots, vec![Slot { id: slot.id, label: "top".to_string() }]);

        let pulled = shelves
            .pull_from_array(shelf.id, "slots", ElementMatch::by_id(slot.id))
            .await
            .unwrap()
            .unwrap();
        assert!(pulled.slots.is_empty());
    }

    #[tokio::test]
    async fn test_push_rejects_non_array_field() {
        let (store, ids) = seeded().await;

        let result = store
            .push_to_array(ids[0], "title", Bson::Int32(1), BOOKS)
            .await;

        assert!(matches!(result, Err(DocumentStoreError::InvalidDocument(_))));
    }
}
