//! Collection handles for document store operations.
//!
//! - [`Collection`] - Untyped collection working with raw BSON documents. Needed when results
//!   do not match a document type, e.g. projected query results.
//! - [`TypedCollection`] - Type-safe collection for a specific [`Document`] type.
//!
//! # Example
//!
//! ```ignore
//! # async fn example(store: &bookshelf::store::DocumentStore<impl bookshelf::backend::StoreBackend>) -> bookshelf::error::DocumentStoreResult<()> {
//! let authors = store.typed_collection::<Author>();
//! authors.insert(vec![author]).await?;
//! let found = authors.get_one(author_id).await?;
//! # Ok(()) }
//! ```

use bson::{Bson, Uuid};
use std::marker::PhantomData;

use crate::{
    backend::{ArrayElementUpdate, StoreBackend},
    document::{Document, DocumentExt},
    error::DocumentStoreResult,
    query::{ElementMatch, Expr, Query},
};

/// An untyped collection with a reference to a storage backend.
///
/// All documents are represented as BSON values.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queries documents in the collection using a structured query.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the operation fails.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<Bson>> {
        self.backend
            .query_documents(query, self.name())
            .await
    }

    /// Counts the documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the operation fails.
    pub async fn count(&self, filter: Option<Expr>) -> DocumentStoreResult<usize> {
        self.backend
            .count_documents(filter, self.name())
            .await
    }
}

#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns an untyped handle on the same collection.
    pub fn untyped(&self) -> Collection<'a, B> {
        Collection::new(self.name.clone(), self.backend)
    }

    /// Inserts new documents into the collection.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if serialization or insertion fails.
    pub async fn insert(&self, documents: Vec<D>) -> DocumentStoreResult<()> {
        self.backend
            .insert_documents(
                documents
                    .into_iter()
                    .map(|d| {
                        d.to_bson()
                            .map(move |b| (d.id().clone(), b))
                    })
                    .collect::<Result<Vec<(Uuid, Bson)>, _>>()?,
                self.name(),
            )
            .await
    }

    /// Deletes documents from the collection by their IDs.
    ///
    /// # Returns
    ///
    /// The number of documents removed; IDs that did not exist are not counted.
    pub async fn delete<U>(&self, ids: Vec<U>) -> DocumentStoreResult<usize>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        self.backend
            .delete_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await
    }

    /// Retrieves documents from the collection by their IDs.
    ///
    /// If a document ID doesn't exist, it is omitted from results.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if deserialization or retrieval fails.
    pub async fn get<U>(&self, ids: Vec<U>) -> DocumentStoreResult<Vec<D>>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        self.backend
            .get_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?
            .into_iter()
            .map(D::from_bson)
            .collect::<Result<Vec<D>, _>>()
    }

    /// Retrieves a single document by ID, or `None` if it does not exist.
    pub async fn get_one(&self, id: Uuid) -> DocumentStoreResult<Option<D>> {
        Ok(self.get(vec![id]).await?.into_iter().next())
    }

    /// Queries documents in the collection using a structured query.
    ///
    /// The query must not carry a projection that drops fields `D` requires; use
    /// [`TypedCollection::untyped`] for projected queries.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if deserialization or query fails.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<D>> {
        self.backend
            .query_documents(query, self.name())
            .await?
            .into_iter()
            .map(D::from_bson)
            .collect::<Result<Vec<D>, _>>()
    }

    /// Counts the documents matching `filter`.
    pub async fn count(&self, filter: Option<Expr>) -> DocumentStoreResult<usize> {
        self.backend
            .count_documents(filter, self.name())
            .await
    }

    /// Atomically replaces top-level fields of one document and returns the result.
    pub async fn set_fields(
        &self,
        id: Uuid,
        fields: bson::Document,
    ) -> DocumentStoreResult<Option<D>> {
        self.backend
            .set_fields(id, fields, self.name())
            .await?
            .map(D::from_bson)
            .transpose()
    }

    /// Atomically appends `element` to the embedded array `field`.
    pub async fn push_to_array(
        &self,
        id: Uuid,
        field: &str,
        element: Bson,
    ) -> DocumentStoreResult<Option<D>> {
        self.backend
            .push_to_array(id, field, element, self.name())
            .await?
            .map(D::from_bson)
            .transpose()
    }

    /// Atomically removes matching elements from the embedded array `field`.
    pub async fn pull_from_array(
        &self,
        id: Uuid,
        field: &str,
        matcher: ElementMatch,
    ) -> DocumentStoreResult<Option<D>> {
        self.backend
            .pull_from_array(id, field, matcher, self.name())
            .await?
            .map(D::from_bson)
            .transpose()
    }

    /// Atomically replaces fields of one element of the embedded array `field`.
    pub async fn set_in_array(
        &self,
        id: Uuid,
        field: &str,
        matcher: ElementMatch,
        fields: bson::Document,
    ) -> DocumentStoreResult<ArrayElementUpdate<D>> {
        self.backend
            .set_in_array(id, field, matcher, fields, self.name())
            .await?
            .try_map(D::from_bson)
    }
}
