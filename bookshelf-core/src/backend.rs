//! Storage backend abstraction for the document store.
//!
//! This module defines the traits that abstract over storage implementations, allowing the
//! document store to work with different backends (in-memory, MongoDB).
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides a unified async interface for document insertion,
//! retrieval, deletion, querying and counting, plus the single-document atomic update
//! primitives the application relies on instead of read-modify-write cycles:
//!
//! - [`StoreBackend::set_fields`] replaces top-level fields of one document,
//! - [`StoreBackend::push_to_array`] appends to an embedded array,
//! - [`StoreBackend::pull_from_array`] removes matching elements of an embedded array,
//! - [`StoreBackend::set_in_array`] replaces fields of one element of an embedded array.
//!
//! Each of these is applied atomically to a single document by every backend.
//!
//! # Examples
//!
//! ```ignore
//! use bookshelf::backend::StoreBackend;
//! use bson::{Uuid, Bson, doc};
//!
//! let backend = MyBackendImpl::new();
//!
//! let uuid = Uuid::new();
//! let doc = Bson::Document(doc! { "id": uuid, "firstName": "Ursula" });
//! backend.insert_documents(vec![(uuid, doc)], "authors").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Uuid};
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    query::{ElementMatch, Expr, Query},
};

/// Outcome of [`StoreBackend::set_in_array`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElementUpdate<T = Bson> {
    /// The element was updated; carries the whole parent document after the update.
    Updated(T),
    /// No document with the given ID exists.
    DocumentMissing,
    /// The document exists but no array element matched.
    ElementMissing,
}

impl<T> ArrayElementUpdate<T> {
    /// Converts the updated document, leaving the miss variants untouched.
    pub fn try_map<U, E>(
        self,
        f: impl FnOnce(T) -> Result<U, E>,
    ) -> Result<ArrayElementUpdate<U>, E> {
        Ok(match self {
            ArrayElementUpdate::Updated(doc) => ArrayElementUpdate::Updated(f(doc)?),
            ArrayElementUpdate::DocumentMissing => ArrayElementUpdate::DocumentMissing,
            ArrayElementUpdate::ElementMissing => ArrayElementUpdate::ElementMissing,
        })
    }
}

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks.
///
/// # Atomicity
///
/// Every method operating on a single document ID is atomic with respect to that document.
/// Nothing is atomic across documents or across calls: a [`count_documents`] followed by a
/// [`query_documents`] may observe different states.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
///
/// [`count_documents`]: StoreBackend::count_documents
/// [`query_documents`]: StoreBackend::query_documents
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents into a collection.
    ///
    /// # Arguments
    ///
    /// * `documents` - A vector of (UUID, BSON document) pairs to insert
    /// * `collection` - The name of the collection to insert into. Created automatically if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists)
    /// if an ID is already taken.
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Deletes documents from a collection by their IDs.
    ///
    /// IDs that do not exist are silently skipped.
    ///
    /// # Returns
    ///
    /// The number of documents actually removed.
    async fn delete_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<usize>;

    /// Retrieves documents from a collection by their IDs.
    ///
    /// If a document ID doesn't exist, it is simply omitted from the results. Result order is
    /// not guaranteed to match request order.
    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Queries documents in a collection using a structured query.
    ///
    /// Applies, in order: filter, sort, offset, limit, projection.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`Query`] object specifying filters, projection, sorts, limits and offsets
    /// * `collection` - The name of the collection to query
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Counts documents matching `filter`, ignoring any pagination.
    ///
    /// A missing collection counts as empty.
    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<usize>;

    /// Atomically replaces the given top-level fields of one document.
    ///
    /// # Returns
    ///
    /// The document after the update, or `None` if no document has the given ID.
    async fn set_fields(
        &self,
        id: Uuid,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>>;

    /// Atomically appends `element` to the array stored under `field` of one document.
    ///
    /// # Returns
    ///
    /// The document after the update, or `None` if no document has the given ID.
    async fn push_to_array(
        &self,
        id: Uuid,
        field: &str,
        element: Bson,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>>;

    /// Atomically removes every element of the array under `field` that matches `matcher`.
    ///
    /// Removing an element that does not exist leaves the document unchanged and is not an
    /// error.
    ///
    /// # Returns
    ///
    /// The document after the update, or `None` if no document has the given ID.
    async fn pull_from_array(
        &self,
        id: Uuid,
        field: &str,
        matcher: ElementMatch,
        collection: &str,
    ) -> DocumentStoreResult<Option<Bson>>;

    /// Atomically replaces fields of the first element of the array under `field` that
    /// matches `matcher`. Fields of the element not named in `fields` are preserved.
    async fn set_in_array(
        &self,
        id: Uuid,
        field: &str,
        matcher: ElementMatch,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<ArrayElementUpdate>;

    /// Creates an index on a field in a collection.
    ///
    /// Backends without indexing treat this as a no-op.
    async fn add_index(
        &self,
        collection: &str,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<()>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
