//! Main bookshelf storage crate providing a unified interface for document storage.
//!
//! This crate re-exports the core types from `bookshelf-core` and gives access to the
//! storage backends behind one dependency.
//!
//! # Features
//!
//! - **Type-safe document storage** - Define data structures with Serde and store them safely
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//! - **Query strings** - Translate HTTP query strings into filters, sorting and pagination
//! - **Atomic updates** - Single-document field sets and embedded-array operations
//!
//! # Quick Start
//!
//! ```ignore
//! use bookshelf::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let books = store.typed_collection::<Book>();
//!
//!     let criteria = QueryTranslator::new().translate([("category", "fantasy"), ("sort", "-price")])?;
//!     let total = books.count(criteria.filter.clone()).await?;
//!     let page = books.query(criteria.to_query()).await?;
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use bookshelf_core::{backend, collection, document, error, page, query, querystring, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use bookshelf_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use bookshelf_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
