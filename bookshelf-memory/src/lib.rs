//! In-memory document storage backend for bookshelf.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and backs the service in
//! development and in tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Type-erased storage** - Stores documents as BSON
//! - **Full query support** - Filtering on dotted paths, multi-key sorting, projection and
//!   pagination
//! - **Atomic updates** - Field sets and embedded-array push/pull/update under one write lock
//!
//! # Quick Start
//!
//! ```ignore
//! use bookshelf::{store::DocumentStore, backend::StoreBackendBuilder, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!     let authors = store.typed_collection::<Author>();
//!
//!     authors.insert(vec![author]).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
