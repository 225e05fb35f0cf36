//! MongoDB backend implementation for bookshelf.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait. Filters,
//! sorting, projection and pagination run in MongoDB's query engine, and the single-document
//! update primitives map onto `$set`, `$push`, `$pull` and positional `$set` through
//! `findOneAndUpdate`.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! bookshelf = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use bookshelf::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "bookshelf")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod query;
pub mod sanitizer;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
